//! Region error types.

use std::error::Error;
use std::fmt;

/// Reasons a [`crate::Region`] refuses to move its break.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegionError {
  /// Growth would run past the end of the backing memory.
  Exhausted {
    /// Number of bytes requested.
    requested: usize,
    /// Bytes still available above the break.
    available: usize,
  },
  /// Shrink would move the break below the start of the region.
  Underflow {
    /// Number of bytes asked to be released.
    requested: usize,
    /// Bytes currently reserved.
    reserved: usize,
  },
  /// The byte count does not fit in a signed break delta.
  DeltaOverflow {
    bytes: usize,
  },
  /// The operating system rejected the adjustment.
  Os {
    errno: i32,
  },
}

impl fmt::Display for RegionError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      Self::Exhausted {
        requested,
        available,
      } => {
        write!(
          f,
          "region exhausted: requested {requested} bytes, {available} bytes available"
        )
      }
      Self::Underflow {
        requested,
        reserved,
      } => {
        write!(
          f,
          "region underflow: asked to release {requested} bytes, {reserved} bytes reserved"
        )
      }
      Self::DeltaOverflow { bytes } => {
        write!(f, "{bytes} bytes does not fit in a break delta")
      }
      Self::Os { errno } => {
        write!(f, "break adjustment failed: errno {errno}")
      }
    }
  }
}

impl Error for RegionError {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_names_the_numbers() {
    let err = RegionError::Exhausted {
      requested: 48,
      available: 16,
    };
    assert_eq!(
      err.to_string(),
      "region exhausted: requested 48 bytes, 16 bytes available"
    );

    let err = RegionError::Os { errno: 12 };
    assert!(err.to_string().contains("errno 12"));
  }
}

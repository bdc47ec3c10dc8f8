//! Heap configuration parameters.

/// Configuration for a [`crate::Heap`].
///
/// All values are fixed once the heap is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapConfig {
  /// Upper bound on the bytes (headers and payloads) the heap keeps reserved
  /// from its region.
  ///
  /// Default: `None`, bounded only by the region itself. A request that would
  /// push past the cap fails the same way region exhaustion does.
  pub max_region_bytes: Option<usize>,
}

impl HeapConfig {
  /// Default configuration, usable in `const` contexts.
  pub const DEFAULT: HeapConfig = HeapConfig {
    max_region_bytes: None,
  };

  /// Config capping the reserved region at `bytes`.
  pub const fn capped(bytes: usize) -> Self {
    Self {
      max_region_bytes: Some(bytes),
    }
  }

  /// Whether `reserved + extra` bytes stays within the cap.
  pub fn admits(
    &self,
    reserved: usize,
    extra: usize,
  ) -> bool {
    match (self.max_region_bytes, reserved.checked_add(extra)) {
      (_, None) => false,
      (None, Some(_)) => true,
      (Some(max), Some(total)) => total <= max,
    }
  }
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_is_uncapped() {
    let config = HeapConfig::default();
    assert_eq!(config.max_region_bytes, None);
    assert!(config.admits(usize::MAX - 1, 1));
    assert!(!config.admits(usize::MAX, 1));
  }

  #[test]
  fn cap_is_inclusive() {
    let config = HeapConfig::capped(96);
    assert!(config.admits(48, 48));
    assert!(!config.admits(48, 49));
  }
}

/// Alignment of every block header and every payload handed out by a heap.
pub const BLOCK_ALIGN: usize = 16;

/// Rounds the given size up to the next multiple of [`BLOCK_ALIGN`].
///
/// Evaluates to `None` when the rounded value does not fit in a `usize`.
///
/// # Examples
///
/// ```rust
/// use brkheap::align;
///
/// assert_eq!(align!(1), Some(16));
/// assert_eq!(align!(16), Some(16));
/// assert_eq!(align!(17), Some(32));
/// assert_eq!(align!(usize::MAX), None);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value as usize)
      .checked_add($crate::BLOCK_ALIGN - 1)
      .map(|padded| padded & !($crate::BLOCK_ALIGN - 1))
  };
}

#[cfg(test)]
mod tests {
  use super::BLOCK_ALIGN;

  #[test]
  fn test_align() {
    let mut alignments = Vec::new();

    for i in 0..10 {
      let sizes = (BLOCK_ALIGN * i + 1)..=(BLOCK_ALIGN * (i + 1));

      let expected_alignment = BLOCK_ALIGN * (i + 1);

      alignments.push((sizes, expected_alignment));
    }

    for (sizes, expected) in alignments {
      for size in sizes {
        assert_eq!(Some(expected), align!(size));
      }
    }
  }

  #[test]
  fn test_align_zero_and_overflow() {
    assert_eq!(align!(0), Some(0));
    assert_eq!(align!(usize::MAX - BLOCK_ALIGN + 2), None);
    assert_eq!(align!(usize::MAX - BLOCK_ALIGN + 1), Some(usize::MAX - BLOCK_ALIGN + 1));
  }
}

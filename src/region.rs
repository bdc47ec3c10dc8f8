//! Break-style memory regions a [`crate::Heap`] grows and shrinks.

use std::{io, ptr};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_NORESERVE, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void, intptr_t};

use crate::{BLOCK_ALIGN, error::RegionError};

/// A contiguous memory area whose upper bound (the break) moves on demand.
pub trait Region {
  /// Moves the break by `delta` bytes.
  ///
  /// - `delta > 0` grows the region and returns the break as it was before growth.
  /// - `delta < 0` releases `|delta|` bytes below the break.
  /// - `delta == 0` reports the current break without changing anything.
  ///
  /// # Safety
  ///
  /// Shrinking releases memory; the caller must no longer reference anything
  /// above the new break.
  unsafe fn adjust_break(
    &mut self,
    delta: isize,
  ) -> Result<*mut u8, RegionError>;
}

/// Converts a byte count into a break delta.
pub fn delta(bytes: usize) -> Result<isize, RegionError> {
  isize::try_from(bytes).map_err(|_| RegionError::DeltaOverflow { bytes })
}

/// The process data segment, moved with `sbrk(2)`.
///
/// The break is process-wide: two heaps (or a heap and the platform `malloc`)
/// sharing it must not interleave their growth and shrinks.
///
/// Growth always starts on a [`BLOCK_ALIGN`] boundary. If something else left
/// the break misaligned, the padding bytes below the new block are skipped and
/// never handed out.
#[derive(Clone, Copy, Debug, Default)]
pub struct SbrkRegion;

fn sbrk(delta: isize) -> Result<*mut u8, RegionError> {
  // SAFETY: `sbrk` only moves the break; callers own what they release.
  let previous = unsafe { libc::sbrk(delta as intptr_t) };

  if previous == usize::MAX as *mut c_void {
    return Err(RegionError::Os {
      errno: io::Error::last_os_error().raw_os_error().unwrap_or(0),
    });
  }

  Ok(previous as *mut u8)
}

impl Region for SbrkRegion {
  unsafe fn adjust_break(
    &mut self,
    delta: isize,
  ) -> Result<*mut u8, RegionError> {
    if delta > 0 {
      let padding = sbrk(0)?.align_offset(BLOCK_ALIGN);

      if padding != 0 {
        sbrk(self::delta(padding)?)?;
      }
    }

    sbrk(delta)
  }
}

/// An emulated break over a fixed-capacity anonymous mapping.
///
/// Behaves like [`SbrkRegion`] but owns its memory, so independent heaps never
/// step on each other. The mapping is released on drop.
pub struct ArenaRegion {
  base: *mut u8,
  capacity: usize,
  brk: usize,
}

// SAFETY: the arena exclusively owns its mapping; nothing else aliases it.
unsafe impl Send for ArenaRegion {}

impl ArenaRegion {
  /// Maps an arena of `capacity` bytes. The base is page aligned.
  ///
  /// Fails with the OS error when the mapping cannot be made, including for a
  /// zero `capacity`.
  pub fn new(capacity: usize) -> Result<Self, RegionError> {
    // SAFETY: anonymous private mapping, no file descriptor involved.
    let base = unsafe {
      libc::mmap(
        ptr::null_mut(),
        capacity,
        PROT_READ | PROT_WRITE,
        MAP_NORESERVE | MAP_ANONYMOUS | MAP_PRIVATE,
        -1,
        0,
      )
    };

    if base == MAP_FAILED {
      return Err(RegionError::Os {
        errno: io::Error::last_os_error().raw_os_error().unwrap_or(0),
      });
    }

    Ok(Self {
      base: base as *mut u8,
      capacity,
      brk: 0,
    })
  }

  /// Lowest address of the arena; the break starts here.
  pub fn base(&self) -> *mut u8 {
    self.base
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Bytes between the base and the current break.
  pub fn reserved(&self) -> usize {
    self.brk
  }
}

impl Region for ArenaRegion {
  unsafe fn adjust_break(
    &mut self,
    delta: isize,
  ) -> Result<*mut u8, RegionError> {
    let previous = self.base.wrapping_add(self.brk);

    if delta >= 0 {
      let requested = delta as usize;
      let available = self.capacity - self.brk;

      if requested > available {
        return Err(RegionError::Exhausted {
          requested,
          available,
        });
      }

      self.brk += requested;
    } else {
      let requested = delta.unsigned_abs();

      if requested > self.brk {
        return Err(RegionError::Underflow {
          requested,
          reserved: self.brk,
        });
      }

      self.brk -= requested;
    }

    Ok(previous)
  }
}

impl Drop for ArenaRegion {
  fn drop(&mut self) {
    // SAFETY: `base` and `capacity` describe exactly the mapping made in `new`.
    unsafe {
      libc::munmap(self.base as *mut c_void, self.capacity);
    }
  }
}

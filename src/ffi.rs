//! C entry points that stand in for the platform allocator.
//!
//! Only compiled with the `interpose` feature. Linking the resulting library
//! ahead of libc routes `malloc`, `free`, `calloc` and `realloc` through one
//! process-wide [`Heap`] over the program break.

use libc::{c_void, size_t};

use crate::{Heap, SbrkRegion};

static HEAP: Heap<SbrkRegion> = Heap::new(SbrkRegion);

#[unsafe(no_mangle)]
pub extern "C" fn malloc(size: size_t) -> *mut c_void {
  HEAP.allocate(size) as _
}

/// # Safety
///
/// `ptr` must be null or come from this allocator and not be freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn free(ptr: *mut c_void) {
  unsafe { HEAP.deallocate(ptr as _) }
}

#[unsafe(no_mangle)]
pub extern "C" fn calloc(
  count: size_t,
  size: size_t,
) -> *mut c_void {
  HEAP.zero_allocate(count, size) as _
}

/// # Safety
///
/// `ptr` must be null or come from this allocator and not be freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn realloc(
  ptr: *mut c_void,
  size: size_t,
) -> *mut c_void {
  unsafe { HEAP.resize(ptr as _, size) as _ }
}

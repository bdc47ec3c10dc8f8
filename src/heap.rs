use std::{
  alloc::{GlobalAlloc, Layout},
  ptr,
};

use log::{debug, trace, warn};
use spin::Mutex;

use crate::{
  BLOCK_ALIGN, align,
  block::{Block, BlockState, HEADER_SIZE},
  config::HeapConfig,
  error::RegionError,
  list::BlockList,
  region::{self, Region},
};

/// Snapshot of a heap's bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
  /// Blocks currently in the list.
  pub blocks: usize,
  /// Blocks marked free and waiting for reuse.
  pub free_blocks: usize,
  /// Payload bytes of used blocks.
  pub used_bytes: usize,
  /// Payload bytes of free blocks.
  pub free_bytes: usize,
  /// Headers and payloads of every block, i.e. what the heap holds from its region.
  pub reserved_bytes: usize,
  /// Successful region growths since construction.
  pub grows: usize,
  /// Successful region shrinks since construction.
  pub shrinks: usize,
}

struct HeapState<R> {
  blocks: BlockList,
  region: R,
  config: HeapConfig,
  reserved: usize,
  grows: usize,
  shrinks: usize,
}

// SAFETY: the raw block pointers only reference memory inside `region`, which
// moves along with the state. All access goes through the heap's lock.
unsafe impl<R: Send> Send for HeapState<R> {}

/// A first-fit heap over a growable [`Region`].
///
/// Every operation runs under one non-reentrant lock.
pub struct Heap<R> {
  state: Mutex<HeapState<R>>,
}

impl<R: Region> Heap<R> {
  pub const fn new(region: R) -> Self {
    Self::with_config(region, HeapConfig::DEFAULT)
  }

  pub const fn with_config(
    region: R,
    config: HeapConfig,
  ) -> Self {
    Self {
      state: Mutex::new(HeapState {
        blocks: BlockList::new(),
        region,
        config,
        reserved: 0,
        grows: 0,
        shrinks: 0,
      }),
    }
  }

  /// Returns a pointer to at least `size` bytes, or null.
  ///
  /// The payload is aligned to [`BLOCK_ALIGN`]. A zero `size` always yields null.
  pub fn allocate(
    &self,
    size: usize,
  ) -> *mut u8 {
    if size == 0 {
      return ptr::null_mut();
    }

    let Some(size) = align!(size) else {
      trace!("allocate: {size} bytes cannot be aligned");
      return ptr::null_mut();
    };

    let mut state = self.state.lock();
    let (payload, event) = unsafe { state.allocate(size) };
    drop(state);

    event.report();
    payload
  }

  /// Returns `pointer` to the heap. Null is ignored.
  ///
  /// The trailing block is handed back to the region; any other block is
  /// marked free and stays in the list.
  ///
  /// # Safety
  ///
  /// `pointer` must be null or a live payload from this heap. Foreign pointers
  /// and double frees corrupt the block list.
  pub unsafe fn deallocate(
    &self,
    pointer: *mut u8,
  ) {
    if pointer.is_null() {
      return;
    }

    let mut state = self.state.lock();
    let events = unsafe { state.deallocate(Block::from_payload(pointer)) };
    drop(state);

    for event in events.into_iter().flatten() {
      event.report();
    }
  }

  /// Returns `count * element_size` zeroed bytes, or null on a zero operand or
  /// overflow.
  pub fn zero_allocate(
    &self,
    count: usize,
    element_size: usize,
  ) -> *mut u8 {
    if count == 0 || element_size == 0 {
      return ptr::null_mut();
    }

    let Some(size) = count.checked_mul(element_size) else {
      trace!("zero_allocate: {count} * {element_size} overflows");
      return ptr::null_mut();
    };

    let payload = self.allocate(size);

    if !payload.is_null() {
      unsafe { ptr::write_bytes(payload, 0, size) };
    }

    payload
  }

  /// Grows the payload behind `pointer` to at least `size` bytes.
  ///
  /// A block that is already big enough is returned as is. Otherwise the
  /// contents move to a new block and the old one is released. On failure
  /// (including a null `pointer` or a zero `size`) null is returned and the
  /// original block is untouched.
  ///
  /// # Safety
  ///
  /// `pointer` must be null or a live payload from this heap.
  pub unsafe fn resize(
    &self,
    pointer: *mut u8,
    size: usize,
  ) -> *mut u8 {
    if pointer.is_null() || size == 0 {
      return ptr::null_mut();
    }

    let current = unsafe { self.block_size(pointer) };

    if current >= size {
      return pointer;
    }

    let moved = self.allocate(size);

    if moved.is_null() {
      trace!("resize: no room for {size} bytes, {:?} left in place", pointer);
      return moved;
    }

    unsafe {
      ptr::copy_nonoverlapping(pointer, moved, current);
      self.deallocate(pointer);
    }

    moved
  }

  /// Payload capacity of the block behind `pointer`.
  ///
  /// # Safety
  ///
  /// `pointer` must be a live payload from this heap.
  pub unsafe fn block_size(
    &self,
    pointer: *mut u8,
  ) -> usize {
    let _state = self.state.lock();
    unsafe { (*Block::from_payload(pointer)).size }
  }

  /// Current break of the underlying region, or null if it cannot be read.
  pub fn boundary(&self) -> *mut u8 {
    let mut state = self.state.lock();
    unsafe { state.region.adjust_break(0) }.unwrap_or(ptr::null_mut())
  }

  pub fn stats(&self) -> HeapStats {
    let state = self.state.lock();

    let mut stats = HeapStats {
      reserved_bytes: state.reserved,
      grows: state.grows,
      shrinks: state.shrinks,
      ..HeapStats::default()
    };

    unsafe {
      for block in state.blocks.iter() {
        stats.blocks += 1;

        if (*block).is_free() {
          stats.free_blocks += 1;
          stats.free_bytes += (*block).size;
        } else {
          stats.used_bytes += (*block).size;
        }
      }
    }

    stats
  }

  /// Runs `f` against the region while holding the lock.
  pub fn with_region<T>(
    &self,
    f: impl FnOnce(&R) -> T,
  ) -> T {
    f(&self.state.lock().region)
  }
}

/// Outcome of a locked operation, logged once the lock is released so an
/// allocating logger cannot re-enter a held lock.
enum Event {
  Reused { block: *mut Block, size: usize },
  Grew { block: *mut Block, span: usize },
  OverCap { span: usize, cap: Option<usize> },
  Oversized { size: usize },
  GrowRefused { span: usize, err: RegionError },
  Freed { block: *mut Block, size: usize },
  Released { block: *mut Block, span: usize },
  BoundaryUnknown { err: RegionError },
  ShrinkRefused { span: usize, err: RegionError },
}

impl Event {
  fn report(&self) {
    match self {
      Self::Reused { block, size } => trace!("allocate: reusing {size} bytes at {block:?}"),
      Self::Grew { block, span } => {
        debug!("allocate: grew region by {span} bytes, new block at {block:?}")
      }
      Self::OverCap { span, cap } => {
        warn!("allocate: {span} bytes would exceed the region cap of {cap:?}")
      }
      Self::Oversized { size } => trace!("allocate: {size} bytes plus a header overflows"),
      Self::GrowRefused { span, err } => {
        warn!("allocate: cannot grow region by {span} bytes: {err}")
      }
      Self::Freed { block, size } => trace!("deallocate: {size} bytes at {block:?} marked free"),
      Self::Released { block, span } => {
        debug!("deallocate: released trailing block {block:?}, region shrunk by {span} bytes")
      }
      Self::BoundaryUnknown { err } => warn!("deallocate: cannot read region boundary: {err}"),
      Self::ShrinkRefused { span, err } => {
        warn!("deallocate: cannot shrink region by {span} bytes: {err}")
      }
    }
  }
}

impl<R: Region> HeapState<R> {
  /// Reuses the first fitting free block or grows the region for a new one.
  ///
  /// # Safety
  ///
  /// `size` must already be a multiple of [`BLOCK_ALIGN`].
  unsafe fn allocate(
    &mut self,
    size: usize,
  ) -> (*mut u8, Event) {
    unsafe {
      let reused = self.blocks.find_fit(size);

      if !reused.is_null() {
        (*reused).state = BlockState::Used;
        let event = Event::Reused {
          block: reused,
          size: (*reused).size,
        };
        return (Block::payload(reused), event);
      }

      let Some(span) = size.checked_add(HEADER_SIZE) else {
        return (ptr::null_mut(), Event::Oversized { size });
      };

      if !self.config.admits(self.reserved, span) {
        let cap = self.config.max_region_bytes;
        return (ptr::null_mut(), Event::OverCap { span, cap });
      }

      let address = match region::delta(span).and_then(|delta| self.region.adjust_break(delta)) {
        Ok(address) => address,
        Err(err) => return (ptr::null_mut(), Event::GrowRefused { span, err }),
      };

      let block = Block::carve(address, size);
      self.blocks.append(block);
      self.reserved += span;
      self.grows += 1;

      (Block::payload(block), Event::Grew { block, span })
    }
  }

  /// Releases the trailing block to the region, or marks `block` free.
  ///
  /// A region failure comes back as the first event; the block is then kept
  /// and marked free.
  ///
  /// # Safety
  ///
  /// `block` must be a live, used block of this heap.
  unsafe fn deallocate(
    &mut self,
    block: *mut Block,
  ) -> [Option<Event>; 2] {
    unsafe {
      let failure = if block == self.blocks.tail() {
        match self.release_trailing(block) {
          Ok(Some(span)) => return [Some(Event::Released { block, span }), None],
          Ok(None) => None,
          Err(event) => Some(event),
        }
      } else {
        None
      };

      (*block).state = BlockState::Free;
      let size = (*block).size;
      [failure, Some(Event::Freed { block, size })]
    }
  }

  /// Hands `block` back to the region when it ends exactly at the break.
  ///
  /// Returns the released span, or `None` when the block does not trail the
  /// break. The list is only touched after the region agreed to shrink, so a
  /// refused shrink leaves the block linked.
  unsafe fn release_trailing(
    &mut self,
    block: *mut Block,
  ) -> Result<Option<usize>, Event> {
    unsafe {
      let boundary = self
        .region
        .adjust_break(0)
        .map_err(|err| Event::BoundaryUnknown { err })?;

      if Block::end(block) != boundary {
        return Ok(None);
      }

      let span = (*block).span();
      region::delta(span)
        .and_then(|delta| self.region.adjust_break(-delta))
        .map_err(|err| Event::ShrinkRefused { span, err })?;

      if self.blocks.is_sole(block) {
        self.blocks.clear();
      } else {
        self.blocks.unlink_tail();
      }

      self.reserved -= span;
      self.shrinks += 1;

      Ok(Some(span))
    }
  }
}

unsafe impl<R: Region + Send> GlobalAlloc for Heap<R> {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > BLOCK_ALIGN {
      return ptr::null_mut();
    }

    self.allocate(layout.size())
  }

  unsafe fn dealloc(
    &self,
    ptr: *mut u8,
    _layout: Layout,
  ) {
    unsafe { self.deallocate(ptr) }
  }

  unsafe fn alloc_zeroed(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > BLOCK_ALIGN {
      return ptr::null_mut();
    }

    self.zero_allocate(layout.size(), 1)
  }

  unsafe fn realloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
    new_size: usize,
  ) -> *mut u8 {
    if layout.align() > BLOCK_ALIGN {
      return ptr::null_mut();
    }

    unsafe { self.resize(ptr, new_size) }
  }
}

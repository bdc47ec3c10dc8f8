//! Heaps over the real program break.
//!
//! These tests live in their own binary so no other test shares the break with
//! them. The harness's own `malloc` may still move the break from another
//! thread between a heap reading it and shrinking it; a failure here that does
//! not reproduce on the arena-backed unit tests is that race, not a heap bug.

use std::mem;

use brkheap::{BLOCK_ALIGN, Heap, Region, SbrkRegion};

/// Serialises every test that touches the break.
static SBRK_LOCK: spin::Mutex<()> = spin::Mutex::new(());

#[test]
fn test_alloc() {
  let _serial = SBRK_LOCK.lock();
  let heap = Heap::new(SbrkRegion);

  unsafe {
    let first = heap.allocate(mem::size_of::<u64>()) as *mut u64;
    assert!(!first.is_null());
    *first = 3;

    let second = heap.allocate(6 * mem::size_of::<u16>()) as *mut u16;
    for i in 0..6 {
      *second.add(i) = (i + 1) as u16;
    }

    assert_eq!(*first, 3);
    assert!((0..6).all(|i| *second.add(i) == (i + 1) as u16));

    heap.deallocate(first as *mut u8);

    let third = heap.allocate(mem::size_of::<u32>());
    assert_eq!(third, first as *mut u8);

    heap.deallocate(third);
    heap.deallocate(second as *mut u8);
  }
}

#[test]
fn test_growth_realigns_a_misaligned_break() {
  let _serial = SBRK_LOCK.lock();
  let mut region = SbrkRegion;

  unsafe {
    let start = libc::sbrk(0) as usize;
    let nudge = (BLOCK_ALIGN + 3 - start % BLOCK_ALIGN) % BLOCK_ALIGN;
    let nudge = if nudge == 0 { BLOCK_ALIGN } else { nudge };
    assert_ne!(libc::sbrk(nudge as libc::intptr_t) as usize, usize::MAX);
    assert_eq!(libc::sbrk(0) as usize % BLOCK_ALIGN, 3);

    let block = region.adjust_break(64).unwrap();
    assert_eq!(block as usize % BLOCK_ALIGN, 0);
    assert!(block as usize > start);
    assert_eq!(region.adjust_break(0).unwrap() as usize, block as usize + 64);

    // Hand everything back, padding included.
    let end = libc::sbrk(0) as usize;
    libc::sbrk(-((end - start) as libc::intptr_t));
  }
}

#[test]
fn test_heap_payloads_are_aligned_on_the_break() {
  let _serial = SBRK_LOCK.lock();
  let heap = Heap::new(SbrkRegion);

  unsafe {
    let start = libc::sbrk(0) as usize;
    if start % BLOCK_ALIGN == 0 {
      libc::sbrk(5);
    }

    let payloads: Vec<*mut u8> = [1, 13, 40].iter().map(|&size| heap.allocate(size)).collect();

    for &payload in &payloads {
      assert!(!payload.is_null());
      assert_eq!(payload as usize % BLOCK_ALIGN, 0);
    }

    for &payload in payloads.iter().rev() {
      heap.deallocate(payload);
    }

    // Only the padding below the first block is left; give it back too.
    let end = libc::sbrk(0) as usize;
    if end > start {
      libc::sbrk(-((end - start) as libc::intptr_t));
    }
  }
}

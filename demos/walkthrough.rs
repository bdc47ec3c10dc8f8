use std::{io::Read, ptr};

use brkheap::{HEADER_SIZE, Heap, SbrkRegion};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`, `gdb`,
/// or just to follow how the program break moves between steps.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn print_break(
  heap: &Heap<SbrkRegion>,
  label: &str,
) {
  println!(
    "[{}] PID = {}, program break = {:?}, {:?}",
    label,
    std::process::id(),
    heap.boundary(),
    heap.stats(),
  );
}

fn main() {
  // RUST_LOG=debug shows every growth and shrink of the break.
  env_logger::init();

  let heap = Heap::new(SbrkRegion);
  println!("Each block carries a {HEADER_SIZE}-byte header.");

  print_break(&heap, "start");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Two small blocks, carved one after the other at the break.
  // --------------------------------------------------------------------
  let p1 = heap.allocate(16);
  let p2 = heap.allocate(32);
  println!("\n[1] allocate(16) = {:?}, allocate(32) = {:?}", p1, p2);
  unsafe { ptr::write_bytes(p1, 0xAB, 16) };
  print_break(&heap, "1");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Free the first block. It does not trail the break, so it is only
  //    marked free, and the next small request reuses it.
  // --------------------------------------------------------------------
  unsafe { heap.deallocate(p1) };
  let p3 = heap.allocate(8);
  println!(
    "\n[2] deallocate(p1), allocate(8) = {:?} (reused p1: {})",
    p3,
    p3 == p1
  );
  print_break(&heap, "2");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Zeroed array, then grow it past its block.
  // --------------------------------------------------------------------
  let zeroed = heap.zero_allocate(4, 4) as *mut u32;
  unsafe {
    for i in 0..4 {
      zeroed.add(i).write(i as u32 + 1);
    }
  }
  let grown = unsafe { heap.resize(zeroed as *mut u8, 256) } as *mut u32;
  println!(
    "\n[3] zero_allocate(4, 4) = {:?}, resize(.., 256) = {:?}, first word = {}",
    zeroed,
    grown,
    unsafe { grown.read() }
  );
  print_break(&heap, "3");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) Free the trailing block: the break moves back down.
  // --------------------------------------------------------------------
  unsafe { heap.deallocate(grown as *mut u8) };
  println!("\n[4] deallocate(trailing block)");
  print_break(&heap, "4");
  block_until_enter_pressed();

  unsafe {
    heap.deallocate(p3);
    heap.deallocate(p2);
  }
  print_break(&heap, "end");
}

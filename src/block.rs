use std::{mem, ptr};

/// Whether a block's payload is currently handed out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockState {
  Free,
  Used,
}

/// Header written in place right before every payload.
#[repr(C, align(16))]
pub struct Block {
  /// Payload capacity in bytes, header excluded.
  pub size: usize,
  pub state: BlockState,
  /// Next block in address order, null for the tail.
  pub next: *mut Block,
}

pub const HEADER_SIZE: usize = mem::size_of::<Block>();

impl Block {
  pub fn new(
    size: usize,
    state: BlockState,
  ) -> Self {
    Self {
      size,
      state,
      next: ptr::null_mut(),
    }
  }

  /// Writes a fresh header at `address` and returns it.
  ///
  /// # Safety
  ///
  /// `address` must be aligned to [`crate::BLOCK_ALIGN`] and valid for writes of
  /// `HEADER_SIZE + size` bytes.
  pub unsafe fn carve(
    address: *mut u8,
    size: usize,
  ) -> *mut Block {
    let block = address as *mut Block;
    unsafe { block.write(Block::new(size, BlockState::Used)) };
    block
  }

  /// Recovers the header of a payload pointer previously produced by [`Block::payload`].
  ///
  /// # Safety
  ///
  /// `payload` must come from a block carved by the same heap and still in its list.
  pub unsafe fn from_payload(payload: *mut u8) -> *mut Block {
    unsafe { payload.sub(HEADER_SIZE) as *mut Block }
  }

  /// # Safety
  ///
  /// `block` must point to a live header.
  pub unsafe fn payload(block: *mut Block) -> *mut u8 {
    unsafe { (block as *mut u8).add(HEADER_SIZE) }
  }

  /// First byte past this block's payload.
  ///
  /// # Safety
  ///
  /// `block` must point to a live header.
  pub unsafe fn end(block: *mut Block) -> *mut u8 {
    unsafe { Block::payload(block).add((*block).size) }
  }

  /// Header plus payload, the span this block occupies in the region.
  pub fn span(&self) -> usize {
    HEADER_SIZE + self.size
  }

  pub fn is_free(&self) -> bool {
    self.state == BlockState::Free
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::BLOCK_ALIGN;

  #[test]
  fn header_keeps_payloads_aligned() {
    assert_eq!(HEADER_SIZE % BLOCK_ALIGN, 0);
    assert_eq!(mem::align_of::<Block>(), BLOCK_ALIGN);
  }

  #[test]
  fn payload_and_header_round_trip() {
    #[repr(C, align(16))]
    struct Backing([u8; 128]);

    let mut backing = Backing([0; 128]);

    unsafe {
      let block = Block::carve(backing.0.as_mut_ptr(), 64);
      let payload = Block::payload(block);

      assert_eq!(payload as usize - block as usize, HEADER_SIZE);
      assert_eq!(Block::from_payload(payload), block);
      assert_eq!(Block::end(block) as usize, payload as usize + 64);
      assert_eq!((*block).span(), HEADER_SIZE + 64);
      assert_eq!((*block).state, BlockState::Used);
      assert!((*block).next.is_null());
    }
  }
}

use std::ptr;

use crate::block::Block;

/// Address-ordered chain of every block carved from a region.
///
/// The list never owns memory; it only links headers that live inside the region.
pub struct BlockList {
  head: *mut Block,
  tail: *mut Block,
}

impl BlockList {
  pub const fn new() -> Self {
    Self {
      head: ptr::null_mut(),
      tail: ptr::null_mut(),
    }
  }

  pub fn tail(&self) -> *mut Block {
    self.tail
  }

  /// Whether `block` is the only block in the list.
  pub fn is_sole(
    &self,
    block: *mut Block,
  ) -> bool {
    self.head == block && self.tail == block
  }

  /// First free block with at least `size` payload bytes, or null.
  ///
  /// # Safety
  ///
  /// Every linked header must be live.
  pub unsafe fn find_fit(
    &self,
    size: usize,
  ) -> *mut Block {
    unsafe {
      let mut current = self.head;

      while !current.is_null() {
        if (*current).is_free() && (*current).size >= size {
          return current;
        }
        current = (*current).next;
      }

      ptr::null_mut()
    }
  }

  /// Links a freshly carved block after the current tail.
  ///
  /// # Safety
  ///
  /// `block` must be live, unlinked, and sit above every block already in the list.
  pub unsafe fn append(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      (*block).next = ptr::null_mut();

      if self.tail.is_null() {
        self.head = block;
      } else {
        (*self.tail).next = block;
      }
      self.tail = block;
    }
  }

  /// Detaches the tail and promotes its predecessor.
  ///
  /// Returns the detached block, or null when the list was already empty.
  ///
  /// # Safety
  ///
  /// Every linked header must be live.
  pub unsafe fn unlink_tail(&mut self) -> *mut Block {
    unsafe {
      let tail = self.tail;

      if tail.is_null() {
        return tail;
      }

      if self.head == tail {
        self.clear();
        return tail;
      }

      let mut current = self.head;
      while (*current).next != tail {
        current = (*current).next;
      }

      (*current).next = ptr::null_mut();
      self.tail = current;
      tail
    }
  }

  pub fn clear(&mut self) {
    self.head = ptr::null_mut();
    self.tail = ptr::null_mut();
  }

  /// Walks the list from head to tail.
  ///
  /// # Safety
  ///
  /// Every linked header must stay live and unmodified while the iterator is in use.
  pub unsafe fn iter(&self) -> Iter<'_> {
    Iter {
      current: self.head,
      _list: self,
    }
  }
}

impl Default for BlockList {
  fn default() -> Self {
    Self::new()
  }
}

pub struct Iter<'a> {
  current: *mut Block,
  _list: &'a BlockList,
}

impl Iterator for Iter<'_> {
  type Item = *mut Block;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current.is_null() {
      return None;
    }

    let block = self.current;
    // SAFETY: guaranteed live by the contract of `BlockList::iter`.
    self.current = unsafe { (*block).next };
    Some(block)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::{BlockState, HEADER_SIZE};

  #[repr(C, align(16))]
  struct Backing([u8; 1024]);

  /// Carves `sizes.len()` contiguous blocks and appends them in order.
  unsafe fn carve_all(
    backing: &mut Backing,
    sizes: &[usize],
  ) -> (BlockList, Vec<*mut Block>) {
    let mut list = BlockList::new();
    let mut blocks = Vec::new();
    let mut offset = 0;

    for &size in sizes {
      unsafe {
        let block = Block::carve(backing.0.as_mut_ptr().add(offset), size);
        list.append(block);
        blocks.push(block);
      }
      offset += HEADER_SIZE + size;
    }

    (list, blocks)
  }

  #[test]
  fn test_append_links_in_order() {
    let mut backing = Backing([0; 1024]);

    unsafe {
      let (list, blocks) = carve_all(&mut backing, &[16, 32, 64]);

      assert_eq!(list.iter().next(), Some(blocks[0]));
      assert_eq!(list.tail(), blocks[2]);
      assert_eq!(list.iter().collect::<Vec<_>>(), blocks);
      assert!(!list.is_sole(blocks[0]));
    }
  }

  #[test]
  fn test_find_fit_is_first_fit() {
    let mut backing = Backing([0; 1024]);

    unsafe {
      let (list, mut blocks) = carve_all(&mut backing, &[16, 64, 32, 64]);

      assert!(list.find_fit(16).is_null());

      (*blocks[1]).state = BlockState::Free;
      (*blocks[3]).state = BlockState::Free;

      assert_eq!(list.find_fit(16), blocks[1]);
      assert_eq!(list.find_fit(64), blocks[1]);
      assert!(list.find_fit(80).is_null());

      (*blocks[0]).state = BlockState::Free;
      assert_eq!(list.find_fit(8), blocks[0]);
      assert_eq!(list.find_fit(17), blocks[1]);
    }
  }

  #[test]
  fn test_unlink_tail_promotes_predecessor() {
    let mut backing = Backing([0; 1024]);

    unsafe {
      let (mut list, blocks) = carve_all(&mut backing, &[16, 16, 16]);

      assert_eq!(list.unlink_tail(), blocks[2]);
      assert_eq!(list.tail(), blocks[1]);
      assert!((*blocks[1]).next.is_null());

      assert_eq!(list.unlink_tail(), blocks[1]);
      assert!(list.is_sole(blocks[0]));

      assert_eq!(list.unlink_tail(), blocks[0]);
      assert!(list.iter().next().is_none());
      assert!(list.tail().is_null());

      assert!(list.unlink_tail().is_null());
    }
  }
}

//! # brkheap - A Break-Backed First-Fit Heap
//!
//! This crate provides a small **first-fit heap allocator** that carves blocks
//! out of a single growable region, such as the program break moved with `sbrk(2)`.
//!
//! ## Overview
//!
//! Every allocation is a header followed by its payload. Headers are chained
//! in address order, so the list tiles the whole reserved region:
//!
//! ```text
//!   Heap Region:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                                                                      │
//!   │  ┌────┬──────────┬────┬─────┬────┬──────────────┬────┬────────┐      │
//!   │  │ H  │  used    │ H  │free │ H  │    used      │ H  │  used  │      │
//!   │  └────┴──────────┴────┴─────┴────┴──────────────┴────┴────────┘      │
//!   │  ▲                ▲          ▲                   ▲           ▲       │
//!   │  │                │          │                   │           │       │
//!   │ head ───next────► ● ──next─► ● ──────next──────► tail    Program     │
//!   │                                                          Break       │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **allocate**: reuse the first free block that is big enough, otherwise
//!   grow the region by `header + size` and append a new block.
//! - **deallocate**: if the block ends at the break, give its bytes back to the
//!   region; otherwise mark it free for later reuse.
//! - **zero_allocate**: `count * element_size` zeroed bytes, overflow checked.
//! - **resize**: keep the block when it is already big enough, otherwise move
//!   the contents to a new block.
//!
//! ## Crate Structure
//!
//! ```text
//!   brkheap
//!   ├── align      - align! macro and BLOCK_ALIGN
//!   ├── block      - Block header layout (internal)
//!   ├── list       - Address-ordered block list (internal)
//!   ├── region     - Region trait, SbrkRegion, ArenaRegion
//!   ├── config     - HeapConfig
//!   ├── error      - RegionError
//!   ├── heap       - Heap, HeapStats, GlobalAlloc impl
//!   └── ffi        - malloc/free/calloc/realloc exports (feature "interpose")
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brkheap::{ArenaRegion, Heap};
//!
//! let heap = Heap::new(ArenaRegion::new(64 * 1024).unwrap());
//!
//! let ptr = heap.allocate(8) as *mut u64;
//! assert!(!ptr.is_null());
//!
//! unsafe {
//!     *ptr = 42;
//!     heap.deallocate(ptr as *mut u8);
//! }
//! ```
//!
//! As the process allocator:
//!
//! ```rust,ignore
//! use brkheap::{Heap, SbrkRegion};
//!
//! #[global_allocator]
//! static GLOBAL: Heap<SbrkRegion> = Heap::new(SbrkRegion);
//! ```
//!
//! ## Block Lifecycle
//!
//! ```text
//!   carve ──► Used ──deallocate──► Free ──find_fit──► Used ──► ...
//!              │                                        │
//!              └───── deallocate while trailing ────────┴──► released
//! ```
//!
//! Blocks are never split, merged, or removed from the middle of the list. A
//! free block that does not trail the break stays reserved until it is reused.
//!
//! ## Failures
//!
//! Every failure is a null pointer: zero-sized requests, `count * size`
//! overflow, and a region that cannot grow. A failed call leaves the heap
//! exactly as it was.
//!
//! ## Logging
//!
//! Operations report through the [`log`] facade. Records are emitted after
//! the heap's lock is released, so a logger that allocates re-enters an idle
//! heap. With a heap as the global allocator, such a logger still allocates
//! on every record it writes.
//!
//! ## Safety
//!
//! Passing a foreign pointer or freeing twice corrupts the block list. These
//! are not detected, which is why `deallocate` and `resize` are `unsafe`.

pub mod align;
mod block;
mod config;
mod error;
#[cfg(feature = "interpose")]
pub mod ffi;
mod heap;
mod list;
mod region;

pub use align::BLOCK_ALIGN;
pub use block::HEADER_SIZE;
pub use config::HeapConfig;
pub use error::RegionError;
pub use heap::{Heap, HeapStats};
pub use region::{ArenaRegion, Region, SbrkRegion};

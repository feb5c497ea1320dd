//! # `carve` - Two-Tier Lock-Free Heap Allocator
//!
//! A thread-safe dynamic memory allocator built directly on raw
//! virtual-memory mappings, small enough to audit end to end and usable as
//! a drop-in replacement for the platform heap via `GlobalAlloc`.
//!
//! ## Design
//!
//! Every request takes one of two paths, split at a fixed size threshold:
//!
//! 1. **Mini blocks** (`size < PAGE_SIZE / 4`): carved by bump-pointer
//!    decrement out of shared 64 KiB pages. Threads discover pages through a
//!    small fixed array of slots; an atomic exchange checks a page out of a
//!    slot and grants momentary exclusive ownership, a compare-and-swap
//!    checks it back in. Emptied pages are recycled through a bounded
//!    free-page pool instead of going back to the OS.
//!
//! 2. **Huge blocks** (`size >= PAGE_SIZE / 4`): one dedicated mapping per
//!    request, unmapped in full on release.
//!
//! Both page kinds keep their metadata at the page's lowest address, and
//! every page is aligned to `PAGE_SIZE`, so release needs nothing but the
//! pointer: masking its low bits recovers the owning header, whose leading
//! tag identifies the path.
//!
//! ## Concurrency
//!
//! The allocator owns no threads and never suspends; the only lock is the
//! free-page pool's idle-list mutex, held for a single push or pop. All
//! shared page-state transitions use sequentially consistent atomics, so
//! every thread observes one total order of slot exchanges, counter bumps,
//! and retirements. A retired page is reclaimed by whichever thread releases
//! its last outstanding block, exactly once, via the `used`/`freed` counter
//! pair in its header.
//!
//! ## Failure model
//!
//! The OS refusing a mapping is the only recoverable error and surfaces as
//! [`AllocError`]. A release that finds an unrecognizable tag at the
//! computed page base aborts the process with a diagnostic: the allocator's
//! own bookkeeping has been overwritten and nothing after that point can be
//! trusted. Double release and foreign pointers are undefined behavior
//! beyond that check.
//!
//! ## Example
//!
//! ```rust
//! use carve::HEAP;
//!
//! let block = HEAP.allocate(100).expect("out of memory");
//! unsafe {
//!     block.as_ptr().write_bytes(0, 100);
//!     HEAP.release(block);
//! }
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod global;
pub mod heap;
pub mod huge;
pub mod mini;
pub mod page;
pub mod pool;
mod syscall;

pub use config::{
    BLOCK_ALIGN, HUGE_HEADER_SIZE, MAX_CACHED_FREE_PAGES, MINI_HEADER_SIZE, MINI_HUGE_THRESHOLD,
    MINI_SLOT_COUNT, PAGE_SIZE,
};
pub use error::AllocError;
pub use global::CarveAllocator;
pub use heap::{Heap, HEAP};
pub use page::{page_base, HUGE_PAGE_TAG, MINI_PAGE_TAG};
pub use pool::{PagePool, PageSource};

// Compile-time assertions pinning the on-page layout.
const _: () = {
    use core::mem;

    // Page geometry the address-masking release path depends on.
    assert!(PAGE_SIZE.is_power_of_two());
    assert!(BLOCK_ALIGN.is_power_of_two());
    assert!(MINI_HUGE_THRESHOLD <= PAGE_SIZE - MINI_HEADER_SIZE);

    // Headers occupy exactly the bytes the carve paths reserve for them.
    assert!(mem::size_of::<mini::MiniPage>() == MINI_HEADER_SIZE);
    assert!(mem::size_of::<huge::HugePage>() == HUGE_HEADER_SIZE);

    // Block alignment falls out of header size and carve rounding together.
    assert!(MINI_HEADER_SIZE % BLOCK_ALIGN == 0);
    assert!(HUGE_HEADER_SIZE % BLOCK_ALIGN == 0);
    assert!(PAGE_SIZE % BLOCK_ALIGN == 0);

    // An idle page must have room for the pool's intrusive link.
    assert!(mem::size_of::<usize>() <= MINI_HEADER_SIZE);
};

//! `GlobalAlloc` adapter so the heap can stand in for the platform
//! allocator.
//!
//! ```rust,ignore
//! #[global_allocator]
//! static GLOBAL: carve::CarveAllocator = carve::CarveAllocator;
//! ```
//!
//! Layouts no more aligned than [`BLOCK_ALIGN`] map straight onto the heap,
//! whose blocks are always 16-byte aligned. Over-aligned layouts ride the
//! huge path with enough slack to slide the pointer up to the requested
//! alignment; because every alignment under [`PAGE_SIZE`] keeps the adjusted
//! pointer inside the region's first page, release still masks it down to
//! the owning header. Alignments of a page or more are not supported and
//! report failure by returning null.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};

use crate::config::{BLOCK_ALIGN, MINI_HUGE_THRESHOLD, PAGE_SIZE};
use crate::heap::HEAP;
use crate::page::align_up;

/// Routes `GlobalAlloc` calls to the process-wide [`HEAP`](crate::HEAP).
pub struct CarveAllocator;

unsafe impl GlobalAlloc for CarveAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let align = layout.align();
        if align <= BLOCK_ALIGN {
            return match HEAP.allocate(layout.size()) {
                Ok(block) => block.as_ptr(),
                Err(_) => ptr::null_mut(),
            };
        }
        if align >= PAGE_SIZE {
            return ptr::null_mut();
        }
        // Force the huge path (even for small sizes) and realign inside the
        // dedicated region. The padded request keeps `aligned + size` within
        // the mapping.
        let padded = match layout.size().checked_add(align) {
            Some(padded) => padded.max(MINI_HUGE_THRESHOLD),
            None => return ptr::null_mut(),
        };
        match HEAP.allocate(padded) {
            Ok(block) => align_up(block.as_ptr() as usize, align) as *mut u8,
            Err(_) => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        // The owning page header carries everything release needs; the
        // layout is not consulted.
        if let Some(ptr) = NonNull::new(ptr) {
            HEAP.release(ptr);
        }
    }
}

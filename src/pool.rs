//! A bounded cache of idle, page-aligned virtual-memory pages.
//!
//! `mmap` guarantees the size of a mapping but not its alignment, and the
//! release path needs every page aligned to [`PAGE_SIZE`] so headers can be
//! recovered by address masking. The pool therefore over-allocates two pages
//! at a time and trims the misaligned margins away with partial unmaps; when
//! the raw mapping happens to land aligned, the unused second half is itself
//! a valid page and is cached instead of discarded, paying for the next
//! acquire.
//!
//! The idle-list mutex is the only lock in the whole allocator. Its critical
//! section is a single push or pop; mapping and unmapping always happen
//! outside it.

use core::ptr::{self, NonNull};
use std::sync::Mutex;

use crate::config::{MAX_CACHED_FREE_PAGES, PAGE_SIZE};
use crate::error::AllocError;
use crate::syscall;

/// A source of [`PAGE_SIZE`]-sized, page-aligned mappings.
///
/// [`PagePool`] is the one real implementation; the seam exists so tests can
/// wrap it and observe page traffic.
pub trait PageSource: Sync {
    /// Hands out one page-aligned, `PAGE_SIZE`-byte page.
    ///
    /// # Errors
    /// Fails only when the OS refuses to map fresh memory.
    fn acquire(&self) -> Result<NonNull<u8>, AllocError>;

    /// Takes back a page previously handed out by [`PageSource::acquire`].
    ///
    /// # Safety
    /// The caller must own `page` exclusively: no live allocation may point
    /// into it and no other thread may still reach it.
    unsafe fn release(&self, page: NonNull<u8>);
}

/// Link written at the base of an idle page while it sits in the pool.
#[repr(C)]
struct FreePageNode {
    next: *mut FreePageNode,
}

struct IdleList {
    head: *mut FreePageNode,
    len: usize,
}

// The raw pointers only ever reference pages the pool owns outright.
unsafe impl Send for IdleList {}

/// The free-page pool: a mutex-guarded intrusive stack of idle pages, capped
/// at [`MAX_CACHED_FREE_PAGES`] resident entries.
pub struct PagePool {
    idle: Mutex<IdleList>,
}

impl PagePool {
    /// Creates an empty pool. Usable in statics.
    pub const fn new() -> Self {
        Self {
            idle: Mutex::new(IdleList {
                head: ptr::null_mut(),
                len: 0,
            }),
        }
    }

    /// Maps fresh memory from the OS and trims it to one aligned page.
    fn refill(&self) -> Result<NonNull<u8>, AllocError> {
        #[cfg(unix)]
        {
            let raw = unsafe { syscall::map(2 * PAGE_SIZE) }.ok_or(AllocError)?;
            let margin = (raw.as_ptr() as usize) & (PAGE_SIZE - 1);
            #[cfg(feature = "tracing")]
            tracing::trace!(addr = raw.as_ptr() as usize, margin, "mapped page pair from OS");
            if margin == 0 {
                // Aligned by luck: the second half is a spare aligned page.
                unsafe {
                    let bonus = NonNull::new_unchecked(raw.as_ptr().add(PAGE_SIZE));
                    self.release(bonus);
                }
                Ok(raw)
            } else {
                let lead = PAGE_SIZE - margin;
                unsafe {
                    let aligned = raw.as_ptr().add(lead);
                    syscall::unmap(raw.as_ptr(), lead);
                    syscall::unmap(aligned.add(PAGE_SIZE), margin);
                    Ok(NonNull::new_unchecked(aligned))
                }
            }
        }
        #[cfg(windows)]
        {
            // VirtualAlloc reservations are 64 KiB-granularity aligned, so a
            // single exactly-sized mapping is already a valid page.
            let raw = unsafe { syscall::map(PAGE_SIZE) }.ok_or(AllocError)?;
            #[cfg(feature = "tracing")]
            tracing::trace!(addr = raw.as_ptr() as usize, "mapped page from OS");
            Ok(raw)
        }
    }
}

impl PageSource for PagePool {
    fn acquire(&self) -> Result<NonNull<u8>, AllocError> {
        {
            let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(head) = NonNull::new(idle.head) {
                idle.head = unsafe { (*head.as_ptr()).next };
                idle.len -= 1;
                return Ok(head.cast());
            }
        }
        let page = self.refill()?;
        debug_assert_eq!(page.as_ptr() as usize % PAGE_SIZE, 0);
        Ok(page)
    }

    unsafe fn release(&self, page: NonNull<u8>) {
        debug_assert_eq!(page.as_ptr() as usize % PAGE_SIZE, 0);
        let node = page.as_ptr().cast::<FreePageNode>();
        {
            let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
            if idle.len < MAX_CACHED_FREE_PAGES {
                (*node).next = idle.head;
                idle.head = node;
                idle.len += 1;
                return;
            }
        }
        // Cache full: this page goes straight back to the OS.
        #[cfg(feature = "tracing")]
        tracing::trace!(addr = page.as_ptr() as usize, "pool full, unmapping page");
        syscall::unmap(page.as_ptr(), PAGE_SIZE);
    }
}

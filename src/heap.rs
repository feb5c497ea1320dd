//! The dispatcher tying the two tiers together, and the process-wide heap
//! instance.

use core::ptr::NonNull;
use core::sync::atomic::{AtomicU16, Ordering::SeqCst};

use crate::config::MINI_HUGE_THRESHOLD;
use crate::error::AllocError;
use crate::huge::{HugeAllocator, HugePage};
use crate::mini::{MiniAllocator, MiniPage};
use crate::page::{corruption_abort, page_base, HUGE_PAGE_TAG, MINI_PAGE_TAG};
use crate::pool::PagePool;

/// A complete two-tier heap: small requests are carved from shared pages fed
/// by a free-page pool, large ones get a dedicated mapping each.
pub struct Heap {
    mini: MiniAllocator<PagePool>,
    huge: HugeAllocator,
}

/// The process-wide heap. Const-initialized, so it is ready before the first
/// call with nothing to race on.
pub static HEAP: Heap = Heap::new();

impl Heap {
    /// Creates an independent heap. Usable in statics.
    pub const fn new() -> Self {
        Self {
            mini: MiniAllocator::new(PagePool::new()),
            huge: HugeAllocator,
        }
    }

    /// Allocates `size` bytes (`size == 0` counts as 1) and returns the block
    /// address.
    ///
    /// # Errors
    /// Fails only when the OS refuses to map memory.
    pub fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        if size < MINI_HUGE_THRESHOLD {
            self.mini.allocate(size)
        } else {
            self.huge.allocate(size)
        }
    }

    /// Releases a block previously returned by [`Heap::allocate`].
    ///
    /// The owning page is found by masking `ptr` down to the nearest page
    /// boundary; its stored tag picks the path. A tag matching no known page
    /// kind means the allocator's own metadata has been overwritten, and the
    /// process is terminated on the spot.
    ///
    /// # Safety
    /// `ptr` must have been returned by [`Heap::allocate`] on this heap and
    /// not yet released. Double release and foreign pointers are undefined
    /// behavior beyond the corruption check described above.
    pub unsafe fn release(&self, ptr: NonNull<u8>) {
        let base = page_base(ptr.as_ptr());
        let tag = (*base.cast::<AtomicU16>()).load(SeqCst);
        match tag {
            MINI_PAGE_TAG => self.mini.release(NonNull::new_unchecked(base.cast::<MiniPage>())),
            HUGE_PAGE_TAG => self.huge.release(NonNull::new_unchecked(base.cast::<HugePage>())),
            _ => corruption_abort(),
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

//! Small-object allocation out of shared, bump-carved pages.
//!
//! All threads share a small fixed array of slots, each holding at most one
//! page currently accepting allocations. A thread claims a page by atomically
//! exchanging a slot's contents with whatever page it displaced from the
//! previous slot (initially none). The exchange grants momentary *exclusive*
//! ownership: until the page is published again via compare-and-swap, no
//! other thread can reach it, so the bump cursor and the `used` counter may
//! be updated with plain load+store pairs. That exclusivity is the whole
//! correctness argument for the non-RMW bumps; it must hold any time those
//! fields are written.
//!
//! A page that cannot be re-published (every slot already holds another
//! page) is retired: one extra claim is reserved on it, its `active` flag is
//! cleared, and the reservation is released. The `used`/`freed` counter pair
//! then acts as an epoch: whichever thread performs the final matching
//! release observes `freed == used` on an inactive page and returns it to
//! the page source, exactly once.

use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicPtr, AtomicU16, AtomicU32, Ordering::SeqCst};

use crossbeam_utils::CachePadded;

use crate::config::{BLOCK_ALIGN, MINI_HEADER_SIZE, MINI_SLOT_COUNT, PAGE_SIZE};
use crate::error::AllocError;
use crate::page::{align_up, MINI_PAGE_TAG};
use crate::pool::PageSource;

/// Header living at the base of every page used for mini blocks.
///
/// `used` counts blocks ever carved from the page, `freed` counts release
/// calls completed against it; both grow monotonically and `freed <= used`
/// at all times. `cursor` starts at [`PAGE_SIZE`] and only decreases.
#[repr(C)]
pub struct MiniPage {
    tag: AtomicU16,
    active: AtomicU16,
    used: AtomicU32,
    freed: AtomicU32,
    cursor: AtomicU32,
}

/// The mini-block allocator: the shared slot array plus the page source
/// backing it.
pub struct MiniAllocator<S: PageSource> {
    slots: [CachePadded<AtomicPtr<MiniPage>>; MINI_SLOT_COUNT],
    source: S,
}

impl<S: PageSource> MiniAllocator<S> {
    /// Creates an allocator with every slot empty. Usable in statics.
    pub const fn new(source: S) -> Self {
        const EMPTY: CachePadded<AtomicPtr<MiniPage>> =
            CachePadded::new(AtomicPtr::new(ptr::null_mut()));
        Self {
            slots: [EMPTY; MINI_SLOT_COUNT],
            source,
        }
    }

    /// Carves a block of at least `size` bytes (`size == 0` counts as 1) out
    /// of a shared page and returns its address.
    ///
    /// The returned block is aligned to [`BLOCK_ALIGN`] and stays untouched
    /// by the allocator until it is released.
    ///
    /// # Errors
    /// Fails only when no cached page is suitable and the OS refuses to map
    /// a fresh one.
    pub fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let size = align_up(size.max(1), BLOCK_ALIGN);
        debug_assert!(size <= PAGE_SIZE - MINI_HEADER_SIZE);

        // Probe the slots. Each exchange checks out whatever the slot held
        // and deposits the page displaced by the previous probe, so this
        // thread owns at most one page at a time and owns it exclusively.
        let mut displaced: *mut MiniPage = ptr::null_mut();
        let mut claimed: Option<NonNull<MiniPage>> = None;
        for slot in &self.slots {
            let prev = slot.swap(displaced, SeqCst);
            displaced = ptr::null_mut();
            match NonNull::new(prev) {
                None => {}
                Some(page) if Self::fits(page, size) => {
                    claimed = Some(page);
                    break;
                }
                Some(page) => displaced = page.as_ptr(),
            }
        }
        // A page pushed off the end of the scan is reachable from no slot;
        // retire it so its outstanding blocks can still reclaim it.
        if let Some(page) = NonNull::new(displaced) {
            unsafe { self.retire(page) };
        }

        let page = match claimed {
            Some(page) => page,
            None => self.fresh_page()?,
        };
        let block = unsafe { self.carve(page, size) };
        unsafe { self.check_in(page) };
        Ok(block)
    }

    /// Records the release of one block carved from `page`, reclaiming the
    /// page when this was the last outstanding claim on a retired page.
    ///
    /// # Safety
    /// `page` must point at the base of a live mini page, and every block
    /// carved from it may be released at most once.
    pub unsafe fn release(&self, page: NonNull<MiniPage>) {
        let hdr = page.as_ref();
        debug_assert_eq!(hdr.tag.load(SeqCst), MINI_PAGE_TAG);
        let freed = hdr.freed.fetch_add(1, SeqCst) + 1;
        if hdr.active.load(SeqCst) == 0 && hdr.used.load(SeqCst) == freed {
            #[cfg(feature = "tracing")]
            tracing::trace!(addr = page.as_ptr() as usize, "mini page reclaimed");
            self.source.release(page.cast());
        }
    }

    /// Borrows the page source backing this allocator.
    pub fn source(&self) -> &S {
        &self.source
    }

    fn fits(page: NonNull<MiniPage>, size: usize) -> bool {
        let cursor = unsafe { page.as_ref() }.cursor.load(SeqCst) as usize;
        MINI_HEADER_SIZE + size <= cursor
    }

    /// Carves `size` bytes off the low end of the page's free space.
    ///
    /// # Safety
    /// The caller must hold slot-granted exclusive ownership of `page` and
    /// `size` must fit (see [`Self::fits`]).
    unsafe fn carve(&self, page: NonNull<MiniPage>, size: usize) -> NonNull<u8> {
        let hdr = page.as_ref();
        let cursor = hdr.cursor.load(SeqCst) - size as u32;
        hdr.cursor.store(cursor, SeqCst);
        // Plain load+store: exclusivity, not the atomic type, rules out a
        // lost update here.
        hdr.used.store(hdr.used.load(SeqCst) + 1, SeqCst);
        NonNull::new_unchecked(page.as_ptr().cast::<u8>().add(cursor as usize))
    }

    /// Publishes `page` into an empty slot, or retires it if every slot is
    /// already occupied.
    ///
    /// # Safety
    /// The caller must hold exclusive ownership of `page`.
    unsafe fn check_in(&self, page: NonNull<MiniPage>) {
        for slot in &self.slots {
            if slot
                .compare_exchange(ptr::null_mut(), page.as_ptr(), SeqCst, SeqCst)
                .is_ok()
            {
                return;
            }
        }
        self.retire(page);
    }

    /// Takes `page` out of circulation for good.
    ///
    /// # Safety
    /// The caller must hold exclusive ownership of `page`.
    unsafe fn retire(&self, page: NonNull<MiniPage>) {
        let hdr = page.as_ref();
        // Reserve one claim against this thread's own access, so the release
        // below is what balances the counters. Once `active` drops, `used`
        // never moves again.
        hdr.used.store(hdr.used.load(SeqCst) + 1, SeqCst);
        hdr.active.store(0, SeqCst);
        #[cfg(feature = "tracing")]
        tracing::trace!(addr = page.as_ptr() as usize, "mini page retired");
        self.release(page);
    }

    fn fresh_page(&self) -> Result<NonNull<MiniPage>, AllocError> {
        let raw = self.source.acquire()?;
        let page = raw.cast::<MiniPage>();
        unsafe {
            ptr::write(
                page.as_ptr(),
                MiniPage {
                    tag: AtomicU16::new(MINI_PAGE_TAG),
                    active: AtomicU16::new(1),
                    used: AtomicU32::new(0),
                    freed: AtomicU32::new(0),
                    cursor: AtomicU32::new(PAGE_SIZE as u32),
                },
            );
        }
        Ok(page)
    }
}

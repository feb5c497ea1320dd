//! Huge-block allocation: one dedicated mapping per request.
//!
//! Each huge block lives in its own mapping with a header at the mapping's
//! page-aligned base, so the release path can find it by the same address
//! masking used for mini pages. Nothing is cached on this path; releasing a
//! huge block returns its memory to the OS immediately.

use core::ptr::NonNull;
use core::sync::atomic::{AtomicU16, AtomicUsize, Ordering::SeqCst};

use crate::config::{HUGE_HEADER_SIZE, PAGE_SIZE};
use crate::error::AllocError;
use crate::page::HUGE_PAGE_TAG;
use crate::syscall;

/// Header at the base of a dedicated huge-block mapping.
///
/// `total` records how many bytes the mapping still owns after trimming, so
/// release can unmap the whole region without consulting anything else.
#[repr(C)]
pub struct HugePage {
    tag: AtomicU16,
    active: AtomicU16,
    total: AtomicUsize,
}

/// The huge-block allocator. Stateless: every request maps, every release
/// unmaps.
pub struct HugeAllocator;

impl HugeAllocator {
    /// Maps a dedicated region for `size` bytes and returns the address just
    /// past its header.
    ///
    /// # Errors
    /// Fails when the OS refuses the mapping or `size` is close enough to
    /// `usize::MAX` that the header and alignment slack will not fit.
    pub fn allocate(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        #[cfg(unix)]
        {
            // Over-allocate by one page so a misaligned mapping can be slid
            // up to the next page boundary by trimming the leading margin.
            let total = size
                .checked_add(HUGE_HEADER_SIZE + PAGE_SIZE)
                .ok_or(AllocError)?;
            let raw = unsafe { syscall::map(total) }.ok_or(AllocError)?;
            let margin = (raw.as_ptr() as usize) & (PAGE_SIZE - 1);
            let (base, total) = if margin == 0 {
                (raw, total)
            } else {
                let lead = PAGE_SIZE - margin;
                unsafe {
                    let aligned = raw.as_ptr().add(lead);
                    syscall::unmap(raw.as_ptr(), lead);
                    (NonNull::new_unchecked(aligned), total - lead)
                }
            };
            #[cfg(feature = "tracing")]
            tracing::trace!(addr = base.as_ptr() as usize, total, "huge region mapped");
            Ok(unsafe { Self::write_header(base, total) })
        }
        #[cfg(windows)]
        {
            // VirtualAlloc already aligns to the 64 KiB granularity, so the
            // mapping is exactly sized and never trimmed.
            let total = size.checked_add(HUGE_HEADER_SIZE).ok_or(AllocError)?;
            let base = unsafe { syscall::map(total) }.ok_or(AllocError)?;
            #[cfg(feature = "tracing")]
            tracing::trace!(addr = base.as_ptr() as usize, total, "huge region mapped");
            Ok(unsafe { Self::write_header(base, total) })
        }
    }

    /// Unmaps the entire region behind a huge block.
    ///
    /// # Safety
    /// `page` must point at the base of a live huge region; nothing may touch
    /// the region afterwards.
    pub unsafe fn release(&self, page: NonNull<HugePage>) {
        debug_assert_eq!(page.as_ref().tag.load(SeqCst), HUGE_PAGE_TAG);
        debug_assert_eq!(page.as_ref().active.load(SeqCst), 1);
        let total = page.as_ref().total.load(SeqCst);
        #[cfg(feature = "tracing")]
        tracing::trace!(addr = page.as_ptr() as usize, total, "huge region unmapped");
        syscall::unmap(page.as_ptr().cast(), total);
    }

    /// # Safety
    /// `base` must be the page-aligned start of a fresh mapping of at least
    /// `total >= HUGE_HEADER_SIZE` bytes.
    unsafe fn write_header(base: NonNull<u8>, total: usize) -> NonNull<u8> {
        debug_assert_eq!(base.as_ptr() as usize % PAGE_SIZE, 0);
        let page = base.cast::<HugePage>().as_ptr();
        core::ptr::write(
            page,
            HugePage {
                tag: AtomicU16::new(HUGE_PAGE_TAG),
                active: AtomicU16::new(1),
                total: AtomicUsize::new(total),
            },
        );
        NonNull::new_unchecked(base.as_ptr().add(HUGE_HEADER_SIZE))
    }
}

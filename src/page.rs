//! Shared page vocabulary: type tags, address masking, and the fatal path
//! taken when a page header fails to identify itself.
//!
//! Every page the allocator owns keeps all of its metadata at its lowest
//! address, and every page is aligned to [`PAGE_SIZE`], so the header of the
//! page enclosing any allocation is recoverable by masking the low bits off
//! the allocation's address. The first two bytes of every header are a type
//! tag telling the release path which allocator owns the page.

use crate::config::PAGE_SIZE;

/// Tag value stored at the base of a page carved into mini blocks.
pub const MINI_PAGE_TAG: u16 = 0;

/// Tag value stored at the base of a dedicated huge-block mapping.
pub const HUGE_PAGE_TAG: u16 = 1;

/// Rounds `value` up to the next multiple of `align` (a power of two).
pub const fn align_up(value: usize, align: usize) -> usize {
    (value + (align - 1)) & !(align - 1)
}

/// Masks an interior pointer down to the base of its enclosing page.
#[inline]
pub fn page_base(ptr: *mut u8) -> *mut u8 {
    ((ptr as usize) & !(PAGE_SIZE - 1)) as *mut u8
}

/// Terminates the process after detecting a corrupted page header.
///
/// Release found a tag byte matching no known page kind; the metadata this
/// allocator depends on can no longer be trusted, so continuing (or
/// unwinding, which would allocate) is not an option. The message is written
/// with a raw syscall because this function may run inside the global
/// allocator.
pub(crate) fn corruption_abort() -> ! {
    let msg = b"carve: release(): heap corruption detected\n";
    #[cfg(unix)]
    unsafe {
        libc::write(2, msg.as_ptr().cast(), msg.len());
    }
    #[cfg(windows)]
    {
        use std::io::Write;
        let _ = std::io::stderr().write_all(msg);
    }
    std::process::abort()
}

//! Raw virtual-memory mapping primitives.
//!
//! The rest of the crate only ever talks to the OS through `map` and `unmap`.
//! On Unix these are thin wrappers over `mmap`/`munmap`; `munmap` may release
//! any sub-range of a mapping, which the pool and huge paths use to trim
//! misaligned margins. On Windows, `VirtualAlloc` reservations are already
//! aligned to the 64 KiB allocation granularity and `VirtualFree` can only
//! release whole regions, so the callers never need (or attempt) partial
//! unmapping there.

use core::ptr::{self, NonNull};

/// Maps `len` bytes of zero-initialized, read-write anonymous memory.
///
/// Returns `None` if the OS refuses the mapping.
///
/// # Safety
/// `len` must be non-zero. The returned region is owned by the caller and
/// must eventually be passed back to [`unmap`].
#[cfg(unix)]
pub unsafe fn map(len: usize) -> Option<NonNull<u8>> {
    let ptr = libc::mmap(
        ptr::null_mut(),
        len,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANON,
        -1,
        0,
    );
    if ptr == libc::MAP_FAILED {
        None
    } else {
        NonNull::new(ptr.cast::<u8>())
    }
}

/// Unmaps `len` bytes starting at `ptr`.
///
/// # Safety
/// `[ptr, ptr + len)` must lie within a live mapping previously returned by
/// [`map`], and nothing may touch that range afterwards.
#[cfg(unix)]
pub unsafe fn unmap(ptr: *mut u8, len: usize) {
    libc::munmap(ptr.cast::<libc::c_void>(), len);
}

/// Maps `len` bytes of zero-initialized, read-write memory.
///
/// The returned address is aligned to the 64 KiB allocation granularity.
///
/// # Safety
/// `len` must be non-zero. The returned region must eventually be passed
/// back to [`unmap`] at its base address.
#[cfg(windows)]
pub unsafe fn map(len: usize) -> Option<NonNull<u8>> {
    use windows_sys::Win32::System::Memory::{
        VirtualAlloc, MEM_COMMIT, MEM_RESERVE, PAGE_READWRITE,
    };
    let ptr = VirtualAlloc(ptr::null_mut(), len, MEM_COMMIT | MEM_RESERVE, PAGE_READWRITE);
    NonNull::new(ptr.cast::<u8>())
}

/// Releases the entire region reserved at `ptr`.
///
/// # Safety
/// `ptr` must be the base address of a region returned by [`map`]. The `len`
/// is ignored: `MEM_RELEASE` frees whole regions and requires a size of 0.
#[cfg(windows)]
pub unsafe fn unmap(ptr: *mut u8, _len: usize) {
    use windows_sys::Win32::System::Memory::{VirtualFree, MEM_RELEASE};
    VirtualFree(ptr.cast(), 0, MEM_RELEASE);
}

//! Compile-time tunables.
//!
//! Everything here is a `pub const` so downstream builds can reason about the
//! allocator's geometry at compile time; there is no runtime configuration
//! surface.

/// Size (and alignment) of every page the allocator manages, in bytes.
///
/// Must be a power of two: the release path recovers a page header from an
/// interior pointer by masking the low bits off the address.
pub const PAGE_SIZE: usize = 64 * 1024;

/// Requests below this many bytes are carved out of shared mini pages;
/// requests at or above it get a dedicated mapping each.
///
/// Below a quarter page, the per-request cost of a dedicated mapping would
/// dominate; above it, bump-carving inside a shared page wastes too much of
/// the page to internal fragmentation.
pub const MINI_HUGE_THRESHOLD: usize = PAGE_SIZE / 4;

/// Maximum number of idle pages the free-page pool keeps resident before it
/// starts unmapping returned pages.
pub const MAX_CACHED_FREE_PAGES: usize = 32;

/// Number of shared slots through which threads discover an active mini page.
pub const MINI_SLOT_COUNT: usize = 4;

/// Every mini carve is rounded up to a multiple of this, so every address the
/// allocator hands out is at least 16-byte aligned.
pub const BLOCK_ALIGN: usize = 16;

/// Bytes reserved at the base of a mini page for its header.
///
/// `lib.rs` asserts that this matches `size_of::<MiniPage>()`.
pub const MINI_HEADER_SIZE: usize = 16;

/// Bytes reserved at the base of a huge region for its header.
///
/// `lib.rs` asserts that this matches `size_of::<HugePage>()`.
pub const HUGE_HEADER_SIZE: usize = 16;

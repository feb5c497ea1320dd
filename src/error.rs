//! Allocation failure reporting.
//!
//! Resource exhaustion (the OS refusing a mapping) is the only recoverable
//! failure in this crate and the only thing that ever travels through a
//! `Result`. Corrupted page metadata is handled by aborting the process
//! instead; see [`crate::page`].

/// The error type for allocation failures.
///
/// Carries no payload: the only cause is the OS rejecting a memory-mapping
/// request, and by the time that happens there is nothing more specific to
/// report without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("memory allocation failed")
    }
}

impl std::error::Error for AllocError {}

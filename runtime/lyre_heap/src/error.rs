//! Error types for heap operations.
//!
//! Every failure is a value-level signal: operations return
//! [`HeapResult`] and never panic or unwind across the API. Allocation
//! failures are recovered locally: the failed constructor releases
//! whatever partial state it built before returning.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::obj::{ObjKind, ObjRef};

/// Result of a heap operation.
pub type HeapResult<T> = Result<T, HeapError>;

/// A failed heap operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HeapError {
    /// Reserving backing storage (slot table, string copy buffer, or array
    /// slot buffer) failed. No partially constructed object remains.
    #[error("allocation failed: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// The slot table cannot address any more objects (32-bit indices).
    #[error("heap slot table exhausted")]
    Exhausted,

    /// The handle does not resolve to a live object: it was released, its
    /// slot was recycled, or it belongs to a different heap.
    #[error("{obj} is stale or was never allocated by this heap")]
    StaleHandle { obj: ObjRef },

    /// The object is not of the kind the operation requires.
    #[error("expected {expected} object, got {got}")]
    KindMismatch { expected: ObjKind, got: ObjKind },

    /// Index past the end of an array's fixed slot buffer.
    #[error("index {index} out of bounds for array of size {size}")]
    IndexOutOfBounds { index: usize, size: usize },
}

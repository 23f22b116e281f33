//! Reference-counted object heap for the Lyre runtime.
//!
//! A small closed set of dynamic value kinds (int, float, string,
//! 3-component vector, fixed-size array) stored behind one polymorphic
//! handle, kept alive by explicit reference counts rather than a tracing
//! collector. Destruction is deterministic: the release that drops an
//! object's count to zero frees it on the spot, cascading through owned
//! children.
//!
//! Objects live in a [`Heap`]; a handle ([`ObjRef`]) is a `Copy`
//! index + generation pair that never borrows the heap. Ownership is a
//! protocol, not a type: whoever holds an owning handle must eventually
//! [`Heap::release`] it exactly once, and takes extra owners with
//! [`Heap::retain`].
//!
//! ```
//! use lyre_heap::Heap;
//!
//! let mut heap = Heap::new();
//! let five = heap.alloc_int(5)?;
//! let arr = heap.alloc_array(2)?;
//! heap.array_set(arr, 0, five)?;
//! heap.release(five); // the array keeps its own reference
//! assert_eq!(heap.array_get(arr, 0)?, Some(five));
//! heap.release(arr); // frees the array and, with it, the integer
//! assert!(heap.is_empty());
//! # Ok::<(), lyre_heap::HeapError>(())
//! ```
//!
//! # Limitations
//!
//! - **Cycles leak.** There is no cycle detection and no weak handles; an
//!   array that contains itself (directly or transitively) is never
//!   reclaimed. Keep ownership graphs acyclic.
//! - **Single-threaded by construction.** Counts are plain integers; all
//!   mutation goes through `&mut Heap`, so the borrow checker enforces the
//!   external-serialization discipline. Wrap the heap in a lock or keep it
//!   on one thread if sharing is needed.
//! - **Counts saturate.** Past `u32::MAX` owners an object is pinned for
//!   the life of the heap instead of wrapping.

mod error;
mod heap;
mod obj;
mod stats;

pub use error::{HeapError, HeapResult};
pub use heap::Heap;
pub use obj::{ObjKind, ObjRef, Payload, Vector3};
pub use stats::HeapStats;

//! Object handles and payload representation.
//!
//! `ObjRef` is the canonical object handle: a 32-bit slot index paired with
//! a 32-bit generation. Objects live in a [`Heap`](crate::Heap); handles are
//! `Copy`, comparison is O(1), and a handle never borrows the heap; every
//! operation revalidates it against the slot's current generation, so a
//! handle that outlives its object resolves to nothing instead of to
//! recycled memory.
//!
//! # Design
//!
//! - 32-bit indices allow 4+ billion live objects
//! - Generations detect handles that survived a free/reuse of their slot
//! - Lightweight passing: a handle is exactly 8 bytes

use std::fmt;

/// Handle to an object owned by a [`Heap`](crate::Heap).
///
/// An `ObjRef` does not own anything by itself. Ownership is a protocol:
/// whoever holds an *owning* handle must eventually pass it to
/// [`Heap::release`](crate::Heap::release) exactly once. Handles obtained
/// without a matching retain (e.g. from
/// [`Heap::array_get`](crate::Heap::array_get)) are *borrowed* and stay
/// valid only while some owner keeps the object alive.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ObjRef {
    index: u32,
    generation: u32,
}

impl ObjRef {
    /// Create a handle for a slot. Only the heap hands these out.
    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index this handle points at.
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// The slot generation this handle was issued for.
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjRef({}g{})", self.index, self.generation)
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}g{}", self.index, self.generation)
    }
}

// Compile-time size assertion: ObjRef must be exactly 8 bytes
const _: () = assert!(std::mem::size_of::<ObjRef>() == 8);

/// Object kind discriminator.
///
/// Fieldless mirror of [`Payload`] for introspection and error reporting.
/// The kind set is closed; it must stay in sync with `Payload`, which the
/// exhaustive matches in this crate enforce at compile time.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ObjKind {
    /// 64-bit signed integer.
    Int,
    /// Single-precision float.
    Float,
    /// Owned string.
    Str,
    /// Three owning handles (components may be any kind).
    Vector3,
    /// Fixed-size slot buffer of owning handles.
    Array,
}

impl ObjKind {
    /// Human-readable kind name.
    pub const fn name(self) -> &'static str {
        match self {
            ObjKind::Int => "int",
            ObjKind::Float => "float",
            ObjKind::Str => "str",
            ObjKind::Vector3 => "vector3",
            ObjKind::Array => "array",
        }
    }
}

impl fmt::Display for ObjKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Three owning handles.
///
/// Components are not type-restricted: a vector of strings is as legal as a
/// vector of ints. The vector owns one reference to each component for as
/// long as it lives.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Vector3 {
    pub x: ObjRef,
    pub y: ObjRef,
    pub z: ObjRef,
}

/// Kind-specific object data.
///
/// The composite variants (`Vector3`, `Array`) hold *owning* handles: the
/// heap releases each of them exactly once when the containing object is
/// freed. Array slots are `None` until populated and the element count is
/// fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Int(i64),
    Float(f32),
    Str(String),
    Vector3(Vector3),
    Array(Vec<Option<ObjRef>>),
}

impl Payload {
    /// The kind tag for this payload.
    pub fn kind(&self) -> ObjKind {
        match self {
            Payload::Int(_) => ObjKind::Int,
            Payload::Float(_) => ObjKind::Float,
            Payload::Str(_) => ObjKind::Str,
            Payload::Vector3(_) => ObjKind::Vector3,
            Payload::Array(_) => ObjKind::Array,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn handle_is_copy() {
        let a = ObjRef::new(3, 1);
        let b = a; // Copy, not move
        assert_eq!(a, b);
    }

    #[test]
    fn handle_equality_includes_generation() {
        assert_eq!(ObjRef::new(7, 0), ObjRef::new(7, 0));
        assert_ne!(ObjRef::new(7, 0), ObjRef::new(7, 1));
        assert_ne!(ObjRef::new(7, 0), ObjRef::new(8, 0));
    }

    #[test]
    fn handle_display() {
        assert_eq!(ObjRef::new(12, 3).to_string(), "obj#12g3");
        assert_eq!(format!("{:?}", ObjRef::new(0, 0)), "ObjRef(0g0)");
    }

    #[test]
    fn kind_names() {
        assert_eq!(ObjKind::Int.name(), "int");
        assert_eq!(ObjKind::Float.name(), "float");
        assert_eq!(ObjKind::Str.name(), "str");
        assert_eq!(ObjKind::Vector3.name(), "vector3");
        assert_eq!(ObjKind::Array.name(), "array");
        assert_eq!(ObjKind::Array.to_string(), "array");
    }

    #[test]
    fn payload_kind_mapping() {
        let r = ObjRef::new(0, 0);
        assert_eq!(Payload::Int(5).kind(), ObjKind::Int);
        assert_eq!(Payload::Float(1.5).kind(), ObjKind::Float);
        assert_eq!(Payload::Str(String::from("hi")).kind(), ObjKind::Str);
        assert_eq!(
            Payload::Vector3(Vector3 { x: r, y: r, z: r }).kind(),
            ObjKind::Vector3,
        );
        assert_eq!(Payload::Array(vec![None, Some(r)]).kind(), ObjKind::Array);
    }
}

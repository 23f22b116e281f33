//! The reference-counted object heap.
//!
//! Objects live in slots owned by a [`Heap`]; embedding code holds
//! [`ObjRef`] handles and drives the lifecycle manually:
//!
//! - constructors hand back a fresh handle with a count of one,
//! - [`Heap::retain`] takes an additional owning reference,
//! - [`Heap::release`] gives one up; the transition to zero frees the
//!   object and releases every owned child exactly once.
//!
//! Freed slots are recycled through a free list; their generation is bumped
//! so handles that outlive their object resolve to nothing instead of to
//! the slot's next tenant.
//!
//! # Limitations
//!
//! - No cycle detection: an array that (directly or transitively) contains
//!   itself is never reclaimed.
//! - No internal synchronization: all mutation goes through `&mut Heap`,
//!   so sharing across threads is the embedder's problem to solve.

use std::collections::BTreeMap;

use crate::error::{HeapError, HeapResult};
use crate::obj::{ObjKind, ObjRef, Payload, Vector3};
use crate::stats::HeapStats;

/// A live object: its reference count plus kind-specific data.
#[derive(Debug)]
struct Obj {
    strong: u32,
    payload: Payload,
}

/// One storage slot. `obj` is `None` while the slot sits on the free list;
/// `generation` counts how many times the slot has been vacated.
#[derive(Debug)]
struct Slot {
    generation: u32,
    obj: Option<Obj>,
}

/// Reference-counted storage for dynamic values.
#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty heap with room for `capacity` objects before the
    /// slot table grows.
    pub fn with_capacity(capacity: usize) -> Self {
        Heap {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    // ── Constructors ────────────────────────────────────────────────

    /// Allocate an integer object.
    pub fn alloc_int(&mut self, value: i64) -> HeapResult<ObjRef> {
        self.alloc(Payload::Int(value))
    }

    /// Allocate a float object.
    pub fn alloc_float(&mut self, value: f32) -> HeapResult<ObjRef> {
        self.alloc(Payload::Float(value))
    }

    /// Allocate a string object holding an independent copy of `value`.
    pub fn alloc_str(&mut self, value: &str) -> HeapResult<ObjRef> {
        let mut copy = String::new();
        copy.try_reserve_exact(value.len())?;
        copy.push_str(value);
        self.alloc(Payload::Str(copy))
    }

    /// Allocate a vector object, taking a new owning reference to each of
    /// `x`, `y`, `z`. The caller's own handles remain the caller's
    /// responsibility.
    ///
    /// Fails with [`HeapError::StaleHandle`] if any component is dead.
    /// The check happens before any count changes, so a failed
    /// construction leaves the components' counts untouched.
    pub fn alloc_vector3(&mut self, x: ObjRef, y: ObjRef, z: ObjRef) -> HeapResult<ObjRef> {
        for component in [x, y, z] {
            if !self.contains(component) {
                return Err(HeapError::StaleHandle { obj: component });
            }
        }
        let obj = self.alloc(Payload::Vector3(Vector3 { x, y, z }))?;
        self.retain(x);
        self.retain(y);
        self.retain(z);
        Ok(obj)
    }

    /// Allocate an array object with `size` empty slots. The element count
    /// is fixed for the life of the array.
    pub fn alloc_array(&mut self, size: usize) -> HeapResult<ObjRef> {
        let mut elements = Vec::new();
        elements.try_reserve_exact(size)?;
        elements.resize(size, None);
        self.alloc(Payload::Array(elements))
    }

    /// Place a payload into a fresh slot with an initial count of one.
    fn alloc(&mut self, payload: Payload) -> HeapResult<ObjRef> {
        let kind = payload.kind();
        let obj = Obj { strong: 1, payload };
        let r = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.obj = Some(obj);
            ObjRef::new(index, slot.generation)
        } else {
            let index = u32::try_from(self.slots.len()).map_err(|_| HeapError::Exhausted)?;
            self.slots.try_reserve(1)?;
            self.slots.push(Slot {
                generation: 0,
                obj: Some(obj),
            });
            ObjRef::new(index, 0)
        };
        tracing::trace!(obj = %r, kind = %kind, "allocated");
        Ok(r)
    }

    // ── Reference counting ──────────────────────────────────────────

    /// Take an additional owning reference to `obj`.
    ///
    /// The count saturates at `u32::MAX` instead of wrapping; a saturated
    /// object is pinned for the life of the heap. A stale handle is a
    /// logged no-op.
    pub fn retain(&mut self, obj: ObjRef) {
        let Some(live) = self.live_mut(obj) else {
            tracing::warn!(obj = %obj, "retain on stale handle ignored");
            return;
        };
        live.strong = live.strong.saturating_add(1);
        tracing::trace!(obj = %obj, strong = live.strong, "retained");
    }

    /// Give up one owning reference to `obj`. The count reaching zero
    /// frees the object: kind-specific storage is released and every owned
    /// child is itself released exactly once, cascading to children that
    /// held their last reference. A stale handle is a logged no-op.
    ///
    /// This is the only path by which an object is destroyed.
    pub fn release(&mut self, obj: ObjRef) {
        // LIFO worklist instead of recursion: pushing a composite's
        // children in reverse yields the same depth-first order without
        // consuming call stack on deeply nested structures.
        let mut pending = vec![obj];
        while let Some(r) = pending.pop() {
            let Some(live) = self.live_mut(r) else {
                tracing::warn!(obj = %r, "release on stale handle ignored");
                continue;
            };
            if live.strong == u32::MAX {
                tracing::trace!(obj = %r, "count saturated, object stays pinned");
                continue;
            }
            live.strong -= 1;
            tracing::trace!(obj = %r, strong = live.strong, "released");
            if live.strong == 0 {
                self.free_obj(r, &mut pending);
            }
        }
    }

    /// Tear down an object whose count just reached zero: vacate its slot,
    /// bump the generation, and queue its owned children for release
    /// (vector components as x, y, z; array elements in slot order).
    fn free_obj(&mut self, obj: ObjRef, pending: &mut Vec<ObjRef>) {
        let index = obj.index() as usize;
        let Some(dead) = self.slots[index].obj.take() else {
            debug_assert!(false, "free_obj on vacant slot {obj}");
            return;
        };
        self.slots[index].generation = self.slots[index].generation.wrapping_add(1);
        tracing::debug!(obj = %obj, kind = %dead.payload.kind(), "freeing");
        match dead.payload {
            Payload::Int(_) | Payload::Float(_) => {}
            Payload::Str(text) => drop(text),
            Payload::Vector3(v) => {
                pending.push(v.z);
                pending.push(v.y);
                pending.push(v.x);
            }
            Payload::Array(elements) => {
                pending.extend(elements.into_iter().rev().flatten());
            }
        }
        self.free.push(obj.index());
    }

    // ── Array mutation ──────────────────────────────────────────────

    /// Store `value` into `array[index]`, releasing any displaced
    /// occupant. On success the array co-owns `value` alongside the
    /// caller, whose own handle is untouched.
    ///
    /// Fails without mutating anything if `array` or `value` is stale,
    /// `array` is not an array, or `index` is out of range.
    pub fn array_set(&mut self, array: ObjRef, index: usize, value: ObjRef) -> HeapResult<()> {
        if !self.contains(value) {
            return Err(HeapError::StaleHandle { obj: value });
        }
        {
            let target = self
                .live(array)
                .ok_or(HeapError::StaleHandle { obj: array })?;
            let Payload::Array(elements) = &target.payload else {
                return Err(HeapError::KindMismatch {
                    expected: ObjKind::Array,
                    got: target.payload.kind(),
                });
            };
            if index >= elements.len() {
                return Err(HeapError::IndexOutOfBounds {
                    index,
                    size: elements.len(),
                });
            }
        }
        // Retain before displacing: storing a slot's current occupant back
        // into the same slot must never drop its count to zero in between.
        self.retain(value);
        let displaced = self.live_mut(array).and_then(|target| {
            match &mut target.payload {
                Payload::Array(elements) => elements[index].replace(value),
                // Unreachable: validated above, and the retain cannot
                // have freed the array.
                _ => None,
            }
        });
        if let Some(old) = displaced {
            self.release(old);
        }
        Ok(())
    }

    /// Read `array[index]` without taking ownership.
    ///
    /// `Ok(None)` means the slot is legitimately empty; a dead handle, a
    /// non-array object, and an out-of-range index are distinct errors.
    /// The borrowed handle stays valid only until the next `array_set` on
    /// that slot or release of the array.
    pub fn array_get(&self, array: ObjRef, index: usize) -> HeapResult<Option<ObjRef>> {
        let target = self
            .live(array)
            .ok_or(HeapError::StaleHandle { obj: array })?;
        let Payload::Array(elements) = &target.payload else {
            return Err(HeapError::KindMismatch {
                expected: ObjKind::Array,
                got: target.payload.kind(),
            });
        };
        elements
            .get(index)
            .copied()
            .ok_or(HeapError::IndexOutOfBounds {
                index,
                size: elements.len(),
            })
    }

    // ── Introspection ───────────────────────────────────────────────

    /// Read access to an object's data. Mutation stays behind the
    /// operations above.
    pub fn payload(&self, obj: ObjRef) -> HeapResult<&Payload> {
        self.live(obj)
            .map(|live| &live.payload)
            .ok_or(HeapError::StaleHandle { obj })
    }

    /// The object's kind tag.
    pub fn kind(&self, obj: ObjRef) -> HeapResult<ObjKind> {
        self.payload(obj).map(Payload::kind)
    }

    /// Number of owning references currently outstanding.
    pub fn strong_count(&self, obj: ObjRef) -> HeapResult<u32> {
        self.live(obj)
            .map(|live| live.strong)
            .ok_or(HeapError::StaleHandle { obj })
    }

    /// Whether `obj` resolves to a live object in this heap.
    pub fn contains(&self, obj: ObjRef) -> bool {
        self.live(obj).is_some()
    }

    /// Number of live objects.
    pub fn live_objects(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether the heap holds no live objects.
    pub fn is_empty(&self) -> bool {
        self.live_objects() == 0
    }

    /// Snapshot of slot occupancy with a per-kind breakdown.
    pub fn stats(&self) -> HeapStats {
        let mut objects_by_kind = BTreeMap::new();
        for slot in &self.slots {
            if let Some(obj) = &slot.obj {
                *objects_by_kind.entry(obj.payload.kind().name()).or_insert(0) += 1;
            }
        }
        HeapStats {
            live_objects: self.live_objects(),
            free_slots: self.free.len(),
            total_slots: self.slots.len(),
            objects_by_kind,
        }
    }

    // ── Slot resolution ─────────────────────────────────────────────

    fn live(&self, obj: ObjRef) -> Option<&Obj> {
        let slot = self.slots.get(obj.index() as usize)?;
        if slot.generation != obj.generation() {
            return None;
        }
        slot.obj.as_ref()
    }

    fn live_mut(&mut self, obj: ObjRef) -> Option<&mut Obj> {
        let slot = self.slots.get_mut(obj.index() as usize)?;
        if slot.generation != obj.generation() {
            return None;
        }
        slot.obj.as_mut()
    }
}

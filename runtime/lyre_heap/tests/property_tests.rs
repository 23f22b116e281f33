//! Property-based tests for the reference-count engine.
//!
//! These drive random operation sequences against a shadow model of the
//! expected counts and check that the heap agrees after every step. They
//! complement the unit tests in `src/`, which pin down the individual
//! lifecycle rules on hand-written scenarios.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use lyre_heap::{Heap, HeapError};
use proptest::prelude::*;

/// Number of pre-allocated objects the random operations draw from.
const POOL: usize = 8;

proptest! {
    #[test]
    fn alloc_then_release_leaves_heap_empty(
        values in prop::collection::vec(any::<i64>(), 0..64),
    ) {
        let mut heap = Heap::new();
        let refs: Vec<_> = values
            .iter()
            .map(|&v| heap.alloc_int(v).unwrap())
            .collect();
        for &r in &refs {
            prop_assert_eq!(heap.strong_count(r).unwrap(), 1);
        }
        for &r in &refs {
            heap.release(r);
        }
        prop_assert!(heap.is_empty());
    }

    #[test]
    fn counts_track_a_shadow_model(
        ops in prop::collection::vec((any::<bool>(), 0..POOL), 0..256),
    ) {
        let mut heap = Heap::new();
        let refs: Vec<_> = (0..POOL)
            .map(|i| heap.alloc_int(i as i64).unwrap())
            .collect();
        let mut model = vec![1u32; POOL];

        for (is_retain, i) in ops {
            if is_retain {
                heap.retain(refs[i]);
                // Retaining a dead object is a no-op.
                if model[i] > 0 {
                    model[i] += 1;
                }
            } else {
                heap.release(refs[i]);
                model[i] = model[i].saturating_sub(1);
            }
            for (j, &expected) in model.iter().enumerate() {
                if expected == 0 {
                    prop_assert!(!heap.contains(refs[j]));
                } else {
                    prop_assert_eq!(heap.strong_count(refs[j]).unwrap(), expected);
                }
            }
        }
    }

    #[test]
    fn array_slots_co_own_the_latest_occupant(
        size in 1usize..8,
        sets in prop::collection::vec((0usize..8, 0usize..POOL), 0..64),
    ) {
        let mut heap = Heap::new();
        let arr = heap.alloc_array(size).unwrap();
        let refs: Vec<_> = (0..POOL)
            .map(|i| heap.alloc_int(i as i64).unwrap())
            .collect();
        let mut model: Vec<Option<usize>> = vec![None; size];

        for (slot, value) in sets {
            let result = heap.array_set(arr, slot, refs[value]);
            if slot < size {
                prop_assert_eq!(result, Ok(()));
                model[slot] = Some(value);
            } else {
                prop_assert_eq!(
                    result,
                    Err(HeapError::IndexOutOfBounds { index: slot, size }),
                );
            }
        }

        for (slot, &expected) in model.iter().enumerate() {
            prop_assert_eq!(
                heap.array_get(arr, slot).unwrap(),
                expected.map(|i| refs[i]),
            );
        }
        for (i, &r) in refs.iter().enumerate() {
            let slots_holding = model.iter().filter(|&&m| m == Some(i)).count();
            prop_assert_eq!(
                heap.strong_count(r).unwrap(),
                1 + slots_holding as u32,
            );
        }

        // Dropping the caller's references leaves the array as sole owner;
        // releasing the array then tears everything down.
        for &r in &refs {
            heap.release(r);
        }
        heap.release(arr);
        prop_assert!(heap.is_empty());
    }
}

//! Per-encode/decode-session reference graph: tracks object identity so a
//! multiply-referenced value shares a single `$id`, and cycles encode and
//! decode in O(#nodes). A graph is created fresh for each top-level
//! `encode`/`decode` call and discarded when it returns — it is never
//! shared across sessions.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Tracks `Arc` identity (pointer address) to a dense session-local id
/// during encoding.
#[derive(Default)]
pub struct EncodeRefGraph {
    seen: HashMap<*const (), u64>,
    next_id: u64,
}

/// Outcome of registering a value with the encode-side graph.
pub enum EncodeSlot {
    /// First encounter: the caller must emit the full body tagged with
    /// this id.
    First(u64),
    /// A later encounter of the same object: the caller emits only a
    /// `$ref` to this id.
    Seen(u64),
}

impl EncodeRefGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reference-type value for the first or a later time.
    pub fn slot_for<T: ?Sized>(&mut self, value: &Arc<T>) -> EncodeSlot {
        let ptr = Arc::as_ptr(value) as *const ();
        if let Some(&id) = self.seen.get(&ptr) {
            return EncodeSlot::Seen(id);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.seen.insert(ptr, id);
        EncodeSlot::First(id)
    }
}

/// Tracks session-local ids to their decoded object during decoding, so a
/// later `$ref` resolves to the exact same `Arc` the first encounter
/// produced (preserving object identity within the session).
#[derive(Default)]
pub struct DecodeRefGraph {
    by_id: HashMap<u64, Arc<dyn Any + Send + Sync>>,
}

impl DecodeRefGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u64, value: Arc<dyn Any + Send + Sync>) {
        self.by_id.insert(id, value);
    }

    pub fn resolve(&self, id: u64) -> Option<Arc<dyn Any + Send + Sync>> {
        self.by_id.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_encounter_then_seen() {
        let mut graph = EncodeRefGraph::new();
        let shared: Arc<i32> = Arc::new(42);

        match graph.slot_for(&shared) {
            EncodeSlot::First(id) => assert_eq!(id, 0),
            EncodeSlot::Seen(_) => panic!("expected first encounter"),
        }

        match graph.slot_for(&shared) {
            EncodeSlot::Seen(id) => assert_eq!(id, 0),
            EncodeSlot::First(_) => panic!("expected repeat encounter"),
        }
    }

    #[test]
    fn distinct_values_get_distinct_ids() {
        let mut graph = EncodeRefGraph::new();
        let a: Arc<i32> = Arc::new(1);
        let b: Arc<i32> = Arc::new(2);

        let EncodeSlot::First(id_a) = graph.slot_for(&a) else { panic!() };
        let EncodeSlot::First(id_b) = graph.slot_for(&b) else { panic!() };
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn decode_graph_round_trips_identity() {
        let mut graph = DecodeRefGraph::new();
        let value: Arc<dyn Any + Send + Sync> = Arc::new(7i32);
        graph.insert(0, value.clone());
        let resolved = graph.resolve(0).unwrap();
        assert!(Arc::ptr_eq(&value, &resolved));
    }
}

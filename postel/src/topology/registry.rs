use indexmap::IndexMap;

use crate::errors::{ErrorKind, PostelError, PostelResult};
use crate::topology::{NodeId, NodeRecord};

/// Id-indexed store of all live nodes, authoritative for existence.
///
/// Iteration follows insertion order; removal keeps the relative order of
/// the remaining records.
#[derive(Debug, Default)]
pub(crate) struct NodeRegistry {
    nodes: IndexMap<NodeId, NodeRecord>,
}

impl NodeRegistry {
    pub(crate) fn new() -> Self {
        NodeRegistry {
            nodes: IndexMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, record: NodeRecord) -> PostelResult<()> {
        if self.nodes.contains_key(&record.id) {
            log::error!("Node {} is already registered", record.id);
            return Err(PostelError::new(
                &format!("Node {} is already registered", record.id),
                ErrorKind::DuplicateId,
            ));
        }
        self.nodes.insert(record.id, record);
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> PostelResult<NodeRecord> {
        self.nodes.shift_remove(&id).ok_or_else(|| not_found(id))
    }

    pub(crate) fn get(&self, id: NodeId) -> PostelResult<&NodeRecord> {
        self.nodes.get(&id).ok_or_else(|| not_found(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> PostelResult<&mut NodeRecord> {
        self.nodes.get_mut(&id).ok_or_else(|| not_found(id))
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub(crate) fn list(&self) -> impl Iterator<Item = &NodeRecord> + '_ {
        self.nodes.values()
    }

    pub(crate) fn drain(&mut self) -> Vec<NodeRecord> {
        self.nodes.drain(..).map(|(_, record)| record).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

fn not_found(id: NodeId) -> PostelError {
    PostelError::new(&format!("Node {} not found", id), ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64) -> NodeRecord {
        NodeRecord::new(NodeId::new(id), id as f64, id as f64 * 2.0)
    }

    #[test]
    fn test_insert_and_get() {
        let mut registry = NodeRegistry::new();
        registry.insert(record(1)).unwrap();
        let found = registry.get(NodeId::new(1)).unwrap();
        assert_eq!((found.x, found.y), (1.0, 2.0));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(NodeId::new(1)));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut registry = NodeRegistry::new();
        registry.insert(record(1)).unwrap();
        let err = registry.insert(record(1)).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DuplicateId);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let mut registry = NodeRegistry::new();
        assert_eq!(
            registry.remove(NodeId::new(4)).unwrap_err().kind(),
            &ErrorKind::NotFound
        );
        assert_eq!(
            registry.get(NodeId::new(4)).unwrap_err().kind(),
            &ErrorKind::NotFound
        );
        assert!(registry.get_mut(NodeId::new(4)).is_err());
    }

    #[test]
    fn test_list_keeps_insertion_order_after_remove() {
        let mut registry = NodeRegistry::new();
        for id in [5, 2, 9, 1] {
            registry.insert(record(id)).unwrap();
        }
        registry.remove(NodeId::new(2)).unwrap();
        let ids: Vec<u64> = registry.list().map(|r| r.id.value()).collect();
        assert_eq!(ids, vec![5, 9, 1]);

        // restartable
        let again: Vec<u64> = registry.list().map(|r| r.id.value()).collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn test_drain_empties_in_order() {
        let mut registry = NodeRegistry::new();
        for id in 1..=3 {
            registry.insert(record(id)).unwrap();
        }
        let drained: Vec<u64> = registry.drain().iter().map(|r| r.id.value()).collect();
        assert_eq!(drained, vec![1, 2, 3]);
        assert_eq!(registry.len(), 0);
    }
}

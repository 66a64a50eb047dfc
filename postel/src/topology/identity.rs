use crate::common::FIRST_NODE_ID;
use crate::errors::{ErrorKind, PostelError, PostelResult};
use crate::topology::NodeId;

/// Monotonic node id counter.
///
/// Must only be used while the topology lock is held. Once `u64::MAX` has
/// been issued every further call fails with `IdentitySpaceExhausted`; the
/// counter never wraps.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: u64,
    exhausted: bool,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self::starting_at(FIRST_NODE_ID)
    }

    pub(crate) fn starting_at(next: u64) -> Self {
        IdAllocator {
            next,
            exhausted: false,
        }
    }

    pub(crate) fn next_id(&mut self) -> PostelResult<NodeId> {
        if self.exhausted {
            log::error!("Node id space exhausted");
            return Err(PostelError::new(
                "No node ids left to allocate",
                ErrorKind::IdentitySpaceExhausted,
            ));
        }

        let id = self.next;
        match self.next.checked_add(1) {
            Some(next) => self.next = next,
            None => self.exhausted = true,
        }
        Ok(NodeId::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut allocator = IdAllocator::new();
        let ids: Vec<u64> = (0..5).map(|_| allocator.next_id().unwrap().value()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_last_id_issued_once_then_exhausted() {
        let mut allocator = IdAllocator::starting_at(u64::MAX - 1);
        assert_eq!(allocator.next_id().unwrap().value(), u64::MAX - 1);
        assert_eq!(allocator.next_id().unwrap().value(), u64::MAX);

        let err = allocator.next_id().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::IdentitySpaceExhausted);
        assert!(allocator.next_id().is_err());
    }
}

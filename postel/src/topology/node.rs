use std::fmt::{Display, Formatter};

use postel_spatial::Placement;

/// Unique identifier of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u64);

impl NodeId {
    pub fn new(value: u64) -> Self {
        NodeId(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        NodeId(value)
    }
}

/// Opaque handle of the visual primitive a renderer drew for a node.
///
/// The engine stores and forwards it but never interprets the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderHandle(u64);

impl RenderHandle {
    pub fn new(raw: u64) -> Self {
        RenderHandle(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// The `{id, x, y}` triple handed to the console.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeView {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

impl Display for NodeView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ({}, {})", self.id, self.x, self.y)
    }
}

/// A node's position in the spatial index at the time it was read.
///
/// `axis` is 0 when the node's slot splits on `y` and 1 when it splits on `x`.
/// Links go stale on the next mutation of the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeLinks {
    pub axis: u8,
    pub depth: usize,
    pub parent: Option<NodeId>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

impl From<Placement<NodeId>> for TreeLinks {
    fn from(placement: Placement<NodeId>) -> Self {
        TreeLinks {
            axis: placement.axis.index(),
            depth: placement.depth,
            parent: placement.parent,
            left: placement.left,
            right: placement.right,
        }
    }
}

/// Full node record returned by [`crate::topology::TopologyEngine::get`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub tree: TreeLinks,
    pub render_handle: Option<RenderHandle>,
}

impl Node {
    pub fn view(&self) -> NodeView {
        NodeView {
            id: self.id,
            x: self.x,
            y: self.y,
        }
    }
}

/// Registry entry. Tree links live in the index and are joined in on read.
#[derive(Debug, Clone)]
pub(crate) struct NodeRecord {
    pub(crate) id: NodeId,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) render_handle: Option<RenderHandle>,
}

impl NodeRecord {
    pub(crate) fn new(id: NodeId, x: f64, y: f64) -> Self {
        NodeRecord {
            id,
            x,
            y,
            render_handle: None,
        }
    }

    pub(crate) fn view(&self) -> NodeView {
        NodeView {
            id: self.id,
            x: self.x,
            y: self.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postel_spatial::Axis;

    #[test]
    fn test_node_id_display_and_order() {
        let a = NodeId::new(3);
        let b = NodeId::from(11);
        assert_eq!(a.to_string(), "3");
        assert!(a < b);
        assert_eq!(b.value(), 11);
    }

    #[test]
    fn test_node_view_display() {
        let view = NodeView {
            id: NodeId::new(2),
            x: 10.5,
            y: 4.0,
        };
        assert_eq!(view.to_string(), "2: (10.5, 4)");
    }

    #[test]
    fn test_tree_links_from_placement() {
        let placement = Placement {
            axis: Axis::X,
            depth: 1,
            parent: Some(NodeId::new(1)),
            left: None,
            right: Some(NodeId::new(5)),
        };
        let links = TreeLinks::from(placement);
        assert_eq!(links.axis, 1);
        assert_eq!(links.depth, 1);
        assert_eq!(links.parent, Some(NodeId::new(1)));
        assert_eq!(links.right, Some(NodeId::new(5)));
    }

    #[test]
    fn test_record_view() {
        let mut record = NodeRecord::new(NodeId::new(9), 1.0, 2.0);
        record.render_handle = Some(RenderHandle::new(77));
        let view = record.view();
        assert_eq!(view.id, NodeId::new(9));
        assert_eq!((view.x, view.y), (1.0, 2.0));
        assert_eq!(record.render_handle.map(|h| h.raw()), Some(77));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_node_view_is_serializable() {
        fn assert_serde<T: serde::Serialize + serde::de::DeserializeOwned>() {}
        assert_serde::<NodeView>();
        assert_serde::<Node>();
    }
}

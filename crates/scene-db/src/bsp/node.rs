//! BSP tree node implementation.

use slotmap::new_key_type;

use crate::drawable::Drawable;

new_key_type! {
    /// Handle to a [`BspNode`] in a scene database's node arena.
    pub struct NodeKey;
}

/// Which child of a node a drawable belongs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
}

/// A node in the BSP tree.
///
/// Each node holds one drawable. For static nodes with a plane, the front
/// and back children hold drawables on the respective sides of that plane.
/// Static nodes without a plane and all dynamic nodes order their children
/// by other means: the back child is drawn first.
#[derive(Debug)]
pub struct BspNode {
    drawable: Box<dyn Drawable>,

    /// Added for the current frame only.
    dynamic: bool,

    /// Number of static drawables stored beneath this node.
    count: usize,

    front: Option<NodeKey>,
    back: Option<NodeKey>,
}

impl BspNode {
    pub fn new(drawable: Box<dyn Drawable>, dynamic: bool) -> Self {
        Self {
            drawable,
            dynamic,
            count: 0,
            front: None,
            back: None,
        }
    }

    #[inline]
    pub fn drawable(&self) -> &dyn Drawable {
        self.drawable.as_ref()
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub(crate) fn increment_count(&mut self) {
        self.count += 1;
    }

    #[inline]
    pub fn front(&self) -> Option<NodeKey> {
        self.front
    }

    #[inline]
    pub fn back(&self) -> Option<NodeKey> {
        self.back
    }

    #[inline]
    pub fn child(&self, side: Side) -> Option<NodeKey> {
        match side {
            Side::Front => self.front,
            Side::Back => self.back,
        }
    }

    #[inline]
    pub fn set_child(&mut self, side: Side, child: Option<NodeKey>) {
        match side {
            Side::Front => self.front = child,
            Side::Back => self.back = child,
        }
    }

    /// Checks if this node has any children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.front.is_none() && self.back.is_none()
    }

    /// True if the node's plane can order the drawables around it.
    ///
    /// Only static nodes partition space; a dynamic node is gone next frame.
    pub fn partitions(&self) -> bool {
        !self.dynamic && self.drawable.plane().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{make_cube, make_wall};
    use slotmap::SlotMap;

    #[test]
    fn new_node_is_leaf() {
        let node = BspNode::new(Box::new(make_wall(1.0, 0)), false);

        assert!(node.is_leaf());
        assert_eq!(node.count(), 0);
        assert!(!node.is_dynamic());
    }

    #[test]
    fn set_children() {
        let mut arena: SlotMap<NodeKey, BspNode> = SlotMap::with_key();
        let child = arena.insert(BspNode::new(Box::new(make_wall(2.0, 1)), false));
        let mut node = BspNode::new(Box::new(make_wall(1.0, 0)), false);

        node.set_child(Side::Back, Some(child));

        assert_eq!(node.back(), Some(child));
        assert_eq!(node.child(Side::Front), None);
        assert!(!node.is_leaf());
    }

    #[test]
    fn only_static_planar_nodes_partition() {
        assert!(BspNode::new(Box::new(make_wall(1.0, 0)), false).partitions());
        assert!(!BspNode::new(Box::new(make_wall(1.0, 0)), true).partitions());
        assert!(!BspNode::new(Box::new(make_cube([0.0; 3], 0)), false).partitions());
    }
}

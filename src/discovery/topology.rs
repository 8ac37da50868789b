//! The master's map of the grid: which id sits where, with which role, and
//! through which edge it was reached.

use heapless::Vec;

use super::MAX_NODES;
use crate::protocol::{Direction, DirectionSet, NodeType, Position};

/// Parent link of a discovered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub parent: u8,
    /// Side of the parent the node was found on.
    pub via: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridNode {
    pub id: u8,
    pub node_type: NodeType,
    pub position: Position,
    /// `None` for the master.
    pub link: Option<Link>,
}

impl GridNode {
    /// Side of this node facing its parent.
    pub fn entry(&self) -> Option<Direction> {
        self.link.map(|l| l.via.opposite())
    }
}

#[derive(Debug)]
pub struct Topology {
    nodes: Vec<GridNode, MAX_NODES>,
}

impl Topology {
    /// A grid holding only the master, at the origin.
    pub fn new(master_id: u8, master_type: NodeType) -> Self {
        let mut nodes = Vec::new();
        // Capacity is at least one.
        let _ = nodes.push(GridNode {
            id: master_id,
            node_type: master_type,
            position: Position::ORIGIN,
            link: None,
        });
        Self { nodes }
    }

    /// Register a node. Fails when the grid is full or the id or cell is taken.
    pub fn insert(&mut self, node: GridNode) -> Result<(), GridNode> {
        if self.get(node.id).is_some() || self.at(node.position).is_some() {
            return Err(node);
        }
        self.nodes.push(node)
    }

    pub fn get(&self, id: u8) -> Option<&GridNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn at(&self, position: Position) -> Option<&GridNode> {
        self.nodes.iter().find(|n| n.position == position)
    }

    pub fn is_full(&self) -> bool {
        self.nodes.is_full()
    }

    /// Number of nodes including the master.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridNode> {
        self.nodes.iter()
    }

    /// Lines `id` must watch (towards its parent) and hold low (towards its
    /// children) once discovery is over.
    pub fn link_masks(&self, id: u8) -> (DirectionSet, DirectionSet) {
        let watch = self
            .get(id)
            .and_then(GridNode::entry)
            .into_iter()
            .collect();
        let hold = self
            .nodes
            .iter()
            .filter_map(|n| n.link)
            .filter(|l| l.parent == id)
            .map(|l| l.via)
            .collect();
        (watch, hold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(id: u8, parent: u8, via: Direction, x: i8, y: i8) -> GridNode {
        GridNode {
            id,
            node_type: NodeType::Button,
            position: Position::new(x, y),
            link: Some(Link { parent, via }),
        }
    }

    #[test]
    fn master_sits_at_origin() {
        let t = Topology::new(0, NodeType::MasterPanel);
        assert_eq!(t.at(Position::ORIGIN).map(|n| n.id), Some(0));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn duplicate_cell_or_id_rejected() {
        let mut t = Topology::new(0, NodeType::MasterPanel);
        t.insert(child(1, 0, Direction::Right, 1, 0)).unwrap();
        assert!(t.insert(child(2, 0, Direction::Right, 1, 0)).is_err());
        assert!(t.insert(child(1, 0, Direction::Top, 0, 1)).is_err());
    }

    #[test]
    fn masks_follow_parent_links() {
        let mut t = Topology::new(0, NodeType::MasterPanel);
        t.insert(child(1, 0, Direction::Right, 1, 0)).unwrap();
        t.insert(child(2, 1, Direction::Right, 2, 0)).unwrap();
        t.insert(child(3, 1, Direction::Top, 1, 1)).unwrap();

        let (watch, hold) = t.link_masks(0);
        assert!(watch.is_empty());
        assert_eq!(hold.iter().collect::<std::vec::Vec<_>>(), vec![Direction::Right]);

        let (watch, hold) = t.link_masks(1);
        assert_eq!(watch.iter().collect::<std::vec::Vec<_>>(), vec![Direction::Left]);
        assert_eq!(
            hold.iter().collect::<std::vec::Vec<_>>(),
            vec![Direction::Top, Direction::Right]
        );

        let (watch, hold) = t.link_masks(3);
        assert_eq!(watch.iter().collect::<std::vec::Vec<_>>(), vec![Direction::Bottom]);
        assert!(hold.is_empty());
    }
}

use std::collections::HashMap;

use crate::models::mindmap::{MindMapNode, NodeKind};
use super::style::{color_for_rate, node_radius, Rgb};

/// Rest length for springs touching the root (root ↔ category).
pub const ROOT_LINK_DISTANCE: f64 = 150.0;

/// Rest length for all other springs (category ↔ stock).
pub const LINK_DISTANCE: f64 = 100.0;

/// A mind-map node flattened for simulation: tree identity plus the
/// mutable position/velocity state the relaxation updates every tick.
#[derive(Debug, Clone)]
pub struct SimNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub value: f64,
    pub profit_loss: f64,
    pub profit_loss_rate: f64,
    /// Annotated from the sizing formula at flatten time
    pub radius: f64,
    /// Annotated from the profit/loss gradient at flatten time
    pub color: Rgb,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Pinned position override; a pinned node never moves under forces
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

/// A parent→child edge of the flattened tree.
#[derive(Debug, Clone, Copy)]
pub struct SimLink {
    pub source: usize,
    pub target: usize,
    /// Spring rest length
    pub distance: f64,
}

/// The flattened tree: nodes in depth-first order (root first) plus links.
#[derive(Debug, Clone, Default)]
pub struct MindMapGraph {
    pub nodes: Vec<SimNode>,
    pub links: Vec<SimLink>,
    index: HashMap<String, usize>,
}

impl MindMapGraph {
    /// Flatten a mind-map tree into simulation nodes and links, sizing
    /// and coloring each node on the way through. Node ids stay stable
    /// across rebuilds, so a host can carry positions over if it wants.
    pub fn from_tree(root: &MindMapNode) -> Self {
        let total_value = root.value;
        let mut graph = MindMapGraph::default();
        graph.add_subtree(root, None, total_value);
        graph
    }

    fn add_subtree(&mut self, node: &MindMapNode, parent: Option<usize>, total_value: f64) {
        let index = self.nodes.len();
        self.index.insert(node.id.clone(), index);
        self.nodes.push(SimNode {
            id: node.id.clone(),
            label: node.name.clone(),
            kind: node.kind,
            value: node.value,
            profit_loss: node.profit_loss,
            profit_loss_rate: node.profit_loss_rate,
            radius: node_radius(node.value, total_value),
            color: color_for_rate(Some(node.profit_loss_rate)),
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
        });

        if let Some(parent) = parent {
            let touches_root = parent == 0;
            self.links.push(SimLink {
                source: parent,
                target: index,
                distance: if touches_root {
                    ROOT_LINK_DISTANCE
                } else {
                    LINK_DISTANCE
                },
            });
        }

        for child in &node.children {
            self.add_subtree(child, Some(index), total_value);
        }
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&SimNode> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

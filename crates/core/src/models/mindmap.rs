use serde::{Deserialize, Serialize};

/// Active grouping strategy for the mind-map tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    /// One category per distinct sector; partitions the holdings
    Sector,
    /// Fixed profit/loss-rate buckets; partitions the holdings
    ProfitLoss,
    /// One category per tag; a holding fans out under every tag it carries
    Theme,
}

/// Role of a node in the mind-map tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Category,
    Stock,
}

/// A node of the derived visualization tree.
///
/// Rebuilt from the portfolio on every view-mode or data change; `id` is
/// stable across rebuilds (`root`, `sector-<name>`, `category-<bucket>`,
/// `theme-<tag>`, `stock-<symbol>`) so position continuity and key-based
/// diffing keep working. Mutable visualization state (radius, coordinates)
/// lives on the flattened simulation node, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMapNode {
    pub id: String,
    pub name: String,
    /// Aggregate or per-holding value in KRW
    pub value: f64,
    pub profit_loss: f64,
    /// Percent; computed from KRW figures only
    pub profit_loss_rate: f64,
    pub kind: NodeKind,
    /// Set on stock nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_change_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Present on root and category nodes; stock nodes are leaves
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MindMapNode>,
}

impl MindMapNode {
    /// Depth-first lookup by id.
    pub fn find(&self, id: &str) -> Option<&MindMapNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Total number of nodes in this subtree, self included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MindMapNode::node_count).sum::<usize>()
    }
}

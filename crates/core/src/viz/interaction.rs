use crate::models::currency::{format_krw, format_signed_krw};
use crate::models::mindmap::{MindMapNode, NodeKind};
use super::simulation::Simulation;

/// Zoom bounds for the scene transform.
pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 4.0;

/// Affine transform between screen space and the simulation's world
/// space. Zoom/pan move this transform only — the simulation never sees
/// screen coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }

    /// Multiply the scale, clamped to [0.1, 4.0], keeping the focus point
    /// (screen coords) stationary — zoom toward the cursor.
    pub fn zoom_by(&mut self, factor: f64, focus_x: f64, focus_y: f64) {
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_scale / self.scale;
        self.translate_x = focus_x - (focus_x - self.translate_x) * ratio;
        self.translate_y = focus_y - (focus_y - self.translate_y) * ratio;
        self.scale = new_scale;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.translate_x += dx;
        self.translate_y += dy;
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.translate_x) / self.scale,
            (sy - self.translate_y) / self.scale,
        )
    }

    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            wx * self.scale + self.translate_x,
            wy * self.scale + self.translate_y,
        )
    }
}

/// Child line of a selected category/root node.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildSummary {
    pub id: String,
    pub name: String,
    pub value: f64,
}

/// Payload handed outward when a node is selected — everything the
/// host's detail panel renders, numbers plus preformatted labels.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDetail {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub value: f64,
    pub profit_loss: f64,
    pub profit_loss_rate: f64,
    /// e.g. "12,500,000원"
    pub value_display: String,
    /// e.g. "+500,000원 (4.17%)"
    pub profit_loss_display: String,
    pub sector: Option<String>,
    pub tags: Vec<String>,
    pub children: Vec<ChildSummary>,
}

impl NodeDetail {
    pub fn from_node(node: &MindMapNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            value: node.value,
            profit_loss: node.profit_loss,
            profit_loss_rate: node.profit_loss_rate,
            value_display: format_krw(node.value),
            profit_loss_display: format!(
                "{} ({:.2}%)",
                format_signed_krw(node.profit_loss),
                node.profit_loss_rate
            ),
            sector: node.sector.clone(),
            tags: node.tags.clone(),
            children: node
                .children
                .iter()
                .map(|c| ChildSummary {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    value: c.value,
                })
                .collect(),
        }
    }
}

/// Transient hover payload, anchored at the cursor's screen position.
/// Stock nodes carry their valuation; root/category tooltips are
/// name-only, matching the rendered diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub node_id: String,
    pub title: String,
    pub x: f64,
    pub y: f64,
    pub value_display: Option<String>,
    pub profit_loss_display: Option<String>,
}

/// Pointer-level interaction state over a running simulation: selection,
/// hover tooltip, node dragging with pin feedback, and the zoom/pan
/// viewport. Owns no rendering; the host draws from the simulation and
/// asks this controller what the pointer means.
pub struct InteractionController {
    viewport: Viewport,
    selected: Option<String>,
    tooltip: Option<Tooltip>,
    dragging: Option<String>,
    /// Whether a drag-release lets the node spring back into the layout.
    /// Default keeps the pin, so hand-arranged layouts survive re-render.
    release_on_drag_end: bool,
}

impl InteractionController {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            selected: None,
            tooltip: None,
            dragging: None,
            release_on_drag_end: false,
        }
    }

    /// Configure the drag-release policy (see `release_on_drag_end`).
    pub fn with_release_on_drag_end(mut self, release: bool) -> Self {
        self.release_on_drag_end = release;
        self
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn dragging_id(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    // ── Click / hover ───────────────────────────────────────────────

    /// Click at screen coordinates: select the node under the pointer
    /// and return its detail payload; empty space clears the selection.
    pub fn click_at(
        &mut self,
        simulation: &Simulation,
        tree: &MindMapNode,
        sx: f64,
        sy: f64,
    ) -> Option<NodeDetail> {
        match self.node_at(simulation, sx, sy) {
            Some(id) => {
                self.selected = Some(id.clone());
                tree.find(&id).map(NodeDetail::from_node)
            }
            None => {
                self.selected = None;
                None
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Pointer moved to screen coordinates: update the hover tooltip.
    pub fn hover_at(&mut self, simulation: &Simulation, sx: f64, sy: f64) -> Option<&Tooltip> {
        self.tooltip = self.node_at(simulation, sx, sy).and_then(|id| {
            let node = simulation.node(&id)?;
            let is_stock = node.kind == NodeKind::Stock;
            Some(Tooltip {
                node_id: id,
                title: node.label.clone(),
                x: sx,
                y: sy,
                value_display: is_stock.then(|| format_krw(node.value)),
                profit_loss_display: is_stock.then(|| {
                    format!(
                        "{} ({:.2}%)",
                        format_signed_krw(node.profit_loss),
                        node.profit_loss_rate
                    )
                }),
            })
        });
        self.tooltip.as_ref()
    }

    /// Pointer left the scene: drop the tooltip.
    pub fn pointer_leave(&mut self) {
        self.tooltip = None;
    }

    // ── Drag ────────────────────────────────────────────────────────

    /// Begin dragging the node under the pointer: pin it where it stands
    /// and reheat so neighbors react. Returns the node id, or None when
    /// the press landed on empty space.
    pub fn drag_start(
        &mut self,
        simulation: &mut Simulation,
        sx: f64,
        sy: f64,
    ) -> Option<String> {
        let id = self.node_at(simulation, sx, sy)?;
        let (x, y) = {
            let node = simulation.node(&id)?;
            (node.x, node.y)
        };
        simulation.pin(&id, x, y);
        simulation.reheat();
        self.dragging = Some(id.clone());
        Some(id)
    }

    /// Move the dragged node's pin to the pointer's world position.
    pub fn drag_to(&mut self, simulation: &mut Simulation, sx: f64, sy: f64) {
        if let Some(id) = &self.dragging {
            let (wx, wy) = self.viewport.screen_to_world(sx, sy);
            simulation.pin(id, wx, wy);
        }
    }

    /// End the drag: let the energy decay, and either keep the pin
    /// (default) or release the node back into the layout.
    pub fn drag_end(&mut self, simulation: &mut Simulation) {
        if let Some(id) = self.dragging.take() {
            simulation.cool();
            if self.release_on_drag_end {
                simulation.unpin(&id);
            }
        }
    }

    // ── Hit testing ─────────────────────────────────────────────────

    /// Node under a screen point; when circles overlap the smallest one
    /// wins, since it renders on top of its bigger neighbors.
    fn node_at(&self, simulation: &Simulation, sx: f64, sy: f64) -> Option<String> {
        let (wx, wy) = self.viewport.screen_to_world(sx, sy);
        simulation
            .nodes()
            .iter()
            .filter(|node| {
                let dx = node.x - wx;
                let dy = node.y - wy;
                dx * dx + dy * dy <= node.radius * node.radius
            })
            .min_by(|a, b| {
                a.radius
                    .partial_cmp(&b.radius)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|node| node.id.clone())
    }
}

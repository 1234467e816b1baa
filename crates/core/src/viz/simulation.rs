use std::collections::HashMap;

use super::graph::{MindMapGraph, SimLink, SimNode};

/// Golden-angle increment used to seed initial positions on a spiral.
/// Deterministic: the same tree always starts from the same layout.
const INITIAL_ANGLE: f64 = std::f64::consts::PI * (3.0 - 2.236_067_977_499_79); // π(3 − √5)
const INITIAL_RADIUS: f64 = 10.0;

/// Tiny deterministic offset applied when two nodes occupy the exact same
/// point, so forces have a direction to push along.
const JIGGLE: f64 = 1e-6;

/// Tuning knobs of the force layout. Defaults mirror the production
/// diagram: −300 many-body charge, +10 collision padding, d3-style alpha
/// schedule (decay reaches `alpha_min` in ~300 ticks).
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Viewport size; the root is pinned at its center.
    pub width: f64,
    pub height: f64,
    /// Many-body strength; negative repels.
    pub charge_strength: f64,
    /// Padding added to every node radius for collision purposes.
    pub collision_padding: f64,
    /// Energy floor — the simulation settles below this.
    pub alpha_min: f64,
    /// Per-tick interpolation factor toward `alpha_target`.
    pub alpha_decay: f64,
    /// Fraction of velocity lost per tick (friction).
    pub velocity_decay: f64,
    /// Energy level a drag pumps the simulation back up to.
    pub reheat_alpha_target: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            charge_strength: -300.0,
            collision_padding: 10.0,
            alpha_min: 0.001,
            // 1 − 0.001^(1/300): alpha crosses alpha_min after ~300 ticks
            alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            reheat_alpha_target: 0.3,
        }
    }
}

/// Lifecycle of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPhase {
    /// Created, no tick executed yet (alpha at full energy)
    Initializing,
    /// Ticking; alpha decaying toward its target
    Cooling,
    /// Below the energy floor, or explicitly stopped
    Settled,
}

/// Iterative force-directed layout over a flattened mind-map tree.
///
/// One `step()` call is one relaxation tick: spring links pull parents
/// and children to their rest length, every pair of nodes repels, the
/// ensemble is re-centered, overlapping nodes push apart, and velocities
/// integrate into positions. Positions are readable between ticks, so a
/// host can redraw after every step.
///
/// The host owns the cadence (one step per frame/timer tick) and MUST
/// `stop()` the simulation when the tree is rebuilt or the view goes
/// away — a forgotten simulation keeps ticking against stale nodes.
/// The root node is pinned to the viewport center for its whole life;
/// any other node can be pinned and unpinned freely.
pub struct Simulation {
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    /// Per-link spring strength and source-side bias, derived from node
    /// degrees the way d3-force does it.
    link_strengths: Vec<f64>,
    link_bias: Vec<f64>,
    index: HashMap<String, usize>,
    config: SimulationConfig,
    alpha: f64,
    alpha_target: f64,
    ticks: u64,
    stopped: bool,
}

impl Simulation {
    pub fn new(graph: MindMapGraph, config: SimulationConfig) -> Self {
        let nodes = graph.nodes;
        let links = graph.links;
        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        let mut degrees = vec![0usize; nodes.len()];
        for link in &links {
            degrees[link.source] += 1;
            degrees[link.target] += 1;
        }

        let link_strengths = links
            .iter()
            .map(|l| 1.0 / degrees[l.source].min(degrees[l.target]).max(1) as f64)
            .collect();
        let link_bias = links
            .iter()
            .map(|l| {
                let total = degrees[l.source] + degrees[l.target];
                if total == 0 {
                    0.5
                } else {
                    degrees[l.source] as f64 / total as f64
                }
            })
            .collect();

        let mut simulation = Self {
            nodes,
            links,
            link_strengths,
            link_bias,
            index,
            config,
            alpha: 1.0,
            alpha_target: 0.0,
            ticks: 0,
            stopped: false,
        };
        simulation.seed_positions();
        simulation.pin_root();
        simulation
    }

    /// Place nodes on a phyllotaxis spiral around the viewport center.
    fn seed_positions(&mut self) {
        let cx = self.config.width / 2.0;
        let cy = self.config.height / 2.0;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
            let angle = i as f64 * INITIAL_ANGLE;
            node.x = cx + radius * angle.cos();
            node.y = cy + radius * angle.sin();
            node.vx = 0.0;
            node.vy = 0.0;
        }
    }

    /// The root never moves: permanently pinned at the viewport center.
    fn pin_root(&mut self) {
        let cx = self.config.width / 2.0;
        let cy = self.config.height / 2.0;
        if let Some(&root) = self.index.get("root") {
            self.nodes[root].fx = Some(cx);
            self.nodes[root].fy = Some(cy);
            self.nodes[root].x = cx;
            self.nodes[root].y = cy;
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Advance one relaxation tick. Returns `false` once the simulation
    /// is settled or stopped — callers use that to cancel their timer.
    pub fn step(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        if self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

        self.apply_link_force();
        self.apply_charge_force();
        self.apply_center_force();
        self.apply_collision_force();
        self.integrate();

        self.ticks += 1;
        true
    }

    /// Step until settled, bounded by `max_ticks` as a defensive cap.
    /// Returns how many ticks ran.
    pub fn run(&mut self, max_ticks: usize) -> usize {
        let mut ran = 0;
        while ran < max_ticks && self.step() {
            ran += 1;
        }
        ran
    }

    /// Raise the energy target so a drag visibly perturbs neighbors.
    pub fn reheat(&mut self) {
        if !self.stopped {
            self.alpha_target = self.config.reheat_alpha_target;
        }
    }

    /// Let the energy decay back toward rest (drag ended).
    pub fn cool(&mut self) {
        self.alpha_target = 0.0;
    }

    /// Terminate this run for good. Step becomes a no-op; a rebuilt tree
    /// needs a fresh `Simulation`.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn phase(&self) -> SimulationPhase {
        if self.stopped
            || (self.alpha < self.config.alpha_min
                && self.alpha_target < self.config.alpha_min)
        {
            SimulationPhase::Settled
        } else if self.ticks == 0 {
            SimulationPhase::Initializing
        } else {
            SimulationPhase::Cooling
        }
    }

    pub fn is_settled(&self) -> bool {
        self.phase() == SimulationPhase::Settled
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    // ── Pinning ─────────────────────────────────────────────────────

    /// Fix a node at (x, y); it stops responding to forces until unpinned.
    /// Returns false for unknown ids.
    pub fn pin(&mut self, id: &str, x: f64, y: f64) -> bool {
        match self.index.get(id) {
            Some(&i) => {
                self.nodes[i].fx = Some(x);
                self.nodes[i].fy = Some(y);
                self.nodes[i].x = x;
                self.nodes[i].y = y;
                true
            }
            None => false,
        }
    }

    /// Release a pinned node back to the forces. The root is exempt — it
    /// stays pinned at the center for the simulation's whole life.
    pub fn unpin(&mut self, id: &str) -> bool {
        if id == "root" {
            return false;
        }
        match self.index.get(id) {
            Some(&i) => {
                self.nodes[i].fx = None;
                self.nodes[i].fy = None;
                true
            }
            None => false,
        }
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// Live node state — positions update after every `step()`.
    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[SimLink] {
        &self.links
    }

    pub fn node(&self, id: &str) -> Option<&SimNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    // ── Forces ──────────────────────────────────────────────────────

    /// Spring force along each link toward its rest length, with the
    /// correction split between endpoints by degree bias so hubs move
    /// less than leaves.
    fn apply_link_force(&mut self) {
        for (li, link) in self.links.iter().enumerate() {
            let source = &self.nodes[link.source];
            let target = &self.nodes[link.target];

            let mut dx = target.x + target.vx - source.x - source.vx;
            let mut dy = target.y + target.vy - source.y - source.vy;
            if dx == 0.0 && dy == 0.0 {
                dx = jiggle(li);
                dy = jiggle(li + 1);
            }

            let distance = (dx * dx + dy * dy).sqrt();
            let displacement =
                (distance - link.distance) / distance * self.alpha * self.link_strengths[li];
            let fx = dx * displacement;
            let fy = dy * displacement;

            let bias = self.link_bias[li];
            self.nodes[link.target].vx -= fx * bias;
            self.nodes[link.target].vy -= fy * bias;
            self.nodes[link.source].vx += fx * (1.0 - bias);
            self.nodes[link.source].vy += fy * (1.0 - bias);
        }
    }

    /// Exact pairwise many-body repulsion. The production diagram stays
    /// in the tens of nodes, so the O(n²) loop beats a Barnes-Hut tree
    /// on both simplicity and constant factor.
    fn apply_charge_force(&mut self) {
        let strength = self.config.charge_strength;
        for i in 0..self.nodes.len() {
            for j in (i + 1)..self.nodes.len() {
                let mut dx = self.nodes[j].x - self.nodes[i].x;
                let mut dy = self.nodes[j].y - self.nodes[i].y;
                if dx == 0.0 && dy == 0.0 {
                    dx = jiggle(i + j);
                    dy = jiggle(i + j + 1);
                }
                // Clamp the squared distance so near-coincident nodes
                // don't explode the force
                let d2 = (dx * dx + dy * dy).max(1.0);
                let w = strength * self.alpha / d2;

                self.nodes[i].vx += dx * w;
                self.nodes[i].vy += dy * w;
                self.nodes[j].vx -= dx * w;
                self.nodes[j].vy -= dy * w;
            }
        }
    }

    /// Translate the ensemble so its mean sits on the viewport center.
    /// Pinned nodes snap back to their override during integration.
    fn apply_center_force(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        let n = self.nodes.len() as f64;
        let mean_x: f64 = self.nodes.iter().map(|node| node.x).sum::<f64>() / n;
        let mean_y: f64 = self.nodes.iter().map(|node| node.y).sum::<f64>() / n;
        let shift_x = self.config.width / 2.0 - mean_x;
        let shift_y = self.config.height / 2.0 - mean_y;
        for node in &mut self.nodes {
            node.x += shift_x;
            node.y += shift_y;
        }
    }

    /// Push apart any pair closer than the sum of their padded radii.
    /// The smaller node yields more, weighted by squared radius.
    fn apply_collision_force(&mut self) {
        let padding = self.config.collision_padding;
        for i in 0..self.nodes.len() {
            for j in (i + 1)..self.nodes.len() {
                let ri = self.nodes[i].radius + padding;
                let rj = self.nodes[j].radius + padding;
                let min_distance = ri + rj;

                let mut dx =
                    self.nodes[i].x + self.nodes[i].vx - self.nodes[j].x - self.nodes[j].vx;
                let mut dy =
                    self.nodes[i].y + self.nodes[i].vy - self.nodes[j].y - self.nodes[j].vy;
                if dx == 0.0 && dy == 0.0 {
                    dx = jiggle(i + j);
                    dy = jiggle(i + j + 1);
                }

                let d2 = dx * dx + dy * dy;
                if d2 >= min_distance * min_distance {
                    continue;
                }

                let distance = d2.sqrt();
                let overlap = (min_distance - distance) / distance;
                let weight_i = rj * rj / (ri * ri + rj * rj);

                self.nodes[i].vx += dx * overlap * weight_i;
                self.nodes[i].vy += dy * overlap * weight_i;
                self.nodes[j].vx -= dx * overlap * (1.0 - weight_i);
                self.nodes[j].vy -= dy * overlap * (1.0 - weight_i);
            }
        }
    }

    /// Apply friction and fold velocities into positions. Pinned nodes
    /// are snapped to their override with velocity zeroed — they are
    /// immune to every force above.
    fn integrate(&mut self) {
        let friction = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            match (node.fx, node.fy) {
                (Some(fx), Some(fy)) => {
                    node.x = fx;
                    node.y = fy;
                    node.vx = 0.0;
                    node.vy = 0.0;
                }
                _ => {
                    node.vx *= friction;
                    node.vy *= friction;
                    node.x += node.vx;
                    node.y += node.vy;
                }
            }
        }
    }
}

/// Deterministic sub-pixel offset, varied by index so coincident pairs
/// separate in different directions.
fn jiggle(seed: usize) -> f64 {
    JIGGLE * (1.0 + (seed % 7) as f64)
}

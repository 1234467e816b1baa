//! Node sizing and coloring — presentation-only pure functions.

/// Radius formula constants. Area-proportional sizing: a 4× larger
/// holding renders at 2× the radius, which matches how people read areas.
pub const BASE_NODE_RADIUS: f64 = 30.0;
pub const MIN_NODE_RADIUS: f64 = 15.0;
pub const MAX_NODE_RADIUS: f64 = 80.0;

/// Node radius from its share of the total portfolio value:
/// `clamp(BASE * sqrt(value / total), MIN, MAX)`; an empty portfolio
/// (total 0) renders every node at the minimum.
pub fn node_radius(value: f64, total_value: f64) -> f64 {
    if total_value <= 0.0 {
        return MIN_NODE_RADIUS;
    }
    let ratio = value / total_value;
    (BASE_NODE_RADIUS * ratio.sqrt()).clamp(MIN_NODE_RADIUS, MAX_NODE_RADIUS)
}

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS functional notation: `rgb(34, 197, 94)`.
    pub fn to_css(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    /// Hex notation: `#22C55E`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Flat positions (rate 0 or unknown) render neutral gray (#9CA3AF).
pub const NEUTRAL_GRAY: Rgb = Rgb::new(156, 163, 175);

/// Node color from the profit/loss rate.
///
/// Gains interpolate from #22C55E toward the darker #15803D, losses from
/// #EF4444 toward #DC2626; both gradients saturate at ±50% and each
/// channel rounds independently.
pub fn color_for_rate(profit_loss_rate: Option<f64>) -> Rgb {
    let rate = match profit_loss_rate {
        None => return NEUTRAL_GRAY,
        Some(rate) if rate == 0.0 => return NEUTRAL_GRAY,
        Some(rate) => rate,
    };

    if rate > 0.0 {
        let intensity = (rate / 50.0).min(1.0);
        Rgb::new(
            (34.0 - 21.0 * intensity).round() as u8,
            (197.0 - 151.0 * intensity).round() as u8,
            (94.0 - 61.0 * intensity).round() as u8,
        )
    } else {
        let intensity = (rate.abs() / 50.0).min(1.0);
        Rgb::new(
            (239.0 - 19.0 * intensity).round() as u8,
            (68.0 - 38.0 * intensity).round() as u8,
            (68.0 - 38.0 * intensity).round() as u8,
        )
    }
}

use eframe::egui::Color32;
use palette::{named, Srgb};

// ---------------------------------------------------------------------------
// Fixed palettes
// ---------------------------------------------------------------------------

/// Single-letter plot colours `m` and `c` (0.75 intensity).
pub const MAGENTA: Srgb<u8> = Srgb::new(191, 0, 191);
pub const CYAN: Srgb<u8> = Srgb::new(0, 191, 191);

/// Attenuator series colours, assigned by channel position.
pub const ATTENUATOR_COLORS: [Srgb<u8>; 5] = [named::RED, named::GREEN, named::BLUE, MAGENTA, CYAN];

pub const ATTENUATOR_MARKERS: [Marker; 5] = [
    Marker::Circle,
    Marker::Square,
    Marker::TriangleUp,
    Marker::Diamond,
    Marker::TriangleDown,
];

/// Beam-splitter arm colours, assigned by arm position.
pub const SPLITTER_COLORS: [Srgb<u8>; 4] = [named::BLUE, named::GREEN, named::RED, CYAN];

pub const BLACK: Srgb<u8> = named::BLACK;
pub const GRAY: Srgb<u8> = named::GRAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
    TriangleUp,
    Diamond,
    TriangleDown,
}

// ---------------------------------------------------------------------------
// Series styling
// ---------------------------------------------------------------------------

/// Colour, marker and opacity of one plotted series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStyle {
    pub color: Srgb<u8>,
    pub marker: Marker,
    /// Opacity over a white background, 0..=1.
    pub alpha: f32,
}

impl SeriesStyle {
    /// The colour as it appears on white, so both renderers draw the same
    /// opaque pixels.
    pub fn rendered_color(&self) -> Srgb<u8> {
        over_white(self.color, self.alpha)
    }
}

/// Cycles colours and markers by channel position.
#[derive(Debug, Clone, Copy)]
pub struct StyleCycle {
    colors: &'static [Srgb<u8>],
    markers: &'static [Marker],
    alpha: f32,
}

impl StyleCycle {
    pub const fn attenuators() -> Self {
        Self {
            colors: &ATTENUATOR_COLORS,
            markers: &ATTENUATOR_MARKERS,
            alpha: 0.5,
        }
    }

    pub const fn splitter() -> Self {
        Self {
            colors: &SPLITTER_COLORS,
            markers: &[Marker::Circle],
            alpha: 1.0,
        }
    }

    pub fn style_for(&self, position: usize) -> SeriesStyle {
        SeriesStyle {
            color: self.colors[position % self.colors.len()],
            marker: self.markers[position % self.markers.len()],
            alpha: self.alpha,
        }
    }
}

/// Composite `color` over white, component-wise on the sRGB values.
pub fn over_white(color: Srgb<u8>, alpha: f32) -> Srgb<u8> {
    let fg: Srgb<f32> = color.into_format();
    let alpha = alpha.clamp(0.0, 1.0);
    let over = |c: f32| 1.0 - alpha * (1.0 - c);
    Srgb::new(over(fg.red), over(fg.green), over(fg.blue)).into_format()
}

pub fn to_color32(color: Srgb<u8>) -> Color32 {
    Color32::from_rgb(color.red, color.green, color.blue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_cycle_by_position() {
        let cycle = StyleCycle::attenuators();
        assert_eq!(cycle.style_for(0).color, named::RED);
        assert_eq!(cycle.style_for(2).marker, Marker::TriangleUp);
        assert_eq!(cycle.style_for(5), cycle.style_for(0));
        assert_eq!(cycle.style_for(6).marker, Marker::Square);
    }

    #[test]
    fn splitter_uses_circles_only() {
        let cycle = StyleCycle::splitter();
        assert!((0..8).all(|i| cycle.style_for(i).marker == Marker::Circle));
        assert_eq!(cycle.style_for(4).color, named::BLUE);
    }

    #[test]
    fn blending_endpoints() {
        assert_eq!(over_white(named::RED, 1.0), named::RED);
        assert_eq!(over_white(named::RED, 0.0), named::WHITE);
        let half = over_white(named::BLUE, 0.5);
        assert_eq!(half.blue, 255);
        assert!(half.red > 0 && half.red < 255);
    }

    #[test]
    fn half_alpha_halves_srgb_components() {
        let red = over_white(named::RED, 0.5);
        assert_eq!(red.red, 255);
        assert!((127..=128).contains(&red.green));
        assert_eq!(red.green, red.blue);

        let cyan = over_white(CYAN, 0.5);
        assert_eq!(cyan.green, cyan.blue);
        assert!((222..=224).contains(&cyan.green));
    }

    #[test]
    fn single_letter_colours() {
        assert_eq!(ATTENUATOR_COLORS[3], Srgb::new(191, 0, 191));
        assert_eq!(ATTENUATOR_COLORS[4], Srgb::new(0, 191, 191));
        assert_eq!(SPLITTER_COLORS[3], CYAN);
        assert_eq!(named::GREEN, Srgb::new(0, 128, 0));
    }
}

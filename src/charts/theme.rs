//! Chart Theme
//! Palettes and continuous colour maps for the dashboard charts.

use plotters::style::RGBColor;

/// Plot area background (dark grid style).
pub const GRID_BG: RGBColor = RGBColor(234, 234, 242);
pub const GRID_LINE: RGBColor = RGBColor(255, 255, 255);
pub const EDGE: RGBColor = RGBColor(0, 0, 0);
pub const TEXT: RGBColor = RGBColor(38, 38, 38);

pub const HISTOGRAM_FILL: RGBColor = RGBColor(220, 20, 60); // crimson
pub const FACET_FILL: RGBColor = RGBColor(255, 165, 0); // orange
pub const KDE_FILL: RGBColor = RGBColor(0, 0, 255); // blue
pub const SCATTER_POINT: RGBColor = RGBColor(0, 128, 0); // green
pub const TREND_LINE: RGBColor = RGBColor(255, 0, 0); // red
pub const PAIR_POINT: RGBColor = RGBColor(59, 76, 192);

/// Colour stops of a palette or colour map.
#[derive(Debug, Clone, Copy)]
pub struct Palette(&'static [(u8, u8, u8)]);

pub const SPECTRAL: Palette = Palette(&[
    (158, 1, 66),
    (213, 62, 79),
    (244, 109, 67),
    (253, 174, 97),
    (254, 224, 139),
    (230, 245, 152),
    (171, 221, 164),
    (102, 194, 165),
    (50, 136, 189),
    (94, 79, 162),
]);

pub const MUTED: Palette = Palette(&[
    (72, 120, 208),
    (238, 133, 74),
    (106, 204, 100),
    (214, 95, 95),
    (149, 108, 180),
    (140, 97, 60),
    (220, 126, 192),
    (121, 121, 121),
    (213, 187, 103),
    (130, 198, 226),
]);

pub const SET2: Palette = Palette(&[
    (102, 194, 165),
    (252, 141, 98),
    (141, 160, 203),
    (231, 138, 195),
    (166, 216, 84),
    (255, 217, 47),
    (229, 196, 148),
    (179, 179, 179),
]);

pub const ROCKET: Palette = Palette(&[
    (3, 5, 26),
    (76, 29, 75),
    (163, 28, 69),
    (233, 72, 58),
    (245, 158, 114),
    (250, 235, 221),
]);

pub const VIRIDIS: Palette = Palette(&[
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
]);

pub const COOLWARM: Palette = Palette(&[
    (59, 76, 192),
    (141, 176, 254),
    (221, 221, 221),
    (244, 154, 123),
    (180, 4, 38),
]);

pub const PURPLES: Palette = Palette(&[
    (252, 251, 253),
    (218, 218, 235),
    (158, 154, 200),
    (106, 81, 163),
    (63, 0, 125),
]);

impl Palette {
    /// Colour at position `t` in `[0, 1]`, interpolating between stops.
    pub fn at(&self, t: f64) -> RGBColor {
        let stops = self.0;
        if stops.len() == 1 || !t.is_finite() {
            let (r, g, b) = stops[0];
            return RGBColor(r, g, b);
        }
        let t = t.clamp(0.0, 1.0) * (stops.len() - 1) as f64;
        let lower = t.floor() as usize;
        let upper = (lower + 1).min(stops.len() - 1);
        let frac = t - lower as f64;

        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (r0, g0, b0) = stops[lower];
        let (r1, g1, b1) = stops[upper];
        RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }

    /// `n` colours for categorical data.
    ///
    /// Palettes with enough stops cycle through them directly; otherwise the
    /// colours are spread evenly along the map.
    pub fn categorical(&self, n: usize) -> Vec<RGBColor> {
        let stops = self.0;
        if n <= stops.len() && stops.len() >= 8 {
            return stops.iter().take(n).map(|&(r, g, b)| RGBColor(r, g, b)).collect();
        }
        match n {
            0 => Vec::new(),
            1 => vec![self.at(0.5)],
            _ => (0..n).map(|i| self.at(i as f64 / (n - 1) as f64)).collect(),
        }
    }

    /// Colour for a value within `[min, max]`.
    pub fn scaled(&self, value: f64, min: f64, max: f64) -> RGBColor {
        if max <= min {
            return self.at(0.5);
        }
        self.at((value - min) / (max - min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_map_hits_endpoints() {
        assert_eq!(COOLWARM.at(0.0), RGBColor(59, 76, 192));
        assert_eq!(COOLWARM.at(1.0), RGBColor(180, 4, 38));
        assert_eq!(COOLWARM.at(0.5), RGBColor(221, 221, 221));
        assert_eq!(COOLWARM.scaled(-1.0, -1.0, 1.0), COOLWARM.at(0.0));
        assert_eq!(PURPLES.at(7.0), PURPLES.at(1.0));
    }

    #[test]
    fn categorical_colours_are_distinct() {
        let colours = SET2.categorical(4);
        assert_eq!(colours.len(), 4);
        assert_eq!(colours[0], RGBColor(102, 194, 165));

        let spread = ROCKET.categorical(3);
        assert_eq!(spread[0], ROCKET.at(0.0));
        assert_eq!(spread[2], ROCKET.at(1.0));
        assert_ne!(spread[0], spread[1]);
        assert!(VIRIDIS.categorical(0).is_empty());
    }
}

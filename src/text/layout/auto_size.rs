//! Point size search for auto-sized text.

use crate::text::config::TextLayoutConfig;

/// Smallest window between the largest fitting and the smallest failing size
/// still worth another pass.
const MIN_SIZE_WINDOW: f32 = 0.051;
const MIN_SIZE_STEP: f32 = 0.05;

/// Rounds to the nearest multiple of 0.05.
pub(crate) fn quantize(size: f32) -> f32 {
    (size * 20.0 + 0.5).floor() / 20.0
}

/// Bisection state carried between the passes of one layout.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AutoSizer {
    enabled: bool,
    size_min: f32,
    size_max: f32,
    max_iterations: u32,
    /// Fraction of the glyph width auto-size may remove.
    char_width_max: f32,
    line_spacing_max: f32,

    pub font_size: f32,
    pub char_width_adjustment: f32,
    /// Font units added to the line gap.
    pub line_spacing_adjustment: f32,
    /// Largest size known to fit.
    lower: f32,
    /// Smallest size known to overflow.
    upper: f32,
    pub iterations: u32,
    pub is_point_size_set: bool,
}

impl AutoSizer {
    pub fn new(config: &TextLayoutConfig) -> Self {
        let size_min = config.font_size_min.min(config.font_size_max);
        let size_max = config.font_size_max.max(size_min);
        let enabled = config.auto_size;
        Self {
            enabled,
            size_min,
            size_max,
            max_iterations: config.auto_size_max_iterations,
            char_width_max: (config.char_width_max_adjustment / 100.0).clamp(0.0, 1.0),
            line_spacing_max: config.line_spacing_max.min(0.0),
            font_size: if enabled { size_max } else { config.font_size },
            char_width_adjustment: 0.0,
            line_spacing_adjustment: 0.0,
            lower: size_min,
            upper: size_max,
            iterations: 0,
            is_point_size_set: !enabled,
        }
    }

    /// Another pass may still change the size.
    pub fn can_iterate(&self) -> bool {
        self.enabled && !self.is_point_size_set && self.iterations < self.max_iterations
    }

    /// Text is `text_height` tall in a container `area_height` tall. Tightens
    /// the line spacing first, then shrinks the font. Returns whether the pass
    /// must restart.
    pub fn fit_height(
        &mut self,
        text_height: f32,
        area_height: f32,
        line_count: usize,
        base_scale: f32,
    ) -> bool {
        if !self.can_iterate() {
            return false;
        }
        if line_count > 0 && base_scale > 0.0 && self.line_spacing_adjustment > self.line_spacing_max {
            let delta = (area_height - text_height) / line_count as f32 / base_scale;
            let adjusted = (self.line_spacing_adjustment + delta).max(self.line_spacing_max);
            if adjusted < self.line_spacing_adjustment {
                self.line_spacing_adjustment = adjusted;
                self.iterations += 1;
                return true;
            }
        }
        self.shrink()
    }

    /// A word does not fit on its line. Compresses the glyphs first, then
    /// shrinks the font.
    pub fn fit_width(&mut self) -> bool {
        if !self.can_iterate() {
            return false;
        }
        if self.char_width_adjustment < self.char_width_max {
            self.char_width_adjustment = (self.char_width_adjustment + 0.01).min(self.char_width_max);
            self.iterations += 1;
            return true;
        }
        self.shrink()
    }

    pub fn shrink(&mut self) -> bool {
        if !self.can_iterate() || self.font_size <= self.size_min {
            return false;
        }
        self.upper = self.font_size;
        let step = ((self.font_size - self.lower) / 2.0).max(MIN_SIZE_STEP);
        let size = quantize(self.font_size - step).max(self.size_min);
        if size >= self.font_size {
            return false;
        }
        log::trace!("auto-size: {} does not fit, trying {}", self.font_size, size);
        self.font_size = size;
        self.iterations += 1;
        true
    }

    /// The pass completed without overflowing. Tries a larger size while the
    /// search window is open.
    pub fn grow(&mut self) -> bool {
        if !self.can_iterate() || self.font_size >= self.size_max {
            return false;
        }
        if self.upper - self.font_size <= MIN_SIZE_WINDOW {
            return false;
        }
        self.lower = self.font_size;
        let step = ((self.upper - self.font_size) / 2.0).max(MIN_SIZE_STEP);
        let size = quantize(self.font_size + step).min(self.size_max);
        if size <= self.font_size || size >= self.upper {
            return false;
        }
        log::trace!("auto-size: {} fits, trying {}", self.font_size, size);
        self.font_size = size;
        self.iterations += 1;
        true
    }

    /// Ends the search with the current size.
    pub fn settle(&mut self) {
        self.is_point_size_set = true;
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn sizer(min: f32, max: f32, iterations: u32) -> AutoSizer {
        let config = TextLayoutConfig {
            auto_size: true,
            font_size_min: min,
            font_size_max: max,
            auto_size_max_iterations: iterations,
            ..Default::default()
        };
        AutoSizer::new(&config)
    }

    #[test]
    fn quantizes_to_twentieths() {
        assert_eq!(quantize(12.37), 12.35);
        assert_eq!(quantize(12.38), 12.4);
        assert_eq!(quantize(10.0), 10.0);
    }

    #[test]
    fn starts_at_the_largest_size() {
        let sizer = sizer(10.0, 40.0, 100);
        assert_eq!(sizer.font_size, 40.0);
        assert!(sizer.can_iterate());
    }

    #[test]
    fn disabled_keeps_the_configured_size() {
        let mut sizer = AutoSizer::new(&TextLayoutConfig::default());
        assert_eq!(sizer.font_size, 36.0);
        assert!(!sizer.shrink());
        assert!(!sizer.grow());
    }

    #[test]
    fn bisection_converges_inside_bounds() {
        // Fits at 23 or below.
        let mut sizer = sizer(10.0, 40.0, 100);
        loop {
            let restart = if sizer.font_size > 23.0 {
                sizer.shrink()
            } else {
                sizer.grow()
            };
            if !restart {
                break;
            }
        }
        assert!(sizer.font_size >= 10.0 && sizer.font_size <= 23.0);
        assert!(23.0 - sizer.font_size < 0.2);
        assert!(sizer.iterations <= 100);
    }

    #[test]
    fn iteration_cap_stops_the_search() {
        let mut sizer = sizer(10.0, 40.0, 2);
        assert!(sizer.shrink());
        assert!(sizer.shrink());
        assert!(!sizer.shrink());
        assert_eq!(sizer.iterations, 2);
    }

    #[test]
    fn never_shrinks_below_minimum() {
        let mut sizer = sizer(30.0, 31.0, 100);
        while sizer.shrink() {}
        assert_eq!(sizer.font_size, 30.0);
    }

    #[test]
    fn width_compresses_before_shrinking() {
        let config = TextLayoutConfig {
            auto_size: true,
            char_width_max_adjustment: 2.0,
            ..Default::default()
        };
        let mut sizer = AutoSizer::new(&config);
        let size = sizer.font_size;
        assert!(sizer.fit_width());
        assert!(sizer.fit_width());
        assert_eq!(sizer.font_size, size);
        assert!((sizer.char_width_adjustment - 0.02).abs() < 1e-6);
        assert!(sizer.fit_width());
        assert!(sizer.font_size < size);
    }

    #[test]
    fn height_tightens_line_spacing_first() {
        let config = TextLayoutConfig {
            auto_size: true,
            line_spacing_max: -20.0,
            ..Default::default()
        };
        let mut sizer = AutoSizer::new(&config);
        let size = sizer.font_size;
        assert!(sizer.fit_height(110.0, 100.0, 2, 1.0));
        assert_eq!(sizer.line_spacing_adjustment, -5.0);
        assert_eq!(sizer.font_size, size);
    }
}

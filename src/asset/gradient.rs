use crate::color::{self, Color32};

/// Four corner colors applied across a glyph quad by `<gradient>`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorGradient {
    pub top_left: Color32,
    pub top_right: Color32,
    pub bottom_left: Color32,
    pub bottom_right: Color32,
}

impl ColorGradient {
    pub fn uniform(color: Color32) -> Self {
        Self {
            top_left: color,
            top_right: color,
            bottom_left: color,
            bottom_right: color,
        }
    }

    pub fn horizontal(left: Color32, right: Color32) -> Self {
        Self {
            top_left: left,
            top_right: right,
            bottom_left: left,
            bottom_right: right,
        }
    }

    pub fn vertical(top: Color32, bottom: Color32) -> Self {
        Self {
            top_left: top,
            top_right: top,
            bottom_left: bottom,
            bottom_right: bottom,
        }
    }

    /// Corner colors in vertex order: bottom-left, top-left, top-right, bottom-right.
    pub fn corners(&self) -> [Color32; 4] {
        [
            self.bottom_left,
            self.top_left,
            self.top_right,
            self.bottom_right,
        ]
    }
}

impl Default for ColorGradient {
    fn default() -> Self {
        Self::uniform(color::WHITE)
    }
}

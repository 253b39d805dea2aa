use crate::asset::ColorGradient;
use crate::color::{self, Color32, ColorSpace};
use crate::glyph_id::FontAssetId;

use super::processing::WHITE_SQUARE;
use super::style::FontStyles;

/// Configuration knobs used by the text layout pipeline.
///
/// All parameters are honored during a single layout pass so the caller can
/// measure or place text inside arbitrary rectangles. Spacing values are in
/// hundredths of an em, like the `<cspace>`-style tags they combine with.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayoutConfig {
    /// Primary font asset. Layout produces nothing without one.
    pub font_asset: Option<FontAssetId>,
    pub font_size: f32,

    pub auto_size: bool,
    pub font_size_min: f32,
    pub font_size_max: f32,
    pub auto_size_max_iterations: u32,
    /// Maximum horizontal glyph compression, in percent.
    pub char_width_max_adjustment: f32,
    /// Lowest line spacing auto-size may reduce to (usually negative).
    pub line_spacing_max: f32,

    pub font_style: FontStyles,
    pub font_weight: u16,
    pub color: Color32,
    pub color_gradient: Option<ColorGradient>,
    /// Ignore `<color>` tags and keep [`Self::color`].
    pub override_tag_colors: bool,

    pub character_spacing: f32,
    pub word_spacing: f32,
    pub line_spacing: f32,
    pub paragraph_spacing: f32,
    /// Indent of the first line of each paragraph, in layout units.
    pub first_line_indent: f32,
    pub margin: Margins,

    /// Container width; `None` lays out on an unbounded line.
    pub max_width: Option<f32>,
    /// Container height; `None` never triggers vertical overflow.
    pub max_height: Option<f32>,
    pub horizontal_align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
    pub wrap_style: WrapStyle,
    /// Below this fill ratio a line may break inside a word. Also used as the
    /// character/word mix when justifying.
    pub word_wrapping_ratio: f32,
    pub overflow_mode: OverflowMode,
    /// Page shown when [`OverflowMode::Page`] is active.
    pub page_to_display: usize,

    pub horizontal_mapping: TextureMapping,
    pub vertical_mapping: TextureMapping,
    pub uv_line_offset: f32,
    pub uv_offset: [f32; 2],

    pub color_space: ColorSpace,
    /// Perspective cameras sample fonts at a tenth of the size.
    pub is_orthographic: bool,
    pub rich_text: bool,
    pub parse_ctrl_characters: bool,
    pub kerning: bool,
    pub mark_positioning: bool,
    pub is_right_to_left: bool,
    pub extra_padding: bool,

    pub first_visible_character: usize,
    pub max_visible_characters: Option<usize>,
    pub max_visible_words: Option<usize>,
    pub max_visible_lines: Option<usize>,

    /// Substituted for characters no asset can resolve.
    pub missing_glyph: u32,
}

impl Default for TextLayoutConfig {
    fn default() -> Self {
        Self {
            font_asset: None,
            font_size: 36.0,
            auto_size: false,
            font_size_min: 18.0,
            font_size_max: 72.0,
            auto_size_max_iterations: 100,
            char_width_max_adjustment: 0.0,
            line_spacing_max: 0.0,
            font_style: FontStyles::empty(),
            font_weight: 400,
            color: color::WHITE,
            color_gradient: None,
            override_tag_colors: false,
            character_spacing: 0.0,
            word_spacing: 0.0,
            line_spacing: 0.0,
            paragraph_spacing: 0.0,
            first_line_indent: 0.0,
            margin: Margins::default(),
            max_width: None,
            max_height: None,
            horizontal_align: HorizontalAlign::Left,
            vertical_align: VerticalAlign::Top,
            wrap_style: WrapStyle::WordWrap,
            word_wrapping_ratio: 0.4,
            overflow_mode: OverflowMode::Overflow,
            page_to_display: 0,
            horizontal_mapping: TextureMapping::Character,
            vertical_mapping: TextureMapping::Character,
            uv_line_offset: 0.0,
            uv_offset: [0.0, 0.0],
            color_space: ColorSpace::Gamma,
            is_orthographic: true,
            rich_text: true,
            parse_ctrl_characters: true,
            kerning: true,
            mark_positioning: true,
            is_right_to_left: false,
            extra_padding: false,
            first_visible_character: 0,
            max_visible_characters: None,
            max_visible_words: None,
            max_visible_lines: None,
            missing_glyph: WHITE_SQUARE,
        }
    }
}

impl TextLayoutConfig {
    /// Width available to lines, margins removed.
    pub fn area_width(&self) -> f32 {
        self.max_width
            .map(|w| (w - self.margin.left - self.margin.right).max(0.0))
            .unwrap_or(f32::INFINITY)
    }

    /// Height available to lines, margins removed.
    pub fn area_height(&self) -> f32 {
        self.max_height
            .map(|h| (h - self.margin.top - self.margin.bottom).max(0.0))
            .unwrap_or(f32::INFINITY)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Margins {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Horizontal justification applied after each line is assembled.
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
    /// Stretches every line but the last of a paragraph.
    Justified,
    /// Stretches every line, including the last.
    Flush,
    /// Centers on the geometric extents of the glyphs instead of their advances.
    Geometry,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Vertical alignment strategy for the entire block of text.
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
    /// First baseline sits on the container's vertical center.
    Baseline,
    /// Center of the page's glyph extents on the container's center.
    Midline,
    /// Halfway between the first baseline and the tallest cap height on the
    /// container's center.
    Capline,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Wrapping rules that define where line breaks may occur.
pub enum WrapStyle {
    NoWrap,
    /// Breaks at legal break opportunities, inside words only as a last resort.
    WordWrap,
    /// Breaks after any character.
    CharWrap,
    /// Word wrapping that keeps leading whitespace on wrapped lines.
    PreserveWhitespace,
    /// No wrapping; leading whitespace is kept.
    PreserveWhitespaceNoWrap,
}

impl WrapStyle {
    pub fn wraps(&self) -> bool {
        matches!(
            self,
            WrapStyle::WordWrap | WrapStyle::CharWrap | WrapStyle::PreserveWhitespace
        )
    }

    pub fn preserves_whitespace(&self) -> bool {
        matches!(
            self,
            WrapStyle::PreserveWhitespace | WrapStyle::PreserveWhitespaceNoWrap
        )
    }
}

/// Policy applied when text exceeds its container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowMode {
    Overflow,
    Ellipsis,
    Masking,
    Truncate,
    ScrollRect,
    Page,
    Linked,
}

/// UV2 mapping mode, chosen independently per axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureMapping {
    /// 0 to 1 across each glyph quad.
    Character,
    /// Normalized within the extents of the glyph's line.
    Line,
    /// Normalized within the extents of the whole text.
    Paragraph,
    /// Derived from the other axis so the texture keeps its aspect ratio.
    MatchAspect,
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_removes_margins() {
        let config = TextLayoutConfig {
            max_width: Some(100.0),
            max_height: Some(50.0),
            margin: Margins {
                left: 10.0,
                top: 5.0,
                right: 20.0,
                bottom: 5.0,
            },
            ..Default::default()
        };
        assert_eq!(config.area_width(), 70.0);
        assert_eq!(config.area_height(), 40.0);
    }

    #[test]
    fn unbounded_area_is_infinite() {
        let config = TextLayoutConfig::default();
        assert!(config.area_width().is_infinite());
        assert!(config.area_height().is_infinite());
    }

    #[test]
    fn wrap_style_predicates() {
        assert!(WrapStyle::WordWrap.wraps());
        assert!(WrapStyle::CharWrap.wraps());
        assert!(!WrapStyle::NoWrap.wraps());
        assert!(!WrapStyle::PreserveWhitespaceNoWrap.wraps());
        assert!(WrapStyle::PreserveWhitespaceNoWrap.preserves_whitespace());
    }
}

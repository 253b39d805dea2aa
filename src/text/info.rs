use euclid::default::{Box2D, Point2D};

use crate::color::Color32;
use crate::glyph_id::{FontAssetId, SpriteAssetId};

use super::config::HorizontalAlign;
use super::mesh::TextVertex;
use super::processing::TextElementType;
use super::style::{FontStyles, HighlightState};

/// Axis aligned bounds, Y axis up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extents {
    pub min: Point2D<f32>,
    pub max: Point2D<f32>,
}

impl Default for Extents {
    fn default() -> Self {
        Self::empty()
    }
}

impl Extents {
    /// Inverted bounds that any included point replaces.
    pub fn empty() -> Self {
        Self {
            min: Point2D::new(f32::INFINITY, f32::INFINITY),
            max: Point2D::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn include(&mut self, point: Point2D<f32>) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&mut self, other: &Extents) {
        if !other.is_empty() {
            self.include(other.min);
            self.include(other.max);
        }
    }

    pub fn width(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.max.x - self.min.x }
    }

    pub fn height(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.max.y - self.min.y }
    }

    pub fn to_box(&self) -> Box2D<f32> {
        Box2D::new(self.min, self.max)
    }
}

/// Everything known about one laid out character.
///
/// Positions are final: the second pass moves them to their aligned place in
/// the container. Whitespace and control characters carry an advance box in
/// place of a glyph quad so decorations and carets can be placed on them.
#[derive(Clone, Debug, PartialEq)]
pub struct CharacterInfo {
    pub element_type: TextElementType,
    /// Code point after case conversion and substitution.
    pub unicode: u32,
    /// Index into the processing element array.
    pub index: usize,
    pub string_index: usize,
    pub string_length: usize,

    pub font_asset: Option<FontAssetId>,
    pub sprite_asset: Option<SpriteAssetId>,
    pub sprite_index: Option<usize>,
    pub glyph_index: u32,
    pub material_reference_index: usize,

    pub point_size: f32,
    pub scale: f32,
    pub aspect_ratio: f32,

    pub bottom_left: Point2D<f32>,
    pub top_left: Point2D<f32>,
    pub top_right: Point2D<f32>,
    pub bottom_right: Point2D<f32>,
    /// Quad vertices in bottom-left, top-left, top-right, bottom-right order.
    pub vertices: [TextVertex; 4],

    /// Cursor position before the character.
    pub origin: f32,
    /// Scaled glyph advance, spacing excluded.
    pub advance: f32,
    /// Cursor position after the character, spacing included.
    pub x_advance: f32,
    pub ascender: f32,
    pub baseline: f32,
    pub descender: f32,

    pub color: Color32,
    pub underline_color: Color32,
    pub strikethrough_color: Color32,
    pub highlight: HighlightState,
    pub style: FontStyles,

    pub is_visible: bool,
    pub line_number: usize,
    pub page_number: usize,
    /// First vertex of the character's quad in its sub-mesh, once written.
    pub vertex_index: Option<usize>,
}

/// A laid out line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineInfo {
    pub first_character_index: usize,
    pub last_character_index: usize,
    pub first_visible_character_index: Option<usize>,
    pub last_visible_character_index: Option<usize>,
    pub character_count: usize,
    pub visible_character_count: usize,
    pub space_count: usize,
    pub word_count: usize,

    pub ascender: f32,
    pub baseline: f32,
    pub descender: f32,
    pub line_height: f32,

    /// Width available to the line.
    pub width: f32,
    /// Right edge of the last visible character, trailing spacing excluded.
    pub max_advance: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub alignment: HorizontalAlign,
    /// The line ends a paragraph (hard break or end of text).
    pub ends_paragraph: bool,
    pub extents: Extents,
}

impl LineInfo {
    pub fn character_range(&self) -> std::ops::RangeInclusive<usize> {
        self.first_character_index..=self.last_character_index
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PageInfo {
    pub first_character_index: usize,
    /// Characters on the page. Pages that only hold a page break are empty.
    pub character_count: usize,
    pub ascender: f32,
    pub baseline: f32,
    pub descender: f32,
    pub extents: Extents,
}

impl PageInfo {
    pub fn last_character_index(&self) -> Option<usize> {
        (self.character_count > 0).then(|| self.first_character_index + self.character_count - 1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WordInfo {
    pub first_character_index: usize,
    pub last_character_index: usize,
    pub character_count: usize,
}

/// A `<link>` run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkInfo {
    pub id: String,
    pub first_character_index: usize,
    pub character_count: usize,
}

/// A character the layout replaced with another code point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacterSubstitution {
    /// Character index the replacement landed on.
    pub index: usize,
    pub unicode: u32,
}

/// Result of a layout pass, reused across passes of the same component.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextInfo {
    pub characters: Vec<CharacterInfo>,
    pub words: Vec<WordInfo>,
    pub lines: Vec<LineInfo>,
    pub pages: Vec<PageInfo>,
    pub links: Vec<LinkInfo>,
    pub substitutions: Vec<CharacterSubstitution>,

    pub space_count: usize,
    pub sprite_count: usize,
    pub visible_character_count: usize,
    pub material_count: usize,

    /// Bounds of the advance boxes of every character.
    pub text_bounds: Extents,
    /// Bounds of the emitted glyph quads.
    pub mesh_extents: Extents,
}

impl TextInfo {
    /// Empties every array, keeping allocations.
    pub fn clear(&mut self) {
        self.characters.clear();
        self.words.clear();
        self.lines.clear();
        self.pages.clear();
        self.links.clear();
        self.substitutions.clear();
        self.space_count = 0;
        self.sprite_count = 0;
        self.visible_character_count = 0;
        self.material_count = 0;
        self.text_bounds = Extents::empty();
        self.mesh_extents = Extents::empty();
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// The laid out characters as a string, substitutions included.
    pub fn text(&self) -> String {
        self.characters
            .iter()
            .filter_map(|c| char::from_u32(c.unicode))
            .collect()
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extents_grow_from_empty() {
        let mut extents = Extents::empty();
        assert!(extents.is_empty());
        assert_eq!(extents.width(), 0.0);

        extents.include(Point2D::new(1.0, -2.0));
        extents.include(Point2D::new(4.0, 3.0));
        assert_eq!(extents.width(), 3.0);
        assert_eq!(extents.height(), 5.0);

        let mut other = Extents::empty();
        other.union(&extents);
        assert_eq!(other, extents);
        other.union(&Extents::empty());
        assert_eq!(other, extents);
    }

    #[test]
    fn page_last_index() {
        let page = PageInfo {
            first_character_index: 4,
            character_count: 3,
            ascender: 0.0,
            baseline: 0.0,
            descender: 0.0,
            extents: Extents::empty(),
        };
        assert_eq!(page.last_character_index(), Some(6));

        let empty = PageInfo {
            character_count: 0,
            ..page
        };
        assert_eq!(empty.last_character_index(), None);
    }
}

//! Deterministic assets for tests.
//!
//! The font is a monospaced grid: every glyph is a 10 x 10 unit box with a
//! 10 unit advance at a 10 point sampling size, sitting 2 units below the
//! baseline. At size 36 every character is therefore 36 units wide and every
//! line 36 units tall.

use euclid::default::Point2D;

use crate::asset::{FaceInfo, FontAsset, Glyph, GlyphMetrics, GlyphRect, SpriteAsset, SpriteCharacter, SpriteGlyph};
use crate::color;
use crate::font_storage::FontStorage;
use crate::glyph_id::FontAssetId;
use crate::text::config::TextLayoutConfig;
use crate::text::info::CharacterInfo;
use crate::text::mesh::TextVertex;
use crate::text::processing::{HORIZONTAL_ELLIPSIS, TextElementType, WHITE_SQUARE};
use crate::text::style::{FontStyles, HighlightState};

pub const POINT_SIZE: f32 = 10.0;
/// Line height of the test font, in ems.
pub const LINE_HEIGHT: f32 = 1.0;

const CELL: u32 = 16;
const ATLAS_SIZE: u32 = 256;

fn metrics() -> GlyphMetrics {
    GlyphMetrics {
        width: 10.0,
        height: 10.0,
        horizontal_bearing_x: 0.0,
        horizontal_bearing_y: 8.0,
        horizontal_advance: 10.0,
    }
}

fn cell(slot: u32) -> GlyphRect {
    let columns = ATLAS_SIZE / CELL;
    GlyphRect {
        x: (slot % columns) * CELL,
        y: (slot / columns) * CELL,
        width: 10,
        height: 10,
    }
}

fn face(name: &str) -> FaceInfo {
    FaceInfo::from_line_metrics(name, POINT_SIZE, 8.0, -2.0, 0.0, 10.0)
}

/// Printable ASCII plus the ellipsis and the missing glyph square.
pub fn font_asset(name: &str) -> FontAsset {
    let mut asset = FontAsset::new(name, face(name), ATLAS_SIZE, ATLAS_SIZE);
    asset.atlas_padding = 0.0;
    let characters = (0x20..0x7F).chain([HORIZONTAL_ELLIPSIS, WHITE_SQUARE]);
    for (slot, unicode) in characters.enumerate() {
        let slot = slot as u32;
        asset.add_glyph(
            unicode,
            Glyph {
                index: slot + 1,
                metrics: metrics(),
                rect: cell(slot),
                scale: 1.0,
            },
        );
    }
    asset
}

/// Storage holding the test font and a default sprite asset with one sprite
/// named `smile`.
pub fn storage() -> (FontStorage, FontAssetId) {
    let mut storage = FontStorage::new();
    let font = storage.add_font_asset(font_asset("Test"));

    let mut sprites = SpriteAsset::new("Emoji", face("Emoji"), 64, 64);
    sprites.add_sprite(
        SpriteCharacter {
            unicode: None,
            name: "smile".to_string(),
            glyph_index: 0,
            scale: 1.0,
        },
        SpriteGlyph {
            index: 0,
            metrics: metrics(),
            rect: cell(0),
            scale: 1.0,
        },
    );
    let sprites = storage.add_sprite_asset(sprites);
    storage.set_default_sprite_asset(Some(sprites));
    (storage, font)
}

/// Default configuration drawing with `font` at size 36.
pub fn config(font: FontAssetId) -> TextLayoutConfig {
    TextLayoutConfig {
        font_asset: Some(font),
        font_size: 36.0,
        ..Default::default()
    }
}

/// Advance of one test glyph at `size`.
pub fn advance(font: FontAssetId, storage: &FontStorage, size: f32) -> f32 {
    storage
        .font_asset(font)
        .and_then(|asset| {
            let glyph = asset.character_glyph('a' as u32)?;
            Some(glyph.metrics.horizontal_advance * size / asset.face_info.point_size * asset.face_info.scale)
        })
        .unwrap_or(0.0)
}

/// A placed character at the origin with every other field zeroed.
pub fn character_info(unicode: u32, glyph_index: u32) -> CharacterInfo {
    let origin = Point2D::new(0.0, 0.0);
    CharacterInfo {
        element_type: TextElementType::Character,
        unicode,
        index: 0,
        string_index: 0,
        string_length: 1,
        font_asset: None,
        sprite_asset: None,
        sprite_index: None,
        glyph_index,
        material_reference_index: 0,
        point_size: 0.0,
        scale: 1.0,
        aspect_ratio: 1.0,
        bottom_left: origin,
        top_left: origin,
        top_right: origin,
        bottom_right: origin,
        vertices: [TextVertex::default(); 4],
        origin: 0.0,
        advance: 0.0,
        x_advance: 0.0,
        ascender: 0.0,
        baseline: 0.0,
        descender: 0.0,
        color: color::WHITE,
        underline_color: color::WHITE,
        strikethrough_color: color::WHITE,
        highlight: HighlightState::default(),
        style: FontStyles::empty(),
        is_visible: true,
        line_number: 0,
        page_number: 0,
        vertex_index: None,
    }
}

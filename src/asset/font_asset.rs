use std::collections::HashMap;

use crate::glyph_id::{FontAssetId, MaterialId};

use super::{FaceInfo, FontFeatureTable, GlyphPairAdjustmentRecord};

/// Errors raised while turning a font face into a [`FontAsset`].
#[derive(thiserror::Error, Debug)]
pub enum FontAssetError {
    #[error("font face {0:?} is not present in the font database")]
    FaceNotFound(fontdb::ID),

    #[error("failed to parse font face: {0}")]
    Parse(&'static str),

    #[error("font face has no horizontal line metrics")]
    NoLineMetrics,

    #[error("none of the requested characters exist in the font face")]
    EmptyCharacterSet,

    #[error("atlas of {width}x{height} is too small for the requested glyphs")]
    AtlasFull { width: u32, height: u32 },
}

/// Glyph metrics at the face point size, Y axis up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphMetrics {
    pub width: f32,
    pub height: f32,
    pub horizontal_bearing_x: f32,
    pub horizontal_bearing_y: f32,
    pub horizontal_advance: f32,
}

/// Location of a glyph in the atlas texture, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    pub index: u32,
    pub metrics: GlyphMetrics,
    pub rect: GlyphRect,
    pub scale: f32,
}

/// Regular and italic variants of one font weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FontWeightPair {
    pub regular: Option<FontAssetId>,
    pub italic: Option<FontAssetId>,
}

/// A font sampled into a glyph atlas, together with everything layout needs to
/// place its glyphs.
#[derive(Clone, Debug)]
pub struct FontAsset {
    pub name: String,
    pub face_info: FaceInfo,
    pub atlas_width: u32,
    pub atlas_height: u32,
    /// Padding (in atlas pixels) around every glyph, used by SDF shaders.
    pub atlas_padding: f32,
    /// Default material, assigned when the asset is registered.
    pub material: Option<MaterialId>,
    pub feature_table: FontFeatureTable,
    /// Searched in order when a character is missing from this asset.
    pub fallbacks: Vec<FontAssetId>,
    /// Weight variants for 100..=900, indexed by `weight / 100 - 1`.
    pub weight_table: [FontWeightPair; 9],
    /// Extra padding added around glyphs rendered with faux bold.
    pub bold_style: f32,
    /// Additional advance (in hundredths of an em) for faux bold glyphs.
    pub bold_spacing: f32,
    /// Shear applied by `<i>`, in hundredths.
    pub italic_style: f32,
    /// Tab width in multiples of [`FaceInfo::tab_width`].
    pub tab_multiple: f32,
    characters: HashMap<u32, u32, fxhash::FxBuildHasher>,
    glyphs: HashMap<u32, Glyph, fxhash::FxBuildHasher>,
}

impl FontAsset {
    pub fn new(name: impl Into<String>, face_info: FaceInfo, atlas_width: u32, atlas_height: u32) -> Self {
        Self {
            name: name.into(),
            face_info,
            atlas_width,
            atlas_height,
            atlas_padding: 5.0,
            material: None,
            feature_table: FontFeatureTable::new(),
            fallbacks: Vec::new(),
            weight_table: [FontWeightPair::default(); 9],
            bold_style: 0.75,
            bold_spacing: 7.0,
            italic_style: 35.0,
            tab_multiple: 10.0,
            characters: HashMap::default(),
            glyphs: HashMap::default(),
        }
    }

    /// Registers a glyph and maps `unicode` to it.
    pub fn add_glyph(&mut self, unicode: u32, glyph: Glyph) {
        self.characters.insert(unicode, glyph.index);
        self.glyphs.insert(glyph.index, glyph);
    }

    /// Maps another code point to an already registered glyph.
    pub fn add_character_alias(&mut self, unicode: u32, glyph_index: u32) -> bool {
        if self.glyphs.contains_key(&glyph_index) {
            self.characters.insert(unicode, glyph_index);
            true
        } else {
            false
        }
    }

    pub fn has_character(&self, unicode: u32) -> bool {
        self.characters.contains_key(&unicode)
    }

    pub fn character_glyph(&self, unicode: u32) -> Option<&Glyph> {
        self.characters
            .get(&unicode)
            .and_then(|index| self.glyphs.get(index))
    }

    pub fn glyph(&self, glyph_index: u32) -> Option<&Glyph> {
        self.glyphs.get(&glyph_index)
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    /// Returns the variant registered for `weight`, if any.
    pub fn weight_variant(&self, weight: u16, italic: bool) -> Option<FontAssetId> {
        let slot = (weight / 100).clamp(1, 9) as usize - 1;
        let pair = self.weight_table[slot];
        if italic { pair.italic } else { pair.regular }
    }

    /// Samples `characters` from a fontdue font at `point_size` and packs their
    /// bitmaps into an atlas of `atlas_width` x `atlas_height` pixels.
    ///
    /// Kerning between every pair of sampled glyphs is copied into the feature
    /// table. Characters the font does not cover are skipped.
    pub fn from_fontdue(
        name: impl Into<String>,
        font: &fontdue::Font,
        point_size: f32,
        characters: impl IntoIterator<Item = char>,
        atlas_width: u32,
        atlas_height: u32,
        atlas_padding: u32,
    ) -> Result<Self, FontAssetError> {
        let line_metrics = font
            .horizontal_line_metrics(point_size)
            .ok_or(FontAssetError::NoLineMetrics)?;
        let space_advance = font.metrics(' ', point_size).advance_width;

        let face_info = FaceInfo::from_line_metrics(
            font.name().unwrap_or("unnamed"),
            point_size,
            line_metrics.ascent,
            line_metrics.descent,
            line_metrics.line_gap,
            space_advance,
        );

        let mut asset = FontAsset::new(name, face_info, atlas_width, atlas_height);
        asset.atlas_padding = atlas_padding as f32;

        let mut packer = ShelfPacker::new(atlas_width, atlas_height, atlas_padding);
        let mut sampled: Vec<u16> = Vec::new();

        for ch in characters {
            let glyph_index = font.lookup_glyph_index(ch);
            if glyph_index == 0 && ch != '\0' {
                continue;
            }

            if asset.glyphs.contains_key(&(glyph_index as u32)) {
                asset.add_character_alias(ch as u32, glyph_index as u32);
                continue;
            }

            let metrics = font.metrics_indexed(glyph_index, point_size);
            let rect = packer
                .allocate(metrics.width as u32, metrics.height as u32)
                .ok_or(FontAssetError::AtlasFull {
                    width: atlas_width,
                    height: atlas_height,
                })?;

            asset.add_glyph(
                ch as u32,
                Glyph {
                    index: glyph_index as u32,
                    metrics: GlyphMetrics {
                        width: metrics.width as f32,
                        height: metrics.height as f32,
                        horizontal_bearing_x: metrics.xmin as f32,
                        horizontal_bearing_y: metrics.ymin as f32 + metrics.height as f32,
                        horizontal_advance: metrics.advance_width,
                    },
                    rect,
                    scale: 1.0,
                },
            );
            sampled.push(glyph_index);
        }

        if asset.glyphs.is_empty() {
            return Err(FontAssetError::EmptyCharacterSet);
        }

        for &left in &sampled {
            for &right in &sampled {
                if let Some(kern) = font.horizontal_kern_indexed(left, right, point_size)
                    && kern != 0.0
                {
                    asset.feature_table.add_pair_adjustment(GlyphPairAdjustmentRecord::kerning(
                        left as u32,
                        right as u32,
                        kern,
                    ));
                }
            }
        }

        log::debug!(
            "sampled font asset '{}' with {} glyphs and {} kerning pairs",
            asset.name,
            asset.glyphs.len(),
            asset.feature_table.pair_adjustment_count()
        );

        Ok(asset)
    }
}

/// Row based rectangle allocator used when sampling glyph atlases.
struct ShelfPacker {
    width: u32,
    height: u32,
    padding: u32,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
}

impl ShelfPacker {
    fn new(width: u32, height: u32, padding: u32) -> Self {
        Self {
            width,
            height,
            padding,
            cursor_x: padding,
            cursor_y: padding,
            row_height: 0,
        }
    }

    fn allocate(&mut self, width: u32, height: u32) -> Option<GlyphRect> {
        let padded_width = width + self.padding * 2;
        let padded_height = height + self.padding * 2;

        if self.cursor_x + padded_width > self.width {
            self.cursor_x = self.padding;
            self.cursor_y += self.row_height;
            self.row_height = 0;
        }

        if self.cursor_x + padded_width > self.width || self.cursor_y + padded_height > self.height {
            return None;
        }

        let rect = GlyphRect {
            x: self.cursor_x + self.padding,
            y: self.cursor_y + self.padding,
            width,
            height,
        };
        self.cursor_x += padded_width;
        self.row_height = self.row_height.max(padded_height);
        Some(rect)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(index: u32) -> Glyph {
        Glyph {
            index,
            metrics: GlyphMetrics {
                width: 10.0,
                height: 10.0,
                horizontal_bearing_x: 0.0,
                horizontal_bearing_y: 10.0,
                horizontal_advance: 12.0,
            },
            rect: GlyphRect::default(),
            scale: 1.0,
        }
    }

    #[test]
    fn character_lookup_goes_through_glyph_table() {
        let face = FaceInfo::from_line_metrics("Test", 10.0, 8.0, -2.0, 0.0, 5.0);
        let mut asset = FontAsset::new("Test", face, 64, 64);
        asset.add_glyph('A' as u32, glyph(1));

        assert!(asset.has_character('A' as u32));
        assert_eq!(asset.character_glyph('A' as u32).unwrap().index, 1);
        assert!(asset.character_glyph('B' as u32).is_none());

        assert!(asset.add_character_alias('a' as u32, 1));
        assert!(!asset.add_character_alias('b' as u32, 99));
        assert_eq!(asset.character_count(), 2);
    }

    #[test]
    fn weight_variants_clamp_to_table() {
        let face = FaceInfo::from_line_metrics("Test", 10.0, 8.0, -2.0, 0.0, 5.0);
        let mut asset = FontAsset::new("Test", face, 64, 64);
        asset.weight_table[6].regular = Some(FontAssetId(4));

        assert_eq!(asset.weight_variant(700, false), Some(FontAssetId(4)));
        assert_eq!(asset.weight_variant(700, true), None);
        assert_eq!(asset.weight_variant(0, false), None);
        assert_eq!(asset.weight_variant(2000, false), None);
    }

    #[test]
    fn shelf_packer_wraps_rows_and_reports_full() {
        let mut packer = ShelfPacker::new(32, 26, 1);
        let a = packer.allocate(10, 10).unwrap();
        let b = packer.allocate(10, 10).unwrap();
        assert_eq!(a.y, b.y);
        assert!(b.x > a.x);

        let c = packer.allocate(10, 10).unwrap();
        assert!(c.y > a.y);
        assert_eq!(c.x, a.x);

        assert!(packer.allocate(10, 10).is_some());
        assert!(packer.allocate(10, 10).is_none());
    }
}

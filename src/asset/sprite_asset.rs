use std::collections::HashMap;

use crate::glyph_id::{MaterialId, SpriteAssetId};

use super::{FaceInfo, GlyphMetrics, GlyphRect};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteGlyph {
    pub index: u32,
    pub metrics: GlyphMetrics,
    pub rect: GlyphRect,
    pub scale: f32,
}

/// A named sprite, optionally bound to a code point (emoji style lookups).
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteCharacter {
    pub unicode: Option<u32>,
    pub name: String,
    pub glyph_index: u32,
    pub scale: f32,
}

/// Atlas of inline images referenced with `<sprite>` or by code point.
#[derive(Clone, Debug)]
pub struct SpriteAsset {
    pub name: String,
    pub face_info: FaceInfo,
    pub atlas_width: u32,
    pub atlas_height: u32,
    pub material: Option<MaterialId>,
    pub fallbacks: Vec<SpriteAssetId>,
    characters: Vec<SpriteCharacter>,
    glyphs: HashMap<u32, SpriteGlyph, fxhash::FxBuildHasher>,
    name_lookup: HashMap<String, usize, fxhash::FxBuildHasher>,
    unicode_lookup: HashMap<u32, usize, fxhash::FxBuildHasher>,
}

impl SpriteAsset {
    pub fn new(name: impl Into<String>, face_info: FaceInfo, atlas_width: u32, atlas_height: u32) -> Self {
        Self {
            name: name.into(),
            face_info,
            atlas_width,
            atlas_height,
            material: None,
            fallbacks: Vec::new(),
            characters: Vec::new(),
            glyphs: HashMap::default(),
            name_lookup: HashMap::default(),
            unicode_lookup: HashMap::default(),
        }
    }

    /// Adds a sprite and returns its character index (the value used by
    /// `<sprite=N>`).
    pub fn add_sprite(&mut self, character: SpriteCharacter, glyph: SpriteGlyph) -> usize {
        let index = self.characters.len();
        self.name_lookup.insert(character.name.clone(), index);
        if let Some(unicode) = character.unicode {
            self.unicode_lookup.insert(unicode, index);
        }
        self.glyphs.insert(glyph.index, glyph);
        self.characters.push(character);
        index
    }

    pub fn character(&self, index: usize) -> Option<&SpriteCharacter> {
        self.characters.get(index)
    }

    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.name_lookup.get(name).copied()
    }

    pub fn index_of_unicode(&self, unicode: u32) -> Option<usize> {
        self.unicode_lookup.get(&unicode).copied()
    }

    pub fn glyph(&self, glyph_index: u32) -> Option<&SpriteGlyph> {
        self.glyphs.get(&glyph_index)
    }

    /// Character and glyph of the sprite at `index`.
    pub fn sprite(&self, index: usize) -> Option<(&SpriteCharacter, &SpriteGlyph)> {
        let character = self.characters.get(index)?;
        let glyph = self.glyphs.get(&character.glyph_index)?;
        Some((character, glyph))
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprites_resolve_by_index_name_and_unicode() {
        let face = FaceInfo::from_line_metrics("Emoji", 32.0, 28.0, -4.0, 0.0, 0.0);
        let mut asset = SpriteAsset::new("Emoji", face, 128, 128);
        let glyph = SpriteGlyph {
            index: 7,
            metrics: GlyphMetrics {
                width: 32.0,
                height: 32.0,
                horizontal_bearing_x: 0.0,
                horizontal_bearing_y: 28.0,
                horizontal_advance: 32.0,
            },
            rect: GlyphRect {
                x: 0,
                y: 0,
                width: 32,
                height: 32,
            },
            scale: 1.0,
        };
        let index = asset.add_sprite(
            SpriteCharacter {
                unicode: Some(0x1F600),
                name: "grin".into(),
                glyph_index: 7,
                scale: 1.0,
            },
            glyph,
        );

        assert_eq!(index, 0);
        assert_eq!(asset.index_of_name("grin"), Some(0));
        assert_eq!(asset.index_of_unicode(0x1F600), Some(0));
        assert_eq!(asset.sprite(0).unwrap().1.index, 7);
        assert!(asset.sprite(1).is_none());
    }
}

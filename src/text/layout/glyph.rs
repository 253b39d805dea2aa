//! Resolves code points to glyphs across fonts, fallbacks and sprites.

use crate::asset::{FaceInfo, FontAsset, Glyph, GlyphMetrics, GlyphRect};
use crate::font_storage::FontStorage;
use crate::glyph_id::{FontAssetId, SpriteAssetId};
use crate::text::processing::{SPACE, TextElementType};
use crate::text::style::FontStyles;

use super::{CharKind, LayoutContext, classify};

/// Sprites without a code point are reported under this private use value.
const SPRITE_PLACEHOLDER: u32 = 0xE000;
const REGULAR_WEIGHT: u16 = 400;
const BOLD_WEIGHT: u16 = 700;

/// A glyph ready to be placed, with the asset data it was found in.
#[derive(Clone, Debug)]
pub(super) struct ResolvedGlyph<'a> {
    pub element_type: TextElementType,
    /// Code point the glyph stands for, after any substitution.
    pub unicode: u32,
    pub font_asset: Option<FontAssetId>,
    pub font: Option<&'a FontAsset>,
    pub sprite_asset: Option<SpriteAssetId>,
    pub sprite_index: Option<usize>,
    pub glyph_index: u32,
    pub metrics: GlyphMetrics,
    pub rect: GlyphRect,
    /// Glyph scale times sprite scale.
    pub glyph_scale: f32,
    pub face: &'a FaceInfo,
    pub atlas_size: [f32; 2],
    pub material_reference: usize,
    pub padding: f32,
    pub is_bold_variant: bool,
    pub is_italic_variant: bool,
    /// The requested character was missing and this glyph replaces it.
    pub is_missing: bool,
}

impl<'a> ResolvedGlyph<'a> {
    fn from_font(
        font_asset: FontAssetId,
        font: &'a FontAsset,
        unicode: u32,
        glyph: &Glyph,
        material_reference: usize,
        padding: f32,
    ) -> Self {
        Self {
            element_type: TextElementType::Character,
            unicode,
            font_asset: Some(font_asset),
            font: Some(font),
            sprite_asset: None,
            sprite_index: None,
            glyph_index: glyph.index,
            metrics: glyph.metrics,
            rect: glyph.rect,
            glyph_scale: glyph.scale,
            face: &font.face_info,
            atlas_size: [font.atlas_width as f32, font.atlas_height as f32],
            material_reference,
            padding,
            is_bold_variant: false,
            is_italic_variant: false,
            is_missing: false,
        }
    }

    /// Zero sized stand-in when not even a space is available.
    fn empty(font_asset: FontAssetId, font: &'a FontAsset, unicode: u32) -> Self {
        Self {
            element_type: TextElementType::Character,
            unicode,
            font_asset: Some(font_asset),
            font: Some(font),
            sprite_asset: None,
            sprite_index: None,
            glyph_index: 0,
            metrics: GlyphMetrics::default(),
            rect: GlyphRect::default(),
            glyph_scale: 1.0,
            face: &font.face_info,
            atlas_size: [font.atlas_width as f32, font.atlas_height as f32],
            material_reference: 0,
            padding: 0.0,
            is_bold_variant: false,
            is_italic_variant: false,
            is_missing: true,
        }
    }
}

/// Depth first search through a fallback chain, skipping assets already seen.
fn search_fallbacks<'s>(
    storage: &'s FontStorage,
    chain: &[FontAssetId],
    unicode: u32,
    visited: &mut Vec<FontAssetId>,
) -> Option<(FontAssetId, &'s FontAsset, &'s Glyph)> {
    for &id in chain {
        if visited.contains(&id) {
            continue;
        }
        visited.push(id);
        let Some(asset) = storage.font_asset(id) else {
            continue;
        };
        if let Some(glyph) = asset.character_glyph(unicode) {
            return Some((id, asset, glyph));
        }
        if let Some(found) = search_fallbacks(storage, &asset.fallbacks, unicode, visited) {
            return Some(found);
        }
    }
    None
}

fn search_sprites(
    storage: &FontStorage,
    id: SpriteAssetId,
    unicode: u32,
    visited: &mut Vec<SpriteAssetId>,
) -> Option<(SpriteAssetId, usize)> {
    if visited.contains(&id) {
        return None;
    }
    visited.push(id);
    let asset = storage.sprite_asset(id)?;
    if let Some(index) = asset.index_of_unicode(unicode) {
        return Some((id, index));
    }
    asset
        .fallbacks
        .iter()
        .find_map(|&fallback| search_sprites(storage, fallback, unicode, visited))
}

impl<'a> LayoutContext<'a> {
    /// Font asset of the material on top of the material stack.
    pub(super) fn current_font(&self) -> FontAssetId {
        self.materials
            .get(self.cursor.styles.material_reference.current())
            .and_then(|reference| reference.font_asset)
            .unwrap_or(self.primary_font)
    }

    pub(super) fn current_face(&self) -> &'a FaceInfo {
        self.storage
            .font_asset(self.current_font())
            .map(|asset| &asset.face_info)
            .unwrap_or(&self.primary.face_info)
    }

    /// Index of the default material of `font`, registering it if needed.
    pub(super) fn font_material_reference(&mut self, font: FontAssetId, is_fallback: bool) -> usize {
        let storage = self.storage;
        match storage.font_asset(font) {
            Some(asset) => match asset.material {
                Some(material) => {
                    self.materials
                        .add_font_material(material, font, asset.atlas_padding, is_fallback)
                }
                None => {
                    log::warn!(
                        "font asset '{}' has no material, drawing it with the primary material",
                        asset.name
                    );
                    0
                }
            },
            None => 0,
        }
    }

    fn material_padding(&self, reference: usize) -> f32 {
        self.materials
            .get(reference)
            .map(|reference| reference.padding)
            .unwrap_or(self.primary.atlas_padding)
    }

    /// Looks `unicode` up through the whole resolution chain, falling back to
    /// the missing glyph, a space, and finally an empty glyph.
    pub(super) fn resolve_character(&mut self, unicode: u32) -> ResolvedGlyph<'a> {
        if let Some(glyph) = self.lookup_character(unicode) {
            return glyph;
        }

        // Control and spacing characters borrow the space glyph's metrics.
        if classify(unicode) != CharKind::Visible {
            let mut glyph = self
                .lookup_character(SPACE)
                .unwrap_or_else(|| ResolvedGlyph::empty(self.primary_font, self.primary, unicode));
            glyph.unicode = unicode;
            glyph.is_missing = false;
            return glyph;
        }

        let font = self.storage.font_asset(self.current_font()).unwrap_or(self.primary);
        log::warn!(
            "character U+{:04X} is missing from font asset '{}' and its fallbacks, substituting U+{:04X}",
            unicode,
            font.name,
            self.config.missing_glyph
        );

        for replacement in [self.config.missing_glyph, SPACE] {
            if let Some(mut glyph) = self.lookup_character(replacement) {
                glyph.is_missing = true;
                return glyph;
            }
        }
        ResolvedGlyph::empty(self.primary_font, self.primary, unicode)
    }

    fn lookup_character(&mut self, unicode: u32) -> Option<ResolvedGlyph<'a>> {
        let storage = self.storage;
        let font_id = self.current_font();
        let font = storage.font_asset(font_id)?;

        let style = self.cursor.styles.style.active();
        let italic = style.contains(FontStyles::ITALIC);
        let weight = if style.contains(FontStyles::BOLD) {
            BOLD_WEIGHT
        } else {
            self.cursor.styles.font_weight.current()
        };

        if (weight != REGULAR_WEIGHT || italic)
            && let Some(variant_id) = font.weight_variant(weight, italic)
            && let Some(variant) = storage.font_asset(variant_id)
            && let Some(glyph) = variant.character_glyph(unicode)
        {
            let reference = self.font_material_reference(variant_id, false);
            let padding = self.material_padding(reference);
            let mut resolved =
                ResolvedGlyph::from_font(variant_id, variant, unicode, glyph, reference, padding);
            resolved.is_bold_variant = weight >= 600;
            resolved.is_italic_variant = italic;
            return Some(resolved);
        }

        if let Some(glyph) = font.character_glyph(unicode) {
            let reference = self.cursor.styles.material_reference.current();
            let padding = self.material_padding(reference);
            return Some(ResolvedGlyph::from_font(font_id, font, unicode, glyph, reference, padding));
        }

        let mut visited = vec![font_id];
        let found = search_fallbacks(storage, &font.fallbacks, unicode, &mut visited).or_else(|| {
            search_fallbacks(storage, storage.fallback_font_assets(), unicode, &mut visited)
        });
        if let Some((id, asset, glyph)) = found {
            let reference = self.font_material_reference(id, true);
            let padding = self.material_padding(reference);
            return Some(ResolvedGlyph::from_font(id, asset, unicode, glyph, reference, padding));
        }

        let mut visited = Vec::new();
        let sprite = self
            .cursor
            .tags
            .sprite_asset
            .into_iter()
            .chain(storage.default_sprite_asset())
            .find_map(|id| search_sprites(storage, id, unicode, &mut visited));
        if let Some((asset, index)) = sprite {
            return self.sprite_glyph(asset, index).map(|mut glyph| {
                glyph.unicode = unicode;
                glyph
            });
        }

        None
    }

    /// The sprite at `index` in `asset`, or `None` if either does not exist.
    pub(super) fn sprite_glyph(&mut self, asset_id: SpriteAssetId, index: usize) -> Option<ResolvedGlyph<'a>> {
        let storage = self.storage;
        let asset = storage.sprite_asset(asset_id)?;
        let (character, glyph) = asset.sprite(index)?;
        let reference = match asset.material {
            Some(material) => self.materials.add_sprite_material(material, asset_id),
            None => {
                log::warn!("sprite asset '{}' has no material", asset.name);
                return None;
            }
        };

        Some(ResolvedGlyph {
            element_type: TextElementType::Sprite,
            unicode: character.unicode.unwrap_or(SPRITE_PLACEHOLDER),
            font_asset: None,
            font: None,
            sprite_asset: Some(asset_id),
            sprite_index: Some(index),
            glyph_index: glyph.index,
            metrics: glyph.metrics,
            rect: glyph.rect,
            glyph_scale: character.scale * glyph.scale,
            face: &asset.face_info,
            atlas_size: [asset.atlas_width as f32, asset.atlas_height as f32],
            material_reference: reference,
            padding: 0.0,
            is_bold_variant: false,
            is_italic_variant: false,
            is_missing: false,
        })
    }
}

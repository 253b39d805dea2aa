/// Identifies a [`FontAsset`](crate::asset::FontAsset) registered in a [`FontStorage`](crate::FontStorage).
///
/// Ids are handed out sequentially by the storage and are not stable across
/// program runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontAssetId(pub(crate) u32);

/// Identifies a [`SpriteAsset`](crate::asset::SpriteAsset).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteAssetId(pub(crate) u32);

/// Identifies a [`Material`](crate::asset::Material). Every sub-mesh of a layout
/// belongs to exactly one material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub(crate) u32);

impl FontAssetId {
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl SpriteAssetId {
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl MaterialId {
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// Lookup key of a glyph pair in the feature tables: `(first << 16) | second`.
///
/// Glyph indices above `u16::MAX` are truncated, matching the 16-bit glyph
/// space of OpenType.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlyphPairKey(u32);

impl GlyphPairKey {
    pub fn new(first: u32, second: u32) -> Self {
        Self(((first & 0xFFFF) << 16) | (second & 0xFFFF))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn first(&self) -> u32 {
        self.0 >> 16
    }

    pub fn second(&self) -> u32 {
        self.0 & 0xFFFF
    }
}

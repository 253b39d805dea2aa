//! Font, sprite and material data consumed by the layout engine.
//!
//! Assets are plain data. They are usually built once (either by hand through
//! the builders here or from a font file through
//! [`FontStorage::create_font_asset`](crate::FontStorage::create_font_asset))
//! and then registered in a [`FontStorage`](crate::FontStorage), which hands out
//! the ids the layout refers to.

mod face;
mod feature_table;
mod font_asset;
mod gradient;
mod material;
mod sprite_asset;

pub use face::FaceInfo;
pub use feature_table::{
    FeatureLookupFlags, FontFeatureTable, GlyphAdjustmentRecord, GlyphAnchorPoint,
    GlyphPairAdjustmentRecord, GlyphValueRecord, MarkPositionAdjustment,
    MarkToBaseAdjustmentRecord, MarkToMarkAdjustmentRecord,
};
pub use font_asset::{FontAsset, FontAssetError, FontWeightPair, Glyph, GlyphMetrics, GlyphRect};
pub use gradient::ColorGradient;
pub use material::{Material, MaterialSource};
pub use sprite_asset::{SpriteAsset, SpriteCharacter, SpriteGlyph};

use crate::glyph_id::{FontAssetId, SpriteAssetId};

/// Atlas the material samples from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialSource {
    Font(FontAssetId),
    Sprite(SpriteAssetId),
}

/// Render state shared by every glyph drawn with it. The layout only needs to
/// know which atlas the material samples and how much padding its shader
/// expects around each glyph.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub source: MaterialSource,
    pub padding: f32,
}

impl Material {
    pub fn new(name: impl Into<String>, source: MaterialSource, padding: f32) -> Self {
        Self {
            name: name.into(),
            source,
            padding,
        }
    }
}

/// Surfaces that own a text and its layout buffers.
pub mod component;
/// Layout configuration.
pub mod config;
/// Per-character, word, line and page metrics.
pub mod info;
/// The layout engine.
pub(crate) mod layout;
/// Break opportunities and CJK line-breaking rules.
pub mod line_breaking;
/// Rich text tag parsing.
pub mod markup;
/// Vertex buffers and material references.
pub mod mesh;
/// Source string tokenization.
pub mod processing;
/// Style stacks and style bits.
pub mod style;
/// The trait linked overflow drives.
pub mod target;

pub use component::TextComponent;
pub use config::{
    HorizontalAlign, Margins, OverflowMode, TextLayoutConfig, TextureMapping, VerticalAlign,
    WrapStyle,
};
pub use info::{
    CharacterInfo, CharacterSubstitution, Extents, LineInfo, LinkInfo, PageInfo, TextInfo,
    WordInfo,
};
pub use line_breaking::LineBreakingRules;
pub use mesh::{MaterialReference, MaterialReferenceManager, MeshInfo, TextVertex};
pub use processing::TextElementType;
pub use style::{FontStyles, HighlightState};
pub use target::TextRenderTarget;

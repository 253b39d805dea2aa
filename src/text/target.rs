use crate::color::Color32;
use crate::font_storage::FontStorage;

use super::info::TextInfo;
use super::line_breaking::LineBreakingRules;

/// A surface that owns text and can lay it out.
///
/// Overflow in [`OverflowMode::Linked`](super::config::OverflowMode::Linked)
/// hands the remaining text to the next surface through this trait, so a chain
/// of surfaces can mix component types.
pub trait TextRenderTarget {
    fn text(&self) -> &str;

    fn set_text(&mut self, text: &str);

    /// Base color of the text; tags still override it unless the target
    /// ignores tag colors.
    fn set_vertex_color(&mut self, color: Color32);

    /// Characters before `index` are laid out but not drawn.
    fn set_first_visible_character(&mut self, index: usize);

    /// Called after the first pass, before the mesh is assembled.
    fn on_preprocessed(&mut self, _info: &TextInfo) {}

    /// Runs a full layout pass.
    fn generate(&mut self, storage: &FontStorage, rules: &LineBreakingRules);
}

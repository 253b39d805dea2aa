use std::fmt;

use crate::color::Color32;
use crate::font_storage::FontStorage;

use super::config::{OverflowMode, TextLayoutConfig};
use super::info::TextInfo;
use super::layout::{self, LayoutInput};
use super::line_breaking::LineBreakingRules;
use super::mesh::{MaterialReferenceManager, MeshInfo};
use super::processing::{TextProcessingElement, build_processing_array};
use super::target::TextRenderTarget;

type PreprocessHook = Box<dyn FnMut(&TextInfo) + Send>;

/// A text surface: the source string, its configuration and the buffers the
/// last layout produced.
///
/// Buffers are kept between calls to [`TextComponent::generate`] so that
/// laying out similar text again reuses their allocations.
pub struct TextComponent {
    text: String,
    pub config: TextLayoutConfig,

    elements: Vec<TextProcessingElement>,
    /// Escape setting the elements were built with, `None` when stale.
    parsed_escapes: Option<bool>,

    info: TextInfo,
    meshes: Vec<MeshInfo>,
    materials: MaterialReferenceManager,
    linked: Option<Box<dyn TextRenderTarget + Send>>,
    on_preprocessed: Option<PreprocessHook>,

    font_size: f32,
    char_width_adjustment: f32,
    is_auto_size_point_size_set: bool,
    is_text_truncated: bool,
    first_overflow_character_index: Option<usize>,
}

impl fmt::Debug for TextComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextComponent")
            .field("text", &self.text)
            .field("config", &self.config)
            .field("characters", &self.info.character_count())
            .field("meshes", &self.meshes.len())
            .field("linked", &self.linked.is_some())
            .field("font_size", &self.font_size)
            .field("is_text_truncated", &self.is_text_truncated)
            .finish_non_exhaustive()
    }
}

impl TextComponent {
    pub fn new(text: impl Into<String>, config: TextLayoutConfig) -> Self {
        let font_size = config.font_size;
        Self {
            text: text.into(),
            config,
            elements: Vec::new(),
            parsed_escapes: None,
            info: TextInfo::default(),
            meshes: Vec::new(),
            materials: MaterialReferenceManager::new(),
            linked: None,
            on_preprocessed: None,
            font_size,
            char_width_adjustment: 0.0,
            is_auto_size_point_size_set: false,
            is_text_truncated: false,
            first_overflow_character_index: None,
        }
    }

    pub fn info(&self) -> &TextInfo {
        &self.info
    }

    /// One sub-mesh per material, indexed like the material references.
    pub fn meshes(&self) -> &[MeshInfo] {
        &self.meshes
    }

    /// Materials of the last layout, with the characters drawn by each.
    pub fn materials(&self) -> &MaterialReferenceManager {
        &self.materials
    }

    /// Point size the last layout settled on.
    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Horizontal compression applied by auto-size, `0.0..1.0`.
    pub fn char_width_adjustment(&self) -> f32 {
        self.char_width_adjustment
    }

    pub fn is_auto_size_point_size_set(&self) -> bool {
        self.is_auto_size_point_size_set
    }

    pub fn is_text_truncated(&self) -> bool {
        self.is_text_truncated
    }

    pub fn first_overflow_character_index(&self) -> Option<usize> {
        self.first_overflow_character_index
    }

    /// Surface that receives the text this one cannot fit in
    /// [`OverflowMode::Linked`].
    pub fn set_linked(&mut self, linked: Option<Box<dyn TextRenderTarget + Send>>) {
        self.linked = linked;
    }

    pub fn linked(&self) -> Option<&(dyn TextRenderTarget + Send)> {
        self.linked.as_deref()
    }

    pub fn linked_mut(&mut self) -> Option<&mut (dyn TextRenderTarget + Send + 'static)> {
        self.linked.as_deref_mut()
    }

    /// Runs `hook` between the layout and the mesh assembly of every pass.
    pub fn set_preprocess_hook(&mut self, hook: impl FnMut(&TextInfo) + Send + 'static) {
        self.on_preprocessed = Some(Box::new(hook));
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        if self.text != text {
            self.text.clear();
            self.text.push_str(text);
            self.parsed_escapes = None;
        }
    }

    /// Lays the text out and rebuilds its meshes, then feeds any overflow to
    /// the linked surface.
    pub fn generate(&mut self, storage: &FontStorage, rules: &LineBreakingRules) {
        self.ensure_elements();
        let input = LayoutInput {
            elements: &self.elements,
            config: &self.config,
            storage,
            rules,
        };
        let mut result = layout::layout_text(&input, &mut self.info);
        if let Some(hook) = self.on_preprocessed.as_mut() {
            hook(&self.info);
        }
        layout::assemble_mesh(&mut self.info, &self.config, storage, &mut result, &mut self.meshes);

        self.font_size = result.font_size;
        self.char_width_adjustment = result.char_width_adjustment;
        self.is_auto_size_point_size_set = result.is_auto_size_point_size_set;
        self.is_text_truncated = result.is_text_truncated;
        self.first_overflow_character_index = result.first_overflow_character_index;
        self.materials = std::mem::take(&mut result.materials);

        if self.config.overflow_mode == OverflowMode::Linked
            && let Some(linked) = self.linked.as_mut()
        {
            let rest = result
                .overflow_string_index
                .and_then(|index| self.text.get(index..))
                .unwrap_or("");
            log::trace!("handing {} bytes over to the linked text", rest.len());
            linked.set_text(rest);
            linked.set_vertex_color(self.config.color);
            linked.set_first_visible_character(0);
            linked.generate(storage, rules);
        }
    }

    fn ensure_elements(&mut self) {
        let escapes = self.config.parse_ctrl_characters;
        if self.parsed_escapes != Some(escapes) {
            self.elements = build_processing_array(&self.text, escapes);
            self.parsed_escapes = Some(escapes);
        }
    }

    /// Size the text needs when nothing constrains it: no container, no
    /// overflow handling, auto-size at its largest size.
    pub fn preferred_values(&self, storage: &FontStorage, rules: &LineBreakingRules) -> [f32; 2] {
        let config = TextLayoutConfig {
            max_width: None,
            max_height: None,
            overflow_mode: OverflowMode::Overflow,
            auto_size: false,
            font_size: if self.config.auto_size {
                self.config.font_size_max
            } else {
                self.config.font_size
            },
            ..self.config.clone()
        };
        let elements = build_processing_array(&self.text, config.parse_ctrl_characters);
        let input = LayoutInput {
            elements: &elements,
            config: &config,
            storage,
            rules,
        };
        let mut info = TextInfo::default();
        layout::layout_text(&input, &mut info);
        layout::preferred_size(&info, &config)
    }
}

impl TextRenderTarget for TextComponent {
    fn text(&self) -> &str {
        TextComponent::text(self)
    }

    fn set_text(&mut self, text: &str) {
        TextComponent::set_text(self, text);
    }

    fn set_vertex_color(&mut self, color: Color32) {
        self.config.color = color;
    }

    fn set_first_visible_character(&mut self, index: usize) {
        self.config.first_visible_character = index;
    }

    fn on_preprocessed(&mut self, info: &TextInfo) {
        if let Some(hook) = self.on_preprocessed.as_mut() {
            hook(info);
        }
    }

    fn generate(&mut self, storage: &FontStorage, rules: &LineBreakingRules) {
        TextComponent::generate(self, storage, rules);
    }
}

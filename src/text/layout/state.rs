//! Cursor snapshots used to rewind the layout.

use crate::glyph_id::SpriteAssetId;
use crate::text::style::StyleStacks;

/// Values set by tags that do not nest.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TagValues {
    /// Sprite asset searched first for code points no font covers.
    pub sprite_asset: Option<SpriteAssetId>,
    /// `<cspace>`, in layout units.
    pub character_spacing: f32,
    /// `<mspace>` advance, in layout units.
    pub monospace: Option<f32>,
    pub line_indent: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// `<width>` override of the line width.
    pub width: Option<f32>,
    /// `<line-height>` override of the line advance.
    pub line_height: Option<f32>,
    /// `<rotate>`, in degrees.
    pub rotation: f32,
    pub no_break: bool,
    pub no_parse: bool,
}

impl TagValues {
    pub fn new(sprite_asset: Option<SpriteAssetId>) -> Self {
        Self {
            sprite_asset,
            character_spacing: 0.0,
            monospace: None,
            line_indent: 0.0,
            margin_left: 0.0,
            margin_right: 0.0,
            width: None,
            line_height: None,
            rotation: 0.0,
            no_break: false,
            no_parse: false,
        }
    }
}

/// Full snapshot of the layout cursor.
///
/// Restoring a snapshot puts the cursor back exactly where it was: the next
/// element to process, the number of characters laid out so far and the
/// horizontal advance are reproduced, and the output arrays are truncated to
/// the recorded counts.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct WordWrapState {
    /// Next processing element.
    pub processing_index: usize,
    pub character_count: usize,
    pub visible_character_count: usize,
    pub sprite_count: usize,
    pub space_count: usize,
    pub word_count: usize,
    pub link_count: usize,
    pub substitution_count: usize,
    /// Start of the word being read.
    pub word_first_character: Option<usize>,

    pub line_number: usize,
    pub page_number: usize,
    pub first_line_of_page: usize,
    pub first_character_of_line: usize,
    pub first_visible_character_of_line: Option<usize>,
    pub last_visible_character_of_line: Option<usize>,
    /// No break opportunity has been seen on the line yet.
    pub is_first_word_of_line: bool,
    pub is_start_of_paragraph: bool,

    pub x_advance: f32,
    /// Distance from the page's first baseline down to the current baseline.
    pub line_offset: f32,
    pub max_line_ascender: f32,
    pub max_line_descender: f32,
    /// Ascender the line offset was computed with.
    pub start_of_line_ascender: f32,
    /// Ascender of the first line of the page.
    pub page_ascender: f32,
    pub max_cap_height: f32,

    /// Last character that was not a combining mark.
    pub last_base_character: Option<usize>,

    pub styles: StyleStacks,
    pub tags: TagValues,
}

impl WordWrapState {
    pub fn new(styles: StyleStacks, tags: TagValues) -> Self {
        Self {
            processing_index: 0,
            character_count: 0,
            visible_character_count: 0,
            sprite_count: 0,
            space_count: 0,
            word_count: 0,
            link_count: 0,
            substitution_count: 0,
            word_first_character: None,
            line_number: 0,
            page_number: 0,
            first_line_of_page: 0,
            first_character_of_line: 0,
            first_visible_character_of_line: None,
            last_visible_character_of_line: None,
            is_first_word_of_line: true,
            is_start_of_paragraph: true,
            x_advance: 0.0,
            line_offset: 0.0,
            max_line_ascender: f32::NEG_INFINITY,
            max_line_descender: f32::INFINITY,
            start_of_line_ascender: 0.0,
            page_ascender: f32::NEG_INFINITY,
            max_cap_height: 0.0,
            last_base_character: None,
            styles,
            tags,
        }
    }

    /// The current line holds no character yet.
    pub fn is_line_empty(&self) -> bool {
        self.character_count == self.first_character_of_line
    }

    pub fn is_first_line_of_page(&self) -> bool {
        self.line_number == self.first_line_of_page
    }
}

/// The named restore points of a pass.
#[derive(Clone, Debug)]
pub(crate) struct LayoutCheckpoints {
    /// Last legal line break.
    pub word_wrap: Option<WordWrapState>,
    /// [`Self::word_wrap`] sits right after a soft hyphen.
    pub word_wrap_after_soft_hyphen: bool,
    /// Start of the current line.
    pub line: WordWrapState,
    /// Before the character being processed.
    pub last_valid: WordWrapState,
    /// Before the last soft hyphen.
    pub soft_line_break: Option<WordWrapState>,
    /// Most recent ellipsis candidate.
    pub ellipsis: Option<WordWrapState>,
    /// Every position an ellipsis could replace, most recent last.
    pub ellipsis_candidates: Vec<WordWrapState>,
}

impl LayoutCheckpoints {
    pub fn new(start: &WordWrapState) -> Self {
        Self {
            word_wrap: None,
            word_wrap_after_soft_hyphen: false,
            line: start.clone(),
            last_valid: start.clone(),
            soft_line_break: None,
            ellipsis: None,
            ellipsis_candidates: Vec::new(),
        }
    }

    pub fn push_ellipsis_candidate(&mut self, state: &WordWrapState) {
        self.ellipsis = Some(state.clone());
        self.ellipsis_candidates.push(state.clone());
    }

    pub fn pop_ellipsis_candidate(&mut self) -> Option<WordWrapState> {
        let candidate = self.ellipsis_candidates.pop();
        self.ellipsis = self.ellipsis_candidates.last().cloned();
        candidate
    }

    /// Drops restore points that lie after `state`.
    pub fn discard_after(&mut self, state: &WordWrapState) {
        let index = state.processing_index;
        self.ellipsis_candidates
            .retain(|c| c.processing_index < index);
        if self
            .ellipsis
            .as_ref()
            .is_some_and(|c| c.processing_index >= index)
        {
            self.ellipsis = self.ellipsis_candidates.last().cloned();
        }
        if self
            .word_wrap
            .as_ref()
            .is_some_and(|w| w.processing_index > index)
        {
            self.word_wrap = None;
            self.word_wrap_after_soft_hyphen = false;
        }
        if self
            .soft_line_break
            .as_ref()
            .is_some_and(|s| s.processing_index >= index)
        {
            self.soft_line_break = None;
        }
    }

    /// Resets the line scoped restore points at the start of a new line.
    pub fn start_line(&mut self, state: &WordWrapState) {
        self.line = state.clone();
        self.word_wrap = None;
        self.word_wrap_after_soft_hyphen = false;
        self.soft_line_break = None;
    }
}

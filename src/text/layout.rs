//! The layout engine.
//!
//! Layout runs in two passes over the processing elements of a text:
//!
//! 1. [`layout_text`] walks the elements once, applying tags, resolving glyphs
//!    and placing every character on a line. Wrapping and overflow rewind the
//!    cursor to a saved [`WordWrapState`] and continue from there; auto-size
//!    restarts the whole pass at a new point size.
//! 2. [`assemble_mesh`] aligns the lines inside the container and writes the
//!    glyph and decoration quads into one sub-mesh per material.
//!
//! Coordinates are in layout units with the Y axis pointing up. The first
//! baseline sits at `y = 0` until the second pass moves it into place.

mod auto_size;
mod decoration;
mod geometry;
mod glyph;
mod metrics;
mod overflow;
mod shaping;
mod state;
mod tags;
mod wrap;

use euclid::default::Point2D;

use crate::asset::FontAsset;
use crate::color::{self, Color32, ColorSpace};
use crate::font_storage::FontStorage;
use crate::glyph_id::{FontAssetId, SpriteAssetId};

use super::config::{OverflowMode, TextLayoutConfig};
use super::info::{CharacterInfo, CharacterSubstitution, TextInfo, WordInfo};
use super::line_breaking::LineBreakingRules;
use super::markup::{self, MarkupTag, TagName};
use super::mesh::{MaterialReferenceManager, TextVertex};
use super::processing::{
    CARRIAGE_RETURN, END_OF_TEXT, HORIZONTAL_ELLIPSIS, HYPHEN_MINUS, LINE_SEPARATOR, SOFT_HYPHEN,
    TAB, TextElementType, TextProcessingElement, VERTICAL_TAB, WORD_JOINER, ZERO_WIDTH_SPACE,
    is_combining_mark, is_letter_or_digit, is_line_break, is_whitespace,
};
use super::style::{FontStyles, StyleDefaults, StyleStacks};

pub(crate) use auto_size::AutoSizer;
pub(crate) use geometry::assemble_mesh;
pub(crate) use metrics::preferred_size;

use glyph::ResolvedGlyph;
use shaping::PairAdjustment;
use state::{LayoutCheckpoints, TagValues, WordWrapState};
use wrap::LineEnd;

const SMALL_CAPS_SCALE: f32 = 0.8;
const EXTRA_PADDING: f32 = 4.0;
const OVERFLOW_EPSILON: f32 = 0.0001;
const ZERO_WIDTH_NO_BREAK_SPACE: u32 = 0xFEFF;

/// Everything a layout reads.
pub(crate) struct LayoutInput<'a> {
    pub elements: &'a [TextProcessingElement],
    pub config: &'a TextLayoutConfig,
    pub storage: &'a FontStorage,
    pub rules: &'a LineBreakingRules,
}

/// Outcome of the first pass, consumed by [`assemble_mesh`].
#[derive(Clone, Debug, Default)]
pub(crate) struct LayoutResult {
    pub materials: MaterialReferenceManager,
    /// Final point size.
    pub font_size: f32,
    pub char_width_adjustment: f32,
    pub is_auto_size_point_size_set: bool,
    pub is_text_truncated: bool,
    pub first_overflow_character_index: Option<usize>,
    /// Byte offset of the first character that did not fit.
    pub overflow_string_index: Option<usize>,
    /// Tallest cap line seen, for cap line alignment.
    pub max_cap_height: f32,
}

/// Runs the first pass, restarting it until auto-size settles.
pub(crate) fn layout_text(input: &LayoutInput<'_>, info: &mut TextInfo) -> LayoutResult {
    info.clear();

    let Some(primary_font) = input.config.font_asset else {
        log::error!("no font asset assigned, nothing to lay out");
        return empty_result(input.config);
    };
    let Some(primary) = input.storage.font_asset(primary_font) else {
        log::error!("font asset {:?} is not registered in the font storage", primary_font);
        return empty_result(input.config);
    };
    if primary.material.is_none() {
        log::error!(
            "font asset '{}' has no material, register it through the font storage",
            primary.name
        );
        return empty_result(input.config);
    }

    let mut ctx = LayoutContext::new(input, info, primary_font, primary);
    loop {
        match ctx.run_pass() {
            PassOutcome::Complete => break,
            PassOutcome::Restart => {
                log::trace!(
                    "restarting layout at size {} (iteration {})",
                    ctx.sizer.font_size,
                    ctx.sizer.iterations
                );
            }
        }
    }
    ctx.into_result()
}

fn empty_result(config: &TextLayoutConfig) -> LayoutResult {
    LayoutResult {
        font_size: config.font_size,
        is_auto_size_point_size_set: true,
        ..Default::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PassOutcome {
    Complete,
    Restart,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Step {
    Continue,
    Stop,
    Restart,
}

/// A code point queued to replace the element at `element`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingSubstitution {
    element: usize,
    unicode: u32,
}

/// A sprite named by a `<sprite>` tag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct SpriteRequest {
    pub asset: SpriteAssetId,
    pub index: usize,
    pub tint: bool,
    pub color: Option<Color32>,
}

/// The element about to be placed.
#[derive(Clone, Copy, Debug)]
struct Pending {
    unicode: u32,
    element_index: usize,
    next_index: usize,
    string_index: usize,
    string_length: usize,
    sprite: Option<SpriteRequest>,
    substituted: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CharKind {
    Visible,
    Space,
    Tab,
    LineBreak,
    ZeroWidth,
}

fn classify(unicode: u32) -> CharKind {
    match unicode {
        TAB => CharKind::Tab,
        u if is_line_break(u) => CharKind::LineBreak,
        CARRIAGE_RETURN | ZERO_WIDTH_SPACE | WORD_JOINER | SOFT_HYPHEN | ZERO_WIDTH_NO_BREAK_SPACE
        | END_OF_TEXT => CharKind::ZeroWidth,
        u if is_whitespace(u) => CharKind::Space,
        _ => CharKind::Visible,
    }
}

fn to_uppercase(unicode: u32) -> u32 {
    char::from_u32(unicode)
        .and_then(|c| {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) => Some(u as u32),
                _ => None,
            }
        })
        .unwrap_or(unicode)
}

fn to_lowercase(unicode: u32) -> u32 {
    char::from_u32(unicode)
        .and_then(|c| {
            let mut lower = c.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(l), None) => Some(l as u32),
                _ => None,
            }
        })
        .unwrap_or(unicode)
}

pub(super) struct LayoutContext<'a> {
    elements: &'a [TextProcessingElement],
    config: &'a TextLayoutConfig,
    storage: &'a FontStorage,
    rules: &'a LineBreakingRules,
    info: &'a mut TextInfo,

    primary_font: FontAssetId,
    primary: &'a FontAsset,
    materials: MaterialReferenceManager,
    sizer: AutoSizer,

    cursor: WordWrapState,
    pass_start: WordWrapState,
    checkpoints: LayoutCheckpoints,
    substitution: Option<PendingSubstitution>,
    /// Element after which the line is committed (a soft hyphen turned into
    /// a visible hyphen).
    break_after: Option<usize>,

    overflowed: bool,
    is_text_truncated: bool,
    first_overflow_character_index: Option<usize>,
    overflow_string_index: Option<usize>,
}

impl<'a> LayoutContext<'a> {
    fn new(
        input: &LayoutInput<'a>,
        info: &'a mut TextInfo,
        primary_font: FontAssetId,
        primary: &'a FontAsset,
    ) -> Self {
        let sizer = AutoSizer::new(input.config);
        let start = WordWrapState::new(
            StyleStacks::new(&StyleDefaults {
                font_size: sizer.font_size,
                font_weight: input.config.font_weight,
                italic_angle: primary.italic_style,
                color: input.config.color,
                color_gradient: input.config.color_gradient,
                alignment: input.config.horizontal_align,
                material_reference: 0,
            }),
            TagValues::new(input.storage.default_sprite_asset()),
        );
        Self {
            elements: input.elements,
            config: input.config,
            storage: input.storage,
            rules: input.rules,
            info,
            primary_font,
            primary,
            materials: MaterialReferenceManager::new(),
            sizer,
            checkpoints: LayoutCheckpoints::new(&start),
            pass_start: start.clone(),
            cursor: start,
            substitution: None,
            break_after: None,
            overflowed: false,
            is_text_truncated: false,
            first_overflow_character_index: None,
            overflow_string_index: None,
        }
    }

    fn ortho_factor(&self) -> f32 {
        if self.config.is_orthographic { 1.0 } else { 0.1 }
    }

    /// Font units to layout units for `face` at `size`.
    pub(super) fn font_scale(&self, face: &crate::asset::FaceInfo, size: f32) -> f32 {
        if face.point_size <= 0.0 {
            return 0.0;
        }
        size / face.point_size * face.scale * self.ortho_factor()
    }

    /// Hundredths of an em to layout units at `size`.
    pub(super) fn em_scale(&self, size: f32) -> f32 {
        size * 0.01 * self.ortho_factor()
    }

    /// Scale of the primary font at the base size.
    fn base_scale(&self) -> f32 {
        self.font_scale(&self.primary.face_info, self.sizer.font_size)
    }

    fn begin_pass(&mut self) {
        self.info.clear();
        self.materials.clear();
        let material = self.font_material_reference(self.primary_font, false);

        let defaults = StyleDefaults {
            font_size: self.sizer.font_size,
            font_weight: self.config.font_weight,
            italic_angle: self.primary.italic_style,
            color: self.config.color,
            color_gradient: self.config.color_gradient,
            alignment: self.config.horizontal_align,
            material_reference: material,
        };
        let mut styles = StyleStacks::new(&defaults);
        for style in self.config.font_style.iter() {
            styles.style.add(style);
        }

        let mut start = WordWrapState::new(styles, TagValues::new(self.storage.default_sprite_asset()));
        start.x_advance = self.config.first_line_indent;
        let face = &self.primary.face_info;
        start.start_of_line_ascender = face.ascent_line * self.font_scale(face, self.sizer.font_size);

        self.checkpoints = LayoutCheckpoints::new(&start);
        self.pass_start = start.clone();
        self.cursor = start;
        self.substitution = None;
        self.break_after = None;
        self.overflowed = false;
        self.is_text_truncated = false;
        self.first_overflow_character_index = None;
        self.overflow_string_index = None;
    }

    fn run_pass(&mut self) -> PassOutcome {
        self.begin_pass();
        while self.cursor.processing_index < self.elements.len() {
            match self.step() {
                Step::Continue => {}
                Step::Stop => break,
                Step::Restart => return PassOutcome::Restart,
            }
        }
        self.finish_pass()
    }

    fn step(&mut self) -> Step {
        let index = self.cursor.processing_index;
        let element = self.elements[index];
        let mut pending = Pending {
            unicode: element.unicode,
            element_index: index,
            next_index: index + 1,
            string_index: element.string_index,
            string_length: element.length,
            sprite: None,
            substituted: false,
        };

        if let Some(substitution) = self.substitution.take_if(|s| s.element == index) {
            if substitution.unicode == END_OF_TEXT {
                return Step::Stop;
            }
            pending.unicode = substitution.unicode;
            pending.substituted = true;
        } else if self.config.rich_text
            && element.unicode == '<' as u32
            && let Some((tag, end)) = markup::parse_tag(self.elements, index)
            && (!self.cursor.tags.no_parse || tag == MarkupTag::Close(TagName::NoParse))
        {
            let last = self.elements[end];
            pending.next_index = end + 1;
            pending.string_length = last.string_index + last.length - element.string_index;

            match self.apply_tag(tag) {
                Some(tags::TagAction::Consumed) => {
                    self.cursor.processing_index = end + 1;
                    return Step::Continue;
                }
                Some(tags::TagAction::PageBreak) => {
                    self.cursor.processing_index = end + 1;
                    self.page_break();
                    return Step::Continue;
                }
                Some(tags::TagAction::Insert(unicode)) => pending.unicode = unicode,
                Some(tags::TagAction::Sprite(sprite)) => pending.sprite = Some(sprite),
                None => {
                    pending.next_index = index + 1;
                    pending.string_length = element.length;
                }
            }
        }

        self.place(pending)
    }

    /// Applies case transforms to `unicode`, returning the code point and the
    /// size to draw it at.
    fn transform_case(&self, unicode: u32, size: f32) -> (u32, f32) {
        let style = self.cursor.styles.style.active();
        if style.contains(FontStyles::LOWERCASE) {
            (to_lowercase(unicode), size)
        } else if style.contains(FontStyles::UPPERCASE) {
            (to_uppercase(unicode), size)
        } else if style.contains(FontStyles::SMALLCAPS) {
            let upper = to_uppercase(unicode);
            if upper != unicode {
                (upper, size * SMALL_CAPS_SCALE)
            } else {
                (unicode, size)
            }
        } else {
            (unicode, size)
        }
    }

    /// Next element's code point, unless it opens a tag.
    fn peek_unicode(&self, index: usize) -> Option<u32> {
        self.elements
            .get(index)
            .map(|element| element.unicode)
            .filter(|&u| !(self.config.rich_text && u == '<' as u32))
    }

    fn place(&mut self, pending: Pending) -> Step {
        let config = self.config;
        let style = self.cursor.styles.style.active();
        let mut size = self.cursor.styles.size.current();
        let mut unicode = pending.unicode;
        if pending.sprite.is_none() && !pending.substituted {
            (unicode, size) = self.transform_case(unicode, size);
        }

        let glyph = match pending.sprite {
            Some(request) => match self.sprite_glyph(request.asset, request.index) {
                Some(glyph) => glyph,
                None => {
                    let mut glyph = self.resolve_character(config.missing_glyph);
                    glyph.is_missing = true;
                    glyph
                }
            },
            None => self.resolve_character(unicode),
        };
        if glyph.element_type == TextElementType::Character {
            unicode = glyph.unicode;
        }
        let is_sprite = glyph.element_type == TextElementType::Sprite;
        let kind = if is_sprite { CharKind::Visible } else { classify(unicode) };

        let line_face = glyph.font.map(|f| &f.face_info).unwrap_or_else(|| self.current_face());
        let mut baseline_offset = self.cursor.styles.baseline_offset.current();
        let base_line_scale = self.font_scale(line_face, size);
        if style.contains(FontStyles::SUPERSCRIPT) {
            baseline_offset += line_face.superscript_offset * base_line_scale;
            size *= line_face.superscript_size;
        } else if style.contains(FontStyles::SUBSCRIPT) {
            baseline_offset += line_face.subscript_offset * base_line_scale;
            size *= line_face.subscript_size;
        }
        let line_scale = self.font_scale(line_face, size);
        let scale = self.font_scale(glyph.face, size) * glyph.glyph_scale;
        let em = self.em_scale(size);

        let mut ascender = line_face.ascent_line * line_scale + baseline_offset;
        let mut descender = line_face.descent_line * line_scale + baseline_offset;
        if is_sprite {
            let top = glyph.metrics.horizontal_bearing_y * scale + baseline_offset;
            ascender = ascender.max(top);
            descender = descender.min(top - glyph.metrics.height * scale);
        }

        // Restore points before the character.
        self.checkpoints.last_valid = self.cursor.clone();
        if unicode == SOFT_HYPHEN {
            self.checkpoints.soft_line_break = Some(self.cursor.clone());
        }
        if config.overflow_mode == OverflowMode::Ellipsis && kind == CharKind::Visible && !pending.substituted {
            self.checkpoints.push_ellipsis_candidate(&self.cursor);
        }

        // Kerning against both neighbours in the same font.
        let mut adjustment = PairAdjustment::default();
        if config.kerning
            && kind == CharKind::Visible
            && let (Some(font_id), Some(font)) = (glyph.font_asset, glyph.font)
        {
            let previous = self
                .info
                .characters
                .last()
                .filter(|c| c.font_asset == Some(font_id) && c.line_number == self.cursor.line_number)
                .map(|c| c.glyph_index);
            let next = self
                .peek_unicode(pending.next_index)
                .and_then(|u| font.character_glyph(u))
                .map(|g| g.index);
            adjustment = shaping::pair_adjustment(&font.feature_table, previous, glyph.glyph_index, next);
        }

        // A taller glyph on a later line pushes the line down.
        let line_shift = if !self.cursor.is_first_line_of_page()
            && self.cursor.tags.line_height.is_none()
            && ascender > self.cursor.start_of_line_ascender
        {
            ascender - self.cursor.start_of_line_ascender
        } else {
            0.0
        };
        let line_offset = self.cursor.line_offset + line_shift;

        let mut origin_x = self.cursor.x_advance;
        let mut baseline = -line_offset + baseline_offset;
        let mut is_anchored = false;
        if kind == CharKind::Visible
            && config.mark_positioning
            && is_combining_mark(unicode)
            && let Some(font) = glyph.font
            && let Some(anchor) = shaping::mark_anchor(
                &font.feature_table,
                &self.info.characters,
                self.cursor.first_character_of_line,
                self.cursor.last_base_character,
                glyph.glyph_index,
                scale,
            )
        {
            origin_x = anchor.x;
            baseline = anchor.y - line_shift;
            is_anchored = true;
        }

        let width_factor = 1.0 - self.sizer.char_width_adjustment;
        let is_character = !is_sprite;
        let bold = is_character && style.contains(FontStyles::BOLD) && !glyph.is_bold_variant;
        let italic = is_character && style.contains(FontStyles::ITALIC) && !glyph.is_italic_variant;
        let mut padding = glyph.padding;
        if config.extra_padding && is_character {
            padding += EXTRA_PADDING;
        }
        let style_padding = match glyph.font {
            Some(font) if bold => font.bold_style / 4.0 * (glyph.padding + 1.0),
            _ => 0.0,
        };
        let monospace = self.cursor.tags.monospace.filter(|_| !is_anchored);
        let mono_offset = match monospace {
            Some(mono) if kind == CharKind::Visible => {
                mono / 2.0
                    - (glyph.metrics.width / 2.0 + glyph.metrics.horizontal_bearing_x) * scale * width_factor
            }
            _ => 0.0,
        };

        let mut spacing = self.cursor.tags.character_spacing;
        if !adjustment.ignore_character_spacing {
            spacing += config.character_spacing * em;
        }
        if bold && let Some(font) = glyph.font {
            spacing += font.bold_spacing * em;
        }
        if kind == CharKind::Space || unicode == ZERO_WIDTH_SPACE {
            spacing += config.word_spacing * em;
        }
        spacing *= width_factor;

        let (glyph_advance, next_x) = match kind {
            CharKind::LineBreak | CharKind::ZeroWidth => (0.0, origin_x),
            CharKind::Tab => {
                let tab_multiple = glyph.font.map(|f| f.tab_multiple).unwrap_or(self.primary.tab_multiple);
                let tab = line_face.tab_width * tab_multiple * line_scale;
                if tab > 0.0 {
                    let stop = (origin_x / tab).ceil() * tab;
                    let stop = if stop > origin_x + OVERFLOW_EPSILON { stop } else { origin_x + tab };
                    (stop - origin_x, stop)
                } else {
                    (0.0, origin_x)
                }
            }
            _ if is_anchored => (0.0, self.cursor.x_advance),
            _ => match monospace {
                Some(mono) => {
                    let advance = mono * width_factor;
                    (advance, origin_x + advance + spacing)
                }
                None => {
                    let advance =
                        (glyph.metrics.horizontal_advance + adjustment.value.x_advance) * scale * width_factor;
                    (advance, origin_x + advance + spacing)
                }
            },
        };

        // Overflow checks.
        let checks_overflow =
            kind != CharKind::ZeroWidth && !(pending.substituted && unicode == HYPHEN_MINUS);
        if checks_overflow && config.max_height.is_some() {
            let page_top = if self.cursor.is_first_line_of_page() {
                self.cursor.max_line_ascender.max(ascender)
            } else {
                self.cursor.page_ascender
            };
            let bottom = -line_offset + self.cursor.max_line_descender.min(descender);
            let text_height = page_top - bottom;
            if text_height > config.area_height() + OVERFLOW_EPSILON
                && let Some(step) = self.vertical_overflow(text_height)
            {
                return step;
            }
        }

        let checks_width = checks_overflow
            && !is_anchored
            && match kind {
                CharKind::Visible => true,
                CharKind::Space | CharKind::Tab => config.wrap_style.preserves_whitespace(),
                CharKind::LineBreak | CharKind::ZeroWidth => false,
            };
        if checks_width {
            let limit = self.line_width_limit();
            let tolerance = if self.is_justified() { 1.05 } else { 1.0 };
            let text_width = origin_x + glyph_advance;
            if text_width > limit * tolerance + OVERFLOW_EPSILON
                && let Some(step) = self.horizontal_overflow(text_width, limit, unicode, pending.substituted)
            {
                return step;
            }
        }

        // The character is accepted.
        if line_shift > 0.0 {
            self.shift_line(line_shift);
            self.cursor.start_of_line_ascender = ascender;
        }

        let is_visible = kind == CharKind::Visible;
        let index = self.info.characters.len();
        let quad = is_visible.then(|| {
            let mut quad = geometry::glyph_quad(
                Point2D::new(
                    origin_x + mono_offset + adjustment.value.x_placement * scale,
                    baseline + adjustment.value.y_placement * scale,
                ),
                &glyph.metrics,
                scale,
                width_factor,
                padding,
                style_padding,
            );
            if italic {
                let shear = self.cursor.styles.italic_angle.current() * 0.01;
                let mid = (line_face.cap_line - line_face.baseline) / 2.0;
                geometry::shear_quad(&mut quad, &glyph.metrics, shear, mid, padding + style_padding, scale);
            }
            let rotation = self.cursor.tags.rotation;
            if rotation != 0.0 {
                geometry::rotate_quad(&mut quad, rotation);
            }
            quad
        });

        let color = self.element_color(&pending);
        let mut vertices = [TextVertex::default(); 4];
        if let Some(quad) = quad {
            let uv = geometry::atlas_uv(glyph.rect, glyph.atlas_size, padding + style_padding);
            let x_scale = scale * width_factor * if bold { -1.0 } else { 1.0 };
            let colors = self.vertex_colors(color);
            for k in 0..4 {
                vertices[k] = TextVertex {
                    position: [quad[k].x, quad[k].y, 0.0],
                    uv0: [uv[k][0], uv[k][1], 0.0, x_scale],
                    uv2: [0.0, 0.0],
                    color: [colors[k].red, colors[k].green, colors[k].blue, colors[k].alpha],
                };
            }
        }

        let character = CharacterInfo {
            element_type: glyph.element_type,
            unicode,
            index: pending.element_index,
            string_index: pending.string_index,
            string_length: pending.string_length,
            font_asset: glyph.font_asset,
            sprite_asset: glyph.sprite_asset,
            sprite_index: glyph.sprite_index,
            glyph_index: glyph.glyph_index,
            material_reference_index: glyph.material_reference,
            point_size: size,
            scale,
            aspect_ratio: if glyph.metrics.height > 0.0 {
                glyph.metrics.width / glyph.metrics.height
            } else {
                0.0
            },
            bottom_left: Point2D::new(origin_x, -line_offset + descender),
            top_left: Point2D::new(origin_x, -line_offset + ascender),
            top_right: Point2D::new(origin_x + glyph_advance, -line_offset + ascender),
            bottom_right: Point2D::new(origin_x + glyph_advance, -line_offset + descender),
            vertices,
            origin: origin_x,
            advance: glyph_advance,
            x_advance: next_x,
            ascender: -line_offset + ascender,
            baseline,
            descender: -line_offset + descender,
            color,
            underline_color: self.cursor.styles.underline_color.current(),
            strikethrough_color: self.cursor.styles.strikethrough_color.current(),
            highlight: self.cursor.styles.highlight.current(),
            style,
            is_visible,
            line_number: self.cursor.line_number,
            page_number: self.cursor.page_number,
            vertex_index: None,
        };
        self.info.characters.push(character);
        self.commit_character(index, unicode, kind, is_sprite, &pending, &glyph, ascender, descender);
        if glyph.is_missing || pending.substituted {
            self.info.substitutions.push(CharacterSubstitution { index, unicode });
            self.cursor.substitution_count += 1;
        }
        let cap_height = line_face.cap_line * line_scale + baseline_offset;
        self.cursor.max_cap_height = self.cursor.max_cap_height.max(cap_height);
        self.cursor.x_advance = next_x;
        self.cursor.processing_index = pending.next_index;

        if kind == CharKind::LineBreak {
            let end = if unicode == VERTICAL_TAB || unicode == LINE_SEPARATOR {
                LineEnd::Break
            } else {
                LineEnd::Paragraph
            };
            self.commit_line(end);
        } else if self.break_after == Some(pending.element_index) {
            self.break_after = None;
            self.commit_line(LineEnd::Wrap);
        } else {
            self.save_break_opportunity(unicode);
        }

        if pending.substituted && unicode == HORIZONTAL_ELLIPSIS {
            self.is_text_truncated = true;
            self.first_overflow_character_index.get_or_insert(index);
            return Step::Stop;
        }
        Step::Continue
    }

    /// Updates the cursor counters for the character just pushed at `index`.
    #[allow(clippy::too_many_arguments)]
    fn commit_character(
        &mut self,
        index: usize,
        unicode: u32,
        kind: CharKind,
        is_sprite: bool,
        pending: &Pending,
        glyph: &ResolvedGlyph<'a>,
        ascender: f32,
        descender: f32,
    ) {
        let cursor = &mut self.cursor;
        cursor.character_count += 1;
        cursor.max_line_ascender = cursor.max_line_ascender.max(ascender);
        cursor.max_line_descender = cursor.max_line_descender.min(descender);

        match kind {
            CharKind::Visible => {
                cursor.visible_character_count += 1;
                cursor.first_visible_character_of_line.get_or_insert(index);
                cursor.last_visible_character_of_line = Some(index);
                if is_sprite {
                    cursor.sprite_count += 1;
                }
            }
            CharKind::Space | CharKind::Tab => cursor.space_count += 1,
            CharKind::LineBreak | CharKind::ZeroWidth => {}
        }
        if !is_combining_mark(unicode) {
            cursor.last_base_character = Some(index);
        }

        let continues_word = cursor.word_first_character.is_some() && matches!(unicode, 0x27 | 0x2019);
        let is_word_character = (is_letter_or_digit(unicode) && !glyph.is_missing)
            || continues_word
            || is_sprite
            || (is_combining_mark(unicode) && cursor.word_first_character.is_some());
        if is_word_character {
            cursor.word_first_character.get_or_insert(index);
        } else if let Some(first) = cursor.word_first_character.take() {
            self.push_word(first, index - 1);
        }

        if pending.substituted && unicode == HORIZONTAL_ELLIPSIS {
            self.overflow_string_index.get_or_insert(pending.string_index);
        }
    }

    fn push_word(&mut self, first: usize, last: usize) {
        self.info.words.push(WordInfo {
            first_character_index: first,
            last_character_index: last,
            character_count: last + 1 - first,
        });
        self.cursor.word_count += 1;
    }

    /// Base color of the element, before gradients.
    fn element_color(&self, pending: &Pending) -> Color32 {
        let color = if self.config.override_tag_colors {
            self.config.color
        } else {
            self.cursor.styles.color.current()
        };
        match pending.sprite {
            Some(sprite) => match sprite.color {
                Some(tint) => tint,
                None if sprite.tint => color,
                None => color::with_alpha(color::WHITE, color.alpha),
            },
            None => color,
        }
    }

    /// Corner colors in quad order, gradients applied.
    fn vertex_colors(&self, color: Color32) -> [Color32; 4] {
        let colors = match self.cursor.styles.color_gradient.current() {
            Some(gradient) => gradient.corners().map(|corner| color::multiply(corner, color)),
            None => [color; 4],
        };
        match self.config.color_space {
            ColorSpace::Gamma => colors,
            ColorSpace::Linear => colors.map(color::to_linear),
        }
    }

    /// Puts the cursor back at `state`, dropping everything laid out since.
    pub(super) fn restore(&mut self, state: &WordWrapState) {
        self.cursor = state.clone();
        self.info.characters.truncate(state.character_count);
        self.info.words.truncate(state.word_count);
        self.info.links.truncate(state.link_count);
        self.info.lines.truncate(state.line_number);
        self.info.substitutions.truncate(state.substitution_count);
        self.checkpoints.discard_after(state);
        self.substitution = None;
        self.break_after = None;
    }

    fn finish_pass(&mut self) -> PassOutcome {
        let count = self.cursor.character_count;
        if let Some(first) = self.cursor.word_first_character.take()
            && first < count
        {
            self.push_word(first, count - 1);
        }
        if let Some(link) = self.cursor.styles.action.current() {
            self.close_link(link);
        }
        if !self.cursor.is_line_empty() {
            self.commit_line(LineEnd::EndOfText);
        }

        if !self.overflowed && self.sizer.grow() {
            return PassOutcome::Restart;
        }
        self.sizer.settle();

        self.info.space_count = self.cursor.space_count;
        self.info.sprite_count = self.cursor.sprite_count;
        self.info.visible_character_count = self.cursor.visible_character_count;
        metrics::finalize(self.info);
        PassOutcome::Complete
    }

    fn into_result(self) -> LayoutResult {
        LayoutResult {
            materials: self.materials,
            font_size: self.sizer.font_size,
            char_width_adjustment: self.sizer.char_width_adjustment,
            is_auto_size_point_size_set: self.sizer.is_point_size_set,
            is_text_truncated: self.is_text_truncated,
            first_overflow_character_index: self.first_overflow_character_index,
            overflow_string_index: self.overflow_string_index,
            max_cap_height: self.cursor.max_cap_height,
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{
        GlyphAnchorPoint, GlyphPairAdjustmentRecord, MarkPositionAdjustment, MarkToBaseAdjustmentRecord,
    };
    use crate::testing;
    use crate::text::config::{HorizontalAlign, WrapStyle};
    use crate::text::processing::{PARAGRAPH_SEPARATOR, build_processing_array};

    fn run(storage: &FontStorage, text: &str, config: &TextLayoutConfig) -> (TextInfo, LayoutResult) {
        run_with_rules(storage, text, config, &LineBreakingRules::default())
    }

    fn run_with_rules(
        storage: &FontStorage,
        text: &str,
        config: &TextLayoutConfig,
        rules: &LineBreakingRules,
    ) -> (TextInfo, LayoutResult) {
        let elements = build_processing_array(text, config.parse_ctrl_characters);
        let input = LayoutInput {
            elements: &elements,
            config,
            storage,
            rules,
        };
        let mut info = TextInfo::default();
        let result = layout_text(&input, &mut info);
        (info, result)
    }

    /// The test font plus `characters`, each drawn with the glyph box of 'a'.
    fn font_with(characters: &[char]) -> FontAsset {
        let mut asset = testing::font_asset("Extended");
        let mut glyph = *asset.character_glyph('a' as u32).unwrap();
        for (i, &c) in characters.iter().enumerate() {
            glyph.index = 1000 + i as u32;
            asset.add_glyph(c as u32, glyph);
        }
        asset
    }

    #[test]
    fn classifies_control_characters() {
        assert_eq!(classify(' ' as u32), CharKind::Space);
        assert_eq!(classify(TAB), CharKind::Tab);
        assert_eq!(classify(PARAGRAPH_SEPARATOR), CharKind::LineBreak);
        assert_eq!(classify(CARRIAGE_RETURN), CharKind::ZeroWidth);
        assert_eq!(classify('a' as u32), CharKind::Visible);
    }

    #[test]
    fn case_helpers_keep_unmappable_characters() {
        assert_eq!(to_uppercase('a' as u32), 'A' as u32);
        assert_eq!(to_lowercase('Q' as u32), 'q' as u32);
        // 'ß' uppercases to two characters.
        assert_eq!(to_uppercase('ß' as u32), 'ß' as u32);
    }

    #[test]
    fn missing_font_produces_nothing() {
        let (storage, _) = testing::storage();
        let config = TextLayoutConfig::default();
        let (info, result) = run(&storage, "Hello", &config);
        assert_eq!(info.character_count(), 0);
        assert!(result.is_auto_size_point_size_set);
    }

    #[test]
    fn advances_grow_monotonically() {
        let (storage, font) = testing::storage();
        let config = testing::config(font);
        let (info, _) = run(&storage, "Hello", &config);

        assert_eq!(info.character_count(), 5);
        assert_eq!(info.line_count(), 1);
        for pair in info.characters.windows(2) {
            assert!(pair[1].origin > pair[0].origin);
            assert_eq!(pair[1].origin, pair[0].x_advance);
        }
    }

    #[test]
    fn tags_do_not_become_characters() {
        let (storage, font) = testing::storage();
        let config = testing::config(font);
        let (info, _) = run(&storage, "<b>Hi</b> there", &config);

        assert_eq!(info.text(), "Hi there");
        assert!(info.characters[0].style.contains(FontStyles::BOLD));
        assert!(info.characters[1].style.contains(FontStyles::BOLD));
        assert!(!info.characters[2].style.contains(FontStyles::BOLD));
        assert_eq!(info.characters[0].string_index, 3);
    }

    #[test]
    fn unknown_tags_stay_literal() {
        let (storage, font) = testing::storage();
        let config = testing::config(font);
        let (info, _) = run(&storage, "<nope>x", &config);
        assert_eq!(info.text(), "<nope>x");
    }

    #[test]
    fn rich_text_off_keeps_tags() {
        let (storage, font) = testing::storage();
        let config = TextLayoutConfig {
            rich_text: false,
            ..testing::config(font)
        };
        let (info, _) = run(&storage, "<b>x</b>", &config);
        assert_eq!(info.character_count(), 8);
    }

    #[test]
    fn noparse_keeps_inner_tags() {
        let (storage, font) = testing::storage();
        let config = testing::config(font);
        let (info, _) = run(&storage, "<noparse><b></noparse>x", &config);
        assert_eq!(info.text(), "<b>x");
        assert!(!info.characters[3].style.contains(FontStyles::BOLD));
    }

    #[test]
    fn line_feed_starts_a_new_line_below() {
        let (storage, font) = testing::storage();
        let config = testing::config(font);
        let (info, _) = run(&storage, "ab\ncd", &config);

        assert_eq!(info.line_count(), 2);
        assert_eq!(info.lines[0].character_range(), 0..=2);
        assert_eq!(info.lines[1].first_character_index, 3);
        assert!(info.lines[1].baseline < info.lines[0].baseline);
        assert_eq!(info.characters[3].origin, 0.0);
        assert!(info.lines[0].ends_paragraph);
    }

    #[test]
    fn wrapping_breaks_at_spaces() {
        let (storage, font) = testing::storage();
        let config = TextLayoutConfig {
            max_width: Some(testing::advance(font, &storage, 36.0) * 7.0),
            wrap_style: WrapStyle::WordWrap,
            ..testing::config(font)
        };
        let (info, _) = run(&storage, "aaa bbb ccc", &config);

        assert_eq!(info.line_count(), 2);
        assert_eq!(info.characters[info.lines[1].first_character_index].unicode, 'c' as u32);
        for line in &info.lines {
            assert!(line.max_advance <= config.area_width() + 0.001);
        }
    }

    #[test]
    fn long_words_break_between_characters() {
        let (storage, font) = testing::storage();
        let config = TextLayoutConfig {
            max_width: Some(testing::advance(font, &storage, 36.0) * 4.0),
            ..testing::config(font)
        };
        let (info, _) = run(&storage, "abcdefghij", &config);

        assert_eq!(info.line_count(), 3);
        assert_eq!(info.lines[0].character_count, 4);
        assert_eq!(info.character_count(), 10);
    }

    #[test]
    fn soft_hyphen_becomes_visible_at_a_break() {
        let (storage, font) = testing::storage();
        let config = TextLayoutConfig {
            max_width: Some(testing::advance(font, &storage, 36.0) * 5.0),
            ..testing::config(font)
        };
        let (info, _) = run(&storage, "abc\u{AD}defg", &config);

        assert_eq!(info.line_count(), 2);
        let first = &info.lines[0];
        assert_eq!(info.characters[first.last_character_index].unicode, HYPHEN_MINUS);
        assert_eq!(info.substitutions.len(), 1);
        assert_eq!(info.substitutions[0].unicode, HYPHEN_MINUS);
    }

    #[test]
    fn missing_characters_are_substituted() {
        let (storage, font) = testing::storage();
        let config = testing::config(font);
        let (info, _) = run(&storage, "a\u{4E00}", &config);

        assert_eq!(info.character_count(), 2);
        assert_eq!(info.characters[1].unicode, crate::text::processing::WHITE_SQUARE);
        assert_eq!(info.substitutions[0].index, 1);
    }

    #[test]
    fn justified_alignment_is_recorded_per_line() {
        let (storage, font) = testing::storage();
        let config = testing::config(font);
        let (info, _) = run(&storage, "a<align=right>b", &config);
        assert_eq!(info.lines[0].alignment, HorizontalAlign::Right);
    }

    #[test]
    fn relayout_is_idempotent() {
        let (storage, font) = testing::storage();
        let config = TextLayoutConfig {
            max_width: Some(200.0),
            ..testing::config(font)
        };
        let (first, _) = run(&storage, "The quick <i>brown</i> fox jumps", &config);
        let (second, _) = run(&storage, "The quick <i>brown</i> fox jumps", &config);
        assert_eq!(first, second);
    }

    #[test]
    fn snapshot_restores_cursor_exactly() {
        let (storage, font) = testing::storage();
        let config = testing::config(font);
        let elements = build_processing_array("ab cd", true);
        let rules = LineBreakingRules::default();
        let input = LayoutInput {
            elements: &elements,
            config: &config,
            storage: &storage,
            rules: &rules,
        };
        let mut info = TextInfo::default();
        let primary = storage.font_asset(font).unwrap();
        let mut ctx = LayoutContext::new(&input, &mut info, font, primary);
        ctx.begin_pass();

        ctx.step();
        ctx.step();
        let snapshot = ctx.cursor.clone();
        ctx.step();
        ctx.step();
        assert_eq!(ctx.info.characters.len(), 4);

        ctx.restore(&snapshot);
        assert_eq!(ctx.cursor, snapshot);
        assert_eq!(ctx.info.characters.len(), 2);
        assert_eq!(ctx.cursor.processing_index, 2);
        assert_eq!(ctx.cursor.x_advance, ctx.info.characters[1].x_advance);
    }

    #[test]
    fn perspective_mode_draws_at_a_tenth_of_the_size() {
        let (storage, font) = testing::storage();
        let config = TextLayoutConfig {
            is_orthographic: false,
            ..testing::config(font)
        };
        let (info, _) = run(&storage, "a", &config);
        let a = &info.characters[0];
        assert!((a.advance - 3.6).abs() < 1e-4);
        assert!((a.scale - 0.36).abs() < 1e-4);
    }

    #[test]
    fn kerning_pairs_pull_the_next_character_in() {
        let mut asset = testing::font_asset("Kerned");
        let a = asset.character_glyph('A' as u32).unwrap().index;
        let v = asset.character_glyph('V' as u32).unwrap().index;
        asset
            .feature_table
            .add_pair_adjustment(GlyphPairAdjustmentRecord::kerning(a, v, -5.0));
        let mut storage = FontStorage::new();
        let font = storage.add_font_asset(asset);

        let (info, _) = run(&storage, "AVA", &testing::config(font));
        let origins: Vec<f32> = info.characters.iter().map(|c| c.origin).collect();
        assert!((origins[1] - origins[0] - 18.0).abs() < 1e-3);
        assert!((origins[2] - origins[1] - 36.0).abs() < 1e-3);

        let plain = TextLayoutConfig {
            kerning: false,
            ..testing::config(font)
        };
        let (info, _) = run(&storage, "AV", &plain);
        assert!((info.characters[1].origin - 36.0).abs() < 1e-3);
    }

    #[test]
    fn combining_marks_sit_on_the_base_anchor() {
        let mut asset = font_with(&['\u{301}']);
        let base = asset.character_glyph('a' as u32).unwrap().index;
        let mark = asset.character_glyph(0x0301).unwrap().index;
        asset.feature_table.add_mark_to_base(MarkToBaseAdjustmentRecord {
            base_glyph: base,
            base_anchor: GlyphAnchorPoint { x: 5.0, y: 10.0 },
            mark_glyph: mark,
            mark_adjustment: MarkPositionAdjustment::default(),
        });
        let mut storage = FontStorage::new();
        let font = storage.add_font_asset(asset);

        let (info, _) = run(&storage, "a\u{301}b", &testing::config(font));
        let [a, accent, b] = &info.characters[..] else {
            panic!("expected three characters");
        };
        assert!((accent.origin - a.origin - 18.0).abs() < 1e-3);
        assert!((accent.baseline - a.baseline - 36.0).abs() < 1e-3);
        assert_eq!(accent.advance, 0.0);
        assert!((b.origin - a.origin - 36.0).abs() < 1e-3);
    }

    #[test]
    fn ideographs_wrap_between_each_other_but_not_before_closing_marks() {
        let mut storage = FontStorage::new();
        let font = storage.add_font_asset(font_with(&['一', '二', '三', '。']));
        let config = TextLayoutConfig {
            max_width: Some(36.0 * 3.0),
            ..testing::config(font)
        };

        // The full stop may not start a line, so the third ideograph moves down with it.
        let (info, _) = run(&storage, "一二三。", &config);
        assert_eq!(info.line_count(), 2);
        assert_eq!(info.lines[0].character_count, 2);
        assert_eq!(info.characters[2].line_number, 1);
        assert_eq!(info.characters[3].line_number, 1);

        let (info, _) = run_with_rules(&storage, "一二三。", &config, &LineBreakingRules::new("", ""));
        assert_eq!(info.line_count(), 2);
        assert_eq!(info.lines[0].character_count, 3);
        assert_eq!(info.characters[3].line_number, 1);
    }
}

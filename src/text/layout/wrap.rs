//! Line commits and break opportunities.

use crate::text::config::{HorizontalAlign, OverflowMode, WrapStyle};
use crate::text::info::{Extents, LineInfo};
use crate::text::line_breaking;
use crate::text::processing::{SOFT_HYPHEN, is_whitespace};

use super::LayoutContext;

/// Why a line ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum LineEnd {
    /// Automatic wrap.
    Wrap,
    /// Vertical tab or line separator: new line, same paragraph.
    Break,
    /// Line feed, paragraph separator or page break.
    Paragraph,
    EndOfText,
}

impl LineEnd {
    fn ends_paragraph(self) -> bool {
        matches!(self, LineEnd::Paragraph | LineEnd::EndOfText)
    }
}

impl LayoutContext<'_> {
    /// Width available to the current line.
    pub(super) fn line_width_limit(&self) -> f32 {
        let tags = &self.cursor.tags;
        let mut width = self.config.area_width() - tags.margin_left - tags.margin_right;
        if let Some(override_width) = tags.width {
            width = width.min(override_width);
        }
        width.max(0.0)
    }

    pub(super) fn is_justified(&self) -> bool {
        matches!(
            self.cursor.styles.line_justification.current(),
            HorizontalAlign::Justified | HorizontalAlign::Flush
        )
    }

    /// Saves a word wrap checkpoint after the character just placed when the
    /// line may break there.
    pub(super) fn save_break_opportunity(&mut self, unicode: u32) {
        if !self.config.wrap_style.wraps() {
            return;
        }
        let next = self.peek_unicode(self.cursor.processing_index);
        let allowed = !self.cursor.tags.no_break
            && (line_breaking::is_break_opportunity(unicode) || self.rules.allows_cjk_break(unicode, next));

        if allowed {
            self.cursor.is_first_word_of_line = false;
            self.checkpoints.word_wrap = Some(self.cursor.clone());
            self.checkpoints.word_wrap_after_soft_hyphen = unicode == SOFT_HYPHEN;
        } else if self.cursor.is_first_word_of_line || self.config.wrap_style == WrapStyle::CharWrap {
            self.checkpoints.word_wrap = Some(self.cursor.clone());
            self.checkpoints.word_wrap_after_soft_hyphen = false;
        }
    }

    /// Moves every character of the current line down by `shift`.
    pub(super) fn shift_line(&mut self, shift: f32) {
        let first = self.cursor.first_character_of_line;
        for character in &mut self.info.characters[first..] {
            character.baseline -= shift;
            character.ascender -= shift;
            character.descender -= shift;
            for point in [
                &mut character.bottom_left,
                &mut character.top_left,
                &mut character.top_right,
                &mut character.bottom_right,
            ] {
                point.y -= shift;
            }
            for vertex in &mut character.vertices {
                vertex.position[1] -= shift;
            }
        }
        self.cursor.line_offset += shift;
    }

    /// Records the current line and moves the cursor to the start of the next.
    pub(super) fn commit_line(&mut self, end: LineEnd) {
        let cursor = &self.cursor;
        if cursor.is_line_empty() {
            return;
        }
        let first = cursor.first_character_of_line;
        let last = cursor.character_count - 1;
        let characters = &self.info.characters[first..=last];

        let last_visible = cursor.last_visible_character_of_line;
        let max_advance = match last_visible {
            Some(index) => {
                let character = &self.info.characters[index];
                character.origin + character.advance
            }
            None => characters[0].origin,
        };
        // Spaces up to the last visible character; trailing ones do not count.
        let space_count = match last_visible {
            Some(index) => self.info.characters[first..=index]
                .iter()
                .filter(|c| is_whitespace(c.unicode) && !line_breaking_only(c.unicode))
                .count(),
            None => 0,
        };
        let mut extents = Extents::empty();
        for character in characters.iter().filter(|c| c.is_visible) {
            for vertex in &character.vertices {
                extents.include(euclid::default::Point2D::new(vertex.position[0], vertex.position[1]));
            }
        }
        let visible_character_count = characters.iter().filter(|c| c.is_visible).count();

        let baseline = -cursor.line_offset;
        let ascender = baseline + cursor.max_line_ascender;
        let descender = baseline + cursor.max_line_descender;

        let face = self.current_face();
        let size = cursor.styles.size.current();
        let scale = self.font_scale(face, size);
        let em = self.em_scale(size);
        let line_gap = face.line_height - (face.ascent_line - face.descent_line);
        let width = self.line_width_limit();

        let line = LineInfo {
            first_character_index: first,
            last_character_index: last,
            first_visible_character_index: cursor.first_visible_character_of_line,
            last_visible_character_index: last_visible,
            character_count: last + 1 - first,
            visible_character_count,
            space_count,
            word_count: 0,
            ascender,
            baseline,
            descender,
            line_height: ascender - descender + line_gap * scale,
            width,
            max_advance,
            margin_left: cursor.tags.margin_left,
            margin_right: cursor.tags.margin_right,
            alignment: cursor.styles.line_justification.current(),
            ends_paragraph: end.ends_paragraph(),
            extents,
        };
        self.info.lines.push(line);

        if self.cursor.is_first_line_of_page() {
            self.cursor.page_ascender = self.cursor.max_line_ascender;
        }

        let paragraph = end.ends_paragraph();
        let next_ascender = face.ascent_line * scale + self.cursor.styles.baseline_offset.current();
        let spacing = (self.config.line_spacing + if paragraph { self.config.paragraph_spacing } else { 0.0 }) * em;
        let delta = match self.cursor.tags.line_height {
            Some(line_height) => line_height + spacing,
            None => {
                -self.cursor.max_line_descender
                    + next_ascender
                    + (line_gap + self.sizer.line_spacing_adjustment) * scale
                    + spacing
            }
        };

        let cursor = &mut self.cursor;
        cursor.line_offset += delta;
        cursor.line_number += 1;
        cursor.first_character_of_line = cursor.character_count;
        cursor.first_visible_character_of_line = None;
        cursor.last_visible_character_of_line = None;
        cursor.is_first_word_of_line = true;
        cursor.is_start_of_paragraph = paragraph;
        cursor.max_line_ascender = f32::NEG_INFINITY;
        cursor.max_line_descender = f32::INFINITY;
        cursor.start_of_line_ascender = next_ascender;
        cursor.x_advance = cursor.styles.indent.current();
        if paragraph {
            cursor.x_advance += cursor.tags.line_indent + self.config.first_line_indent;
        }
        self.checkpoints.start_line(&self.cursor);
    }

    /// `<page>`: a new page in page mode, a new paragraph otherwise.
    pub(super) fn page_break(&mut self) {
        if !self.cursor.is_line_empty() {
            self.commit_line(LineEnd::Paragraph);
        }
        if self.config.overflow_mode == OverflowMode::Page {
            self.start_new_page();
        }
    }

    /// Starts a page at the cursor's line.
    pub(super) fn start_new_page(&mut self) {
        let cursor = &mut self.cursor;
        cursor.page_number += 1;
        cursor.first_line_of_page = cursor.line_number;
        cursor.line_offset = 0.0;
        cursor.page_ascender = f32::NEG_INFINITY;
        cursor.max_line_ascender = f32::NEG_INFINITY;
        cursor.max_line_descender = f32::INFINITY;
        self.checkpoints.start_line(&self.cursor);
    }
}

fn line_breaking_only(unicode: u32) -> bool {
    crate::text::processing::is_line_break(unicode) || unicode == crate::text::processing::CARRIAGE_RETURN
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use crate::testing;
    use crate::text::TextComponent;
    use crate::text::config::{OverflowMode, TextLayoutConfig, WrapStyle};
    use crate::text::line_breaking::LineBreakingRules;

    fn layout(text: &str, config: TextLayoutConfig) -> TextComponent {
        let (storage, _) = testing::storage();
        let mut component = TextComponent::new(text, config);
        component.generate(&storage, &LineBreakingRules::default());
        component
    }

    #[test]
    fn no_wrap_keeps_a_single_line() {
        let (_, font) = testing::storage();
        let config = TextLayoutConfig {
            max_width: Some(50.0),
            wrap_style: WrapStyle::NoWrap,
            ..testing::config(font)
        };
        let text = layout("aaa bbb ccc", config);
        assert_eq!(text.info().line_count(), 1);
    }

    #[test]
    fn char_wrap_fills_lines() {
        let (_, font) = testing::storage();
        let config = TextLayoutConfig {
            max_width: Some(36.0 * 5.0),
            wrap_style: WrapStyle::CharWrap,
            ..testing::config(font)
        };
        let text = layout("aaa bbb ccc", config);
        assert_eq!(text.info().lines[0].character_count, 5);
    }

    #[test]
    fn nobr_keeps_words_together() {
        let (_, font) = testing::storage();
        let config = TextLayoutConfig {
            max_width: Some(36.0 * 6.0),
            ..testing::config(font)
        };
        let text = layout("aa <nobr>bb cc</nobr>", config);
        let info = text.info();
        assert_eq!(info.line_count(), 2);
        assert_eq!(info.characters[info.lines[1].first_character_index].unicode, 'b' as u32);
    }

    #[test]
    fn line_spacing_moves_baselines() {
        let (_, font) = testing::storage();
        let plain = layout("a\nb", testing::config(font));
        let spaced = layout(
            "a\nb",
            TextLayoutConfig {
                line_spacing: 50.0,
                ..testing::config(font)
            },
        );
        let gap = |t: &TextComponent| t.info().lines[0].baseline - t.info().lines[1].baseline;
        // Half an em at 36 points.
        assert!((gap(&spaced) - gap(&plain) - 18.0).abs() < 1e-3);
    }

    #[test]
    fn taller_glyphs_push_later_lines_down() {
        let (_, font) = testing::storage();
        let plain = layout("a\nb", testing::config(font));
        let tall = layout("a\nb<size=72>c", testing::config(font));
        assert!(tall.info().lines[1].baseline < plain.info().lines[1].baseline);
        let chars = &tall.info().characters;
        assert_eq!(chars[2].baseline, chars[3].baseline);
    }

    #[test]
    fn page_tag_starts_a_page() {
        let (_, font) = testing::storage();
        let config = TextLayoutConfig {
            overflow_mode: OverflowMode::Page,
            ..testing::config(font)
        };
        let text = layout("ab<page>cd", config);
        let info = text.info();
        assert_eq!(info.page_count(), 2);
        assert_eq!(info.characters[2].page_number, 1);
        assert_eq!(info.lines[1].first_character_index, 2);
    }
}

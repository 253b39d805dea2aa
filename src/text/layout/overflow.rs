//! What happens when a character does not fit its container.

use crate::text::config::OverflowMode;
use crate::text::processing::{END_OF_TEXT, HORIZONTAL_ELLIPSIS, HYPHEN_MINUS};

use super::wrap::LineEnd;
use super::{LayoutContext, PendingSubstitution, Step};

impl LayoutContext<'_> {
    /// The text would be `text_height` tall with the current character.
    /// Returns `None` when the character is placed anyway.
    pub(super) fn vertical_overflow(&mut self, text_height: f32) -> Option<Step> {
        let line_count = self.cursor.line_number - self.cursor.first_line_of_page;
        let base_scale = self.base_scale();
        if self
            .sizer
            .fit_height(text_height, self.config.area_height(), line_count, base_scale)
        {
            return Some(Step::Restart);
        }

        self.overflowed = true;
        match self.config.overflow_mode {
            OverflowMode::Overflow | OverflowMode::Masking | OverflowMode::ScrollRect => None,
            OverflowMode::Truncate | OverflowMode::Linked => Some(self.stop_at_last_valid()),
            OverflowMode::Ellipsis => Some(self.insert_ellipsis()),
            OverflowMode::Page => {
                if self.cursor.is_first_line_of_page() {
                    return None;
                }
                let line = self.checkpoints.line.clone();
                self.restore(&line);
                self.start_new_page();
                Some(Step::Continue)
            }
        }
    }

    /// The line would be `text_width` wide against `limit`.
    pub(super) fn horizontal_overflow(
        &mut self,
        text_width: f32,
        limit: f32,
        unicode: u32,
        substituted: bool,
    ) -> Option<Step> {
        if substituted && unicode == HORIZONTAL_ELLIPSIS {
            return Some(self.insert_ellipsis());
        }

        if self.config.wrap_style.wraps() {
            if self.cursor.is_line_empty() {
                self.overflowed = true;
                return None;
            }

            if self.cursor.is_first_word_of_line {
                if self.sizer.fit_width() {
                    return Some(Step::Restart);
                }
                self.overflowed = true;
            }

            if let Some(state) = self.checkpoints.word_wrap.clone()
                && !state.is_line_empty()
            {
                // A word longer than a mostly empty line breaks where it is.
                let fill = state.x_advance;
                let word_width = text_width - fill;
                let breaks_mid_word = !state.is_first_word_of_line
                    && fill < limit * self.config.word_wrapping_ratio
                    && word_width > limit;
                if breaks_mid_word {
                    self.commit_line(LineEnd::Wrap);
                    return Some(Step::Continue);
                }

                if self.checkpoints.word_wrap_after_soft_hyphen
                    && let Some(before) = self.checkpoints.soft_line_break.clone()
                {
                    self.restore(&before);
                    self.substitution = Some(PendingSubstitution {
                        element: before.processing_index,
                        unicode: HYPHEN_MINUS,
                    });
                    self.break_after = Some(before.processing_index);
                    return Some(Step::Continue);
                }

                self.restore(&state);
                self.commit_line(LineEnd::Wrap);
                return Some(Step::Continue);
            }

            self.commit_line(LineEnd::Wrap);
            return Some(Step::Continue);
        }

        if self.sizer.fit_width() {
            return Some(Step::Restart);
        }
        self.overflowed = true;
        match self.config.overflow_mode {
            OverflowMode::Ellipsis => Some(self.insert_ellipsis()),
            OverflowMode::Truncate | OverflowMode::Linked => Some(self.stop_at_last_valid()),
            _ => None,
        }
    }

    /// Rewinds to before the character that did not fit and ends the pass.
    /// Linked text hands everything from that character on to its target.
    fn stop_at_last_valid(&mut self) -> Step {
        let state = self.checkpoints.last_valid.clone();
        self.restore(&state);
        if self.config.overflow_mode == OverflowMode::Linked {
            self.overflow_string_index = self
                .elements
                .get(self.cursor.processing_index)
                .map(|element| element.string_index);
        }
        self.mark_truncated();
        Step::Stop
    }

    fn mark_truncated(&mut self) {
        self.is_text_truncated = true;
        if self.first_overflow_character_index.is_none() {
            self.first_overflow_character_index = Some(self.cursor.character_count);
        }
    }

    /// Replaces the most recent ellipsis candidate with an ellipsis, or empties
    /// the text when there is none left.
    pub(super) fn insert_ellipsis(&mut self) -> Step {
        self.is_text_truncated = true;
        match self.checkpoints.pop_ellipsis_candidate() {
            Some(candidate) => {
                self.restore(&candidate);
                self.substitution = Some(PendingSubstitution {
                    element: candidate.processing_index,
                    unicode: HORIZONTAL_ELLIPSIS,
                });
            }
            None => {
                let start = self.pass_start.clone();
                self.restore(&start);
                self.first_overflow_character_index = Some(0);
                self.substitution = Some(PendingSubstitution {
                    element: start.processing_index,
                    unicode: END_OF_TEXT,
                });
            }
        }
        Step::Continue
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use crate::testing;
    use crate::text::TextComponent;
    use crate::text::config::{OverflowMode, TextLayoutConfig, WrapStyle};
    use crate::text::line_breaking::LineBreakingRules;
    use crate::text::processing::HORIZONTAL_ELLIPSIS;

    fn layout(text: &str, config: TextLayoutConfig) -> TextComponent {
        let (storage, _) = testing::storage();
        let mut component = TextComponent::new(text, config);
        component.generate(&storage, &LineBreakingRules::default());
        component
    }

    /// Room for `columns` characters on `rows` lines of the test font at 36.
    fn boxed(overflow_mode: OverflowMode, columns: f32, rows: f32) -> TextLayoutConfig {
        let (_, font) = testing::storage();
        TextLayoutConfig {
            max_width: Some(36.0 * columns),
            max_height: Some(testing::LINE_HEIGHT * 36.0 * rows + 1.0),
            overflow_mode,
            ..testing::config(font)
        }
    }

    #[test]
    fn truncate_drops_overflowing_lines() {
        let text = layout("aaa bbb ccc ddd", boxed(OverflowMode::Truncate, 4.0, 2.0));
        let info = text.info();
        assert!(text.is_text_truncated());
        assert_eq!(info.line_count(), 2);
        assert!(info.character_count() < 15);
        assert_eq!(text.first_overflow_character_index(), Some(info.character_count()));
    }

    #[test]
    fn overflow_mode_keeps_everything() {
        let text = layout("aaa bbb ccc ddd", boxed(OverflowMode::Overflow, 4.0, 2.0));
        assert!(!text.is_text_truncated());
        assert_eq!(text.info().character_count(), 15);
        assert_eq!(text.info().line_count(), 4);
    }

    #[test]
    fn ellipsis_ends_the_text_once() {
        let text = layout("aaa bbb ccc ddd", boxed(OverflowMode::Ellipsis, 4.0, 2.0));
        let info = text.info();
        assert!(text.is_text_truncated());
        let ellipses = info
            .characters
            .iter()
            .filter(|c| c.unicode == HORIZONTAL_ELLIPSIS)
            .count();
        assert_eq!(ellipses, 1);
        assert_eq!(info.characters.last().unwrap().unicode, HORIZONTAL_ELLIPSIS);
        assert!(info.line_count() <= 2);
    }

    #[test]
    fn ellipsis_on_a_single_line() {
        let mut config = boxed(OverflowMode::Ellipsis, 5.0, 1.0);
        config.wrap_style = WrapStyle::NoWrap;
        let text = layout("abcdefghij", config);
        let info = text.info();
        assert_eq!(info.line_count(), 1);
        assert_eq!(info.characters.last().unwrap().unicode, HORIZONTAL_ELLIPSIS);
        assert!(info.lines[0].max_advance <= 36.0 * 5.0 + 0.001);
    }

    #[test]
    fn ellipsis_that_never_fits_empties_the_text() {
        let text = layout("abc", boxed(OverflowMode::Ellipsis, 4.0, 0.5));
        assert!(text.is_text_truncated());
        assert_eq!(text.info().character_count(), 0);
        assert_eq!(text.first_overflow_character_index(), Some(0));
        assert_eq!(text.meshes()[0].quad_count(), 0);
    }

    #[test]
    fn pages_partition_the_characters() {
        let text = layout("aaa bbb ccc ddd eee", boxed(OverflowMode::Page, 4.0, 2.0));
        let info = text.info();
        assert!(info.page_count() >= 2);
        let mut next = 0;
        for page in &info.pages {
            assert_eq!(page.first_character_index, next);
            next += page.character_count;
        }
        assert_eq!(next, info.character_count());
        assert_eq!(info.character_count(), 19);
    }

    #[test]
    fn linked_overflow_continues_in_the_next_component() {
        let (storage, font) = testing::storage();
        let mut first = TextComponent::new("aaa bbb ccc ddd", boxed(OverflowMode::Linked, 4.0, 2.0));
        first.set_linked(Some(Box::new(TextComponent::new("", testing::config(font)))));
        first.generate(&storage, &LineBreakingRules::default());

        assert!(first.is_text_truncated());
        let linked = first.linked().unwrap();
        assert_eq!(linked.text(), "ccc ddd");
    }

    #[test]
    fn linked_overflow_without_wrapping_hands_over_the_rest_of_the_line() {
        let (storage, font) = testing::storage();
        let mut config = boxed(OverflowMode::Linked, 4.0, 1.0);
        config.wrap_style = WrapStyle::NoWrap;
        let mut first = TextComponent::new("abcdef", config);
        first.set_linked(Some(Box::new(TextComponent::new("", testing::config(font)))));
        first.generate(&storage, &LineBreakingRules::default());

        assert!(first.is_text_truncated());
        assert_eq!(first.info().character_count(), 4);
        assert_eq!(first.linked().unwrap().text(), "ef");
    }
}

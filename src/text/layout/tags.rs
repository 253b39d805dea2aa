//! Applies parsed markup tags to the layout cursor.

use crate::color::{self, HIGHLIGHT};
use crate::text::info::LinkInfo;
use crate::text::markup::{Length, MarginSide, MarkupTag, OpenTag, SpriteReference, TagName};
use crate::text::processing::{LINE_FEED, NO_BREAK_SPACE, SOFT_HYPHEN, ZERO_WIDTH_SPACE};
use crate::text::style::{FontStyles, HighlightState};

use super::{LayoutContext, SpriteRequest};

/// What the main loop does with a tag once it is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum TagAction {
    /// The tag only changed state.
    Consumed,
    /// The tag stands for a character.
    Insert(u32),
    Sprite(SpriteRequest),
    PageBreak,
}

const BOLD_WEIGHT: u16 = 700;

impl LayoutContext<'_> {
    /// Applies `tag`. Returns `None` when it refers to something that does not
    /// exist, in which case it is laid out as text.
    pub(super) fn apply_tag(&mut self, tag: MarkupTag) -> Option<TagAction> {
        match tag {
            MarkupTag::Open(open) => self.open_tag(open),
            MarkupTag::Close(name) => {
                self.close_tag(name);
                Some(TagAction::Consumed)
            }
        }
    }

    /// Size and the value percentages refer to, for horizontal lengths.
    fn horizontal_length(&self, length: Length) -> f32 {
        let size = self.cursor.styles.size.current();
        let width = self.config.area_width();
        let percent_of = if width.is_finite() { width } else { 0.0 };
        length.resolve(self.em_scale(size) * 100.0, percent_of)
    }

    /// Lengths relative to the font size.
    fn font_length(&self, length: Length) -> f32 {
        let size = self.cursor.styles.size.current();
        let em = self.em_scale(size) * 100.0;
        length.resolve(em, em)
    }

    fn open_tag(&mut self, tag: OpenTag) -> Option<TagAction> {
        let styles = &mut self.cursor.styles;
        match tag {
            OpenTag::Bold => {
                styles.style.add(FontStyles::BOLD);
                styles.font_weight.push(BOLD_WEIGHT);
            }
            OpenTag::Italic { angle } => {
                styles.style.add(FontStyles::ITALIC);
                styles.italic_angle.push(angle.unwrap_or(self.primary.italic_style));
            }
            OpenTag::Underline { color } => {
                styles.style.add(FontStyles::UNDERLINE);
                let color = color.unwrap_or(styles.color.current());
                styles.underline_color.push(color);
            }
            OpenTag::Strikethrough { color } => {
                styles.style.add(FontStyles::STRIKETHROUGH);
                let color = color.unwrap_or(styles.color.current());
                styles.strikethrough_color.push(color);
            }
            OpenTag::Mark { color, padding } => {
                styles.style.add(FontStyles::HIGHLIGHT);
                styles.highlight.push(HighlightState {
                    color: color.unwrap_or(HIGHLIGHT),
                    padding: padding.unwrap_or([0.0; 4]),
                });
            }
            OpenTag::Color(color) => styles.color.push(color),
            OpenTag::Alpha(alpha) => {
                let color = color::with_alpha(styles.color.current(), alpha);
                styles.color.push(color);
            }
            OpenTag::Size(length) => {
                let base = self.sizer.font_size;
                let size = match length {
                    Length::Pixels(v) => v,
                    Length::FontUnits(v) => v * base,
                    Length::Percentage(v) => base * v / 100.0,
                    Length::Relative(v) => base + v,
                };
                if size <= 0.0 {
                    log::warn!("<size> resolved to {}, ignoring it", size);
                    return None;
                }
                self.cursor.styles.size.push(size);
            }
            OpenTag::Superscript => {
                styles.style.add(FontStyles::SUPERSCRIPT);
            }
            OpenTag::Subscript => {
                styles.style.add(FontStyles::SUBSCRIPT);
            }
            OpenTag::Lowercase => {
                styles.style.add(FontStyles::LOWERCASE);
            }
            OpenTag::Uppercase => {
                styles.style.add(FontStyles::UPPERCASE);
            }
            OpenTag::SmallCaps => {
                styles.style.add(FontStyles::SMALLCAPS);
            }
            OpenTag::Indent(length) => {
                let indent = self.horizontal_length(length);
                self.cursor.styles.indent.push(indent);
                self.cursor.x_advance = indent;
            }
            OpenTag::LineIndent(length) => {
                let indent = self.horizontal_length(length);
                self.cursor.tags.line_indent = indent;
                self.cursor.x_advance += indent;
            }
            OpenTag::Align(alignment) => styles.line_justification.push(alignment),
            OpenTag::CharacterSpace(length) => {
                self.cursor.tags.character_spacing = self.font_length(length);
            }
            OpenTag::Monospace(length) => {
                self.cursor.tags.monospace = Some(self.font_length(length));
            }
            OpenTag::NoBreak => self.cursor.tags.no_break = true,
            OpenTag::NoParse => self.cursor.tags.no_parse = true,
            OpenTag::VerticalOffset(length) => {
                let offset = self.font_length(length);
                self.cursor.styles.baseline_offset.push(offset);
            }
            OpenTag::Rotate(degrees) => self.cursor.tags.rotation = degrees,
            OpenTag::Width(length) => {
                self.cursor.tags.width = Some(self.horizontal_length(length));
            }
            OpenTag::Margin(side, length) => {
                let margin = self.horizontal_length(length);
                let tags = &mut self.cursor.tags;
                match side {
                    MarginSide::Both => {
                        tags.margin_left = margin;
                        tags.margin_right = margin;
                    }
                    MarginSide::Left => tags.margin_left = margin,
                    MarginSide::Right => tags.margin_right = margin,
                }
            }
            OpenTag::LineHeight(length) => {
                let face = self.current_face();
                let size = self.cursor.styles.size.current();
                let line_height = face.line_height * self.font_scale(face, size);
                let em = self.em_scale(size) * 100.0;
                self.cursor.tags.line_height = Some(length.resolve(em, line_height));
            }
            OpenTag::Font { name, material } => return self.open_font(&name, material.as_deref()),
            OpenTag::FontWeight(weight) => styles.font_weight.push(weight),
            OpenTag::Link(id) => {
                let index = self.info.links.len();
                self.info.links.push(LinkInfo {
                    id,
                    first_character_index: self.cursor.character_count,
                    character_count: 0,
                });
                self.cursor.link_count += 1;
                self.cursor.styles.action.push(Some(index));
            }
            OpenTag::Gradient(name) => {
                let Some(gradient) = self.storage.gradient(&name) else {
                    log::warn!("color gradient '{}' is not registered", name);
                    return None;
                };
                self.cursor.styles.color_gradient.push(Some(*gradient));
            }
            OpenTag::Material(name) => {
                let storage = self.storage;
                let Some(id) = storage.material_by_name(&name) else {
                    log::warn!("material '{}' is not registered", name);
                    return None;
                };
                let font = self.current_font();
                let padding = storage.material(id).map(|m| m.padding).unwrap_or(0.0);
                let reference = self.materials.add_font_material(id, font, padding, false);
                self.cursor.styles.material_reference.push(reference);
            }
            OpenTag::Space(length) => {
                self.cursor.x_advance += self.horizontal_length(length);
            }
            OpenTag::Position(length) => {
                self.cursor.x_advance = self.horizontal_length(length);
            }
            OpenTag::Sprite(reference) => return self.open_sprite(&reference),
            OpenTag::PageBreak => return Some(TagAction::PageBreak),
            OpenTag::LineBreak => return Some(TagAction::Insert(LINE_FEED)),
            OpenTag::ZeroWidthSpace => return Some(TagAction::Insert(ZERO_WIDTH_SPACE)),
            OpenTag::NonBreakingSpace => return Some(TagAction::Insert(NO_BREAK_SPACE)),
            OpenTag::SoftHyphen => return Some(TagAction::Insert(SOFT_HYPHEN)),
        }
        Some(TagAction::Consumed)
    }

    fn open_font(&mut self, name: &str, material: Option<&str>) -> Option<TagAction> {
        let storage = self.storage;
        let font = if name.eq_ignore_ascii_case("default") {
            self.primary_font
        } else {
            match storage.font_asset_by_name(name) {
                Some(font) => font,
                None => {
                    log::warn!("font asset '{}' is not registered", name);
                    return None;
                }
            }
        };

        let reference = match material {
            Some(material_name) => {
                let Some(id) = storage.material_by_name(material_name) else {
                    log::warn!("material '{}' is not registered", material_name);
                    return None;
                };
                let padding = storage.material(id).map(|m| m.padding).unwrap_or(0.0);
                self.materials.add_font_material(id, font, padding, false)
            }
            None => self.font_material_reference(font, false),
        };
        self.cursor.styles.material_reference.push(reference);
        Some(TagAction::Consumed)
    }

    fn open_sprite(&mut self, reference: &SpriteReference) -> Option<TagAction> {
        let storage = self.storage;
        let asset_id = match &reference.asset {
            Some(name) => match storage.sprite_asset_by_name(name) {
                Some(id) => id,
                None => {
                    log::warn!("sprite asset '{}' is not registered", name);
                    return None;
                }
            },
            None => match self.cursor.tags.sprite_asset.or(storage.default_sprite_asset()) {
                Some(id) => id,
                None => {
                    log::warn!("<sprite> used without a default sprite asset");
                    return None;
                }
            },
        };
        let asset = storage.sprite_asset(asset_id)?;

        let index = match (&reference.name, reference.index) {
            (Some(name), _) => asset.index_of_name(name),
            (None, Some(index)) => (index < asset.len()).then_some(index),
            (None, None) => None,
        };
        let Some(index) = index else {
            log::warn!("sprite asset '{}' has no sprite matching {:?}", asset.name, reference);
            return None;
        };

        if reference.asset.is_some() {
            self.cursor.tags.sprite_asset = Some(asset_id);
        }
        Some(TagAction::Sprite(SpriteRequest {
            asset: asset_id,
            index,
            tint: reference.tint,
            color: reference.color,
        }))
    }

    /// Closes one level of a toggling style, keeping styles the text starts
    /// with.
    fn close_style(&mut self, style: FontStyles) {
        let open = self.cursor.styles.style.remove(style);
        if open == 0 && self.config.font_style.contains(style) {
            self.cursor.styles.style.add(style);
        }
    }

    fn close_tag(&mut self, name: TagName) {
        match name {
            TagName::Bold => {
                self.close_style(FontStyles::BOLD);
                self.cursor.styles.font_weight.pop();
            }
            TagName::Italic => {
                self.close_style(FontStyles::ITALIC);
                self.cursor.styles.italic_angle.pop();
            }
            TagName::Underline => {
                self.close_style(FontStyles::UNDERLINE);
                self.cursor.styles.underline_color.pop();
            }
            TagName::Strikethrough => {
                self.close_style(FontStyles::STRIKETHROUGH);
                self.cursor.styles.strikethrough_color.pop();
            }
            TagName::Mark => {
                self.close_style(FontStyles::HIGHLIGHT);
                self.cursor.styles.highlight.pop();
            }
            TagName::Color | TagName::Alpha => {
                self.cursor.styles.color.pop();
            }
            TagName::Size => {
                self.cursor.styles.size.pop();
            }
            TagName::Superscript => self.close_style(FontStyles::SUPERSCRIPT),
            TagName::Subscript => self.close_style(FontStyles::SUBSCRIPT),
            TagName::Lowercase => self.close_style(FontStyles::LOWERCASE),
            TagName::Uppercase => self.close_style(FontStyles::UPPERCASE),
            TagName::SmallCaps => self.close_style(FontStyles::SMALLCAPS),
            TagName::Indent => {
                self.cursor.styles.indent.pop();
            }
            TagName::LineIndent => self.cursor.tags.line_indent = 0.0,
            TagName::Align => {
                self.cursor.styles.line_justification.pop();
            }
            TagName::CharacterSpace => self.cursor.tags.character_spacing = 0.0,
            TagName::Monospace => self.cursor.tags.monospace = None,
            TagName::NoBreak => self.cursor.tags.no_break = false,
            TagName::NoParse => self.cursor.tags.no_parse = false,
            TagName::VerticalOffset => {
                self.cursor.styles.baseline_offset.pop();
            }
            TagName::Rotate => self.cursor.tags.rotation = 0.0,
            TagName::Width => self.cursor.tags.width = None,
            TagName::Margin => {
                self.cursor.tags.margin_left = 0.0;
                self.cursor.tags.margin_right = 0.0;
            }
            TagName::LineHeight => self.cursor.tags.line_height = None,
            TagName::Font | TagName::Material => {
                self.cursor.styles.material_reference.pop();
            }
            TagName::FontWeight => {
                self.cursor.styles.font_weight.pop();
            }
            TagName::Link => {
                if let Some(link) = self.cursor.styles.action.current() {
                    self.close_link(link);
                }
                self.cursor.styles.action.pop();
            }
            TagName::Gradient => {
                self.cursor.styles.color_gradient.pop();
            }
        }
    }

    /// Records the extent of the link at `index` up to the cursor.
    pub(super) fn close_link(&mut self, index: usize) {
        let count = self.cursor.character_count;
        if let Some(link) = self.info.links.get_mut(index) {
            link.character_count = count.saturating_sub(link.first_character_index);
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use crate::testing;
    use crate::text::TextComponent;
    use crate::text::line_breaking::LineBreakingRules;
    use crate::text::style::FontStyles;

    fn layout(text: &str) -> TextComponent {
        let (storage, font) = testing::storage();
        let mut component = TextComponent::new(text, testing::config(font));
        component.generate(&storage, &LineBreakingRules::default());
        component
    }

    #[test]
    fn nested_styles_close_in_order() {
        let text = layout("<b><b>a</b>b</b>c");
        let styles: Vec<_> = text.info().characters.iter().map(|c| c.style).collect();
        assert!(styles[0].contains(FontStyles::BOLD));
        assert!(styles[1].contains(FontStyles::BOLD));
        assert!(!styles[2].contains(FontStyles::BOLD));
    }

    #[test]
    fn size_tag_scales_glyphs() {
        let text = layout("a<size=200%>a</size>a");
        let chars = &text.info().characters;
        assert_eq!(chars[1].point_size, chars[0].point_size * 2.0);
        assert_eq!(chars[2].point_size, chars[0].point_size);
        assert!((chars[1].advance - chars[0].advance * 2.0).abs() < 1e-3);
    }

    #[test]
    fn color_stack_restores_previous_color() {
        let text = layout("<color=#FF0000>a<color=#00FF00>b</color>c</color>d");
        let chars = &text.info().characters;
        assert_eq!(chars[0].color.red, 255);
        assert_eq!(chars[1].color.green, 255);
        assert_eq!(chars[2].color.red, 255);
        assert_eq!(chars[3].color, crate::color::WHITE);
    }

    #[test]
    fn links_span_their_characters() {
        let text = layout("go <link=\"home\">here</link> now");
        let links = &text.info().links;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].id, "home");
        assert_eq!(links[0].first_character_index, 3);
        assert_eq!(links[0].character_count, 4);
    }

    #[test]
    fn unclosed_link_runs_to_the_end() {
        let text = layout("<link=a>abc");
        assert_eq!(text.info().links[0].character_count, 3);
    }

    #[test]
    fn line_break_tags_insert_characters() {
        let text = layout("a<br>b");
        assert_eq!(text.info().line_count(), 2);
        assert_eq!(text.info().characters[1].unicode, crate::text::processing::LINE_FEED);
        // The inserted character spans the tag.
        assert_eq!(text.info().characters[1].string_length, 4);
    }

    #[test]
    fn position_and_space_move_the_cursor() {
        let text = layout("a<pos=100>b<space=10>c");
        let chars = &text.info().characters;
        assert_eq!(chars[1].origin, 100.0);
        assert_eq!(chars[2].origin, chars[1].x_advance + 10.0);
    }

    #[test]
    fn unknown_font_is_kept_as_text() {
        let text = layout("<font=\"Nope\">a");
        assert_eq!(text.info().text(), "<font=\"Nope\">a");
    }

    #[test]
    fn case_tags_transform_characters() {
        let text = layout("<uppercase>ab</uppercase><lowercase>CD</lowercase>");
        assert_eq!(text.info().text(), "ABcd");
    }

    #[test]
    fn smallcaps_shrinks_lowercase_letters() {
        let text = layout("<smallcaps>Ab</smallcaps>");
        let chars = &text.info().characters;
        assert_eq!(text.info().text(), "AB");
        assert!(chars[1].point_size < chars[0].point_size);
    }

    #[test]
    fn sprites_resolve_by_name_and_index() {
        let text = layout("a<sprite name=\"smile\">b<sprite index=0>");
        let chars = &text.info().characters;
        assert_eq!(chars.len(), 4);
        assert_eq!(chars[1].element_type, crate::text::TextElementType::Sprite);
        assert_eq!(chars[1].sprite_index, Some(0));
        assert_eq!(text.info().sprite_count, 2);
    }
}

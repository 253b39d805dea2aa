//! Rich text tag recognition.
//!
//! Tags are recognized directly on the processing element array. A sequence
//! that does not form a valid tag is reported as `None` and the caller lays it
//! out as literal text.

use crate::color::{self, Color32};

use super::config::HorizontalAlign;
use super::processing::TextProcessingElement;

/// Longest tag body (between `<` and `>`) that is still considered.
const MAX_TAG_LENGTH: usize = 128;

/// A numeric tag value together with its unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    Pixels(f32),
    /// Multiples of the current font size.
    FontUnits(f32),
    Percentage(f32),
    /// `+N` / `-N`, relative to the current value.
    Relative(f32),
}

impl Length {
    /// Resolves the length against the current font size and the value a
    /// percentage refers to.
    pub fn resolve(&self, font_size: f32, percent_of: f32) -> f32 {
        match *self {
            Length::Pixels(v) | Length::Relative(v) => v,
            Length::FontUnits(v) => v * font_size,
            Length::Percentage(v) => v / 100.0 * percent_of,
        }
    }
}

/// Names of the tags that can be closed with `</name>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagName {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Mark,
    Color,
    Alpha,
    Size,
    Superscript,
    Subscript,
    Lowercase,
    Uppercase,
    SmallCaps,
    Indent,
    LineIndent,
    Align,
    CharacterSpace,
    Monospace,
    NoBreak,
    NoParse,
    VerticalOffset,
    Rotate,
    Width,
    Margin,
    LineHeight,
    Font,
    FontWeight,
    Link,
    Gradient,
    Material,
}

impl TagName {
    fn from_str(name: &str) -> Option<Self> {
        let tag = match name {
            "b" => TagName::Bold,
            "i" => TagName::Italic,
            "u" => TagName::Underline,
            "s" => TagName::Strikethrough,
            "mark" => TagName::Mark,
            "color" => TagName::Color,
            "alpha" => TagName::Alpha,
            "size" => TagName::Size,
            "sup" => TagName::Superscript,
            "sub" => TagName::Subscript,
            "lowercase" => TagName::Lowercase,
            "uppercase" | "allcaps" => TagName::Uppercase,
            "smallcaps" => TagName::SmallCaps,
            "indent" => TagName::Indent,
            "line-indent" => TagName::LineIndent,
            "align" => TagName::Align,
            "cspace" => TagName::CharacterSpace,
            "mspace" => TagName::Monospace,
            "nobr" => TagName::NoBreak,
            "noparse" => TagName::NoParse,
            "voffset" => TagName::VerticalOffset,
            "rotate" => TagName::Rotate,
            "width" => TagName::Width,
            "margin" | "margin-left" | "margin-right" => TagName::Margin,
            "line-height" => TagName::LineHeight,
            "font" => TagName::Font,
            "font-weight" => TagName::FontWeight,
            "link" => TagName::Link,
            "gradient" => TagName::Gradient,
            "material" => TagName::Material,
            _ => return None,
        };
        Some(tag)
    }
}

/// Reference to a sprite as written in `<sprite ...>`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpriteReference {
    /// Sprite asset name; the default sprite asset when `None`.
    pub asset: Option<String>,
    pub index: Option<usize>,
    pub name: Option<String>,
    /// Multiply the sprite with the current text color.
    pub tint: bool,
    pub color: Option<Color32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarginSide {
    Both,
    Left,
    Right,
}

/// Opening or standalone tags with their parsed values.
#[derive(Clone, Debug, PartialEq)]
pub enum OpenTag {
    Bold,
    Italic { angle: Option<f32> },
    Underline { color: Option<Color32> },
    Strikethrough { color: Option<Color32> },
    Mark { color: Option<Color32>, padding: Option<[f32; 4]> },
    Color(Color32),
    Alpha(u8),
    Size(Length),
    Superscript,
    Subscript,
    Lowercase,
    Uppercase,
    SmallCaps,
    Indent(Length),
    LineIndent(Length),
    Align(HorizontalAlign),
    CharacterSpace(Length),
    Monospace(Length),
    NoBreak,
    NoParse,
    VerticalOffset(Length),
    Rotate(f32),
    Width(Length),
    Margin(MarginSide, Length),
    LineHeight(Length),
    Font { name: String, material: Option<String> },
    FontWeight(u16),
    Link(String),
    Gradient(String),
    Material(String),
    Space(Length),
    Position(Length),
    Sprite(SpriteReference),
    PageBreak,
    LineBreak,
    ZeroWidthSpace,
    NonBreakingSpace,
    SoftHyphen,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MarkupTag {
    Open(OpenTag),
    Close(TagName),
}

/// Tries to read a tag starting at `start`, which must hold `<`.
///
/// Returns the tag and the index of its closing `>`.
pub fn parse_tag(elements: &[TextProcessingElement], start: usize) -> Option<(MarkupTag, usize)> {
    if elements.get(start)?.unicode != '<' as u32 {
        return None;
    }

    let mut body = String::new();
    let mut end = None;
    for (offset, element) in elements[start + 1..].iter().enumerate() {
        let ch = char::from_u32(element.unicode)?;
        match ch {
            '>' => {
                end = Some(start + 1 + offset);
                break;
            }
            '<' | '\n' => return None,
            _ => {}
        }
        if body.len() >= MAX_TAG_LENGTH {
            return None;
        }
        body.push(ch);
    }

    let end = end?;
    let tag = parse_tag_body(&body);
    if tag.is_none() {
        log::debug!("'<{}>' is not a recognized tag, keeping it as text", body);
    }
    tag.map(|tag| (tag, end))
}

/// Parses the text between `<` and `>`.
pub fn parse_tag_body(body: &str) -> Option<MarkupTag> {
    if body.is_empty() || body.starts_with(' ') {
        return None;
    }

    if let Some(name) = body.strip_prefix('/') {
        let name = name.trim().to_ascii_lowercase();
        return TagName::from_str(&name).map(MarkupTag::Close);
    }

    if body.starts_with('#') {
        return color::parse_hex(body).map(|c| MarkupTag::Open(OpenTag::Color(c)));
    }

    let (name, value, attributes) = split_tag(body)?;
    let name = name.to_ascii_lowercase();
    let value = value.as_deref();

    let tag = match name.as_str() {
        "b" => OpenTag::Bold,
        "i" => OpenTag::Italic {
            angle: attribute(&attributes, "angle").and_then(|a| a.parse().ok()),
        },
        "u" => OpenTag::Underline {
            color: attribute(&attributes, "color").and_then(parse_color),
        },
        "s" => OpenTag::Strikethrough {
            color: attribute(&attributes, "color").and_then(parse_color),
        },
        "mark" => OpenTag::Mark {
            color: value.and_then(parse_color),
            padding: attribute(&attributes, "padding").and_then(parse_padding),
        },
        "color" => OpenTag::Color(required(&name, value.and_then(parse_color))?),
        "alpha" => OpenTag::Alpha(required(&name, value.and_then(color::parse_alpha))?),
        "size" => OpenTag::Size(required(&name, value.and_then(parse_length))?),
        "sup" => OpenTag::Superscript,
        "sub" => OpenTag::Subscript,
        "lowercase" => OpenTag::Lowercase,
        "uppercase" | "allcaps" => OpenTag::Uppercase,
        "smallcaps" => OpenTag::SmallCaps,
        "indent" => OpenTag::Indent(required(&name, value.and_then(parse_length))?),
        "line-indent" => OpenTag::LineIndent(required(&name, value.and_then(parse_length))?),
        "align" => OpenTag::Align(required(&name, value.and_then(parse_alignment))?),
        "cspace" => OpenTag::CharacterSpace(required(&name, value.and_then(parse_length))?),
        "mspace" => OpenTag::Monospace(required(&name, value.and_then(parse_length))?),
        "nobr" => OpenTag::NoBreak,
        "noparse" => OpenTag::NoParse,
        "voffset" => OpenTag::VerticalOffset(required(&name, value.and_then(parse_length))?),
        "rotate" => OpenTag::Rotate(required(&name, value.and_then(|v| v.parse().ok()))?),
        "width" => OpenTag::Width(required(&name, value.and_then(parse_length))?),
        "margin" => OpenTag::Margin(
            MarginSide::Both,
            required(&name, value.and_then(parse_length))?,
        ),
        "margin-left" => OpenTag::Margin(
            MarginSide::Left,
            required(&name, value.and_then(parse_length))?,
        ),
        "margin-right" => OpenTag::Margin(
            MarginSide::Right,
            required(&name, value.and_then(parse_length))?,
        ),
        "line-height" => OpenTag::LineHeight(required(&name, value.and_then(parse_length))?),
        "font" => OpenTag::Font {
            name: required(&name, value.map(str::to_string))?,
            material: attribute(&attributes, "material").map(str::to_string),
        },
        "font-weight" => OpenTag::FontWeight(required(
            &name,
            value
                .and_then(|v| v.parse::<u16>().ok())
                .filter(|w| (100..=900).contains(w)),
        )?),
        "link" => OpenTag::Link(value.unwrap_or_default().to_string()),
        "gradient" => OpenTag::Gradient(required(&name, value.map(str::to_string))?),
        "material" => OpenTag::Material(required(&name, value.map(str::to_string))?),
        "space" => OpenTag::Space(required(&name, value.and_then(parse_length))?),
        "pos" => OpenTag::Position(required(&name, value.and_then(parse_length))?),
        "sprite" => OpenTag::Sprite(parse_sprite(value, &attributes)?),
        "page" => OpenTag::PageBreak,
        "br" => OpenTag::LineBreak,
        "zwsp" => OpenTag::ZeroWidthSpace,
        "nbsp" => OpenTag::NonBreakingSpace,
        "shy" => OpenTag::SoftHyphen,
        _ => return None,
    };

    Some(MarkupTag::Open(tag))
}

fn required<T>(name: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        log::warn!("tag <{}> has a missing or malformed value, keeping it as text", name);
    }
    value
}

type Attributes = Vec<(String, String)>;

/// Splits `name=value attr="x" ...` into its parts. Quoted values may contain
/// spaces.
fn split_tag(body: &str) -> Option<(String, Option<String>, Attributes)> {
    let mut pairs: Vec<(String, Option<String>)> = Vec::new();
    let mut chars = body.chars().peekable();

    loop {
        while chars.peek() == Some(&' ') {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ' ' {
                break;
            }
            key.push(c);
            chars.next();
        }
        if key.is_empty() {
            return None;
        }

        let value = if chars.peek() == Some(&'=') {
            chars.next();
            let mut value = String::new();
            match chars.peek() {
                Some(&quote @ ('"' | '\'')) => {
                    chars.next();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == quote {
                            closed = true;
                            break;
                        }
                        value.push(c);
                    }
                    if !closed {
                        return None;
                    }
                }
                _ => {
                    while let Some(&c) = chars.peek() {
                        if c == ' ' {
                            break;
                        }
                        value.push(c);
                        chars.next();
                    }
                }
            }
            Some(value)
        } else {
            None
        };

        pairs.push((key, value));
    }

    let mut pairs = pairs.into_iter();
    let (name, value) = pairs.next()?;
    let attributes = pairs
        .map(|(k, v)| (k.to_ascii_lowercase(), v.unwrap_or_default()))
        .collect();
    Some((name, value, attributes))
}

fn attribute<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn parse_color(value: &str) -> Option<Color32> {
    color::parse_hex(value).or_else(|| color::named(value))
}

pub fn parse_length(value: &str) -> Option<Length> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let (number, unit) = if let Some(n) = value.strip_suffix("em") {
        (n, "em")
    } else if let Some(n) = value.strip_suffix("px") {
        (n, "px")
    } else if let Some(n) = value.strip_suffix('%') {
        (n, "%")
    } else {
        (value, "")
    };

    let relative = unit.is_empty() && (number.starts_with('+') || number.starts_with('-'));
    let parsed: f32 = number.parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }

    Some(match unit {
        "em" => Length::FontUnits(parsed),
        "%" => Length::Percentage(parsed),
        _ if relative => Length::Relative(parsed),
        _ => Length::Pixels(parsed),
    })
}

fn parse_alignment(value: &str) -> Option<HorizontalAlign> {
    let align = match value.to_ascii_lowercase().as_str() {
        "left" => HorizontalAlign::Left,
        "center" => HorizontalAlign::Center,
        "right" => HorizontalAlign::Right,
        "justified" => HorizontalAlign::Justified,
        "flush" => HorizontalAlign::Flush,
        _ => return None,
    };
    Some(align)
}

/// `padding="l,r,t,b"` in pixels.
fn parse_padding(value: &str) -> Option<[f32; 4]> {
    let parts: Vec<f32> = value
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [all] => Some([*all; 4]),
        [l, r, t, b] => Some([*l, *r, *t, *b]),
        _ => None,
    }
}

fn parse_sprite(value: Option<&str>, attributes: &Attributes) -> Option<SpriteReference> {
    let mut sprite = SpriteReference {
        tint: attribute(attributes, "tint").is_some_and(|t| t == "1"),
        color: attribute(attributes, "color").and_then(parse_color),
        name: attribute(attributes, "name").map(str::to_string),
        index: attribute(attributes, "index").and_then(|i| i.parse().ok()),
        asset: None,
    };

    match value {
        // `<sprite=3>`: index in the default asset.
        Some(v) if v.parse::<usize>().is_ok() => sprite.index = v.parse().ok(),
        // `<sprite="asset" name="x">` or `<sprite="asset" index=2>`.
        Some(v) => sprite.asset = Some(v.to_string()),
        None => {}
    }

    if sprite.index.is_none() && sprite.name.is_none() {
        log::warn!("<sprite> needs an index or a name");
        return None;
    }
    Some(sprite)
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::processing::build_processing_array;
    use palette::Srgba;

    fn open(body: &str) -> OpenTag {
        match parse_tag_body(body).unwrap() {
            MarkupTag::Open(tag) => tag,
            MarkupTag::Close(name) => panic!("expected an opening tag, got </{name:?}>"),
        }
    }

    #[test]
    fn parses_tag_span_in_elements() {
        let elements = build_processing_array("a<b>c", false);
        let (tag, end) = parse_tag(&elements, 1).unwrap();
        assert_eq!(tag, MarkupTag::Open(OpenTag::Bold));
        assert_eq!(end, 3);
    }

    #[test]
    fn unterminated_or_nested_brackets_are_text() {
        let elements = build_processing_array("<b", false);
        assert!(parse_tag(&elements, 0).is_none());

        let elements = build_processing_array("<<b>", false);
        assert!(parse_tag(&elements, 0).is_none());
    }

    #[test]
    fn unknown_tags_are_rejected() {
        assert!(parse_tag_body("blink").is_none());
        assert!(parse_tag_body("/blink").is_none());
        assert!(parse_tag_body(" b").is_none());
    }

    #[test]
    fn closing_tags() {
        assert_eq!(parse_tag_body("/b"), Some(MarkupTag::Close(TagName::Bold)));
        assert_eq!(
            parse_tag_body("/allcaps"),
            Some(MarkupTag::Close(TagName::Uppercase))
        );
        assert_eq!(
            parse_tag_body("/margin-left"),
            Some(MarkupTag::Close(TagName::Margin))
        );
    }

    #[test]
    fn color_forms() {
        assert_eq!(open("color=#FF0000"), OpenTag::Color(Srgba::new(255, 0, 0, 255)));
        assert_eq!(open("color=\"blue\""), OpenTag::Color(Srgba::new(0, 0, 255, 255)));
        assert_eq!(open("#00FF00"), OpenTag::Color(Srgba::new(0, 255, 0, 255)));
        assert!(parse_tag_body("color=#XYZ").is_none());
        assert!(parse_tag_body("color").is_none());
    }

    #[test]
    fn lengths_and_units() {
        assert_eq!(parse_length("12"), Some(Length::Pixels(12.0)));
        assert_eq!(parse_length("12px"), Some(Length::Pixels(12.0)));
        assert_eq!(parse_length("1.5em"), Some(Length::FontUnits(1.5)));
        assert_eq!(parse_length("50%"), Some(Length::Percentage(50.0)));
        assert_eq!(parse_length("+4"), Some(Length::Relative(4.0)));
        assert_eq!(parse_length("-4"), Some(Length::Relative(-4.0)));
        assert_eq!(parse_length("abc"), None);

        assert_eq!(Length::FontUnits(2.0).resolve(10.0, 0.0), 20.0);
        assert_eq!(Length::Percentage(50.0).resolve(10.0, 300.0), 150.0);
    }

    #[test]
    fn attributes_and_quotes() {
        assert_eq!(
            open("font=\"Noto Sans\" material=\"Outline\""),
            OpenTag::Font {
                name: "Noto Sans".into(),
                material: Some("Outline".into()),
            }
        );
        assert_eq!(open("i angle=20"), OpenTag::Italic { angle: Some(20.0) });
        assert_eq!(
            open("mark=#FFFF0080 padding=\"1,2,3,4\""),
            OpenTag::Mark {
                color: Some(Srgba::new(255, 255, 0, 128)),
                padding: Some([1.0, 2.0, 3.0, 4.0]),
            }
        );
        assert!(parse_tag_body("font=\"unterminated").is_none());
    }

    #[test]
    fn sprite_forms() {
        assert_eq!(
            open("sprite=3"),
            OpenTag::Sprite(SpriteReference {
                index: Some(3),
                ..Default::default()
            })
        );
        assert_eq!(
            open("sprite name=\"smile\" tint=1"),
            OpenTag::Sprite(SpriteReference {
                name: Some("smile".into()),
                tint: true,
                ..Default::default()
            })
        );
        assert_eq!(
            open("sprite=\"Emoji\" index=2"),
            OpenTag::Sprite(SpriteReference {
                asset: Some("Emoji".into()),
                index: Some(2),
                ..Default::default()
            })
        );
        assert!(parse_tag_body("sprite").is_none());
    }

    #[test]
    fn font_weight_range_is_validated() {
        assert_eq!(open("font-weight=700"), OpenTag::FontWeight(700));
        assert!(parse_tag_body("font-weight=950").is_none());
    }
}

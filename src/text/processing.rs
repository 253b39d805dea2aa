/// Kind of element a processing slot resolves to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextElementType {
    #[default]
    Character,
    Sprite,
}

/// One code point of the source string, pre-tokenized for layout.
///
/// `string_index`/`length` point back into the source string (in bytes) so
/// overflow text can be sliced out and links can report their source range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextProcessingElement {
    pub unicode: u32,
    pub string_index: usize,
    pub length: usize,
}

pub const LINE_FEED: u32 = 0x0A;
pub const VERTICAL_TAB: u32 = 0x0B;
pub const CARRIAGE_RETURN: u32 = 0x0D;
pub const TAB: u32 = 0x09;
pub const SPACE: u32 = 0x20;
pub const HYPHEN_MINUS: u32 = 0x2D;
pub const NO_BREAK_SPACE: u32 = 0xA0;
pub const SOFT_HYPHEN: u32 = 0xAD;
pub const ZERO_WIDTH_SPACE: u32 = 0x200B;
pub const WORD_JOINER: u32 = 0x2060;
pub const NARROW_NO_BREAK_SPACE: u32 = 0x202F;
pub const LINE_SEPARATOR: u32 = 0x2028;
pub const PARAGRAPH_SEPARATOR: u32 = 0x2029;
pub const HORIZONTAL_ELLIPSIS: u32 = 0x2026;
pub const WHITE_SQUARE: u32 = 0x25A1;
/// Terminates processing when substituted into the stream.
pub const END_OF_TEXT: u32 = 0x03;

/// Turns `text` into the element array the layout walks over.
///
/// With `parse_escapes` the two character sequences `\n \r \t \v \\` and the
/// code point escapes `\uXXXX` / `\UXXXXXXXX` collapse into single elements
/// that still cover the full escape in the source string.
pub fn build_processing_array(text: &str, parse_escapes: bool) -> Vec<TextProcessingElement> {
    let mut elements = Vec::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        if parse_escapes
            && ch == '\\'
            && let Some(&(_, next)) = chars.peek()
        {
            let simple = match next {
                'n' => Some(LINE_FEED),
                'r' => Some(CARRIAGE_RETURN),
                't' => Some(TAB),
                'v' => Some(VERTICAL_TAB),
                '\\' => Some('\\' as u32),
                _ => None,
            };

            if let Some(unicode) = simple {
                chars.next();
                elements.push(TextProcessingElement {
                    unicode,
                    string_index: index,
                    length: 2,
                });
                continue;
            }

            let digits = match next {
                'u' => 4,
                'U' => 8,
                _ => 0,
            };
            if digits > 0
                && let Some(unicode) = parse_code_point(text, index + 2, digits)
            {
                for _ in 0..=digits {
                    chars.next();
                }
                elements.push(TextProcessingElement {
                    unicode,
                    string_index: index,
                    length: 2 + digits,
                });
                continue;
            }
        }

        elements.push(TextProcessingElement {
            unicode: ch as u32,
            string_index: index,
            length: ch.len_utf8(),
        });
    }

    elements
}

fn parse_code_point(text: &str, start: usize, digits: usize) -> Option<u32> {
    let hex = text.get(start..start + digits)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    char::from_u32(value).map(|c| c as u32)
}

pub fn is_whitespace(unicode: u32) -> bool {
    match unicode {
        SPACE | TAB | LINE_FEED | VERTICAL_TAB | CARRIAGE_RETURN | NO_BREAK_SPACE
        | LINE_SEPARATOR | PARAGRAPH_SEPARATOR | NARROW_NO_BREAK_SPACE | 0x3000 => true,
        0x2000..=0x200A => true,
        _ => false,
    }
}

/// Characters that end the current line unconditionally.
pub fn is_line_break(unicode: u32) -> bool {
    matches!(
        unicode,
        LINE_FEED | VERTICAL_TAB | LINE_SEPARATOR | PARAGRAPH_SEPARATOR
    )
}

/// Combining marks that attach to the preceding base glyph.
pub fn is_combining_mark(unicode: u32) -> bool {
    matches!(
        unicode,
        0x0300..=0x036F | 0x0483..=0x0489 | 0x0591..=0x05BD | 0x0610..=0x061A
            | 0x064B..=0x065F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF
            | 0xFE20..=0xFE2F
    )
}

pub fn is_letter_or_digit(unicode: u32) -> bool {
    char::from_u32(unicode).is_some_and(|c| c.is_alphanumeric())
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn codes(elements: &[TextProcessingElement]) -> Vec<u32> {
        elements.iter().map(|e| e.unicode).collect()
    }

    #[test]
    fn plain_text_maps_one_to_one() {
        let elements = build_processing_array("aé", false);
        assert_eq!(codes(&elements), vec!['a' as u32, 'é' as u32]);
        assert_eq!(elements[1].string_index, 1);
        assert_eq!(elements[1].length, 2);
    }

    #[test]
    fn escapes_collapse_when_enabled() {
        let elements = build_processing_array(r"a\nb\u0041", true);
        assert_eq!(
            codes(&elements),
            vec!['a' as u32, LINE_FEED, 'b' as u32, 'A' as u32]
        );
        assert_eq!(elements[1].length, 2);
        assert_eq!(elements[3].length, 6);
        assert_eq!(elements[3].string_index, 4);
    }

    #[test]
    fn escapes_stay_literal_when_disabled() {
        let elements = build_processing_array(r"\n", false);
        assert_eq!(codes(&elements), vec!['\\' as u32, 'n' as u32]);
    }

    #[test]
    fn malformed_code_point_escape_is_literal() {
        let elements = build_processing_array(r"\uZZ", true);
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[0].unicode, '\\' as u32);
    }

    #[test]
    fn classification() {
        assert!(is_whitespace(SPACE));
        assert!(is_whitespace(NO_BREAK_SPACE));
        assert!(!is_whitespace('a' as u32));
        assert!(is_line_break(LINE_FEED));
        assert!(!is_line_break(SPACE));
        assert!(is_combining_mark(0x0301));
        assert!(!is_combining_mark('e' as u32));
    }
}

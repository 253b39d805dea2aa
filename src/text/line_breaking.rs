use std::collections::HashSet;

use super::processing::{
    HYPHEN_MINUS, NARROW_NO_BREAK_SPACE, NO_BREAK_SPACE, SOFT_HYPHEN, WORD_JOINER,
    ZERO_WIDTH_SPACE, is_whitespace,
};

/// Opening brackets and currency signs: may not end a line.
const DEFAULT_LEADING_CHARACTERS: &str = "([{£¥$€‘“〈《「『【〔〖〘〝（［｛｟＄￡￥«";

/// Closing punctuation, small kana and iteration marks: may not start a line.
const DEFAULT_FOLLOWING_CHARACTERS: &str = concat!(
    ")]}!%,.:;?¢°’”‰′″℃、。々〉》」』】〕〗〙〞〟",
    "ぁぃぅぇぉっゃゅょゎゕゖ゛゜ゝゞ゠ァィゥェォッャュョヮヵヶ・ーヽヾ",
    "ㇰㇱㇲㇳㇴㇵㇶㇷㇸㇹㇺㇻㇼㇽㇾㇿ！％），．：；？］｝｠｡｣､･ｧｨｩｪｫｬｭｮｯｰﾞﾟ‼⁇⁈⁉",
);

/// Process wide CJK line breaking tables.
///
/// Only read during layout; [`crate::FontSystem`] keeps one behind a lock so
/// it can be edited between passes.
#[derive(Clone, Debug, PartialEq)]
pub struct LineBreakingRules {
    pub leading_characters: HashSet<u32, fxhash::FxBuildHasher>,
    pub following_characters: HashSet<u32, fxhash::FxBuildHasher>,
    /// Break Korean text at spaces like Latin text instead of between syllables.
    pub use_modern_hangul_rules: bool,
}

impl Default for LineBreakingRules {
    fn default() -> Self {
        Self::new(DEFAULT_LEADING_CHARACTERS, DEFAULT_FOLLOWING_CHARACTERS)
    }
}

impl LineBreakingRules {
    pub fn new(leading: &str, following: &str) -> Self {
        Self {
            leading_characters: leading.chars().map(|c| c as u32).collect(),
            following_characters: following.chars().map(|c| c as u32).collect(),
            use_modern_hangul_rules: false,
        }
    }

    /// Whether `unicode` breaks like an ideograph under these rules.
    pub fn breaks_like_cjk(&self, unicode: u32) -> bool {
        is_cjk(unicode) && !(self.use_modern_hangul_rules && is_hangul(unicode))
    }

    /// Break opportunity between `current` and `next` when either side is
    /// CJK.
    pub fn allows_cjk_break(&self, current: u32, next: Option<u32>) -> bool {
        let cjk_involved = self.breaks_like_cjk(current) || next.is_some_and(|n| self.breaks_like_cjk(n));
        if !cjk_involved {
            return false;
        }
        if self.leading_characters.contains(&current) {
            return false;
        }
        match next {
            Some(next) => !self.following_characters.contains(&next),
            None => true,
        }
    }
}

/// Whether a line may break right after `unicode` in Latin-style text.
pub fn is_break_opportunity(unicode: u32) -> bool {
    match unicode {
        NO_BREAK_SPACE | NARROW_NO_BREAK_SPACE | WORD_JOINER => false,
        HYPHEN_MINUS | SOFT_HYPHEN | ZERO_WIDTH_SPACE | 0x2010 | 0x2013 => true,
        u => is_whitespace(u),
    }
}

pub fn is_hangul(unicode: u32) -> bool {
    matches!(
        unicode,
        0x1100..=0x11FF | 0x3130..=0x318F | 0xA960..=0xA97F | 0xAC00..=0xD7FF
    )
}

pub fn is_cjk(unicode: u32) -> bool {
    matches!(
        unicode,
        0x1100..=0x11FF
            | 0x2E80..=0x2FDF
            | 0x3000..=0x303F
            | 0x3040..=0x30FF
            | 0x3100..=0x31FF
            | 0x3200..=0x9FFF
            | 0xA960..=0xA97F
            | 0xAC00..=0xD7FF
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFFEF
            | 0x20000..=0x2FA1F
    )
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn u(c: char) -> u32 {
        c as u32
    }

    #[test]
    fn latin_break_opportunities() {
        assert!(is_break_opportunity(u(' ')));
        assert!(is_break_opportunity(u('-')));
        assert!(is_break_opportunity(ZERO_WIDTH_SPACE));
        assert!(is_break_opportunity(SOFT_HYPHEN));
        assert!(!is_break_opportunity(NO_BREAK_SPACE));
        assert!(!is_break_opportunity(u('a')));
    }

    #[test]
    fn ideographs_break_between_each_other() {
        let rules = LineBreakingRules::default();
        assert!(rules.allows_cjk_break(u('漢'), Some(u('字'))));
        assert!(rules.allows_cjk_break(u('a'), Some(u('字'))));
        assert!(!rules.allows_cjk_break(u('a'), Some(u('b'))));
    }

    #[test]
    fn leading_and_following_characters_block_breaks() {
        let rules = LineBreakingRules::default();
        // An opening bracket may not end a line.
        assert!(!rules.allows_cjk_break(u('「'), Some(u('字'))));
        // A closing mark may not start one.
        assert!(!rules.allows_cjk_break(u('字'), Some(u('。'))));
        assert!(rules.allows_cjk_break(u('。'), Some(u('字'))));
    }

    #[test]
    fn modern_hangul_breaks_like_latin() {
        let mut rules = LineBreakingRules::default();
        assert!(rules.allows_cjk_break(u('한'), Some(u('국'))));
        rules.use_modern_hangul_rules = true;
        assert!(!rules.allows_cjk_break(u('한'), Some(u('국'))));
        assert!(is_hangul(u('한')));
    }
}

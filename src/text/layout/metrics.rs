//! Word, line and page records derived once the first pass is done.

use crate::text::config::TextLayoutConfig;
use crate::text::info::{Extents, PageInfo, TextInfo};

/// Fills line word counts and groups the lines into pages.
pub(super) fn finalize(info: &mut TextInfo) {
    for line in &mut info.lines {
        line.word_count = 0;
    }
    for word in &info.words {
        let Some(character) = info.characters.get(word.first_character_index) else {
            continue;
        };
        if let Some(line) = info.lines.get_mut(character.line_number) {
            line.word_count += 1;
        }
    }

    info.pages.clear();
    let Some(last) = info.characters.last() else {
        return;
    };
    let page_count = last.page_number + 1;
    let mut first_character_index = 0;
    for page_number in 0..page_count {
        let character_count = info.characters[first_character_index..]
            .iter()
            .take_while(|c| c.page_number == page_number)
            .count();

        let mut ascender = f32::NEG_INFINITY;
        let mut descender = f32::INFINITY;
        let mut baseline = None;
        let mut extents = Extents::empty();
        let end = first_character_index + character_count;
        for line in info
            .lines
            .iter()
            .filter(|line| (first_character_index..end).contains(&line.first_character_index))
        {
            ascender = ascender.max(line.ascender);
            descender = descender.min(line.descender);
            baseline.get_or_insert(line.baseline);
            extents.union(&line.extents);
        }
        let baseline = baseline.unwrap_or(0.0);
        // A page without lines collapses onto its baseline.
        if ascender < descender {
            ascender = baseline;
            descender = baseline;
        }
        info.pages.push(PageInfo {
            first_character_index,
            character_count,
            ascender,
            baseline,
            descender,
            extents,
        });
        first_character_index = end;
    }
}

/// Width and height the laid out text needs, margins included.
pub(crate) fn preferred_size(info: &TextInfo, config: &TextLayoutConfig) -> [f32; 2] {
    let margin = config.margin;
    let width = info
        .lines
        .iter()
        .map(|line| line.max_advance + line.margin_left + line.margin_right)
        .fold(0.0, f32::max);
    let height = match (info.lines.first(), info.lines.last()) {
        (Some(first), Some(last)) => first.ascender - last.descender,
        _ => 0.0,
    };
    [
        width + margin.left + margin.right,
        height + margin.top + margin.bottom,
    ]
}

//! Kerning and combining mark placement.

use euclid::default::Point2D;

use crate::asset::{FeatureLookupFlags, FontFeatureTable, GlyphValueRecord};
use crate::text::info::CharacterInfo;
use crate::text::processing::is_combining_mark;

/// Adjustments for one glyph from its pair records.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct PairAdjustment {
    /// Font units at the face point size.
    pub value: GlyphValueRecord,
    /// A record involving the glyph asked for the user spacing to be skipped.
    pub ignore_character_spacing: bool,
}

/// Combines the `first` half of the (current, next) record with the `second`
/// half of the (previous, current) record.
pub(crate) fn pair_adjustment(
    table: &FontFeatureTable,
    previous: Option<u32>,
    current: u32,
    next: Option<u32>,
) -> PairAdjustment {
    let mut adjustment = PairAdjustment::default();

    if let Some(next) = next
        && let Some(record) = table.pair_adjustment(current, next)
    {
        adjustment.value = adjustment.value + record.first.value;
        adjustment.ignore_character_spacing |= record
            .lookup_flags
            .contains(FeatureLookupFlags::IGNORE_SPACING_ADJUSTMENTS);
    }

    if let Some(previous) = previous
        && let Some(record) = table.pair_adjustment(previous, current)
    {
        adjustment.value = adjustment.value + record.second.value;
        adjustment.ignore_character_spacing |= record
            .lookup_flags
            .contains(FeatureLookupFlags::IGNORE_SPACING_ADJUSTMENTS);
    }

    adjustment
}

/// Where a combining mark's origin lands: x of the glyph origin and the
/// baseline it sits on.
pub(crate) fn mark_anchor(
    table: &FontFeatureTable,
    characters: &[CharacterInfo],
    line_start: usize,
    base: Option<usize>,
    mark_glyph: u32,
    scale: f32,
) -> Option<Point2D<f32>> {
    // Mark-to-mark: the nearest preceding mark in the cluster.
    let mut index = characters.len();
    while index > line_start {
        index -= 1;
        let previous = &characters[index];
        if !is_combining_mark(previous.unicode) {
            break;
        }
        if let Some(record) = table.mark_to_mark_record(previous.glyph_index, mark_glyph) {
            let x = record.base_mark_anchor.x - record.combining_mark_adjustment.x_position_adjustment;
            let y = record.base_mark_anchor.y - record.combining_mark_adjustment.y_position_adjustment;
            return Some(Point2D::new(
                previous.origin + x * scale,
                previous.baseline + y * scale,
            ));
        }
    }

    let base = characters.get(base?)?;
    let record = table.mark_to_base_record(base.glyph_index, mark_glyph)?;
    let x = record.base_anchor.x - record.mark_adjustment.x_position_adjustment;
    let y = record.base_anchor.y - record.mark_adjustment.y_position_adjustment;
    Some(Point2D::new(base.origin + x * scale, base.baseline + y * scale))
}

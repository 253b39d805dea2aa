use std::collections::HashMap;
use std::ops::Add;

use crate::glyph_id::GlyphPairKey;

bitflags::bitflags! {
    /// Lookup flags attached to a glyph pair adjustment record.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FeatureLookupFlags: u32 {
        const IGNORE_BASE_GLYPHS = 0x0002;
        const IGNORE_LIGATURES = 0x0004;
        const IGNORE_MARKS = 0x0008;
        /// The pair is already tuned; the user character spacing is not added.
        const IGNORE_SPACING_ADJUSTMENTS = 0x0100;
    }
}

/// Placement and advance deltas applied to one glyph, in font units of the
/// face point size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphValueRecord {
    pub x_placement: f32,
    pub y_placement: f32,
    pub x_advance: f32,
    pub y_advance: f32,
}

impl GlyphValueRecord {
    pub fn new(x_placement: f32, y_placement: f32, x_advance: f32, y_advance: f32) -> Self {
        Self {
            x_placement,
            y_placement,
            x_advance,
            y_advance,
        }
    }
}

impl Add for GlyphValueRecord {
    type Output = GlyphValueRecord;

    fn add(self, rhs: Self) -> Self::Output {
        GlyphValueRecord {
            x_placement: self.x_placement + rhs.x_placement,
            y_placement: self.y_placement + rhs.y_placement,
            x_advance: self.x_advance + rhs.x_advance,
            y_advance: self.y_advance + rhs.y_advance,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphAdjustmentRecord {
    pub glyph_index: u32,
    pub value: GlyphValueRecord,
}

/// Kerning style adjustment between two consecutive glyphs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphPairAdjustmentRecord {
    pub first: GlyphAdjustmentRecord,
    pub second: GlyphAdjustmentRecord,
    pub lookup_flags: FeatureLookupFlags,
}

impl GlyphPairAdjustmentRecord {
    /// Plain kerning: only the advance of the first glyph changes.
    pub fn kerning(first: u32, second: u32, x_advance: f32) -> Self {
        Self {
            first: GlyphAdjustmentRecord {
                glyph_index: first,
                value: GlyphValueRecord::new(0.0, 0.0, x_advance, 0.0),
            },
            second: GlyphAdjustmentRecord {
                glyph_index: second,
                value: GlyphValueRecord::default(),
            },
            lookup_flags: FeatureLookupFlags::empty(),
        }
    }

    pub fn key(&self) -> GlyphPairKey {
        GlyphPairKey::new(self.first.glyph_index, self.second.glyph_index)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphAnchorPoint {
    pub x: f32,
    pub y: f32,
}

/// Anchor of the mark glyph that must land on the anchor of its base.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MarkPositionAdjustment {
    pub x_position_adjustment: f32,
    pub y_position_adjustment: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MarkToBaseAdjustmentRecord {
    pub base_glyph: u32,
    pub base_anchor: GlyphAnchorPoint,
    pub mark_glyph: u32,
    pub mark_adjustment: MarkPositionAdjustment,
}

impl MarkToBaseAdjustmentRecord {
    pub fn key(&self) -> GlyphPairKey {
        GlyphPairKey::new(self.base_glyph, self.mark_glyph)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MarkToMarkAdjustmentRecord {
    pub base_mark_glyph: u32,
    pub base_mark_anchor: GlyphAnchorPoint,
    pub combining_mark_glyph: u32,
    pub combining_mark_adjustment: MarkPositionAdjustment,
}

impl MarkToMarkAdjustmentRecord {
    pub fn key(&self) -> GlyphPairKey {
        GlyphPairKey::new(self.base_mark_glyph, self.combining_mark_glyph)
    }
}

/// GPOS-style positioning tables of a font asset, indexed by [`GlyphPairKey`].
#[derive(Clone, Debug, Default)]
pub struct FontFeatureTable {
    pair_adjustments: HashMap<GlyphPairKey, GlyphPairAdjustmentRecord, fxhash::FxBuildHasher>,
    mark_to_base: HashMap<GlyphPairKey, MarkToBaseAdjustmentRecord, fxhash::FxBuildHasher>,
    mark_to_mark: HashMap<GlyphPairKey, MarkToMarkAdjustmentRecord, fxhash::FxBuildHasher>,
}

impl FontFeatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair record, replacing an existing record for the same pair.
    pub fn add_pair_adjustment(&mut self, record: GlyphPairAdjustmentRecord) {
        self.pair_adjustments.insert(record.key(), record);
    }

    pub fn add_mark_to_base(&mut self, record: MarkToBaseAdjustmentRecord) {
        self.mark_to_base.insert(record.key(), record);
    }

    pub fn add_mark_to_mark(&mut self, record: MarkToMarkAdjustmentRecord) {
        self.mark_to_mark.insert(record.key(), record);
    }

    pub fn pair_adjustment(&self, first: u32, second: u32) -> Option<&GlyphPairAdjustmentRecord> {
        self.pair_adjustments.get(&GlyphPairKey::new(first, second))
    }

    pub fn mark_to_base_record(&self, base: u32, mark: u32) -> Option<&MarkToBaseAdjustmentRecord> {
        self.mark_to_base.get(&GlyphPairKey::new(base, mark))
    }

    pub fn mark_to_mark_record(
        &self,
        base_mark: u32,
        combining_mark: u32,
    ) -> Option<&MarkToMarkAdjustmentRecord> {
        self.mark_to_mark.get(&GlyphPairKey::new(base_mark, combining_mark))
    }

    pub fn pair_adjustment_count(&self) -> usize {
        self.pair_adjustments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pair_adjustments.is_empty() && self.mark_to_base.is_empty() && self.mark_to_mark.is_empty()
    }
}

/// Vertical metrics of a font or sprite face, expressed at [`FaceInfo::point_size`].
///
/// All lines are measured from the baseline with the Y axis pointing up, so
/// `ascent_line` is positive and `descent_line` negative.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceInfo {
    pub family_name: String,
    /// Point size the glyph metrics were sampled at.
    pub point_size: f32,
    /// Extra scale applied on top of the point size ratio.
    pub scale: f32,
    pub line_height: f32,
    pub ascent_line: f32,
    pub cap_line: f32,
    pub mean_line: f32,
    pub baseline: f32,
    pub descent_line: f32,
    pub superscript_offset: f32,
    pub superscript_size: f32,
    pub subscript_offset: f32,
    pub subscript_size: f32,
    pub underline_offset: f32,
    pub underline_thickness: f32,
    pub strikethrough_offset: f32,
    pub tab_width: f32,
}

impl FaceInfo {
    /// Derives a complete face from the handful of values every font exposes.
    ///
    /// Secondary lines (cap, mean, super/subscript, decorations) use the usual
    /// typographic ratios when the font does not provide them.
    pub fn from_line_metrics(
        family_name: impl Into<String>,
        point_size: f32,
        ascent: f32,
        descent: f32,
        line_gap: f32,
        space_advance: f32,
    ) -> Self {
        let cap_line = ascent * 0.7;
        Self {
            family_name: family_name.into(),
            point_size,
            scale: 1.0,
            line_height: ascent - descent + line_gap,
            ascent_line: ascent,
            cap_line,
            mean_line: ascent * 0.5,
            baseline: 0.0,
            descent_line: descent,
            superscript_offset: ascent * 0.5,
            superscript_size: 0.5,
            subscript_offset: descent * 0.5,
            subscript_size: 0.5,
            underline_offset: descent * 0.5,
            underline_thickness: (point_size * 0.05).max(1.0),
            strikethrough_offset: cap_line / 2.5,
            tab_width: space_advance,
        }
    }

    /// Height of the face from descent line to ascent line.
    pub fn extent(&self) -> f32 {
        self.ascent_line - self.descent_line
    }
}

//! Glyph quads and the second pass: alignment, UV2 and sub-mesh writes.

use euclid::default::{Point2D, Rotation2D, Vector2D};

use crate::asset::{GlyphMetrics, GlyphRect};
use crate::font_storage::FontStorage;
use crate::text::config::{HorizontalAlign, OverflowMode, TextLayoutConfig, TextureMapping, VerticalAlign};
use crate::text::info::{CharacterInfo, Extents, LineInfo, PageInfo, TextInfo};
use crate::text::mesh::MeshInfo;
use crate::text::processing::{CARRIAGE_RETURN, is_line_break, is_whitespace};

use super::{LayoutResult, decoration};

/// Corners of a glyph quad at `origin` (pen position on the baseline), in
/// bottom-left, top-left, top-right, bottom-right order.
pub(super) fn glyph_quad(
    origin: Point2D<f32>,
    metrics: &GlyphMetrics,
    scale: f32,
    width_factor: f32,
    padding: f32,
    style_padding: f32,
) -> [Point2D<f32>; 4] {
    let pad = padding + style_padding;
    let left = origin.x + (metrics.horizontal_bearing_x - pad) * scale * width_factor;
    let right = left + (metrics.width + 2.0 * pad) * scale * width_factor;
    let top = origin.y + (metrics.horizontal_bearing_y + pad) * scale;
    let bottom = top - (metrics.height + 2.0 * pad) * scale;
    [
        Point2D::new(left, bottom),
        Point2D::new(left, top),
        Point2D::new(right, top),
        Point2D::new(right, bottom),
    ]
}

/// Slants the quad around `mid` (font units above the baseline).
pub(super) fn shear_quad(
    quad: &mut [Point2D<f32>; 4],
    metrics: &GlyphMetrics,
    shear: f32,
    mid: f32,
    pad: f32,
    scale: f32,
) {
    let top = shear * (metrics.horizontal_bearing_y + pad - mid) * scale;
    let bottom = shear * (metrics.horizontal_bearing_y - metrics.height - pad - mid) * scale;
    quad[0].x += bottom;
    quad[1].x += top;
    quad[2].x += top;
    quad[3].x += bottom;
}

/// Rotates the quad counter-clockwise around its center.
pub(super) fn rotate_quad(quad: &mut [Point2D<f32>; 4], degrees: f32) {
    let center = Point2D::new(
        (quad[0].x + quad[2].x) / 2.0,
        (quad[0].y + quad[2].y) / 2.0,
    );
    let rotation = Rotation2D::radians(degrees.to_radians());
    for point in quad.iter_mut() {
        *point = center + rotation.transform_vector(*point - center);
    }
}

/// Atlas coordinates of `rect` grown by `pad` pixels, in quad order. The
/// atlas origin is its top-left corner; V points up.
pub(super) fn atlas_uv(rect: GlyphRect, atlas_size: [f32; 2], pad: f32) -> [[f32; 2]; 4] {
    let [width, height] = atlas_size;
    if width <= 0.0 || height <= 0.0 {
        return [[0.0; 2]; 4];
    }
    let x0 = (rect.x as f32 - pad) / width;
    let x1 = (rect.x as f32 + rect.width as f32 + pad) / width;
    let top = 1.0 - (rect.y as f32 - pad) / height;
    let bottom = 1.0 - (rect.y as f32 + rect.height as f32 + pad) / height;
    [[x0, bottom], [x0, top], [x1, top], [x1, bottom]]
}

/// Which characters the visibility settings let through.
fn visible_mask(info: &TextInfo, config: &TextLayoutConfig) -> Vec<bool> {
    let page = (config.overflow_mode == OverflowMode::Page && !info.pages.is_empty())
        .then(|| config.page_to_display.min(info.pages.len() - 1));
    let last_character = config
        .max_visible_characters
        .map(|max| config.first_visible_character.saturating_add(max));
    let word_limit = config
        .max_visible_words
        .and_then(|max| info.words.get(max))
        .map(|word| word.first_character_index);

    info.characters
        .iter()
        .enumerate()
        .map(|(i, c)| {
            page.is_none_or(|page| c.page_number == page)
                && i >= config.first_visible_character
                && last_character.is_none_or(|last| i < last)
                && word_limit.is_none_or(|limit| i < limit)
                && config.max_visible_lines.is_none_or(|max| c.line_number < max)
        })
        .collect()
}

/// Vertical translation that places `page` in the container.
fn page_offset(page: &PageInfo, config: &TextLayoutConfig, max_cap_height: f32) -> f32 {
    let top = -config.margin.top;
    let height = config.area_height();
    if !height.is_finite() {
        return top - page.ascender;
    }
    let center = top - height / 2.0;
    match config.vertical_align {
        VerticalAlign::Top => top - page.ascender,
        VerticalAlign::Middle => center - (page.ascender + page.descender) / 2.0,
        VerticalAlign::Bottom => top - height - page.descender,
        VerticalAlign::Baseline => center - page.baseline,
        VerticalAlign::Midline => {
            let mid = if page.extents.is_empty() {
                (page.ascender + page.descender) / 2.0
            } else {
                (page.extents.min.y + page.extents.max.y) / 2.0
            };
            center - mid
        }
        VerticalAlign::Capline => center - (page.baseline + max_cap_height / 2.0),
    }
}

fn counts_as_space(unicode: u32) -> bool {
    is_whitespace(unicode) && !is_line_break(unicode) && unicode != CARRIAGE_RETURN
}

/// Horizontal translation of every character of `line`, written into
/// `offsets`.
fn line_offsets(
    line: &LineInfo,
    characters: &[CharacterInfo],
    config: &TextLayoutConfig,
    widest: f32,
    offsets: &mut [f32],
) {
    let limit = if line.width.is_finite() { line.width } else { widest };
    let left = config.margin.left + line.margin_left;
    let free = limit - line.max_advance;

    let base = match line.alignment {
        HorizontalAlign::Left => 0.0,
        HorizontalAlign::Center => free / 2.0,
        HorizontalAlign::Right => free,
        HorizontalAlign::Geometry => {
            if line.extents.is_empty() {
                free / 2.0
            } else {
                (limit - line.extents.width()) / 2.0 - line.extents.min.x
            }
        }
        HorizontalAlign::Justified | HorizontalAlign::Flush => 0.0,
    };
    for offset in offsets[line.character_range()].iter_mut() {
        *offset = left + base;
    }

    let justify = match line.alignment {
        HorizontalAlign::Justified => !line.ends_paragraph,
        HorizontalAlign::Flush => true,
        _ => false,
    };
    let Some(last_visible) = line.last_visible_character_index else {
        return;
    };
    if !justify || free <= 0.0 || !limit.is_finite() {
        return;
    }

    let visible = line.visible_character_count;
    let spaces = line.space_count;
    let ratio = if spaces == 0 {
        1.0
    } else if visible <= 1 {
        0.0
    } else {
        config.word_wrapping_ratio
    };
    let word_share = if spaces > 0 { free * (1.0 - ratio) / spaces as f32 } else { 0.0 };
    let char_share = if visible > 1 { free * ratio / (visible - 1) as f32 } else { 0.0 };

    let mut extra = 0.0;
    for i in line.character_range() {
        if i > line.first_character_index && i <= last_visible {
            if counts_as_space(characters[i - 1].unicode) {
                extra += word_share;
            }
            if characters[i].is_visible && Some(i) != line.first_visible_character_index {
                extra += char_share;
            }
        }
        offsets[i] += extra;
    }
}

fn translate(character: &mut CharacterInfo, offset: Vector2D<f32>) {
    character.bottom_left += offset;
    character.top_left += offset;
    character.top_right += offset;
    character.bottom_right += offset;
    character.origin += offset.x;
    character.x_advance += offset.x;
    character.ascender += offset.y;
    character.baseline += offset.y;
    character.descender += offset.y;
    for vertex in &mut character.vertices {
        vertex.position[0] += offset.x;
        vertex.position[1] += offset.y;
    }
}

/// Reverses the order of the characters of `line` within its advance.
fn mirror_line(line: &LineInfo, characters: &mut [CharacterInfo]) {
    let right = line.max_advance;
    for character in &mut characters[line.character_range()] {
        let mirrored = right - (character.origin + character.advance);
        translate(character, Vector2D::new(mirrored - character.origin, 0.0));
    }
}

/// Sub-mesh `character` is written into; unknown materials fall back to the
/// primary one.
fn sub_mesh_index(character: &CharacterInfo, mesh_count: usize) -> usize {
    if character.material_reference_index < mesh_count {
        character.material_reference_index
    } else {
        0
    }
}

fn quad_extents(character: &CharacterInfo) -> Extents {
    let mut extents = Extents::empty();
    for vertex in &character.vertices {
        extents.include(Point2D::new(vertex.position[0], vertex.position[1]));
    }
    extents
}

/// Normalized position of `value` inside `[min, min + length]`.
fn normalize(value: f32, min: f32, length: f32) -> f32 {
    if length > 0.0 { (value - min) / length } else { 0.0 }
}

/// UV2 of every vertex of `character`, from pre-alignment positions.
fn mapping_uv(
    character: &CharacterInfo,
    line: Option<&LineInfo>,
    text: &Extents,
    config: &TextLayoutConfig,
) -> [[f32; 2]; 4] {
    let glyph = quad_extents(character);
    let reference = |mapping: TextureMapping| match mapping {
        TextureMapping::Line => line.map(|line| line.extents).unwrap_or(glyph),
        TextureMapping::Paragraph => *text,
        TextureMapping::Character | TextureMapping::MatchAspect => glyph,
    };
    let vertical_mapping = match (config.horizontal_mapping, config.vertical_mapping) {
        (TextureMapping::MatchAspect, TextureMapping::MatchAspect) => TextureMapping::Character,
        (_, vertical) => vertical,
    };
    let horizontal = reference(config.horizontal_mapping);
    let vertical = reference(vertical_mapping);

    let mut uv = [[0.0; 2]; 4];
    for (k, vertex) in character.vertices.iter().enumerate() {
        let [x, y, _] = vertex.position;
        uv[k] = [
            normalize(x, horizontal.min.x, horizontal.width()),
            normalize(y, vertical.min.y, vertical.height()),
        ];
    }

    // Match aspect spans one axis by the other times the glyph aspect ratio,
    // centered on 0.5.
    let aspect = if character.aspect_ratio > 0.0 { character.aspect_ratio } else { 1.0 };
    if config.horizontal_mapping == TextureMapping::MatchAspect {
        let half = (uv[1][1] - uv[0][1]) * aspect / 2.0;
        for (k, point) in uv.iter_mut().enumerate() {
            point[0] = if k < 2 { 0.5 - half } else { 0.5 + half };
        }
    } else if vertical_mapping == TextureMapping::MatchAspect {
        let half = (uv[3][0] - uv[0][0]) / aspect / 2.0;
        for (k, point) in uv.iter_mut().enumerate() {
            point[1] = if k == 0 || k == 3 { 0.5 - half } else { 0.5 + half };
        }
    }

    for point in &mut uv {
        point[0] += config.uv_line_offset * character.line_number as f32 + config.uv_offset[0];
        point[1] += config.uv_offset[1];
    }
    uv
}

/// Second pass: aligns the laid out characters, writes one sub-mesh per
/// material and adds decorations.
pub(crate) fn assemble_mesh(
    info: &mut TextInfo,
    config: &TextLayoutConfig,
    storage: &FontStorage,
    result: &mut LayoutResult,
    meshes: &mut Vec<MeshInfo>,
) {
    let material_count = result.materials.len().max(1);
    meshes.truncate(material_count);
    meshes.resize_with(material_count, MeshInfo::default);
    for (index, mesh) in meshes.iter_mut().enumerate() {
        mesh.clear();
        mesh.material = result.materials.get(index).map(|reference| reference.material);
    }
    result.materials.reset_counts();
    info.material_count = result.materials.len();

    if info.characters.is_empty() {
        info.text_bounds = Extents::empty();
        info.mesh_extents = Extents::empty();
        return;
    }

    if config.is_right_to_left {
        for line in &info.lines {
            mirror_line(line, &mut info.characters);
        }
        for line in &mut info.lines {
            let mut extents = Extents::empty();
            for character in info.characters[line.character_range()].iter().filter(|c| c.is_visible) {
                extents.union(&quad_extents(character));
            }
            line.extents = extents;
        }
    }

    let mut unaligned = Extents::empty();
    for character in info.characters.iter().filter(|c| c.is_visible) {
        unaligned.union(&quad_extents(character));
    }
    let uv2: Vec<[[f32; 2]; 4]> = info
        .characters
        .iter()
        .map(|c| mapping_uv(c, info.lines.get(c.line_number), &unaligned, config))
        .collect();

    let widest = info
        .lines
        .iter()
        .map(|line| line.max_advance)
        .fold(0.0, f32::max);
    let mut x_offsets = vec![0.0; info.characters.len()];
    for line in &info.lines {
        line_offsets(line, &info.characters, config, widest, &mut x_offsets);
    }
    let y_offsets: Vec<f32> = info
        .pages
        .iter()
        .map(|page| page_offset(page, config, result.max_cap_height))
        .collect();

    let shown = visible_mask(info, config);
    for character in info
        .characters
        .iter()
        .zip(&shown)
        .filter_map(|(c, shown)| (*shown && c.is_visible).then_some(c))
    {
        result.materials.increment(sub_mesh_index(character, meshes.len()));
    }
    for (index, mesh) in meshes.iter_mut().enumerate() {
        let quads = result.materials.get(index).map_or(0, |reference| reference.reference_count);
        mesh.reserve_quads(quads);
    }

    let mut text_bounds = Extents::empty();
    for (i, character) in info.characters.iter_mut().enumerate() {
        let dy = y_offsets.get(character.page_number).copied().unwrap_or(0.0);
        translate(character, Vector2D::new(x_offsets[i], dy));
        text_bounds.include(character.bottom_left);
        text_bounds.include(character.top_right);

        character.vertex_index = None;
        if !(shown[i] && character.is_visible) {
            continue;
        }
        for (vertex, uv) in character.vertices.iter_mut().zip(uv2[i]) {
            vertex.uv2 = uv;
        }
        let material = sub_mesh_index(character, meshes.len());
        character.vertex_index = Some(meshes[material].add_quad(character.vertices));
    }

    for line in &mut info.lines {
        let dy = info
            .characters
            .get(line.first_character_index)
            .map(|c| y_offsets.get(c.page_number).copied().unwrap_or(0.0))
            .unwrap_or(0.0);
        line.ascender += dy;
        line.baseline += dy;
        line.descender += dy;
        let mut extents = Extents::empty();
        for character in info.characters[line.character_range()].iter().filter(|c| c.is_visible) {
            extents.union(&quad_extents(character));
        }
        line.extents = extents;
    }
    for (page, dy) in info.pages.iter_mut().zip(&y_offsets) {
        page.ascender += dy;
        page.baseline += dy;
        page.descender += dy;
        let mut extents = Extents::empty();
        for line in info
            .lines
            .iter()
            .filter(|line| line.first_character_index >= page.first_character_index)
            .filter(|line| line.first_character_index < page.first_character_index + page.character_count)
        {
            extents.union(&line.extents);
        }
        page.extents = extents;
    }

    decoration::add_decorations(info, &shown, config, storage, meshes);

    let mut mesh_extents = Extents::empty();
    for mesh in meshes.iter() {
        for vertex in &mesh.vertices {
            mesh_extents.include(Point2D::new(vertex.position[0], vertex.position[1]));
        }
    }
    info.text_bounds = text_bounds;
    info.mesh_extents = mesh_extents;
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::text::TextComponent;
    use crate::text::line_breaking::LineBreakingRules;

    fn generate(text: &str, config: TextLayoutConfig) -> TextComponent {
        let (storage, _) = testing::storage();
        let mut component = TextComponent::new(text, config);
        component.generate(&storage, &LineBreakingRules::default());
        component
    }

    fn metrics() -> GlyphMetrics {
        GlyphMetrics {
            width: 8.0,
            height: 10.0,
            horizontal_bearing_x: 1.0,
            horizontal_bearing_y: 8.0,
            horizontal_advance: 10.0,
        }
    }

    #[test]
    fn quad_follows_bearings() {
        let quad = glyph_quad(Point2D::new(100.0, 0.0), &metrics(), 2.0, 1.0, 0.0, 0.0);
        assert_eq!(quad[0], Point2D::new(102.0, -4.0));
        assert_eq!(quad[2], Point2D::new(118.0, 16.0));

        let padded = glyph_quad(Point2D::new(100.0, 0.0), &metrics(), 2.0, 1.0, 1.0, 0.0);
        assert_eq!(padded[0], Point2D::new(100.0, -6.0));
        assert_eq!(padded[2], Point2D::new(120.0, 18.0));
    }

    #[test]
    fn shear_moves_top_right_and_bottom_left() {
        let mut quad = glyph_quad(Point2D::new(0.0, 0.0), &metrics(), 1.0, 1.0, 0.0, 0.0);
        let before = quad;
        shear_quad(&mut quad, &metrics(), 0.5, 3.0, 0.0, 1.0);
        assert_eq!(quad[1].x - before[1].x, 2.5);
        assert_eq!(quad[0].x - before[0].x, -2.5);
    }

    #[test]
    fn rotation_keeps_the_center() {
        let mut quad = glyph_quad(Point2D::new(0.0, 0.0), &metrics(), 1.0, 1.0, 0.0, 0.0);
        rotate_quad(&mut quad, 90.0);
        let center = Point2D::new((quad[0].x + quad[2].x) / 2.0, (quad[0].y + quad[2].y) / 2.0);
        assert!((center.x - 5.0).abs() < 1e-4);
        assert!((center.y - 3.0).abs() < 1e-4);
        // The bottom-left corner ends up bottom-right.
        assert!(quad[0].x > center.x && quad[0].y < center.y);
    }

    #[test]
    fn uv_flips_the_atlas_y_axis() {
        let rect = GlyphRect {
            x: 10,
            y: 0,
            width: 20,
            height: 50,
        };
        let uv = atlas_uv(rect, [100.0, 100.0], 0.0);
        assert_eq!(uv[0], [0.1, 0.5]);
        assert_eq!(uv[2], [0.3, 1.0]);
        assert_eq!(atlas_uv(rect, [0.0, 100.0], 0.0), [[0.0; 2]; 4]);
    }

    #[test]
    fn one_quad_per_visible_character() {
        let (_, font) = testing::storage();
        let text = generate("ab c", testing::config(font));
        let mesh = &text.meshes()[0];
        assert_eq!(mesh.quad_count(), 3);
        assert_eq!(mesh.triangles.len(), 18);
        assert_eq!(text.info().characters[3].vertex_index, Some(8));
        assert_eq!(text.info().characters[2].vertex_index, None);
    }

    #[test]
    fn top_alignment_puts_the_ascender_at_the_margin() {
        let (_, font) = testing::storage();
        let config = TextLayoutConfig {
            max_width: Some(1000.0),
            max_height: Some(500.0),
            ..testing::config(font)
        };
        let text = generate("a", config);
        assert!(text.info().lines[0].ascender.abs() < 1e-4);
    }

    #[test]
    fn bottom_alignment_puts_the_descender_at_the_bottom() {
        let (_, font) = testing::storage();
        let config = TextLayoutConfig {
            max_width: Some(1000.0),
            max_height: Some(500.0),
            vertical_align: VerticalAlign::Bottom,
            ..testing::config(font)
        };
        let text = generate("a\nb", config);
        let last = text.info().lines.last().unwrap();
        assert!((last.descender + 500.0).abs() < 1e-3);
    }

    #[test]
    fn right_and_center_alignment() {
        let (_, font) = testing::storage();
        let right = generate(
            "ab",
            TextLayoutConfig {
                max_width: Some(720.0),
                horizontal_align: HorizontalAlign::Right,
                ..testing::config(font)
            },
        );
        let last = &right.info().characters[1];
        assert!((last.origin + last.advance - 720.0).abs() < 1e-3);

        let center = generate(
            "ab",
            TextLayoutConfig {
                max_width: Some(720.0),
                horizontal_align: HorizontalAlign::Center,
                ..testing::config(font)
            },
        );
        assert!((center.info().characters[0].origin - 324.0).abs() < 1e-3);
    }

    #[test]
    fn justified_lines_reach_the_edge_except_the_last() {
        let (_, font) = testing::storage();
        let config = TextLayoutConfig {
            max_width: Some(36.0 * 9.0),
            horizontal_align: HorizontalAlign::Justified,
            ..testing::config(font)
        };
        let text = generate("aa bb cc dd", config);
        let info = text.info();
        assert_eq!(info.line_count(), 2);

        let first = &info.lines[0];
        let last = &info.characters[first.last_visible_character_index.unwrap()];
        assert!((last.origin + last.advance - 36.0 * 9.0).abs() < 1e-3);

        let second = &info.lines[1];
        assert_eq!(info.characters[second.first_character_index].origin, 0.0);
        let end = &info.characters[second.last_visible_character_index.unwrap()];
        assert!(end.origin + end.advance < 36.0 * 9.0 - 1.0);
    }

    #[test]
    fn right_to_left_reverses_the_line() {
        let (_, font) = testing::storage();
        let config = TextLayoutConfig {
            is_right_to_left: true,
            ..testing::config(font)
        };
        let text = generate("abc", config);
        let chars = &text.info().characters;
        assert!(chars[0].origin > chars[1].origin);
        assert!(chars[1].origin > chars[2].origin);
        assert_eq!(chars[2].origin, 0.0);
    }

    #[test]
    fn visibility_limits_skip_quads() {
        let (_, font) = testing::storage();
        let text = generate(
            "abcdef",
            TextLayoutConfig {
                first_visible_character: 1,
                max_visible_characters: Some(3),
                ..testing::config(font)
            },
        );
        assert_eq!(text.meshes()[0].quad_count(), 3);
        assert_eq!(text.info().characters[0].vertex_index, None);
        assert_eq!(text.info().characters[4].vertex_index, None);

        let words = generate(
            "ab cd ef",
            TextLayoutConfig {
                max_visible_words: Some(2),
                ..testing::config(font)
            },
        );
        assert_eq!(words.meshes()[0].quad_count(), 4);
    }

    #[test]
    fn only_the_displayed_page_is_drawn() {
        let (_, font) = testing::storage();
        let text = generate(
            "ab<page>cde",
            TextLayoutConfig {
                overflow_mode: OverflowMode::Page,
                page_to_display: 1,
                ..testing::config(font)
            },
        );
        assert_eq!(text.meshes()[0].quad_count(), 3);
        assert_eq!(text.info().characters[0].vertex_index, None);
    }

    #[test]
    fn character_mapping_spans_each_quad() {
        let (_, font) = testing::storage();
        let text = generate("ab", testing::config(font));
        let vertices = &text.meshes()[0].vertices;
        assert_eq!(vertices[0].uv2, [0.0, 0.0]);
        assert_eq!(vertices[2].uv2, [1.0, 1.0]);
        assert_eq!(vertices[6].uv2, [1.0, 1.0]);
    }

    #[test]
    fn paragraph_mapping_spans_the_text() {
        let (_, font) = testing::storage();
        let text = generate(
            "ab",
            TextLayoutConfig {
                horizontal_mapping: TextureMapping::Paragraph,
                ..testing::config(font)
            },
        );
        let vertices = &text.meshes()[0].vertices;
        assert_eq!(vertices[0].uv2[0], 0.0);
        assert!((vertices[6].uv2[0] - 1.0).abs() < 1e-5);
        assert!(vertices[2].uv2[0] > 0.0 && vertices[2].uv2[0] < 1.0);
    }

    #[test]
    fn match_aspect_follows_the_glyph_aspect_ratio() {
        let mut character = testing::character_info('a' as u32, 1);
        let corners = [[0.0, 0.0], [0.0, 10.0], [20.0, 10.0], [20.0, 0.0]];
        for (vertex, [x, y]) in character.vertices.iter_mut().zip(corners) {
            vertex.position = [x, y, 0.0];
        }
        character.aspect_ratio = 2.0;
        let text = Extents::empty();

        let wide = TextLayoutConfig {
            horizontal_mapping: TextureMapping::MatchAspect,
            ..Default::default()
        };
        let uv = mapping_uv(&character, None, &text, &wide);
        assert_eq!(uv[0], [-0.5, 0.0]);
        assert_eq!(uv[2], [1.5, 1.0]);

        let tall = TextLayoutConfig {
            vertical_mapping: TextureMapping::MatchAspect,
            ..Default::default()
        };
        let uv = mapping_uv(&character, None, &text, &tall);
        assert_eq!(uv[0], [0.0, 0.25]);
        assert_eq!(uv[2], [1.0, 0.75]);
    }

    #[test]
    fn match_aspect_is_centered_on_each_line() {
        let (_, font) = testing::storage();
        let text = generate(
            "a\nb",
            TextLayoutConfig {
                horizontal_mapping: TextureMapping::MatchAspect,
                vertical_mapping: TextureMapping::Paragraph,
                ..testing::config(font)
            },
        );
        let vertices = &text.meshes()[0].vertices;
        // Each glyph covers half of the paragraph height.
        for quad in vertices.chunks(4) {
            assert!((quad[0].uv2[0] - 0.25).abs() < 1e-4);
            assert!((quad[2].uv2[0] - 0.75).abs() < 1e-4);
        }
        assert!((vertices[0].uv2[1] - 0.5).abs() < 1e-4);
        assert!((vertices[1].uv2[1] - 1.0).abs() < 1e-4);
        assert!(vertices[4].uv2[1].abs() < 1e-4);
    }

    #[test]
    fn material_counts_size_each_sub_mesh() {
        let (_, font) = testing::storage();
        let config = TextLayoutConfig {
            max_visible_characters: Some(3),
            ..testing::config(font)
        };
        let text = generate("a<sprite name=\"smile\">bc", config);
        let materials = text.materials();

        assert_eq!(materials.len(), 2);
        assert_eq!(materials.get(0).unwrap().reference_count, 2);
        assert_eq!(materials.get(1).unwrap().reference_count, 1);
        assert!(materials.get(1).unwrap().sprite_asset.is_some());
        for (index, mesh) in text.meshes().iter().enumerate() {
            let count = materials.get(index).unwrap().reference_count;
            assert_eq!(mesh.quad_count(), count);
            assert!(mesh.vertices.capacity() >= count * 4);
            assert!(mesh.triangles.capacity() >= count * 6);
        }
    }

    #[test]
    fn bounds_cover_the_mesh() {
        let (_, font) = testing::storage();
        let text = generate("hello\nworld", testing::config(font));
        let info = text.info();
        assert!(!info.mesh_extents.is_empty());
        for vertex in &text.meshes()[0].vertices {
            assert!(vertex.position[0] >= info.mesh_extents.min.x);
            assert!(vertex.position[1] <= info.mesh_extents.max.y);
        }
        assert!(info.text_bounds.width() > 0.0);
    }
}

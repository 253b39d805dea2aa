//! Underline, strikethrough and highlight quads.

use euclid::default::Point2D;

use crate::color::{self, Color32, ColorSpace};
use crate::font_storage::FontStorage;
use crate::text::config::TextLayoutConfig;
use crate::text::info::{CharacterInfo, TextInfo};
use crate::text::mesh::{MeshInfo, TextVertex};
use crate::text::style::{FontStyles, HighlightState};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Decoration {
    Underline,
    Strikethrough,
    Highlight,
}

impl Decoration {
    fn flag(self) -> FontStyles {
        match self {
            Decoration::Underline => FontStyles::UNDERLINE,
            Decoration::Strikethrough => FontStyles::STRIKETHROUGH,
            Decoration::Highlight => FontStyles::HIGHLIGHT,
        }
    }

    fn key(self, character: &CharacterInfo) -> (Color32, [f32; 4]) {
        match self {
            Decoration::Underline => (character.underline_color, [0.0; 4]),
            Decoration::Strikethrough => (character.strikethrough_color, [0.0; 4]),
            Decoration::Highlight => {
                let HighlightState { color, padding } = character.highlight;
                (color, padding)
            }
        }
    }
}

/// A closed run of decorated characters.
#[derive(Clone, Copy, Debug)]
struct Run {
    first: usize,
    /// Last visible character, so trailing whitespace stays bare.
    last: usize,
    line: usize,
    page: usize,
    color: Color32,
    padding: [f32; 4],
}

/// Appends a decoration quad spanning `bottom_left` to `top_right` and
/// returns the index of its first vertex.
pub(super) fn add_decoration_quad(
    mesh: &mut MeshInfo,
    bottom_left: Point2D<f32>,
    top_right: Point2D<f32>,
    start_scale: f32,
    end_scale: f32,
    uv: [f32; 2],
    color: Color32,
) -> usize {
    let color = [color.red, color.green, color.blue, color.alpha];
    let corners = [
        (Point2D::new(bottom_left.x, bottom_left.y), start_scale, [0.0, 0.0]),
        (Point2D::new(bottom_left.x, top_right.y), start_scale, [0.0, 1.0]),
        (Point2D::new(top_right.x, top_right.y), end_scale, [1.0, 1.0]),
        (Point2D::new(top_right.x, bottom_left.y), end_scale, [1.0, 0.0]),
    ];
    let quad = corners.map(|(position, scale, uv2)| TextVertex {
        position: [position.x, position.y, 0.0],
        uv0: [uv[0], uv[1], 0.0, scale],
        uv2,
        color,
    });
    mesh.add_quad(quad)
}

/// Atlas coordinate sampled by decorations: the middle of the primary font's
/// underscore.
fn decoration_uv(config: &TextLayoutConfig, storage: &FontStorage) -> [f32; 2] {
    let Some(font) = config.font_asset.and_then(|id| storage.font_asset(id)) else {
        return [0.0; 2];
    };
    match font.character_glyph('_' as u32) {
        Some(glyph) if font.atlas_width > 0 && font.atlas_height > 0 => [
            (glyph.rect.x as f32 + glyph.rect.width as f32 / 2.0) / font.atlas_width as f32,
            1.0 - (glyph.rect.y as f32 + glyph.rect.height as f32 / 2.0) / font.atlas_height as f32,
        ],
        _ => [0.0; 2],
    }
}

fn find_runs(info: &TextInfo, shown: &[bool], decoration: Decoration) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut open: Option<Run> = None;

    for (i, character) in info.characters.iter().enumerate() {
        let decorated = shown[i] && character.style.contains(decoration.flag());
        let (color, padding) = decoration.key(character);
        let continues = open.is_some_and(|run| {
            run.line == character.line_number
                && run.page == character.page_number
                && run.color == color
                && run.padding == padding
        });

        if decorated && continues {
            if character.is_visible
                && let Some(run) = open.as_mut()
            {
                run.last = i;
            }
            continue;
        }
        if let Some(run) = open.take() {
            runs.push(run);
        }
        if decorated && character.is_visible {
            open = Some(Run {
                first: i,
                last: i,
                line: character.line_number,
                page: character.page_number,
                color,
                padding,
            });
        }
    }
    runs.extend(open);
    runs
}

/// Writes every decoration run of `info` into the first sub-mesh.
pub(super) fn add_decorations(
    info: &TextInfo,
    shown: &[bool],
    config: &TextLayoutConfig,
    storage: &FontStorage,
    meshes: &mut [MeshInfo],
) {
    let Some(mesh) = meshes.first_mut() else {
        return;
    };
    let uv = decoration_uv(config, storage);

    for decoration in [Decoration::Highlight, Decoration::Underline, Decoration::Strikethrough] {
        for run in find_runs(info, shown, decoration) {
            let first = &info.characters[run.first];
            let last = &info.characters[run.last];
            let characters = &info.characters[run.first..=run.last];
            let scale = characters.iter().map(|c| c.scale).fold(0.0, f32::max);
            let face = first
                .font_asset
                .or(config.font_asset)
                .and_then(|id| storage.font_asset(id))
                .map(|font| &font.face_info);
            let baseline = info
                .lines
                .get(run.line)
                .map(|line| line.baseline)
                .unwrap_or(first.baseline);
            let left = first.bottom_left.x;
            let right = last.bottom_right.x;

            let (bottom_left, top_right) = match decoration {
                Decoration::Underline => {
                    let Some(face) = face else { continue };
                    let top = baseline + face.underline_offset * scale;
                    let bottom = top - face.underline_thickness * scale;
                    (Point2D::new(left, bottom), Point2D::new(right, top))
                }
                Decoration::Strikethrough => {
                    let Some(face) = face else { continue };
                    let middle = baseline + face.strikethrough_offset * scale;
                    let half = face.underline_thickness * scale / 2.0;
                    (Point2D::new(left, middle - half), Point2D::new(right, middle + half))
                }
                Decoration::Highlight => {
                    let top = characters.iter().map(|c| c.ascender).fold(f32::NEG_INFINITY, f32::max);
                    let bottom = characters.iter().map(|c| c.descender).fold(f32::INFINITY, f32::min);
                    let [pad_left, pad_right, pad_top, pad_bottom] = run.padding;
                    (
                        Point2D::new(left - pad_left, bottom - pad_bottom),
                        Point2D::new(right + pad_right, top + pad_top),
                    )
                }
            };

            let color = match config.color_space {
                ColorSpace::Gamma => run.color,
                ColorSpace::Linear => color::to_linear(run.color),
            };
            add_decoration_quad(
                mesh,
                bottom_left,
                top_right,
                first.scale,
                last.scale,
                uv,
                color,
            );
        }
    }
}

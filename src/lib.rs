//! # tmesh
//!
//! Rich text layout that turns tagged strings into textured glyph meshes.
//!
//! ## Overview
//!
//! A [`TextComponent`] holds a source string such as
//! `"<b>Hello</b> <color=#FF8000>world</color>"` and a [`TextLayoutConfig`].
//! Generating it against a [`FontStorage`] resolves every character to a glyph
//! in a pre-rasterized font atlas, breaks lines, applies alignment and
//! overflow handling, and writes one quad per visible character into a
//! sub-mesh per material. Drawing those meshes is left to the caller.
//!
//! The [`FontSystem`] bundles the storage with the line breaking rules behind
//! locks, which is convenient when several UI threads share one set of fonts.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tmesh::{FontSystem, TextComponent, TextLayoutConfig};
//!
//! // 1. Create a FontSystem and sample a font asset from a system face
//! let font_system = FontSystem::new();
//! font_system.load_system_fonts();
//! let (face, _) = font_system
//!     .query(&tmesh::fontdb::Query::default())
//!     .expect("no system font");
//! let font = font_system
//!     .create_font_asset("Sans", face, 48.0, ' '..='~', [512, 512], 5)
//!     .expect("sampling failed");
//!
//! // 2. Describe the text
//! let config = TextLayoutConfig {
//!     font_asset: Some(font),
//!     max_width: Some(400.0),
//!     ..Default::default()
//! };
//! let mut text = TextComponent::new("<b>Hello</b> <i>world</i>", config);
//!
//! // 3. Layout and build the meshes
//! font_system.generate_text_mesh(&mut text);
//! for mesh in text.meshes() {
//!     let _vertices: &[u8] = bytemuck::cast_slice(&mesh.vertices);
//! }
//! ```
//!
//! ## Features
//!
//! *   **Rich Text**: Color, size, weight, case, spacing, alignment, links, sprites and more through inline tags.
//! *   **Overflow Handling**: Truncation, ellipsis, pages and linked text containers.
//! *   **Auto Size**: Finds the largest point size that fits the container.
//! *   **Buffer Reuse**: Character, line and vertex buffers are kept between layouts.

pub mod asset;
pub mod color;
pub mod font_storage;
pub mod font_system;
pub mod glyph_id;
pub mod text;

#[doc(hidden)]
pub mod testing;

// common re-exports
pub use font_storage::FontStorage;
pub use font_system::FontSystem;
pub use glyph_id::{FontAssetId, MaterialId, SpriteAssetId};
pub use text::{TextComponent, TextLayoutConfig};

// re-export dependencies
pub use fontdb;
pub use fontdue;
pub use parking_lot;

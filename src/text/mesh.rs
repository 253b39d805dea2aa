use std::collections::HashMap;

use crate::glyph_id::{FontAssetId, MaterialId, SpriteAssetId};

/// One vertex of a glyph or decoration quad.
///
/// `uv0.xy` samples the atlas; `uv0.w` carries the horizontal glyph scale
/// (negative for bold) that SDF shaders use for their gradient width.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TextVertex {
    pub position: [f32; 3],
    pub uv0: [f32; 4],
    pub uv2: [f32; 2],
    pub color: [u8; 4],
}

const QUAD_NORMAL: [f32; 3] = [0.0, 0.0, -1.0];
const QUAD_TANGENT: [f32; 4] = [-1.0, 0.0, 0.0, 1.0];

/// Vertex and index buffers of one sub-mesh.
///
/// Buffers are cleared between passes but keep their allocation, so repeated
/// layouts of similar text do not reallocate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshInfo {
    pub material: Option<MaterialId>,
    pub vertices: Vec<TextVertex>,
    pub normals: Vec<[f32; 3]>,
    pub tangents: Vec<[f32; 4]>,
    pub triangles: Vec<u32>,
}

impl MeshInfo {
    pub fn new(material: Option<MaterialId>) -> Self {
        Self {
            material,
            ..Default::default()
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.tangents.clear();
        self.triangles.clear();
    }

    pub fn reserve_quads(&mut self, quads: usize) {
        self.vertices.reserve(quads * 4);
        self.normals.reserve(quads * 4);
        self.tangents.reserve(quads * 4);
        self.triangles.reserve(quads * 6);
    }

    /// Appends a quad given in bottom-left, top-left, top-right, bottom-right
    /// order and returns the index of its first vertex.
    pub fn add_quad(&mut self, quad: [TextVertex; 4]) -> usize {
        let first = self.vertices.len();
        self.vertices.extend_from_slice(&quad);
        self.normals.extend_from_slice(&[QUAD_NORMAL; 4]);
        self.tangents.extend_from_slice(&[QUAD_TANGENT; 4]);

        let i = first as u32;
        self.triangles
            .extend_from_slice(&[i, i + 1, i + 2, i + 2, i + 3, i]);
        first
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// A material in use by the current text, with the asset it samples.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialReference {
    pub index: usize,
    pub font_asset: Option<FontAssetId>,
    pub sprite_asset: Option<SpriteAssetId>,
    pub material: MaterialId,
    pub is_default: bool,
    pub is_fallback: bool,
    pub padding: f32,
    /// Characters drawn with this material in the final layout.
    pub reference_count: usize,
}

/// Assigns each material used by a text a stable index, which is also the
/// index of its sub-mesh.
#[derive(Clone, Debug, Default)]
pub struct MaterialReferenceManager {
    references: Vec<MaterialReference>,
    lookup: HashMap<MaterialId, usize, fxhash::FxBuildHasher>,
}

impl MaterialReferenceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.references.clear();
        self.lookup.clear();
    }

    /// Returns the index of `material`, adding a reference for it if needed.
    pub fn add_font_material(
        &mut self,
        material: MaterialId,
        font_asset: FontAssetId,
        padding: f32,
        is_fallback: bool,
    ) -> usize {
        self.add(MaterialReference {
            index: 0,
            font_asset: Some(font_asset),
            sprite_asset: None,
            material,
            is_default: self.references.is_empty(),
            is_fallback,
            padding,
            reference_count: 0,
        })
    }

    pub fn add_sprite_material(&mut self, material: MaterialId, sprite_asset: SpriteAssetId) -> usize {
        self.add(MaterialReference {
            index: 0,
            font_asset: None,
            sprite_asset: Some(sprite_asset),
            material,
            is_default: self.references.is_empty(),
            is_fallback: false,
            padding: 0.0,
            reference_count: 0,
        })
    }

    fn add(&mut self, mut reference: MaterialReference) -> usize {
        if let Some(&index) = self.lookup.get(&reference.material) {
            return index;
        }
        let index = self.references.len();
        reference.index = index;
        self.lookup.insert(reference.material, index);
        self.references.push(reference);
        index
    }

    pub fn get(&self, index: usize) -> Option<&MaterialReference> {
        self.references.get(index)
    }

    pub fn index_of(&self, material: MaterialId) -> Option<usize> {
        self.lookup.get(&material).copied()
    }

    pub fn reset_counts(&mut self) {
        for reference in &mut self.references {
            reference.reference_count = 0;
        }
    }

    pub fn increment(&mut self, index: usize) {
        if let Some(reference) = self.references.get_mut(index) {
            reference.reference_count += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaterialReference> {
        self.references.iter()
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quads_use_two_triangles() {
        let mut mesh = MeshInfo::new(None);
        assert_eq!(mesh.add_quad([TextVertex::default(); 4]), 0);
        assert_eq!(mesh.add_quad([TextVertex::default(); 4]), 4);
        assert_eq!(mesh.triangles[6..], [4, 5, 6, 6, 7, 4]);
        assert_eq!(mesh.normals.len(), 8);
        assert_eq!(mesh.quad_count(), 2);

        mesh.clear();
        assert!(mesh.is_empty());
        assert!(mesh.vertices.capacity() >= 8);
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<TextVertex>(), 40);
        let vertices = [TextVertex::default(); 2];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 80);
    }

    #[test]
    fn materials_are_deduplicated() {
        let mut manager = MaterialReferenceManager::new();
        let a = manager.add_font_material(MaterialId(0), FontAssetId(0), 5.0, false);
        let b = manager.add_sprite_material(MaterialId(1), SpriteAssetId(0));
        let again = manager.add_font_material(MaterialId(0), FontAssetId(0), 5.0, false);

        assert_eq!((a, b, again), (0, 1, 0));
        assert!(manager.get(0).unwrap().is_default);
        assert!(!manager.get(1).unwrap().is_default);

        manager.increment(1);
        manager.increment(1);
        assert_eq!(manager.get(1).unwrap().reference_count, 2);
        manager.reset_counts();
        assert_eq!(manager.get(1).unwrap().reference_count, 0);
    }
}

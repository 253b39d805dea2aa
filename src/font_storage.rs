use std::{collections::HashMap, path::PathBuf, sync::Arc};

use crate::{
    asset::{
        ColorGradient, FontAsset, FontAssetError, Material, MaterialSource, SpriteAsset,
    },
    glyph_id::{FontAssetId, MaterialId, SpriteAssetId},
};

/// Owns every font face, font asset, sprite asset and material the layout can
/// reference.
///
/// Raw faces are managed with `fontdb` and parsed lazily with `fontdue`; they
/// are only needed to sample new [`FontAsset`]s. Layout itself reads the
/// registered assets, which are addressed through the ids returned by the
/// `add_*` methods.
pub struct FontStorage {
    /// This is the font set that has been loaded by fontdb.
    font_db: fontdb::Database,
    /// This is the font that has been loaded by fontdue.
    /// Not all fonts in fontdb are necessarily loaded here.
    loaded_font: HashMap<fontdb::ID, Arc<fontdue::Font>, fxhash::FxBuildHasher>,

    font_assets: Vec<FontAsset>,
    font_asset_names: HashMap<String, FontAssetId, fxhash::FxBuildHasher>,
    sprite_assets: Vec<SpriteAsset>,
    sprite_asset_names: HashMap<String, SpriteAssetId, fxhash::FxBuildHasher>,
    materials: Vec<Material>,
    material_names: HashMap<String, MaterialId, fxhash::FxBuildHasher>,
    gradients: HashMap<String, ColorGradient, fxhash::FxBuildHasher>,

    /// Searched after an asset's own fallback chain.
    fallback_font_assets: Vec<FontAssetId>,
    default_sprite_asset: Option<SpriteAssetId>,
}

impl Default for FontStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FontStorage {
    /// Creates a new empty font storage.
    pub fn new() -> Self {
        Self {
            font_db: fontdb::Database::new(),
            loaded_font: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
            font_assets: Vec::new(),
            font_asset_names: HashMap::default(),
            sprite_assets: Vec::new(),
            sprite_asset_names: HashMap::default(),
            materials: Vec::new(),
            material_names: HashMap::default(),
            gradients: HashMap::default(),
            fallback_font_assets: Vec::new(),
            default_sprite_asset: None,
        }
    }
}

/// Loading fonts into fontdb and setting up fontdb.
impl FontStorage {
    /// Loads a font from binary data.
    pub fn load_font_binary(&mut self, data: impl Into<Vec<u8>>) {
        self.font_db.load_font_data(data.into());
    }

    /// Loads a font from a file path.
    pub fn load_font_file(&mut self, path: PathBuf) -> Result<(), std::io::Error> {
        self.font_db.load_font_file(path)
    }

    /// Loads all fonts from a directory.
    pub fn load_fonts_dir(&mut self, dir: PathBuf) {
        self.font_db.load_fonts_dir(dir)
    }

    /// Loads the system fonts.
    pub fn load_system_fonts(&mut self) {
        self.font_db.load_system_fonts();
    }

    /// Removes a face by ID.
    pub fn remove_face(&mut self, id: fontdb::ID) {
        self.font_db.remove_face(id);
        self.loaded_font.remove(&id);
    }

    /// Returns the number of loaded faces.
    pub fn face_count(&self) -> usize {
        self.font_db.len()
    }

    /// Queries for a font face matching the description.
    ///
    /// Returns the ID and the loaded font if found.
    pub fn query(&mut self, query: &fontdb::Query) -> Option<(fontdb::ID, Arc<fontdue::Font>)> {
        let id = self.font_db.query(query)?;
        self.font(id).map(|font| (id, font))
    }

    /// Retrieves a parsed font face by ID, loading it if necessary.
    pub fn font(&mut self, id: fontdb::ID) -> Option<Arc<fontdue::Font>> {
        use std::collections::hash_map::Entry;

        match self.loaded_font.entry(id) {
            Entry::Occupied(entry) => Some(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let font_result = self.font_db.with_face_data(id, |data, index| {
                    fontdue::Font::from_bytes(
                        data,
                        fontdue::FontSettings {
                            collection_index: index,
                            scale: 40.0,
                            load_substitutions: true,
                        },
                    )
                })?;

                match font_result {
                    Ok(font) => {
                        let r: &mut Arc<fontdue::Font> = entry.insert(Arc::new(font));
                        Some(Arc::clone(r))
                    }
                    Err(e) => {
                        log::error!("Failed to load font (id: {:?}): {}", id, e);
                        None
                    }
                }
            }
        }
    }

    /// Returns an iterator over all available faces.
    pub fn faces(&self) -> impl Iterator<Item = &fontdb::FaceInfo> {
        self.font_db.faces()
    }
}

/// Sampling and registering assets.
impl FontStorage {
    /// Samples `characters` of the face `face` into a new font asset and
    /// registers it under `name`.
    pub fn create_font_asset(
        &mut self,
        name: impl Into<String>,
        face: fontdb::ID,
        point_size: f32,
        characters: impl IntoIterator<Item = char>,
        atlas_size: [u32; 2],
        atlas_padding: u32,
    ) -> Result<FontAssetId, FontAssetError> {
        if self.font_db.face(face).is_none() {
            return Err(FontAssetError::FaceNotFound(face));
        }
        let font = self
            .font(face)
            .ok_or(FontAssetError::Parse("fontdue rejected the face data"))?;

        let asset = FontAsset::from_fontdue(
            name,
            &font,
            point_size,
            characters,
            atlas_size[0],
            atlas_size[1],
            atlas_padding,
        )?;

        Ok(self.add_font_asset(asset))
    }

    /// Registers a font asset together with its default atlas material.
    pub fn add_font_asset(&mut self, mut asset: FontAsset) -> FontAssetId {
        let id = FontAssetId(self.font_assets.len() as u32);
        if asset.material.is_none() {
            let material = Material::new(
                format!("{} Atlas Material", asset.name),
                MaterialSource::Font(id),
                asset.atlas_padding,
            );
            asset.material = Some(self.add_material(material));
        }
        if self.font_asset_names.insert(asset.name.clone(), id).is_some() {
            log::warn!("font asset name '{}' registered twice, the newest one wins", asset.name);
        }
        self.font_assets.push(asset);
        id
    }

    /// Registers a sprite asset together with its default material.
    pub fn add_sprite_asset(&mut self, mut asset: SpriteAsset) -> SpriteAssetId {
        let id = SpriteAssetId(self.sprite_assets.len() as u32);
        if asset.material.is_none() {
            let material = Material::new(
                format!("{} Sprite Material", asset.name),
                MaterialSource::Sprite(id),
                0.0,
            );
            asset.material = Some(self.add_material(material));
        }
        self.sprite_asset_names.insert(asset.name.clone(), id);
        self.sprite_assets.push(asset);
        id
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len() as u32);
        self.material_names.insert(material.name.clone(), id);
        self.materials.push(material);
        id
    }

    pub fn add_gradient(&mut self, name: impl Into<String>, gradient: ColorGradient) {
        self.gradients.insert(name.into(), gradient);
    }

    /// Sets the font assets searched after an asset's own fallback chain.
    pub fn set_fallback_font_assets(&mut self, fallbacks: Vec<FontAssetId>) {
        self.fallback_font_assets = fallbacks;
    }

    /// Sets the sprite asset used by `<sprite=N>` without an asset name and for
    /// code points no font covers.
    pub fn set_default_sprite_asset(&mut self, id: Option<SpriteAssetId>) {
        self.default_sprite_asset = id;
    }
}

/// Asset lookups used during layout.
impl FontStorage {
    pub fn font_asset(&self, id: FontAssetId) -> Option<&FontAsset> {
        self.font_assets.get(id.0 as usize)
    }

    pub fn font_asset_mut(&mut self, id: FontAssetId) -> Option<&mut FontAsset> {
        self.font_assets.get_mut(id.0 as usize)
    }

    pub fn font_asset_by_name(&self, name: &str) -> Option<FontAssetId> {
        self.font_asset_names.get(name).copied()
    }

    pub fn sprite_asset(&self, id: SpriteAssetId) -> Option<&SpriteAsset> {
        self.sprite_assets.get(id.0 as usize)
    }

    pub fn sprite_asset_mut(&mut self, id: SpriteAssetId) -> Option<&mut SpriteAsset> {
        self.sprite_assets.get_mut(id.0 as usize)
    }

    pub fn sprite_asset_by_name(&self, name: &str) -> Option<SpriteAssetId> {
        self.sprite_asset_names.get(name).copied()
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0 as usize)
    }

    pub fn material_by_name(&self, name: &str) -> Option<MaterialId> {
        self.material_names.get(name).copied()
    }

    pub fn gradient(&self, name: &str) -> Option<&ColorGradient> {
        self.gradients.get(name)
    }

    pub fn fallback_font_assets(&self) -> &[FontAssetId] {
        &self.fallback_font_assets
    }

    pub fn default_sprite_asset(&self) -> Option<SpriteAssetId> {
        self.default_sprite_asset
    }

    pub fn font_asset_count(&self) -> usize {
        self.font_assets.len()
    }
}

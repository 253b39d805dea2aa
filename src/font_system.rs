use std::{path::PathBuf, sync::Arc};

use parking_lot::{Mutex, RwLock};

use crate::{
    asset::{ColorGradient, FontAsset, FontAssetError, Material, SpriteAsset},
    font_storage::FontStorage,
    glyph_id::{FontAssetId, MaterialId, SpriteAssetId},
    text::{LineBreakingRules, TextComponent},
};

/// High-level entry point for the text mesh system.
///
/// This struct owns the [`FontStorage`] and the process wide
/// [`LineBreakingRules`] and lays out [`TextComponent`]s against them.
///
/// Use `Mutex` and `RwLock` to allow shared access, which is common in UI frameworks.
/// The rules are only read during layout, so several threads may generate
/// meshes as long as they take turns on the storage.
///
/// The fields are public to allow direct access to the underlying storage when necessary
/// (e.g. to register many assets under a single lock).
pub struct FontSystem {
    /// The underlying font storage.
    pub font_storage: Mutex<FontStorage>,
    /// Kinsoku rules used for CJK line breaking.
    pub line_breaking_rules: RwLock<LineBreakingRules>,
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FontSystem {
    /// Creates a new font system with empty storage and the default line breaking rules.
    pub fn new() -> Self {
        Self {
            font_storage: Mutex::new(FontStorage::new()),
            line_breaking_rules: RwLock::new(LineBreakingRules::default()),
        }
    }

    /// Replaces the leading and following character sets used for CJK line breaking.
    pub fn set_line_breaking_rules(&self, rules: LineBreakingRules) {
        *self.line_breaking_rules.write() = rules;
    }
}

/// font storage initialization
impl FontSystem {
    /// Loads the system fonts into the storage.
    pub fn load_system_fonts(&self) {
        self.font_storage.lock().load_system_fonts();
    }

    /// Loads a font from binary data.
    pub fn load_font_binary(&self, data: impl Into<Vec<u8>>) {
        self.font_storage.lock().load_font_binary(data);
    }

    /// Loads a font from a file path.
    pub fn load_font_file(&self, path: PathBuf) -> Result<(), std::io::Error> {
        self.font_storage.lock().load_font_file(path)
    }

    /// Loads all fonts from a directory.
    pub fn load_fonts_dir(&self, dir: PathBuf) {
        self.font_storage.lock().load_fonts_dir(dir)
    }

    /// Removes a face by ID.
    pub fn remove_face(&self, id: fontdb::ID) {
        self.font_storage.lock().remove_face(id);
    }

    /// Returns the number of loaded faces.
    pub fn face_count(&self) -> usize {
        self.font_storage.lock().face_count()
    }
}

/// font querying
impl FontSystem {
    /// Queries for a font matching the description.
    pub fn query(&self, query: &fontdb::Query) -> Option<(fontdb::ID, Arc<fontdue::Font>)> {
        self.font_storage.lock().query(query)
    }

    /// Retrieves a loaded font by ID.
    pub fn font(&self, id: fontdb::ID) -> Option<Arc<fontdue::Font>> {
        self.font_storage.lock().font(id)
    }

    /// Returns a vec over all available faces.
    ///
    /// # Performance
    /// This method clones all face info to avoid holding a lock on the storage.
    /// If you need to iterate without allocation, lock `font_storage` directly.
    pub fn faces(&self) -> Vec<fontdb::FaceInfo> {
        self.font_storage.lock().faces().cloned().collect()
    }
}

/// asset registration
impl FontSystem {
    /// Samples `characters` of `face` into a new font asset.
    pub fn create_font_asset(
        &self,
        name: impl Into<String>,
        face: fontdb::ID,
        point_size: f32,
        characters: impl IntoIterator<Item = char>,
        atlas_size: [u32; 2],
        atlas_padding: u32,
    ) -> Result<FontAssetId, FontAssetError> {
        self.font_storage.lock().create_font_asset(
            name,
            face,
            point_size,
            characters,
            atlas_size,
            atlas_padding,
        )
    }

    pub fn add_font_asset(&self, asset: FontAsset) -> FontAssetId {
        self.font_storage.lock().add_font_asset(asset)
    }

    pub fn add_sprite_asset(&self, asset: SpriteAsset) -> SpriteAssetId {
        self.font_storage.lock().add_sprite_asset(asset)
    }

    pub fn add_material(&self, material: Material) -> MaterialId {
        self.font_storage.lock().add_material(material)
    }

    pub fn add_gradient(&self, name: impl Into<String>, gradient: ColorGradient) {
        self.font_storage.lock().add_gradient(name, gradient);
    }

    pub fn set_fallback_font_assets(&self, fallbacks: Vec<FontAssetId>) {
        self.font_storage.lock().set_fallback_font_assets(fallbacks);
    }

    pub fn set_default_sprite_asset(&self, id: Option<SpriteAssetId>) {
        self.font_storage.lock().set_default_sprite_asset(id);
    }
}

/// text layout
impl FontSystem {
    /// Lays out `text` with the fonts in this system and rebuilds its meshes.
    ///
    /// The storage stays locked for the whole pass, including any linked
    /// overflow surfaces.
    pub fn generate_text_mesh(&self, text: &mut TextComponent) {
        let font_storage = self.font_storage.lock();
        let rules = self.line_breaking_rules.read();
        text.generate(&font_storage, &rules);
    }

    /// Width and height `text` needs when nothing constrains it.
    pub fn preferred_values(&self, text: &TextComponent) -> [f32; 2] {
        let font_storage = self.font_storage.lock();
        let rules = self.line_breaking_rules.read();
        text.preferred_values(&font_storage, &rules)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn system() -> (FontSystem, FontAssetId) {
        let (storage, font) = testing::storage();
        let system = FontSystem::new();
        *system.font_storage.lock() = storage;
        (system, font)
    }

    #[test]
    fn generates_through_the_shared_storage() {
        let (system, font) = system();
        let mut text = TextComponent::new("Hello", testing::config(font));
        system.generate_text_mesh(&mut text);
        assert_eq!(text.info().character_count(), 5);
        assert_eq!(text.meshes()[0].vertices.len(), 20);
    }

    #[test]
    fn line_breaking_rules_can_be_replaced() {
        let (system, _) = system();
        let (kana, comma) = ('あ' as u32, Some('、' as u32));
        assert!(!system.line_breaking_rules.read().allows_cjk_break(kana, comma));
        system.set_line_breaking_rules(LineBreakingRules::new("", ""));
        assert!(system.line_breaking_rules.read().allows_cjk_break(kana, comma));
    }

    #[test]
    fn preferred_values_match_the_component() {
        let (system, font) = system();
        let text = TextComponent::new("abc", testing::config(font));
        let [width, _] = system.preferred_values(&text);
        assert!((width - testing::advance(font, &system.font_storage.lock(), 36.0) * 3.0).abs() < 1e-3);
    }
}

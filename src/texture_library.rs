use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::error::EngineError;
use crate::tile::TileKind;
use crate::tile_registry::TileRegistry;

/// Turns a texture path into whatever the rendering backend draws with.
pub trait TextureLoader {
    type Texture;

    fn load(&mut self, path: &Path) -> Result<Self::Texture, EngineError>;
}

/// Where the draw pass puts tiles. Coordinates are in pixels, `size` is the zoom level.
pub trait DrawSurface<T> {
    /// Width and height of the drawable area in pixels.
    fn size(&self) -> (i32, i32);

    /// Called once at the start of every draw pass.
    fn clear(&mut self) {}

    fn draw_tile(&mut self, texture: &T, x: i32, y: i32, size: i32);
}

/// Textures of every tile kind, keyed by kind name.
pub struct TextureLibrary<T> {
    base_path: PathBuf,
    textures: HashMap<String, Arc<T>>,
}

impl<T> TextureLibrary<T> {
    pub fn new(base_path: &Path) -> Self {
        Self {
            base_path: base_path.to_owned(),
            textures: HashMap::new(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// The kind's own directory if it overrides one, otherwise the base path, joined
    /// with the kind's file name.
    pub fn path_for(&self, kind: &TileKind) -> PathBuf {
        kind.texture_dir_override()
            .unwrap_or(self.base_path.as_path())
            .join(kind.texture_file_name())
    }

    pub fn add_texture_for_tile<L>(&mut self, kind: &TileKind, loader: &mut L) -> Result<(), EngineError>
    where
        L: TextureLoader<Texture = T>,
    {
        if self.textures.contains_key(kind.name()) {
            return Err(EngineError::DuplicateTexture(kind.name().to_string()));
        }

        let path = self.path_for(kind);
        let texture = loader.load(&path)?;
        log::debug!("loaded texture {} for tile {}", path.display(), kind.name());
        self.textures.insert(kind.name().to_string(), Arc::new(texture));
        Ok(())
    }

    /// Loads a texture for every registered kind except Empty, which is never drawn.
    pub fn add_textures_for_registry<L>(&mut self, registry: &TileRegistry, loader: &mut L) -> Result<(), EngineError>
    where
        L: TextureLoader<Texture = T>,
    {
        for (handle, kind) in registry.iter() {
            if handle.is_empty() || self.textures.contains_key(kind.name()) {
                continue;
            }
            self.add_texture_for_tile(kind, loader)?;
        }
        Ok(())
    }

    pub fn get_tile_texture(&self, kind: &TileKind) -> Result<&T, EngineError> {
        self.get(kind.name())
    }

    pub fn get(&self, name: &str) -> Result<&T, EngineError> {
        self.textures
            .get(name)
            .map(|texture| texture.as_ref())
            .ok_or_else(|| EngineError::TextureNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

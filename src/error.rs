use std::path::PathBuf;

use thiserror::Error;

use crate::tile::TileId;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("tile engine: the id ({id}) is already assigned to another tile ({existing}), ids cannot be reused")]
    DuplicateId { id: TileId, existing: String },

    #[error("tile engine: the name ({name}) is already assigned to another tile (id {existing}), names cannot be reused")]
    DuplicateName { name: String, existing: TileId },

    #[error("tile engine: the tile ({0}) cannot be added to the registry twice")]
    DuplicateRegistration(String),

    #[error("tile engine: tile id {0} was given an empty name")]
    EmptyName(TileId),

    #[error("tile engine: trying to access the unloaded chunk at ({chunk_x},{chunk_y}) for tile map \"{map}\"")]
    UnloadedChunkAccess {
        map: String,
        chunk_x: i32,
        chunk_y: i32,
    },

    #[error("tile engine: there is no loaded texture for the tile with name \"{0}\"")]
    TextureNotFound(String),

    #[error("tile engine: a texture for the tile with name \"{0}\" is already loaded")]
    DuplicateTexture(String),

    #[error("tile engine: failed to load texture {}: {reason}", path.display())]
    TextureLoad { path: PathBuf, reason: String },
}

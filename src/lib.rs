mod macros;

pub mod chunk;
pub mod error;
pub mod game;
pub mod generator;
pub mod simulation;
pub mod texture_library;
pub mod tile;
pub mod tile_map;
pub mod tile_registry;
pub mod time;

pub use chunk::{Chunk, CHUNK_SIZE};
pub use error::EngineError;
pub use game::{Game, GameConfig};
pub use generator::{EmptyGenerator, FullGenerator, OreVein, StandardGenerator, TerrainGenerator};
pub use texture_library::{DrawSurface, TextureLibrary, TextureLoader};
pub use tile::{TileHandle, TileId, TileKind, TileVariant};
pub use tile_map::{GravityDirection, TileMap, TileMapBuilder};
pub use tile_registry::TileRegistry;

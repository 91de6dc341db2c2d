use std::sync::Arc;

use crate::error::EngineError;
use crate::tile::TileHandle;

/// Side length of a chunk in tiles.
pub const CHUNK_SIZE: usize = 20;

// indexed [y][x]
type TileGrid = [[TileHandle; CHUNK_SIZE]; CHUNK_SIZE];

/// A 20 by 20 block of tiles that is loaded and unloaded as a unit.
///
/// Only a `TileMap` creates chunks. While unloaded the grid does not exist, and any
/// attempt to touch it is reported as `EngineError::UnloadedChunkAccess`.
#[derive(Debug, Clone)]
pub struct Chunk {
    tiles: Option<Box<TileGrid>>,
    chunk_x: i32,
    chunk_y: i32,
    map_name: Arc<str>,
}

impl Chunk {
    pub(crate) fn new(map_name: Arc<str>, chunk_x: i32, chunk_y: i32) -> Self {
        Self {
            tiles: Some(empty_grid()),
            chunk_x,
            chunk_y,
            map_name,
        }
    }

    pub fn chunk_x(&self) -> i32 {
        self.chunk_x
    }

    pub fn chunk_y(&self) -> i32 {
        self.chunk_y
    }

    pub fn is_loaded(&self) -> bool {
        self.tiles.is_some()
    }

    /// Bounds check in chunk-local coordinates. Checking an unloaded chunk is an error.
    pub fn is_in_range(&self, x: i32, y: i32) -> Result<bool, EngineError> {
        self.grid()?;
        Ok(in_bounds(x, y))
    }

    /// `Ok(None)` when `(x, y)` falls outside the chunk.
    pub fn get_tile_at(&self, x: i32, y: i32) -> Result<Option<TileHandle>, EngineError> {
        let grid = self.grid()?;
        if !in_bounds(x, y) {
            return Ok(None);
        }
        Ok(Some(grid[y as usize][x as usize]))
    }

    /// Returns whether the tile was inside the chunk and written.
    pub fn set_tile_at(&mut self, x: i32, y: i32, tile: TileHandle) -> Result<bool, EngineError> {
        if !self.is_in_range(x, y)? {
            return Ok(false);
        }
        if let Some(grid) = self.tiles.as_mut() {
            grid[y as usize][x as usize] = tile;
        }
        Ok(true)
    }

    /// Drops the tile grid. `save` is accepted for when chunks get persisted, it
    /// currently changes nothing.
    pub fn unload(&mut self, save: bool) -> bool {
        if !self.is_loaded() {
            return true;
        }

        log::debug!(
            "unloading chunk ({}, {}) of {} (save: {})",
            self.chunk_x,
            self.chunk_y,
            self.map_name,
            save
        );
        self.tiles = None;
        true
    }

    /// Brings the grid back. With nothing persisted yet the chunk is regenerated
    /// Empty; the return value is meant to tell a restore from a regeneration.
    pub fn load(&mut self) -> bool {
        if self.is_loaded() {
            return true;
        }

        log::debug!(
            "loading chunk ({}, {}) of {}",
            self.chunk_x,
            self.chunk_y,
            self.map_name
        );
        self.tiles = Some(empty_grid());
        true
    }

    fn grid(&self) -> Result<&TileGrid, EngineError> {
        self.tiles
            .as_deref()
            .ok_or_else(|| EngineError::UnloadedChunkAccess {
                map: self.map_name.to_string(),
                chunk_x: self.chunk_x,
                chunk_y: self.chunk_y,
            })
    }
}

fn in_bounds(x: i32, y: i32) -> bool {
    let size = CHUNK_SIZE as i32;
    (0..size).contains(&x) && (0..size).contains(&y)
}

fn empty_grid() -> Box<TileGrid> {
    Box::new([[TileHandle::EMPTY; CHUNK_SIZE]; CHUNK_SIZE])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk() -> Chunk {
        Chunk::new(Arc::from("test"), 2, 3)
    }

    #[test]
    fn new_chunk_is_loaded_and_empty() {
        let chunk = chunk();
        assert!(chunk.is_loaded());
        assert_eq!((chunk.chunk_x(), chunk.chunk_y()), (2, 3));
        for y in 0..CHUNK_SIZE as i32 {
            for x in 0..CHUNK_SIZE as i32 {
                assert_eq!(chunk.get_tile_at(x, y).unwrap(), Some(TileHandle::EMPTY));
            }
        }
    }

    #[test]
    fn out_of_bounds_access() {
        let mut chunk = chunk();
        assert_eq!(chunk.get_tile_at(20, 0).unwrap(), None);
        assert_eq!(chunk.get_tile_at(0, -1).unwrap(), None);
        assert!(!chunk.set_tile_at(-1, 5, TileHandle(1)).unwrap());
        assert!(!chunk.set_tile_at(5, 20, TileHandle(1)).unwrap());
        assert!(chunk.is_in_range(19, 19).unwrap());
        assert!(!chunk.is_in_range(19, 20).unwrap());
    }

    #[test]
    fn set_then_get() {
        let mut chunk = chunk();
        assert!(chunk.set_tile_at(4, 7, TileHandle(3)).unwrap());
        assert_eq!(chunk.get_tile_at(4, 7).unwrap(), Some(TileHandle(3)));
        assert_eq!(chunk.get_tile_at(7, 4).unwrap(), Some(TileHandle::EMPTY));
    }

    #[test]
    fn unloaded_access_fails_loudly() {
        let mut chunk = chunk();
        assert!(chunk.unload(false));
        assert!(!chunk.is_loaded());

        let err = chunk.is_in_range(0, 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "tile engine: trying to access the unloaded chunk at (2,3) for tile map \"test\""
        );
        assert!(chunk.get_tile_at(0, 0).is_err());
        assert!(chunk.set_tile_at(0, 0, TileHandle(1)).is_err());
    }

    #[test]
    fn unload_then_load_resets_to_empty() {
        let mut chunk = chunk();
        chunk.set_tile_at(1, 1, TileHandle(5)).unwrap();

        assert!(chunk.unload(false));
        assert!(chunk.unload(false));
        assert!(chunk.load());
        assert!(chunk.load());

        assert!(chunk.is_loaded());
        for y in 0..CHUNK_SIZE as i32 {
            for x in 0..CHUNK_SIZE as i32 {
                assert_eq!(chunk.get_tile_at(x, y).unwrap(), Some(TileHandle::EMPTY));
            }
        }
    }
}

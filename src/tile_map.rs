use std::collections::HashSet;
use std::sync::Arc;

use nalgebra::Vector2;

use crate::chunk::{Chunk, CHUNK_SIZE};
use crate::error::EngineError;
use crate::generator::{EmptyGenerator, FullGenerator, TerrainGenerator};
use crate::macros::parallel_enum_values;
use crate::texture_library::{DrawSurface, TextureLibrary};
use crate::tile::TileHandle;
use crate::tile_registry::TileRegistry;

parallel_enum_values! {
    (
        GravityDirection,
        GRAVITY_OFFSETS,
        (i32, i32),
    )
    /// Towards the bottom of the screen.
    Down -> &(0, 1),
    /// Towards the top of the screen.
    Up -> &(0, -1),
    Right -> &(1, 0),
    Left -> &(-1, 0),
    /// Nothing falls.
    None -> &(0, 0),
}

impl GravityDirection {
    /// One step in the direction things fall.
    pub fn offset(self) -> Vector2<i32> {
        GRAVITY_OFFSETS
            .iter()
            .find(|(direction, _)| *direction == self)
            .map(|(_, offset)| Vector2::new(offset.0, offset.1))
            .unwrap_or_else(Vector2::zeros)
    }

    /// The two sideways steps, screen left (or up) first.
    pub fn lateral(self) -> [Vector2<i32>; 2] {
        let fall = self.offset();
        [
            Vector2::new(-fall.y.abs(), -fall.x.abs()),
            Vector2::new(fall.y.abs(), fall.x.abs()),
        ]
    }
}

impl Default for GravityDirection {
    fn default() -> Self {
        GravityDirection::Down
    }
}

pub struct TileMapBuilder {
    name: String,
    chunk_width: usize,
    chunk_height: usize,
    tile_gravity: GravityDirection,
    entity_gravity: GravityDirection,
    zoom_level: i32,
    load_radius: u32,
    chunk_loading_origin: Vector2<i32>,
}

impl TileMapBuilder {
    pub fn new(chunk_width: usize, chunk_height: usize) -> Self {
        Self {
            name: String::new(),
            chunk_width,
            chunk_height,
            tile_gravity: GravityDirection::Down,
            entity_gravity: GravityDirection::Down,
            zoom_level: 20,
            load_radius: 5,
            chunk_loading_origin: Vector2::zeros(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn tile_gravity(mut self, direction: GravityDirection) -> Self {
        self.tile_gravity = direction;
        self
    }

    pub fn entity_gravity(mut self, direction: GravityDirection) -> Self {
        self.entity_gravity = direction;
        self
    }

    pub fn zoom_level(mut self, zoom_level: i32) -> Self {
        self.zoom_level = zoom_level;
        self
    }

    pub fn load_radius(mut self, load_radius: u32) -> Self {
        self.load_radius = load_radius;
        self
    }

    pub fn chunk_loading_origin(mut self, x: i32, y: i32) -> Self {
        self.chunk_loading_origin = Vector2::new(x, y);
        self
    }

    /// Creates every chunk loaded and Empty, then runs `generator` over the map once.
    pub fn build<G>(self, generator: &G) -> Result<TileMap, EngineError>
    where
        G: TerrainGenerator + ?Sized,
    {
        let TileMapBuilder {
            name,
            chunk_width,
            chunk_height,
            tile_gravity,
            entity_gravity,
            zoom_level,
            load_radius,
            chunk_loading_origin,
        } = self;

        let name: Arc<str> = Arc::from(name);
        let chunks = chunk_grid(&name, chunk_width, chunk_height);

        let mut map = TileMap {
            name,
            chunks,
            chunk_width,
            chunk_height,
            tile_gravity,
            entity_gravity,
            zoom_level,
            load_radius,
            chunk_loading_origin,
            offset: Vector2::zeros(),
            update_list: Vec::new(),
            queued: HashSet::new(),
            drawable_chunks: Vec::new(),
            last_update_count: 0,
            last_draw_count: 0,
        };

        generator.generate(&mut map)?;
        log::debug!(
            "generated tile map \"{}\" with {}x{} chunks",
            map.name,
            chunk_width,
            chunk_height
        );
        Ok(map)
    }
}

/// The grid of chunks making up a world, plus everything needed to simulate and
/// draw it a frame at a time.
#[derive(Debug, Clone)]
pub struct TileMap {
    name: Arc<str>,
    // row by row, chunk (cx, cy) lives at cy * chunk_width + cx
    chunks: Vec<Chunk>,
    chunk_width: usize,
    chunk_height: usize,

    pub tile_gravity: GravityDirection,
    pub entity_gravity: GravityDirection,
    /// Width of a drawn tile in pixels.
    pub zoom_level: i32,
    /// Radius in chunks around the loading origin in which chunks stay loaded.
    pub load_radius: u32,
    /// Tile coordinate the load radius is measured from.
    pub chunk_loading_origin: Vector2<i32>,

    offset: Vector2<i32>,

    pub(crate) update_list: Vec<Vector2<i32>>,
    pub(crate) queued: HashSet<Vector2<i32>>,
    drawable_chunks: Vec<usize>,

    pub(crate) last_update_count: usize,
    last_draw_count: usize,
}

impl TileMap {
    pub fn new<G>(chunk_width: usize, chunk_height: usize, generator: &G) -> Result<Self, EngineError>
    where
        G: TerrainGenerator + ?Sized,
    {
        TileMapBuilder::new(chunk_width, chunk_height).build(generator)
    }

    pub fn empty(chunk_width: usize, chunk_height: usize) -> Result<Self, EngineError> {
        Self::new(chunk_width, chunk_height, &EmptyGenerator)
    }

    pub fn filled(chunk_width: usize, chunk_height: usize, tile: TileHandle) -> Result<Self, EngineError> {
        Self::new(chunk_width, chunk_height, &FullGenerator::new(tile))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width in tiles.
    pub fn width(&self) -> i32 {
        (self.chunk_width * CHUNK_SIZE) as i32
    }

    /// Height in tiles.
    pub fn height(&self) -> i32 {
        (self.chunk_height * CHUNK_SIZE) as i32
    }

    pub fn chunk_width(&self) -> usize {
        self.chunk_width
    }

    pub fn chunk_height(&self) -> usize {
        self.chunk_height
    }

    pub fn offset(&self) -> Vector2<i32> {
        self.offset
    }

    /// Number of tiles queued by the last `update`.
    pub fn last_update_count(&self) -> usize {
        self.last_update_count
    }

    /// Number of tiles handed to the surface by the last `draw`.
    pub fn last_draw_count(&self) -> usize {
        self.last_draw_count
    }

    /// Tile coordinates queued for the last update, in the order they were applied.
    pub fn update_list(&self) -> &[Vector2<i32>] {
        &self.update_list
    }

    pub fn is_in_range(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width() && y >= 0 && y < self.height()
    }

    /// Chunk holding tile `(x, y)`. Total, callers check `is_in_range` first.
    pub fn chunk_index_for(x: i32, y: i32) -> Vector2<i32> {
        let size = CHUNK_SIZE as i32;
        Vector2::new(x.div_euclid(size), y.div_euclid(size))
    }

    /// Position of tile `(x, y)` inside its chunk.
    pub fn local_offset_for(x: i32, y: i32) -> Vector2<i32> {
        let size = CHUNK_SIZE as i32;
        Vector2::new(x.rem_euclid(size), y.rem_euclid(size))
    }

    pub fn chunk(&self, chunk_x: i32, chunk_y: i32) -> Option<&Chunk> {
        self.chunk_slot(chunk_x, chunk_y).map(|i| &self.chunks[i])
    }

    pub fn chunk_mut(&mut self, chunk_x: i32, chunk_y: i32) -> Option<&mut Chunk> {
        self.chunk_slot(chunk_x, chunk_y).map(move |i| &mut self.chunks[i])
    }

    /// All chunks, top row first.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// `Ok(None)` outside the map; an error if the owning chunk is unloaded.
    pub fn get_tile_at(&self, x: i32, y: i32) -> Result<Option<TileHandle>, EngineError> {
        if !self.is_in_range(x, y) {
            return Ok(None);
        }

        let chunk = Self::chunk_index_for(x, y);
        let local = Self::local_offset_for(x, y);
        match self.chunk(chunk.x, chunk.y) {
            Some(chunk) => chunk.get_tile_at(local.x, local.y),
            None => Ok(None),
        }
    }

    /// Returns whether `(x, y)` was inside the map and changed.
    pub fn set_tile_at(&mut self, x: i32, y: i32, tile: TileHandle) -> Result<bool, EngineError> {
        if !self.is_in_range(x, y) {
            return Ok(false);
        }

        let chunk = Self::chunk_index_for(x, y);
        let local = Self::local_offset_for(x, y);
        match self.chunk_mut(chunk.x, chunk.y) {
            Some(chunk) => chunk.set_tile_at(local.x, local.y, tile),
            None => Ok(false),
        }
    }

    /// Sets every tile of `[x, x + width] x [y, y + height]`, both ends inclusive.
    ///
    /// Only reports whether the anchor `(x, y)` is on the map: a rectangle hanging
    /// off the edge is silently clipped and still returns `true`. Use `fill_rect` for
    /// an all-or-nothing fill.
    pub fn set_region(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        tile: TileHandle,
    ) -> Result<bool, EngineError> {
        // cells off the map are no-ops for set_tile_at, so only visit the clipped part
        let x_end = x.saturating_add(width).min(self.width() - 1);
        let y_end = y.saturating_add(height).min(self.height() - 1);
        for j in y.max(0)..=y_end {
            for i in x.max(0)..=x_end {
                self.set_tile_at(i, j, tile)?;
            }
        }

        Ok(self.is_in_range(x, y))
    }

    /// Sets every tile of the half-open rectangle `[x, x + width) x [y, y + height)`.
    ///
    /// Nothing is written unless the whole, non-empty rectangle is on the map.
    pub fn fill_rect(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        tile: TileHandle,
    ) -> Result<bool, EngineError> {
        if width <= 0 || height <= 0 {
            return Ok(false);
        }

        let x_last = x.saturating_add(width - 1);
        let y_last = y.saturating_add(height - 1);
        if !self.is_in_range(x, y) || !self.is_in_range(x_last, y_last) {
            return Ok(false);
        }

        for j in y..=y_last {
            for i in x..=x_last {
                self.set_tile_at(i, j, tile)?;
            }
        }
        Ok(true)
    }

    /// Loads every chunk within `load_radius` (Chebyshev distance, in chunks) of the
    /// chunk holding `chunk_loading_origin` and unloads the rest.
    pub fn update_load_window(&mut self) {
        let origin = Self::chunk_index_for(self.chunk_loading_origin.x, self.chunk_loading_origin.y);
        let radius = i64::from(self.load_radius);

        let (mut loaded, mut unloaded) = (0, 0);
        for chunk in &mut self.chunks {
            let dx = (i64::from(chunk.chunk_x()) - i64::from(origin.x)).abs();
            let dy = (i64::from(chunk.chunk_y()) - i64::from(origin.y)).abs();
            let inside = dx.max(dy) <= radius;

            if inside && !chunk.is_loaded() {
                chunk.load();
                loaded += 1;
            } else if !inside && chunk.is_loaded() {
                chunk.unload(true);
                unloaded += 1;
            }
        }

        if loaded + unloaded > 0 {
            log::debug!(
                "load window of \"{}\" around chunk ({}, {}): {} loaded, {} unloaded",
                self.name,
                origin.x,
                origin.y,
                loaded,
                unloaded
            );
        }
    }

    /// Scrolls the map by `(x, y)` pixels, keeping it on a screen of `screen` pixels.
    pub fn offset_map(&mut self, x: i32, y: i32, screen: (i32, i32)) {
        self.offset.x = self.offset.x.saturating_add(x);
        self.offset.y = self.offset.y.saturating_add(y);

        let min_x = screen.0.saturating_sub(self.width().saturating_mul(self.zoom_level));
        let min_y = screen.1.saturating_sub(self.height().saturating_mul(self.zoom_level));

        if self.offset.x > 0 {
            self.offset.x = 0;
        } else if self.offset.x < min_x {
            self.offset.x = min_x;
        }

        if self.offset.y > 0 {
            self.offset.y = 0;
        } else if self.offset.y < min_y {
            self.offset.y = min_y;
        }
    }

    /// Moves the map to an exact pixel offset, unclamped.
    pub fn offset_grid_to(&mut self, x: i32, y: i32) {
        self.offset = Vector2::new(x, y);
    }

    /// A copy of this map. Without tiles the copy keeps the size and settings but
    /// every chunk is loaded and Empty.
    pub fn duplicate(&self, with_tiles: bool) -> TileMap {
        let mut copy = self.clone();
        if !with_tiles {
            copy.chunks = chunk_grid(&self.name, self.chunk_width, self.chunk_height);
            copy.update_list.clear();
            copy.queued.clear();
            copy.drawable_chunks.clear();
        }
        copy
    }

    /// Loaded chunks picked as visible by the last `draw`.
    pub fn drawable_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.drawable_chunks.iter().map(|&i| &self.chunks[i])
    }

    /// Draws every non-Empty tile of the loaded, on-screen chunks. Tiles are not touched.
    pub fn draw<T, S>(
        &mut self,
        registry: &TileRegistry,
        textures: &TextureLibrary<T>,
        surface: &mut S,
    ) -> Result<(), EngineError>
    where
        S: DrawSurface<T>,
    {
        let screen = surface.size();
        self.update_chunks_to_draw(screen);
        surface.clear();

        let zoom = self.zoom_level;
        let size = CHUNK_SIZE as i32;
        let mut drawn = 0;

        for &index in &self.drawable_chunks {
            let chunk = &self.chunks[index];
            for local_y in 0..size {
                let py = (chunk.chunk_y() * size + local_y)
                    .saturating_mul(zoom)
                    .saturating_add(self.offset.y);
                if py.saturating_add(zoom) <= 0 || py >= screen.1 {
                    continue;
                }

                for local_x in 0..size {
                    let px = (chunk.chunk_x() * size + local_x)
                        .saturating_mul(zoom)
                        .saturating_add(self.offset.x);
                    if px.saturating_add(zoom) <= 0 || px >= screen.0 {
                        continue;
                    }

                    let tile = match chunk.get_tile_at(local_x, local_y)? {
                        Some(tile) if !tile.is_empty() => tile,
                        _ => continue,
                    };
                    let kind = match registry.get(tile) {
                        Some(kind) => kind,
                        None => {
                            log::warn!("tile handle {:?} is not in the registry", tile);
                            continue;
                        }
                    };

                    surface.draw_tile(textures.get_tile_texture(kind)?, px, py, zoom);
                    drawn += 1;
                }
            }
        }

        self.last_draw_count = drawn;
        Ok(())
    }

    fn update_chunks_to_draw(&mut self, screen: (i32, i32)) {
        self.drawable_chunks.clear();
        if self.zoom_level <= 0 || screen.0 <= 0 || screen.1 <= 0 {
            return;
        }

        let chunk_pixels = (CHUNK_SIZE as i32).saturating_mul(self.zoom_level);
        let first_x = self.offset.x.saturating_neg().div_euclid(chunk_pixels).max(0);
        let first_y = self.offset.y.saturating_neg().div_euclid(chunk_pixels).max(0);
        let last_x = (screen.0 - 1)
            .saturating_sub(self.offset.x)
            .div_euclid(chunk_pixels)
            .min(self.chunk_width as i32 - 1);
        let last_y = (screen.1 - 1)
            .saturating_sub(self.offset.y)
            .div_euclid(chunk_pixels)
            .min(self.chunk_height as i32 - 1);

        for chunk_y in first_y..=last_y {
            for chunk_x in first_x..=last_x {
                if let Some(index) = self.chunk_slot(chunk_x, chunk_y) {
                    if self.chunks[index].is_loaded() {
                        self.drawable_chunks.push(index);
                    }
                }
            }
        }
    }

    /// The tile at `pos` if it is on the map and its chunk is loaded.
    pub(crate) fn loaded_tile(&self, pos: Vector2<i32>) -> Option<TileHandle> {
        if !self.is_in_range(pos.x, pos.y) {
            return None;
        }

        let chunk = Self::chunk_index_for(pos.x, pos.y);
        let local = Self::local_offset_for(pos.x, pos.y);
        self.chunk(chunk.x, chunk.y)
            .filter(|chunk| chunk.is_loaded())?
            .get_tile_at(local.x, local.y)
            .ok()
            .flatten()
    }

    /// Whether `pos` is on the map, loaded and Empty.
    pub(crate) fn is_vacant(&self, pos: Vector2<i32>) -> bool {
        self.loaded_tile(pos) == Some(TileHandle::EMPTY)
    }

    fn chunk_slot(&self, chunk_x: i32, chunk_y: i32) -> Option<usize> {
        if chunk_x < 0 || chunk_y < 0 {
            return None;
        }
        let (chunk_x, chunk_y) = (chunk_x as usize, chunk_y as usize);
        if chunk_x >= self.chunk_width || chunk_y >= self.chunk_height {
            return None;
        }
        Some(chunk_y * self.chunk_width + chunk_x)
    }
}

fn chunk_grid(name: &Arc<str>, chunk_width: usize, chunk_height: usize) -> Vec<Chunk> {
    let mut chunks = Vec::with_capacity(chunk_width * chunk_height);
    for chunk_y in 0..chunk_height {
        for chunk_x in 0..chunk_width {
            chunks.push(Chunk::new(name.clone(), chunk_x as i32, chunk_y as i32));
        }
    }
    chunks
}

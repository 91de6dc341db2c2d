use noise::{NoiseFn, Perlin};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::EngineError;
use crate::tile::TileHandle;
use crate::tile_map::TileMap;

/// Fills a freshly built map. Runs exactly once, before the map is handed out.
pub trait TerrainGenerator {
    fn generate(&self, map: &mut TileMap) -> Result<(), EngineError>;
}

/// Leaves every tile Empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyGenerator;

impl TerrainGenerator for EmptyGenerator {
    fn generate(&self, _map: &mut TileMap) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Fills the whole map with one tile.
#[derive(Debug, Clone, Copy)]
pub struct FullGenerator {
    pub tile: TileHandle,
}

impl FullGenerator {
    pub fn new(tile: TileHandle) -> Self {
        Self { tile }
    }
}

impl TerrainGenerator for FullGenerator {
    fn generate(&self, map: &mut TileMap) -> Result<(), EngineError> {
        for y in 0..map.height() {
            for x in 0..map.width() {
                map.set_tile_at(x, y, self.tile)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OreVein {
    pub tile: TileHandle,
    /// Chance for a stone tile to be replaced by this ore.
    pub frequency: f64,
    /// Tiles below the surface before the ore starts to show up.
    pub min_depth: i32,
}

/// Side-on terrain: open sky, a noisy surface line, a layer of dirt and stone
/// below it with ores scattered through the stone.
///
/// With the default (all Empty) kinds it leaves the map Empty.
#[derive(Debug, Clone)]
pub struct StandardGenerator {
    pub seed: u64,
    pub dirt: TileHandle,
    pub stone: TileHandle,
    /// Average height of the surface as a fraction of the map height, from the top.
    pub surface_level: f64,
    /// How far in tiles the surface strays from its average.
    pub roughness: f64,
    pub dirt_depth: i32,
    pub ores: Vec<OreVein>,
}

impl StandardGenerator {
    pub fn new(seed: u64, dirt: TileHandle, stone: TileHandle) -> Self {
        Self {
            seed,
            dirt,
            stone,
            ..Self::default()
        }
    }

    pub fn with_ore(mut self, tile: TileHandle, frequency: f64, min_depth: i32) -> Self {
        self.ores.push(OreVein {
            tile,
            frequency,
            min_depth,
        });
        self
    }

    /// Row of the first solid tile in column `x`.
    pub fn surface_at(&self, perlin: &Perlin, x: i32, map_height: i32) -> i32 {
        let nx = x as f64 / 32.0;

        // Octave noise for a less regular skyline.
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        for _ in 0..4 {
            value += perlin.get([nx * frequency, 0.5]) * amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        let surface = map_height as f64 * self.surface_level + value * self.roughness;
        (surface.round() as i32).clamp(0, map_height)
    }

    fn stone_or_ore(&self, depth: i32, rng: &mut StdRng) -> TileHandle {
        for vein in &self.ores {
            if depth >= vein.min_depth && rng.gen_bool(vein.frequency.clamp(0.0, 1.0)) {
                return vein.tile;
            }
        }
        self.stone
    }
}

impl Default for StandardGenerator {
    fn default() -> Self {
        Self {
            seed: 0,
            dirt: TileHandle::EMPTY,
            stone: TileHandle::EMPTY,
            surface_level: 0.3,
            roughness: 6.0,
            dirt_depth: 4,
            ores: Vec::new(),
        }
    }
}

impl TerrainGenerator for StandardGenerator {
    fn generate(&self, map: &mut TileMap) -> Result<(), EngineError> {
        let perlin = Perlin::new(self.seed as u32);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let height = map.height();

        for x in 0..map.width() {
            let surface = self.surface_at(&perlin, x, height);
            for y in surface..height {
                let depth = y - surface;
                let tile = if depth < self.dirt_depth {
                    self.dirt
                } else {
                    self.stone_or_ore(depth, &mut rng)
                };
                map.set_tile_at(x, y, tile)?;
            }
        }

        Ok(())
    }
}

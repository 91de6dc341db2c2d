use nalgebra::Vector2;

use crate::chunk::CHUNK_SIZE;
use crate::error::EngineError;
use crate::tile::TileHandle;
use crate::tile_map::TileMap;
use crate::tile_registry::TileRegistry;

impl TileMap {
    /// One simulation tick: refresh the load window, queue the tiles that need an
    /// update and apply the tile rules to them in queue order.
    ///
    /// Rules act on the map in place, so a tile moved by an earlier entry is seen at
    /// its new position by later entries. Each queued coordinate is re-read before
    /// its rules run.
    pub fn update(&mut self, registry: &TileRegistry) -> Result<(), EngineError> {
        self.update_load_window();
        self.build_update_list(registry)?;

        let pending = std::mem::take(&mut self.update_list);
        for &pos in &pending {
            let tile = match self.loaded_tile(pos) {
                Some(tile) if !tile.is_empty() => tile,
                _ => continue,
            };
            let (falls, flows) = match registry.get(tile) {
                Some(kind) => (kind.has_gravity, kind.is_liquid()),
                None => continue,
            };

            if falls {
                self.update_gravity(pos)?;
            }
            if flows {
                self.update_liquid(pos, registry)?;
            }
        }
        self.update_list = pending;

        log::trace!(
            "updated {} tiles of \"{}\"",
            self.update_list.len(),
            self.name()
        );
        Ok(())
    }

    /// Clears the previous update list and compiles a new one from every loaded chunk.
    ///
    /// A tile is queued when it has gravity and the cell it would fall into is Empty,
    /// or when its kind always updates. When the neighbouring chunk in the gravity
    /// direction is unloaded, the edge of the chunk facing it is skipped.
    pub(crate) fn build_update_list(&mut self, registry: &TileRegistry) -> Result<(), EngineError> {
        self.update_list.clear();
        self.queued.clear();
        self.last_update_count = 0;

        let fall = self.tile_gravity.offset();
        let size = CHUNK_SIZE as i32;

        for chunk_y in 0..self.chunk_height() as i32 {
            for chunk_x in 0..self.chunk_width() as i32 {
                if !self.chunk(chunk_x, chunk_y).map_or(false, |c| c.is_loaded()) {
                    continue;
                }

                // skip the edge row/column that would fall into an unloaded chunk
                let neighbour_unloaded = fall != Vector2::zeros()
                    && self
                        .chunk(chunk_x + fall.x, chunk_y + fall.y)
                        .map_or(false, |c| !c.is_loaded());
                let (mut xs, mut ys) = (0..size, 0..size);
                if neighbour_unloaded {
                    match (fall.x, fall.y) {
                        (0, 1) => ys = 0..size - 1,
                        (0, -1) => ys = 1..size,
                        (1, 0) => xs = 0..size - 1,
                        (-1, 0) => xs = 1..size,
                        _ => {}
                    }
                }

                for local_y in ys {
                    for local_x in xs.clone() {
                        let pos = Vector2::new(chunk_x * size + local_x, chunk_y * size + local_y);
                        let tile = match self.get_tile_at(pos.x, pos.y)? {
                            Some(tile) if !tile.is_empty() => tile,
                            _ => continue,
                        };
                        let kind = match registry.get(tile) {
                            Some(kind) => kind,
                            None => continue,
                        };

                        let falls = kind.has_gravity
                            && fall != Vector2::zeros()
                            && self.is_vacant(pos + fall);
                        if falls || kind.always_update {
                            self.mark_needs_update(pos);
                        }
                    }
                }
            }
        }

        self.last_update_count = self.update_list.len();
        Ok(())
    }

    /// Queues `pos` unless it is already queued this frame.
    fn mark_needs_update(&mut self, pos: Vector2<i32>) {
        if self.queued.insert(pos) {
            self.update_list.push(pos);
        }
    }

    /// Moves the tile at `pos` one cell in the gravity direction if that cell is Empty.
    fn update_gravity(&mut self, pos: Vector2<i32>) -> Result<(), EngineError> {
        let fall = self.tile_gravity.offset();
        if fall == Vector2::zeros() {
            return Ok(());
        }

        let target = pos + fall;
        if self.is_vacant(target) {
            self.move_tile(pos, target)?;
        }
        Ok(())
    }

    /// Lets a resting liquid run one cell sideways.
    ///
    /// A spot it can fall from wins first. Failing that, a liquid resting on more
    /// liquid moves over the surface toward the nearest gap in the layer below it,
    /// so stacks level out while a full layer stays still. Left (or up, for sideways
    /// gravity) is tried before right. The liquid only ever swaps places with Empty,
    /// so the amount of liquid on the map never changes.
    fn update_liquid(&mut self, pos: Vector2<i32>, registry: &TileRegistry) -> Result<(), EngineError> {
        let fall = self.tile_gravity.offset();
        if fall == Vector2::zeros() {
            return Ok(());
        }

        // gravity may already have moved it this frame
        match self.loaded_tile(pos) {
            Some(tile) if !tile.is_empty() => {}
            _ => return Ok(()),
        }

        // still falling, that is the gravity rule's job
        if self.is_vacant(pos + fall) {
            return Ok(());
        }

        let sides = self.tile_gravity.lateral();
        for side in sides {
            let target = pos + side;
            if self.is_vacant(target) && self.is_vacant(target + fall) {
                return self.move_tile(pos, target);
            }
        }

        if !self.is_liquid_at(pos + fall, registry) {
            return Ok(());
        }
        for side in sides {
            let target = pos + side;
            if self.is_vacant(target) && self.gap_below(target, side, registry) {
                return self.move_tile(pos, target);
            }
        }
        Ok(())
    }

    /// Walks the layer under `pos` in direction `side` across liquid and reports
    /// whether it ends in an Empty cell.
    fn gap_below(&self, pos: Vector2<i32>, side: Vector2<i32>, registry: &TileRegistry) -> bool {
        let mut cell = pos + self.tile_gravity.offset();
        while self.is_liquid_at(cell, registry) {
            cell += side;
        }
        self.is_vacant(cell)
    }

    fn is_liquid_at(&self, pos: Vector2<i32>, registry: &TileRegistry) -> bool {
        self.loaded_tile(pos)
            .and_then(|tile| registry.get(tile))
            .map_or(false, |kind| kind.is_liquid())
    }

    fn move_tile(&mut self, from: Vector2<i32>, to: Vector2<i32>) -> Result<(), EngineError> {
        let tile = self.get_tile_at(from.x, from.y)?.unwrap_or(TileHandle::EMPTY);
        self.set_tile_at(to.x, to.y, tile)?;
        self.set_tile_at(from.x, from.y, TileHandle::EMPTY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::EmptyGenerator;
    use crate::tile::TileKind;
    use crate::tile_map::{GravityDirection, TileMapBuilder};

    struct World {
        registry: TileRegistry,
        stone: TileHandle,
        sand: TileHandle,
        water: TileHandle,
        pump: TileHandle,
    }

    fn world() -> World {
        let mut registry = TileRegistry::new();
        let stone = registry.register(TileKind::new(1, "Stone")).unwrap();
        let sand = registry
            .register(TileKind::new(2, "Sand").gravity(true))
            .unwrap();
        let water = registry.register(TileKind::liquid(3, "Water")).unwrap();
        let pump = registry
            .register(TileKind::new(4, "Pump").gravity(true).always_update(true))
            .unwrap();
        World {
            registry,
            stone,
            sand,
            water,
            pump,
        }
    }

    fn tile(map: &TileMap, x: i32, y: i32) -> TileHandle {
        map.get_tile_at(x, y).unwrap().unwrap()
    }

    fn count(map: &TileMap, wanted: TileHandle) -> usize {
        let mut n = 0;
        for y in 0..map.height() {
            for x in 0..map.width() {
                if map.get_tile_at(x, y).ok().flatten() == Some(wanted) {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn gravity_moves_one_cell_per_tick() {
        let w = world();
        let mut map = TileMap::empty(1, 1).unwrap();
        map.set_tile_at(5, 5, w.sand).unwrap();

        map.update(&w.registry).unwrap();
        assert_eq!(tile(&map, 5, 5), TileHandle::EMPTY);
        assert_eq!(tile(&map, 5, 6), w.sand);
        assert_eq!(map.last_update_count(), 1);

        map.update(&w.registry).unwrap();
        assert_eq!(tile(&map, 5, 6), TileHandle::EMPTY);
        assert_eq!(tile(&map, 5, 7), w.sand);
        assert_eq!(tile(&map, 5, 8), TileHandle::EMPTY);
    }

    #[test]
    fn gravity_stops_on_solid_ground_and_map_edge() {
        let w = world();
        let mut map = TileMap::empty(1, 1).unwrap();
        map.set_tile_at(2, 18, w.sand).unwrap();
        map.set_tile_at(8, 4, w.sand).unwrap();
        map.set_tile_at(8, 5, w.stone).unwrap();

        map.update(&w.registry).unwrap();
        map.update(&w.registry).unwrap();

        assert_eq!(tile(&map, 2, 19), w.sand);
        assert_eq!(tile(&map, 8, 4), w.sand);
        assert_eq!(map.last_update_count(), 0);
    }

    #[test]
    fn gravity_crosses_into_loaded_chunk_below() {
        let w = world();
        let mut map = TileMap::empty(1, 2).unwrap();
        map.set_tile_at(3, 19, w.sand).unwrap();

        map.update(&w.registry).unwrap();
        assert_eq!(tile(&map, 3, 19), TileHandle::EMPTY);
        assert_eq!(tile(&map, 3, 20), w.sand);
    }

    #[test]
    fn bottom_row_is_skipped_above_an_unloaded_chunk() {
        let w = world();
        let mut map = TileMapBuilder::new(1, 2)
            .load_radius(0)
            .build(&EmptyGenerator)
            .unwrap();
        map.set_tile_at(5, 19, w.sand).unwrap();
        map.set_tile_at(6, 10, w.sand).unwrap();

        map.update(&w.registry).unwrap();

        assert!(!map.chunk(0, 1).unwrap().is_loaded());
        assert_eq!(tile(&map, 5, 19), w.sand);
        assert_eq!(tile(&map, 6, 11), w.sand);
        assert_eq!(map.update_list(), &[Vector2::new(6, 10)]);
    }

    #[test]
    fn unloaded_chunks_are_not_simulated() {
        let w = world();
        let mut map = TileMapBuilder::new(2, 1)
            .load_radius(0)
            .build(&EmptyGenerator)
            .unwrap();
        map.set_tile_at(25, 5, w.sand).unwrap();

        map.update(&w.registry).unwrap();
        assert!(!map.chunk(1, 0).unwrap().is_loaded());
        assert!(map.update_list().is_empty());
    }

    #[test]
    fn gravity_follows_direction() {
        let w = world();
        let mut map = TileMapBuilder::new(1, 1)
            .tile_gravity(GravityDirection::Left)
            .build(&EmptyGenerator)
            .unwrap();
        map.set_tile_at(5, 5, w.sand).unwrap();

        map.update(&w.registry).unwrap();
        assert_eq!(tile(&map, 4, 5), w.sand);

        map.tile_gravity = GravityDirection::None;
        map.update(&w.registry).unwrap();
        assert_eq!(tile(&map, 4, 5), w.sand);
        assert!(map.update_list().is_empty());
    }

    #[test]
    fn candidates_are_queued_in_scan_order_without_duplicates() {
        let w = world();
        let mut map = TileMap::empty(2, 1).unwrap();
        map.set_tile_at(30, 2, w.sand).unwrap();
        map.set_tile_at(4, 9, w.sand).unwrap();
        map.set_tile_at(1, 2, w.pump).unwrap();
        map.set_tile_at(6, 2, w.stone).unwrap();

        map.build_update_list(&w.registry).unwrap();
        assert_eq!(
            map.update_list(),
            &[Vector2::new(1, 2), Vector2::new(4, 9), Vector2::new(30, 2)]
        );
    }

    #[test]
    fn earlier_candidates_act_before_later_ones_move() {
        // The pump is queued before the sand under it, so it still sees the sand and
        // stays put while the sand falls away.
        let w = world();
        let mut map = TileMap::empty(1, 1).unwrap();
        map.set_tile_at(5, 5, w.pump).unwrap();
        map.set_tile_at(5, 6, w.sand).unwrap();

        map.update(&w.registry).unwrap();
        assert_eq!(map.update_list(), &[Vector2::new(5, 5), Vector2::new(5, 6)]);
        assert_eq!(tile(&map, 5, 5), w.pump);
        assert_eq!(tile(&map, 5, 6), TileHandle::EMPTY);
        assert_eq!(tile(&map, 5, 7), w.sand);
    }

    #[test]
    fn later_candidates_see_earlier_moves() {
        // Sand falling in row 4 lands next to the water before the water is updated,
        // so the water has to go right instead of left.
        let w = world();
        let mut map = TileMap::empty(1, 1).unwrap();
        map.set_tile_at(5, 4, w.sand).unwrap();
        map.set_tile_at(6, 5, w.water).unwrap();
        map.set_tile_at(6, 6, w.stone).unwrap();

        map.update(&w.registry).unwrap();
        assert_eq!(tile(&map, 5, 5), w.sand);
        assert_eq!(tile(&map, 6, 5), TileHandle::EMPTY);
        assert_eq!(tile(&map, 7, 5), w.water);
    }

    #[test]
    fn liquid_prefers_left() {
        let w = world();
        let mut map = TileMap::empty(1, 1).unwrap();
        map.set_tile_at(6, 5, w.water).unwrap();
        map.set_tile_at(6, 6, w.stone).unwrap();

        map.update(&w.registry).unwrap();
        assert_eq!(tile(&map, 5, 5), w.water);
        assert_eq!(tile(&map, 6, 5), TileHandle::EMPTY);
    }

    #[test]
    fn single_liquid_rests_on_flat_ground() {
        let w = world();
        let mut map = TileMap::empty(1, 1).unwrap();
        map.set_tile_at(10, 19, w.water).unwrap();

        for _ in 0..5 {
            map.update(&w.registry).unwrap();
        }
        assert_eq!(tile(&map, 10, 19), w.water);
    }

    #[test]
    fn stacked_liquid_spreads_over_flat_ground() {
        let w = world();
        let mut map = TileMap::empty(1, 1).unwrap();
        map.set_tile_at(0, 18, w.water).unwrap();
        map.set_tile_at(0, 19, w.water).unwrap();
        map.set_tile_at(1, 19, w.water).unwrap();

        for _ in 0..20 {
            map.update(&w.registry).unwrap();
            assert_eq!(count(&map, w.water), 3);
        }

        for x in 0..3 {
            assert_eq!(tile(&map, x, 19), w.water, "column {}", x);
        }
        assert_eq!(tile(&map, 0, 18), TileHandle::EMPTY);
    }

    #[test]
    fn liquid_on_a_full_layer_stays_put() {
        let w = world();
        let mut map = TileMap::empty(1, 1).unwrap();
        map.fill_rect(0, 19, 20, 1, w.water).unwrap();
        map.set_tile_at(5, 18, w.water).unwrap();

        for _ in 0..10 {
            map.update(&w.registry).unwrap();
            assert_eq!(tile(&map, 5, 18), w.water);
        }
        assert_eq!(count(&map, w.water), 21);
    }

    #[test]
    fn liquid_column_levels_out_and_conserves_mass() {
        let w = world();
        let mut map = TileMap::empty(1, 1).unwrap();
        for y in 12..20 {
            map.set_tile_at(10, y, w.water).unwrap();
        }

        for _ in 0..60 {
            map.update(&w.registry).unwrap();
            assert_eq!(count(&map, w.water), 8);
        }

        // nothing stacked more than one above the floor once settled
        for x in 0..20 {
            assert_eq!(tile(&map, x, 17), TileHandle::EMPTY, "column {}", x);
        }
    }
}

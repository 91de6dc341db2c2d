use std::time::Duration;

use bevy_ecs::{
    schedule::{Schedule, Stage, SystemStage},
    system::{Res, ResMut},
    world::World,
};

use crate::{
    texture_library::{DrawSurface, TextureLibrary},
    tile_map::TileMap,
    tile_registry::TileRegistry,
    time::{update_criteria, TimeResource},
};

#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Length of one simulation tick.
    pub update_dt: Duration,
    /// Minimum time between two frames.
    pub frame_dt: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            update_dt: Duration::from_secs_f64(1.0 / 60.0),
            frame_dt: Duration::from_secs_f64(1.0 / 60.0),
        }
    }
}

pub fn tile_update(mut map: ResMut<TileMap>, registry: Res<TileRegistry>) {
    if let Err(e) = map.update(&*registry) {
        log::error!("failed to update tile map \"{}\": {}", map.name(), e);
    }
}

pub fn tile_draw<T, S>(
    mut map: ResMut<TileMap>,
    registry: Res<TileRegistry>,
    textures: Res<TextureLibrary<T>>,
    mut surface: ResMut<S>,
) where
    T: Send + Sync + 'static,
    S: DrawSurface<T> + Send + Sync + 'static,
{
    if let Err(e) = map.draw(&*registry, &*textures, &mut *surface) {
        log::error!("failed to draw tile map \"{}\": {}", map.name(), e);
    }
}

/// Drives a tile map a frame at a time: every frame runs the banked fixed-step
/// updates first and then one draw.
pub struct Game {
    world: World,
    update_sch: Schedule,
    frame_sch: Schedule,
}

impl Game {
    pub fn new<T, S>(
        config: &GameConfig,
        registry: TileRegistry,
        map: TileMap,
        textures: TextureLibrary<T>,
        surface: S,
    ) -> Self
    where
        T: Send + Sync + 'static,
        S: DrawSurface<T> + Send + Sync + 'static,
    {
        let mut world = World::new();
        world.insert_resource(TimeResource::new(config.update_dt, config.frame_dt));
        world.insert_resource(registry);
        world.insert_resource(map);
        world.insert_resource(textures);
        world.insert_resource(surface);

        let mut update_sch = Schedule::default();
        let mut frame_sch = Schedule::default();

        update_sch.add_stage(
            "tiles",
            SystemStage::single_threaded()
                .with_run_criteria(update_criteria)
                .with_system(tile_update),
        );
        frame_sch.add_stage(
            "draw",
            SystemStage::single_threaded().with_system(tile_draw::<T, S>),
        );

        Self {
            world,
            update_sch,
            frame_sch,
        }
    }

    /// Runs a frame if the frame limiter lets one through. Returns whether it did.
    pub fn step(&mut self) -> bool {
        if !self.world.resource_mut::<TimeResource>().begin_frame() {
            return false;
        }
        self.run_frame();
        true
    }

    /// Simulates all banked time and draws once, ignoring the frame limiter.
    pub fn run_frame(&mut self) {
        self.update_sch.run(&mut self.world);
        self.frame_sch.run(&mut self.world);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

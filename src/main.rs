use std::path::Path;
use std::thread;
use std::time::Duration;

use log::LevelFilter;
use simple_logger::SimpleLogger;

use tile_engine::{
    DrawSurface, EngineError, Game, GameConfig, StandardGenerator, TextureLibrary, TextureLoader, TileKind,
    TileMapBuilder, TileRegistry,
};

const FRAMES: usize = 90;

/// Uses the first character of a texture's file name as the texture.
struct GlyphLoader;

impl TextureLoader for GlyphLoader {
    type Texture = char;

    fn load(&mut self, path: &Path) -> Result<char, EngineError> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.chars().next())
            .ok_or_else(|| EngineError::TextureLoad {
                path: path.to_owned(),
                reason: "no file name to take a glyph from".to_string(),
            })
    }
}

/// One character per pixel, so the map should be drawn at zoom level 1.
struct AsciiSurface {
    width: i32,
    height: i32,
    rows: Vec<Vec<char>>,
}

impl AsciiSurface {
    fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            rows: vec![vec![' '; width as usize]; height as usize],
        }
    }
}

impl DrawSurface<char> for AsciiSurface {
    fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        for row in self.rows.iter_mut() {
            row.fill(' ');
        }
    }

    fn draw_tile(&mut self, texture: &char, x: i32, y: i32, size: i32) {
        let (column, row) = (x / size.max(1), y / size.max(1));
        if let Some(cell) = self
            .rows
            .get_mut(row as usize)
            .and_then(|row| row.get_mut(column as usize))
        {
            *cell = *texture;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    SimpleLogger::new().with_level(LevelFilter::Info).env().init()?;

    let seed = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 7,
    };

    let mut registry = TileRegistry::new();
    let dirt = registry.register(TileKind::new(1, "Dirt").file_name("%"))?;
    let stone = registry.register(TileKind::new(2, "Stone").file_name("#"))?;
    let coal = registry.register(TileKind::new(3, "Coal").file_name("*"))?;
    let sand = registry.register(TileKind::new(4, "Sand").gravity(true).file_name(":"))?;
    let water = registry.register(TileKind::liquid(5, "Water").file_name("~"))?;

    let mut textures = TextureLibrary::new(Path::new("tiles"));
    textures.add_textures_for_registry(&registry, &mut GlyphLoader)?;

    let generator = StandardGenerator::new(seed, dirt, stone).with_ore(coal, 0.08, 3);
    let mut map = TileMapBuilder::new(4, 2)
        .name("demo")
        .zoom_level(1)
        .load_radius(3)
        .build(&generator)?;

    map.set_region(8, 0, 6, 3, sand)?;
    map.fill_rect(44, 0, 8, 4, water)?;

    log::info!(
        "running tile map \"{}\" ({}x{} tiles, seed {}) for {} frames",
        map.name(),
        map.width(),
        map.height(),
        seed,
        FRAMES
    );

    let surface = AsciiSurface::new(map.width(), map.height());
    let mut game = Game::new(&GameConfig::default(), registry, map, textures, surface);

    let mut frames = 0;
    while frames < FRAMES {
        if game.step() {
            frames += 1;
        } else {
            thread::sleep(Duration::from_millis(1));
        }
    }

    for row in &game.world().resource::<AsciiSurface>().rows {
        log::info!("{}", row.iter().collect::<String>());
    }

    Ok(())
}

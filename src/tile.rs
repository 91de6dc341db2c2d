use std::fmt;
use std::path::{Path, PathBuf};

/// Numeric identity of a tile kind, unique within a registry.
pub type TileId = u32;

pub const EMPTY_ID: TileId = 0;
pub const EMPTY_NAME: &str = "Empty";

/// Handle to a kind inside a `TileRegistry`. This is what chunks store per cell,
/// so it has to stay small and `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileHandle(pub(crate) u32);

impl TileHandle {
    /// The sentinel "no tile" kind. Always the first entry of every registry.
    pub const EMPTY: TileHandle = TileHandle(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

impl Default for TileHandle {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileVariant {
    Normal,
    /// Gets the liquid update rule on top of anything its flags ask for.
    Liquid,
}

/// Identity and behaviour of a category of tile ("Stone", "Water", ...).
///
/// Identity (`id`, `name`) is fixed once constructed. The behaviour flags stay public
/// so games can tweak them through `TileRegistry::get_mut` after registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileKind {
    id: TileId,
    name: String,
    variant: TileVariant,

    /// Falls one cell per tick when the cell in the gravity direction is Empty.
    pub has_gravity: bool,
    /// Added to the update list every frame no matter what surrounds it.
    pub always_update: bool,

    texture_dir: Option<PathBuf>,
    file_name: Option<String>,
}

impl TileKind {
    pub fn new(id: TileId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            variant: TileVariant::Normal,
            has_gravity: false,
            always_update: false,
            texture_dir: None,
            file_name: None,
        }
    }

    // liquids are always updated so they can keep spreading once they settle
    pub fn liquid(id: TileId, name: &str) -> Self {
        Self {
            variant: TileVariant::Liquid,
            has_gravity: true,
            always_update: true,
            ..Self::new(id, name)
        }
    }

    pub fn gravity(mut self, has_gravity: bool) -> Self {
        self.has_gravity = has_gravity;
        self
    }

    pub fn always_update(mut self, always_update: bool) -> Self {
        self.always_update = always_update;
        self
    }

    /// Load this kind's texture from `dir` instead of the library's base path.
    pub fn texture_dir(mut self, dir: &Path) -> Self {
        self.texture_dir = Some(dir.to_owned());
        self
    }

    /// Load this kind's texture from a file not named after the kind.
    pub fn file_name(mut self, file_name: &str) -> Self {
        self.file_name = Some(file_name.to_string());
        self
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variant(&self) -> TileVariant {
        self.variant
    }

    pub fn is_liquid(&self) -> bool {
        self.variant == TileVariant::Liquid
    }

    pub fn texture_dir_override(&self) -> Option<&Path> {
        self.texture_dir.as_deref()
    }

    pub fn texture_file_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_kind_has_no_behaviour() {
        let stone = TileKind::new(1, "Stone");
        assert!(!stone.has_gravity);
        assert!(!stone.always_update);
        assert_eq!(stone.variant(), TileVariant::Normal);
        assert_eq!(stone.to_string(), "Stone");
    }

    #[test]
    fn liquid_kind_falls_and_always_updates() {
        let water = TileKind::liquid(2, "Water");
        assert!(water.is_liquid());
        assert!(water.has_gravity);
        assert!(water.always_update);
    }

    #[test]
    fn file_name_defaults_to_kind_name() {
        let sand = TileKind::new(3, "Sand");
        assert_eq!(sand.texture_file_name(), "Sand");
        assert_eq!(sand.texture_dir_override(), None);

        let sand = sand.file_name("sand_01").texture_dir(Path::new("tiles/desert"));
        assert_eq!(sand.texture_file_name(), "sand_01");
        assert_eq!(sand.texture_dir_override(), Some(Path::new("tiles/desert")));
    }
}

use std::collections::HashMap;

use crate::error::EngineError;
use crate::tile::{TileHandle, TileId, TileKind, EMPTY_ID, EMPTY_NAME};

/// Append-only catalog of every tile kind a game uses.
///
/// Ids and names are unique for the lifetime of the registry and nothing is ever
/// removed, so a `TileHandle` handed out once stays valid. The Empty kind is
/// registered by the constructor and always sits behind `TileHandle::EMPTY`.
#[derive(Debug, Clone)]
pub struct TileRegistry {
    kinds: Vec<TileKind>,
    by_id: HashMap<TileId, TileHandle>,
    by_name: HashMap<String, TileHandle>,
}

impl TileRegistry {
    pub fn new() -> Self {
        let empty = TileKind::new(EMPTY_ID, EMPTY_NAME);
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        by_id.insert(EMPTY_ID, TileHandle::EMPTY);
        by_name.insert(EMPTY_NAME.to_string(), TileHandle::EMPTY);

        Self {
            kinds: vec![empty],
            by_id,
            by_name,
        }
    }

    pub fn register(&mut self, kind: TileKind) -> Result<TileHandle, EngineError> {
        if self.kinds.contains(&kind) {
            return Err(EngineError::DuplicateRegistration(kind.name().to_string()));
        }

        if kind.name().is_empty() {
            return Err(EngineError::EmptyName(kind.id()));
        }

        if let Some(existing) = self.by_id.get(&kind.id()) {
            return Err(EngineError::DuplicateId {
                id: kind.id(),
                existing: self.kinds[existing.index()].name().to_string(),
            });
        }

        if let Some(existing) = self.by_name.get(kind.name()) {
            return Err(EngineError::DuplicateName {
                name: kind.name().to_string(),
                existing: self.kinds[existing.index()].id(),
            });
        }

        let handle = TileHandle(self.kinds.len() as u32);
        self.by_id.insert(kind.id(), handle);
        self.by_name.insert(kind.name().to_string(), handle);
        log::debug!("registered tile {} with id {}", kind.name(), kind.id());
        self.kinds.push(kind);

        Ok(handle)
    }

    pub fn lookup_by_id(&self, id: TileId) -> Option<TileHandle> {
        self.by_id.get(&id).copied()
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<TileHandle> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, handle: TileHandle) -> Option<&TileKind> {
        self.kinds.get(handle.index())
    }

    /// Access a kind's behaviour flags. The Empty kind is not handed out, it must
    /// never pick up gravity or per-frame updates.
    pub fn get_mut(&mut self, handle: TileHandle) -> Option<&mut TileKind> {
        if handle.is_empty() {
            return None;
        }
        self.kinds.get_mut(handle.index())
    }

    pub fn empty(&self) -> &TileKind {
        &self.kinds[TileHandle::EMPTY.index()]
    }

    /// Every kind in registration order, Empty first.
    pub fn iter(&self) -> impl Iterator<Item = (TileHandle, &TileKind)> {
        self.kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| (TileHandle(i as u32), kind))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Always `false`: the Empty kind is registered from the start.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for TileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_resolvable_before_any_registration() {
        let registry = TileRegistry::new();

        assert_eq!(registry.lookup_by_id(0), Some(TileHandle::EMPTY));
        assert_eq!(registry.lookup_by_name("Empty"), Some(TileHandle::EMPTY));
        assert_eq!(registry.empty().name(), "Empty");
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = TileRegistry::new();
        let stone = registry.register(TileKind::new(1, "Stone")).unwrap();
        let water = registry.register(TileKind::liquid(2, "Water")).unwrap();

        assert_ne!(stone, water);
        assert_eq!(registry.lookup_by_id(1), Some(stone));
        assert_eq!(registry.lookup_by_name("Water"), Some(water));
        assert_eq!(registry.get(water).unwrap().id(), 2);
        assert_eq!(registry.lookup_by_name("water"), None);
        assert_eq!(registry.lookup_by_id(3), None);

        let names: Vec<_> = registry.iter().map(|(_, k)| k.name().to_string()).collect();
        assert_eq!(names, vec!["Empty", "Stone", "Water"]);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut registry = TileRegistry::new();
        registry.register(TileKind::new(1, "Stone")).unwrap();

        let err = registry.register(TileKind::new(1, "Dirt")).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateId { id: 1, ref existing } if existing == "Stone"));
        assert_eq!(registry.lookup_by_name("Dirt"), None);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = TileRegistry::new();
        registry.register(TileKind::new(1, "Stone")).unwrap();

        let err = registry.register(TileKind::new(2, "Stone")).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateName { existing: 1, .. }));
        assert_eq!(registry.lookup_by_id(2), None);
    }

    #[test]
    fn empty_identity_is_reserved() {
        let mut registry = TileRegistry::new();

        assert!(matches!(
            registry.register(TileKind::new(0, "Air")),
            Err(EngineError::DuplicateId { id: 0, .. })
        ));
        assert!(matches!(
            registry.register(TileKind::new(7, "Empty")),
            Err(EngineError::DuplicateName { existing: 0, .. })
        ));
    }

    #[test]
    fn same_kind_twice_is_a_duplicate_registration() {
        let mut registry = TileRegistry::new();
        let sand = TileKind::new(4, "Sand").gravity(true);
        registry.register(sand.clone()).unwrap();

        assert!(matches!(
            registry.register(sand),
            Err(EngineError::DuplicateRegistration(name)) if name == "Sand"
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut registry = TileRegistry::new();
        assert!(matches!(
            registry.register(TileKind::new(9, "")),
            Err(EngineError::EmptyName(9))
        ));
    }

    #[test]
    fn flags_are_mutable_but_empty_is_not() {
        let mut registry = TileRegistry::new();
        let sand = registry.register(TileKind::new(4, "Sand")).unwrap();

        registry.get_mut(sand).unwrap().has_gravity = true;
        assert!(registry.get(sand).unwrap().has_gravity);
        assert!(registry.get_mut(TileHandle::EMPTY).is_none());
    }
}

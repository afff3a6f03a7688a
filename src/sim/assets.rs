/// Resource provider seam.
///
/// Level loading asks for visuals by name (`"Tiles/BlockA3"`) and stores
/// whatever opaque handle comes back on the cell. The simulation never
/// looks inside a handle, so tests run without any real assets.

use std::collections::HashMap;

/// Opaque reference to a loaded resource.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AssetHandle(u32);

impl AssetHandle {
    pub fn index(self) -> u32 {
        self.0
    }
}

pub trait ResourceProvider {
    /// Resolve `name` to a handle. `None` means the asset is unavailable;
    /// callers degrade to "no visual" rather than failing.
    fn load(&mut self, name: &str) -> Option<AssetHandle>;
}

/// Interns names into sequential handles. Every name resolves.
#[derive(Default, Debug)]
pub struct NameRegistry {
    names: Vec<String>,
    lookup: HashMap<String, AssetHandle>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl NameRegistry {
    /// Name a handle was issued for.
    pub fn name_of(&self, handle: AssetHandle) -> Option<&str> {
        self.names.get(handle.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

impl ResourceProvider for NameRegistry {
    fn load(&mut self, name: &str) -> Option<AssetHandle> {
        if let Some(&handle) = self.lookup.get(name) {
            return Some(handle);
        }
        let handle = AssetHandle(self.names.len() as u32);
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), handle);
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_handle() {
        let mut reg = NameRegistry::new();
        let a = reg.load("Tiles/Exit");
        let b = reg.load("Tiles/Platform");
        assert_eq!(reg.load("Tiles/Exit"), a);
        assert_ne!(a, b);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn handles_map_back_to_names() {
        let mut reg = NameRegistry::new();
        let h = reg.load("Tiles/BlockA3").unwrap();
        assert_eq!(reg.name_of(h), Some("Tiles/BlockA3"));
    }
}

//! Flavor Registry
//!
//! Simple in-memory lookup of probe dialects by name.

use std::collections::BTreeMap;

use super::dialect::{Grbl, LinuxCnc, ProbeDialect};

#[derive(Debug)]
pub struct FlavorRegistry {
    flavors: BTreeMap<&'static str, Box<dyn ProbeDialect>>,
}

impl Default for FlavorRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl FlavorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            flavors: BTreeMap::new(),
        }
    }

    /// Registry with every built-in flavor
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.add_flavor(Box::new(Grbl));
        registry.add_flavor(Box::new(LinuxCnc));
        registry
    }

    /// Add a flavor, replacing one with the same name
    pub fn add_flavor(&mut self, flavor: Box<dyn ProbeDialect>) {
        self.flavors.insert(flavor.name(), flavor);
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<&dyn ProbeDialect> {
        self.flavors
            .get(name.to_ascii_lowercase().as_str())
            .map(|flavor| &**flavor)
    }

    /// Names of all flavors, sorted
    pub fn list_flavors(&self) -> Vec<&str> {
        self.flavors.keys().copied().collect()
    }
}

//! Loadable cipher units
//!
//! A unit is an independently built implementation that exposes one factory
//! entry point named [`FACTORY_SYMBOL`]. A [`ModuleLoader`] resolves units by
//! identifier and hands back a [`ModuleUnit`], which stays alive for as long
//! as the modules it produced are in use. Dropping the unit releases it.
//!
//! [`StaticLoader`] serves units linked into the host binary. The three
//! built-in algorithms are available through [`StaticLoader::builtin`], and a
//! host can add its own units with [`StaticLoader::register_unit`] without
//! touching the registry.

use std::collections::HashMap;
use std::fmt;

use crate::error::RegistryError;
use crate::module::{FACTORY_SYMBOL, ModuleFactory, names};
use crate::{autokey, salsa20, vernam};

/// Unit identifier for a module name (`VERNAM` -> `libVERNAM`)
pub fn unit_id_for(name: &str) -> String {
    format!("lib{name}")
}

/// An opened implementation unit
///
/// Dropping the unit releases it; descriptors obtained from it must not be
/// used afterwards.
pub trait ModuleUnit: Send + Sync {
    /// Identifier the unit was opened with
    fn unit_id(&self) -> &str;

    /// Resolve a factory entry point by symbol name
    fn entry_point(&self, symbol: &str) -> Option<ModuleFactory>;
}

/// Resolves units by identifier
pub trait ModuleLoader: Send + Sync {
    /// Open the unit with the given identifier
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ModuleLoad` if the unit cannot be located.
    fn open(&self, unit_id: &str) -> Result<Box<dyn ModuleUnit>, RegistryError>;
}

/// A unit linked into the running binary
#[derive(Debug, Clone)]
pub struct StaticUnit {
    unit_id: String,
    symbols: HashMap<String, ModuleFactory>,
}

impl StaticUnit {
    /// Create a unit exposing no entry points
    pub fn new(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            symbols: HashMap::new(),
        }
    }

    /// Create a unit exposing `factory` under [`FACTORY_SYMBOL`]
    pub fn with_factory(unit_id: impl Into<String>, factory: ModuleFactory) -> Self {
        let mut unit = Self::new(unit_id);
        unit.export(FACTORY_SYMBOL, factory);
        unit
    }

    /// Expose `factory` under `symbol`
    pub fn export(&mut self, symbol: impl Into<String>, factory: ModuleFactory) {
        self.symbols.insert(symbol.into(), factory);
    }
}

impl ModuleUnit for StaticUnit {
    fn unit_id(&self) -> &str {
        &self.unit_id
    }

    fn entry_point(&self, symbol: &str) -> Option<ModuleFactory> {
        self.symbols.get(symbol).copied()
    }
}

/// Loader over units linked into the running binary
#[derive(Clone, Default)]
pub struct StaticLoader {
    units: HashMap<String, StaticUnit>,
}

impl StaticLoader {
    /// Create a loader with no units
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader serving the Vernam, Autokey and Salsa20 units
    pub fn builtin() -> Self {
        let mut loader = Self::new();
        loader.register_factory(names::VERNAM, vernam::create_cipher_module);
        loader.register_factory(names::AUTOKEY, autokey::create_cipher_module);
        loader.register_factory(names::SALSA20, salsa20::create_cipher_module);
        loader
    }

    /// Add or replace a unit
    pub fn register_unit(&mut self, unit: StaticUnit) {
        self.units.insert(unit.unit_id.clone(), unit);
    }

    /// Add a unit for module `name` exposing `factory` under the standard symbol
    pub fn register_factory(&mut self, name: &str, factory: ModuleFactory) {
        self.register_unit(StaticUnit::with_factory(unit_id_for(name), factory));
    }

    /// Identifiers of every unit this loader can open
    pub fn unit_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.units.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl ModuleLoader for StaticLoader {
    fn open(&self, unit_id: &str) -> Result<Box<dyn ModuleUnit>, RegistryError> {
        self.units
            .get(unit_id)
            .map(|unit| Box::new(unit.clone()) as Box<dyn ModuleUnit>)
            .ok_or_else(|| RegistryError::ModuleLoad {
                unit: unit_id.to_string(),
                reason: "no such unit linked into this binary".to_string(),
            })
    }
}

impl fmt::Debug for StaticLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticLoader")
            .field("units", &self.unit_ids())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_for() {
        assert_eq!(unit_id_for("VERNAM"), "libVERNAM");
        assert_eq!(unit_id_for("salsa20"), "libsalsa20");
    }

    #[test]
    fn test_builtin_units() {
        let loader = StaticLoader::builtin();
        assert_eq!(
            loader.unit_ids(),
            vec!["libAUTOKEY", "libSALSA20", "libVERNAM"]
        );

        let unit = loader.open("libSALSA20").unwrap();
        assert_eq!(unit.unit_id(), "libSALSA20");

        let factory = unit.entry_point(FACTORY_SYMBOL).unwrap();
        assert_eq!(factory().name, "SALSA20");
    }

    #[test]
    fn test_missing_unit() {
        let loader = StaticLoader::builtin();
        let result = loader.open("libROT13");
        assert!(matches!(
            result,
            Err(RegistryError::ModuleLoad { ref unit, .. }) if unit == "libROT13"
        ));
    }

    #[test]
    fn test_missing_entry_point() {
        let mut unit = StaticUnit::new("libEMPTY");
        assert!(unit.entry_point(FACTORY_SYMBOL).is_none());

        unit.export("some_other_symbol", vernam::create_cipher_module);
        assert!(unit.entry_point(FACTORY_SYMBOL).is_none());
        assert!(unit.entry_point("some_other_symbol").is_some());
    }

    #[test]
    fn test_register_replaces_unit() {
        let mut loader = StaticLoader::new();
        loader.register_factory("VERNAM", autokey::create_cipher_module);
        loader.register_factory("VERNAM", vernam::create_cipher_module);

        let unit = loader.open("libVERNAM").unwrap();
        let module = unit.entry_point(FACTORY_SYMBOL).unwrap()();
        assert_eq!(module.name, "VERNAM");
        assert_eq!(loader.unit_ids().len(), 1);
    }
}

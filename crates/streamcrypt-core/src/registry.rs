//! Registry of loaded cipher modules
//!
//! The registry loads modules by name through a [`ModuleLoader`], keeps each
//! unit alive alongside the descriptor it produced, and answers lookups by
//! name until [`ModuleRegistry::shutdown`] releases everything.
//!
//! Loading takes `&mut self`, so first-time loads are serialized by the
//! borrow checker; once loading is done a shared registry can serve any
//! number of concurrent lookups.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::loader::{ModuleLoader, ModuleUnit, StaticLoader, unit_id_for};
use crate::module::{CipherModule, FACTORY_SYMBOL};

/// A loaded module and the unit that must outlive it
struct RegistryEntry {
    module: &'static CipherModule,
    unit: Box<dyn ModuleUnit>,
}

/// Name-indexed collection of loaded cipher modules
pub struct ModuleRegistry<L: ModuleLoader = StaticLoader> {
    loader: L,
    entries: HashMap<String, RegistryEntry>,
}

impl ModuleRegistry<StaticLoader> {
    /// Create a registry that can load the built-in algorithms
    pub fn with_builtin() -> Self {
        Self::new(StaticLoader::builtin())
    }
}

impl<L: ModuleLoader> ModuleRegistry<L> {
    /// Create an empty registry backed by `loader`
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            entries: HashMap::new(),
        }
    }

    /// The loader backing this registry
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Load the module called `name`, or return it if already loaded
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ModuleLoad` if the unit cannot be opened and
    /// `RegistryError::ModuleInterface` if it lacks the factory entry point or
    /// its descriptor does not carry the requested name.
    pub fn load(&mut self, name: &str) -> Result<&CipherModule, RegistryError> {
        if let Some(entry) = self.entries.get(name) {
            debug!("Cipher module {} already loaded", name);
            return Ok(entry.module);
        }

        let unit_id = unit_id_for(name);
        let unit = self.loader.open(&unit_id).inspect_err(|e| {
            warn!("Failed to open unit for {}: {}", name, e);
        })?;

        let factory = unit.entry_point(FACTORY_SYMBOL).ok_or_else(|| {
            warn!("Unit {} has no {} entry point", unit_id, FACTORY_SYMBOL);
            RegistryError::ModuleInterface {
                unit: unit_id.clone(),
                reason: format!("missing entry point {FACTORY_SYMBOL}"),
            }
        })?;

        let module = factory();
        if module.name != name {
            warn!(
                "Unit {} produced module {:?}, expected {:?}",
                unit_id, module.name, name
            );
            return Err(RegistryError::ModuleInterface {
                unit: unit_id,
                reason: format!("descriptor is named {:?}, expected {name:?}", module.name),
            });
        }

        debug!("Loaded cipher module {} from {}", name, unit.unit_id());
        self.entries
            .insert(name.to_string(), RegistryEntry { module, unit });

        Ok(module)
    }

    /// Load several modules, stopping at the first failure
    ///
    /// Modules loaded before the failure stay loaded.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by [`ModuleRegistry::load`].
    pub fn load_all<I, S>(&mut self, names: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.load(name.as_ref())?;
        }
        Ok(())
    }

    /// Look up a loaded module by name
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ModuleNotFound` if `name` was never loaded.
    pub fn lookup(&self, name: &str) -> Result<&CipherModule, RegistryError> {
        self.entries
            .get(name)
            .map(|entry| entry.module)
            .ok_or_else(|| RegistryError::ModuleNotFound(name.to_string()))
    }

    /// Whether `name` has been loaded
    pub fn is_loaded(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names of all loaded modules, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of loaded modules
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no module has been loaded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release every loaded unit
    ///
    /// Consumes the registry, so no module obtained from it can be used
    /// afterwards. Returns the number of units released.
    pub fn shutdown(mut self) -> usize {
        let released = self.entries.len();
        for (name, entry) in self.entries.drain() {
            debug!("Releasing unit {} for {}", entry.unit.unit_id(), name);
            drop(entry.unit);
        }
        debug!("Registry shut down, {} units released", released);
        released
    }
}

impl<L: ModuleLoader> fmt::Debug for ModuleRegistry<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CipherError;
    use crate::loader::StaticUnit;
    use crate::module::{BUILTIN_NAMES, ModuleFactory};
    use crate::vernam;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_lookup_before_load() {
        let registry = ModuleRegistry::with_builtin();
        assert_eq!(
            registry.lookup("VERNAM").unwrap_err(),
            RegistryError::ModuleNotFound("VERNAM".to_string())
        );
    }

    #[test]
    fn test_load_then_lookup() {
        let mut registry = ModuleRegistry::with_builtin();
        let loaded = registry.load("VERNAM").unwrap().name;
        assert_eq!(loaded, "VERNAM");

        let module = registry.lookup("VERNAM").unwrap();
        assert_eq!(module.name, "VERNAM");
        assert!(registry.is_loaded("VERNAM"));
        assert!(!registry.is_loaded("SALSA20"));
    }

    #[test]
    fn test_load_is_idempotent() {
        let mut registry = ModuleRegistry::with_builtin();
        let first: *const CipherModule = registry.load("AUTOKEY").unwrap();
        let second: *const CipherModule = registry.load("AUTOKEY").unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_all_builtin() {
        let mut registry = ModuleRegistry::with_builtin();
        registry.load_all(BUILTIN_NAMES).unwrap();

        assert_eq!(registry.names(), vec!["AUTOKEY", "SALSA20", "VERNAM"]);
        assert_eq!(registry.shutdown(), 3);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut registry = ModuleRegistry::with_builtin();
        assert!(matches!(
            registry.load("vernam"),
            Err(RegistryError::ModuleLoad { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_all_stops_at_failure() {
        let mut registry = ModuleRegistry::with_builtin();
        let result = registry.load_all(["VERNAM", "ENIGMA", "SALSA20"]);

        assert_eq!(
            result,
            Err(RegistryError::ModuleLoad {
                unit: "libENIGMA".to_string(),
                reason: "no such unit linked into this binary".to_string(),
            })
        );
        assert_eq!(registry.names(), vec!["VERNAM"]);
    }

    #[test]
    fn test_missing_entry_point() {
        let mut loader = StaticLoader::new();
        let mut unit = StaticUnit::new("libBROKEN");
        unit.export("createModule", vernam::create_cipher_module);
        loader.register_unit(unit);

        let mut registry = ModuleRegistry::new(loader);
        assert!(matches!(
            registry.load("BROKEN"),
            Err(RegistryError::ModuleInterface { ref unit, .. }) if unit == "libBROKEN"
        ));
        assert!(registry.lookup("BROKEN").is_err());
    }

    #[test]
    fn test_descriptor_name_mismatch() {
        let mut loader = StaticLoader::new();
        loader.register_factory("OTP", vernam::create_cipher_module);

        let mut registry = ModuleRegistry::new(loader);
        let err = registry.load("OTP").unwrap_err();
        assert!(matches!(err, RegistryError::ModuleInterface { .. }));
        assert!(err.to_string().contains("\"VERNAM\""));
    }

    static XOR_FF_MODULE: CipherModule = CipherModule {
        name: "XORFF",
        encrypt: xor_ff,
        decrypt: xor_ff,
    };

    fn xor_ff(input: &[u8], _key: &[u8], _nonce: Option<&[u8]>) -> Result<Vec<u8>, CipherError> {
        Ok(input.iter().map(|b| b ^ 0xFF).collect())
    }

    fn create_xor_ff() -> &'static CipherModule {
        &XOR_FF_MODULE
    }

    #[test]
    fn test_host_registered_unit() {
        let mut loader = StaticLoader::builtin();
        loader.register_factory("XORFF", create_xor_ff);

        let mut registry = ModuleRegistry::new(loader);
        let module = registry.load("XORFF").unwrap();
        let output = module.encrypt(&[0x00, 0x0F], &[], None).unwrap();
        assert_eq!(output, [0xFF, 0xF0]);
    }

    /// Unit that counts how many of its handles are alive
    struct CountingUnit {
        live: Arc<AtomicUsize>,
    }

    impl ModuleUnit for CountingUnit {
        fn unit_id(&self) -> &str {
            "libVERNAM"
        }

        fn entry_point(&self, symbol: &str) -> Option<ModuleFactory> {
            let factory: ModuleFactory = vernam::create_cipher_module;
            (symbol == FACTORY_SYMBOL).then_some(factory)
        }
    }

    impl Drop for CountingUnit {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    struct CountingLoader {
        live: Arc<AtomicUsize>,
        opened: AtomicUsize,
    }

    impl ModuleLoader for CountingLoader {
        fn open(&self, _unit_id: &str) -> Result<Box<dyn ModuleUnit>, RegistryError> {
            self.live.fetch_add(1, Ordering::SeqCst);
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingUnit {
                live: Arc::clone(&self.live),
            }))
        }
    }

    #[test]
    fn test_units_held_until_shutdown() {
        let live = Arc::new(AtomicUsize::new(0));
        let mut registry = ModuleRegistry::new(CountingLoader {
            live: Arc::clone(&live),
            opened: AtomicUsize::new(0),
        });

        registry.load("VERNAM").unwrap();
        registry.load("VERNAM").unwrap();
        assert_eq!(registry.loader().opened.load(Ordering::SeqCst), 1);
        assert_eq!(live.load(Ordering::SeqCst), 1);

        assert_eq!(registry.shutdown(), 1);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_lookups() {
        let mut registry = ModuleRegistry::with_builtin();
        registry.load_all(BUILTIN_NAMES).unwrap();
        let registry = &registry;

        std::thread::scope(|scope| {
            for name in BUILTIN_NAMES {
                scope.spawn(move || {
                    let module = registry.lookup(name).unwrap();
                    assert_eq!(module.name, name);
                });
            }
        });
    }
}

// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! Hardware engine registry for `engine:engine-id:key-id` private key
//! references. A real binding (PKCS#11, a TPM driver, ...) is the
//! external collaborator behind the [`Engine`] trait; this crate ships
//! only the registry.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::object::PrivateKey;

/// A hardware or software engine capable of loading a private key by id.
pub trait Engine: fmt::Debug {
    fn load_private_key(&self, key_id: &str) -> Result<Rc<PrivateKey>, String>;
}

/// Engines registered under the ids used in `engine:` references.
#[derive(Debug, Default)]
pub struct EngineRegistry {
    engines: HashMap<String, Box<dyn Engine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, engine_id: impl Into<String>, engine: Box<dyn Engine>) {
        self.engines.insert(engine_id.into(), engine);
    }

    pub fn get(&self, engine_id: &str) -> Option<&dyn Engine> {
        self.engines.get(engine_id).map(AsRef::as_ref)
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    /// A trivial in-memory engine for tests: loads a canned key for one
    /// known key id, fails for everything else.
    #[derive(Debug)]
    pub struct StubEngine {
        pub known_key_id: String,
    }

    impl Engine for StubEngine {
        fn load_private_key(&self, key_id: &str) -> Result<Rc<PrivateKey>, String> {
            if key_id == self.known_key_id {
                Ok(Rc::new(PrivateKey {
                    der: format!("engine-key:{key_id}").into_bytes(),
                }))
            } else {
                Err(format!("no such key: {key_id}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::StubEngine;
    use super::*;

    #[test]
    fn unregistered_engine_is_absent() {
        let registry = EngineRegistry::new();
        assert!(registry.get("soft").is_none());
    }

    #[test]
    fn registered_engine_loads_known_key() {
        let mut registry = EngineRegistry::new();
        registry.register(
            "soft",
            Box::new(StubEngine {
                known_key_id: "key1".to_string(),
            }),
        );
        let engine = registry.get("soft").unwrap();
        let key = engine.load_private_key("key1").unwrap();
        assert_eq!(key.der, b"engine-key:key1");
    }

    #[test]
    fn registered_engine_fails_unknown_key() {
        let mut registry = EngineRegistry::new();
        registry.register(
            "soft",
            Box::new(StubEngine {
                known_key_id: "key1".to_string(),
            }),
        );
        let engine = registry.get("soft").unwrap();
        assert!(engine.load_private_key("key2").is_err());
    }
}

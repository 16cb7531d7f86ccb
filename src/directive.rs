// Copyright 2024 SSL Object Cache Contributors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! The one configuration directive this crate exposes (spec section 6):
//! `object_cache_inherit on|off`, governing whether a new configuration
//! generation may adopt parsed objects from the previous one.

use serde::Deserialize;

/// Deserializable from whichever configuration format the embedding server
/// uses (TOML, YAML, JSON, ...); this crate only cares about the resulting
/// bool, not the source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ObjectCacheConfig {
    /// `object_cache_inherit`. Defaults to `on`.
    #[serde(default = "default_inherit")]
    pub object_cache_inherit: bool,
}

fn default_inherit() -> bool {
    true
}

impl Default for ObjectCacheConfig {
    fn default() -> Self {
        Self {
            object_cache_inherit: default_inherit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_inherit_on() {
        assert!(ObjectCacheConfig::default().object_cache_inherit);
    }

    #[test]
    fn deserializes_explicit_off() {
        let config: ObjectCacheConfig = serde_json::from_str(r#"{"object_cache_inherit": false}"#).unwrap();
        assert!(!config.object_cache_inherit);
    }

    #[test]
    fn deserializes_missing_key_to_default() {
        let config: ObjectCacheConfig = serde_json::from_str("{}").unwrap();
        assert!(config.object_cache_inherit);
    }
}

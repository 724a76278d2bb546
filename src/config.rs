//! Block configuration and its NVM persistence.
//!
//! Config records are set once at startup, typically from NVM, then frozen.
//! Every config carries the reserved `ticks_per_s` field; the other reserved
//! item, the bus-send capability, is injected into the host instance
//! instead (see [`CanSend`](crate::app::ports::CanSend)).
//!
//! Persisted configs are `postcard` blobs stored under the `"blocks"`
//! namespace, keyed by instance name.

use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::app::ports::StoragePort;
use crate::error::{ConfigError, Error, Result, StorageError};

/// Tick rate a generated block starts with.
pub const DEFAULT_TICKS_PER_S: u8 = 100;

/// Storage namespace for block configs.
pub const CONFIG_NAMESPACE: &str = "blocks";

/// Largest serialised config accepted from storage.
pub const MAX_CONFIG_BLOB: usize = 512;

/// Behaviour every block config provides.
pub trait BlockConfig {
    /// Rate at which the block's `tick` is called.
    fn ticks_per_s(&self) -> u8;

    /// Range-check the config.  Implementations extending this should keep
    /// the tick-rate check.
    fn validate(&self) -> core::result::Result<(), ConfigError> {
        validate_tick_rate(self.ticks_per_s())
    }
}

pub fn validate_tick_rate(ticks_per_s: u8) -> core::result::Result<(), ConfigError> {
    if ticks_per_s == 0 {
        Err(ConfigError::ValidationFailed("ticks_per_s must be non-zero"))
    } else {
        Ok(())
    }
}

/// Load the config stored under `key`.
///
/// Returns `Ok(None)` when nothing is stored yet (first boot).
pub fn load_config<C>(storage: &impl StoragePort, key: &str) -> Result<Option<C>>
where
    C: DeserializeOwned + BlockConfig,
{
    let mut buf = [0u8; MAX_CONFIG_BLOB];
    let len = match storage.read(CONFIG_NAMESPACE, key, &mut buf) {
        Ok(len) => len,
        Err(StorageError::NotFound) => {
            info!("Config '{}': nothing stored, keeping defaults", key);
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let config: C = postcard::from_bytes(&buf[..len]).map_err(|_| {
        warn!("Config '{}': stored blob is corrupted", key);
        Error::Config(ConfigError::Corrupted)
    })?;
    config.validate()?;
    info!("Config '{}': loaded {} bytes", key, len);
    Ok(Some(config))
}

/// Validate and persist `config` under `key`.
pub fn save_config<C>(storage: &mut impl StoragePort, key: &str, config: &C) -> Result<()>
where
    C: Serialize + BlockConfig,
{
    config.validate()?;
    let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::Corrupted)?;
    if bytes.len() > MAX_CONFIG_BLOB {
        return Err(ConfigError::TooLarge.into());
    }
    storage.write(CONFIG_NAMESPACE, key, &bytes)?;
    info!("Config '{}': saved {} bytes", key, bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::nvm::MemoryNvm;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Cfg {
        ticks_per_s: u8,
        gain: f32,
    }

    impl BlockConfig for Cfg {
        fn ticks_per_s(&self) -> u8 {
            self.ticks_per_s
        }
    }

    #[test]
    fn missing_config_is_not_an_error() {
        let nvm = MemoryNvm::new();
        let loaded: Option<Cfg> = load_config(&nvm, "gain_block").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load() {
        let mut nvm = MemoryNvm::new();
        let cfg = Cfg {
            ticks_per_s: 50,
            gain: 2.5,
        };
        save_config(&mut nvm, "gain_block", &cfg).unwrap();
        let loaded: Cfg = load_config(&nvm, "gain_block").unwrap().unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn save_rejects_invalid_config() {
        let mut nvm = MemoryNvm::new();
        let cfg = Cfg {
            ticks_per_s: 0,
            gain: 1.0,
        };
        assert!(matches!(
            save_config(&mut nvm, "gain_block", &cfg),
            Err(Error::Config(ConfigError::ValidationFailed(_)))
        ));
        assert!(!nvm.exists(CONFIG_NAMESPACE, "gain_block"));
    }

    #[test]
    fn corrupted_blob_is_reported() {
        let mut nvm = MemoryNvm::new();
        nvm.write(CONFIG_NAMESPACE, "gain_block", &[0xFF]).unwrap();
        let res: Result<Option<Cfg>> = load_config(&nvm, "gain_block");
        assert_eq!(res, Err(Error::Config(ConfigError::Corrupted)));
    }

    #[test]
    fn stored_zero_rate_fails_validation() {
        let mut nvm = MemoryNvm::new();
        let bytes = postcard::to_allocvec(&Cfg {
            ticks_per_s: 0,
            gain: 1.0,
        })
        .unwrap();
        nvm.write(CONFIG_NAMESPACE, "gain_block", &bytes).unwrap();
        let res: Result<Option<Cfg>> = load_config(&nvm, "gain_block");
        assert!(matches!(
            res,
            Err(Error::Config(ConfigError::ValidationFailed(_)))
        ));
    }
}

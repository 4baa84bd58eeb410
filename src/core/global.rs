use crate::core::device::StaticDeviceBackend;
use crate::core::properties::PropertyStore;
use crate::domain::model::{DeviceInfo, Properties, PropertyName};
use crate::utils::error::{PropsError, Result};
use serde_json::Value;
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

static DEFAULTS: OnceLock<Defaults> = OnceLock::new();

/// Process-wide default properties.
///
/// Created on first call with the built-in factory values and a
/// [`StaticDeviceBackend`]. Concurrent first calls still create exactly one
/// instance.
pub fn defaults() -> &'static Defaults {
    DEFAULTS.get_or_init(|| {
        tracing::debug!("Initializing process-wide defaults");
        Defaults::new(PropertyStore::new(Arc::new(StaticDeviceBackend::default())))
    })
}

/// Installs `store` as the process-wide defaults. Fails once [`defaults`]
/// has been called or another store was installed.
pub fn install_defaults(store: PropertyStore) -> Result<&'static Defaults> {
    let mut ours = false;
    let installed = DEFAULTS.get_or_init(|| {
        ours = true;
        Defaults::new(store)
    });
    if !ours {
        return Err(PropsError::AlreadyInitialized);
    }
    Ok(installed)
}

/// A [`PropertyStore`] behind a read/write lock.
#[derive(Debug)]
pub struct Defaults {
    inner: RwLock<PropertyStore>,
}

impl Defaults {
    pub fn new(store: PropertyStore) -> Self {
        Self {
            inner: RwLock::new(store),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, PropertyStore>> {
        self.inner.read().map_err(|_| PropsError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, PropertyStore>> {
        self.inner.write().map_err(|_| PropsError::LockPoisoned)
    }

    /// Runs `f` with shared access, so several reads see one consistent state.
    pub fn with<R>(&self, f: impl FnOnce(&PropertyStore) -> R) -> Result<R> {
        Ok(f(&*self.read()?))
    }

    pub fn snapshot(&self) -> Result<Properties> {
        self.with(|store| store.properties().clone())
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        self.read()?.get(name)
    }

    pub fn set(&self, name: &str, value: Value) -> Result<bool> {
        self.write()?.set(name, value)
    }

    pub fn set_values<I, K>(&self, values: I) -> Result<Vec<PropertyName>>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        self.write()?.set_values(values)
    }

    pub fn reset(&self) -> Result<()> {
        self.write()?.reset()
    }

    pub fn view(&self) -> Result<String> {
        self.read()?.view()
    }

    pub fn to_json(&self) -> Result<String> {
        self.read()?.to_json()
    }

    pub fn load_json(&self, text: &str) -> Result<Vec<PropertyName>> {
        self.write()?.load_json(text)
    }

    pub fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(self.read()?.list_devices())
    }
}

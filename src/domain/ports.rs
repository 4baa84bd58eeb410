use crate::domain::model::{DeviceInfo, DevicePair};
use crate::utils::error::Result;

/// Audio I/O device selection, the way the host audio API exposes it.
pub trait DeviceBackend: Send + Sync {
    fn default_device(&self) -> DevicePair;

    /// Selects `device` and returns the pair the backend actually uses.
    fn set_default_device(&self, device: &DevicePair) -> Result<DevicePair>;

    fn list_devices(&self) -> Vec<DeviceInfo>;
}

/// Where property snapshots are persisted between runs.
pub trait SnapshotStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, data: &str) -> Result<()>;
}

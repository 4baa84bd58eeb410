pub mod device;
pub mod global;
pub mod properties;

pub use crate::domain::model::{DevicePair, DeviceRef, LengthDomain, Properties, PropertyName};
pub use crate::domain::ports::{DeviceBackend, SnapshotStorage};
pub use crate::utils::error::Result;

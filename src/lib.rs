//! Default measurement properties shared by signal and measurement code:
//! sampling rate, signal length, frequency band, audio device, channels,
//! silence margins and a comment.
//!
//! ```no_run
//! use serde_json::json;
//!
//! let defaults = pytta_defaults::defaults();
//! defaults
//!     .set_values([("samplingRate", json!(48000)), ("fftDegree", json!(16))])
//!     .unwrap();
//! print!("{}", defaults.view().unwrap());
//! defaults.reset().unwrap();
//! ```

#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use self::config::CliConfig;

pub use self::config::{cli::LocalStorage, toml_config::FactoryConfig};
pub use self::core::{
    device::StaticDeviceBackend,
    global::{defaults, install_defaults, Defaults},
    properties::PropertyStore,
};
pub use self::domain::model::{
    DeviceInfo, DevicePair, DeviceRef, FreqLims, LengthDomain, Margins, Properties, PropertyName,
};
pub use self::domain::ports::{DeviceBackend, SnapshotStorage};
pub use self::utils::error::{PropsError, Result};

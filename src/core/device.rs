use crate::domain::model::{DeviceInfo, DevicePair, DeviceRef, DEFAULT_SAMPLING_RATE};
use crate::domain::ports::DeviceBackend;
use crate::utils::error::{PropsError, Result};
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Input,
    Output,
}

impl Direction {
    fn channels(&self, device: &DeviceInfo) -> u16 {
        match self {
            Direction::Input => device.max_input_channels,
            Direction::Output => device.max_output_channels,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// In-memory device backend over a fixed device list.
#[derive(Debug)]
pub struct StaticDeviceBackend {
    devices: Vec<DeviceInfo>,
    current: Mutex<DevicePair>,
}

impl StaticDeviceBackend {
    pub fn new(devices: Vec<DeviceInfo>, default_device: DevicePair) -> Result<Self> {
        let mut seen = HashSet::new();
        for device in &devices {
            if !seen.insert(device.index) {
                return Err(PropsError::ConfigValidationError {
                    field: "devices".to_string(),
                    message: format!("Device index {} is listed more than once", device.index),
                });
            }
        }

        let backend = Self {
            devices,
            current: Mutex::new(default_device.clone()),
        };
        let resolved = backend.resolve_pair(&default_device)?;
        *backend.lock()? = resolved;
        Ok(backend)
    }

    /// Picks the first input-capable and first output-capable devices.
    pub fn with_devices(devices: Vec<DeviceInfo>) -> Result<Self> {
        let first = |direction: Direction| {
            devices
                .iter()
                .find(|device| direction.channels(device) > 0)
                .map(|device| device.index)
                .ok_or_else(|| PropsError::DeviceError {
                    message: format!("No device with {} channels", direction.label()),
                })
        };
        let default_device = DevicePair::indices(first(Direction::Input)?, first(Direction::Output)?);
        Self::new(devices, default_device)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, DevicePair>> {
        self.current.lock().map_err(|_| PropsError::LockPoisoned)
    }

    fn resolve_pair(&self, pair: &DevicePair) -> Result<DevicePair> {
        Ok(DevicePair::new(
            DeviceRef::Index(self.resolve(&pair.input, Direction::Input)?),
            DeviceRef::Index(self.resolve(&pair.output, Direction::Output)?),
        ))
    }

    fn resolve(&self, device: &DeviceRef, direction: Direction) -> Result<u32> {
        let found = match device {
            DeviceRef::Index(index) => self
                .devices
                .iter()
                .find(|candidate| candidate.index == *index)
                .ok_or_else(|| PropsError::DeviceError {
                    message: format!("No device with index {}", index),
                })?,
            DeviceRef::Name(name) => self.find_by_name(name, direction)?,
        };

        if direction.channels(found) == 0 {
            return Err(PropsError::DeviceError {
                message: format!(
                    "Device {} '{}' has no {} channels",
                    found.index,
                    found.name,
                    direction.label()
                ),
            });
        }
        Ok(found.index)
    }

    // 名稱比對不分大小寫；完全相同優先，其次是唯一的子字串
    fn find_by_name(&self, name: &str, direction: Direction) -> Result<&DeviceInfo> {
        let needle = name.to_lowercase();
        if let Some(exact) = self
            .devices
            .iter()
            .find(|device| device.name.to_lowercase() == needle)
        {
            return Ok(exact);
        }

        let matches: Vec<&DeviceInfo> = self
            .devices
            .iter()
            .filter(|device| direction.channels(device) > 0)
            .filter(|device| device.name.to_lowercase().contains(&needle))
            .collect();

        match matches.as_slice() {
            [single] => Ok(*single),
            [] => Err(PropsError::DeviceError {
                message: format!("No {} device matching '{}'", direction.label(), name),
            }),
            several => Err(PropsError::DeviceError {
                message: format!(
                    "Multiple {} devices match '{}': {}",
                    direction.label(),
                    name,
                    several
                        .iter()
                        .map(|device| device.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }),
        }
    }
}

impl Default for StaticDeviceBackend {
    fn default() -> Self {
        Self {
            devices: vec![DeviceInfo {
                index: 0,
                name: "default".to_string(),
                max_input_channels: 2,
                max_output_channels: 2,
                default_sample_rate: DEFAULT_SAMPLING_RATE as f64,
            }],
            current: Mutex::new(DevicePair::indices(0, 0)),
        }
    }
}

impl DeviceBackend for StaticDeviceBackend {
    fn default_device(&self) -> DevicePair {
        match self.current.lock() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_default_device(&self, device: &DevicePair) -> Result<DevicePair> {
        let resolved = self.resolve_pair(device)?;
        let mut current = self.lock()?;
        *current = resolved.clone();
        Ok(resolved)
    }

    fn list_devices(&self) -> Vec<DeviceInfo> {
        self.devices.clone()
    }
}

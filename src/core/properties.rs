use crate::domain::model::{DeviceInfo, Properties, PropertyName};
use crate::domain::ports::DeviceBackend;
use crate::utils::error::{PropsError, Result};
use crate::utils::validation::Validate;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Current and factory property values plus the device backend they drive.
#[derive(Clone)]
pub struct PropertyStore {
    current: Properties,
    factory: Properties,
    backend: Arc<dyn DeviceBackend>,
}

impl fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyStore")
            .field("current", &self.current)
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}

impl PropertyStore {
    pub fn new(backend: Arc<dyn DeviceBackend>) -> Self {
        let factory = Properties::factory(backend.default_device());
        Self {
            current: factory.clone(),
            factory,
            backend,
        }
    }

    /// Uses `factory` as the reset target. Its device is pushed to the backend.
    pub fn with_factory(mut factory: Properties, backend: Arc<dyn DeviceBackend>) -> Result<Self> {
        factory.validate()?;
        let device = backend.set_default_device(factory.device())?;
        factory.assign(PropertyName::Device, serde_json::to_value(&device)?)?;
        Ok(Self {
            current: factory.clone(),
            factory,
            backend,
        })
    }

    pub fn properties(&self) -> &Properties {
        &self.current
    }

    pub fn factory(&self) -> &Properties {
        &self.factory
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        self.current.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<bool> {
        let changed = self.set_values([(name, value)])?;
        Ok(!changed.is_empty())
    }

    /// Applies every pair or none of them. Returns the changed names in
    /// display order.
    pub fn set_values<I, K>(&mut self, values: I) -> Result<Vec<PropertyName>>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut pending = BTreeMap::new();
        for (name, value) in values {
            let name: PropertyName = name.as_ref().parse()?;
            pending.insert(name, value);
        }

        let mut candidate = self.current.clone();
        let mut changed = Vec::new();
        for (name, value) in pending {
            if candidate.assign(name, value)? {
                changed.push(name);
            }
        }

        if changed.is_empty() {
            return Ok(changed);
        }
        candidate.validate()?;

        if changed.contains(&PropertyName::Device) {
            let device = self.backend.set_default_device(candidate.device())?;
            if device == *self.current.device() {
                // 名稱解析後與目前相同，不算變更
                changed.retain(|name| *name != PropertyName::Device);
            } else {
                tracing::info!(
                    "Audio device switched from {} to {}",
                    self.current.device(),
                    device
                );
            }
            candidate.assign(PropertyName::Device, serde_json::to_value(&device)?)?;
        }

        for name in &changed {
            let value = candidate.value_of(*name)?;
            tracing::debug!("{} = {}", name, value);
        }
        self.current = candidate;
        Ok(changed)
    }

    /// Restores factory values and reselects the factory device.
    pub fn reset(&mut self) -> Result<()> {
        if self.backend.default_device() != *self.factory.device() {
            let device = self.backend.set_default_device(self.factory.device())?;
            tracing::info!("Audio device reset to {}", device);
        }
        self.current = self.factory.clone();
        tracing::debug!("Properties reset to factory defaults");
        Ok(())
    }

    pub fn view(&self) -> Result<String> {
        self.current.view()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.current)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(&self.current)?)
    }

    /// Applies a (possibly partial) JSON snapshot through `set_values`.
    /// Keys that are not property names are ignored.
    pub fn load_json(&mut self, text: &str) -> Result<Vec<PropertyName>> {
        let snapshot: serde_json::Map<String, Value> = serde_json::from_str(text)?;
        let values = snapshot
            .into_iter()
            .filter(|(name, _)| match name.parse::<PropertyName>() {
                Ok(_) => true,
                Err(_) => {
                    tracing::debug!("Skipping snapshot key '{}'", name);
                    false
                }
            });
        self.set_values(values)
    }

    pub fn list_devices(&self) -> Vec<DeviceInfo> {
        self.backend.list_devices()
    }
}

/// Parses `name=value` where value is JSON, or a plain string otherwise.
pub fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
    let (name, raw) = assignment
        .split_once('=')
        .ok_or_else(|| PropsError::InvalidConfigValueError {
            field: "assignment".to_string(),
            value: assignment.to_string(),
            reason: "Expected NAME=VALUE".to_string(),
        })?;
    let raw = raw.trim();
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::device::StaticDeviceBackend;
    use crate::domain::model::{DevicePair, LengthDomain};
    use serde_json::json;

    fn store() -> PropertyStore {
        PropertyStore::new(Arc::new(StaticDeviceBackend::default()))
    }

    #[test]
    fn test_set_values_applies_batch() {
        let mut store = store();
        let changed = store
            .set_values([
                ("maxFreq", json!(16000)),
                ("samplingRate", json!(48000)),
                ("comment", json!("room A")),
            ])
            .unwrap();

        assert_eq!(
            changed,
            vec![
                PropertyName::SamplingRate,
                PropertyName::MaxFreq,
                PropertyName::Comment
            ]
        );
        assert_eq!(store.properties().sampling_rate(), 48000);
        assert_eq!(store.properties().max_freq(), 16000.0);
        assert_eq!(store.properties().comment(), "room A");
    }

    #[test]
    fn test_set_values_is_all_or_nothing() {
        let mut store = store();
        let err = store
            .set_values([("samplingRate", json!(48000)), ("fftDegre", json!(16))])
            .unwrap_err();
        assert!(matches!(err, PropsError::UnknownProperty { .. }));
        assert_eq!(store.properties().sampling_rate(), 44100);

        let err = store
            .set_values([("samplingRate", json!(48000)), ("minFreq", json!(25000))])
            .unwrap_err();
        assert!(matches!(err, PropsError::InvalidConfigValueError { .. }));
        assert_eq!(store.properties().sampling_rate(), 44100);
    }

    #[test]
    fn test_unchanged_value_is_skipped() {
        let mut store = store();
        assert!(!store.set("samplingRate", json!(44100)).unwrap());
        assert!(!store.set("device", json!([0, 0])).unwrap());
        assert!(store.set("fftDegree", json!(16)).unwrap());
    }

    #[test]
    fn test_device_name_resolving_to_current_pair_is_unchanged() {
        let mut store = store();
        let changed = store.set_values([("device", json!("default"))]).unwrap();
        assert!(changed.is_empty());
        assert_eq!(store.properties().device(), &DevicePair::indices(0, 0));

        let changed = store
            .set_values([("device", json!("DEFAULT")), ("fftDegree", json!(12))])
            .unwrap();
        assert_eq!(changed, vec![PropertyName::FftDegree]);
        assert_eq!(store.properties().device(), &DevicePair::indices(0, 0));
    }

    #[test]
    fn test_derived_property_is_read_only() {
        let mut store = store();
        let err = store.set("margins", json!({"start": 0.1, "stop": 0.1})).unwrap_err();
        assert!(matches!(err, PropsError::ReadOnlyProperty { .. }));
    }

    #[test]
    fn test_unknown_device_leaves_state_untouched() {
        let mut store = store();
        let err = store.set("device", json!(7)).unwrap_err();
        assert!(matches!(err, PropsError::DeviceError { .. }));
        assert_eq!(store.properties().device(), &DevicePair::indices(0, 0));
    }

    #[test]
    fn test_reset_restores_factory() {
        let mut store = store();
        store
            .set_values([("lengthDomain", json!("time")), ("inChannel", json!([1, 2]))])
            .unwrap();
        assert_eq!(store.properties().length_domain(), LengthDomain::Time);

        store.reset().unwrap();
        assert_eq!(store.properties(), store.factory());
    }

    #[test]
    fn test_load_json_snapshot() {
        let mut source = store();
        source.set_values([("timeLength", json!(2.5)), ("stopMargin", json!(1))]).unwrap();
        let snapshot = source.to_json().unwrap();

        let mut target = store();
        let changed = target.load_json(&snapshot).unwrap();
        assert_eq!(changed, vec![PropertyName::TimeLength, PropertyName::StopMargin]);
        assert_eq!(target.properties(), source.properties());
    }

    #[test]
    fn test_toml_export_contains_camel_case_keys() {
        let toml = store().to_toml().unwrap();
        assert!(toml.contains("samplingRate = 44100"));
        assert!(toml.contains("lengthDomain = \"samples\""));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("samplingRate=48000").unwrap(),
            ("samplingRate".to_string(), json!(48000))
        );
        assert_eq!(
            parse_assignment("comment = hall B").unwrap(),
            ("comment".to_string(), json!("hall B"))
        );
        assert_eq!(
            parse_assignment("device=[1,2]").unwrap(),
            ("device".to_string(), json!([1, 2]))
        );
        assert!(parse_assignment("samplingRate").is_err());
    }
}

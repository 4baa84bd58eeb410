use crate::core::device::StaticDeviceBackend;
use crate::core::properties::PropertyStore;
use crate::domain::model::{DeviceInfo, Properties, PropertyName};
use crate::domain::ports::DeviceBackend;
use crate::utils::error::{PropsError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Factory-default overrides loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactoryConfig {
    /// Any subset of the properties, camelCase or snake_case keys.
    pub defaults: Option<toml::Table>,
    pub devices: Option<Vec<DeviceInfo>>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FactoryConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        tracing::debug!("Loaded factory config from {}", path.as_ref().display());
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PropsError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MEASUREMENT_DEVICE})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            PropsError::ConfigValidationError {
                field: "environment".to_string(),
                message: e.to_string(),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn device_backend(&self) -> Result<StaticDeviceBackend> {
        match &self.devices {
            Some(devices) => {
                for device in devices {
                    validate_non_empty_string("devices.name", &device.name)?;
                }
                StaticDeviceBackend::with_devices(devices.clone())
            }
            None => Ok(StaticDeviceBackend::default()),
        }
    }

    /// Built-in factory values overlaid with the `[defaults]` table.
    pub fn factory_properties(&self, backend: &dyn DeviceBackend) -> Result<Properties> {
        let mut factory = Properties::factory(backend.default_device());
        if let Some(defaults) = &self.defaults {
            for (key, value) in defaults {
                let name: PropertyName = key.parse()?;
                factory.assign(name, serde_json::to_value(value)?)?;
            }
        }
        factory.validate()?;
        Ok(factory)
    }

    pub fn build_store(&self) -> Result<PropertyStore> {
        let backend = Arc::new(self.device_backend()?);
        let factory = self.factory_properties(backend.as_ref())?;
        PropertyStore::with_factory(factory, backend)
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(level) = self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            validate_non_empty_string("logging.level", level)?;
        }
        self.build_store().map(|_| ())
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging
            .as_ref()
            .and_then(|l| l.format)
            .unwrap_or_default()
    }
}

impl Validate for FactoryConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DevicePair, LengthDomain};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_defaults_section() {
        let toml_content = r#"
[defaults]
samplingRate = 48000
length_domain = "time"
timeLength = 2
inChannel = [1, 2]
comment = "Anechoic chamber"
"#;

        let config = FactoryConfig::from_toml_str(toml_content).unwrap();
        let store = config.build_store().unwrap();
        let factory = store.factory();

        assert_eq!(factory.sampling_rate(), 48000);
        assert_eq!(factory.length_domain(), LengthDomain::Time);
        assert_eq!(factory.time_length(), 2.0);
        assert_eq!(factory.in_channel(), &[1, 2]);
        assert_eq!(factory.comment(), "Anechoic chamber");
        assert_eq!(factory.num_samples(), 96_000);
        assert_eq!(store.properties(), factory);
    }

    #[test]
    fn test_empty_config_uses_builtin_factory() {
        let config = FactoryConfig::from_toml_str("").unwrap();
        let store = config.build_store().unwrap();
        assert_eq!(store.factory(), &Properties::factory(DevicePair::indices(0, 0)));
        assert_eq!(config.log_format(), LogFormat::Compact);
    }

    #[test]
    fn test_unknown_default_key_rejected() {
        let config = FactoryConfig::from_toml_str("[defaults]\nsampleRate = 48000\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(PropsError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn test_invalid_defaults_rejected() {
        let config =
            FactoryConfig::from_toml_str("[defaults]\nminFreq = 500\nmaxFreq = 100\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_fft_degree_rejected_before_use() {
        let config = FactoryConfig::from_toml_str("[defaults]\nfftDegree = 64\n").unwrap();
        let backend = config.device_backend().unwrap();
        assert!(matches!(
            config.factory_properties(&backend),
            Err(PropsError::InvalidConfigValueError { .. })
        ));
        assert!(config.build_store().is_err());
    }

    #[test]
    fn test_whole_number_float_sampling_rate() {
        let config = FactoryConfig::from_toml_str("[defaults]\nsamplingRate = 48000.0\n").unwrap();
        let store = config.build_store().unwrap();
        assert_eq!(store.factory().sampling_rate(), 48000);
    }

    #[test]
    fn test_device_list_and_selection() {
        let toml_content = r#"
[defaults]
device = ["Interface", "Interface"]

[[devices]]
index = 0
name = "Laptop Mic"
max_input_channels = 1
max_output_channels = 0

[[devices]]
index = 3
name = "Interface"
max_input_channels = 8
max_output_channels = 8
default_sample_rate = 96000.0
"#;
        let config = FactoryConfig::from_toml_str(toml_content).unwrap();
        let store = config.build_store().unwrap();
        assert_eq!(store.factory().device(), &DevicePair::indices(3, 3));
        assert_eq!(store.list_devices().len(), 2);
        assert_eq!(store.list_devices()[0].default_sample_rate, 44100.0);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PYTTA_TEST_COMMENT", "from env");

        let config =
            FactoryConfig::from_toml_str("[defaults]\ncomment = \"${PYTTA_TEST_COMMENT}\"\n")
                .unwrap();
        let store = config.build_store().unwrap();
        assert_eq!(store.factory().comment(), "from env");

        std::env::remove_var("PYTTA_TEST_COMMENT");
    }

    #[test]
    fn test_logging_section() {
        let config =
            FactoryConfig::from_toml_str("[logging]\nlevel = \"debug\"\nformat = \"json\"\n")
                .unwrap();
        assert_eq!(config.log_level(), Some("debug"));
        assert_eq!(config.log_format(), LogFormat::Json);

        assert!(FactoryConfig::from_toml_str("[logging]\nformat = \"xml\"\n").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[defaults]\nfftDegree = 16\n")
            .unwrap();

        let config = FactoryConfig::from_file(temp_file.path()).unwrap();
        let store = config.build_store().unwrap();
        assert_eq!(store.factory().fft_degree(), 16);
        assert_eq!(store.factory().num_samples(), 65_536);
    }
}

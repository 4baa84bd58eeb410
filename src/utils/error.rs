use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropsError {
    #[error("There is no default setting for '{name}'. Known properties: {known}")]
    UnknownProperty { name: String, known: String },

    #[error("Property '{name}' is derived and cannot be set directly")]
    ReadOnlyProperty { name: String },

    #[error("Property '{field}' expects {expected}, got {value}")]
    TypeMismatch {
        field: String,
        expected: String,
        value: String,
    },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Audio device error: {message}")]
    DeviceError { message: String },

    #[error("Process-wide defaults are already initialized")]
    AlreadyInitialized,

    #[error("Defaults lock was poisoned by a panicking writer")]
    LockPoisoned,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Property,
    Configuration,
    Device,
    Concurrency,
    Io,
    Serialization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 根據錯誤嚴重程度決定退出碼
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 裝置錯誤，可重試
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        }
    }
}

impl PropsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PropsError::UnknownProperty { .. }
            | PropsError::ReadOnlyProperty { .. }
            | PropsError::TypeMismatch { .. } => ErrorCategory::Property,
            PropsError::InvalidConfigValueError { .. }
            | PropsError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            PropsError::DeviceError { .. } => ErrorCategory::Device,
            PropsError::AlreadyInitialized | PropsError::LockPoisoned => {
                ErrorCategory::Concurrency
            }
            PropsError::IoError(_) => ErrorCategory::Io,
            PropsError::SerializationError(_)
            | PropsError::TomlError(_)
            | PropsError::TomlSerializeError(_) => ErrorCategory::Serialization,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PropsError::AlreadyInitialized => ErrorSeverity::Low,
            PropsError::DeviceError { .. } => ErrorSeverity::Medium,
            PropsError::LockPoisoned => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PropsError::UnknownProperty { known, .. } => {
                format!("Check the property name spelling. Valid names: {}", known)
            }
            PropsError::ReadOnlyProperty { name } => match name.as_str() {
                "freqLims" => "Set minFreq and maxFreq instead".to_string(),
                "margins" => "Set startMargin and stopMargin instead".to_string(),
                _ => "Set fftDegree, samplingRate or timeLength instead".to_string(),
            },
            PropsError::TypeMismatch { expected, .. } => {
                format!("Pass {} for this property", expected)
            }
            PropsError::InvalidConfigValueError { field, .. } => {
                format!("Adjust '{}' to a value inside its allowed range", field)
            }
            PropsError::ConfigValidationError { .. } => {
                "Fix the configuration file and run `pytta-props check`".to_string()
            }
            PropsError::DeviceError { .. } => {
                "Run `pytta-props devices` to see the available audio devices".to_string()
            }
            PropsError::AlreadyInitialized => {
                "Install custom defaults before the first call to defaults()".to_string()
            }
            PropsError::LockPoisoned => "Restart the process".to_string(),
            PropsError::IoError(_) => "Check that the file exists and is writable".to_string(),
            PropsError::SerializationError(_) => "Make sure the snapshot is valid JSON".to_string(),
            PropsError::TomlError(_) | PropsError::TomlSerializeError(_) => {
                "Make sure the file is valid TOML".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Property => format!("Property error: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Device => format!("Device problem: {}", self),
            ErrorCategory::Concurrency => format!("Internal state problem: {}", self),
            ErrorCategory::Io => format!("File problem: {}", self),
            ErrorCategory::Serialization => format!("Format problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, PropsError>;

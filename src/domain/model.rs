use crate::utils::error::{PropsError, Result};
use crate::utils::validation::{
    validate_channels, validate_non_negative, validate_positive, validate_range, Validate,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SAMPLING_RATE: u32 = 44100;
pub const DEFAULT_FFT_DEGREE: u32 = 18;
pub const MAX_FFT_DEGREE: u32 = 30;
pub const DEFAULT_COMMENT: &str = "No comments.";

/// How the recording length is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthDomain {
    #[default]
    Samples,
    Time,
}

impl FromStr for LengthDomain {
    type Err = PropsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "samples" => Ok(LengthDomain::Samples),
            "time" => Ok(LengthDomain::Time),
            _ => Err(PropsError::InvalidConfigValueError {
                field: "lengthDomain".to_string(),
                value: s.to_string(),
                reason: "May be 'samples' or 'time'".to_string(),
            }),
        }
    }
}

impl fmt::Display for LengthDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthDomain::Samples => write!(f, "samples"),
            LengthDomain::Time => write!(f, "time"),
        }
    }
}

/// An audio device, either by backend index or by (partial) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceRef {
    Index(u32),
    Name(String),
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceRef::Index(index) => write!(f, "{}", index),
            DeviceRef::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Input and output device, serialized as `[input, output]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DeviceSelection", into = "[DeviceRef; 2]")]
pub struct DevicePair {
    pub input: DeviceRef,
    pub output: DeviceRef,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeviceSelection {
    Pair([DeviceRef; 2]),
    Both(DeviceRef),
}

impl From<DeviceSelection> for DevicePair {
    fn from(selection: DeviceSelection) -> Self {
        match selection {
            DeviceSelection::Pair([input, output]) => DevicePair { input, output },
            DeviceSelection::Both(device) => DevicePair::both(device),
        }
    }
}

impl From<DevicePair> for [DeviceRef; 2] {
    fn from(pair: DevicePair) -> Self {
        [pair.input, pair.output]
    }
}

impl DevicePair {
    pub fn new(input: DeviceRef, output: DeviceRef) -> Self {
        Self { input, output }
    }

    pub fn both(device: DeviceRef) -> Self {
        Self {
            input: device.clone(),
            output: device,
        }
    }

    pub fn indices(input: u32, output: u32) -> Self {
        Self::new(DeviceRef::Index(input), DeviceRef::Index(output))
    }
}

impl fmt::Display for DevicePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.input, self.output)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub index: u32,
    pub name: String,
    pub max_input_channels: u16,
    pub max_output_channels: u16,
    #[serde(default = "default_device_rate")]
    pub default_sample_rate: f64,
}

fn default_device_rate() -> f64 {
    DEFAULT_SAMPLING_RATE as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreqLims {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub start: f64,
    pub stop: f64,
}

/// Names of the settable properties, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyName {
    SamplingRate,
    LengthDomain,
    FftDegree,
    TimeLength,
    Integration,
    MinFreq,
    MaxFreq,
    Device,
    InChannel,
    OutChannel,
    StopMargin,
    StartMargin,
    Comment,
}

impl PropertyName {
    pub const ALL: [PropertyName; 13] = [
        PropertyName::SamplingRate,
        PropertyName::LengthDomain,
        PropertyName::FftDegree,
        PropertyName::TimeLength,
        PropertyName::Integration,
        PropertyName::MinFreq,
        PropertyName::MaxFreq,
        PropertyName::Device,
        PropertyName::InChannel,
        PropertyName::OutChannel,
        PropertyName::StopMargin,
        PropertyName::StartMargin,
        PropertyName::Comment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyName::SamplingRate => "samplingRate",
            PropertyName::LengthDomain => "lengthDomain",
            PropertyName::FftDegree => "fftDegree",
            PropertyName::TimeLength => "timeLength",
            PropertyName::Integration => "integration",
            PropertyName::MinFreq => "minFreq",
            PropertyName::MaxFreq => "maxFreq",
            PropertyName::Device => "device",
            PropertyName::InChannel => "inChannel",
            PropertyName::OutChannel => "outChannel",
            PropertyName::StopMargin => "stopMargin",
            PropertyName::StartMargin => "startMargin",
            PropertyName::Comment => "comment",
        }
    }

    fn lookup(name: &str) -> Option<PropertyName> {
        let name = match name.trim() {
            "sampling_rate" => "samplingRate",
            "length_domain" => "lengthDomain",
            "fft_degree" => "fftDegree",
            "time_length" => "timeLength",
            "min_freq" => "minFreq",
            "max_freq" => "maxFreq",
            "devices" => "device",
            "in_channel" | "inputChannels" => "inChannel",
            "out_channel" | "outputChannels" => "outChannel",
            "stop_margin" => "stopMargin",
            "start_margin" => "startMargin",
            other => other,
        };
        PropertyName::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == name)
    }

    pub fn known_names() -> String {
        PropertyName::ALL
            .iter()
            .map(|name| name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyName {
    type Err = PropsError;

    fn from_str(s: &str) -> Result<Self> {
        match PropertyKey::parse(s)? {
            PropertyKey::Settable(name) => Ok(name),
            PropertyKey::Derived(derived) => Err(PropsError::ReadOnlyProperty {
                name: derived.as_str().to_string(),
            }),
        }
    }
}

/// Read-only views computed from other properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedProperty {
    FreqLims,
    Margins,
    NumSamples,
}

impl DerivedProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivedProperty::FreqLims => "freqLims",
            DerivedProperty::Margins => "margins",
            DerivedProperty::NumSamples => "numSamples",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKey {
    Settable(PropertyName),
    Derived(DerivedProperty),
}

impl PropertyKey {
    pub fn parse(name: &str) -> Result<Self> {
        if let Some(settable) = PropertyName::lookup(name) {
            return Ok(PropertyKey::Settable(settable));
        }
        match name.trim() {
            "freqLims" | "freq_lims" => Ok(PropertyKey::Derived(DerivedProperty::FreqLims)),
            "margins" => Ok(PropertyKey::Derived(DerivedProperty::Margins)),
            "numSamples" | "num_samples" => Ok(PropertyKey::Derived(DerivedProperty::NumSamples)),
            _ => Err(PropsError::UnknownProperty {
                name: name.to_string(),
                known: PropertyName::known_names(),
            }),
        }
    }
}

/// Parameter values shared by signal and measurement objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Properties {
    sampling_rate: u32,
    length_domain: LengthDomain,
    fft_degree: u32,
    time_length: f64,
    integration: f64,
    min_freq: f64,
    max_freq: f64,
    device: DevicePair,
    in_channel: Vec<u16>,
    out_channel: Vec<u16>,
    stop_margin: f64,
    start_margin: f64,
    comment: String,
}

impl Properties {
    /// 出廠預設值，裝置由呼叫端決定
    pub fn factory(device: DevicePair) -> Self {
        Self {
            sampling_rate: DEFAULT_SAMPLING_RATE,
            length_domain: LengthDomain::Samples,
            fft_degree: DEFAULT_FFT_DEGREE,
            time_length: 10.0,
            integration: 0.125,
            min_freq: 20.0,
            max_freq: 20000.0,
            device,
            in_channel: vec![1],
            out_channel: vec![1],
            stop_margin: 0.7,
            start_margin: 0.3,
            comment: DEFAULT_COMMENT.to_string(),
        }
    }

    pub fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    pub fn length_domain(&self) -> LengthDomain {
        self.length_domain
    }

    pub fn fft_degree(&self) -> u32 {
        self.fft_degree
    }

    pub fn time_length(&self) -> f64 {
        self.time_length
    }

    pub fn integration(&self) -> f64 {
        self.integration
    }

    pub fn min_freq(&self) -> f64 {
        self.min_freq
    }

    pub fn max_freq(&self) -> f64 {
        self.max_freq
    }

    pub fn freq_lims(&self) -> FreqLims {
        FreqLims {
            min: self.min_freq,
            max: self.max_freq,
        }
    }

    pub fn device(&self) -> &DevicePair {
        &self.device
    }

    pub fn in_channel(&self) -> &[u16] {
        &self.in_channel
    }

    pub fn out_channel(&self) -> &[u16] {
        &self.out_channel
    }

    pub fn start_margin(&self) -> f64 {
        self.start_margin
    }

    pub fn stop_margin(&self) -> f64 {
        self.stop_margin
    }

    pub fn margins(&self) -> Margins {
        Margins {
            start: self.start_margin,
            stop: self.stop_margin,
        }
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Signal length in samples: `2^fftDegree` in the samples domain,
    /// `samplingRate * timeLength` in the time domain. Saturates at `u64::MAX`.
    pub fn num_samples(&self) -> u64 {
        match self.length_domain {
            LengthDomain::Samples => 1u64.checked_shl(self.fft_degree).unwrap_or(u64::MAX),
            LengthDomain::Time => (self.sampling_rate as f64 * self.time_length).round() as u64,
        }
    }

    pub fn nyquist(&self) -> f64 {
        self.sampling_rate as f64 / 2.0
    }

    pub fn value_of(&self, name: PropertyName) -> Result<Value> {
        let value = match name {
            PropertyName::SamplingRate => serde_json::to_value(self.sampling_rate)?,
            PropertyName::LengthDomain => serde_json::to_value(self.length_domain)?,
            PropertyName::FftDegree => serde_json::to_value(self.fft_degree)?,
            PropertyName::TimeLength => serde_json::to_value(self.time_length)?,
            PropertyName::Integration => serde_json::to_value(self.integration)?,
            PropertyName::MinFreq => serde_json::to_value(self.min_freq)?,
            PropertyName::MaxFreq => serde_json::to_value(self.max_freq)?,
            PropertyName::Device => serde_json::to_value(&self.device)?,
            PropertyName::InChannel => serde_json::to_value(&self.in_channel)?,
            PropertyName::OutChannel => serde_json::to_value(&self.out_channel)?,
            PropertyName::StopMargin => serde_json::to_value(self.stop_margin)?,
            PropertyName::StartMargin => serde_json::to_value(self.start_margin)?,
            PropertyName::Comment => serde_json::to_value(&self.comment)?,
        };
        Ok(value)
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        match PropertyKey::parse(name)? {
            PropertyKey::Settable(name) => self.value_of(name),
            PropertyKey::Derived(DerivedProperty::FreqLims) => {
                Ok(serde_json::to_value(self.freq_lims())?)
            }
            PropertyKey::Derived(DerivedProperty::Margins) => {
                Ok(serde_json::to_value(self.margins())?)
            }
            PropertyKey::Derived(DerivedProperty::NumSamples) => Ok(Value::from(self.num_samples())),
        }
    }

    /// Converts `value` to the property's type and stores it.
    /// Returns `false` when the value was already set.
    pub(crate) fn assign(&mut self, name: PropertyName, value: Value) -> Result<bool> {
        match name {
            PropertyName::SamplingRate => {
                replace(
                    &mut self.sampling_rate,
                    convert(name, whole_number(value), "a positive integer")?,
                )
            }
            PropertyName::LengthDomain => {
                let domain: LengthDomain = match value {
                    Value::String(s) => s.parse()?,
                    other => convert(name, other, "'samples' or 'time'")?,
                };
                replace(&mut self.length_domain, domain)
            }
            PropertyName::FftDegree => {
                replace(
                    &mut self.fft_degree,
                    convert(name, whole_number(value), "a positive integer")?,
                )
            }
            PropertyName::TimeLength => {
                replace(&mut self.time_length, convert(name, value, "a number of seconds")?)
            }
            PropertyName::Integration => {
                replace(&mut self.integration, convert(name, value, "a number of seconds")?)
            }
            PropertyName::MinFreq => replace(&mut self.min_freq, convert(name, value, "a frequency in Hz")?),
            PropertyName::MaxFreq => replace(&mut self.max_freq, convert(name, value, "a frequency in Hz")?),
            PropertyName::Device => replace(
                &mut self.device,
                convert(name, value, "a device index, a device name or an [input, output] pair")?,
            ),
            PropertyName::InChannel => {
                replace(&mut self.in_channel, convert_channels(name, value)?)
            }
            PropertyName::OutChannel => {
                replace(&mut self.out_channel, convert_channels(name, value)?)
            }
            PropertyName::StopMargin => {
                replace(&mut self.stop_margin, convert(name, value, "a number of seconds")?)
            }
            PropertyName::StartMargin => {
                replace(&mut self.start_margin, convert(name, value, "a number of seconds")?)
            }
            PropertyName::Comment => {
                let comment = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                replace(&mut self.comment, comment)
            }
        }
    }

    /// 以 `name = value` 表格列出所有屬性
    pub fn view(&self) -> Result<String> {
        let mut out = String::new();
        for name in PropertyName::ALL {
            let value = display_value(&self.value_of(name)?);
            let separator = if name.as_str().len() <= 7 { "\t\t" } else { "\t" };
            out.push_str(&format!("{}{} = {}\n", name, separator, value));
        }
        Ok(out)
    }
}

impl Validate for Properties {
    fn validate(&self) -> Result<()> {
        if self.sampling_rate == 0 {
            return Err(PropsError::InvalidConfigValueError {
                field: "samplingRate".to_string(),
                value: "0".to_string(),
                reason: "Sampling rate must be greater than zero".to_string(),
            });
        }
        validate_range("fftDegree", self.fft_degree, 1, MAX_FFT_DEGREE)?;
        validate_positive("timeLength", self.time_length)?;
        validate_positive("integration", self.integration)?;
        validate_non_negative("minFreq", self.min_freq)?;
        validate_positive("maxFreq", self.max_freq)?;
        if self.min_freq >= self.max_freq {
            return Err(PropsError::InvalidConfigValueError {
                field: "freqLims".to_string(),
                value: format!("[{}, {}]", self.min_freq, self.max_freq),
                reason: "minFreq must be lower than maxFreq".to_string(),
            });
        }
        validate_channels("inChannel", &self.in_channel)?;
        validate_channels("outChannel", &self.out_channel)?;
        validate_non_negative("startMargin", self.start_margin)?;
        validate_non_negative("stopMargin", self.stop_margin)?;

        if self.max_freq > self.nyquist() {
            tracing::warn!(
                "maxFreq {} Hz is above the Nyquist frequency {} Hz for samplingRate {}",
                self.max_freq,
                self.nyquist(),
                self.sampling_rate
            );
        }
        Ok(())
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> Result<bool> {
    if *slot == value {
        return Ok(false);
    }
    *slot = value;
    Ok(true)
}

fn convert<T: DeserializeOwned>(name: PropertyName, value: Value, expected: &str) -> Result<T> {
    let shown = value.to_string();
    serde_json::from_value(value).map_err(|_| PropsError::TypeMismatch {
        field: name.to_string(),
        expected: expected.to_string(),
        value: shown,
    })
}

/// `48000.0` becomes `48000`; fractional or negative numbers are left as is.
fn whole_number(value: Value) -> Value {
    match value.as_f64() {
        Some(number)
            if value.is_f64() && number.is_finite() && number >= 0.0 && number.fract() == 0.0
                && number <= u64::MAX as f64 =>
        {
            Value::from(number as u64)
        }
        _ => value,
    }
}

/// A bare channel number is accepted as a one-element list.
fn convert_channels(name: PropertyName, value: Value) -> Result<Vec<u16>> {
    let value = match value {
        Value::Number(_) => Value::Array(vec![whole_number(value)]),
        Value::Array(items) => Value::Array(items.into_iter().map(whole_number).collect()),
        other => other,
    };
    convert(name, value, "a list of channel numbers")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(display_value).collect::<Vec<_>>().join(", ")
        ),
        other => other.to_string(),
    }
}

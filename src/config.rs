use crate::ess::Characteristic;
use crate::ess::trigger::MAX_INTERVAL_SECS;
use crate::error::{EssError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (key, value) in content.lines().filter_map(parse_env_line) {
        // Only set if not already set (env vars take precedence)
        if std::env::var(key).is_err() {
            // SAFETY: called from `main` before the runtime and any other thread start
            unsafe { std::env::set_var(key, value) };
        }
    }
}

fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let mut value = value.trim();
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = &value[1..value.len() - 1];
    }
    Some((key.trim(), value))
}

/// Default location of the JSON configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("virtual-ess-peripheral").join("config.json"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub sampling: SamplingConfig,
    pub subscriber: SubscriberConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub device_name: String,
    /// Value handle of the first channel; later channels follow at `handle_stride`
    pub handle_base: u16,
    pub handle_stride: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_name: "Virtual ESS Peripheral".to_string(),
            handle_base: 0x0010,
            handle_stride: 8,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Seed for the simulated sample source (entropy when absent)
    pub seed: Option<u64>,
    /// Startup trigger interval for every channel; inactive when absent
    pub default_interval_secs: Option<u32>,
}

/// Simulated subscriber applied at startup, for running without a radio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriberConfig {
    /// Channel names (e.g. "temperature") to configure and enable
    pub channels: Vec<String>,
    /// Trigger setting written before enabling, as hex (e.g. "01050000")
    pub trigger: String,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            trigger: "01050000".to_string(),
        }
    }
}

impl SubscriberConfig {
    pub fn characteristics(&self) -> Result<Vec<Characteristic>> {
        self.channels
            .iter()
            .map(|name| {
                Characteristic::from_name(name)
                    .ok_or_else(|| EssError::UnknownCharacteristic(name.clone()))
            })
            .collect()
    }

    pub fn trigger_bytes(&self) -> Result<Vec<u8>> {
        parse_hex(&self.trigger)
            .ok_or_else(|| EssError::InvalidConfig(format!("bad trigger hex: {}", self.trigger)))
    }
}

fn parse_hex(text: &str) -> Option<Vec<u8>> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() || digits.len() % 2 != 0 {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok())
        .collect()
}

impl Config {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn from_env() -> Result<Self> {
        Self::default().with_env()
    }

    /// Override fields from `ESS_*` environment variables.
    pub fn with_env(mut self) -> Result<Self> {
        if let Ok(name) = std::env::var("ESS_DEVICE_NAME") {
            self.device.device_name = name;
        }
        if let Ok(base) = std::env::var("ESS_HANDLE_BASE")
            && let Some(b) = parse_u16(&base)
        {
            self.device.handle_base = b;
        }
        if let Ok(seed) = std::env::var("ESS_SAMPLE_SEED")
            && let Ok(s) = seed.parse()
        {
            self.sampling.seed = Some(s);
        }
        if let Ok(interval) = std::env::var("ESS_DEFAULT_INTERVAL_SECS")
            && let Ok(i) = interval.parse()
        {
            self.sampling.default_interval_secs = Some(i);
        }
        if let Ok(channels) = std::env::var("ESS_SUBSCRIBE") {
            self.subscriber.channels = channels
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(trigger) = std::env::var("ESS_SUBSCRIBE_TRIGGER") {
            self.subscriber.trigger = trigger;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(secs) = self.sampling.default_interval_secs
            && secs > MAX_INTERVAL_SECS
        {
            return Err(EssError::InvalidConfig(format!(
                "default interval {} s exceeds {} s",
                secs, MAX_INTERVAL_SECS
            )));
        }
        Ok(())
    }
}

fn parse_u16(text: &str) -> Option<u16> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

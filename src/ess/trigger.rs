//! ES Trigger Setting descriptor (0x290D).
//!
//! A subscriber writes a condition code followed by an operand:
//!
//! ```text
//! [0x00]                       inactive
//! [0x01|0x02, i0, i1, i2]      time based, 24-bit LE interval in seconds
//! [0x03]                       notify when the value changes
//! [0x04..=0x09, threshold..]   compare against a threshold (channel format)
//! ```
//!
//! Parsing produces a complete new [`TriggerSetting`]; nothing is applied to
//! a channel until the whole write has been validated.

use super::codec::{Value, ValueFormat};
use crate::error::AttError;
use serde::Serialize;
use strum::FromRepr;

/// Largest interval the 24-bit interval field holds, in seconds.
pub const MAX_INTERVAL_SECS: u32 = 0xFF_FFFF;

/// Smallest accepted maximum write length (condition + 24-bit interval).
const MIN_MAX_LEN: usize = 4;

/// Trigger condition codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, FromRepr, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Condition {
    /// Trigger inactive
    Inactive = 0x00,
    /// Use a fixed time interval between transmissions
    FixedInterval = 0x01,
    /// No less than the specified time between transmissions
    MinimumInterval = 0x02,
    /// When value changes compared to previous value
    OnChange = 0x03,
    /// While less than the specified value
    LessThan = 0x04,
    /// While less than or equal to the specified value
    LessOrEqual = 0x05,
    /// While greater than the specified value
    GreaterThan = 0x06,
    /// While greater than or equal to the specified value
    GreaterOrEqual = 0x07,
    /// While equal to the specified value
    Equal = 0x08,
    /// While not equal to the specified value
    NotEqual = 0x09,
}

impl Condition {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Operating mode implied by this condition.
    pub fn mode(self) -> TriggerMode {
        match self {
            Condition::Inactive => TriggerMode::Inactive,
            Condition::FixedInterval | Condition::MinimumInterval => TriggerMode::Time,
            _ => TriggerMode::Value,
        }
    }

    /// Whether the condition carries a threshold operand.
    pub fn has_threshold(self) -> bool {
        self.as_u8() >= Condition::LessThan.as_u8()
    }
}

/// Derived operating mode of a channel's trigger.
///
/// Exactly one of inactive, time driven, or value driven holds at a time, so
/// the three flags collapse into one enum.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    Inactive,
    Time,
    Value,
}

/// Current trigger configuration of one channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TriggerSetting {
    condition: Condition,
    /// 24-bit little-endian interval in seconds
    interval: [u8; 3],
    /// One threshold component per value dimension
    threshold: Value,
}

impl TriggerSetting {
    /// An inactive trigger with zeroed operands for `format`.
    pub fn inactive(format: &ValueFormat) -> Self {
        Self {
            condition: Condition::Inactive,
            interval: [0; 3],
            threshold: Value::splat(0, format.dims),
        }
    }

    /// A fixed-interval trigger firing every `seconds`, saturated at [`MAX_INTERVAL_SECS`].
    pub fn fixed_interval(format: &ValueFormat, seconds: u32) -> Self {
        let bytes = seconds.min(MAX_INTERVAL_SECS).to_le_bytes();
        Self {
            condition: Condition::FixedInterval,
            interval: [bytes[0], bytes[1], bytes[2]],
            threshold: Value::splat(0, format.dims),
        }
    }

    /// Maximum accepted write length for a channel of `format`.
    pub fn max_len(format: &ValueFormat) -> usize {
        MIN_MAX_LEN.max(1 + format.encoded_len())
    }

    /// Validate a descriptor write and return the setting it describes.
    ///
    /// Operands not carried by the new condition (interval for threshold
    /// conditions, threshold for time conditions) are kept from `self`.
    pub fn parse(&self, format: &ValueFormat, bytes: &[u8]) -> Result<Self, AttError> {
        let len = bytes.len();
        if len == 0 || len > Self::max_len(format) {
            return Err(AttError::InvalidLength(len));
        }

        let code = bytes[0];
        let condition = Condition::from_repr(code).ok_or(AttError::OutOfRange(code))?;
        let mut next = self.clone();
        next.condition = condition;

        match condition {
            Condition::Inactive | Condition::OnChange => {
                if len != 1 {
                    return Err(AttError::InvalidLength(len));
                }
            }
            Condition::FixedInterval | Condition::MinimumInterval => {
                if len != 4 {
                    return Err(AttError::InvalidLength(len));
                }
                next.interval.copy_from_slice(&bytes[1..4]);
            }
            _ => {
                next.threshold = format
                    .decode(&bytes[1..])
                    .ok_or(AttError::InvalidLength(len))?;
            }
        }

        Ok(next)
    }

    /// Encode the descriptor value returned on read.
    pub fn encode(&self, format: &ValueFormat) -> Vec<u8> {
        let mut out = vec![self.condition.as_u8()];
        match self.mode() {
            TriggerMode::Time => out.extend_from_slice(&self.interval),
            TriggerMode::Value if self.condition.has_threshold() => {
                format.encode_into(&self.threshold, &mut out)
            }
            _ => {}
        }
        out
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn mode(&self) -> TriggerMode {
        self.condition.mode()
    }

    pub fn is_inactive(&self) -> bool {
        self.mode() == TriggerMode::Inactive
    }

    pub fn time_mode(&self) -> bool {
        self.mode() == TriggerMode::Time
    }

    pub fn value_mode(&self) -> bool {
        self.mode() == TriggerMode::Value
    }

    /// Configured interval in seconds.
    pub fn interval_secs(&self) -> u32 {
        u32::from_le_bytes([self.interval[0], self.interval[1], self.interval[2], 0])
    }

    pub fn threshold(&self) -> Value {
        self.threshold
    }
}

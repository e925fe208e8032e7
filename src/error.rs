use thiserror::Error as ThisError;

/// ATT error code: the attribute handle given was not valid.
pub const ATT_ERROR_INVALID_HANDLE: u8 = 0x01;
/// ATT error code: the attribute cannot be written.
pub const ATT_ERROR_WRITE_NOT_PERMITTED: u8 = 0x03;
/// ATT error code: offset past the end of the attribute.
pub const ATT_ERROR_INVALID_OFFSET: u8 = 0x07;
/// ATT error code: the attribute value length is invalid for the operation.
pub const ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LEN: u8 = 0x0D;
/// First application-defined ATT error code.
pub const ATT_ERROR_APPLICATION: u8 = 0x80;
/// ATT common profile error code: value out of range.
pub const ATT_ERROR_OUT_OF_RANGE: u8 = 0xFF;

/// Errors returned synchronously from the attribute read/write entry points.
///
/// The transport translates each variant into a protocol-level rejection via
/// [`AttError::att_code`]. A rejected write never leaves a channel partially
/// modified.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttError {
    #[error("trigger setting length {0} is invalid for its condition")]
    InvalidLength(usize),

    #[error("attribute value length {0} is invalid")]
    InvalidAttributeLength(usize),

    #[error("condition code 0x{0:02X} is reserved")]
    OutOfRange(u8),

    #[error("offset {0} is not supported")]
    InvalidOffset(u16),

    #[error("malformed client configuration value 0x{0:02X}")]
    ApplicationError(u8),

    #[error("characteristic does not accept writes")]
    WriteNotPermitted,

    #[error("no channel is registered for 0x{0:04X}")]
    UnknownChannel(u16),
}

impl AttError {
    /// The ATT protocol error code the transport should report.
    pub fn att_code(&self) -> u8 {
        match self {
            AttError::InvalidLength(_) | AttError::InvalidAttributeLength(_) => {
                ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LEN
            }
            AttError::OutOfRange(_) => ATT_ERROR_OUT_OF_RANGE,
            AttError::InvalidOffset(_) => ATT_ERROR_INVALID_OFFSET,
            AttError::ApplicationError(_) => ATT_ERROR_APPLICATION,
            AttError::WriteNotPermitted => ATT_ERROR_WRITE_NOT_PERMITTED,
            AttError::UnknownChannel(_) => ATT_ERROR_INVALID_HANDLE,
        }
    }
}

/// Process-level errors (configuration, I/O) surfaced by the binary.
#[derive(ThisError, Debug)]
pub enum EssError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown characteristic name: {0}")]
    UnknownCharacteristic(String),

    #[error(transparent)]
    Att(#[from] AttError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EssError>;

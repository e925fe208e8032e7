//! Assigned 16-bit UUIDs for the Environmental Sensing Service.

use serde::Serialize;
use strum::{Display, EnumIter, FromRepr, IntoStaticStr};

/// Environmental Sensing Service
pub const SERVICE_UUID: u16 = 0x181A;

/// Characteristic User Description descriptor
pub const USER_DESCRIPTION_UUID: u16 = 0x2901;
/// Client Characteristic Configuration descriptor
pub const CLIENT_CONFIG_UUID: u16 = 0x2902;
/// Valid Range descriptor
pub const VALID_RANGE_UUID: u16 = 0x2906;
/// ES Measurement descriptor
pub const MEASUREMENT_UUID: u16 = 0x290C;
/// ES Trigger Setting descriptor
pub const TRIGGER_SETTING_UUID: u16 = 0x290D;

/// Measurement characteristics exposed by the service, keyed by UUID.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, FromRepr, EnumIter, Display, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum Characteristic {
    MagneticDeclination = 0x2A2C,
    Elevation = 0x2A6C,
    Pressure = 0x2A6D,
    Temperature = 0x2A6E,
    Humidity = 0x2A6F,
    TrueWindSpeed = 0x2A70,
    TrueWindDirection = 0x2A71,
    ApparentWindSpeed = 0x2A72,
    ApparentWindDirection = 0x2A73,
    GustFactor = 0x2A74,
    PollenConcentration = 0x2A75,
    UvIndex = 0x2A76,
    Irradiance = 0x2A77,
    Rainfall = 0x2A78,
    WindChill = 0x2A79,
    HeatIndex = 0x2A7A,
    DewPoint = 0x2A7B,
    #[strum(serialize = "magnetic_flux_2d")]
    #[serde(rename = "magnetic_flux_2d")]
    MagneticFluxDensity2D = 0x2AA0,
    #[strum(serialize = "magnetic_flux_3d")]
    #[serde(rename = "magnetic_flux_3d")]
    MagneticFluxDensity3D = 0x2AA1,
    BarometricPressureTrend = 0x2AA3,
}

impl Characteristic {
    pub fn uuid(self) -> u16 {
        self as u16
    }

    /// Look up a characteristic by its snake_case name (e.g. `"dew_point"`).
    pub fn from_name(name: &str) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|c| {
            let known: &'static str = c.into();
            known.eq_ignore_ascii_case(name.trim())
        })
    }
}

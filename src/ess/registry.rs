//! Catalog of the measurement channels this peripheral exposes.
//!
//! One table row per characteristic replaces per-measurement code: the value
//! format, valid range, startup value and whether the channel supports
//! triggers are all the engine needs to know about a measurement.
//!
//! Units follow the assigned characteristic definitions, e.g. temperature in
//! 0.01 °C, pressure in 0.1 Pa, humidity in 0.01 %.

use super::codec::{Value, ValueFormat};
use super::descriptors::MeasurementDescriptor;
use super::uuids::Characteristic;
use serde::Serialize;

/// Inclusive bounds of a characteristic value, per component.
///
/// Informational only; writes and samples are not clamped against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidRange {
    pub lower: Value,
    pub upper: Value,
}

impl ValidRange {
    /// Valid Range descriptor (0x2906): lower bound then upper bound.
    pub fn encode(&self, format: &ValueFormat) -> Vec<u8> {
        let mut out = Vec::with_capacity(format.encoded_len() * 2);
        format.encode_into(&self.lower, &mut out);
        format.encode_into(&self.upper, &mut out);
        out
    }
}

/// Static description of one channel.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChannelSpec {
    pub characteristic: Characteristic,
    /// Characteristic User Description
    pub name: &'static str,
    pub format: ValueFormat,
    pub range: ValidRange,
    /// Value reported before the first sample
    pub initial: Value,
    /// Whether trigger setting and client configuration are exposed
    pub has_trigger: bool,
    pub measurement: MeasurementDescriptor,
}

const fn scalar(
    characteristic: Characteristic,
    name: &'static str,
    format: ValueFormat,
    lower: i64,
    upper: i64,
    initial: i64,
) -> ChannelSpec {
    ChannelSpec {
        characteristic,
        name,
        format,
        range: ValidRange {
            lower: Value::scalar(lower),
            upper: Value::scalar(upper),
        },
        initial: Value::scalar(initial),
        has_trigger: true,
        measurement: MeasurementDescriptor::DEFAULT,
    }
}

const U8: ValueFormat = ValueFormat::unsigned(1);
const I8: ValueFormat = ValueFormat::signed(1);
const U16: ValueFormat = ValueFormat::unsigned(2);
const I16: ValueFormat = ValueFormat::signed(2);
const U24: ValueFormat = ValueFormat::unsigned(3);
const I24: ValueFormat = ValueFormat::signed(3);
const U32: ValueFormat = ValueFormat::unsigned(4);
const I16_2D: ValueFormat = ValueFormat::new(2, true, 2);
const I16_3D: ValueFormat = ValueFormat::new(2, true, 3);

/// Every channel, in attribute database order.
pub const CATALOG: &[ChannelSpec] = &[
    scalar(Characteristic::Temperature, "Temperature", I16, -4000, 8500, 2700),
    scalar(Characteristic::ApparentWindSpeed, "Apparent Wind Speed", U16, 0, 6000, 350),
    scalar(Characteristic::ApparentWindDirection, "Apparent Wind Direction", U16, 0, 35999, 18000),
    scalar(Characteristic::DewPoint, "Dew Point", I8, -40, 60, 12),
    scalar(Characteristic::Elevation, "Elevation", I24, -50000, 900000, 12000),
    scalar(Characteristic::GustFactor, "Gust Factor", U8, 10, 50, 15),
    scalar(Characteristic::HeatIndex, "Heat Index", I8, -40, 80, 27),
    scalar(Characteristic::Humidity, "Humidity", U16, 0, 10000, 4500),
    scalar(Characteristic::Irradiance, "Irradiance", U16, 0, 14000, 5000),
    scalar(Characteristic::PollenConcentration, "Pollen Concentration", U24, 0, 100000, 250),
    scalar(Characteristic::Rainfall, "Rainfall", U16, 0, 1000, 0),
    scalar(Characteristic::Pressure, "Pressure", U32, 800000, 1100000, 1013250),
    scalar(Characteristic::TrueWindDirection, "True Wind Direction", U16, 0, 35999, 18000),
    scalar(Characteristic::TrueWindSpeed, "True Wind Speed", U16, 0, 6000, 350),
    scalar(Characteristic::UvIndex, "UV Index", U8, 0, 11, 3),
    scalar(Characteristic::WindChill, "Wind Chill", I8, -60, 10, 5),
    ChannelSpec {
        has_trigger: false,
        ..scalar(Characteristic::BarometricPressureTrend, "Barometric Pressure Trend", U8, 0, 9, 0)
    },
    scalar(Characteristic::MagneticDeclination, "Magnetic Declination", U16, 0, 35999, 250),
    ChannelSpec {
        characteristic: Characteristic::MagneticFluxDensity2D,
        name: "Magnetic Flux Density 2D",
        format: I16_2D,
        range: ValidRange {
            lower: Value::xy(-10000, -10000),
            upper: Value::xy(10000, 10000),
        },
        initial: Value::xy(0, 0),
        has_trigger: true,
        measurement: MeasurementDescriptor::DEFAULT,
    },
    ChannelSpec {
        characteristic: Characteristic::MagneticFluxDensity3D,
        name: "Magnetic Flux Density 3D",
        format: I16_3D,
        range: ValidRange {
            lower: Value::xyz(-10000, -10000, -10000),
            upper: Value::xyz(10000, 10000, 10000),
        },
        initial: Value::xyz(0, 0, 0),
        has_trigger: true,
        measurement: MeasurementDescriptor::DEFAULT,
    },
];

/// Look up the catalog row of a characteristic.
pub fn lookup(characteristic: Characteristic) -> Option<&'static ChannelSpec> {
    CATALOG.iter().find(|s| s.characteristic == characteristic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_characteristic_listed_once() {
        for characteristic in Characteristic::iter() {
            let rows = CATALOG
                .iter()
                .filter(|s| s.characteristic == characteristic)
                .count();
            assert_eq!(rows, 1, "{}", characteristic);
        }
        assert_eq!(CATALOG.len(), 20);
    }

    #[test]
    fn test_ranges_fit_formats() {
        for spec in CATALOG {
            let format = spec.format;
            for value in [spec.range.lower, spec.range.upper, spec.initial] {
                assert_eq!(value.dims(), format.dims, "{}", spec.name);
                for c in value.components() {
                    assert!(
                        (format.min_component()..=format.max_component()).contains(c),
                        "{} component {} out of format",
                        spec.name,
                        c
                    );
                }
            }
        }
    }

    #[test]
    fn test_only_trend_is_read_only() {
        let read_only: Vec<_> = CATALOG
            .iter()
            .filter(|s| !s.has_trigger)
            .map(|s| s.characteristic)
            .collect();
        assert_eq!(read_only, vec![Characteristic::BarometricPressureTrend]);
    }

    #[test]
    fn test_valid_range_encoding() {
        let temperature = lookup(Characteristic::Temperature).unwrap();
        assert_eq!(
            temperature.range.encode(&temperature.format),
            vec![0x60, 0xF0, 0x34, 0x21]
        );

        let flux = lookup(Characteristic::MagneticFluxDensity2D).unwrap();
        assert_eq!(flux.range.encode(&flux.format).len(), 8);
    }
}

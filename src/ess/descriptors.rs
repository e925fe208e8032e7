//! Static descriptors served alongside each measurement.

use serde::Serialize;

/// ES Measurement descriptor (0x290C).
///
/// ## Wire layout (11 bytes, little-endian)
/// ```text
/// flags               u16
/// sampling_function   u8
/// measurement_period  u24   seconds
/// update_interval     u24   seconds
/// application         u8
/// uncertainty         u8    0.5 % steps
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeasurementDescriptor {
    pub flags: u16,
    pub sampling_function: u8,
    pub measurement_period: u32,
    pub update_interval: u32,
    pub application: u8,
    pub uncertainty: u8,
}

impl MeasurementDescriptor {
    pub const ENCODED_LEN: usize = 11;

    /// Instantaneous sampling, refreshed every second.
    pub const DEFAULT: Self = Self {
        flags: 0,
        sampling_function: 0x01,
        measurement_period: 1,
        update_interval: 1,
        application: 0x1D,
        uncertainty: 0x15,
    };

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let flags = self.flags.to_le_bytes();
        let period = self.measurement_period.to_le_bytes();
        let interval = self.update_interval.to_le_bytes();
        [
            flags[0],
            flags[1],
            self.sampling_function,
            period[0],
            period[1],
            period[2],
            interval[0],
            interval[1],
            interval[2],
            self.application,
            self.uncertainty,
        ]
    }
}

impl Default for MeasurementDescriptor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Read `bytes` starting at `offset`, the way long attribute reads work.
///
/// `offset == len` yields an empty tail; anything beyond is rejected.
pub fn read_at_offset(bytes: &[u8], offset: u16) -> Option<Vec<u8>> {
    bytes.get(offset as usize..).map(<[u8]>::to_vec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_layout() {
        let descriptor = MeasurementDescriptor {
            measurement_period: 0x010203,
            update_interval: 60,
            ..MeasurementDescriptor::DEFAULT
        };
        assert_eq!(
            descriptor.encode(),
            [0x00, 0x00, 0x01, 0x03, 0x02, 0x01, 0x3C, 0x00, 0x00, 0x1D, 0x15]
        );
    }

    #[test]
    fn test_read_at_offset() {
        let bytes = [1u8, 2, 3];
        assert_eq!(read_at_offset(&bytes, 0), Some(vec![1, 2, 3]));
        assert_eq!(read_at_offset(&bytes, 2), Some(vec![3]));
        assert_eq!(read_at_offset(&bytes, 3), Some(vec![]));
        assert_eq!(read_at_offset(&bytes, 4), None);
    }
}

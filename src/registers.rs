// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

/// Sunrise register map (Senseair Sunrise I2C memory map).
///
/// Each variant is the first register of a block; [`Register::len`] gives
/// the number of bytes read for it. Multi-byte values are big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    /// 16 error flags
    ErrorStatus = 0x00,
    Co2FilteredCompensated = 0x06,
    /// Chip temperature, 0.01 °C per bit
    Temperature = 0x08,
    /// Measurement count since the last cycle rollover (0..255)
    CycleCount = 0x0D,
    /// Time since the last measurement, 2 s per bit
    CycleTime = 0x0E,
    Co2UnfilteredCompensated = 0x10,
    Co2FilteredUncompensated = 0x12,
    Co2UnfilteredUncompensated = 0x14,
    FirmwareType = 0x2F,
    FirmwareRevisionMajor = 0x38,
    FirmwareRevisionMinor = 0x39,
    SensorId = 0x3A,
    /// 16 ASCII characters
    ProductCode = 0x70,
    CalibrationStatus = 0x81,
    MeasurementMode = 0x95,
    /// Barometric pressure setting, 0.1 hPa per bit
    Pressure = 0xDC,
}

impl Register {
    /// First register offset of the block.
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// Block length in bytes.
    pub const fn len(self) -> usize {
        match self {
            Register::CycleCount
            | Register::FirmwareType
            | Register::FirmwareRevisionMajor
            | Register::FirmwareRevisionMinor
            | Register::CalibrationStatus
            | Register::MeasurementMode => 1,
            Register::SensorId => 4,
            Register::ProductCode => 16,
            _ => 2,
        }
    }

    /// Attribute name used in logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            Register::ErrorStatus => "error status",
            Register::Co2FilteredCompensated => "filtered compensated co2",
            Register::Temperature => "temperature",
            Register::CycleCount => "cycle count",
            Register::CycleTime => "cycle time",
            Register::Co2UnfilteredCompensated => "unfiltered compensated co2",
            Register::Co2FilteredUncompensated => "filtered uncompensated co2",
            Register::Co2UnfilteredUncompensated => "unfiltered uncompensated co2",
            Register::FirmwareType => "firmware type",
            Register::FirmwareRevisionMajor => "firmware revision major",
            Register::FirmwareRevisionMinor => "firmware revision minor",
            Register::SensorId => "sensor id",
            Register::ProductCode => "product code",
            Register::CalibrationStatus => "calibration status",
            Register::MeasurementMode => "measurement mode",
            Register::Pressure => "pressure",
        }
    }
}

/// Default I2C address of the Sunrise sensor.
pub const SUNRISE_DEFAULT_ADDRESS: u16 = 0x68;

// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Typed values decoded from the status and identity registers.

use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// A raw code with no entry in a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unrecognized code {0}")]
pub struct UnknownCode(pub u8);

/// One flag of the error status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorFlag {
    LowVoltage,
    MeasurementTimeout,
    AbnormalSignalLevel,
    /// Any of the reserved bits 3 to 6
    Unknown,
    ScaleFactorError,
    FatalError,
    I2cError,
    AlgorithmError,
    CalibrationError,
    SelfDiagError,
    OutOfRange,
    MemoryError,
    NoMeasurementsCompleted,
}

impl ErrorFlag {
    /// Flag for each bit, least significant first.
    pub const BITS: [ErrorFlag; 16] = [
        ErrorFlag::LowVoltage,
        ErrorFlag::MeasurementTimeout,
        ErrorFlag::AbnormalSignalLevel,
        ErrorFlag::Unknown,
        ErrorFlag::Unknown,
        ErrorFlag::Unknown,
        ErrorFlag::Unknown,
        ErrorFlag::ScaleFactorError,
        ErrorFlag::FatalError,
        ErrorFlag::I2cError,
        ErrorFlag::AlgorithmError,
        ErrorFlag::CalibrationError,
        ErrorFlag::SelfDiagError,
        ErrorFlag::OutOfRange,
        ErrorFlag::MemoryError,
        ErrorFlag::NoMeasurementsCompleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorFlag::LowVoltage => "low_voltage",
            ErrorFlag::MeasurementTimeout => "measurement_timeout",
            ErrorFlag::AbnormalSignalLevel => "abnormal_signal_level",
            ErrorFlag::Unknown => "unknown",
            ErrorFlag::ScaleFactorError => "scale_factor_error",
            ErrorFlag::FatalError => "fatal_error",
            ErrorFlag::I2cError => "i2c_error",
            ErrorFlag::AlgorithmError => "algorithm_error",
            ErrorFlag::CalibrationError => "calibration_error",
            ErrorFlag::SelfDiagError => "self_diag_error",
            ErrorFlag::OutOfRange => "out_of_range",
            ErrorFlag::MemoryError => "memory_error",
            ErrorFlag::NoMeasurementsCompleted => "no_measurements_completed",
        }
    }
}

impl fmt::Display for ErrorFlag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of flags raised in the error status register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorStatus {
    raw: u16,
    flags: BTreeSet<ErrorFlag>,
}

impl ErrorStatus {
    /// Decode all 16 bits. Reserved bits surface as [`ErrorFlag::Unknown`].
    pub fn from_raw(raw: u16) -> ErrorStatus {
        let flags = ErrorFlag::BITS
            .iter()
            .enumerate()
            .filter(|&(bit, _)| raw & (1u16 << bit) != 0)
            .map(|(_, flag)| *flag)
            .collect();
        ErrorStatus { raw, flags }
    }

    pub fn raw(&self) -> u16 {
        self.raw
    }

    pub fn flags(&self) -> &BTreeSet<ErrorFlag> {
        &self.flags
    }

    pub fn contains(&self, flag: ErrorFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// No flag raised.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("[")?;
        for (i, flag) in self.flags.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(flag.as_str())?;
        }
        f.write_str("]")
    }
}

/// Source of the current calibration.
///
/// Codes 0, 1 and 7 are documented but unnamed and decode to
/// `Unknown(code)`. Codes from 8 up are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStatus {
    Unknown(u8),
    Factory,
    Abc,
    Target,
    Background,
    Zero,
}

impl CalibrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CalibrationStatus::Unknown(_) => "unknown",
            CalibrationStatus::Factory => "factory",
            CalibrationStatus::Abc => "abc",
            CalibrationStatus::Target => "target",
            CalibrationStatus::Background => "background",
            CalibrationStatus::Zero => "zero",
        }
    }
}

impl TryFrom<u8> for CalibrationStatus {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 | 1 | 7 => Ok(CalibrationStatus::Unknown(code)),
            2 => Ok(CalibrationStatus::Factory),
            3 => Ok(CalibrationStatus::Abc),
            4 => Ok(CalibrationStatus::Target),
            5 => Ok(CalibrationStatus::Background),
            6 => Ok(CalibrationStatus::Zero),
            _ => Err(UnknownCode(code)),
        }
    }
}

impl fmt::Display for CalibrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CalibrationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Measurement mode register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementMode {
    Continuous,
    Single,
}

impl MeasurementMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MeasurementMode::Continuous => "continuous",
            MeasurementMode::Single => "single",
        }
    }
}

impl TryFrom<u8> for MeasurementMode {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MeasurementMode::Continuous),
            1 => Ok(MeasurementMode::Single),
            _ => Err(UnknownCode(code)),
        }
    }
}

impl fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Firmware revision, shown as `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareRevision {
    pub major: u8,
    pub minor: u8,
}

impl fmt::Display for FirmwareRevision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Serialize for FirmwareRevision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(status: &ErrorStatus) -> Vec<&'static str> {
        status.flags().iter().map(|f| f.as_str()).collect()
    }

    #[test]
    fn error_status_named_bits() {
        let status = ErrorStatus::from_raw(0b0000_0000_0000_0101);
        assert_eq!(status.flags().len(), 2);
        assert!(status.contains(ErrorFlag::LowVoltage));
        assert!(status.contains(ErrorFlag::AbnormalSignalLevel));
    }

    #[test]
    fn error_status_zero_is_empty() {
        let status = ErrorStatus::from_raw(0);
        assert!(status.is_empty());
        assert_eq!(status.to_string(), "[]");
    }

    #[test]
    fn error_status_reserved_bits_are_unknown() {
        assert_eq!(names(&ErrorStatus::from_raw(1 << 3)), vec!["unknown"]);
        assert_eq!(names(&ErrorStatus::from_raw(0b0111_1000)), vec!["unknown"]);
    }

    #[test]
    fn error_status_all_bits() {
        let status = ErrorStatus::from_raw(0xffff);
        assert_eq!(status.flags().len(), 13);
        assert!(status.contains(ErrorFlag::NoMeasurementsCompleted));
        assert!(status.contains(ErrorFlag::ScaleFactorError));
        assert_eq!(status.raw(), 0xffff);
    }

    #[test]
    fn error_status_high_byte() {
        let status = ErrorStatus::from_raw(0x8100);
        assert_eq!(names(&status), vec!["fatal_error", "no_measurements_completed"]);
        assert_eq!(status.to_string(), "[fatal_error, no_measurements_completed]");
    }

    #[test]
    fn calibration_status_table() {
        assert_eq!(CalibrationStatus::try_from(2), Ok(CalibrationStatus::Factory));
        assert_eq!(CalibrationStatus::try_from(3), Ok(CalibrationStatus::Abc));
        assert_eq!(CalibrationStatus::try_from(6), Ok(CalibrationStatus::Zero));
        assert_eq!(CalibrationStatus::try_from(7), Ok(CalibrationStatus::Unknown(7)));
        assert_eq!(CalibrationStatus::try_from(0).map(|c| c.as_str()), Ok("unknown"));
        assert_eq!(CalibrationStatus::try_from(8), Err(UnknownCode(8)));
        assert_eq!(CalibrationStatus::try_from(255), Err(UnknownCode(255)));
    }

    #[test]
    fn unknown_code_message() {
        let err: Box<dyn std::error::Error> = Box::new(UnknownCode(9));
        assert_eq!(err.to_string(), "unrecognized code 9");
    }

    #[test]
    fn measurement_mode_table() {
        assert_eq!(MeasurementMode::try_from(0), Ok(MeasurementMode::Continuous));
        assert_eq!(MeasurementMode::try_from(1), Ok(MeasurementMode::Single));
        assert_eq!(MeasurementMode::try_from(2), Err(UnknownCode(2)));
    }

    #[test]
    fn serialized_names() {
        let json = serde_json::to_string(&ErrorStatus::from_raw(0b101)).unwrap();
        assert_eq!(json, r#"{"raw":5,"flags":["low_voltage","abnormal_signal_level"]}"#);
        assert_eq!(
            serde_json::to_string(&CalibrationStatus::Unknown(1)).unwrap(),
            r#""unknown""#
        );
        assert_eq!(
            serde_json::to_string(&FirmwareRevision { major: 3, minor: 14 }).unwrap(),
            r#""3.14""#
        );
        assert_eq!(
            serde_json::to_string(&MeasurementMode::Single).unwrap(),
            r#""single""#
        );
    }
}

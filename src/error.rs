// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

/// Result alias used by every decode operation.
pub type Result<T, E = SunriseError> = core::result::Result<T, E>;

/// Failure reported by a [`RegisterBus`](crate::bus::RegisterBus) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The bus device could not be opened, or has not been opened.
    #[error("bus not open: {0}")]
    NotOpen(String),
    /// No device answered at the given address.
    #[error("device unreachable at address {address:#04x}")]
    Unreachable { address: u16 },
    /// Any other I/O failure reported by the bus driver.
    #[error("I/O error: {0}")]
    Io(String),
}

///
/// Sunrise error enum. `Transport` and `LengthMismatch` mean the
/// sensor could not be read; `Decode` means the sensor answered with
/// a value outside of the documented table for that register.
/// Every variant names the attribute and register range involved.
///
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SunriseError {
    /// The raw block read failed on the bus
    #[error("reading {attribute} (register {register:#04x}, {length} bytes): {source}")]
    Transport {
        attribute: &'static str,
        register: u8,
        length: usize,
        #[source]
        source: BusError,
    },
    /// The bus returned a block of the wrong size
    #[error(
        "reading {attribute} (register {register:#04x}): expected {expected} bytes, got {actual}"
    )]
    LengthMismatch {
        attribute: &'static str,
        register: u8,
        expected: usize,
        actual: usize,
    },
    /// A validly transmitted value has no entry in the lookup table
    #[error("decoding {attribute} (register {register:#04x}): unrecognized value {value}")]
    Decode {
        attribute: &'static str,
        register: u8,
        value: u8,
    },
}

impl SunriseError {
    /// True when the sensor could not be read at all.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SunriseError::Transport { .. } | SunriseError::LengthMismatch { .. }
        )
    }

    /// True when the sensor answered with an unexpected code.
    pub fn is_decode(&self) -> bool {
        matches!(self, SunriseError::Decode { .. })
    }

    /// Name of the attribute whose read failed.
    pub fn attribute(&self) -> &'static str {
        match *self {
            SunriseError::Transport { attribute, .. }
            | SunriseError::LengthMismatch { attribute, .. }
            | SunriseError::Decode { attribute, .. } => attribute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_decode_are_distinct() {
        let transport = SunriseError::Transport {
            attribute: "temperature",
            register: 0x08,
            length: 2,
            source: BusError::Unreachable { address: 0x68 },
        };
        let short = SunriseError::LengthMismatch {
            attribute: "temperature",
            register: 0x08,
            expected: 2,
            actual: 1,
        };
        let decode = SunriseError::Decode {
            attribute: "measurement mode",
            register: 0x95,
            value: 7,
        };

        assert!(transport.is_transport() && !transport.is_decode());
        assert!(short.is_transport() && !short.is_decode());
        assert!(decode.is_decode() && !decode.is_transport());
        assert_eq!(decode.attribute(), "measurement mode");
    }

    #[test]
    fn messages_name_register_range() {
        let err = SunriseError::Transport {
            attribute: "sensor id",
            register: 0x3a,
            length: 4,
            source: BusError::Unreachable { address: 0x68 },
        };
        assert_eq!(
            err.to_string(),
            "reading sensor id (register 0x3a, 4 bytes): device unreachable at address 0x68"
        );
    }
}

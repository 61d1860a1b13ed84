// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Senseair Sunrise CO2 sensor register decoding over I2C
//!
//! Register layout taken from the Senseair Sunrise I2C register map.
//! Every reading is one function taking a [`bus::RegisterBus`] and the
//! sensor address, returning the typed value or a [`SunriseError`].
//! Decoding is stateless: nothing is cached between calls.
//!
//! ## Basic Example
//!
//! Obtaining CO2, temperature and the error flags
//!
//!```no_run
//!use sunrise_i2c::bus::LinuxRegisterBus;
//!use sunrise_i2c::sunrise::Sunrise;
//!
//!fn main() -> Result<(), Box<dyn std::error::Error>> {
//!    let bus = LinuxRegisterBus::open(1, 0x68)?;
//!    let mut sensor = Sunrise::new(bus);
//!
//!    println!("Errors: {}", sensor.get_error_status()?);
//!    println!("Co2: {} ppm", sensor.get_co2()?);
//!    println!("Temp: {} C", sensor.get_temperature()?);
//!    Ok(())
//!}
//!```
//!

/// Register bus abstraction and the Linux i2c-dev backend
pub mod bus;
pub mod convert;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod registers;
pub mod status;
/// Decode operations for every Sunrise reading
pub mod sunrise;

pub use error::{BusError, Result, SunriseError};
pub use registers::{Register, SUNRISE_DEFAULT_ADDRESS};
pub use sunrise::{Sunrise, SunriseReadings};

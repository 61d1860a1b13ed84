// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use crate::bus::RegisterBus;
use crate::convert::{ascii_text, be_integer};
use crate::error::{Result, SunriseError};
use crate::registers::{Register, SUNRISE_DEFAULT_ADDRESS};
use crate::status::{
    CalibrationStatus, ErrorStatus, FirmwareRevision, MeasurementMode, UnknownCode,
};
use serde::Serialize;
use tracing::debug;

/// Reads the `N` byte block starting at `register`.
///
/// The bus answer must be exactly `N` bytes long, anything else
/// is reported as a `LengthMismatch`.
fn read_regs<B: RegisterBus + ?Sized, const N: usize>(
    bus: &mut B,
    address: u16,
    register: Register,
) -> Result<[u8; N]> {
    let regs = bus
        .read_block(address, register.addr(), N)
        .map_err(|source| SunriseError::Transport {
            attribute: register.name(),
            register: register.addr(),
            length: N,
            source,
        })?;
    let actual = regs.len();
    let regs: [u8; N] = regs
        .try_into()
        .map_err(|_| SunriseError::LengthMismatch {
            attribute: register.name(),
            register: register.addr(),
            expected: N,
            actual,
        })?;
    debug!(attribute = register.name(), ?regs, "got registers");
    Ok(regs)
}

fn read_u8<B: RegisterBus + ?Sized>(bus: &mut B, address: u16, register: Register) -> Result<u8> {
    let [value] = read_regs::<B, 1>(bus, address, register)?;
    Ok(value)
}

fn read_u16<B: RegisterBus + ?Sized>(bus: &mut B, address: u16, register: Register) -> Result<u16> {
    let regs = read_regs::<B, 2>(bus, address, register)?;
    // two bytes always fit
    Ok(be_integer(&regs) as u16)
}

fn decode_error(register: Register) -> impl FnOnce(UnknownCode) -> SunriseError {
    move |UnknownCode(value)| SunriseError::Decode {
        attribute: register.name(),
        register: register.addr(),
        value,
    }
}

/// Error flags raised by the sensor.
pub fn get_error_status<B: RegisterBus + ?Sized>(bus: &mut B, address: u16) -> Result<ErrorStatus> {
    let status = ErrorStatus::from_raw(read_u16(bus, address, Register::ErrorStatus)?);
    debug!("Got errors flags '{}'", status);
    Ok(status)
}

/// Calibration status.
///
/// Codes 0, 1 and 7 give `CalibrationStatus::Unknown`; codes above 7
/// fail with `SunriseError::Decode`.
pub fn get_calibration_status<B: RegisterBus + ?Sized>(
    bus: &mut B,
    address: u16,
) -> Result<CalibrationStatus> {
    let register = Register::CalibrationStatus;
    let status =
        CalibrationStatus::try_from(read_u8(bus, address, register)?).map_err(decode_error(register))?;
    debug!("Got calibration status '{}'", status);
    Ok(status)
}

/// Measurement mode; any code other than 0 or 1 fails with `SunriseError::Decode`.
pub fn get_measurement_mode<B: RegisterBus + ?Sized>(
    bus: &mut B,
    address: u16,
) -> Result<MeasurementMode> {
    let register = Register::MeasurementMode;
    let mode =
        MeasurementMode::try_from(read_u8(bus, address, register)?).map_err(decode_error(register))?;
    debug!("Got measurement mode '{}'", mode);
    Ok(mode)
}

pub fn get_firmware_type<B: RegisterBus + ?Sized>(bus: &mut B, address: u16) -> Result<u8> {
    let firmware_type = read_u8(bus, address, Register::FirmwareType)?;
    debug!("Got firmware type '{}'", firmware_type);
    Ok(firmware_type)
}

/// Firmware revision from two single byte reads. The minor byte is
/// not read when the major read fails.
pub fn get_firmware_revision<B: RegisterBus + ?Sized>(
    bus: &mut B,
    address: u16,
) -> Result<FirmwareRevision> {
    let major = read_u8(bus, address, Register::FirmwareRevisionMajor)?;
    let minor = read_u8(bus, address, Register::FirmwareRevisionMinor)?;
    let revision = FirmwareRevision { major, minor };
    debug!("Got firmware revision '{}'", revision);
    Ok(revision)
}

pub fn get_sensor_id<B: RegisterBus + ?Sized>(bus: &mut B, address: u16) -> Result<u32> {
    let regs = read_regs::<B, 4>(bus, address, Register::SensorId)?;
    let id = be_integer(&regs) as u32;
    debug!("Got sensor id '{}'", id);
    Ok(id)
}

pub fn get_product_code<B: RegisterBus + ?Sized>(bus: &mut B, address: u16) -> Result<String> {
    let regs = read_regs::<B, 16>(bus, address, Register::ProductCode)?;
    let text = ascii_text(&regs);
    debug!("Got product code '{}'", text);
    Ok(text)
}

/// Filtered and pressure compensated CO2 in ppm.
pub fn get_co2_filtered_compensated<B: RegisterBus + ?Sized>(
    bus: &mut B,
    address: u16,
) -> Result<u16> {
    let ppm = read_u16(bus, address, Register::Co2FilteredCompensated)?;
    debug!("Got filtered and compensated co2 metric: '{} ppm'", ppm);
    Ok(ppm)
}

/// Same as [`get_co2_filtered_compensated`].
pub fn get_co2<B: RegisterBus + ?Sized>(bus: &mut B, address: u16) -> Result<u16> {
    get_co2_filtered_compensated(bus, address)
}

pub fn get_co2_unfiltered_compensated<B: RegisterBus + ?Sized>(
    bus: &mut B,
    address: u16,
) -> Result<u16> {
    let ppm = read_u16(bus, address, Register::Co2UnfilteredCompensated)?;
    debug!("Got unfiltered and compensated co2 metric: '{} ppm'", ppm);
    Ok(ppm)
}

pub fn get_co2_filtered_uncompensated<B: RegisterBus + ?Sized>(
    bus: &mut B,
    address: u16,
) -> Result<u16> {
    let ppm = read_u16(bus, address, Register::Co2FilteredUncompensated)?;
    debug!("Got filtered and uncompensated co2 metric: '{} ppm'", ppm);
    Ok(ppm)
}

pub fn get_co2_unfiltered_uncompensated<B: RegisterBus + ?Sized>(
    bus: &mut B,
    address: u16,
) -> Result<u16> {
    let ppm = read_u16(bus, address, Register::Co2UnfilteredUncompensated)?;
    debug!("Got unfiltered and uncompensated co2 metric: '{} ppm'", ppm);
    Ok(ppm)
}

/// Temperature used for compensation, in Celsius (0.01 °C per bit).
pub fn get_temperature<B: RegisterBus + ?Sized>(bus: &mut B, address: u16) -> Result<f32> {
    let celsius = f32::from(read_u16(bus, address, Register::Temperature)?) / 100.0;
    debug!("Got temperature metric: '{} °C'", celsius);
    Ok(celsius)
}

/// Pressure setting used for compensation, in hPa (0.1 hPa per bit).
pub fn get_pressure<B: RegisterBus + ?Sized>(bus: &mut B, address: u16) -> Result<f32> {
    let hpa = f32::from(read_u16(bus, address, Register::Pressure)?) / 10.0;
    debug!("Got pressure metric: '{} hPa'", hpa);
    Ok(hpa)
}

pub fn get_cycle_count<B: RegisterBus + ?Sized>(bus: &mut B, address: u16) -> Result<u8> {
    let count = read_u8(bus, address, Register::CycleCount)?;
    debug!("Got cycle count: '{}'", count);
    Ok(count)
}

/// Seconds since the last measurement (2 s per bit).
pub fn get_cycle_time<B: RegisterBus + ?Sized>(bus: &mut B, address: u16) -> Result<u32> {
    let seconds = u32::from(read_u16(bus, address, Register::CycleTime)?) * 2;
    debug!("Got cycle time: '{} s'", seconds);
    Ok(seconds)
}

/// Every reading of one polling cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SunriseReadings {
    pub error_status: ErrorStatus,
    pub calibration_status: CalibrationStatus,
    pub measurement_mode: MeasurementMode,
    pub firmware_type: u8,
    pub firmware_revision: FirmwareRevision,
    pub sensor_id: u32,
    pub product_code: String,
    pub co2_filtered_compensated: u16,
    pub co2_unfiltered_compensated: u16,
    pub co2_filtered_uncompensated: u16,
    pub co2_unfiltered_uncompensated: u16,
    pub temperature: f32,
    pub pressure: f32,
    pub cycle_count: u8,
    pub cycle_time: u32,
}

/// Sunrise struct, wraps a register bus and
/// the sensor address.
///
pub struct Sunrise<B> {
    bus: B,
    address: u16,
}

/// Implementation of Sunrise related
/// operations
///
impl<B: RegisterBus> Sunrise<B> {
    /// Create a Sunrise on the standard address 0x68
    pub fn new(bus: B) -> Sunrise<B> {
        Sunrise::with_address(bus, SUNRISE_DEFAULT_ADDRESS)
    }

    pub fn with_address(bus: B, address: u16) -> Sunrise<B> {
        Sunrise { bus, address }
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give the bus back.
    pub fn release(self) -> B {
        self.bus
    }

    pub fn get_error_status(&mut self) -> Result<ErrorStatus> {
        get_error_status(&mut self.bus, self.address)
    }

    pub fn get_calibration_status(&mut self) -> Result<CalibrationStatus> {
        get_calibration_status(&mut self.bus, self.address)
    }

    pub fn get_measurement_mode(&mut self) -> Result<MeasurementMode> {
        get_measurement_mode(&mut self.bus, self.address)
    }

    pub fn get_firmware_type(&mut self) -> Result<u8> {
        get_firmware_type(&mut self.bus, self.address)
    }

    pub fn get_firmware_revision(&mut self) -> Result<FirmwareRevision> {
        get_firmware_revision(&mut self.bus, self.address)
    }

    pub fn get_sensor_id(&mut self) -> Result<u32> {
        get_sensor_id(&mut self.bus, self.address)
    }

    pub fn get_product_code(&mut self) -> Result<String> {
        get_product_code(&mut self.bus, self.address)
    }

    pub fn get_co2(&mut self) -> Result<u16> {
        get_co2(&mut self.bus, self.address)
    }

    pub fn get_co2_filtered_compensated(&mut self) -> Result<u16> {
        get_co2_filtered_compensated(&mut self.bus, self.address)
    }

    pub fn get_co2_unfiltered_compensated(&mut self) -> Result<u16> {
        get_co2_unfiltered_compensated(&mut self.bus, self.address)
    }

    pub fn get_co2_filtered_uncompensated(&mut self) -> Result<u16> {
        get_co2_filtered_uncompensated(&mut self.bus, self.address)
    }

    pub fn get_co2_unfiltered_uncompensated(&mut self) -> Result<u16> {
        get_co2_unfiltered_uncompensated(&mut self.bus, self.address)
    }

    pub fn get_temperature(&mut self) -> Result<f32> {
        get_temperature(&mut self.bus, self.address)
    }

    pub fn get_pressure(&mut self) -> Result<f32> {
        get_pressure(&mut self.bus, self.address)
    }

    pub fn get_cycle_count(&mut self) -> Result<u8> {
        get_cycle_count(&mut self.bus, self.address)
    }

    pub fn get_cycle_time(&mut self) -> Result<u32> {
        get_cycle_time(&mut self.bus, self.address)
    }

    /// Read every attribute. The first failure aborts the whole snapshot.
    pub fn read_all(&mut self) -> Result<SunriseReadings> {
        Ok(SunriseReadings {
            error_status: self.get_error_status()?,
            calibration_status: self.get_calibration_status()?,
            measurement_mode: self.get_measurement_mode()?,
            firmware_type: self.get_firmware_type()?,
            firmware_revision: self.get_firmware_revision()?,
            sensor_id: self.get_sensor_id()?,
            product_code: self.get_product_code()?,
            co2_filtered_compensated: self.get_co2_filtered_compensated()?,
            co2_unfiltered_compensated: self.get_co2_unfiltered_compensated()?,
            co2_filtered_uncompensated: self.get_co2_filtered_uncompensated()?,
            co2_unfiltered_uncompensated: self.get_co2_unfiltered_uncompensated()?,
            temperature: self.get_temperature()?,
            pressure: self.get_pressure()?,
            cycle_count: self.get_cycle_count()?,
            cycle_time: self.get_cycle_time()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BusError;
    use crate::mock::{BlockRead, MockRegisterBus};

    const ADDR: u16 = 0x68;

    fn bus() -> MockRegisterBus {
        MockRegisterBus::new().with_device(ADDR)
    }

    #[test]
    fn decodes_error_status() {
        let mut bus = bus();
        bus.set_u16(ADDR, 0x00, 0b0000_0000_0000_0101);
        let status = get_error_status(&mut bus, ADDR).unwrap();
        let names: Vec<_> = status.flags().iter().map(|f| f.as_str()).collect();
        assert_eq!(names, vec!["low_voltage", "abnormal_signal_level"]);
        assert_eq!(bus.transactions()[0].length, 2);
    }

    #[test]
    fn decodes_calibration_status() {
        let mut bus = bus();
        bus.set_registers(ADDR, 0x81, &[2]);
        assert_eq!(get_calibration_status(&mut bus, ADDR), Ok(CalibrationStatus::Factory));
        bus.set_registers(ADDR, 0x81, &[6]);
        assert_eq!(get_calibration_status(&mut bus, ADDR), Ok(CalibrationStatus::Zero));
        bus.set_registers(ADDR, 0x81, &[1]);
        assert_eq!(get_calibration_status(&mut bus, ADDR), Ok(CalibrationStatus::Unknown(1)));
    }

    #[test]
    fn calibration_status_out_of_table_is_decode_error() {
        let mut bus = bus();
        bus.set_registers(ADDR, 0x81, &[8]);
        let err = get_calibration_status(&mut bus, ADDR).unwrap_err();
        assert_eq!(
            err,
            SunriseError::Decode {
                attribute: "calibration status",
                register: 0x81,
                value: 8
            }
        );
        assert!(err.is_decode());
    }

    #[test]
    fn decodes_measurement_mode() {
        let mut bus = bus();
        assert_eq!(get_measurement_mode(&mut bus, ADDR), Ok(MeasurementMode::Continuous));
        bus.set_registers(ADDR, 0x95, &[1]);
        assert_eq!(get_measurement_mode(&mut bus, ADDR), Ok(MeasurementMode::Single));
        bus.set_registers(ADDR, 0x95, &[2]);
        assert!(get_measurement_mode(&mut bus, ADDR).unwrap_err().is_decode());
    }

    #[test]
    fn scales_physical_values() {
        let mut bus = bus();
        bus.set_u16(ADDR, 0x08, 2500);
        bus.set_u16(ADDR, 0xdc, 10132);
        bus.set_u16(ADDR, 0x0e, 30);
        assert_eq!(get_temperature(&mut bus, ADDR), Ok(25.0));
        assert_eq!(get_pressure(&mut bus, ADDR), Ok(1013.2));
        assert_eq!(get_cycle_time(&mut bus, ADDR), Ok(60));
    }

    #[test]
    fn reads_co2_variants() {
        let mut bus = bus();
        bus.set_u16(ADDR, 0x06, 415);
        bus.set_u16(ADDR, 0x10, 420);
        bus.set_u16(ADDR, 0x12, 430);
        bus.set_u16(ADDR, 0x14, 440);
        assert_eq!(get_co2(&mut bus, ADDR), Ok(415));
        assert_eq!(get_co2_filtered_compensated(&mut bus, ADDR), Ok(415));
        assert_eq!(get_co2_unfiltered_compensated(&mut bus, ADDR), Ok(420));
        assert_eq!(get_co2_filtered_uncompensated(&mut bus, ADDR), Ok(430));
        assert_eq!(get_co2_unfiltered_uncompensated(&mut bus, ADDR), Ok(440));
    }

    #[test]
    fn zero_ppm_is_a_reading() {
        let mut bus = bus();
        assert_eq!(get_co2(&mut bus, ADDR), Ok(0));
    }

    #[test]
    fn reads_identity() {
        let mut bus = bus();
        bus.set_registers(ADDR, 0x2f, &[1]);
        bus.set_registers(ADDR, 0x38, &[3, 14]);
        bus.set_registers(ADDR, 0x3a, &[0x00, 0x12, 0xd6, 0x87]);
        bus.set_registers(ADDR, 0x70, b"006-0-0007      ");
        bus.set_registers(ADDR, 0x0d, &[255]);

        assert_eq!(get_firmware_type(&mut bus, ADDR), Ok(1));
        assert_eq!(
            get_firmware_revision(&mut bus, ADDR).unwrap().to_string(),
            "3.14"
        );
        assert_eq!(get_sensor_id(&mut bus, ADDR), Ok(0x0012_d687));
        assert_eq!(get_product_code(&mut bus, ADDR).unwrap(), "006-0-0007");
        assert_eq!(get_cycle_count(&mut bus, ADDR), Ok(255));
    }

    #[test]
    fn firmware_revision_short_circuits() {
        let mut bus = bus();
        bus.fail_after(Some(0));
        let err = get_firmware_revision(&mut bus, ADDR).unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.attribute(), "firmware revision major");
        assert_eq!(
            bus.transactions(),
            &[BlockRead {
                address: ADDR,
                register: 0x38,
                length: 1
            }]
        );
    }

    #[test]
    fn firmware_revision_fails_on_minor() {
        let mut bus = bus();
        bus.fail_after(Some(1));
        let err = get_firmware_revision(&mut bus, ADDR).unwrap_err();
        assert_eq!(err.attribute(), "firmware revision minor");
        assert_eq!(bus.transactions().len(), 2);
    }

    #[test]
    fn unreachable_device_is_transport_error() {
        let mut bus = MockRegisterBus::new();
        let err = get_co2(&mut bus, ADDR).unwrap_err();
        assert_eq!(
            err,
            SunriseError::Transport {
                attribute: "filtered compensated co2",
                register: 0x06,
                length: 2,
                source: BusError::Unreachable { address: ADDR },
            }
        );
    }

    #[test]
    fn short_read_is_length_mismatch() {
        let mut bus = bus();
        bus.set_short_reads(Some(15));
        assert_eq!(
            get_product_code(&mut bus, ADDR),
            Err(SunriseError::LengthMismatch {
                attribute: "product code",
                register: 0x70,
                expected: 16,
                actual: 15,
            })
        );
    }

    #[test]
    fn device_struct_uses_its_address() {
        let mut bus = MockRegisterBus::new();
        bus.set_u16(0x69, 0x06, 800);
        let mut sensor = Sunrise::with_address(bus, 0x69);
        assert_eq!(sensor.get_co2(), Ok(800));
        assert_eq!(sensor.address(), 0x69);
        assert_eq!(sensor.release().transactions()[0].address, 0x69);
    }

    #[test]
    fn borrows_a_shared_bus() {
        let mut bus = bus();
        bus.set_u16(ADDR, 0x08, 1999);
        {
            let mut sensor = Sunrise::new(&mut bus);
            assert_eq!(sensor.get_temperature(), Ok(19.99));
        }
        assert_eq!(bus.transactions().len(), 1);
    }
}

// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use crate::error::BusError;
use i2cdev::core::*;
use i2cdev::linux::LinuxI2CDevice;
use std::path::{Path, PathBuf};

/// Raw register access to devices on an I2C bus.
///
/// One call is one bus transaction: read `length` consecutive bytes
/// starting at `register` from the device at `address`.
///
/// Implementations are not reentrant. The owner of the bus serializes
/// transactions; nothing here locks.
pub trait RegisterBus {
    /// Read a block of registers.
    ///
    /// Implementations should return exactly `length` bytes; the decoder
    /// checks the size and rejects anything else.
    fn read_block(&mut self, address: u16, register: u8, length: usize)
        -> Result<Vec<u8>, BusError>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read_block(
        &mut self,
        address: u16,
        register: u8,
        length: usize,
    ) -> Result<Vec<u8>, BusError> {
        (**self).read_block(address, register, length)
    }
}

/// Linux `/dev/i2c-N` bus, read with SMBus "read I2C block data"
/// transactions.
pub struct LinuxRegisterBus {
    path: PathBuf,
    address: u16,
    i2cdev: LinuxI2CDevice,
}

impl LinuxRegisterBus {
    /// Open the character device for bus `number` (`/dev/i2c-<number>`),
    /// initially targeting `address`.
    pub fn open(number: u8, address: u16) -> Result<LinuxRegisterBus, BusError> {
        LinuxRegisterBus::open_path(format!("/dev/i2c-{}", number), address)
    }

    /// Open an explicit bus device path.
    pub fn open_path<P: AsRef<Path>>(path: P, address: u16) -> Result<LinuxRegisterBus, BusError> {
        let path = path.as_ref().to_path_buf();
        let i2cdev = LinuxI2CDevice::new(&path, address)
            .map_err(|e| BusError::NotOpen(format!("{}: {}", path.display(), e)))?;
        Ok(LinuxRegisterBus {
            path,
            address,
            i2cdev,
        })
    }

    /// Path of the opened bus device.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegisterBus for LinuxRegisterBus {
    fn read_block(
        &mut self,
        address: u16,
        register: u8,
        length: usize,
    ) -> Result<Vec<u8>, BusError> {
        if address != self.address {
            self.i2cdev
                .set_slave_address(address)
                .map_err(|e| BusError::Io(e.to_string()))?;
            self.address = address;
        }
        // SMBus block reads carry at most 32 bytes
        if length > 32 {
            return Err(BusError::Io(format!("block length {} too large", length)));
        }
        self.i2cdev
            .smbus_read_i2c_block_data(register, length as u8)
            .map_err(|e| BusError::Io(e.to_string()))
    }
}

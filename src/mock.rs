// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! In-memory register bus for tests and dry runs.

use crate::bus::RegisterBus;
use crate::error::BusError;
use std::collections::HashMap;

/// One recorded block read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRead {
    pub address: u16,
    pub register: u8,
    pub length: usize,
}

/// Mock register bus
///
/// Holds a 256-byte register map per device address, records every
/// transaction and can be told to fail.
#[derive(Debug, Default)]
pub struct MockRegisterBus {
    devices: HashMap<u16, [u8; 256]>,
    transactions: Vec<BlockRead>,
    short_reads: Option<usize>,
    fail_from: Option<usize>,
}

impl MockRegisterBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device with an all-zero register map.
    pub fn with_device(mut self, address: u16) -> Self {
        self.devices.entry(address).or_insert([0; 256]);
        self
    }

    /// Overwrite registers starting at `register`, attaching the device if needed.
    pub fn set_registers(&mut self, address: u16, register: u8, data: &[u8]) {
        let regs = self.devices.entry(address).or_insert([0; 256]);
        for (offset, byte) in data.iter().enumerate() {
            regs[(register as usize + offset) % 256] = *byte;
        }
    }

    /// Store a big-endian 16-bit value at `register`.
    pub fn set_u16(&mut self, address: u16, register: u8, value: u16) {
        self.set_registers(address, register, &value.to_be_bytes());
    }

    /// Detach a device, making it unreachable.
    pub fn remove_device(&mut self, address: u16) {
        self.devices.remove(&address);
    }

    /// Answer every following read with at most `len` bytes.
    pub fn set_short_reads(&mut self, len: Option<usize>) {
        self.short_reads = len;
    }

    /// Fail every transaction once `count` transactions have been logged,
    /// failed ones included. `Some(0)` fails the very next read.
    pub fn fail_after(&mut self, count: Option<usize>) {
        self.fail_from = count;
    }

    /// Get transaction log (for test verification)
    pub fn transactions(&self) -> &[BlockRead] {
        &self.transactions
    }

}

impl RegisterBus for MockRegisterBus {
    fn read_block(
        &mut self,
        address: u16,
        register: u8,
        length: usize,
    ) -> Result<Vec<u8>, BusError> {
        let served = self.transactions.len();
        self.transactions.push(BlockRead {
            address,
            register,
            length,
        });

        if self.fail_from.is_some_and(|limit| served >= limit) {
            return Err(BusError::Io("injected bus failure".to_string()));
        }
        let regs = self
            .devices
            .get(&address)
            .ok_or(BusError::Unreachable { address })?;
        let start = register as usize;
        let end = start + length;
        if end > regs.len() {
            return Err(BusError::Io(format!(
                "register range {:#04x}..{:#05x} outside memory map",
                start, end
            )));
        }
        let take = self.short_reads.map_or(length, |len| len.min(length));
        Ok(regs[start..start + take].to_vec())
    }
}

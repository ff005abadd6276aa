//! # In-Memory Register Bank
//!
//! A simple data store holding the four Modbus tables over one inclusive
//! address window. It backs the CLI and the tests, and shows how an embedder
//! wires a store into [`Capabilities`].
//!
//! ```rust
//! use modbus_rtu_slave::register_bank::RegisterBank;
//! use std::sync::{Arc, Mutex};
//!
//! let bank = Arc::new(Mutex::new(RegisterBank::with_demo_values(0, 10)));
//! let capabilities = RegisterBank::into_capabilities(Arc::clone(&bank));
//! assert!(capabilities.supports_write_registers());
//! assert_eq!(bank.lock().unwrap().read_holding_registers(8, 3), Some(vec![8, 9, 10]));
//! ```

use crate::rtu::capability::Capabilities;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterBank {
    min_address: u16,
    max_address: u16,
    coils: Vec<bool>,
    discrete_inputs: Vec<bool>,
    holding_registers: Vec<u16>,
    input_registers: Vec<u16>,
}

impl RegisterBank {
    /// All values zero, addresses `min_address..=max_address` valid.
    pub fn new(min_address: u16, max_address: u16) -> Self {
        let (min_address, max_address) = if min_address <= max_address {
            (min_address, max_address)
        } else {
            (max_address, min_address)
        };
        let len = (max_address - min_address) as usize + 1;
        RegisterBank {
            min_address,
            max_address,
            coils: vec![false; len],
            discrete_inputs: vec![false; len],
            holding_registers: vec![0; len],
            input_registers: vec![0; len],
        }
    }

    /// Odd addresses set in the bit tables, registers holding their own address.
    pub fn with_demo_values(min_address: u16, max_address: u16) -> Self {
        let mut bank = Self::new(min_address, max_address);
        for address in bank.min_address..=bank.max_address {
            let idx = (address - bank.min_address) as usize;
            bank.coils[idx] = address & 0x1 == 1;
            bank.discrete_inputs[idx] = address & 0x1 == 1;
            bank.holding_registers[idx] = address;
            bank.input_registers[idx] = address;
        }
        bank
    }

    pub fn address_range(&self) -> std::ops::RangeInclusive<u16> {
        self.min_address..=self.max_address
    }

    /// Index of `address` when `count` values starting there fit the window.
    fn window(&self, address: u16, count: usize) -> Option<std::ops::Range<usize>> {
        let end = address as usize + count;
        if address < self.min_address || end > self.max_address as usize + 1 {
            return None;
        }
        let start = (address - self.min_address) as usize;
        Some(start..start + count)
    }

    pub fn read_coils(&self, address: u16, count: u16) -> Option<Vec<bool>> {
        self.window(address, count as usize)
            .map(|range| self.coils[range].to_vec())
    }

    pub fn read_discrete_inputs(&self, address: u16, count: u16) -> Option<Vec<bool>> {
        self.window(address, count as usize)
            .map(|range| self.discrete_inputs[range].to_vec())
    }

    pub fn read_holding_registers(&self, address: u16, count: u16) -> Option<Vec<u16>> {
        self.window(address, count as usize)
            .map(|range| self.holding_registers[range].to_vec())
    }

    pub fn read_input_registers(&self, address: u16, count: u16) -> Option<Vec<u16>> {
        self.window(address, count as usize)
            .map(|range| self.input_registers[range].to_vec())
    }

    pub fn write_coils(&mut self, address: u16, values: &[bool]) -> bool {
        match self.window(address, values.len()) {
            Some(range) => {
                self.coils[range].copy_from_slice(values);
                true
            }
            None => false,
        }
    }

    pub fn write_registers(&mut self, address: u16, values: &[u16]) -> bool {
        match self.window(address, values.len()) {
            Some(range) => {
                self.holding_registers[range].copy_from_slice(values);
                true
            }
            None => false,
        }
    }

    /// Discrete inputs are read-only on the wire; the application sets them here.
    pub fn set_discrete_input(&mut self, address: u16, value: bool) -> bool {
        match self.window(address, 1) {
            Some(range) => {
                self.discrete_inputs[range.start] = value;
                true
            }
            None => false,
        }
    }

    /// Input registers are read-only on the wire; the application sets them here.
    pub fn set_input_register(&mut self, address: u16, value: u16) -> bool {
        match self.window(address, 1) {
            Some(range) => {
                self.input_registers[range.start] = value;
                true
            }
            None => false,
        }
    }

    /// Capabilities serving all six operations from a shared bank.
    ///
    /// A poisoned lock reads as an invalid range and rejects writes.
    pub fn into_capabilities(bank: Arc<Mutex<RegisterBank>>) -> Capabilities {
        let coils = Arc::clone(&bank);
        let discrete_inputs = Arc::clone(&bank);
        let holding = Arc::clone(&bank);
        let inputs = Arc::clone(&bank);
        let coil_writes = Arc::clone(&bank);
        let register_writes = bank;

        Capabilities::new()
            .with_read_coils(move |address, count| {
                coils.lock().ok()?.read_coils(address, count)
            })
            .with_read_discrete_inputs(move |address, count| {
                discrete_inputs.lock().ok()?.read_discrete_inputs(address, count)
            })
            .with_read_holding_registers(move |address, count| {
                holding.lock().ok()?.read_holding_registers(address, count)
            })
            .with_read_input_registers(move |address, count| {
                inputs.lock().ok()?.read_input_registers(address, count)
            })
            .with_write_coils(move |address, values| {
                coil_writes
                    .lock()
                    .map(|mut bank| bank.write_coils(address, values))
                    .unwrap_or(false)
            })
            .with_write_registers(move |address, values| {
                register_writes
                    .lock()
                    .map(|mut bank| bank.write_registers(address, values))
                    .unwrap_or(false)
            })
    }
}

//! # Data Store Capabilities
//!
//! The slave owns no data. Every value it serves comes from one of six optional
//! callbacks registered by the embedder. A missing callback means the function
//! is not implemented by this slave and is answered with `ILLEGAL_FUNCTION`.
//!
//! Read callbacks receive `(address, count)` and return `None` when the range is
//! invalid. Write callbacks receive `(address, values)` and return `false` when
//! the write is rejected; both cases are answered with `ILLEGAL_DATA_ADDRESS`.
//!
//! ```rust
//! use modbus_rtu_slave::rtu::capability::Capabilities;
//!
//! let capabilities = Capabilities::new()
//!     .with_read_holding_registers(|address, count| {
//!         (address as usize + count as usize <= 16)
//!             .then(|| (address..address + count).collect())
//!     });
//! assert!(capabilities.supports_read_holding_registers());
//! assert!(!capabilities.supports_write_coils());
//! ```

use std::fmt;

pub type ReadBitsFn = Box<dyn FnMut(u16, u16) -> Option<Vec<bool>> + Send>;
pub type ReadWordsFn = Box<dyn FnMut(u16, u16) -> Option<Vec<u16>> + Send>;
pub type WriteBitsFn = Box<dyn FnMut(u16, &[bool]) -> bool + Send>;
pub type WriteWordsFn = Box<dyn FnMut(u16, &[u16]) -> bool + Send>;

/// The set of data store operations available to the dispatcher.
#[derive(Default)]
pub struct Capabilities {
    pub(crate) read_coils: Option<ReadBitsFn>,
    pub(crate) read_discrete_inputs: Option<ReadBitsFn>,
    pub(crate) read_holding_registers: Option<ReadWordsFn>,
    pub(crate) read_input_registers: Option<ReadWordsFn>,
    pub(crate) write_coils: Option<WriteBitsFn>,
    pub(crate) write_registers: Option<WriteWordsFn>,
}

impl Capabilities {
    /// An empty set: every function answers `ILLEGAL_FUNCTION`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_coils<F>(mut self, f: F) -> Self
    where
        F: FnMut(u16, u16) -> Option<Vec<bool>> + Send + 'static,
    {
        self.read_coils = Some(Box::new(f));
        self
    }

    pub fn with_read_discrete_inputs<F>(mut self, f: F) -> Self
    where
        F: FnMut(u16, u16) -> Option<Vec<bool>> + Send + 'static,
    {
        self.read_discrete_inputs = Some(Box::new(f));
        self
    }

    pub fn with_read_holding_registers<F>(mut self, f: F) -> Self
    where
        F: FnMut(u16, u16) -> Option<Vec<u16>> + Send + 'static,
    {
        self.read_holding_registers = Some(Box::new(f));
        self
    }

    pub fn with_read_input_registers<F>(mut self, f: F) -> Self
    where
        F: FnMut(u16, u16) -> Option<Vec<u16>> + Send + 'static,
    {
        self.read_input_registers = Some(Box::new(f));
        self
    }

    /// Serves both write single coil (0x05) and write multiple coils (0x0F).
    pub fn with_write_coils<F>(mut self, f: F) -> Self
    where
        F: FnMut(u16, &[bool]) -> bool + Send + 'static,
    {
        self.write_coils = Some(Box::new(f));
        self
    }

    /// Serves both write single register (0x06) and write multiple registers (0x10).
    pub fn with_write_registers<F>(mut self, f: F) -> Self
    where
        F: FnMut(u16, &[u16]) -> bool + Send + 'static,
    {
        self.write_registers = Some(Box::new(f));
        self
    }

    pub fn supports_read_coils(&self) -> bool {
        self.read_coils.is_some()
    }

    pub fn supports_read_discrete_inputs(&self) -> bool {
        self.read_discrete_inputs.is_some()
    }

    pub fn supports_read_holding_registers(&self) -> bool {
        self.read_holding_registers.is_some()
    }

    pub fn supports_read_input_registers(&self) -> bool {
        self.read_input_registers.is_some()
    }

    pub fn supports_write_coils(&self) -> bool {
        self.write_coils.is_some()
    }

    pub fn supports_write_registers(&self) -> bool {
        self.write_registers.is_some()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("read_coils", &self.supports_read_coils())
            .field("read_discrete_inputs", &self.supports_read_discrete_inputs())
            .field("read_holding_registers", &self.supports_read_holding_registers())
            .field("read_input_registers", &self.supports_read_input_registers())
            .field("write_coils", &self.supports_write_coils())
            .field("write_registers", &self.supports_write_registers())
            .finish()
    }
}

#![no_std]

//! Bus contract for QSPI NAND flash drivers.
//!
//! A driver core consumes the bus through [QspiTransport] and never frames
//! commands itself. The transport owns the peripheral state (DMA channels,
//! pin configuration, pending-transfer flags) and reports its own busy
//! condition through [QspiTransport::bus_busy].

/// Number of data lines used for the data phase of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataLines {
    Single,
    Dual,
    Quad,
}

/// Synchronous command interface to a QSPI peripheral.
///
/// Each method maps to one bus transaction: instruction phase, optional
/// address phase, optional dummy cycles and an optional data phase on
/// [DataLines] lines. Implementations may use DMA internally, in which case
/// [QspiTransport::bus_busy] must report true until the transfer has fully
/// drained.
pub trait QspiTransport {
    /// Error reported by the underlying peripheral.
    type Error: core::fmt::Debug;

    /// Issue a bare instruction, no address and no data.
    fn command(&mut self, opcode: u8) -> Result<(), Self::Error>;

    /// Issue an instruction with an address phase and no data.
    ///
    /// Used for page-select, program-execute and block-erase commands.
    fn command_with_address(&mut self, opcode: u8, address: u32) -> Result<(), Self::Error>;

    /// Issue an instruction and read `buf.len()` bytes.
    ///
    /// `address` is omitted for register-less reads such as JEDEC id.
    /// `dummy_cycles` clock cycles are inserted between the address phase
    /// and the data phase.
    fn read(
        &mut self,
        opcode: u8,
        address: Option<u32>,
        buf: &mut [u8],
        dummy_cycles: u8,
        lines: DataLines,
    ) -> Result<(), Self::Error>;

    /// Issue an instruction and write `buf` in the data phase.
    fn write(
        &mut self,
        opcode: u8,
        address: u32,
        buf: &[u8],
        lines: DataLines,
    ) -> Result<(), Self::Error>;

    /// Whether the peripheral itself is still busy (e.g. a DMA transfer has
    /// not drained). This is independent of the chip's own busy flag.
    fn bus_busy(&self) -> bool;
}

impl<T: QspiTransport> QspiTransport for &mut T {
    type Error = T::Error;

    fn command(&mut self, opcode: u8) -> Result<(), Self::Error> {
        T::command(self, opcode)
    }

    fn command_with_address(&mut self, opcode: u8, address: u32) -> Result<(), Self::Error> {
        T::command_with_address(self, opcode, address)
    }

    fn read(
        &mut self,
        opcode: u8,
        address: Option<u32>,
        buf: &mut [u8],
        dummy_cycles: u8,
        lines: DataLines,
    ) -> Result<(), Self::Error> {
        T::read(self, opcode, address, buf, dummy_cycles, lines)
    }

    fn write(
        &mut self,
        opcode: u8,
        address: u32,
        buf: &[u8],
        lines: DataLines,
    ) -> Result<(), Self::Error> {
        T::write(self, opcode, address, buf, lines)
    }

    fn bus_busy(&self) -> bool {
        T::bus_busy(self)
    }
}

pub trait NandError {
    /// Convert a specific NAND driver error into a generic error kind
    fn kind(&self) -> NandErrorKind;
}

/// NAND driver error kinds.
///
/// Driver implementations must map their error to these generic kinds
/// through the [`NandError`] trait so that a translation layer or file
/// system above them can react without knowing the concrete driver.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[non_exhaustive]
pub enum NandErrorKind {
    /// The arguments are out of range or logically inconsistent.
    InvalidParameter,

    /// The bus transport reported a failed transaction.
    Bus,

    /// The chip flagged an uncorrectable ECC error on the last read.
    Ecc,

    /// The driver was used before a successful initialization.
    NotInitialized,

    /// The chip stayed busy past the bounded wait.
    Timeout,

    /// A program or erase operation failed on the chip; the block is
    /// suspect. Contains the block index if known.
    BlockFail(Option<u16>),

    /// Error specific to the implementation.
    Other,
}

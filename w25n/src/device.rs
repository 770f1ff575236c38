//! Chip description: command opcodes, control registers and status bits.

/// Identification code the chip is expected to report (manufacturer 0xEF,
/// device 0xAA21).
pub const JEDEC_ID: u32 = 0xEFAA21;

/// Command opcodes understood by the chip.
pub mod opcode {
    pub const DEVICE_RESET: u8 = 0xFF;
    pub const JEDEC_ID: u8 = 0x9F;

    pub const READ_STATUS_REG: u8 = 0x0F;
    pub const WRITE_STATUS_REG: u8 = 0x01;

    pub const WRITE_ENABLE: u8 = 0x06;
    pub const WRITE_DISABLE: u8 = 0x04;

    pub const READ_BBM_LUT: u8 = 0xA5;
    pub const LAST_ECC_FAILURE_ADDR: u8 = 0xA9;

    pub const BLOCK_ERASE: u8 = 0xD8;

    pub const PROGRAM_EXECUTE: u8 = 0x10;
    pub const QUAD_LOAD_PROGRAM_DATA: u8 = 0x32;

    pub const PAGE_DATA_READ: u8 = 0x13;
    pub const FAST_READ_DUAL_OUTPUT: u8 = 0x3B;
}

/// The three control registers, addressed by the byte sent after the
/// read/write-status-register opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Register {
    Protection = 0xA0,
    Configuration = 0xB0,
    Status = 0xC0,
}

/// Status register (0xC0) bits.
pub mod status {
    /// Chip is executing a program, erase or page-read command.
    pub const BUSY: u8 = 0x01;
    /// Write-enable latch; must be set before program/erase, auto-cleared
    /// after each such command.
    pub const WEL: u8 = 0x02;
    /// Last block erase failed.
    pub const ERASE_FAIL: u8 = 0x04;
    /// Last program-execute failed.
    pub const PROGRAM_FAIL: u8 = 0x08;
    /// Uncorrectable ECC error on the last page read.
    pub const ECC_UNCORRECTABLE: u8 = 0x40;
}

/// Configuration register (0xB0) bits.
pub mod config {
    /// Whole-page buffer read mode (vs continuous read).
    pub const BUF: u8 = 0x08;
    /// On-chip ECC enabled.
    pub const ECC_ENABLE: u8 = 0x10;
}

/// Protection register value with every block unlocked.
pub const PROTECTION_NONE: u8 = 0x00;
/// Configuration register value required by the command sequences in this
/// driver: buffer read mode with on-chip ECC.
pub const CONFIG_INIT: u8 = config::BUF | config::ECC_ENABLE;

/// Dummy clock cycles between address and data phase of streamed reads.
pub const READ_DUMMY_CYCLES: u8 = 8;

/// Size in bytes of the bad-block lookup table (20 entries of 2 16-bit
/// addresses each).
pub const BBM_LUT_SIZE: usize = 80;

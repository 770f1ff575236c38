#![no_std]

//! Driver for a W25N01-class QSPI NAND flash chip.
//!
//! Maps a (block, page, byte) address space onto raw chip commands,
//! tracks a per-block append cursor, enforces the page-program and
//! erase-before-write rules of NAND flash, and persists its cursor table
//! into a reserved block so that state survives power loss.
//!
//! The bus itself is consumed through [nand_transport::QspiTransport];
//! this crate never frames SPI transactions.
//!
//! ```ignore
//! let mut flash = Manager::new(transport);
//! flash.init()?;
//! flash.write(BlockIndex::new(0), b"hello")?;
//! let mut buf = [0u8; 5];
//! flash.read(LinearAddress::from_parts(0, 0, 0), &mut buf)?;
//! ```

// Must be first to share macros across crate
pub(crate) mod fmt;

pub mod address;
pub mod device;
pub mod error;
mod manager;

pub use address::{BlockIndex, LinearAddress};
pub use error::Error;
pub use manager::{Manager, BUSY_POLL_LIMIT, ERASE_RETRY_LIMIT};

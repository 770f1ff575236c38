use core::fmt::Debug;
use nand_transport::{NandError, NandErrorKind};

use crate::address::BlockIndex;

/// Error type for the W25N01 driver.
///
/// Generic over the transport error type `E` so any QSPI peripheral
/// implementation can be plugged in.
#[derive(Debug, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The transport reported a failed bus transaction.
    #[error("bus transaction failed: {0:?}")]
    Bus(E),
    /// Out-of-range or logically inconsistent address, size or block.
    #[error("invalid parameter")]
    InvalidParameter,
    /// The chip flagged an uncorrectable ECC error on the last page read.
    /// Data delivered by the failing read must be treated as suspect.
    #[error("uncorrectable ECC error")]
    EccUncorrectable,
    /// Operation attempted before a successful `init`.
    #[error("driver not initialized")]
    NotInitialized,
    /// The chip stayed busy past the bounded poll limit.
    #[error("timed out waiting for chip ready")]
    Timeout,
    /// Block erase failed, including after retries in a chip erase.
    #[error("erase failed on block {0}")]
    EraseFailed(BlockIndex),
    /// Program-execute failed.
    #[error("program failed on block {0}")]
    ProgramFailed(BlockIndex),
    /// The chip reported an identification code other than the expected
    /// one; wrong or absent device.
    #[error("unexpected JEDEC id {found:#08X}, expected {expected:#08X}")]
    IdMismatch { expected: u32, found: u32 },
    /// The capability exists on the chip but is not implemented by this
    /// driver (bad-block remapping).
    #[error("operation not supported")]
    NotSupported,
}

impl<E: Debug> NandError for Error<E> {
    fn kind(&self) -> NandErrorKind {
        match self {
            Error::Bus(_) => NandErrorKind::Bus,
            Error::InvalidParameter => NandErrorKind::InvalidParameter,
            Error::EccUncorrectable => NandErrorKind::Ecc,
            Error::NotInitialized => NandErrorKind::NotInitialized,
            Error::Timeout => NandErrorKind::Timeout,
            Error::EraseFailed(b) => NandErrorKind::BlockFail(Some(b.as_u16())),
            Error::ProgramFailed(b) => NandErrorKind::BlockFail(Some(b.as_u16())),
            Error::IdMismatch { .. } => NandErrorKind::Other,
            Error::NotSupported => NandErrorKind::Other,
        }
    }
}

//! Address codec for the W25N01 block/page/byte space.
//!
//! A [LinearAddress] packs the three coordinates into one `u32` with fixed
//! bit widths derived from the chip geometry: block in the high bits, page
//! within block in the middle, byte within page in the low bits. Packing and
//! unpacking are pure bit operations and perform no validation; callers
//! check bounds with [LinearAddress::is_in_bounds] before use.

use core::fmt::Display;
use core::ops::{Add, AddAssign};

/// Bytes in the main data region of a page. The 64 ECC parity bytes that
/// follow are managed by the chip and are not addressable here.
pub const PAGE_SIZE: usize = 2048;
/// Bytes in the per-page ECC parity region.
pub const ECC_SIZE: usize = 64;
/// Pages per block (the erase granularity).
pub const PAGES_PER_BLOCK: u16 = 64;
/// Total number of blocks, including the reserved one.
pub const BLOCK_COUNT: u16 = 1024;
/// Block set aside for cursor persistence and rewrite staging.
pub const RESERVED_BLOCK: BlockIndex = BlockIndex(1023);
/// Bytes per block (main data regions only).
pub const BLOCK_SIZE: u32 = PAGE_SIZE as u32 * PAGES_PER_BLOCK as u32;
/// Total addressable capacity in bytes.
pub const CAPACITY: u32 = BLOCK_SIZE * BLOCK_COUNT as u32;

/// Width of the byte-within-page field.
pub(crate) const BYTE_BITS: u32 = 12;
/// Width of the page-within-block field.
const PAGE_BITS: u32 = 6;

pub(crate) const BYTE_MASK: u32 = (1 << BYTE_BITS) - 1;
const PAGE_MASK: u32 = (1 << PAGE_BITS) - 1;
const BLOCK_MASK: u32 = 0x3FF;

/// Index of a block in the flash device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockIndex(pub(crate) u16);

impl BlockIndex {
    pub const fn new(index: u16) -> Self {
        BlockIndex(index)
    }

    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Whether the block index fits the device.
    pub const fn is_in_bounds(&self) -> bool {
        self.0 < BLOCK_COUNT
    }

    pub const fn is_reserved(&self) -> bool {
        self.0 == RESERVED_BLOCK.0
    }

    /// Page-aligned chip address of a page in this block, as used by the
    /// page-select, program-execute and block-erase commands.
    pub const fn page_address(&self, page: u16) -> u32 {
        (self.0 as u32) << PAGE_BITS | (page as u32 & PAGE_MASK)
    }
}

impl From<BlockIndex> for u16 {
    fn from(bi: BlockIndex) -> Self {
        bi.as_u16()
    }
}

impl Add<u16> for BlockIndex {
    type Output = Self;

    fn add(self, rhs: u16) -> Self::Output {
        BlockIndex(self.0 + rhs)
    }
}

impl AddAssign<u16> for BlockIndex {
    fn add_assign(&mut self, rhs: u16) {
        self.0 += rhs;
    }
}

impl Display for BlockIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

/// Packed (block, page, byte) chip address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearAddress(pub(crate) u32);

impl LinearAddress {
    pub const fn new(raw: u32) -> Self {
        LinearAddress(raw)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Pack the three coordinates. Out-of-range fields are truncated to
    /// their bit widths; validate before packing.
    pub const fn from_parts(block: u16, page: u16, byte: u16) -> Self {
        LinearAddress(
            ((block as u32 & BLOCK_MASK) << PAGE_BITS | (page as u32 & PAGE_MASK)) << BYTE_BITS
                | (byte as u32 & BYTE_MASK),
        )
    }

    pub const fn block(&self) -> BlockIndex {
        BlockIndex((self.0 >> (PAGE_BITS + BYTE_BITS)) as u16)
    }

    pub const fn page(&self) -> u16 {
        ((self.0 >> BYTE_BITS) & PAGE_MASK) as u16
    }

    pub const fn byte(&self) -> u16 {
        (self.0 & BYTE_MASK) as u16
    }

    /// Whether all three fields are in range. The byte field has one more
    /// bit than the data region needs; values reaching into the ECC region
    /// are rejected here.
    pub const fn is_in_bounds(&self) -> bool {
        self.block().0 < BLOCK_COUNT
            && self.page() < PAGES_PER_BLOCK
            && (self.byte() as usize) < PAGE_SIZE
    }

    /// Byte offset from the start of the block's data region.
    pub const fn offset_in_block(&self) -> u32 {
        self.page() as u32 * PAGE_SIZE as u32 + self.byte() as u32
    }

    /// Address at `offset` bytes into a block's data region, block field
    /// left zero (cursor convention: the block is implied by context).
    pub const fn from_offset_in_block(offset: u32) -> Self {
        LinearAddress::from_parts(
            0,
            (offset / PAGE_SIZE as u32) as u16,
            (offset % PAGE_SIZE as u32) as u16,
        )
    }
}

impl From<LinearAddress> for u32 {
    fn from(addr: LinearAddress) -> Self {
        addr.as_u32()
    }
}

impl Display for LinearAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}/{}", self.block(), self.page(), self.byte())
    }
}

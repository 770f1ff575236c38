//! Chip manager: write/erase sequencing, per-block cursors, cursor
//! persistence and range rewrite.

use nand_transport::{DataLines, QspiTransport};

use crate::address::{
    BlockIndex, LinearAddress, BLOCK_COUNT, BLOCK_SIZE, BYTE_BITS, BYTE_MASK, CAPACITY, PAGES_PER_BLOCK,
    PAGE_SIZE, RESERVED_BLOCK,
};
use crate::device::{self, opcode, status, Register};
use crate::error::Error;

/// Upper bound on chip-busy polls before a wait reports [Error::Timeout].
pub const BUSY_POLL_LIMIT: u32 = 100_000;

/// Erase attempts per block in [Manager::erase_chip] before the whole call
/// fails with [Error::EraseFailed].
pub const ERASE_RETRY_LIMIT: u8 = 3;

/// First page of the cursor table inside the reserved block.
const CURSOR_TABLE_PAGE: u16 = PAGES_PER_BLOCK - 2;
/// One 4-byte big-endian slot per non-reserved block.
const CURSOR_SLOTS: usize = BLOCK_COUNT as usize - 1;
const CURSOR_SLOT_SIZE: usize = 4;
/// Erased-NAND slot value meaning "no cursor recorded".
const CURSOR_UNSET: u32 = 0xFFFF_FFFF;

/// Driver for one W25N01 chip.
///
/// Owns the transport and the per-block write cursors; exactly one manager
/// exists per physical chip. Multi-step command sequences run under the
/// exclusive `&mut self` borrow, so sharing the manager across tasks is the
/// caller's mutex to provide.
///
/// All operations are rejected with [Error::NotInitialized] until
/// [Manager::init] has succeeded.
pub struct Manager<T> {
    transport: T,
    /// Next free byte offset in each block's data region, `0..=BLOCK_SIZE`.
    cursors: [u32; BLOCK_COUNT as usize],
    /// Grants access to the reserved block; only ever set inside
    /// [Manager::with_reserved_access].
    privileged: bool,
    initialized: bool,
    erase_reserved_on_chip_erase: bool,
}

// Manually implement Debug to avoid bounds on the transport
impl<T> core::fmt::Debug for Manager<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Manager")
            .field("initialized", &self.initialized)
            .field("privileged", &self.privileged)
            .finish()
    }
}

impl<T: QspiTransport> Manager<T> {
    pub fn new(transport: T) -> Self {
        Manager {
            transport,
            cursors: [0; BLOCK_COUNT as usize],
            privileged: false,
            initialized: false,
            erase_reserved_on_chip_erase: false,
        }
    }

    /// Hand the transport back.
    pub fn release(self) -> T {
        self.transport
    }

    /// Whether [Manager::erase_chip] also erases the reserved block (and
    /// with it any persisted cursor table). Off by default.
    pub fn set_erase_reserved_on_chip_erase(&mut self, enable: bool) {
        self.erase_reserved_on_chip_erase = enable;
    }

    /// Next free byte offset of `block`, or `None` if out of range.
    pub fn cursor(&self, block: BlockIndex) -> Option<u32> {
        if block.is_in_bounds() {
            Some(self.cursors[block.as_u16() as usize])
        } else {
            None
        }
    }

    // ============= Register access =============

    fn read_register(&mut self, reg: Register) -> Result<u8, Error<T::Error>> {
        let mut buf = [0u8; 1];
        self.transport
            .read(
                opcode::READ_STATUS_REG,
                Some(reg as u32),
                &mut buf,
                0,
                DataLines::Single,
            )
            .map_err(Error::Bus)?;
        Ok(buf[0])
    }

    fn write_register(&mut self, reg: Register, value: u8) -> Result<(), Error<T::Error>> {
        self.wait_ready()?;
        self.transport
            .write(opcode::WRITE_STATUS_REG, reg as u32, &[value], DataLines::Single)
            .map_err(Error::Bus)
    }

    /// Chip or bus still executing a command.
    fn chip_busy(&mut self) -> Result<bool, Error<T::Error>> {
        if self.transport.bus_busy() {
            return Ok(true);
        }
        Ok(self.read_register(Register::Status)? & status::BUSY != 0)
    }

    /// Poll until the chip is ready, bounded by [BUSY_POLL_LIMIT].
    fn wait_ready(&mut self) -> Result<(), Error<T::Error>> {
        for _ in 0..BUSY_POLL_LIMIT {
            if !self.chip_busy()? {
                return Ok(());
            }
        }
        error!("chip stayed busy past {} polls", BUSY_POLL_LIMIT);
        Err(Error::Timeout)
    }

    fn write_enable(&mut self) -> Result<(), Error<T::Error>> {
        self.wait_ready()?;
        self.transport
            .command(opcode::WRITE_ENABLE)
            .map_err(Error::Bus)
    }

    /// Switch the configuration register's buffer-read bit, skipping the
    /// write when the bit already has the requested value.
    fn set_buffer_mode(&mut self, enable: bool) -> Result<(), Error<T::Error>> {
        self.wait_ready()?;
        let reg = self.read_register(Register::Configuration)?;
        if (reg & device::config::BUF != 0) == enable {
            return Ok(());
        }
        let reg = if enable {
            reg | device::config::BUF
        } else {
            reg & !device::config::BUF
        };
        self.write_register(Register::Configuration, reg)
    }

    // ============= Validation =============

    fn require_init(&self) -> Result<(), Error<T::Error>> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    /// Block in range, and not the reserved block unless privileged.
    fn check_block(&self, block: BlockIndex) -> Result<(), Error<T::Error>> {
        if !block.is_in_bounds() || (block.is_reserved() && !self.privileged) {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }

    /// Full (block, page, byte) validity, including the ECC region.
    fn check_address(&self, address: LinearAddress) -> Result<(), Error<T::Error>> {
        if !address.is_in_bounds() {
            return Err(Error::InvalidParameter);
        }
        self.check_block(address.block())
    }

    /// Whether `len` bytes still fit in `block` starting at `offset`.
    fn check_append(&self, offset: u32, len: usize) -> Result<(), Error<T::Error>> {
        if len as u32 > BLOCK_SIZE - offset {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }

    /// Run `f` with the reserved block unlocked. The privilege flag is
    /// cleared on every exit path, error returns included.
    fn with_reserved_access<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, Error<T::Error>>,
    ) -> Result<R, Error<T::Error>> {
        self.privileged = true;
        let result = f(self);
        self.privileged = false;
        result
    }

    // ============= Initialization =============

    /// Reset the chip, unlock it, verify its identification code and
    /// reload the persisted cursor table from the reserved block.
    pub fn init(&mut self) -> Result<(), Error<T::Error>> {
        self.transport
            .command(opcode::DEVICE_RESET)
            .map_err(Error::Bus)?;
        self.wait_ready()?;
        self.write_register(Register::Protection, device::PROTECTION_NONE)?;
        self.write_register(Register::Configuration, device::CONFIG_INIT)?;

        let id = self.jedec_id()?;
        if id != device::JEDEC_ID {
            error!("unexpected JEDEC id {:#08X}", id);
            return Err(Error::IdMismatch {
                expected: device::JEDEC_ID,
                found: id,
            });
        }

        self.with_reserved_access(|m| m.load_cursors())?;
        self.initialized = true;
        info!("W25N01 initialized, id {:#08X}", id);
        Ok(())
    }

    /// Read the chip's 3-byte identification code.
    ///
    /// Usable before [Manager::init] to probe for the chip.
    pub fn jedec_id(&mut self) -> Result<u32, Error<T::Error>> {
        let mut buf = [0u8; 3];
        self.transport
            .read(
                opcode::JEDEC_ID,
                None,
                &mut buf,
                device::READ_DUMMY_CYCLES,
                DataLines::Single,
            )
            .map_err(Error::Bus)?;
        Ok((buf[0] as u32) << 16 | (buf[1] as u32) << 8 | buf[2] as u32)
    }

    /// Reload every non-reserved block's cursor from its table slot.
    /// An all-0xFF slot (erased NAND) means no cursor was recorded.
    fn load_cursors(&mut self) -> Result<(), Error<T::Error>> {
        let mut buf = [0u8; PAGE_SIZE];
        let mut block = 0usize;
        let mut page = CURSOR_TABLE_PAGE;
        while block < CURSOR_SLOTS {
            self.read_page_slice(RESERVED_BLOCK, page, 0, &mut buf)?;
            for slot in buf.chunks_exact(CURSOR_SLOT_SIZE) {
                if block == CURSOR_SLOTS {
                    break;
                }
                let raw = u32::from_be_bytes([slot[0], slot[1], slot[2], slot[3]]);
                self.cursors[block] = match decode_cursor_slot(raw) {
                    Some(cursor) => cursor,
                    None => {
                        if raw != CURSOR_UNSET {
                            warn!("discarding corrupt cursor slot for block {}", block);
                        }
                        0
                    }
                };
                block += 1;
            }
            page += 1;
        }
        debug!("cursor table loaded from block {}", RESERVED_BLOCK);
        Ok(())
    }

    // ============= Write path =============

    /// Append `data` at `block`'s write cursor, splitting across page
    /// boundaries, then persist the cursor table.
    ///
    /// Fails with [Error::InvalidParameter] if the block is out of range,
    /// is the reserved block, or `data` does not fit in the remainder of
    /// the block; the cursor is left unchanged in those cases.
    pub fn write(&mut self, block: BlockIndex, data: &[u8]) -> Result<(), Error<T::Error>> {
        self.require_init()?;
        self.check_block(block)?;
        self.check_append(self.cursors[block.as_u16() as usize], data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        trace!("writing {} bytes to block {}", data.len(), block);
        self.write_at_offset(block, self.cursors[block.as_u16() as usize], data)?;
        // Write-through: every completed write flushes the cursor table so
        // the cursors survive power loss.
        self.save_cursor_table()
    }

    /// The page-splitting program loop, without persistence. The block's
    /// cursor is committed only after every chunk has programmed; a failed
    /// chunk leaves it unchanged.
    fn write_at_offset(
        &mut self,
        block: BlockIndex,
        mut offset: u32,
        mut data: &[u8],
    ) -> Result<(), Error<T::Error>> {
        while !data.is_empty() {
            let at = LinearAddress::from_offset_in_block(offset);
            let chunk = data.len().min(PAGE_SIZE - at.byte() as usize);
            self.program_page_slice(block, at.page(), at.byte(), &data[..chunk])?;
            offset += chunk as u32;
            data = &data[chunk..];
        }
        self.cursors[block.as_u16() as usize] = offset;
        Ok(())
    }

    /// One write-enable-protected program sequence: set the latch, load
    /// the page buffer, execute, then check the program-fail flag.
    fn program_page_slice(
        &mut self,
        block: BlockIndex,
        page: u16,
        byte: u16,
        data: &[u8],
    ) -> Result<(), Error<T::Error>> {
        self.write_enable()?;
        self.wait_ready()?;
        self.transport
            .write(
                opcode::QUAD_LOAD_PROGRAM_DATA,
                byte as u32,
                data,
                DataLines::Quad,
            )
            .map_err(Error::Bus)?;
        self.wait_ready()?;
        self.transport
            .command_with_address(opcode::PROGRAM_EXECUTE, block.page_address(page))
            .map_err(Error::Bus)?;
        self.wait_ready()?;
        if self.read_register(Register::Status)? & status::PROGRAM_FAIL != 0 {
            return Err(Error::ProgramFailed(block));
        }
        Ok(())
    }

    // ============= Read path =============

    /// Read `buf.len()` bytes starting at `address`, page by page.
    ///
    /// Reads are not cursor-relative and may span block boundaries. After
    /// every page transfer the uncorrectable-ECC flag is checked; on
    /// failure the whole read fails and any bytes already delivered must
    /// be treated as suspect.
    pub fn read(&mut self, address: LinearAddress, mut buf: &mut [u8]) -> Result<(), Error<T::Error>> {
        self.require_init()?;
        self.check_address(address)?;
        if buf.is_empty() {
            return Ok(());
        }
        let start = chip_offset(address);
        let end = start
            .checked_add(buf.len() as u32)
            .ok_or(Error::InvalidParameter)?;
        if end > CAPACITY {
            return Err(Error::InvalidParameter);
        }
        // The reserved block is the last one, so a span is privileged-clean
        // iff its final block is.
        self.check_block(BlockIndex::new(((end - 1) / BLOCK_SIZE) as u16))?;

        self.set_buffer_mode(true)?;
        let mut block = address.block();
        let mut page = address.page();
        let mut byte = address.byte() as usize;
        while !buf.is_empty() {
            if page == PAGES_PER_BLOCK {
                page = 0;
                block += 1;
            }
            let chunk = buf.len().min(PAGE_SIZE - byte);
            self.read_page_slice(block, page, byte as u16, &mut buf[..chunk])?;
            buf = &mut buf[chunk..];
            byte = 0;
            page += 1;
        }
        Ok(())
    }

    /// Transfer one page into the chip buffer and stream a slice of it,
    /// then check for an uncorrectable ECC error on that page.
    fn read_page_slice(
        &mut self,
        block: BlockIndex,
        page: u16,
        byte: u16,
        buf: &mut [u8],
    ) -> Result<(), Error<T::Error>> {
        self.wait_ready()?;
        self.transport
            .command_with_address(opcode::PAGE_DATA_READ, block.page_address(page))
            .map_err(Error::Bus)?;
        self.wait_ready()?;
        self.transport
            .read(
                opcode::FAST_READ_DUAL_OUTPUT,
                Some(byte as u32),
                buf,
                device::READ_DUMMY_CYCLES,
                DataLines::Dual,
            )
            .map_err(Error::Bus)?;
        if self.read_register(Register::Status)? & status::ECC_UNCORRECTABLE != 0 {
            warn!("uncorrectable ECC error on block {} page {}", block, page);
            return Err(Error::EccUncorrectable);
        }
        Ok(())
    }

    // ============= Erase =============

    /// Erase one block and reset its cursor to zero.
    ///
    /// `save_cursors` suppresses table persistence; it is cleared when the
    /// erase is itself part of a cursor save (persisting from inside the
    /// save would recurse).
    pub fn erase_block(&mut self, block: BlockIndex, save_cursors: bool) -> Result<(), Error<T::Error>> {
        self.require_init()?;
        self.check_block(block)?;
        self.erase_block_sequence(block)?;
        self.cursors[block.as_u16() as usize] = 0;
        if save_cursors {
            self.save_cursor_table()?;
        }
        Ok(())
    }

    fn erase_block_sequence(&mut self, block: BlockIndex) -> Result<(), Error<T::Error>> {
        self.write_enable()?;
        self.wait_ready()?;
        self.transport
            .command_with_address(opcode::BLOCK_ERASE, block.page_address(0))
            .map_err(Error::Bus)?;
        self.wait_ready()?;
        if self.read_register(Register::Status)? & status::ERASE_FAIL != 0 {
            return Err(Error::EraseFailed(block));
        }
        Ok(())
    }

    /// Erase every block, retrying each failed erase up to
    /// [ERASE_RETRY_LIMIT] times before giving up on the whole call.
    ///
    /// The reserved block is skipped unless
    /// [Manager::set_erase_reserved_on_chip_erase] enabled it; either way
    /// the cursor table is persisted once at the end.
    pub fn erase_chip(&mut self) -> Result<(), Error<T::Error>> {
        self.require_init()?;
        for i in 0..BLOCK_COUNT {
            let block = BlockIndex::new(i);
            if block.is_reserved() && !self.erase_reserved_on_chip_erase {
                continue;
            }
            let mut attempts = 0;
            loop {
                let result = if block.is_reserved() {
                    self.with_reserved_access(|m| m.erase_block(block, false))
                } else {
                    self.erase_block(block, false)
                };
                match result {
                    Ok(()) => break,
                    Err(Error::EraseFailed(_)) if attempts + 1 < ERASE_RETRY_LIMIT => {
                        attempts += 1;
                        warn!("erase of block {} failed, attempt {}", block, attempts);
                    }
                    Err(e) => {
                        error!("giving up erasing block {}", block);
                        return Err(e);
                    }
                }
            }
        }
        self.save_cursor_table()
    }

    // ============= Range rewrite =============

    /// Overwrite bytes within a single block, starting at `address`.
    ///
    /// When the target lies at or past the block's cursor this is a plain
    /// append (the cursor lands at the end of the new data). Overwriting
    /// committed data stages the block's surviving content through the
    /// reserved block, erases the block and replays it with `data`
    /// spliced in; the range must then end within the written region.
    pub fn rewrite_within_block(
        &mut self,
        address: LinearAddress,
        data: &[u8],
    ) -> Result<(), Error<T::Error>> {
        self.require_init()?;
        self.check_address(address)?;
        if data.is_empty() {
            return Ok(());
        }
        let block = address.block();
        let target = address.offset_in_block();
        let cursor = self.cursors[block.as_u16() as usize];
        if target >= cursor {
            // Plain append from the target offset; the cursor moves only
            // once the whole append has programmed.
            self.check_append(target, data.len())?;
            self.write_at_offset(block, target, data)?;
            return self.save_cursor_table();
        }
        let end = target + data.len() as u32;
        if end > cursor {
            return Err(Error::InvalidParameter);
        }
        debug!(
            "rewriting {} bytes at {} in block {}",
            data.len(),
            target,
            block
        );
        self.rebuild_block(block, target, end, Some(data))?;
        self.save_cursor_table()
    }

    /// Clear `[start, end)` back to erased state without touching the rest
    /// of the block. Page-granular staging; both addresses must lie in the
    /// same block with `start < end`, and `end` must be within the written
    /// region. The block's cursor shrinks by the erased length.
    pub fn erase_range_within_block(
        &mut self,
        start: LinearAddress,
        end: LinearAddress,
    ) -> Result<(), Error<T::Error>> {
        self.require_init()?;
        self.check_address(start)?;
        if !end.is_in_bounds() || start.block() != end.block() || start >= end {
            return Err(Error::InvalidParameter);
        }
        let block = start.block();
        let from = start.offset_in_block();
        let to = end.offset_in_block();
        if to > self.cursors[block.as_u16() as usize] {
            return Err(Error::InvalidParameter);
        }
        debug!("erasing range {}..{} in block {}", from, to, block);
        self.rebuild_block(block, from, to, None)?;
        self.save_cursor_table()
    }

    /// Stage `block` through the reserved block with `[start, end)` either
    /// replaced by `fill` or left erased, then erase the block and replay
    /// the staged pages back.
    fn rebuild_block(
        &mut self,
        block: BlockIndex,
        start: u32,
        end: u32,
        fill: Option<&[u8]>,
    ) -> Result<(), Error<T::Error>> {
        let old_cursor = self.cursors[block.as_u16() as usize];
        let staged_pages = old_cursor.div_ceil(PAGE_SIZE as u32) as u16;
        self.with_reserved_access(|m| {
            m.erase_block(RESERVED_BLOCK, false)?;
            let mut buf = [0u8; PAGE_SIZE];
            for page in 0..staged_pages {
                m.read_page_slice(block, page, 0, &mut buf)?;
                splice_page(&mut buf, page, start, end, fill);
                m.program_page_slice(RESERVED_BLOCK, page, 0, &buf)?;
            }
            m.erase_block(block, false)?;
            for page in 0..staged_pages {
                m.read_page_slice(RESERVED_BLOCK, page, 0, &mut buf)?;
                m.program_page_slice(block, page, 0, &buf)?;
            }
            Ok(())
        })?;
        self.cursors[block.as_u16() as usize] = if fill.is_some() {
            old_cursor
        } else {
            old_cursor - (end - start)
        };
        Ok(())
    }

    // ============= Cursor persistence =============

    /// Persist the cursor table into the reserved block.
    ///
    /// Called automatically by the mutating operations; exposed for
    /// callers that changed the configuration and want an explicit flush.
    pub fn save_cursors(&mut self) -> Result<(), Error<T::Error>> {
        self.require_init()?;
        self.save_cursor_table()
    }

    /// Erase the reserved block and program every non-reserved block's
    /// cursor into its fixed 4-byte slot, page by page. Uses the raw
    /// program primitive, never [Manager::write], to avoid recursing into
    /// another save.
    fn save_cursor_table(&mut self) -> Result<(), Error<T::Error>> {
        self.with_reserved_access(|m| {
            m.erase_block(RESERVED_BLOCK, false)?;
            let mut buf = [0xFFu8; PAGE_SIZE];
            let mut block = 0usize;
            let mut page = CURSOR_TABLE_PAGE;
            while block < CURSOR_SLOTS {
                buf.fill(0xFF);
                for slot in buf.chunks_exact_mut(CURSOR_SLOT_SIZE) {
                    if block == CURSOR_SLOTS {
                        break;
                    }
                    slot.copy_from_slice(&cursor_to_raw(m.cursors[block]).to_be_bytes());
                    block += 1;
                }
                m.program_page_slice(RESERVED_BLOCK, page, 0, &buf)?;
                page += 1;
            }
            Ok(())
        })?;
        trace!("cursor table persisted");
        Ok(())
    }

    // ============= ECC / bad blocks =============

    /// Page address of the last uncorrectable ECC failure, or `None` when
    /// the status register does not flag one.
    pub fn last_ecc_failure(&mut self) -> Result<Option<LinearAddress>, Error<T::Error>> {
        self.require_init()?;
        self.wait_ready()?;
        let mut buf = [0u8; 2];
        self.transport
            .read(
                opcode::LAST_ECC_FAILURE_ADDR,
                None,
                &mut buf,
                device::READ_DUMMY_CYCLES,
                DataLines::Single,
            )
            .map_err(Error::Bus)?;
        if self.read_register(Register::Status)? & status::ECC_UNCORRECTABLE == 0 {
            return Ok(None);
        }
        let page_address = u16::from_be_bytes(buf);
        Ok(Some(LinearAddress::from_parts(
            page_address >> 6,
            page_address & 0x3F,
            0,
        )))
    }

    /// Read the chip's bad-block management lookup table into `buf`
    /// (up to [device::BBM_LUT_SIZE] bytes).
    pub fn read_bad_block_table(&mut self, buf: &mut [u8]) -> Result<(), Error<T::Error>> {
        self.require_init()?;
        self.wait_ready()?;
        self.transport
            .read(
                opcode::READ_BBM_LUT,
                None,
                buf,
                device::READ_DUMMY_CYCLES,
                DataLines::Single,
            )
            .map_err(Error::Bus)
    }

    /// Bad-block remapping is not implemented by this driver; the LUT can
    /// be inspected with [Manager::read_bad_block_table] but entries are
    /// never written.
    pub fn remap_bad_block(
        &mut self,
        _bad: BlockIndex,
        _replacement: BlockIndex,
    ) -> Result<(), Error<T::Error>> {
        Err(Error::NotSupported)
    }
}

/// Absolute byte offset of an address from the start of the chip.
fn chip_offset(address: LinearAddress) -> u32 {
    address.block().as_u16() as u32 * BLOCK_SIZE + address.offset_in_block()
}

/// Persisted form of a cursor: page in the high bits, byte in the low 12.
/// Unlike [LinearAddress] packing this does not truncate the page field,
/// so the full-block cursor (page 64, byte 0) survives the round trip.
fn cursor_to_raw(offset: u32) -> u32 {
    (offset / PAGE_SIZE as u32) << BYTE_BITS | offset % PAGE_SIZE as u32
}

fn raw_to_cursor(raw: u32) -> u32 {
    (raw >> BYTE_BITS) * PAGE_SIZE as u32 + (raw & BYTE_MASK)
}

/// Decode one persisted cursor slot. `None` for the erased sentinel and
/// for corrupt slots (a torn table write) whose byte field reaches into
/// the ECC region or whose offset falls outside the block.
fn decode_cursor_slot(raw: u32) -> Option<u32> {
    if raw == CURSOR_UNSET || raw & BYTE_MASK >= PAGE_SIZE as u32 {
        return None;
    }
    let cursor = raw_to_cursor(raw);
    if cursor > BLOCK_SIZE {
        return None;
    }
    Some(cursor)
}

/// Overlay the staged replacement onto one page buffer: the intersection
/// of the page's byte range with `[start, end)` receives `fill` (or 0xFF
/// when the range is being erased).
fn splice_page(buf: &mut [u8; PAGE_SIZE], page: u16, start: u32, end: u32, fill: Option<&[u8]>) {
    let page_start = page as u32 * PAGE_SIZE as u32;
    let page_end = page_start + PAGE_SIZE as u32;
    let lo = start.max(page_start);
    let hi = end.min(page_end);
    if lo >= hi {
        return;
    }
    let range = (lo - page_start) as usize..(hi - page_start) as usize;
    match fill {
        Some(data) => {
            buf[range].copy_from_slice(&data[(lo - start) as usize..(hi - start) as usize])
        }
        None => buf[range].fill(0xFF),
    }
}

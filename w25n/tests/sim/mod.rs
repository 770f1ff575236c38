#![allow(dead_code)]

//! Simulated W25N01 chip behind the transport contract.
//!
//! Decodes the same opcodes the driver issues and models the page buffer,
//! the write-enable latch, NAND program semantics (bits only go 1 -> 0),
//! the busy flag and fault injection for ECC and erase failures. Protocol
//! violations (command while busy, program without the latch) surface as
//! transport errors so sequencing bugs fail tests instead of passing
//! silently.

use std::collections::{HashMap, HashSet};

use nand_transport::{DataLines, QspiTransport};
use w25n::address::PAGE_SIZE;
use w25n::device::{config, opcode, status, JEDEC_ID};

const REG_PROTECTION: u32 = 0xA0;
const REG_CONFIGURATION: u32 = 0xB0;
const REG_STATUS: u32 = 0xC0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    UnknownCommand(u8),
    UnknownRegister(u32),
    /// Command issued while the chip was still busy.
    Busy,
    /// Program or erase without the write-enable latch.
    WriteNotEnabled,
    /// Data phase used the wrong number of lines for the opcode.
    WrongLines,
    /// Streamed read while buffer mode is off.
    BufferModeOff,
    /// Column address ran past the page buffer.
    OutOfRange,
    /// Fault injected by the test.
    InjectedFault,
}

/// Call counters, for asserting how the driver drove the chip.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimStats {
    pub resets: usize,
    pub page_reads: usize,
    pub programs: usize,
    pub erases: usize,
}

pub struct SimChip {
    /// Programmed pages by page-aligned address (block << 6 | page).
    /// Absent pages are erased (all 0xFF).
    pages: HashMap<u32, [u8; PAGE_SIZE]>,
    page_buffer: [u8; PAGE_SIZE],
    protection: u8,
    configuration: u8,
    write_enabled: bool,
    erase_failed: bool,
    program_failed: bool,
    ecc_failed: bool,
    /// Status reads report busy while this is non-zero.
    busy_countdown: u8,
    /// Reports busy forever when set.
    wedged: bool,
    jedec: u32,
    last_ecc_page: u16,
    /// Page addresses that flag an uncorrectable ECC error when read.
    ecc_fail_pages: HashSet<u32>,
    /// Remaining erase failures to inject, per block.
    erase_failures: HashMap<u16, u8>,
    /// Page addresses whose program-execute fails at the bus level.
    program_faults: HashSet<u32>,
    pub stats: SimStats,
}

impl SimChip {
    pub fn new() -> Self {
        Self::with_jedec(JEDEC_ID)
    }

    pub fn with_jedec(jedec: u32) -> Self {
        SimChip {
            pages: HashMap::new(),
            page_buffer: [0xFF; PAGE_SIZE],
            protection: 0x7C,
            configuration: config::BUF | config::ECC_ENABLE,
            write_enabled: false,
            erase_failed: false,
            program_failed: false,
            ecc_failed: false,
            busy_countdown: 0,
            wedged: false,
            jedec,
            last_ecc_page: 0,
            ecc_fail_pages: HashSet::new(),
            erase_failures: HashMap::new(),
            program_faults: HashSet::new(),
            stats: SimStats::default(),
        }
    }

    /// Current content of a page, erased pages included.
    pub fn page(&self, block: u16, page: u16) -> [u8; PAGE_SIZE] {
        let pa = (block as u32) << 6 | page as u32;
        self.pages.get(&pa).copied().unwrap_or([0xFF; PAGE_SIZE])
    }

    pub fn page_is_erased(&self, block: u16, page: u16) -> bool {
        self.page(block, page).iter().all(|&b| b == 0xFF)
    }

    /// Make reads of the given page flag an uncorrectable ECC error.
    pub fn fail_ecc_on(&mut self, block: u16, page: u16) {
        self.ecc_fail_pages.insert((block as u32) << 6 | page as u32);
    }

    /// Make the next `count` erases of `block` fail.
    pub fn fail_erases_on(&mut self, block: u16, count: u8) {
        self.erase_failures.insert(block, count);
    }

    /// Make every program-execute of the given page fail on the bus.
    pub fn fail_program_on(&mut self, block: u16, page: u16) {
        self.program_faults.insert((block as u32) << 6 | page as u32);
    }

    /// Overwrite bytes of a stored page directly, bypassing the command
    /// interface.
    pub fn patch_page(&mut self, block: u16, page: u16, offset: usize, bytes: &[u8]) {
        let pa = (block as u32) << 6 | page as u32;
        let stored = self.pages.entry(pa).or_insert([0xFF; PAGE_SIZE]);
        stored[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Report busy forever from now on.
    pub fn wedge(&mut self) {
        self.wedged = true;
    }

    fn status_byte(&mut self) -> u8 {
        let mut value = 0;
        if self.wedged {
            value |= status::BUSY;
        } else if self.busy_countdown > 0 {
            self.busy_countdown -= 1;
            value |= status::BUSY;
        }
        if self.write_enabled {
            value |= status::WEL;
        }
        if self.erase_failed {
            value |= status::ERASE_FAIL;
        }
        if self.program_failed {
            value |= status::PROGRAM_FAIL;
        }
        if self.ecc_failed {
            value |= status::ECC_UNCORRECTABLE;
        }
        value
    }

    fn check_ready(&self) -> Result<(), SimError> {
        if self.wedged || self.busy_countdown > 0 {
            Err(SimError::Busy)
        } else {
            Ok(())
        }
    }
}

impl QspiTransport for SimChip {
    type Error = SimError;

    fn command(&mut self, op: u8) -> Result<(), Self::Error> {
        match op {
            opcode::DEVICE_RESET => {
                self.page_buffer = [0xFF; PAGE_SIZE];
                self.write_enabled = false;
                self.erase_failed = false;
                self.program_failed = false;
                self.ecc_failed = false;
                self.busy_countdown = 1;
                self.stats.resets += 1;
                Ok(())
            }
            opcode::WRITE_ENABLE => {
                self.check_ready()?;
                self.write_enabled = true;
                Ok(())
            }
            opcode::WRITE_DISABLE => {
                self.check_ready()?;
                self.write_enabled = false;
                Ok(())
            }
            other => Err(SimError::UnknownCommand(other)),
        }
    }

    fn command_with_address(&mut self, op: u8, address: u32) -> Result<(), Self::Error> {
        self.check_ready()?;
        match op {
            opcode::PAGE_DATA_READ => {
                self.page_buffer = self
                    .pages
                    .get(&address)
                    .copied()
                    .unwrap_or([0xFF; PAGE_SIZE]);
                if self.ecc_fail_pages.contains(&address) {
                    self.ecc_failed = true;
                    self.last_ecc_page = address as u16;
                } else {
                    self.ecc_failed = false;
                }
                self.busy_countdown = 2;
                self.stats.page_reads += 1;
                Ok(())
            }
            opcode::PROGRAM_EXECUTE => {
                if self.program_faults.contains(&address) {
                    return Err(SimError::InjectedFault);
                }
                if !self.write_enabled {
                    return Err(SimError::WriteNotEnabled);
                }
                let stored = self.pages.entry(address).or_insert([0xFF; PAGE_SIZE]);
                for (dst, src) in stored.iter_mut().zip(self.page_buffer.iter()) {
                    *dst &= *src;
                }
                self.write_enabled = false;
                self.program_failed = false;
                self.busy_countdown = 2;
                self.stats.programs += 1;
                Ok(())
            }
            opcode::BLOCK_ERASE => {
                if !self.write_enabled {
                    return Err(SimError::WriteNotEnabled);
                }
                let block = (address >> 6) as u16;
                self.write_enabled = false;
                self.busy_countdown = 2;
                self.stats.erases += 1;
                match self.erase_failures.get_mut(&block) {
                    Some(remaining) if *remaining > 0 => {
                        *remaining -= 1;
                        self.erase_failed = true;
                    }
                    _ => {
                        self.pages.retain(|pa, _| (pa >> 6) as u16 != block);
                        self.erase_failed = false;
                    }
                }
                Ok(())
            }
            other => Err(SimError::UnknownCommand(other)),
        }
    }

    fn read(
        &mut self,
        op: u8,
        address: Option<u32>,
        buf: &mut [u8],
        _dummy_cycles: u8,
        lines: DataLines,
    ) -> Result<(), Self::Error> {
        match op {
            opcode::READ_STATUS_REG => {
                let reg = address.ok_or(SimError::UnknownRegister(0))?;
                buf[0] = match reg {
                    REG_PROTECTION => self.protection,
                    REG_CONFIGURATION => self.configuration,
                    REG_STATUS => self.status_byte(),
                    other => return Err(SimError::UnknownRegister(other)),
                };
                Ok(())
            }
            opcode::JEDEC_ID => {
                self.check_ready()?;
                buf.copy_from_slice(&self.jedec.to_be_bytes()[1..4]);
                Ok(())
            }
            opcode::FAST_READ_DUAL_OUTPUT => {
                self.check_ready()?;
                if lines != DataLines::Dual {
                    return Err(SimError::WrongLines);
                }
                if self.configuration & config::BUF == 0 {
                    return Err(SimError::BufferModeOff);
                }
                let column = address.unwrap_or(0) as usize;
                if column + buf.len() > PAGE_SIZE {
                    return Err(SimError::OutOfRange);
                }
                buf.copy_from_slice(&self.page_buffer[column..column + buf.len()]);
                Ok(())
            }
            opcode::LAST_ECC_FAILURE_ADDR => {
                self.check_ready()?;
                buf.copy_from_slice(&self.last_ecc_page.to_be_bytes()[..buf.len()]);
                Ok(())
            }
            opcode::READ_BBM_LUT => {
                self.check_ready()?;
                buf.fill(0);
                Ok(())
            }
            other => Err(SimError::UnknownCommand(other)),
        }
    }

    fn write(
        &mut self,
        op: u8,
        address: u32,
        buf: &[u8],
        lines: DataLines,
    ) -> Result<(), Self::Error> {
        self.check_ready()?;
        match op {
            opcode::WRITE_STATUS_REG => {
                match address {
                    REG_PROTECTION => self.protection = buf[0],
                    REG_CONFIGURATION => self.configuration = buf[0],
                    REG_STATUS => {}
                    other => return Err(SimError::UnknownRegister(other)),
                }
                Ok(())
            }
            opcode::QUAD_LOAD_PROGRAM_DATA => {
                if lines != DataLines::Quad {
                    return Err(SimError::WrongLines);
                }
                let column = address as usize;
                if column + buf.len() > PAGE_SIZE {
                    return Err(SimError::OutOfRange);
                }
                // Plain (non-random) load resets the rest of the buffer.
                self.page_buffer = [0xFF; PAGE_SIZE];
                self.page_buffer[column..column + buf.len()].copy_from_slice(buf);
                Ok(())
            }
            other => Err(SimError::UnknownCommand(other)),
        }
    }

    fn bus_busy(&self) -> bool {
        false
    }
}

//! # Physical memory sink
//!
//! [MemorySink] implementation which writes the image segments directly to physical memory.
//! Writes are restricted to a list of regions so a malformed or hostile image can not overwrite
//! the bootloader itself.
use core::ops::Range;

use sunxi_elf_image::{MemorySink, SinkError};

pub struct PhysicalMemory<'a> {
    regions: &'a [Range<u64>],
}

impl<'a> PhysicalMemory<'a> {
    /// Create a sink which accepts writes to the given physical address regions.
    ///
    /// # Safety
    ///
    /// All regions must be valid, writable memory which is identity mapped for the primary CPU
    /// and not used by the running program, for example the SRAM and DRAM windows reserved for
    /// the co-processor.
    pub const unsafe fn new(regions: &'a [Range<u64>]) -> Self {
        Self { regions }
    }

    #[inline]
    pub const fn regions(&self) -> &'a [Range<u64>] {
        self.regions
    }

    fn checked_ptr(&self, addr: u64, len: u64) -> Result<*mut u8, SinkError> {
        let error = SinkError { addr, len };
        let end = addr.checked_add(len).ok_or(error)?;
        if !self
            .regions
            .iter()
            .any(|region| addr >= region.start && end <= region.end)
        {
            return Err(error);
        }
        let addr = usize::try_from(addr).map_err(|_| error)?;
        usize::try_from(len).map_err(|_| error)?;
        Ok(addr as *mut u8)
    }
}

impl MemorySink for PhysicalMemory<'_> {
    fn write(&mut self, addr: u64, data: &[u8]) -> Result<(), SinkError> {
        let dest = self.checked_ptr(addr, data.len() as u64)?;
        // Safety: The destination range lies inside one of the regions passed to the
        // constructor, and the image buffer can not overlap them.
        unsafe { core::ptr::copy_nonoverlapping(data.as_ptr(), dest, data.len()) };
        Ok(())
    }

    fn fill(&mut self, addr: u64, len: u64, value: u8) -> Result<(), SinkError> {
        let dest = self.checked_ptr(addr, len)?;
        // Safety: See write. The length was checked to fit into usize.
        unsafe { core::ptr::write_bytes(dest, value, len as usize) };
        Ok(())
    }

    fn accepts(&self, addr: u64, len: u64) -> bool {
        self.checked_ptr(addr, len).is_ok()
    }
}

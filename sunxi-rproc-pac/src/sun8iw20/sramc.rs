//! SRAM controller inside the system configuration block.
use super::SYS_CFG_BASE_ADDR;

#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug)]
pub struct SramRemap {
    /// If set, the DSP local SRAM is mapped into the address space of the primary CPU. It must
    /// be cleared before the DSP runs from its local SRAM.
    #[bit(0, rw)]
    cpu_access: bool,
}

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct SramController {
    _gap0: [u32; 2],
    remap: SramRemap,
}

static_assertions::const_assert_eq!(core::mem::size_of::<SramController>(), 0x0C);

pub const SRAM_REMAP_ADDR: usize = SYS_CFG_BASE_ADDR + core::mem::offset_of!(SramController, remap);

impl SramController {
    /// Create a new handle to the SRAM controller.
    ///
    /// # Safety
    ///
    /// If you create multiple instances of this handle at the same time, you are responsible for
    /// ensuring that there are no read-modify-write races on any of the registers.
    pub unsafe fn new_mmio_fixed() -> MmioSramController<'static> {
        unsafe { Self::new_mmio_at(SYS_CFG_BASE_ADDR) }
    }
}

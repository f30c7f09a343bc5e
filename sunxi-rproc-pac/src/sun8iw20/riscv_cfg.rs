//! # C906 RISC-V configuration block
use super::RISCV_CFG_BASE_ADDR;

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct RiscvConfig {
    _gap0: u32,
    /// Lower 32 bits of the start address.
    start_addr_low: u32,
    /// Upper 32 bits of the start address.
    start_addr_high: u32,
}

static_assertions::const_assert_eq!(core::mem::size_of::<RiscvConfig>(), 0x0C);

pub const START_ADDR_LOW_ADDR: usize =
    RISCV_CFG_BASE_ADDR + core::mem::offset_of!(RiscvConfig, start_addr_low);
pub const START_ADDR_HIGH_ADDR: usize =
    RISCV_CFG_BASE_ADDR + core::mem::offset_of!(RiscvConfig, start_addr_high);

impl RiscvConfig {
    /// Create a new handle to the RISC-V configuration block.
    ///
    /// # Safety
    ///
    /// If you create multiple instances of this handle at the same time, you are responsible for
    /// ensuring that there are no read-modify-write races on any of the registers.
    pub unsafe fn new_mmio_fixed() -> MmioRiscvConfig<'static> {
        unsafe { Self::new_mmio_at(RISCV_CFG_BASE_ADDR) }
    }
}

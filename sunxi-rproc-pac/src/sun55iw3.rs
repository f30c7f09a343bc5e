//! # sun55iw3 (A523/T527) co-processor registers
//!
//! The E906 RISC-V core of this family is clocked and reset through the DSP PRCM block instead
//! of the main CCU. It shares the public SRAM with the primary CPU.

pub const DSP_PRCM_BASE_ADDR: usize = 0x0710_2000;
pub const RISCV_CFG_BASE_ADDR: usize = 0x0713_0000;

/// The E906 start address register resets to zero.
pub const RISCV_DEFAULT_START_ADDR: u32 = 0x0000_0000;

/// Public SRAM clock and reset configuration.
#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug)]
pub struct PubSramConfig {
    /// Active-low public SRAM reset.
    #[bit(16, rw)]
    rst: bool,
    #[bit(0, rw)]
    gating: bool,
}

#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug)]
pub struct RiscvClock {
    /// Execution clock of the E906 core.
    #[bit(31, rw)]
    clk_gating: bool,
    /// AXI divider N, the divider is the field value plus one.
    #[bits(8..=9, rw)]
    factor_n: arbitrary_int::u2,
    /// Core divider M, the divider is the field value plus one.
    #[bits(0..=4, rw)]
    factor_m: arbitrary_int::u5,
}

/// RISC-V bus gating and reset register. All reset bits are active-low.
#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug)]
pub struct RiscvCfgBusGatingReset {
    #[bit(18, rw)]
    core_rst: bool,
    #[bit(17, rw)]
    apb_db_rst: bool,
    #[bit(16, rw)]
    cfg_rst: bool,
    #[bit(0, rw)]
    cfg_gating: bool,
}

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct DspPrcm {
    _gap0: [u32; 0x45],
    pubsram_cfg: PubSramConfig,
    _gap1: [u32; 0x02],
    riscv_clk: RiscvClock,
    riscv_cfg_bgr: RiscvCfgBusGatingReset,
}

static_assertions::const_assert_eq!(core::mem::size_of::<DspPrcm>(), 0x128);

pub const PUBSRAM_CFG_ADDR: usize = DSP_PRCM_BASE_ADDR + core::mem::offset_of!(DspPrcm, pubsram_cfg);
pub const RISCV_CLK_ADDR: usize = DSP_PRCM_BASE_ADDR + core::mem::offset_of!(DspPrcm, riscv_clk);
pub const RISCV_CFG_BGR_ADDR: usize =
    DSP_PRCM_BASE_ADDR + core::mem::offset_of!(DspPrcm, riscv_cfg_bgr);

impl DspPrcm {
    /// Create a new handle to the DSP PRCM block.
    ///
    /// # Safety
    ///
    /// If you create multiple instances of this handle at the same time, you are responsible for
    /// ensuring that there are no read-modify-write races on any of the registers.
    pub unsafe fn new_mmio_fixed() -> MmioDspPrcm<'static> {
        unsafe { Self::new_mmio_at(DSP_PRCM_BASE_ADDR) }
    }
}

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct RiscvConfig {
    _gap0: [u32; 0x81],
    start_addr: u32,
}

static_assertions::const_assert_eq!(core::mem::size_of::<RiscvConfig>(), 0x208);

pub const RISCV_START_ADDR_ADDR: usize =
    RISCV_CFG_BASE_ADDR + core::mem::offset_of!(RiscvConfig, start_addr);

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

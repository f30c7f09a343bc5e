//! # sun8iw21 (V851/V853) co-processor registers
//!
//! This SoC family pairs the primary Cortex-A7 with an E907 RISC-V core.
use arbitrary_int::{u2, u5};

pub use crate::sun8iw20::ccu::{PllPeriControl, RiscvCfgBusGatingReset};

pub const CCU_BASE_ADDR: usize = 0x0200_1000;
pub const RISCV_CFG_BASE_ADDR: usize = 0x0601_0000;

pub const PLL_PERI_CTRL_ADDR: usize = CCU_BASE_ADDR + 0x020;
pub const RISCV_CLK_ADDR: usize = CCU_BASE_ADDR + 0xD00;
pub const RISCV_GATING_RST_ADDR: usize = CCU_BASE_ADDR + 0xD04;
pub const RISCV_CFG_BGR_ADDR: usize = CCU_BASE_ADDR + 0xD0C;

/// The E907 start address register resets to zero.
pub const RISCV_DEFAULT_START_ADDR: u32 = 0x0000_0000;

#[bitbybit::bitenum(u3, exhaustive = false)]
#[derive(Debug, PartialEq, Eq)]
pub enum RiscvClockSource {
    Hosc = 0b000,
    Clk32k = 0b001,
    Clk16mRc = 0b010,
    PllPeri600m = 0b011,
    PllPeri480m = 0b100,
    PllCpu = 0b101,
}

#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug)]
pub struct RiscvClock {
    #[bits(24..=26, rw)]
    src_sel: Option<RiscvClockSource>,
    /// AXI divider N, the divider is the field value plus one.
    #[bits(8..=9, rw)]
    factor_n: u2,
    /// Core divider M, the divider is the field value plus one.
    #[bits(0..=4, rw)]
    factor_m: u5,
}

/// Keyed combined clock gating and reset register of the E907.
#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug)]
pub struct RiscvGatingReset {
    #[bit(31, rw)]
    clk_gating: bool,
    /// Active-low reset of the APB bus of the E907 subsystem.
    #[bit(17, rw)]
    sys_apb_soft_rstn: bool,
    /// Active-low core reset.
    #[bit(16, rw)]
    soft_rstn: bool,
    /// Must be [crate::RISCV_REG_KEY] for a write to take effect. Reads back as zero.
    #[bits(0..=15, w)]
    key: u16,
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

//! CCU clock and reset registers of the DSP and RISC-V cores.
use super::CCU_BASE_ADDR;
use arbitrary_int::{u2, u5};

pub const PLL_PERI0_CTRL_OFFSET: usize = 0x020;
pub const DSP_CLK_OFFSET: usize = 0xC70;
pub const DSP_BGR_OFFSET: usize = 0xC7C;
pub const RISCV_CLK_OFFSET: usize = 0xD00;
pub const RISCV_GATING_OFFSET: usize = 0xD04;
pub const RISCV_CFG_BGR_OFFSET: usize = 0xD0C;
pub const RISCV_RST_OFFSET: usize = 0xF20;

pub const PLL_PERI0_CTRL_ADDR: usize = CCU_BASE_ADDR + PLL_PERI0_CTRL_OFFSET;
pub const DSP_CLK_ADDR: usize = CCU_BASE_ADDR + DSP_CLK_OFFSET;
pub const DSP_BGR_ADDR: usize = CCU_BASE_ADDR + DSP_BGR_OFFSET;
pub const RISCV_CLK_ADDR: usize = CCU_BASE_ADDR + RISCV_CLK_OFFSET;
pub const RISCV_GATING_ADDR: usize = CCU_BASE_ADDR + RISCV_GATING_OFFSET;
pub const RISCV_CFG_BGR_ADDR: usize = CCU_BASE_ADDR + RISCV_CFG_BGR_OFFSET;
pub const RISCV_RST_ADDR: usize = CCU_BASE_ADDR + RISCV_RST_OFFSET;

/// Peripheral PLL control. The output frequency is `24 MHz * N / (M * P)`.
#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug)]
pub struct PllPeriControl {
    #[bit(31, rw)]
    enable: bool,
    #[bit(29, rw)]
    lock_enable: bool,
    #[bit(28, r)]
    lock: bool,
    /// Post divider P1, the divider is the field value plus one.
    #[bits(20..=21, rw)]
    p1: u2,
    /// Post divider P0, the divider is the field value plus one.
    #[bits(16..=17, rw)]
    p0: u2,
    /// Multiplier N, the multiplier is the field value plus one.
    #[bits(8..=15, rw)]
    n: u8,
    /// Input divider M, the divider is two if this bit is set.
    #[bit(0, rw)]
    m: bool,
}

#[bitbybit::bitenum(u3, exhaustive = false)]
#[derive(Debug, PartialEq, Eq)]
pub enum DspClockSource {
    Hosc = 0b000,
    Clk32k = 0b001,
    Clk16mRc = 0b010,
    PllPeri2x = 0b011,
    PllAudio1Div2 = 0b100,
}

#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug)]
pub struct DspClock {
    /// Special clock gating. This is the execution clock of the DSP core.
    #[bit(31, rw)]
    sclk_gating: bool,
    #[bits(24..=26, rw)]
    src_sel: Option<DspClockSource>,
    /// Divider M, the divider is the field value plus one.
    #[bits(0..=4, rw)]
    factor_m: u5,
}

/// DSP bus gating and reset register.
///
/// The reset bits are active-low: setting a bit de-asserts the corresponding reset.
#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug)]
pub struct DspBusGatingReset {
    #[bit(18, rw)]
    dbg_rst: bool,
    #[bit(17, rw)]
    cfg_rst: bool,
    #[bit(16, rw)]
    dsp_rst: bool,
    #[bit(1, rw)]
    cfg_gating: bool,
}

#[bitbybit::bitenum(u3, exhaustive = false)]
#[derive(Debug, PartialEq, Eq)]
pub enum RiscvClockSource {
    Hosc = 0b000,
    Clk32k = 0b001,
    Clk16mRc = 0b010,
    PllPeri800m = 0b011,
    PllPeri1x = 0b100,
    PllCpu = 0b101,
    PllAudio1Div2 = 0b110,
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

/// Keyed RISC-V clock gating register.
#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug)]
pub struct RiscvGating {
    #[bit(31, rw)]
    clk_gating: bool,
    /// Must be [crate::RISCV_REG_KEY] for a write to take effect. Reads back as zero.
    #[bits(0..=15, w)]
    key: u16,
}

/// Keyed RISC-V soft reset register.
#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug)]
pub struct RiscvSoftReset {
    /// Must be [crate::RISCV_REG_KEY] for a write to take effect. Reads back as zero.
    #[bits(16..=31, w)]
    key: u16,
    /// Active-low core reset.
    #[bit(0, rw)]
    soft_rstn: bool,
}

/// RISC-V configuration block bus gating and reset register.
#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug)]
pub struct RiscvCfgBusGatingReset {
    #[bit(16, rw)]
    cfg_rst: bool,
    #[bit(0, rw)]
    cfg_gating: bool,
}

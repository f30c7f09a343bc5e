//! # sun8iw20 (T113) and sun20iw1 (D1) co-processor registers
//!
//! These SoCs contain a HiFi4 DSP and, depending on the variant, a C906 RISC-V core next to the
//! primary CPU.
pub use ccu::{
    DspBusGatingReset, DspClock, DspClockSource, PllPeriControl, RiscvCfgBusGatingReset,
    RiscvClock, RiscvClockSource, RiscvGating, RiscvSoftReset,
};
pub use dsp::{ControlReg0, DspConfig, MmioDspConfig, Prid, Status, Version};
pub use riscv_cfg::{MmioRiscvConfig, RiscvConfig};
pub use sramc::{MmioSramController, SramController, SramRemap};

pub mod ccu;
pub mod dsp;
pub mod riscv_cfg;
pub mod sramc;

pub const CCU_BASE_ADDR: usize = 0x0200_1000;
pub const SYS_CFG_BASE_ADDR: usize = 0x0300_0000;
pub const DSP0_CFG_BASE_ADDR: usize = 0x0170_0000;
pub const RISCV_CFG_BASE_ADDR: usize = 0x0601_0000;

/// Reset vector of the HiFi4 DSP if the alternate vector is not selected.
pub const DSP_DEFAULT_RESET_VECTOR: u32 = 0x0010_0000;

/// The C906 start address registers reset to zero.
pub const RISCV_DEFAULT_START_ADDR: u32 = 0x0000_0000;

//! # Co-processor presets
//!
//! [CoreTarget] descriptors for the co-processors of the supported SoC families and the address
//! remap tables of the supported boards.
//!
//! Register values are composed with the bitfield types of [sunxi_rproc_pac].
use arbitrary_int::u5;
use sunxi_elf_image::{AddressRange, Machine, RemapTable};
use sunxi_rproc_pac::{RISCV_REG_KEY, sun8iw20, sun8iw21, sun55iw3};

use crate::target::{
    BootVector, ClockProbe, CoreKind, CoreTarget, EntryView, PllFormula, RegField, RunStall,
    SramSharing,
};

/// Clock source select field of the DSP and RISC-V clock registers.
const CLK_SRC_SEL_MASK: u32 = 0b111 << 24;

const KEY_LOW: u32 = RISCV_REG_KEY as u32;
const KEY_HIGH: u32 = (RISCV_REG_KEY as u32) << 16;

pub mod sun8iw20_hifi4 {
    use super::*;
    use sun8iw20::{
        DspBusGatingReset, DspClock, DspClockSource, SramRemap, ccu, dsp, sramc,
    };

    const CFG_GATING: u32 = DspBusGatingReset::new_with_raw_value(0)
        .with_cfg_gating(true)
        .raw_value();
    const CFG_RESETS: u32 = DspBusGatingReset::new_with_raw_value(0)
        .with_cfg_rst(true)
        .with_dbg_rst(true)
        .raw_value();
    const CORE_RESET: u32 = DspBusGatingReset::new_with_raw_value(0)
        .with_dsp_rst(true)
        .raw_value();

    /// PLL_PERI(2X) divided by two, execution clock gate open.
    pub const DSP_CLK: u32 = DspClock::new_with_raw_value(0)
        .with_src_sel(DspClockSource::PllPeri2x)
        .with_factor_m(u5::new(1))
        .with_sclk_gating(true)
        .raw_value();
    const SCLK_GATING: u32 = DspClock::new_with_raw_value(0)
        .with_sclk_gating(true)
        .raw_value();

    const START_VEC_SEL: u32 = dsp::ControlReg0::new_with_raw_value(0)
        .with_start_vec_sel(true)
        .raw_value();
    const RUN_STALL: u32 = dsp::ControlReg0::new_with_raw_value(0)
        .with_run_stall(true)
        .raw_value();
    const DSP_CLKEN: u32 = dsp::ControlReg0::new_with_raw_value(0)
        .with_dsp_clken(true)
        .raw_value();

    /// Set: the local SRAM is mapped for the primary CPU. Cleared: the DSP owns it.
    const SRAM_CPU_ACCESS: u32 = SramRemap::new_with_raw_value(0)
        .with_cpu_access(true)
        .raw_value();

    static CONFIG_GATE: [RegField; 2] = [
        RegField::set(ccu::DSP_BGR_ADDR, CFG_GATING),
        RegField::set(ccu::DSP_BGR_ADDR, CFG_RESETS),
    ];
    static EXEC_CLOCK: [RegField; 2] = [
        RegField::write(ccu::DSP_CLK_ADDR, DSP_CLK),
        RegField::set(dsp::CTRL_REG0_ADDR, DSP_CLKEN),
    ];
    static RESET_RELEASE: [RegField; 1] = [RegField::set(ccu::DSP_BGR_ADDR, CORE_RESET)];
    static RESET_SEQUENCE: [RegField; 3] = [
        RegField::clear(ccu::DSP_BGR_ADDR, CORE_RESET),
        RegField::clear(ccu::DSP_CLK_ADDR, SCLK_GATING),
        RegField::write(ccu::DSP_BGR_ADDR, 0),
    ];

    /// HiFi4 DSP of the sun8iw20 (T113) and sun20iw1 (D1) families.
    pub const TARGET: CoreTarget = CoreTarget {
        name: "hifi4",
        kind: CoreKind::Dsp,
        config_gate: &CONFIG_GATE,
        boot_vector: BootVector {
            default: sun8iw20::DSP_DEFAULT_RESET_VECTOR as u64,
            low: dsp::ALT_RESET_VEC_ADDR,
            high: None,
            select: Some(RegField::set(dsp::CTRL_REG0_ADDR, START_VEC_SEL)),
        },
        run_stall: Some(RunStall {
            addr: dsp::CTRL_REG0_ADDR,
            mask: RUN_STALL,
        }),
        clock_source: None,
        exec_clock: &EXEC_CLOCK,
        reset_release: &RESET_RELEASE,
        reset_sequence: &RESET_SEQUENCE,
        sram: Some(SramSharing {
            to_cpu: RegField::set(sramc::SRAM_REMAP_ADDR, SRAM_CPU_ACCESS),
            to_target: Some(RegField::clear(sramc::SRAM_REMAP_ADDR, SRAM_CPU_ACCESS)),
        }),
        entry_view: EntryView::Target,
        machine: Some(Machine::Xtensa),
        clock_probe: None,
    };
}

pub mod sun8iw20_c906 {
    use super::*;
    use sun8iw20::{
        RiscvCfgBusGatingReset, RiscvClock, RiscvClockSource, RiscvGating, RiscvSoftReset, ccu,
        riscv_cfg,
    };

    const CFG_ON: u32 = RiscvCfgBusGatingReset::new_with_raw_value(0)
        .with_cfg_rst(true)
        .with_cfg_gating(true)
        .raw_value();
    const CLK_SRC: u32 = RiscvClock::new_with_raw_value(0)
        .with_src_sel(RiscvClockSource::PllPeri800m)
        .raw_value();
    const CLK_GATING: u32 = RiscvGating::new_with_raw_value(0)
        .with_clk_gating(true)
        .raw_value();
    const SOFT_RSTN: u32 = RiscvSoftReset::new_with_raw_value(0)
        .with_soft_rstn(true)
        .raw_value();

    static CONFIG_GATE: [RegField; 1] = [RegField::write(ccu::RISCV_CFG_BGR_ADDR, CFG_ON)];
    static EXEC_CLOCK: [RegField; 1] =
        [RegField::write(ccu::RISCV_GATING_ADDR, CLK_GATING | KEY_LOW).unverified(0xFFFF)];
    static RESET_RELEASE: [RegField; 1] =
        [RegField::write(ccu::RISCV_RST_ADDR, KEY_HIGH | SOFT_RSTN).unverified(0xFFFF_0000)];
    static RESET_SEQUENCE: [RegField; 3] = [
        RegField::write(ccu::RISCV_RST_ADDR, KEY_HIGH).unverified(0xFFFF_0000),
        RegField::write(ccu::RISCV_GATING_ADDR, KEY_LOW).unverified(0xFFFF),
        RegField::write(ccu::RISCV_CFG_BGR_ADDR, 0),
    ];

    /// C906 RISC-V co-processor of the sun8iw20 (T113) family. On sun20iw1 (D1) the C906 is
    /// the primary CPU.
    pub const TARGET: CoreTarget = CoreTarget {
        name: "c906",
        kind: CoreKind::RiscV,
        config_gate: &CONFIG_GATE,
        boot_vector: BootVector {
            default: sun8iw20::RISCV_DEFAULT_START_ADDR as u64,
            low: riscv_cfg::START_ADDR_LOW_ADDR,
            high: Some(riscv_cfg::START_ADDR_HIGH_ADDR),
            select: None,
        },
        run_stall: None,
        clock_source: Some(RegField::field(ccu::RISCV_CLK_ADDR, CLK_SRC_SEL_MASK, CLK_SRC)),
        exec_clock: &EXEC_CLOCK,
        reset_release: &RESET_RELEASE,
        reset_sequence: &RESET_SEQUENCE,
        sram: None,
        entry_view: EntryView::Target,
        machine: Some(Machine::RiscV),
        clock_probe: Some(ClockProbe {
            pll_ctrl: ccu::PLL_PERI0_CTRL_ADDR,
            core_clk: ccu::RISCV_CLK_ADDR,
            formula: PllFormula::PostDivP1,
        }),
    };
}

pub mod sun8iw21_e907 {
    use super::*;
    use sun8iw21::{RiscvCfgBusGatingReset, RiscvClock, RiscvClockSource, RiscvGatingReset};

    const CFG_ON: u32 = RiscvCfgBusGatingReset::new_with_raw_value(0)
        .with_cfg_rst(true)
        .with_cfg_gating(true)
        .raw_value();
    const CLK_SRC: u32 = RiscvClock::new_with_raw_value(0)
        .with_src_sel(RiscvClockSource::PllPeri600m)
        .raw_value();
    const CLK_GATING: u32 = RiscvGatingReset::new_with_raw_value(0)
        .with_clk_gating(true)
        .raw_value();
    const RESETS: u32 = RiscvGatingReset::new_with_raw_value(0)
        .with_soft_rstn(true)
        .with_sys_apb_soft_rstn(true)
        .raw_value();

    static CONFIG_GATE: [RegField; 1] = [RegField::set(sun8iw21::RISCV_CFG_BGR_ADDR, CFG_ON)];
    // The key is part of every write to the combined gating and reset register.
    static EXEC_CLOCK: [RegField; 1] = [RegField::set(
        sun8iw21::RISCV_GATING_RST_ADDR,
        CLK_GATING | KEY_LOW,
    )
    .unverified(0xFFFF)];
    static RESET_RELEASE: [RegField; 1] =
        [RegField::set(sun8iw21::RISCV_GATING_RST_ADDR, RESETS | KEY_LOW).unverified(0xFFFF)];
    static RESET_SEQUENCE: [RegField; 2] = [
        RegField::write(sun8iw21::RISCV_GATING_RST_ADDR, KEY_LOW).unverified(0xFFFF),
        RegField::clear(sun8iw21::RISCV_CFG_BGR_ADDR, CFG_ON),
    ];

    /// E907 RISC-V core of the sun8iw21 (V851/V853) family.
    pub const TARGET: CoreTarget = CoreTarget {
        name: "e907",
        kind: CoreKind::RiscV,
        config_gate: &CONFIG_GATE,
        boot_vector: BootVector {
            default: sun8iw21::RISCV_DEFAULT_START_ADDR as u64,
            low: sun8iw21::RISCV_START_ADDR_ADDR,
            high: None,
            select: None,
        },
        run_stall: None,
        clock_source: Some(RegField::field(
            sun8iw21::RISCV_CLK_ADDR,
            CLK_SRC_SEL_MASK,
            CLK_SRC,
        )),
        exec_clock: &EXEC_CLOCK,
        reset_release: &RESET_RELEASE,
        reset_sequence: &RESET_SEQUENCE,
        sram: None,
        entry_view: EntryView::Target,
        machine: Some(Machine::RiscV),
        clock_probe: Some(ClockProbe {
            pll_ctrl: sun8iw21::PLL_PERI_CTRL_ADDR,
            core_clk: sun8iw21::RISCV_CLK_ADDR,
            formula: PllFormula::PostDivP0Half,
        }),
    };
}

pub mod sun55iw3_e906 {
    use super::*;
    use sun55iw3::{PubSramConfig, RiscvCfgBusGatingReset, RiscvClock};

    const CFG_ON: u32 = RiscvCfgBusGatingReset::new_with_raw_value(0)
        .with_cfg_rst(true)
        .with_cfg_gating(true)
        .raw_value();
    const CORE_RESETS: u32 = RiscvCfgBusGatingReset::new_with_raw_value(0)
        .with_core_rst(true)
        .with_apb_db_rst(true)
        .raw_value();
    const CLK_GATING: u32 = RiscvClock::new_with_raw_value(0)
        .with_clk_gating(true)
        .raw_value();
    const PUBSRAM_ON: u32 = PubSramConfig::new_with_raw_value(0)
        .with_rst(true)
        .with_gating(true)
        .raw_value();

    static CONFIG_GATE: [RegField; 1] = [RegField::write(sun55iw3::RISCV_CFG_BGR_ADDR, CFG_ON)];
    static EXEC_CLOCK: [RegField; 1] = [RegField::set(sun55iw3::RISCV_CLK_ADDR, CLK_GATING)];
    static RESET_RELEASE: [RegField; 1] =
        [RegField::set(sun55iw3::RISCV_CFG_BGR_ADDR, CORE_RESETS)];
    static RESET_SEQUENCE: [RegField; 3] = [
        RegField::clear(sun55iw3::RISCV_CFG_BGR_ADDR, CORE_RESETS),
        RegField::clear(sun55iw3::RISCV_CLK_ADDR, CLK_GATING),
        RegField::write(sun55iw3::RISCV_CFG_BGR_ADDR, 0),
    ];

    /// E906 RISC-V core of the sun55iw3 (A523/T527) family.
    pub const TARGET: CoreTarget = CoreTarget {
        name: "e906",
        kind: CoreKind::RiscV,
        config_gate: &CONFIG_GATE,
        boot_vector: BootVector {
            default: sun55iw3::RISCV_DEFAULT_START_ADDR as u64,
            low: sun55iw3::RISCV_START_ADDR_ADDR,
            high: None,
            select: None,
        },
        run_stall: None,
        clock_source: None,
        exec_clock: &EXEC_CLOCK,
        reset_release: &RESET_RELEASE,
        reset_sequence: &RESET_SEQUENCE,
        // The CPU keeps the public SRAM clocked and out of reset, the E906 needs no hand-over.
        sram: Some(SramSharing {
            to_cpu: RegField::set(sun55iw3::PUBSRAM_CFG_ADDR, PUBSRAM_ON),
            to_target: None,
        }),
        entry_view: EntryView::Target,
        machine: Some(Machine::RiscV),
        clock_probe: None,
    };
}

/// HiFi4 address map of the 100ASK D1-H board. The DSP sees its local SRAM and DRAM windows
/// swapped with respect to the primary CPU.
pub const HIFI4_D1_H_REMAP: [AddressRange; 2] = [
    AddressRange::new(0x1000_0000, 0x1FFF_FFFF, 0x3000_0000),
    AddressRange::new(0x3000_0000, 0x3FFF_FFFF, 0x1000_0000),
];

/// E906 address map of the Avaota A1 (A523) board.
pub const E906_A523_REMAP: [AddressRange; 2] = [
    AddressRange::new(0x3FFC_0000, 0x4003_FFFF, 0x0728_0000),
    AddressRange::new(0x4040_0000, 0x7FFF_FFFF, 0x4040_0000),
];

/// A core target together with the address map of the board it is mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub target: &'static CoreTarget,
    pub remap: &'static [AddressRange],
}

impl Preset {
    #[inline]
    pub const fn remap_table(&self) -> RemapTable<'static> {
        RemapTable::new(self.remap)
    }
}

pub static PRESETS: [Preset; 4] = [
    Preset {
        name: "d1-h-hifi4",
        target: &sun8iw20_hifi4::TARGET,
        remap: &HIFI4_D1_H_REMAP,
    },
    Preset {
        name: "t113-c906",
        target: &sun8iw20_c906::TARGET,
        remap: &[],
    },
    Preset {
        name: "v851-e907",
        target: &sun8iw21_e907::TARGET,
        remap: &[],
    },
    Preset {
        name: "a523-e906",
        target: &sun55iw3_e906::TARGET,
        remap: &E906_A523_REMAP,
    },
];

/// Look up a preset by name.
pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|preset| preset.name == name)
}

//! Clock probe for started co-processors.
use arbitrary_int::Number;
use sunxi_rproc_pac::{HOSC_FREQ_HZ, sun8iw20, sun8iw21};

use crate::bus::RegisterBus;
use crate::target::{CoreTarget, PllFormula};
use crate::time::Hertz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreClocks {
    /// Output of the peripheral PLL the core clock is derived from.
    pub pll: Hertz,
    pub core: Hertz,
    pub axi: Hertz,
}

/// Derive the clock frequencies of the target core from the PLL and core clock registers.
///
/// Returns [None] if the target has no [crate::target::ClockProbe] or the peripheral PLL is
/// disabled.
pub fn probe_clocks<B: RegisterBus>(bus: &mut B, target: &CoreTarget) -> Option<CoreClocks> {
    let probe = target.clock_probe?;
    let pll_ctrl = sun8iw20::PllPeriControl::new_with_raw_value(bus.read32(probe.pll_ctrl));
    if !pll_ctrl.enable() {
        log::warn!("{}: peripheral PLL disabled", target.name);
        return None;
    }
    let n = u64::from(pll_ctrl.n()) + 1;
    let m = u64::from(pll_ctrl.m()) + 1;
    let pll = match probe.formula {
        PllFormula::PostDivP1 => {
            u64::from(HOSC_FREQ_HZ) * n / (m * (pll_ctrl.p1().as_u32() as u64 + 1))
        }
        PllFormula::PostDivP0Half => {
            (u64::from(HOSC_FREQ_HZ) * n / (m * (pll_ctrl.p0().as_u32() as u64 + 1))) >> 1
        }
    };
    let raw_clk = bus.read32(probe.core_clk);
    let (factor_m, factor_n) = match probe.formula {
        PllFormula::PostDivP1 => {
            let clk = sun8iw20::RiscvClock::new_with_raw_value(raw_clk);
            (clk.factor_m().as_u32() as u64 + 1, clk.factor_n().as_u32() as u64 + 1)
        }
        PllFormula::PostDivP0Half => {
            let clk = sun8iw21::RiscvClock::new_with_raw_value(raw_clk);
            (clk.factor_m().as_u32() as u64 + 1, clk.factor_n().as_u32() as u64 + 1)
        }
    };
    let core = pll / factor_m;
    let axi = core / factor_n;
    let clocks = CoreClocks {
        pll: Hertz::from_raw(u32::try_from(pll).ok()?),
        core: Hertz::from_raw(u32::try_from(core).ok()?),
        axi: Hertz::from_raw(u32::try_from(axi).ok()?),
    };
    log::info!(
        "{}: core clock {} MHz, AXI clock {} MHz",
        target.name,
        clocks.core.to_MHz(),
        clocks.axi.to_MHz()
    );
    Some(clocks)
}

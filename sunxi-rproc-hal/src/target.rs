//! # Co-processor target descriptors
//!
//! A [CoreTarget] describes everything the [crate::sequencer::CoreBootSequencer] needs to know
//! about one boot-able secondary core. The boot protocols of the different sunxi co-processors
//! are irregular, so every capability the protocol might need is optional. Board code selects
//! one of the descriptors in [crate::presets] or defines its own.
use sunxi_elf_image::Machine;

/// Masked register update.
///
/// The new register value is `(current & !mask) | (value & mask)`. After the write, the bits in
/// `verify_mask` are read back and compared against `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegField {
    pub addr: usize,
    pub mask: u32,
    pub value: u32,
    pub verify_mask: u32,
}

impl RegField {
    /// Set all bits of `mask`.
    #[inline]
    pub const fn set(addr: usize, mask: u32) -> Self {
        Self::field(addr, mask, mask)
    }

    /// Clear all bits of `mask`.
    #[inline]
    pub const fn clear(addr: usize, mask: u32) -> Self {
        Self::field(addr, mask, 0)
    }

    /// Replace the bits of `mask` with `value`.
    #[inline]
    pub const fn field(addr: usize, mask: u32, value: u32) -> Self {
        Self {
            addr,
            mask,
            value: value & mask,
            verify_mask: mask,
        }
    }

    /// Replace the whole register with `value`.
    #[inline]
    pub const fn write(addr: usize, value: u32) -> Self {
        Self::field(addr, u32::MAX, value)
    }

    /// Exclude bits from the readback check, for example key fields or self-clearing bits.
    #[inline]
    pub const fn unverified(mut self, mask: u32) -> Self {
        self.verify_mask &= !mask;
        self
    }

    #[inline]
    pub const fn apply(&self, current: u32) -> u32 {
        (current & !self.mask) | self.value
    }

    #[inline]
    pub const fn is_full_write(&self) -> bool {
        self.mask == u32::MAX
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreKind {
    /// Tensilica HiFi4 DSP.
    Dsp,
    RiscV,
}

/// Boot vector registers of a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootVector {
    /// Vector the core starts from if the vector registers are not programmed.
    pub default: u64,
    /// Register receiving bits 0..=31 of the vector.
    pub low: usize,
    /// Register receiving bits 32..=63 of the vector. Targets without it only accept vectors
    /// which fit into 32 bits.
    pub high: Option<usize>,
    /// Field which makes the core use the programmed vector instead of its default.
    pub select: Option<RegField>,
}

impl BootVector {
    /// Whether `entry` can be programmed into the vector registers.
    #[inline]
    pub const fn fits(&self, entry: u64) -> bool {
        self.high.is_some() || entry <= u32::MAX as u64
    }
}

/// Run-stall control bit which keeps the core from fetching instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStall {
    pub addr: usize,
    pub mask: u32,
}

impl RunStall {
    #[inline]
    pub const fn assert(&self) -> RegField {
        RegField::set(self.addr, self.mask)
    }

    #[inline]
    pub const fn release(&self) -> RegField {
        RegField::clear(self.addr, self.mask)
    }
}

/// SRAM which is shared between the primary CPU and the target core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SramSharing {
    /// Gives the primary CPU access to the SRAM.
    pub to_cpu: RegField,
    /// Hands the SRAM to the target core once it is out of reset. Some SoCs do not require an
    /// explicit hand-over.
    pub to_target: Option<RegField>,
}

/// Address view the boot vector registers of a target expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryView {
    /// Address as seen by the target core, which is the entry point declared in the image.
    Target,
    /// Address as seen by the primary CPU, which is the declared entry point after remapping.
    Physical,
}

/// Register formula used to derive the core and AXI clock of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PllFormula {
    /// `24 MHz * N / (M * P1)`.
    PostDivP1,
    /// `(24 MHz * N / (M * P0)) / 2`.
    PostDivP0Half,
}

/// Registers read by [crate::clocks::probe_clocks].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockProbe {
    pub pll_ctrl: usize,
    pub core_clk: usize,
    pub formula: PllFormula,
}

/// Descriptor of a boot-able secondary core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreTarget {
    pub name: &'static str,
    pub kind: CoreKind,
    /// Bus and configuration clock gates, and configuration block resets. Applied in order to
    /// make the control registers of the target writable.
    pub config_gate: &'static [RegField],
    pub boot_vector: BootVector,
    pub run_stall: Option<RunStall>,
    /// Clock source multiplexer of the execution clock.
    pub clock_source: Option<RegField>,
    /// Execution clock enables.
    pub exec_clock: &'static [RegField],
    /// Core reset de-assertion.
    pub reset_release: &'static [RegField],
    /// Inverse of the boot sequence: re-assert reset, stop the execution clock and close the
    /// configuration gates. Applied in order.
    pub reset_sequence: &'static [RegField],
    pub sram: Option<SramSharing>,
    pub entry_view: EntryView,
    /// Machine the images for this core are built for.
    pub machine: Option<Machine>,
    pub clock_probe: Option<ClockProbe>,
}

impl CoreTarget {
    #[inline]
    pub const fn stall_capable(&self) -> bool {
        self.run_stall.is_some()
    }

    #[inline]
    pub const fn default_vector(&self) -> u64 {
        self.boot_vector.default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reg_field_apply() {
        let field = RegField::field(0x100, 0x0700_0000, 0x0300_0000);
        assert_eq!(field.apply(0xFFFF_FFFF), 0xFBFF_FFFF);
        assert_eq!(field.apply(0), 0x0300_0000);
        assert!(!field.is_full_write());
        assert_eq!(RegField::set(0, 1 << 2).apply(0b11), 0b111);
        assert_eq!(RegField::clear(0, 1).apply(0b11), 0b10);
        assert_eq!(RegField::write(0, 0x1234).apply(0xFFFF_0000), 0x1234);
    }

    #[test]
    fn value_outside_mask_is_dropped() {
        let field = RegField::field(0, 0xF, 0xFF);
        assert_eq!(field.value, 0xF);
    }

    #[test]
    fn unverified_bits() {
        let field = RegField::set(0, 0x8000_FFFF).unverified(0xFFFF);
        assert_eq!(field.verify_mask, 0x8000_0000);
        assert_eq!(field.mask, 0x8000_FFFF);
    }

    #[test]
    fn vector_fits() {
        let narrow = BootVector {
            default: 0,
            low: 0x10,
            high: None,
            select: None,
        };
        assert!(narrow.fits(0xFFFF_FFFF));
        assert!(!narrow.fits(0x1_0000_0000));
        let wide = BootVector {
            high: Some(0x14),
            ..narrow
        };
        assert!(wide.fits(u64::MAX));
    }
}

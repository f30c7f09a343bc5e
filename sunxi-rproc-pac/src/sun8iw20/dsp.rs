//! # HiFi4 DSP configuration block
use super::DSP0_CFG_BASE_ADDR;
use arbitrary_int::u5;

#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug)]
pub struct ControlReg0 {
    /// Enables the DSP core clock.
    #[bit(2, rw)]
    dsp_clken: bool,
    /// Selects the alternate reset vector programmed into the alternate reset vector register
    /// instead of [super::DSP_DEFAULT_RESET_VECTOR].
    #[bit(1, rw)]
    start_vec_sel: bool,
    /// Holds the DSP pipeline. Instruction fetch only starts once this bit is cleared.
    #[bit(0, rw)]
    run_stall: bool,
}

#[bitbybit::bitfield(u32)]
#[derive(Debug)]
pub struct Prid {
    #[bits(0..=7, r)]
    prid: u8,
}

#[bitbybit::bitfield(u32)]
#[derive(Debug)]
pub struct Status {
    #[bit(6, r)]
    iram0_load_store: bool,
    #[bit(5, r)]
    pwait_mode: bool,
    #[bit(4, r)]
    debug_mode: bool,
    #[bit(3, r)]
    xocd_mode: bool,
    #[bit(2, r)]
    double_exception_error: bool,
    #[bit(1, r)]
    pfault_error: bool,
    #[bit(0, r)]
    pfault_info_valid: bool,
}

#[bitbybit::bitfield(u32)]
#[derive(Debug)]
pub struct Version {
    #[bits(16..=20, r)]
    large_version: u5,
    #[bits(0..=4, r)]
    small_version: u5,
}

/// DSP configuration registers.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct DspConfig {
    /// Alternate reset vector, used if [ControlReg0::start_vec_sel] is set.
    alt_reset_vec: u32,
    ctrl_reg0: ControlReg0,
    _gap0: u32,
    #[mmio(PureRead)]
    prid: Prid,
    #[mmio(PureRead)]
    stat: Status,
    bist_ctrl: u32,
    _gap1: u32,
    jtrst: u32,
    #[mmio(PureRead)]
    version: Version,
}

static_assertions::const_assert_eq!(core::mem::size_of::<DspConfig>(), 0x24);

pub const ALT_RESET_VEC_ADDR: usize =
    DSP0_CFG_BASE_ADDR + core::mem::offset_of!(DspConfig, alt_reset_vec);
pub const CTRL_REG0_ADDR: usize = DSP0_CFG_BASE_ADDR + core::mem::offset_of!(DspConfig, ctrl_reg0);
pub const PRID_ADDR: usize = DSP0_CFG_BASE_ADDR + core::mem::offset_of!(DspConfig, prid);
pub const STAT_ADDR: usize = DSP0_CFG_BASE_ADDR + core::mem::offset_of!(DspConfig, stat);
pub const VERSION_ADDR: usize = DSP0_CFG_BASE_ADDR + core::mem::offset_of!(DspConfig, version);

impl DspConfig {
    /// Create a new handle to the DSP0 configuration block.
    ///
    /// The block is only accessible once the DSP configuration bus gate has been opened.
    ///
    /// # Safety
    ///
    /// If you create multiple instances of this handle at the same time, you are responsible for
    /// ensuring that there are no read-modify-write races on any of the registers.
    pub unsafe fn new_mmio_fixed() -> MmioDspConfig<'static> {
        unsafe { Self::new_mmio_at(DSP0_CFG_BASE_ADDR) }
    }
}

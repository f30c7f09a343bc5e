//! # Register definitions for sunxi co-processor control blocks
//!
//! This crate only covers the registers which are required to bring up the secondary cores of
//! the sunxi SoC family from the primary CPU:
//!
//! - the CCU clock, gating and reset registers of the DSP and RISC-V cores,
//! - the DSP configuration block (boot vector, run-stall, clock enable),
//! - the RISC-V configuration block (start address),
//! - the SRAM controller which decides whether the DSP local SRAM is visible to the CPU,
//! - the DSP PRCM block on the sun55iw3 family.
//!
//! Register layouts are modelled with [bitbybit] bitfields. Contiguous register blocks are
//! additionally modelled with [derive_mmio], and the absolute register addresses exported by the
//! chip modules are derived from those blocks.
#![no_std]

pub mod sun55iw3;
pub mod sun8iw20;
pub mod sun8iw21;

/// The D1/D1s family uses the same HiFi4 DSP register map as the T113 family. Its C906 is the
/// primary CPU, the RISC-V boot registers do not apply there.
pub use sun8iw20 as sun20iw1;

/// Frequency of the 24 MHz high-speed oscillator which all sunxi PLLs use as reference.
pub const HOSC_FREQ_HZ: u32 = 24_000_000;

/// Key pattern which must be written alongside the keyed RISC-V clock and reset fields.
///
/// Writes without this key are silently dropped by the hardware, and the key field itself always
/// reads back as zero.
pub const RISCV_REG_KEY: u16 = 0x16AA;

//! # Co-processor boot support for Allwinner sunxi SoCs
//!
//! This crate starts the HiFi4 DSP and the RISC-V co-processors of several Allwinner SoC
//! families from the primary CPU. It builds on top of the [register definitions](sunxi_rproc_pac)
//! and the [ELF image support](sunxi_elf_image) crates.
//!
//! A boot consists of loading the image segments with [BootSession::boot] and then driving the
//! clock, reset and boot vector registers of the target in a fixed order with the
//! [CoreBootSequencer]. The register layout of each supported core is described declaratively
//! by a [CoreTarget], see the [presets] module.
#![no_std]

pub use sunxi_elf_image as image;

pub mod bus;
pub mod clocks;
pub mod memory;
pub mod presets;
pub mod sequencer;
pub mod session;
pub mod target;
pub mod time;

pub use bus::{MmioBus, RegisterBus};
pub use clocks::{CoreClocks, probe_clocks};
pub use memory::PhysicalMemory;
pub use sequencer::{BootState, CoreBootSequencer, SequenceError, SequencerConfig};
pub use session::{BootError, BootOutcome, BootReport, BootSession, SessionConfig};
pub use target::{CoreKind, CoreTarget, EntryView};

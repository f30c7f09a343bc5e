//! # Boot session
//!
//! Ties the image parser, the segment loader and the [CoreBootSequencer] together. A session
//! runs once per boot attempt, synchronously on the primary CPU. Nothing is retried
//! internally, and the target core is only released from reset after every segment was copied
//! completely.
use sunxi_elf_image::{
    ImageFormatError, LoadError, LoadSummary, Machine, MemorySink, RemapTable, SinkError,
    entry_address, load, log_header, parse,
};

use crate::bus::RegisterBus;
use crate::clocks::probe_clocks;
use crate::sequencer::{CoreBootSequencer, SequenceError, SequencerConfig};
use crate::target::{CoreTarget, EntryView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Read back and verify every register write of the boot sequence.
    pub verify_writes: bool,
    /// Put the target into reset before its memory is written. This also gives shared SRAM back
    /// to the primary CPU.
    pub reset_before_load: bool,
    /// Reject images which are not built for the machine of the target.
    pub check_machine: bool,
}

impl SessionConfig {
    pub const fn new() -> Self {
        Self {
            verify_writes: true,
            reset_before_load: true,
            check_machine: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BootError {
    #[error("image buffer is empty")]
    EmptyImage,
    #[error("unsupported ELF class {0}")]
    UnsupportedClass(u8),
    #[error("malformed image: {0}")]
    ImageFormat(ImageFormatError),
    #[error("image machine {found:#06x} does not match the {expected:?} target {target}")]
    MachineMismatch {
        target: &'static str,
        expected: Machine,
        found: u16,
    },
    #[error("loading segments failed: {0}")]
    Sink(#[from] SinkError),
    #[error("boot sequence failed: {0}")]
    HardwareSequence(#[from] SequenceError),
}

impl From<ImageFormatError> for BootError {
    fn from(error: ImageFormatError) -> Self {
        match error {
            ImageFormatError::EmptyImage => BootError::EmptyImage,
            ImageFormatError::UnsupportedClass(class) => BootError::UnsupportedClass(class),
            other => BootError::ImageFormat(other),
        }
    }
}

impl From<LoadError> for BootError {
    fn from(error: LoadError) -> Self {
        match error {
            LoadError::Format(e) => e.into(),
            LoadError::Sink(e) => e.into(),
        }
    }
}

/// Result of a successful boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootReport {
    pub target: &'static str,
    /// Address the target core starts executing from, in the view of its vector register.
    pub entry: u64,
    /// Entry point declared in the image.
    pub declared_entry: u64,
    pub summary: LoadSummary,
}

pub type BootOutcome = Result<BootReport, BootError>;

pub struct BootSession<B: RegisterBus, S: MemorySink> {
    bus: B,
    sink: S,
    config: SessionConfig,
}

impl<B: RegisterBus, S: MemorySink> BootSession<B, S> {
    pub fn new(bus: B, sink: S) -> Self {
        Self::new_with_config(bus, sink, SessionConfig::default())
    }

    pub fn new_with_config(bus: B, sink: S, config: SessionConfig) -> Self {
        Self { bus, sink, config }
    }

    #[inline]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[inline]
    pub fn bus(&mut self) -> &mut B {
        &mut self.bus
    }

    #[inline]
    pub fn sink(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_parts(self) -> (B, S) {
        (self.bus, self.sink)
    }

    fn sequencer_config(&self) -> SequencerConfig {
        SequencerConfig {
            verify_writes: self.config.verify_writes,
        }
    }

    /// Load `image` through `table` and start `target` at the entry point of the image.
    pub fn boot(
        &mut self,
        image: &[u8],
        table: &RemapTable<'_>,
        target: &CoreTarget,
    ) -> BootOutcome {
        let outcome = self.try_boot(image, table, target);
        match &outcome {
            Ok(report) => log::info!(
                "{}: running from {:#x}, {} segments loaded",
                report.target,
                report.entry,
                report.summary.segments_loaded
            ),
            Err(e) => log::error!("{}: boot failed: {}", target.name, e),
        }
        outcome
    }

    fn try_boot(
        &mut self,
        image: &[u8],
        table: &RemapTable<'_>,
        target: &CoreTarget,
    ) -> BootOutcome {
        let header = parse(image)?;
        log_header(&header);
        if self.config.check_machine
            && let Some(expected) = target.machine
            && header.machine_raw() != expected as u16
        {
            return Err(BootError::MachineMismatch {
                target: target.name,
                expected,
                found: header.machine_raw(),
            });
        }

        let config = self.sequencer_config();
        let mut sequencer = CoreBootSequencer::new_with_config(&mut self.bus, target, config);
        if self.config.reset_before_load {
            sequencer.reset()?;
        }
        let summary = load(image, &header, table, &mut self.sink)?;

        let declared_entry = entry_address(&header);
        let entry = match target.entry_view {
            EntryView::Target => declared_entry,
            EntryView::Physical => table.translate(declared_entry),
        };
        sequencer.run(entry)?;

        if target.clock_probe.is_some() {
            probe_clocks(&mut self.bus, target);
        }
        Ok(BootReport {
            target: target.name,
            entry,
            declared_entry,
            summary,
        })
    }

    /// Put `target` back into reset, for example after a failed boot.
    pub fn reset(&mut self, target: &CoreTarget) -> Result<(), SequenceError> {
        let config = self.sequencer_config();
        CoreBootSequencer::new_with_config(&mut self.bus, target, config).reset()
    }
}

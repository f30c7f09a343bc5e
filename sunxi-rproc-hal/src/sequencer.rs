//! # Co-processor boot sequencer
//!
//! Drives the clock, boot vector, run-stall and reset registers of a [CoreTarget] in the fixed
//! order
//!
//! `Idle -> ClockPrepared -> VectorProgrammed -> StallAsserted -> ClockEnabled -> Running`
//!
//! Steps a target has no capability for are skipped, but the state still advances. The target
//! core starts fetching instructions as soon as the sequencer reaches [BootState::Running]. From
//! that point on it runs independently of the primary CPU.
use crate::bus::RegisterBus;
use crate::target::{CoreTarget, RegField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    Idle,
    /// Configuration clock gates are open and the control block is writable.
    ClockPrepared,
    /// Boot vector programmed, or left at its default.
    VectorProgrammed,
    /// Run-stall asserted on stall-capable targets.
    StallAsserted,
    /// Execution clock enabled.
    ClockEnabled,
    /// Reset released, stall cleared. The core is executing.
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// A verified register write did not read back as written. The sequencer stays in `state`,
    /// the last completed state.
    #[error(
        "register {addr:#010x} reads back {found:#010x} instead of {expected:#010x} after {state:?}"
    )]
    ReadbackMismatch {
        state: BootState,
        addr: usize,
        expected: u32,
        found: u32,
    },
    #[error("boot vector {vector:#x} does not fit the vector register")]
    VectorOutOfRange { vector: u64 },
    #[error("boot sequence can only be started in idle state, current state is {0:?}")]
    NotIdle(BootState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerConfig {
    /// Read back every register write and compare the written bits.
    pub verify_writes: bool,
}

impl SequencerConfig {
    pub const fn new() -> Self {
        Self {
            verify_writes: true,
        }
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CoreBootSequencer<'t, B: RegisterBus> {
    bus: B,
    target: &'t CoreTarget,
    config: SequencerConfig,
    state: BootState,
}

impl<'t, B: RegisterBus> CoreBootSequencer<'t, B> {
    /// Create a sequencer with the default [SequencerConfig].
    ///
    /// The sequencer assumes the target is in reset. Call [Self::reset] first if that is not
    /// guaranteed.
    pub fn new(bus: B, target: &'t CoreTarget) -> Self {
        Self::new_with_config(bus, target, SequencerConfig::default())
    }

    pub fn new_with_config(bus: B, target: &'t CoreTarget, config: SequencerConfig) -> Self {
        Self {
            bus,
            target,
            config,
            state: BootState::Idle,
        }
    }

    #[inline]
    pub const fn state(&self) -> BootState {
        self.state
    }

    #[inline]
    pub const fn target(&self) -> &'t CoreTarget {
        self.target
    }

    #[inline]
    pub fn bus(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Run the boot sequence so the target starts executing at `entry`.
    ///
    /// `entry` must already be in the address view the target expects. The sequencer does not
    /// retry. On failure, the hardware and [Self::state] are left in the last completed state.
    pub fn run(&mut self, entry: u64) -> Result<(), SequenceError> {
        if self.state != BootState::Idle {
            return Err(SequenceError::NotIdle(self.state));
        }
        let target = self.target;
        let program_vector = entry != target.boot_vector.default;
        if program_vector && !target.boot_vector.fits(entry) {
            return Err(SequenceError::VectorOutOfRange { vector: entry });
        }

        for field in target.config_gate {
            self.apply(field)?;
        }
        self.advance(BootState::ClockPrepared);

        if program_vector {
            self.write_verified(target.boot_vector.low, entry as u32)?;
            if let Some(high) = target.boot_vector.high {
                self.write_verified(high, (entry >> 32) as u32)?;
            }
            if let Some(select) = &target.boot_vector.select {
                self.apply(select)?;
            }
            log::debug!("{}: boot vector set to {:#x}", target.name, entry);
        } else {
            log::debug!("{}: using default boot vector {:#x}", target.name, entry);
        }
        self.advance(BootState::VectorProgrammed);

        if let Some(stall) = &target.run_stall {
            self.apply(&stall.assert())?;
        }
        self.advance(BootState::StallAsserted);

        if let Some(source) = &target.clock_source {
            self.apply(source)?;
        }
        for field in target.exec_clock {
            self.apply(field)?;
        }
        self.advance(BootState::ClockEnabled);

        // Segment writes must be visible before the core can fetch them.
        self.bus.barrier();
        for field in target.reset_release {
            self.apply(field)?;
        }
        if let Some(to_target) = target.sram.as_ref().and_then(|sram| sram.to_target.as_ref()) {
            self.apply(to_target)?;
        }
        if let Some(stall) = &target.run_stall {
            self.apply(&stall.release())?;
        }
        self.advance(BootState::Running);
        Ok(())
    }

    /// Re-assert reset, stop the execution clock, close the configuration gates and give shared
    /// SRAM back to the primary CPU.
    ///
    /// This can be called in any state, also to abort a failed boot attempt. The sequencer is
    /// back in [BootState::Idle] on success.
    pub fn reset(&mut self) -> Result<(), SequenceError> {
        let target = self.target;
        for field in target.reset_sequence {
            self.apply(field)?;
        }
        if let Some(sram) = &target.sram {
            self.apply(&sram.to_cpu)?;
        }
        self.state = BootState::Idle;
        log::info!("{}: held in reset", target.name);
        Ok(())
    }

    fn advance(&mut self, state: BootState) {
        log::info!("{}: {:?} -> {:?}", self.target.name, self.state, state);
        self.state = state;
    }

    fn apply(&mut self, field: &RegField) -> Result<(), SequenceError> {
        let value = if field.is_full_write() {
            field.value
        } else {
            field.apply(self.bus.read32(field.addr))
        };
        self.bus.write32(field.addr, value);
        self.verify(field.addr, field.value, field.verify_mask)
    }

    fn write_verified(&mut self, addr: usize, value: u32) -> Result<(), SequenceError> {
        self.bus.write32(addr, value);
        self.verify(addr, value, u32::MAX)
    }

    fn verify(&mut self, addr: usize, expected: u32, mask: u32) -> Result<(), SequenceError> {
        if !self.config.verify_writes || mask == 0 {
            return Ok(());
        }
        let found = self.bus.read32(addr);
        if found & mask != expected & mask {
            log::error!(
                "{}: register {:#010x} readback mismatch in state {:?}",
                self.target.name,
                addr,
                self.state
            );
            return Err(SequenceError::ReadbackMismatch {
                state: self.state,
                addr,
                expected: expected & mask,
                found: found & mask,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec;
    use std::vec::Vec;

    use super::*;
    use crate::bus::recording::{Access, RecordingBus};
    use crate::target::{BootVector, CoreKind, EntryView, RunStall, SramSharing};

    const GATE: usize = 0x1000;
    const VECTOR: usize = 0x2000;
    const VECTOR_HIGH: usize = 0x2004;
    const CTRL: usize = 0x2008;
    const CLK: usize = 0x3000;
    const RST: usize = 0x4000;
    const SRAM: usize = 0x5000;

    const STALL: u32 = 1 << 0;
    const SELECT: u32 = 1 << 1;

    static GATE_OPS: [RegField; 1] = [RegField::set(GATE, 1 << 0)];
    static CLK_OPS: [RegField; 1] = [RegField::set(CLK, 1 << 31)];
    static RST_OPS: [RegField; 1] = [RegField::set(RST, 1 << 16)];
    static RESET_OPS: [RegField; 3] = [
        RegField::clear(RST, 1 << 16),
        RegField::clear(CLK, 1 << 31),
        RegField::clear(GATE, 1 << 0),
    ];

    const STALL_TARGET: CoreTarget = CoreTarget {
        name: "test-dsp",
        kind: CoreKind::Dsp,
        config_gate: &GATE_OPS,
        boot_vector: BootVector {
            default: 0x0010_0000,
            low: VECTOR,
            high: None,
            select: Some(RegField::set(CTRL, SELECT)),
        },
        run_stall: Some(RunStall {
            addr: CTRL,
            mask: STALL,
        }),
        clock_source: None,
        exec_clock: &CLK_OPS,
        reset_release: &RST_OPS,
        reset_sequence: &RESET_OPS,
        sram: None,
        entry_view: EntryView::Physical,
        machine: None,
        clock_probe: None,
    };

    const PLAIN_TARGET: CoreTarget = CoreTarget {
        name: "test-riscv",
        kind: CoreKind::RiscV,
        boot_vector: BootVector {
            default: 0,
            low: VECTOR,
            high: Some(VECTOR_HIGH),
            select: None,
        },
        run_stall: None,
        ..STALL_TARGET
    };

    /// Label writes by the boot step they belong to and merge consecutive duplicates.
    fn steps(log: &[Access]) -> Vec<&'static str> {
        let mut labels: Vec<&'static str> = Vec::new();
        for access in log {
            let label = match *access {
                Access::Barrier => "barrier",
                Access::Write { addr: GATE, .. } => "clock-gate",
                Access::Write { addr: VECTOR, .. } | Access::Write { addr: VECTOR_HIGH, .. } => {
                    "vector"
                }
                Access::Write {
                    addr: CTRL,
                    before,
                    value,
                } => {
                    let changed = before ^ value;
                    if changed & SELECT != 0 {
                        "vector"
                    } else if value & STALL != 0 {
                        "stall"
                    } else {
                        "stall-clear"
                    }
                }
                Access::Write { addr: CLK, .. } => "clock-enable",
                Access::Write { addr: RST, .. } => "reset-release",
                Access::Write { addr: SRAM, .. } => "sram",
                Access::Write { .. } => "unknown",
            };
            if labels.last() != Some(&label) {
                labels.push(label);
            }
        }
        labels
    }

    #[test]
    fn stall_capable_order() {
        let mut bus = RecordingBus::new();
        let mut seq = CoreBootSequencer::new(&mut bus, &STALL_TARGET);
        seq.run(0x3000_0000).unwrap();
        assert_eq!(seq.state(), BootState::Running);
        assert_eq!(
            steps(&bus.log),
            [
                "clock-gate",
                "vector",
                "stall",
                "clock-enable",
                "barrier",
                "reset-release",
                "stall-clear"
            ]
        );
        assert_eq!(bus.value(VECTOR), 0x3000_0000);
        assert_eq!(bus.value(CTRL), SELECT);
        assert_eq!(bus.value(RST), 1 << 16);
        // Stall clear is the very last write.
        assert_eq!(bus.writes().last(), Some(&(CTRL, SELECT)));
    }

    #[test]
    fn default_vector_is_not_programmed() {
        let mut bus = RecordingBus::new();
        let mut seq = CoreBootSequencer::new(&mut bus, &STALL_TARGET);
        seq.run(0x0010_0000).unwrap();
        assert_eq!(
            steps(&bus.log),
            [
                "clock-gate",
                "stall",
                "clock-enable",
                "barrier",
                "reset-release",
                "stall-clear"
            ]
        );
        assert_eq!(bus.value(CTRL) & SELECT, 0);
    }

    #[test]
    fn non_stall_order() {
        let mut bus = RecordingBus::new();
        let mut seq = CoreBootSequencer::new(&mut bus, &PLAIN_TARGET);
        seq.run(0).unwrap();
        assert_eq!(seq.state(), BootState::Running);
        assert_eq!(
            steps(&bus.log),
            ["clock-gate", "clock-enable", "barrier", "reset-release"]
        );
        assert_eq!(bus.writes().last().map(|w| w.0), Some(RST));
    }

    #[test]
    fn wide_vector_uses_high_register() {
        let mut bus = RecordingBus::new();
        let mut seq = CoreBootSequencer::new(&mut bus, &PLAIN_TARGET);
        seq.run(0x1_4000_0000).unwrap();
        assert_eq!(bus.value(VECTOR), 0x4000_0000);
        assert_eq!(bus.value(VECTOR_HIGH), 0x1);
        assert_eq!(
            steps(&bus.log),
            [
                "clock-gate",
                "vector",
                "clock-enable",
                "barrier",
                "reset-release"
            ]
        );
    }

    #[test]
    fn vector_out_of_range_writes_nothing() {
        let mut bus = RecordingBus::new();
        let mut seq = CoreBootSequencer::new(&mut bus, &STALL_TARGET);
        assert_eq!(
            seq.run(0x1_0000_0000),
            Err(SequenceError::VectorOutOfRange {
                vector: 0x1_0000_0000
            })
        );
        assert_eq!(seq.state(), BootState::Idle);
        assert!(bus.log.is_empty());
    }

    #[test]
    fn readback_mismatch_keeps_last_state() {
        let mut bus = RecordingBus::new();
        // Dead execution clock.
        bus.stuck_at_zero(CLK, 1 << 31);
        let mut seq = CoreBootSequencer::new(&mut bus, &STALL_TARGET);
        assert_eq!(
            seq.run(0x3000_0000),
            Err(SequenceError::ReadbackMismatch {
                state: BootState::StallAsserted,
                addr: CLK,
                expected: 1 << 31,
                found: 0
            })
        );
        assert_eq!(seq.state(), BootState::StallAsserted);
        // Reset was never released.
        assert_eq!(bus.value(RST), 0);
        assert_eq!(bus.value(CTRL) & STALL, STALL);
    }

    #[test]
    fn unverified_writes_ignore_mismatch() {
        let mut bus = RecordingBus::new();
        bus.stuck_at_zero(CLK, 1 << 31);
        let mut seq = CoreBootSequencer::new_with_config(
            &mut bus,
            &STALL_TARGET,
            SequencerConfig {
                verify_writes: false,
            },
        );
        seq.run(0x3000_0000).unwrap();
        assert_eq!(seq.state(), BootState::Running);
    }

    #[test]
    fn run_twice_is_rejected() {
        let mut bus = RecordingBus::new();
        let mut seq = CoreBootSequencer::new(&mut bus, &PLAIN_TARGET);
        seq.run(0).unwrap();
        assert_eq!(seq.run(0), Err(SequenceError::NotIdle(BootState::Running)));
        seq.reset().unwrap();
        assert_eq!(seq.state(), BootState::Idle);
        seq.run(0).unwrap();
    }

    #[test]
    fn reset_reverses_boot() {
        static TO_CPU: RegField = RegField::set(SRAM, 1);
        let target = CoreTarget {
            sram: Some(SramSharing {
                to_cpu: TO_CPU,
                to_target: Some(RegField::clear(SRAM, 1)),
            }),
            ..STALL_TARGET
        };
        let mut bus = RecordingBus::new();
        let mut seq = CoreBootSequencer::new(&mut bus, &target);
        seq.run(0x3000_0000).unwrap();
        let boot = steps(&seq.bus().log);
        assert_eq!(
            boot[boot.len() - 3..],
            ["reset-release", "sram", "stall-clear"]
        );
        seq.bus().clear_log();
        seq.reset().unwrap();
        assert_eq!(
            steps(&bus.log),
            ["reset-release", "clock-enable", "clock-gate", "sram"]
        );
        assert_eq!(bus.value(RST), 0);
        assert_eq!(bus.value(CLK), 0);
        assert_eq!(bus.value(GATE), 0);
        assert_eq!(bus.value(SRAM), 1);
    }

    #[test]
    fn reset_from_partial_boot() {
        let mut bus = RecordingBus::new();
        bus.stuck_at_zero(RST, 1 << 16);
        let mut seq = CoreBootSequencer::new(&mut bus, &STALL_TARGET);
        assert!(seq.run(0x3000_0000).is_err());
        assert_eq!(seq.state(), BootState::ClockEnabled);
        seq.reset().unwrap();
        assert_eq!(seq.state(), BootState::Idle);
        let writes = bus.writes();
        assert_eq!(
            writes[writes.len() - 3..],
            vec![(RST, 0), (CLK, 0), (GATE, 0)]
        );
    }
}

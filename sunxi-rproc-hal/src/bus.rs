//! # Register bus
//!
//! The co-processor boot code never accesses registers directly. All accesses go through a
//! [RegisterBus], which is [MmioBus] on the target and a recording fake in unit tests.
use vcell::VolatileCell;

/// Memory-mapped register access capability.
pub trait RegisterBus {
    fn read8(&mut self, addr: usize) -> u8;
    fn read16(&mut self, addr: usize) -> u16;
    fn read32(&mut self, addr: usize) -> u32;

    fn write8(&mut self, addr: usize, value: u8);
    fn write16(&mut self, addr: usize, value: u16);
    fn write32(&mut self, addr: usize, value: u32);

    /// Ensure all previous memory writes are visible to other bus masters before any following
    /// write.
    #[inline]
    fn barrier(&mut self) {
        store_barrier();
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    #[inline]
    fn read8(&mut self, addr: usize) -> u8 {
        (**self).read8(addr)
    }

    #[inline]
    fn read16(&mut self, addr: usize) -> u16 {
        (**self).read16(addr)
    }

    #[inline]
    fn read32(&mut self, addr: usize) -> u32 {
        (**self).read32(addr)
    }

    #[inline]
    fn write8(&mut self, addr: usize, value: u8) {
        (**self).write8(addr, value)
    }

    #[inline]
    fn write16(&mut self, addr: usize, value: u16) {
        (**self).write16(addr, value)
    }

    #[inline]
    fn write32(&mut self, addr: usize, value: u32) {
        (**self).write32(addr, value)
    }

    #[inline]
    fn barrier(&mut self) {
        (**self).barrier()
    }
}

/// Store-ordering barrier for the primary CPU.
///
/// Orders all previous stores to normal memory before any following device register store.
#[inline]
pub fn store_barrier() {
    #[cfg(target_arch = "arm")]
    cortex_ar::asm::dsb();
    #[cfg(target_arch = "aarch64")]
    // Safety: A synchronisation barrier is always safe.
    unsafe {
        core::arch::asm!("dsb sy", options(nostack, preserves_flags));
    }
    #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
    // Safety: A fence is always safe.
    unsafe {
        core::arch::asm!("fence iorw, iorw", options(nostack, preserves_flags));
    }
    // Host builds only.
    #[cfg(not(any(
        target_arch = "arm",
        target_arch = "aarch64",
        target_arch = "riscv32",
        target_arch = "riscv64"
    )))]
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}

/// Volatile accesses to the physical address space.
#[derive(Debug)]
pub struct MmioBus {
    _private: (),
}

impl MmioBus {
    /// Create a new bus handle.
    ///
    /// # Safety
    ///
    /// All addresses passed to the bus must be valid, properly aligned register addresses which
    /// are identity mapped for the primary CPU. You are also responsible for ensuring that no
    /// other code performs read-modify-write sequences on the same registers concurrently.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    #[inline]
    unsafe fn cell<T>(addr: usize) -> &'static VolatileCell<T> {
        unsafe { &*(addr as *const VolatileCell<T>) }
    }
}

impl RegisterBus for MmioBus {
    #[inline]
    fn read8(&mut self, addr: usize) -> u8 {
        // Safety: Address validity is guaranteed by the bus constructor contract.
        unsafe { Self::cell::<u8>(addr) }.get()
    }

    #[inline]
    fn read16(&mut self, addr: usize) -> u16 {
        unsafe { Self::cell::<u16>(addr) }.get()
    }

    #[inline]
    fn read32(&mut self, addr: usize) -> u32 {
        unsafe { Self::cell::<u32>(addr) }.get()
    }

    #[inline]
    fn write8(&mut self, addr: usize, value: u8) {
        unsafe { Self::cell::<u8>(addr) }.set(value)
    }

    #[inline]
    fn write16(&mut self, addr: usize, value: u16) {
        unsafe { Self::cell::<u16>(addr) }.set(value)
    }

    #[inline]
    fn write32(&mut self, addr: usize, value: u32) {
        unsafe { Self::cell::<u32>(addr) }.set(value)
    }
}

#[cfg(test)]
pub(crate) mod recording {
    extern crate std;

    use std::collections::HashMap;
    use std::vec::Vec;

    use super::RegisterBus;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Access {
        /// Address, value before the write and written value.
        Write { addr: usize, before: u32, value: u32 },
        Barrier,
    }

    /// 32 bit register file which records every write.
    #[derive(Debug, Default)]
    pub struct RecordingBus {
        regs: HashMap<usize, u32>,
        /// Bits which always read back as zero, like keys of keyed registers.
        read_as_zero: HashMap<usize, u32>,
        /// Bits which can not be set, to simulate a dead clock domain.
        stuck_at_zero: HashMap<usize, u32>,
        pub log: Vec<Access>,
    }

    impl RecordingBus {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn preset(&mut self, addr: usize, value: u32) {
            self.regs.insert(addr, value);
        }

        pub fn read_as_zero(&mut self, addr: usize, mask: u32) {
            *self.read_as_zero.entry(addr).or_default() |= mask;
        }

        pub fn stuck_at_zero(&mut self, addr: usize, mask: u32) {
            *self.stuck_at_zero.entry(addr).or_default() |= mask;
        }

        pub fn value(&self, addr: usize) -> u32 {
            self.regs.get(&addr).copied().unwrap_or(0)
        }

        pub fn writes(&self) -> Vec<(usize, u32)> {
            self.log
                .iter()
                .filter_map(|access| match access {
                    Access::Write { addr, value, .. } => Some((*addr, *value)),
                    Access::Barrier => None,
                })
                .collect()
        }

        pub fn clear_log(&mut self) {
            self.log.clear();
        }
    }

    impl RegisterBus for RecordingBus {
        fn read8(&mut self, addr: usize) -> u8 {
            (self.read32(addr & !0b11) >> ((addr & 0b11) * 8)) as u8
        }

        fn read16(&mut self, addr: usize) -> u16 {
            (self.read32(addr & !0b11) >> ((addr & 0b10) * 8)) as u16
        }

        fn read32(&mut self, addr: usize) -> u32 {
            let hidden = self.read_as_zero.get(&addr).copied().unwrap_or(0);
            self.value(addr) & !hidden
        }

        fn write8(&mut self, addr: usize, value: u8) {
            let shift = (addr & 0b11) * 8;
            let word = addr & !0b11;
            let merged = (self.value(word) & !(0xFF << shift)) | (u32::from(value) << shift);
            self.write32(word, merged);
        }

        fn write16(&mut self, addr: usize, value: u16) {
            let shift = (addr & 0b10) * 8;
            let word = addr & !0b11;
            let merged = (self.value(word) & !(0xFFFF << shift)) | (u32::from(value) << shift);
            self.write32(word, merged);
        }

        fn write32(&mut self, addr: usize, value: u32) {
            let before = self.value(addr);
            let stuck = self.stuck_at_zero.get(&addr).copied().unwrap_or(0);
            self.regs.insert(addr, value & !stuck);
            self.log.push(Access::Write {
                addr,
                before,
                value,
            });
        }

        fn barrier(&mut self) {
            self.log.push(Access::Barrier);
        }
    }
}

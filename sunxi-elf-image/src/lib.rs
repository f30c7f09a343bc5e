//! # ELF image support for sunxi co-processor bring-up
//!
//! This crate parses statically linked ELF32 and ELF64 executables built for a secondary core
//! of the SoC, translates their load addresses from the view of that core into addresses the
//! primary CPU can write to, and copies the loadable segments through a [MemorySink].
//!
//! All accesses into the image buffer are bounds-checked. Malformed images are reported with
//! an [ImageFormatError] and never cause a panic or a partial load.
#![no_std]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod header;
mod le;
pub mod loader;
pub mod remap;
pub mod section;
pub mod segment;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use header::{
    ElfClass, FileType, HeaderTable, ImageFormatError, ImageHeader, Machine, entry_address,
    log_header, parse,
};
pub use loader::{
    LoadError, LoadOp, LoadPlan, LoadSummary, MemorySink, SinkError, WindowSink, load, plan,
};
pub use remap::{AddressRange, RemapTable, translate};
pub use section::{Section, Sections, find_section, sections};
pub use segment::{PT_LOAD, ProgramSegment, SegmentFlags, SegmentType, Segments, segments};

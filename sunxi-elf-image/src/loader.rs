//! # Segment loader
//!
//! Copies the loadable segments of an image to their remapped destinations. The whole program
//! header table is validated before the first byte is written to the [MemorySink].
use crate::header::{ImageFormatError, ImageHeader, entry_address};
use crate::remap::RemapTable;
use crate::segment::{Segments, segments};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("memory sink rejected {len} bytes at {addr:#x}")]
pub struct SinkError {
    pub addr: u64,
    pub len: u64,
}

/// Write capability for the memory the segments are loaded into.
pub trait MemorySink {
    /// Write `data` starting at `addr`.
    fn write(&mut self, addr: u64, data: &[u8]) -> Result<(), SinkError>;

    /// Write `len` bytes of `value` starting at `addr`.
    fn fill(&mut self, addr: u64, len: u64, value: u8) -> Result<(), SinkError>;

    /// Whether a write of `len` bytes at `addr` would succeed. Used to reject a load before
    /// anything is written.
    fn accepts(&self, _addr: u64, _len: u64) -> bool {
        true
    }
}

impl<S: MemorySink + ?Sized> MemorySink for &mut S {
    #[inline]
    fn write(&mut self, addr: u64, data: &[u8]) -> Result<(), SinkError> {
        (**self).write(addr, data)
    }

    #[inline]
    fn fill(&mut self, addr: u64, len: u64, value: u8) -> Result<(), SinkError> {
        (**self).fill(addr, len, value)
    }

    #[inline]
    fn accepts(&self, addr: u64, len: u64) -> bool {
        (**self).accepts(addr, len)
    }
}

/// Sink over a caller provided buffer which is visible at `base`.
pub struct WindowSink<'a> {
    base: u64,
    memory: &'a mut [u8],
}

impl<'a> WindowSink<'a> {
    pub fn new(base: u64, memory: &'a mut [u8]) -> Self {
        Self { base, memory }
    }

    #[inline]
    pub const fn base(&self) -> u64 {
        self.base
    }

    #[inline]
    pub fn memory(&self) -> &[u8] {
        &self.memory[..]
    }

    fn range(&self, addr: u64, len: u64) -> Option<core::ops::Range<usize>> {
        let start = usize::try_from(addr.checked_sub(self.base)?).ok()?;
        let end = start.checked_add(usize::try_from(len).ok()?)?;
        if end > self.memory.len() {
            return None;
        }
        Some(start..end)
    }
}

impl MemorySink for WindowSink<'_> {
    fn write(&mut self, addr: u64, data: &[u8]) -> Result<(), SinkError> {
        let len = data.len() as u64;
        let range = self.range(addr, len).ok_or(SinkError { addr, len })?;
        self.memory[range].copy_from_slice(data);
        Ok(())
    }

    fn fill(&mut self, addr: u64, len: u64, value: u8) -> Result<(), SinkError> {
        let range = self.range(addr, len).ok_or(SinkError { addr, len })?;
        self.memory[range].fill(value);
        Ok(())
    }

    fn accepts(&self, addr: u64, len: u64) -> bool {
        self.range(addr, len).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("image format error: {0}")]
    Format(#[from] ImageFormatError),
    #[error("memory sink error: {0}")]
    Sink(#[from] SinkError),
}

/// One validated copy operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOp<'a> {
    pub segment_index: usize,
    /// Physical address from the program header, before remapping.
    pub declared_addr: u64,
    pub destination: u64,
    pub file_offset: u64,
    /// File contents of the segment.
    pub data: &'a [u8],
    /// Number of zero bytes following the file contents.
    pub zero_fill: u64,
}

impl LoadOp<'_> {
    #[inline]
    pub const fn file_size(&self) -> u64 {
        self.data.len() as u64
    }

    #[inline]
    pub const fn mem_size(&self) -> u64 {
        self.file_size() + self.zero_fill
    }
}

/// Iterator over the copy operations of an image, in program header order.
pub struct LoadPlan<'a, 't> {
    data: &'a [u8],
    segments: Segments<'a>,
    table: &'t RemapTable<'t>,
}

impl<'a> Iterator for LoadPlan<'a, '_> {
    type Item = LoadOp<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for segment in self.segments.by_ref() {
            if !segment.should_load() {
                continue;
            }
            // Validated by plan.
            let data = segment.data(self.data).ok()?;
            return Some(LoadOp {
                segment_index: segment.index,
                declared_addr: segment.phys_addr,
                destination: self.table.translate(segment.phys_addr),
                file_offset: segment.file_offset,
                data,
                zero_fill: segment.zero_fill_size(),
            });
        }
        None
    }
}

/// Validate all loadable segments and return the copy operations without writing any memory.
pub fn plan<'a, 't>(
    data: &'a [u8],
    header: &ImageHeader,
    table: &'t RemapTable<'t>,
) -> Result<LoadPlan<'a, 't>, ImageFormatError> {
    let mut count = 0;
    for segment in segments(data, header)? {
        count += 1;
        if segment.should_load() {
            segment.data(data)?;
        }
    }
    if count != usize::from(header.program_header_count()) {
        return Err(ImageFormatError::TableOutOfBounds(
            crate::HeaderTable::ProgramHeaders,
        ));
    }
    Ok(LoadPlan {
        data,
        segments: segments(data, header)?,
        table,
    })
}

/// Statistics of a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSummary {
    /// Declared entry point, not remapped.
    pub entry: u64,
    pub segments_loaded: usize,
    pub bytes_copied: u64,
    pub bytes_zeroed: u64,
}

/// Copy all loadable segments of the image to `sink`.
///
/// Returns the declared entry point together with copy statistics. Format errors and
/// destinations the sink does not accept are reported before anything is written.
pub fn load<S: MemorySink>(
    data: &[u8],
    header: &ImageHeader,
    table: &RemapTable<'_>,
    mut sink: S,
) -> Result<LoadSummary, LoadError> {
    for op in plan(data, header, table)? {
        if !sink.accepts(op.destination, op.mem_size()) {
            return Err(SinkError {
                addr: op.destination,
                len: op.mem_size(),
            }
            .into());
        }
    }

    let mut summary = LoadSummary {
        entry: entry_address(header),
        ..Default::default()
    };
    for op in plan(data, header, table)? {
        log::debug!(
            "loading segment {}: {:#x} -> {:#x}, {} bytes, {} zero bytes",
            op.segment_index,
            op.declared_addr,
            op.destination,
            op.file_size(),
            op.zero_fill
        );
        sink.write(op.destination, op.data)?;
        if op.zero_fill > 0 {
            sink.fill(op.destination.wrapping_add(op.file_size()), op.zero_fill, 0)?;
        }
        summary.segments_loaded += 1;
        summary.bytes_copied += op.file_size();
        summary.bytes_zeroed += op.zero_fill;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec;
    use std::vec::Vec;

    use super::*;
    use crate::header::{ElfClass, parse};
    use crate::remap::AddressRange;
    use crate::testing::ImageBuilder;

    const DSP_WINDOW: [AddressRange; 1] = [AddressRange::new(0x1000_0000, 0x1FFF_FFFF, 0x3000_0000)];

    fn pattern(len: usize, seed: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed)).collect()
    }

    #[test]
    fn load_with_remap() {
        let contents = pattern(64, 1);
        let image = ImageBuilder::new(ElfClass::Elf32)
            .entry(0x1000_0000)
            .segment(0x1000_0000, &contents, 128)
            .build();
        let header = parse(&image).unwrap();
        let mut memory = vec![0xFF; 256];
        let table = RemapTable::new(&DSP_WINDOW);
        let summary = load(
            &image,
            &header,
            &table,
            WindowSink::new(0x3000_0000, &mut memory),
        )
        .unwrap();
        assert_eq!(summary.entry, 0x1000_0000);
        assert_eq!(summary.segments_loaded, 1);
        assert_eq!(summary.bytes_copied, 64);
        assert_eq!(summary.bytes_zeroed, 64);
        assert_eq!(&memory[0..64], contents.as_slice());
        assert!(memory[64..128].iter().all(|&b| b == 0));
        // Past the end of the segment memory stays untouched.
        assert!(memory[128..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn load_multiple_segments_identity() {
        let first = pattern(32, 3);
        let second = pattern(16, 9);
        let third = pattern(8, 5);
        let image = ImageBuilder::new(ElfClass::Elf64)
            .segment(0x4000, &first, 32)
            .raw_segment(4, 0x4100, 0x4100, &[0xEE; 4], 4)
            .segment(0x4200, &second, 48)
            .segment(0x4300, &[], 0)
            .segment(0x4400, &third, 8)
            .build();
        let header = parse(&image).unwrap();
        let mut memory = vec![0xFF; 0x500];
        let summary = load(
            &image,
            &header,
            &RemapTable::identity(),
            WindowSink::new(0x4000, &mut memory),
        )
        .unwrap();
        assert_eq!(summary.segments_loaded, 3);
        assert_eq!(summary.bytes_copied, 56);
        assert_eq!(summary.bytes_zeroed, 32);
        assert_eq!(&memory[0..32], first.as_slice());
        // Note segment is not loaded.
        assert!(memory[0x100..0x104].iter().all(|&b| b == 0xFF));
        assert_eq!(&memory[0x200..0x210], second.as_slice());
        assert!(memory[0x210..0x230].iter().all(|&b| b == 0));
        assert!(memory[0x300..0x400].iter().all(|&b| b == 0xFF));
        assert_eq!(&memory[0x400..0x408], third.as_slice());
    }

    #[test]
    fn plan_lists_operations_in_header_order() {
        let image = ImageBuilder::new(ElfClass::Elf32)
            .segment(0x1000_0000, &[1; 8], 8)
            .segment(0x0002_0000, &[2; 4], 16)
            .build();
        let header = parse(&image).unwrap();
        let table = RemapTable::new(&DSP_WINDOW);
        let ops: Vec<_> = plan(&image, &header, &table).unwrap().collect();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].segment_index, 0);
        assert_eq!(ops[0].declared_addr, 0x1000_0000);
        assert_eq!(ops[0].destination, 0x3000_0000);
        assert_eq!(ops[0].zero_fill, 0);
        assert_eq!(ops[1].segment_index, 1);
        assert_eq!(ops[1].destination, 0x0002_0000);
        assert_eq!(ops[1].file_size(), 4);
        assert_eq!(ops[1].mem_size(), 16);
    }

    #[test]
    fn truncated_segment_writes_nothing() {
        let image = ImageBuilder::new(ElfClass::Elf32)
            .segment(0x1000, &[0xAA; 16], 16)
            .segment(0x2000, &[0xBB; 16], 16)
            .build();
        let header = parse(&image).unwrap();
        let truncated = &image[..image.len() - 1];
        let mut memory = vec![0; 0x2000];
        let result = load(
            truncated,
            &header,
            &RemapTable::identity(),
            WindowSink::new(0x1000, &mut memory),
        );
        assert_eq!(
            result,
            Err(LoadError::Format(ImageFormatError::SegmentOutOfBounds {
                index: 1
            }))
        );
        assert!(memory.iter().all(|&b| b == 0));
    }

    #[test]
    fn oversized_file_size_writes_nothing() {
        let image = ImageBuilder::new(ElfClass::Elf32)
            .segment(0x1000, &[0xAA; 4], 4)
            .segment(0x1010, &[0xBB; 16], 4)
            .build();
        let header = parse(&image).unwrap();
        let mut memory = vec![0; 0x100];
        let result = load(
            &image,
            &header,
            &RemapTable::identity(),
            WindowSink::new(0x1000, &mut memory),
        );
        assert!(matches!(
            result,
            Err(LoadError::Format(
                ImageFormatError::FileSizeExceedsMemorySize { index: 1, .. }
            ))
        ));
        assert!(memory.iter().all(|&b| b == 0));
    }

    #[test]
    fn destination_outside_sink_writes_nothing() {
        let image = ImageBuilder::new(ElfClass::Elf32)
            .segment(0x1000, &[0xAA; 4], 4)
            .segment(0x1000_0000, &[0xBB; 4], 0x100)
            .build();
        let header = parse(&image).unwrap();
        let mut memory = vec![0; 0x100];
        let result = load(
            &image,
            &header,
            &RemapTable::identity(),
            WindowSink::new(0x1000, &mut memory),
        );
        assert_eq!(
            result,
            Err(LoadError::Sink(SinkError {
                addr: 0x1000_0000,
                len: 0x100
            }))
        );
        assert!(memory.iter().all(|&b| b == 0));
    }

    #[test]
    fn window_sink_bounds() {
        let mut memory = [0u8; 16];
        let mut sink = WindowSink::new(0x100, &mut memory);
        assert!(sink.accepts(0x100, 16));
        assert!(!sink.accepts(0x100, 17));
        assert!(!sink.accepts(0xFF, 1));
        assert_eq!(
            sink.write(0x10C, &[1; 8]),
            Err(SinkError { addr: 0x10C, len: 8 })
        );
        sink.write(0x104, &[1, 2]).unwrap();
        sink.fill(0x106, 2, 9).unwrap();
        assert_eq!(sink.base(), 0x100);
        assert_eq!(&sink.memory()[4..8], &[1, 2, 9, 9]);
    }
}

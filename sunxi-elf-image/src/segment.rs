//! # Program header table
use crate::header::{ImageFormatError, ImageHeader};
use crate::le::{read_u32, read_word};

/// Segment type of loadable segments.
pub const PT_LOAD: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, num_enum::TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum SegmentType {
    Null = 0,
    Load = 1,
    Dynamic = 2,
    Interp = 3,
    Note = 4,
    Shlib = 5,
    ProgramHeader = 6,
    Tls = 7,
    RiscVAttributes = 0x7000_0003,
}

#[bitbybit::bitfield(u32, default = 0x0)]
#[derive(Debug, PartialEq, Eq)]
pub struct SegmentFlags {
    #[bit(2, r)]
    read: bool,
    #[bit(1, r)]
    write: bool,
    #[bit(0, r)]
    execute: bool,
}

/// One decoded program header entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramSegment {
    pub index: usize,
    pub segment_type: u32,
    pub flags: SegmentFlags,
    pub file_offset: u64,
    pub virt_addr: u64,
    /// Load address. All placement decisions are made with this address.
    pub phys_addr: u64,
    pub file_size: u64,
    pub mem_size: u64,
    pub align: u64,
}

impl ProgramSegment {
    #[inline]
    pub fn segment_type(&self) -> Option<SegmentType> {
        SegmentType::try_from(self.segment_type).ok()
    }

    #[inline]
    pub const fn is_loadable(&self) -> bool {
        self.segment_type == PT_LOAD
    }

    /// Both the file and the memory size are zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.file_size == 0 && self.mem_size == 0
    }

    /// Loadable and not empty.
    #[inline]
    pub const fn should_load(&self) -> bool {
        self.is_loadable() && !self.is_empty()
    }

    /// Number of bytes which are zero-filled after the file contents.
    #[inline]
    pub const fn zero_fill_size(&self) -> u64 {
        self.mem_size.saturating_sub(self.file_size)
    }

    /// Check the size invariants and return the file contents of the segment.
    pub fn data<'a>(&self, image: &'a [u8]) -> Result<&'a [u8], ImageFormatError> {
        if self.file_size > self.mem_size {
            return Err(ImageFormatError::FileSizeExceedsMemorySize {
                index: self.index,
                file_size: self.file_size,
                mem_size: self.mem_size,
            });
        }
        let out_of_bounds = ImageFormatError::SegmentOutOfBounds { index: self.index };
        let start = usize::try_from(self.file_offset).map_err(|_| out_of_bounds)?;
        let len = usize::try_from(self.file_size).map_err(|_| out_of_bounds)?;
        let end = start.checked_add(len).ok_or(out_of_bounds)?;
        image.get(start..end).ok_or(out_of_bounds)
    }
}

/// Iterator over all program header entries of an image.
pub struct Segments<'a> {
    data: &'a [u8],
    wide: bool,
    table_offset: usize,
    entry_size: usize,
    count: usize,
    current: usize,
}

/// Iterate over the program header table.
///
/// The table bounds were verified by [crate::parse], but this function re-checks them
/// so it can not be misused with a header from another buffer.
pub fn segments<'a>(
    data: &'a [u8],
    header: &ImageHeader,
) -> Result<Segments<'a>, ImageFormatError> {
    let count = usize::from(header.program_header_count());
    let entry_size = usize::from(header.program_header_entry_size());
    let table_offset = if count == 0 {
        0
    } else {
        let end = crate::le::table_end(
            header.program_header_offset(),
            header.program_header_count(),
            header.program_header_entry_size(),
        );
        match end {
            Some(end) if end <= data.len() => (),
            _ => {
                return Err(ImageFormatError::TableOutOfBounds(
                    crate::HeaderTable::ProgramHeaders,
                ));
            }
        }
        // Fits into usize because the end offset does.
        header.program_header_offset() as usize
    };
    Ok(Segments {
        data,
        wide: header.class().is_wide(),
        table_offset,
        entry_size,
        count,
        current: 0,
    })
}

impl Segments<'_> {
    fn decode(&self, index: usize) -> Option<ProgramSegment> {
        let base = self.table_offset + index * self.entry_size;
        let entry = self.data.get(base..base + self.entry_size)?;
        let segment_type = read_u32(entry, 0)?;
        let segment = if self.wide {
            ProgramSegment {
                index,
                segment_type,
                flags: SegmentFlags::new_with_raw_value(read_u32(entry, 4)?),
                file_offset: read_word(entry, 8, true)?,
                virt_addr: read_word(entry, 16, true)?,
                phys_addr: read_word(entry, 24, true)?,
                file_size: read_word(entry, 32, true)?,
                mem_size: read_word(entry, 40, true)?,
                align: read_word(entry, 48, true)?,
            }
        } else {
            ProgramSegment {
                index,
                segment_type,
                file_offset: read_word(entry, 4, false)?,
                virt_addr: read_word(entry, 8, false)?,
                phys_addr: read_word(entry, 12, false)?,
                file_size: read_word(entry, 16, false)?,
                mem_size: read_word(entry, 20, false)?,
                flags: SegmentFlags::new_with_raw_value(read_u32(entry, 24)?),
                align: read_word(entry, 28, false)?,
            }
        };
        Some(segment)
    }
}

impl Iterator for Segments<'_> {
    type Item = ProgramSegment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.count {
            return None;
        }
        let segment = self.decode(self.current);
        self.current += 1;
        segment
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Segments<'_> {}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;
    use crate::header::{ElfClass, parse};
    use crate::testing::ImageBuilder;

    #[test]
    fn decode_elf32_segments() {
        let builder = ImageBuilder::new(ElfClass::Elf32)
            .segment(0x1000_0000, &[1, 2, 3, 4], 0x100)
            .raw_segment(4, 0, 0, &[9; 8], 8);
        let image = builder.build();
        let header = parse(&image).unwrap();
        let all: Vec<_> = segments(&image, &header).unwrap().collect();
        assert_eq!(all.len(), 2);
        let first = all[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.segment_type(), Some(SegmentType::Load));
        assert_eq!(first.phys_addr, 0x1000_0000);
        assert_eq!(first.virt_addr, 0x1000_0000);
        assert_eq!(first.file_size, 4);
        assert_eq!(first.mem_size, 0x100);
        assert_eq!(first.zero_fill_size(), 0xFC);
        assert_eq!(first.file_offset, builder.segment_file_offset(0) as u64);
        assert!(first.flags.read());
        assert!(first.flags.write());
        assert!(first.flags.execute());
        assert!(first.should_load());
        assert_eq!(first.data(&image).unwrap(), &[1, 2, 3, 4]);

        let note = all[1];
        assert_eq!(note.segment_type(), Some(SegmentType::Note));
        assert!(!note.should_load());
    }

    #[test]
    fn decode_elf64_segments() {
        let image = ImageBuilder::new(ElfClass::Elf64)
            .raw_segment(PT_LOAD, 0x8000_0000, 0x1_0000_0000, &[0xAB; 3], 16)
            .build();
        let header = parse(&image).unwrap();
        let mut iter = segments(&image, &header).unwrap();
        assert_eq!(iter.len(), 1);
        let segment = iter.next().unwrap();
        assert_eq!(segment.virt_addr, 0x8000_0000);
        assert_eq!(segment.phys_addr, 0x1_0000_0000);
        assert_eq!(segment.file_size, 3);
        assert_eq!(segment.mem_size, 16);
        assert_eq!(segment.align, 4);
        assert_eq!(segment.data(&image).unwrap(), &[0xAB; 3]);
        assert!(iter.next().is_none());
    }

    #[test]
    fn empty_segment_is_not_loaded() {
        let image = ImageBuilder::new(ElfClass::Elf32)
            .segment(0x2000, &[], 0)
            .segment(0x3000, &[], 0x40)
            .build();
        let header = parse(&image).unwrap();
        let all: Vec<_> = segments(&image, &header).unwrap().collect();
        assert!(all[0].is_empty());
        assert!(!all[0].should_load());
        assert!(!all[1].is_empty());
        assert!(all[1].should_load());
    }

    #[test]
    fn file_size_larger_than_memory_size() {
        let image = ImageBuilder::new(ElfClass::Elf32)
            .segment(0x2000, &[0; 16], 8)
            .build();
        let header = parse(&image).unwrap();
        let segment = segments(&image, &header).unwrap().next().unwrap();
        assert_eq!(
            segment.data(&image),
            Err(ImageFormatError::FileSizeExceedsMemorySize {
                index: 0,
                file_size: 16,
                mem_size: 8
            })
        );
    }

    #[test]
    fn segment_contents_out_of_bounds() {
        let image = ImageBuilder::new(ElfClass::Elf32)
            .segment(0x2000, &[0; 16], 16)
            .build();
        let header = parse(&image).unwrap();
        let truncated = &image[..image.len() - 4];
        let segment = segments(truncated, &header).unwrap().next().unwrap();
        assert_eq!(
            segment.data(truncated),
            Err(ImageFormatError::SegmentOutOfBounds { index: 0 })
        );
    }

    #[test]
    fn header_from_other_buffer_is_rejected() {
        let image = ImageBuilder::new(ElfClass::Elf32)
            .segment(0x2000, &[0; 4], 4)
            .build();
        let header = parse(&image).unwrap();
        assert!(matches!(
            segments(&image[..0x40], &header),
            Err(ImageFormatError::TableOutOfBounds(_))
        ));
    }
}

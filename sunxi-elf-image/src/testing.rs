//! Synthetic image builder for unit tests of this crate and its dependents.
use alloc::vec::Vec;

use crate::header::{ELF_DATA_LSB, ELF_MAGIC, ElfClass};
use crate::segment::PT_LOAD;

/// Flags used for segments added with [ImageBuilder::segment]: read, write and execute.
pub const SEGMENT_FLAGS_RWX: u32 = 0b111;

const SHT_PROGBITS: u32 = 1;
const SHT_STRTAB: u32 = 3;

#[derive(Debug, Clone)]
struct PendingSegment {
    segment_type: u32,
    virt_addr: u64,
    phys_addr: u64,
    data: Vec<u8>,
    mem_size: u64,
    flags: u32,
}

#[derive(Debug, Clone)]
struct PendingSection {
    name: Vec<u8>,
    addr: u64,
    data: Vec<u8>,
}

/// Builds little-endian ELF images.
///
/// Layout: file header, program header table, segment contents, section contents, section name
/// table and finally the section header table.
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    class: ElfClass,
    machine: u16,
    entry: u64,
    segments: Vec<PendingSegment>,
    sections: Vec<PendingSection>,
}

impl ImageBuilder {
    pub fn new(class: ElfClass) -> Self {
        Self {
            class,
            machine: 0,
            entry: 0,
            segments: Vec::new(),
            sections: Vec::new(),
        }
    }

    pub fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    pub fn entry(mut self, entry: u64) -> Self {
        self.entry = entry;
        self
    }

    /// Loadable segment with identical virtual and physical address.
    pub fn segment(self, addr: u64, data: &[u8], mem_size: u64) -> Self {
        self.raw_segment(PT_LOAD, addr, addr, data, mem_size)
    }

    pub fn raw_segment(
        mut self,
        segment_type: u32,
        virt_addr: u64,
        phys_addr: u64,
        data: &[u8],
        mem_size: u64,
    ) -> Self {
        self.segments.push(PendingSegment {
            segment_type,
            virt_addr,
            phys_addr,
            data: data.to_vec(),
            mem_size,
            flags: SEGMENT_FLAGS_RWX,
        });
        self
    }

    pub fn section(mut self, name: &str, addr: u64, data: &[u8]) -> Self {
        self.sections.push(PendingSection {
            name: name.as_bytes().to_vec(),
            addr,
            data: data.to_vec(),
        });
        self
    }

    /// Offset of the contents of segment `index` in the built image.
    pub fn segment_file_offset(&self, index: usize) -> usize {
        let mut offset = self.class.header_size()
            + self.segments.len() * self.class.program_header_size();
        for segment in &self.segments[..index] {
            offset += segment.data.len();
        }
        offset
    }

    pub fn build(&self) -> Vec<u8> {
        let wide = self.class.is_wide();
        let ph_offset = self.class.header_size();
        let mut image = Vec::new();
        image.resize(ph_offset + self.segments.len() * self.class.program_header_size(), 0);

        let mut segment_offsets = Vec::new();
        for segment in &self.segments {
            segment_offsets.push(image.len());
            image.extend_from_slice(&segment.data);
        }
        let mut section_offsets = Vec::new();
        for section in &self.sections {
            section_offsets.push(image.len());
            image.extend_from_slice(&section.data);
        }

        let mut sh_offset = 0;
        let mut sh_count = 0;
        let mut sh_str_index = 0;
        if !self.sections.is_empty() {
            let mut names = Vec::from([0u8]);
            let mut name_offsets = Vec::new();
            for section in &self.sections {
                name_offsets.push(names.len());
                names.extend_from_slice(&section.name);
                names.push(0);
            }
            let shstrtab_name = names.len();
            names.extend_from_slice(b".shstrtab\0");
            let names_offset = image.len();
            image.extend_from_slice(&names);

            sh_offset = image.len();
            sh_count = self.sections.len() + 2;
            sh_str_index = sh_count - 1;
            let sh_size = self.class.section_header_size();
            image.resize(sh_offset + sh_count * sh_size, 0);
            for (i, section) in self.sections.iter().enumerate() {
                let entry = sh_offset + (i + 1) * sh_size;
                write_section_header(
                    &mut image[entry..entry + sh_size],
                    wide,
                    name_offsets[i] as u32,
                    SHT_PROGBITS,
                    section.addr,
                    section_offsets[i] as u64,
                    section.data.len() as u64,
                );
            }
            let entry = sh_offset + sh_str_index * sh_size;
            write_section_header(
                &mut image[entry..entry + sh_size],
                wide,
                shstrtab_name as u32,
                SHT_STRTAB,
                0,
                names_offset as u64,
                names.len() as u64,
            );
        }

        let ph_size = self.class.program_header_size();
        for (i, segment) in self.segments.iter().enumerate() {
            let entry = ph_offset + i * ph_size;
            write_program_header(
                &mut image[entry..entry + ph_size],
                wide,
                segment,
                segment_offsets[i] as u64,
            );
        }

        image[0..4].copy_from_slice(&ELF_MAGIC);
        image[4] = self.class as u8;
        image[5] = ELF_DATA_LSB;
        image[6] = 1;
        put_u16(&mut image, 0x10, 2);
        put_u16(&mut image, 0x12, self.machine);
        put_u32(&mut image, 0x14, 1);
        put_word(&mut image, 0x18, wide, self.entry);
        let ph_table = if self.segments.is_empty() { 0 } else { ph_offset as u64 };
        if wide {
            put_u64(&mut image, 0x20, ph_table);
            put_u64(&mut image, 0x28, sh_offset as u64);
        } else {
            put_u32(&mut image, 0x1C, ph_table as u32);
            put_u32(&mut image, 0x20, sh_offset as u32);
        }
        let shift = if wide { 12 } else { 0 };
        put_u16(&mut image, 0x28 + shift, self.class.header_size() as u16);
        put_u16(&mut image, 0x2A + shift, ph_size as u16);
        put_u16(&mut image, 0x2C + shift, self.segments.len() as u16);
        put_u16(
            &mut image,
            0x2E + shift,
            self.class.section_header_size() as u16,
        );
        put_u16(&mut image, 0x30 + shift, sh_count as u16);
        put_u16(&mut image, 0x32 + shift, sh_str_index as u16);
        image
    }
}

fn write_program_header(entry: &mut [u8], wide: bool, segment: &PendingSegment, offset: u64) {
    put_u32(entry, 0, segment.segment_type);
    if wide {
        put_u32(entry, 4, segment.flags);
        put_u64(entry, 8, offset);
        put_u64(entry, 16, segment.virt_addr);
        put_u64(entry, 24, segment.phys_addr);
        put_u64(entry, 32, segment.data.len() as u64);
        put_u64(entry, 40, segment.mem_size);
        put_u64(entry, 48, 4);
    } else {
        put_u32(entry, 4, offset as u32);
        put_u32(entry, 8, segment.virt_addr as u32);
        put_u32(entry, 12, segment.phys_addr as u32);
        put_u32(entry, 16, segment.data.len() as u32);
        put_u32(entry, 20, segment.mem_size as u32);
        put_u32(entry, 24, segment.flags);
        put_u32(entry, 28, 4);
    }
}

fn write_section_header(
    entry: &mut [u8],
    wide: bool,
    name: u32,
    section_type: u32,
    addr: u64,
    offset: u64,
    size: u64,
) {
    put_u32(entry, 0, name);
    put_u32(entry, 4, section_type);
    put_word(entry, if wide { 16 } else { 12 }, wide, addr);
    put_word(entry, if wide { 24 } else { 16 }, wide, offset);
    put_word(entry, if wide { 32 } else { 20 }, wide, size);
}

fn put_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(data: &mut [u8], offset: usize, value: u64) {
    data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

fn put_word(data: &mut [u8], offset: usize, wide: bool, value: u64) {
    if wide {
        put_u64(data, offset, value);
    } else {
        put_u32(data, offset, value as u32);
    }
}

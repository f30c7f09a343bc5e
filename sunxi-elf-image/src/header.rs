//! # ELF file header
use crate::le::{read_u16, read_u32, read_word, table_end};

/// ASCII `\x7fELF`.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Size of the identification block at the start of every ELF file.
pub const IDENT_SIZE: usize = 16;

pub const ELF32_HEADER_SIZE: usize = 0x34;
pub const ELF64_HEADER_SIZE: usize = 0x40;

pub const ELF32_PROGRAM_HEADER_SIZE: usize = 0x20;
pub const ELF64_PROGRAM_HEADER_SIZE: usize = 0x38;

pub const ELF32_SECTION_HEADER_SIZE: usize = 0x28;
pub const ELF64_SECTION_HEADER_SIZE: usize = 0x40;

const IDENT_CLASS: usize = 4;
const IDENT_DATA: usize = 5;

/// Little-endian data encoding tag.
pub const ELF_DATA_LSB: u8 = 1;

/// Word size tag of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_enum::TryFromPrimitive)]
#[repr(u8)]
pub enum ElfClass {
    Elf32 = 1,
    Elf64 = 2,
}

impl ElfClass {
    #[inline]
    pub const fn header_size(self) -> usize {
        match self {
            ElfClass::Elf32 => ELF32_HEADER_SIZE,
            ElfClass::Elf64 => ELF64_HEADER_SIZE,
        }
    }

    #[inline]
    pub const fn program_header_size(self) -> usize {
        match self {
            ElfClass::Elf32 => ELF32_PROGRAM_HEADER_SIZE,
            ElfClass::Elf64 => ELF64_PROGRAM_HEADER_SIZE,
        }
    }

    #[inline]
    pub const fn section_header_size(self) -> usize {
        match self {
            ElfClass::Elf32 => ELF32_SECTION_HEADER_SIZE,
            ElfClass::Elf64 => ELF64_SECTION_HEADER_SIZE,
        }
    }

    #[inline]
    pub(crate) const fn is_wide(self) -> bool {
        matches!(self, ElfClass::Elf64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, num_enum::TryFromPrimitive)]
#[repr(u16)]
pub enum FileType {
    None = 0,
    Relocatable = 1,
    Executable = 2,
    SharedObject = 3,
    Core = 4,
}

/// Machines which are found on sunxi SoCs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_enum::TryFromPrimitive)]
#[repr(u16)]
#[non_exhaustive]
pub enum Machine {
    Arm = 40,
    /// Tensilica Xtensa, used by the HiFi4 DSP.
    Xtensa = 94,
    AArch64 = 183,
    RiscV = 243,
}

/// Header tables which are referenced by the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderTable {
    ProgramHeaders,
    SectionHeaders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ImageFormatError {
    #[error("image buffer is empty")]
    EmptyImage,
    #[error("image buffer too small: {actual} bytes, at least {required} bytes required")]
    TooSmall { required: usize, actual: usize },
    #[error("invalid ELF magic")]
    InvalidMagic,
    #[error("unsupported ELF class {0}")]
    UnsupportedClass(u8),
    #[error("unsupported data encoding {0}, only little-endian images are supported")]
    UnsupportedEncoding(u8),
    #[error("{table:?} entry size {found} does not match the expected size {expected}")]
    EntrySizeMismatch {
        table: HeaderTable,
        expected: usize,
        found: usize,
    },
    #[error("{0:?} table exceeds the image buffer")]
    TableOutOfBounds(HeaderTable),
    #[error("segment {index} data exceeds the image buffer")]
    SegmentOutOfBounds { index: usize },
    #[error("segment {index} file size {file_size} exceeds its memory size {mem_size}")]
    FileSizeExceedsMemorySize {
        index: usize,
        file_size: u64,
        mem_size: u64,
    },
    #[error("section name table is invalid")]
    StringTableOutOfBounds,
}

/// Parsed and validated ELF file header.
///
/// This is a plain copy of the header fields. It does not borrow the image buffer, but all
/// table accessors expect to be called with the same buffer the header was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    ident: [u8; IDENT_SIZE],
    class: ElfClass,
    file_type: u16,
    machine: u16,
    version: u32,
    entry: u64,
    ph_offset: u64,
    sh_offset: u64,
    flags: u32,
    header_size: u16,
    ph_entry_size: u16,
    ph_count: u16,
    sh_entry_size: u16,
    sh_count: u16,
    sh_str_index: u16,
}

/// Parse and validate the ELF header at the start of `data`.
///
/// The following checks are performed before the header is accepted:
///
/// 1. The buffer is not empty and contains at least the identification block.
/// 2. The magic is valid, the class is either 32 or 64 bit and the encoding is little-endian.
/// 3. The buffer contains at least the full header for the detected class.
/// 4. If program headers are present, their entry size matches the class and the whole table is
///    contained in the buffer.
pub fn parse(data: &[u8]) -> Result<ImageHeader, ImageFormatError> {
    if data.is_empty() {
        return Err(ImageFormatError::EmptyImage);
    }
    if data.len() < IDENT_SIZE {
        return Err(ImageFormatError::TooSmall {
            required: IDENT_SIZE,
            actual: data.len(),
        });
    }
    if data[0..4] != ELF_MAGIC {
        return Err(ImageFormatError::InvalidMagic);
    }
    let class = ElfClass::try_from(data[IDENT_CLASS])
        .map_err(|_| ImageFormatError::UnsupportedClass(data[IDENT_CLASS]))?;
    if data[IDENT_DATA] != ELF_DATA_LSB {
        return Err(ImageFormatError::UnsupportedEncoding(data[IDENT_DATA]));
    }
    if data.len() < class.header_size() {
        return Err(ImageFormatError::TooSmall {
            required: class.header_size(),
            actual: data.len(),
        });
    }

    let header = read_fields(data, class).ok_or(ImageFormatError::TooSmall {
        required: class.header_size(),
        actual: data.len(),
    })?;

    if header.ph_count > 0 {
        if usize::from(header.ph_entry_size) != class.program_header_size() {
            return Err(ImageFormatError::EntrySizeMismatch {
                table: HeaderTable::ProgramHeaders,
                expected: class.program_header_size(),
                found: usize::from(header.ph_entry_size),
            });
        }
        match table_end(header.ph_offset, header.ph_count, header.ph_entry_size) {
            Some(end) if end <= data.len() => (),
            _ => return Err(ImageFormatError::TableOutOfBounds(HeaderTable::ProgramHeaders)),
        }
    }
    Ok(header)
}

fn read_fields(data: &[u8], class: ElfClass) -> Option<ImageHeader> {
    let mut ident = [0; IDENT_SIZE];
    ident.copy_from_slice(data.get(0..IDENT_SIZE)?);
    let wide = class.is_wide();
    // Everything after the entry point is shifted by the wider address fields on ELF64.
    let shift = if wide { 12 } else { 0 };
    Some(ImageHeader {
        ident,
        class,
        file_type: read_u16(data, 0x10)?,
        machine: read_u16(data, 0x12)?,
        version: read_u32(data, 0x14)?,
        entry: read_word(data, 0x18, wide)?,
        ph_offset: read_word(data, if wide { 0x20 } else { 0x1C }, wide)?,
        sh_offset: read_word(data, if wide { 0x28 } else { 0x20 }, wide)?,
        flags: read_u32(data, 0x24 + shift)?,
        header_size: read_u16(data, 0x28 + shift)?,
        ph_entry_size: read_u16(data, 0x2A + shift)?,
        ph_count: read_u16(data, 0x2C + shift)?,
        sh_entry_size: read_u16(data, 0x2E + shift)?,
        sh_count: read_u16(data, 0x30 + shift)?,
        sh_str_index: read_u16(data, 0x32 + shift)?,
    })
}

/// Raw entry point exactly as encoded in the header.
///
/// This is the address in the view of the target core. Remapping it is a separate step.
#[inline]
pub fn entry_address(header: &ImageHeader) -> u64 {
    header.entry()
}

/// Dump the header fields with debug level.
pub fn log_header(header: &ImageHeader) {
    log::debug!("ELF: e_ident: {:02x?}", header.ident);
    log::debug!("ELF: e_type: {:#06x}", header.file_type);
    log::debug!("ELF: e_machine: {:#06x}", header.machine);
    log::debug!("ELF: e_version: {:#010x}", header.version);
    log::debug!("ELF: e_entry: {:#010x}", header.entry);
    log::debug!("ELF: e_phoff: {:#010x}", header.ph_offset);
    log::debug!("ELF: e_shoff: {:#010x}", header.sh_offset);
    log::debug!("ELF: e_flags: {:#010x}", header.flags);
    log::debug!("ELF: e_ehsize: {:#06x}", header.header_size);
    log::debug!("ELF: e_phentsize: {:#06x}", header.ph_entry_size);
    log::debug!("ELF: e_phnum: {}", header.ph_count);
    log::debug!("ELF: e_shentsize: {:#06x}", header.sh_entry_size);
    log::debug!("ELF: e_shnum: {}", header.sh_count);
    log::debug!("ELF: e_shstrndx: {}", header.sh_str_index);
}

impl ImageHeader {
    #[inline]
    pub const fn ident(&self) -> &[u8; IDENT_SIZE] {
        &self.ident
    }

    #[inline]
    pub const fn class(&self) -> ElfClass {
        self.class
    }

    #[inline]
    pub const fn file_type_raw(&self) -> u16 {
        self.file_type
    }

    #[inline]
    pub fn file_type(&self) -> Option<FileType> {
        FileType::try_from(self.file_type).ok()
    }

    #[inline]
    pub const fn machine_raw(&self) -> u16 {
        self.machine
    }

    #[inline]
    pub fn machine(&self) -> Option<Machine> {
        Machine::try_from(self.machine).ok()
    }

    #[inline]
    pub const fn version(&self) -> u32 {
        self.version
    }

    #[inline]
    pub const fn entry(&self) -> u64 {
        self.entry
    }

    #[inline]
    pub const fn program_header_offset(&self) -> u64 {
        self.ph_offset
    }

    #[inline]
    pub const fn program_header_entry_size(&self) -> u16 {
        self.ph_entry_size
    }

    #[inline]
    pub const fn program_header_count(&self) -> u16 {
        self.ph_count
    }

    #[inline]
    pub const fn section_header_offset(&self) -> u64 {
        self.sh_offset
    }

    #[inline]
    pub const fn section_header_entry_size(&self) -> u16 {
        self.sh_entry_size
    }

    #[inline]
    pub const fn section_header_count(&self) -> u16 {
        self.sh_count
    }

    /// Index of the section containing the section names.
    #[inline]
    pub const fn section_name_index(&self) -> u16 {
        self.sh_str_index
    }

    #[inline]
    pub const fn flags(&self) -> u32 {
        self.flags
    }

    #[inline]
    pub const fn header_size(&self) -> u16 {
        self.header_size
    }
}

//! # Section header table
//!
//! Lookup of named sections, for example a resource table or a firmware version string which
//! the co-processor image carries next to its loadable segments.
use crate::header::{HeaderTable, ImageFormatError, ImageHeader};
use crate::le::{read_u32, read_word, table_end};

/// Section index which marks an absent name table.
const SHN_UNDEF: usize = 0;

/// One decoded section header entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    pub index: usize,
    /// Name without the terminating NUL.
    pub name: &'a [u8],
    pub section_type: u32,
    pub addr: u64,
    pub file_offset: u64,
    pub size: u64,
}

impl<'a> Section<'a> {
    pub fn name_str(&self) -> Option<&'a str> {
        core::str::from_utf8(self.name).ok()
    }

    /// File contents of the section.
    ///
    /// Returns [None] for sections which are not contained in the buffer, which is always the
    /// case for sections without file contents like `.bss`.
    pub fn data(&self, image: &'a [u8]) -> Option<&'a [u8]> {
        let start = usize::try_from(self.file_offset).ok()?;
        let end = start.checked_add(usize::try_from(self.size).ok()?)?;
        image.get(start..end)
    }
}

/// Iterator over all section header entries.
pub struct Sections<'a> {
    data: &'a [u8],
    wide: bool,
    table_offset: usize,
    entry_size: usize,
    count: usize,
    current: usize,
    names: &'a [u8],
    has_names: bool,
}

/// Iterate over the section header table with names resolved.
///
/// An image without section headers yields an empty iterator. An image without a name table
/// (`e_shstrndx` is `SHN_UNDEF`) yields sections with empty names. All table, string table and
/// name accesses are bounds-checked up front or while iterating.
pub fn sections<'a>(
    data: &'a [u8],
    header: &ImageHeader,
) -> Result<Sections<'a>, ImageFormatError> {
    let class = header.class();
    let count = usize::from(header.section_header_count());
    if count == 0 {
        return Ok(Sections {
            data,
            wide: class.is_wide(),
            table_offset: 0,
            entry_size: class.section_header_size(),
            count,
            current: 0,
            names: &[],
            has_names: false,
        });
    }
    if usize::from(header.section_header_entry_size()) != class.section_header_size() {
        return Err(ImageFormatError::EntrySizeMismatch {
            table: HeaderTable::SectionHeaders,
            expected: class.section_header_size(),
            found: usize::from(header.section_header_entry_size()),
        });
    }
    match table_end(
        header.section_header_offset(),
        header.section_header_count(),
        header.section_header_entry_size(),
    ) {
        Some(end) if end <= data.len() => (),
        _ => return Err(ImageFormatError::TableOutOfBounds(HeaderTable::SectionHeaders)),
    }
    let mut sections = Sections {
        data,
        wide: class.is_wide(),
        // Fits into usize because the end offset does.
        table_offset: header.section_header_offset() as usize,
        entry_size: class.section_header_size(),
        count,
        current: 0,
        names: &[],
        has_names: false,
    };
    let name_index = usize::from(header.section_name_index());
    if name_index == SHN_UNDEF {
        return Ok(sections);
    }
    if name_index >= count {
        return Err(ImageFormatError::StringTableOutOfBounds);
    }
    let (_, offset, size) = sections
        .raw_entry(name_index)
        .ok_or(ImageFormatError::StringTableOutOfBounds)?;
    let start = usize::try_from(offset).map_err(|_| ImageFormatError::StringTableOutOfBounds)?;
    let len = usize::try_from(size).map_err(|_| ImageFormatError::StringTableOutOfBounds)?;
    sections.names = start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .ok_or(ImageFormatError::StringTableOutOfBounds)?;
    sections.has_names = true;
    Ok(sections)
}

impl<'a> Sections<'a> {
    /// The image has a section name table.
    #[inline]
    pub const fn has_names(&self) -> bool {
        self.has_names
    }

    /// Name offset, file offset and size of entry `index`.
    fn raw_entry(&self, index: usize) -> Option<(u32, u64, u64)> {
        let entry = self.entry(index)?;
        let (offset, size) = if self.wide { (24, 32) } else { (16, 20) };
        Some((
            read_u32(entry, 0)?,
            read_word(entry, offset, self.wide)?,
            read_word(entry, size, self.wide)?,
        ))
    }

    fn entry(&self, index: usize) -> Option<&'a [u8]> {
        let base = self.table_offset.checked_add(index.checked_mul(self.entry_size)?)?;
        self.data.get(base..base.checked_add(self.entry_size)?)
    }

    fn name(&self, offset: u32) -> Result<&'a [u8], ImageFormatError> {
        if !self.has_names {
            return Ok(&[]);
        }
        let tail = usize::try_from(offset)
            .ok()
            .and_then(|offset| self.names.get(offset..))
            .ok_or(ImageFormatError::StringTableOutOfBounds)?;
        let len = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(ImageFormatError::StringTableOutOfBounds)?;
        Ok(&tail[..len])
    }

    fn decode(&self, index: usize) -> Result<Section<'a>, ImageFormatError> {
        let malformed = ImageFormatError::TableOutOfBounds(HeaderTable::SectionHeaders);
        let entry = self.entry(index).ok_or(malformed)?;
        let (name_offset, file_offset, size) = self.raw_entry(index).ok_or(malformed)?;
        Ok(Section {
            index,
            name: self.name(name_offset)?,
            section_type: read_u32(entry, 4).ok_or(malformed)?,
            addr: read_word(entry, if self.wide { 16 } else { 12 }, self.wide)
                .ok_or(malformed)?,
            file_offset,
            size,
        })
    }
}

impl<'a> Iterator for Sections<'a> {
    type Item = Result<Section<'a>, ImageFormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.count {
            return None;
        }
        let section = self.decode(self.current);
        self.current += 1;
        Some(section)
    }
}

/// Find the first section called `name`.
///
/// Returns [None] if no section has this name. A malformed section table is an error, even
/// if the name would have been found before the malformed entry.
pub fn find_section<'a>(
    data: &'a [u8],
    header: &ImageHeader,
    name: &str,
) -> Result<Option<Section<'a>>, ImageFormatError> {
    let mut found = None;
    let iter = sections(data, header)?;
    let has_names = iter.has_names();
    for section in iter {
        let section = section?;
        if has_names && found.is_none() && section.name == name.as_bytes() {
            found = Some(section);
        }
    }
    Ok(found)
}

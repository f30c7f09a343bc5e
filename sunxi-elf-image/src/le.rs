//! Little-endian field readers over borrowed byte slices.
//!
//! All readers return [None] instead of panicking if the field is not fully contained in the
//! slice.

#[inline]
pub(crate) fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    bytes.try_into().ok().map(u16::from_le_bytes)
}

#[inline]
pub(crate) fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    bytes.try_into().ok().map(u32::from_le_bytes)
}

#[inline]
pub(crate) fn read_u64(data: &[u8], offset: usize) -> Option<u64> {
    let bytes = data.get(offset..offset.checked_add(8)?)?;
    bytes.try_into().ok().map(u64::from_le_bytes)
}

/// Reads a 32 bit word for [crate::ElfClass::Elf32] images and a 64 bit word otherwise.
#[inline]
pub(crate) fn read_word(data: &[u8], offset: usize, wide: bool) -> Option<u64> {
    if wide {
        read_u64(data, offset)
    } else {
        read_u32(data, offset).map(u64::from)
    }
}

/// End offset of a table of `count` entries of `entry_size` bytes starting at `offset`, or
/// [None] on overflow.
#[inline]
pub(crate) fn table_end(offset: u64, count: u16, entry_size: u16) -> Option<usize> {
    let len = u64::from(count).checked_mul(u64::from(entry_size))?;
    let end = offset.checked_add(len)?;
    usize::try_from(end).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_bounds_checked() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        assert_eq!(read_u16(&data, 0), Some(0x0201));
        assert_eq!(read_u32(&data, 1), Some(0x0504_0302));
        assert_eq!(read_u32(&data, 2), None);
        assert_eq!(read_u64(&data, 0), None);
        assert_eq!(read_u16(&data, usize::MAX), None);
    }

    #[test]
    fn table_end_overflow() {
        assert_eq!(table_end(0x34, 2, 0x20), Some(0x74));
        assert_eq!(table_end(u64::MAX, 1, 1), None);
    }
}

//! # Address remapping
//!
//! Co-processors often see their memories at different addresses than the primary CPU. A
//! [RemapTable] translates addresses from the view of the target core into addresses the
//! loader can write to.

/// Inclusive address window `v_start..=v_end` which maps to the window starting at `p_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub v_start: u64,
    pub v_end: u64,
    pub p_start: u64,
}

impl AddressRange {
    #[inline]
    pub const fn new(v_start: u64, v_end: u64, p_start: u64) -> Self {
        Self {
            v_start,
            v_end,
            p_start,
        }
    }

    #[inline]
    pub const fn contains(&self, addr: u64) -> bool {
        addr >= self.v_start && addr <= self.v_end
    }

    /// Translate an address which is known to be contained in this range.
    #[inline]
    const fn map(&self, addr: u64) -> u64 {
        addr.wrapping_sub(self.v_start).wrapping_add(self.p_start)
    }
}

/// Ordered list of address ranges. The first range containing an address wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemapTable<'a> {
    ranges: &'a [AddressRange],
}

impl<'a> RemapTable<'a> {
    #[inline]
    pub const fn new(ranges: &'a [AddressRange]) -> Self {
        Self { ranges }
    }

    /// Table without any entries. Every address maps to itself.
    #[inline]
    pub const fn identity() -> Self {
        Self { ranges: &[] }
    }

    #[inline]
    pub const fn ranges(&self) -> &'a [AddressRange] {
        self.ranges
    }

    #[inline]
    pub const fn is_identity(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Translate `addr`, returning it unchanged if no range contains it.
    pub fn translate(&self, addr: u64) -> u64 {
        match self.ranges.iter().find(|range| range.contains(addr)) {
            Some(range) => range.map(addr),
            None => addr,
        }
    }
}

impl Default for RemapTable<'_> {
    fn default() -> Self {
        Self::identity()
    }
}

/// Free function form of [RemapTable::translate].
#[inline]
pub fn translate(addr: u64, table: &RemapTable<'_>) -> u64 {
    table.translate(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DSP_WINDOWS: [AddressRange; 2] = [
        AddressRange::new(0x1000_0000, 0x1FFF_FFFF, 0x3000_0000),
        AddressRange::new(0x3000_0000, 0x3FFF_FFFF, 0x1000_0000),
    ];

    #[test]
    fn translate_inside_window() {
        let table = RemapTable::new(&DSP_WINDOWS);
        assert_eq!(translate(0x1000_0000, &table), 0x3000_0000);
        assert_eq!(translate(0x1000_1234, &table), 0x3000_1234);
        assert_eq!(translate(0x3000_0010, &table), 0x1000_0010);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let table = RemapTable::new(&DSP_WINDOWS);
        assert_eq!(table.translate(0x1FFF_FFFF), 0x3FFF_FFFF);
        assert_eq!(table.translate(0x0FFF_FFFF), 0x0FFF_FFFF);
        assert_eq!(table.translate(0x4000_0000), 0x4000_0000);
    }

    #[test]
    fn unmatched_addresses_are_unchanged() {
        let table = RemapTable::new(&DSP_WINDOWS);
        assert_eq!(table.translate(0x0002_0000), 0x0002_0000);
        assert_eq!(table.translate(u64::MAX), u64::MAX);
    }

    #[test]
    fn first_match_wins_on_overlap() {
        let overlapping = [
            AddressRange::new(0x1000, 0x1FFF, 0x8000),
            AddressRange::new(0x1800, 0x2FFF, 0x9000),
        ];
        let table = RemapTable::new(&overlapping);
        assert_eq!(table.translate(0x1800), 0x8800);
        assert_eq!(table.translate(0x2000), 0x9800);
    }

    #[test]
    fn identity_table() {
        let table = RemapTable::identity();
        assert!(table.is_identity());
        assert_eq!(table.translate(0x1234_5678), 0x1234_5678);
        assert_eq!(RemapTable::default(), table);
    }

    #[test]
    fn identity_window() {
        let ranges = [AddressRange::new(0x4040_0000, 0x7FFF_FFFF, 0x4040_0000)];
        let table = RemapTable::new(&ranges);
        assert_eq!(table.translate(0x4040_1000), 0x4040_1000);
    }
}

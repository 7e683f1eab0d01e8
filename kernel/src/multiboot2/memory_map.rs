//! Memory map (type 6) and basic memory info (type 4) tags.

use super::tags::{read_u32, read_u64};

/// Size of one `{base, length, type, reserved}` entry as of version 0.
pub const MEMORY_AREA_SIZE: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryAreaType {
    Available,
    Reserved,
    AcpiReclaimable,
    AcpiNvs,
    BadRam,
    Unknown(u32),
}

impl From<u32> for MemoryAreaType {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Available,
            2 => Self::Reserved,
            3 => Self::AcpiReclaimable,
            4 => Self::AcpiNvs,
            5 => Self::BadRam,
            other => Self::Unknown(other),
        }
    }
}

/// One physical memory region reported by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryArea {
    pub base_addr: u64,
    pub length: u64,
    pub typ: u32,
}

impl MemoryArea {
    pub fn area_type(&self) -> MemoryAreaType {
        MemoryAreaType::from(self.typ)
    }

    pub fn is_available(&self) -> bool {
        self.area_type() == MemoryAreaType::Available
    }

    pub fn end_address(&self) -> u64 {
        self.base_addr.saturating_add(self.length)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MemoryMapTag<'a> {
    entry_size: u32,
    entry_version: u32,
    entries: &'a [u8],
}

impl<'a> MemoryMapTag<'a> {
    pub(super) fn parse(payload: &'a [u8]) -> Option<Self> {
        Some(MemoryMapTag {
            entry_size: read_u32(payload, 0)?,
            entry_version: read_u32(payload, 4)?,
            entries: payload.get(8..)?,
        })
    }

    pub fn entry_size(&self) -> u32 {
        self.entry_size
    }

    pub fn entry_version(&self) -> u32 {
        self.entry_version
    }

    /// All entries, stepping by the declared `entry_size` so that future
    /// entry layouts with trailing fields are still walked correctly.
    pub fn memory_areas(&self) -> MemoryAreaIter<'a> {
        MemoryAreaIter {
            entries: self.entries,
            entry_size: self.entry_size as usize,
        }
    }

    pub fn available_areas(&self) -> impl Iterator<Item = MemoryArea> + 'a {
        self.memory_areas().filter(MemoryArea::is_available)
    }

    /// Ranges inside `[start, end)` that no available area covers, in
    /// ascending order. The map may be unsorted and its areas may overlap.
    pub fn unavailable_ranges(&self, start: u64, end: u64) -> UnavailableRanges<'a> {
        UnavailableRanges {
            map: *self,
            cursor: start,
            end,
        }
    }
}

/// Iterator over `[start, end)` pairs not covered by available memory.
pub struct UnavailableRanges<'a> {
    map: MemoryMapTag<'a>,
    cursor: u64,
    end: u64,
}

impl Iterator for UnavailableRanges<'_> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<(u64, u64)> {
        while self.cursor < self.end {
            let cursor = self.cursor;
            let covered_until = self
                .map
                .available_areas()
                .filter(|area| area.base_addr <= cursor && cursor < area.end_address())
                .map(|area| area.end_address())
                .max();

            match covered_until {
                Some(area_end) => self.cursor = area_end,
                None => {
                    let hole_end = self
                        .map
                        .available_areas()
                        .map(|area| area.base_addr)
                        .filter(|&base| base > cursor)
                        .min()
                        .map_or(self.end, |base| base.min(self.end));
                    self.cursor = hole_end;
                    return Some((cursor, hole_end));
                }
            }
        }
        None
    }
}

pub struct MemoryAreaIter<'a> {
    entries: &'a [u8],
    entry_size: usize,
}

impl Iterator for MemoryAreaIter<'_> {
    type Item = MemoryArea;

    fn next(&mut self) -> Option<MemoryArea> {
        if self.entry_size < MEMORY_AREA_SIZE || self.entries.len() < self.entry_size {
            return None;
        }

        let (entry, rest) = self.entries.split_at(self.entry_size);
        self.entries = rest;

        Some(MemoryArea {
            base_addr: read_u64(entry, 0)?,
            length: read_u64(entry, 8)?,
            typ: read_u32(entry, 16)?,
        })
    }
}

/// Amount of lower and upper memory in KiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicMemoryInfo {
    pub mem_lower: u32,
    pub mem_upper: u32,
}

impl BasicMemoryInfo {
    pub(super) fn parse(payload: &[u8]) -> Option<Self> {
        Some(BasicMemoryInfo {
            mem_lower: read_u32(payload, 0)?,
            mem_upper: read_u32(payload, 4)?,
        })
    }

    /// Memory size estimate when no memory map is present.
    ///
    /// `mem_upper` counts from 1 MiB, so the first MiB is added back.
    pub fn memory_size(&self) -> u64 {
        (u64::from(self.mem_upper) + 1024) * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(base: u64, length: u64, typ: u32, padding: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&base.to_le_bytes());
        bytes.extend_from_slice(&length.to_le_bytes());
        bytes.extend_from_slice(&typ.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.resize(bytes.len() + padding, 0xAA);
        bytes
    }

    fn payload(entry_size: u32, entries: &[Vec<u8>]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&entry_size.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        for e in entries {
            bytes.extend_from_slice(e);
        }
        bytes
    }

    #[test]
    fn walks_entries_by_declared_size() {
        let bytes = payload(
            32,
            &[
                entry(0, 0x9_fc00, 1, 8),
                entry(0x10_0000, 0x7f0_0000, 1, 8),
                entry(0xfffc_0000, 0x4_0000, 2, 8),
            ],
        );
        let tag = MemoryMapTag::parse(&bytes).unwrap();

        let areas: Vec<_> = tag.memory_areas().collect();
        assert_eq!(areas.len(), 3);
        assert_eq!(areas[1].base_addr, 0x10_0000);
        assert_eq!(areas[1].end_address(), 0x800_0000);
        assert_eq!(areas[2].area_type(), MemoryAreaType::Reserved);
        assert_eq!(tag.available_areas().count(), 2);
    }

    #[test]
    fn unreported_gaps_are_unavailable() {
        let bytes = payload(
            24,
            &[
                entry(0x80_0000, 0x80_0000, 1, 0),
                entry(0x10_0000, 0x30_0000, 1, 0),
                entry(0x40_0000, 0x1_0000, 2, 0),
            ],
        );
        let tag = MemoryMapTag::parse(&bytes).unwrap();

        let holes: Vec<_> = tag.unavailable_ranges(0x10_0000, 0x200_0000).collect();
        assert_eq!(holes, [(0x40_0000, 0x80_0000), (0x100_0000, 0x200_0000)]);
    }

    #[test]
    fn overlapping_available_areas_leave_no_hole() {
        let bytes = payload(
            24,
            &[
                entry(0x10_0000, 0x40_0000, 1, 0),
                entry(0x20_0000, 0x60_0000, 1, 0),
                entry(0x30_0000, 0x1000, 1, 0),
            ],
        );
        let tag = MemoryMapTag::parse(&bytes).unwrap();

        assert_eq!(tag.unavailable_ranges(0x10_0000, 0x80_0000).count(), 0);
        let holes: Vec<_> = tag.unavailable_ranges(0, 0x90_0000).collect();
        assert_eq!(holes, [(0, 0x10_0000), (0x80_0000, 0x90_0000)]);
    }

    #[test]
    fn map_without_available_areas_is_one_hole() {
        let bytes = payload(24, &[entry(0, 0x100_0000, 2, 0)]);
        let tag = MemoryMapTag::parse(&bytes).unwrap();

        let holes: Vec<_> = tag.unavailable_ranges(0x10_0000, 0x40_0000).collect();
        assert_eq!(holes, [(0x10_0000, 0x40_0000)]);
        assert_eq!(tag.unavailable_ranges(5, 5).count(), 0);
    }

    #[test]
    fn undersized_entries_yield_nothing() {
        let bytes = payload(16, &[entry(0, 0x1000, 1, 0)]);
        let tag = MemoryMapTag::parse(&bytes).unwrap();
        assert_eq!(tag.memory_areas().count(), 0);
    }

    #[test]
    fn truncated_trailing_entry_is_ignored() {
        let mut bytes = payload(24, &[entry(0, 0x1000, 1, 0)]);
        bytes.extend_from_slice(&[0u8; 10]);
        let tag = MemoryMapTag::parse(&bytes).unwrap();
        assert_eq!(tag.memory_areas().count(), 1);
    }

    #[test]
    fn unknown_area_types_are_kept() {
        assert_eq!(MemoryAreaType::from(3), MemoryAreaType::AcpiReclaimable);
        assert_eq!(MemoryAreaType::from(5), MemoryAreaType::BadRam);
        assert_eq!(MemoryAreaType::from(9), MemoryAreaType::Unknown(9));
    }

    #[test]
    fn basic_memory_info_adds_back_first_mebibyte() {
        let info = BasicMemoryInfo {
            mem_lower: 639,
            mem_upper: 130_048,
        };
        assert_eq!(info.memory_size(), 134_217_728);
    }
}

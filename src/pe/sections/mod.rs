pub mod certificate;

use core::ops::{Deref, DerefMut};

use bitflags::bitflags;

use crate::containers::Table;
use crate::error::Result;
use crate::io::{ReadData, Reader};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SectionTable(pub Table<SectionTableRow>);

impl SectionTable {
    pub fn new_linear(reader: &mut impl Reader, items_count: usize) -> Result<Self> {
        Table::new_linear(reader, items_count).map(Self)
    }
}

impl Deref for SectionTable {
    type Target = Table<SectionTableRow>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SectionTable {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

bitflags! {
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct SectionFlags: u32 {
        /// The section should not be padded to the next boundary.
        /// Valid only for object files.
        const TYPE_NO_PAD = 0x00000008;
        /// The section contains executable code.
        const CNT_CODE = 0x00000020;
        /// The section contains initialized data.
        const CNT_INITIALIZED_DATA = 0x00000040;
        /// The section contains uninitialized data.
        const CNT_UNINITIALIZED_DATA = 0x00000080;
        /// Reserved for future use.
        const LNK_OTHER = 0x00000100;
        /// The section contains comments or other information. Valid for object files only.
        const LNK_INFO = 0x00000200;
        /// The section will not become part of the image. Valid only for object files.
        const LNK_REMOVE = 0x00000800;
        /// The section contains COMDAT data. Valid only for object files.
        const LNK_COMDAT = 0x00001000;
        /// The section contains data referenced through the global pointer (GP).
        const SCN_GPREL = 0x00008000;
        /// Reserved for future use.
        const MEM_PURGEABLE = 0x00020000;
        /// Reserved for future use.
        const MEM_LOCKED = 0x00040000;
        /// Reserved for future use.
        const MEM_PRELOAD = 0x00080000;
        /// Align data on a 1-byte boundary. Valid only for object files.
        const ALIGN_1BYTES = 0x00100000;
        /// Align data on a 2-byte boundary. Valid only for object files.
        const ALIGN_2BYTES = 0x00200000;
        /// Align data on a 4-byte boundary. Valid only for object files.
        const ALIGN_4BYTES = 0x00300000;
        /// Align data on a 8-byte boundary. Valid only for object files.
        const ALIGN_8BYTES = 0x00400000;
        /// Align data on a 16-byte boundary. Valid only for object files.
        const ALIGN_16BYTES = 0x00500000;
        /// Align data on a 32-byte boundary. Valid only for object files.
        const ALIGN_32BYTES = 0x00600000;
        /// Align data on a 64-byte boundary. Valid only for object files.
        const ALIGN_64BYTES = 0x00700000;
        /// Align data on a 128-byte boundary. Valid only for object files.
        const ALIGN_127BYTES = 0x00800000;
        /// Align data on a 256-byte boundary. Valid only for object files.
        const ALIGN_256BYTES = 0x00900000;
        /// Align data on a 512-byte boundary. Valid only for object files.
        const ALIGN_512BYTES = 0x00A00000;
        /// Align data on a 1024-byte boundary. Valid only for object files.
        const ALIGN_1024BYTES = 0x00B00000;
        /// Align data on a 2048-byte boundary. Valid only for object files.
        const ALIGN_2048BYTES = 0x00C00000;
        /// Align data on a 4096-byte boundary. Valid only for object files.
        const ALIGN_4096BYTES = 0x00D00000;
        /// Align data on a 8192-byte boundary. Valid only for object files.
        const ALIGN_8192BYTES = 0x00E00000;
        /// The section contains extended relocations.
        const LNK_NRELOC_OVFL = 0x01000000;
        /// The section can be discarded as needed.
        const MEM_DISCARDABLE = 0x02000000;
        /// The section cannot be cached.
        const MEM_NOT_CACHED = 0x04000000;
        /// The section is not pageable.
        const MEM_NOT_PAGED = 0x08000000;
        /// The section can be shared in memory.
        const MEM_SHARED = 0x10000000;
        /// The section can be executed as code.
        const MEM_EXECUTE = 0x20000000;
        /// The section can be read.
        const MEM_READ = 0x40000000;
        /// The section can be written to.
        const MEM_WRITE = 0x80000000;
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SectionTableRow {
    /// An 8-byte, null-padded UTF-8 encoded string.
    pub name: [u8; 8],
    /// The total size of the section when loaded into memory.
    pub virtual_size: u32,
    /// The address of the first byte of the section relative to the image base.
    pub virtual_address: u32,
    /// The size of the initialized data on disk.
    pub size_of_raw_data: u32,
    /// The file pointer to the first page of the section within the file.
    pub pointer_to_raw_data: u32,
    /// The file pointer to the beginning of relocation entries for the section.
    pub pointer_to_relocations: u32,
    /// The file pointer to the beginning of line-number entries for the section.
    pub pointer_to_line_numbers: u32,
    /// The number of relocation entries for the section.
    pub number_of_relocaions: u16,
    /// The number of line-number entries for the section.
    pub number_of_line_numbers: u16,
    /// The flags that describe the characteristics of the section.
    pub characteristiics: SectionFlags,
}

impl SectionTableRow {
    pub const SIZE: usize = 40;
}

impl ReadData for SectionTableRow {
    fn read(reader: &mut impl crate::io::Reader) -> Result<Self> {
        Ok(Self {
            name: reader.read()?,
            virtual_size: reader.read()?,
            virtual_address: reader.read()?,
            size_of_raw_data: reader.read()?,
            pointer_to_raw_data: reader.read()?,
            pointer_to_relocations: reader.read()?,
            pointer_to_line_numbers: reader.read()?,
            number_of_relocaions: reader.read()?,
            number_of_line_numbers: reader.read()?,
            characteristiics: SectionFlags::from_bits_retain(reader.read()?),
        })
    }
}

/// Translates an RVA/size pair to a file offset via the section that contains it.
///
/// Finds the first section header with `virtual_address <= rva` and `rva +
/// size` strictly less than `virtual_address + virtual_size`, and maps `rva`
/// onto that section's on-disk position. Used only to test whether a data
/// directory's RVA lands inside some section - see
/// [`crate::pe::image::ImageFacts::has_metadata`].
pub fn translate_virtual_address(sections: &SectionTable, rva: u32, size: u32) -> Option<u64> {
    if rva == 0 {
        return None;
    }
    let section = sections.iter().find(|section| {
        section.virtual_address <= rva
            && rva.saturating_add(size) < section.virtual_address.saturating_add(section.virtual_size)
    })?;
    Some(section.pointer_to_raw_data as u64 + (rva - section.virtual_address) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::Table;

    #[test]
    fn section_table_row_is_40_bytes() {
        let buffer = [0u8; SectionTableRow::SIZE];
        let read_ptr = &mut buffer.as_slice();
        SectionTableRow::read(read_ptr).unwrap();
        assert!(read_ptr.is_empty());
    }

    fn section(virtual_address: u32, virtual_size: u32, pointer_to_raw_data: u32) -> SectionTableRow {
        SectionTableRow {
            virtual_address,
            virtual_size,
            pointer_to_raw_data,
            size_of_raw_data: virtual_size,
            ..Default::default()
        }
    }

    #[test]
    fn translates_rva_inside_a_section() {
        let sections = SectionTable(Table(vec![section(0x1000, 0x200, 0x400)]));
        assert_eq!(
            translate_virtual_address(&sections, 0x1010, 0x10),
            Some(0x410)
        );
    }

    #[test]
    fn rejects_rva_landing_exactly_at_section_end() {
        // virtual_address + size == virtual_address + virtual_size: rejected by
        // the strict `<`, even though the range would fit.
        let sections = SectionTable(Table(vec![section(0x1000, 0x200, 0x400)]));
        assert_eq!(translate_virtual_address(&sections, 0x1000, 0x200), None);
    }

    #[test]
    fn zero_rva_never_resolves() {
        let sections = SectionTable(Table(vec![section(0, 0x200, 0x400)]));
        assert_eq!(translate_virtual_address(&sections, 0, 0x10), None);
    }

    #[test]
    fn large_pointer_to_raw_data_does_not_overflow() {
        // pointer_to_raw_data near u32::MAX: the addend must widen to u64
        // before adding, not wrap in u32.
        let sections = SectionTable(Table(vec![section(0x1000, 0x200, 0xFFFF_FF00)]));
        assert_eq!(
            translate_virtual_address(&sections, 0x1010, 0x10),
            Some(0xFFFF_FF00u64 + 0x10)
        );
    }

    #[test]
    fn no_matching_section_returns_none() {
        let sections = SectionTable(Table(vec![section(0x1000, 0x200, 0x400)]));
        assert_eq!(translate_virtual_address(&sections, 0x5000, 0x10), None);
    }
}

pub mod data_directories;
mod fields;
pub use fields::*;

use crate::io::ReadData;

use self::data_directories::{DataDirectories, DataDirectoryName, ImageDataDirectory};

/// Every image file has an optional header that provides information to the loader.
/// This header is optional in the sense that some files (specifically, object files) do not
/// have it. For image files, this header is required.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct OptionalHeader {
    /// The first eight fields of the optional header are standard fields that are defined for
    /// every implementation of COFF.
    pub standard_fields: OptionalHeaderStandardFields,
    /// The next 21 fields are an extension to the COFF optional header format.
    pub windows_specific_fields: OptionalHeaderWindowsSpecific,
    /// Data directories in the current PE32/PE32+ file.
    ///
    /// Each field in the [`DataDirectories`] struct is read sequentially up to
    /// [`OptionalHeaderWindowsSpecific::number_of_rva_and_sizes`]; any directory beyond that
    /// count is left at its default (absent).
    pub data_directories: DataDirectories,
}

impl CalulateOptVariantSize<Pe32> for OptionalHeader {
    fn calculate_size() -> usize {
        OptionalHeaderStandardFields::SIZE_PE + OptionalHeaderWindowsSpecificFields::<Pe32>::SIZE
    }
}

impl CalulateOptVariantSize<Pe32Plus> for OptionalHeader {
    fn calculate_size() -> usize {
        OptionalHeaderStandardFields::SIZE_PE_PLUS
            + OptionalHeaderWindowsSpecificFields::<Pe32Plus>::SIZE
    }
}

impl OptionalHeader {
    /// The size of the Optional Header in PE32. (With zero data directories)
    pub const fn size_pe32() -> usize {
        OptionalHeaderStandardFields::SIZE_PE + OptionalHeaderWindowsSpecificFields::<Pe32>::SIZE
    }

    /// The size of the Optional Header in PE32+. (With zero data directories)
    pub const fn size_pe32_plus() -> usize {
        OptionalHeaderStandardFields::SIZE_PE_PLUS
            + OptionalHeaderWindowsSpecificFields::<Pe32Plus>::SIZE
    }

    /// The size of this Optional Header variant, including its data directories.
    pub fn size(&self) -> usize {
        match &self.windows_specific_fields {
            OptionalHeaderWindowsSpecific::PE32(_) => {
                <Self as CalulateOptVariantSize<Pe32>>::calculate_size()
            }
            OptionalHeaderWindowsSpecific::PE32Plus(_) => {
                <Self as CalulateOptVariantSize<Pe32Plus>>::calculate_size()
            }
        }
        .saturating_add(
            self.windows_specific_fields.number_of_rva_and_sizes() as usize
                * ImageDataDirectory::SIZE,
        )
    }

    /// Get the data directory, if `name`'s index is within
    /// [`OptionalHeaderWindowsSpecific::number_of_rva_and_sizes`]; the directory table beyond
    /// that count was never populated by the image and is left default.
    pub fn try_get_data_directory(&self, name: DataDirectoryName) -> Option<ImageDataDirectory> {
        (self.windows_specific_fields.number_of_rva_and_sizes() > name as u32)
            .then(|| self.data_directories.get_directory(name))
    }
}

impl ReadData for OptionalHeader {
    fn read(reader: &mut impl crate::io::Reader) -> crate::error::Result<Self> {
        let standard_fields: OptionalHeaderStandardFields = reader.read()?;
        let windows_specific_fields = match &standard_fields.magic {
            OptionalHeaderMagic::PE32 => OptionalHeaderWindowsSpecific::PE32(reader.read()?),
            OptionalHeaderMagic::PE32Plus => {
                OptionalHeaderWindowsSpecific::PE32Plus(reader.read()?)
            }
        };

        let mut data_directories = DataDirectories::default();
        for data_dir_name in DataDirectories::ALL_DATA_DIRECTORIES
            .into_iter()
            .take(windows_specific_fields.number_of_rva_and_sizes() as usize)
        {
            data_directories.set_directory(data_dir_name, reader.read()?);
        }

        Ok(Self {
            standard_fields,
            windows_specific_fields,
            data_directories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_header_pe32_round_trips() {
        let mut buffer = [0u8; OptionalHeader::size_pe32()];
        buffer[..2].copy_from_slice(&OptionalHeaderMagic::PE32.to_u16().to_le_bytes());
        let read_ptr = &mut buffer.as_slice();
        let header = OptionalHeader::read(read_ptr).unwrap();
        assert_eq!(read_ptr.len(), 0);
        assert!(header.windows_specific_fields.is_pe32());
    }

    #[test]
    fn optional_header_pe32_plus_round_trips() {
        let mut buffer = [0u8; OptionalHeader::size_pe32_plus()];
        buffer[..2].copy_from_slice(&OptionalHeaderMagic::PE32Plus.to_u16().to_le_bytes());
        let read_ptr = &mut buffer.as_slice();
        let header = OptionalHeader::read(read_ptr).unwrap();
        assert_eq!(read_ptr.len(), 0);
        assert!(header.windows_specific_fields.is_pe32_plus());
    }

    #[test]
    fn data_directory_beyond_count_is_absent() {
        let mut buffer = vec![0u8; OptionalHeader::size_pe32() + ImageDataDirectory::SIZE];
        buffer[..2].copy_from_slice(&OptionalHeaderMagic::PE32.to_u16().to_le_bytes());
        let nth_rva_offset = OptionalHeader::size_pe32() - 4;
        buffer[nth_rva_offset..nth_rva_offset + 4].copy_from_slice(&1u32.to_le_bytes());
        buffer[OptionalHeader::size_pe32()..].copy_from_slice(&0xAAAAAAAAu32.to_le_bytes()[..4]);

        let header = OptionalHeader::read(&mut buffer.as_slice()).unwrap();
        assert!(header
            .try_get_data_directory(DataDirectoryName::ExportTable)
            .is_some());
        assert!(header
            .try_get_data_directory(DataDirectoryName::ImportTable)
            .is_none());
    }
}

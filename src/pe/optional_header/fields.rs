//! Every image file has an optional header that provides information to the loader.
//! This header is optional in the sense that some files (specifically, object files) do not
//! have it. For image files, this header is required.
//!
//! Note that the size of the optional header is not fixed. The SizeOfOptionalHeader field in
//! the COFF header must be used to validate that a probe into the file for a particular data
//! directory does not go beyond SizeOfOptionalHeader.
use crate::{
    error::{self, Result},
    io::ReadData,
};
use bitflags::bitflags;

/// The optional header magic number determines whether an image is a PE32 or PE32+ executable.
///
/// The most common number is 0x10B, which identifies it as a normal executable file;
/// 0x20B identifies it as a PE32+ executable.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum OptionalHeaderMagic {
    #[default]
    PE32 = 0x10B,
    PE32Plus = 0x20B,
}

impl OptionalHeaderMagic {
    pub const SIZE: usize = 2;

    pub fn from_u16(sig: u16) -> Result<Self> {
        match sig {
            0x10B => Ok(Self::PE32),
            0x20B => Ok(Self::PE32Plus),
            _ => Err(error::Error::UnsupportedOptionalHeader { magic: sig }),
        }
    }

    pub fn to_u16(&self) -> u16 {
        match self {
            Self::PE32 => 0x10b,
            Self::PE32Plus => 0x20b,
        }
    }
}

impl ReadData for OptionalHeaderMagic {
    fn read(reader: &mut impl crate::io::Reader) -> crate::error::Result<Self> {
        Self::from_u16(reader.read()?)
    }
}

#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct OptionalHeaderStandardFields {
    /// The unsigned integer that identifies the state of the image file.
    pub magic: OptionalHeaderMagic,
    /// The linker major version number.
    pub major_linker_version: u8,
    /// The linker minor version number.
    pub minor_linker_version: u8,
    /// The size of the code (text) section, or the sum of all code sections
    /// if there are multiple sections.
    pub size_of_code: u32,
    /// The size of the initialized data section, or the sum of all such sections
    /// if there are multiple data sections.
    pub size_of_initilized_data: u32,
    /// The size of the uninitialized data section (BSS), or the sum of all such
    /// sections if there are multiple BSS sections.
    pub size_of_unitilized_data: u32,
    /// The address of the entry point relative to the image base when the
    /// executable file is loaded into memory.
    pub address_of_entry_point: u32,
    /// The address that is relative to the image base of the beginning-of-code
    /// section when it is loaded into memory.
    pub base_of_code: u32,
    /// PE32 contains this additional field, which is absent in PE32+, following BaseOfCode.
    pub base_of_data: Option<u32>,
}

impl OptionalHeaderStandardFields {
    pub const SIZE_PE: usize = 28;
    pub const SIZE_PE_PLUS: usize = 24;
}

impl ReadData for OptionalHeaderStandardFields {
    fn read(reader: &mut impl crate::io::Reader) -> crate::error::Result<Self> {
        let magic = reader.read()?;
        Ok(Self {
            magic,
            major_linker_version: reader.read()?,
            minor_linker_version: reader.read()?,
            size_of_code: reader.read()?,
            size_of_initilized_data: reader.read()?,
            size_of_unitilized_data: reader.read()?,
            address_of_entry_point: reader.read()?,
            base_of_code: reader.read()?,
            base_of_data: (magic == OptionalHeaderMagic::PE32)
                .then(|| reader.read())
                .transpose()?,
        })
    }
}

/// The following values defined for the Subsystem field of the optional header
/// determine which Windows subsystem (if any) is required to run the image.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum ImageSubsystem {
    #[default]
    /// An unknown subsystem
    Unknown = 0,
    /// Device drivers and native Windows processes
    Native = 1,
    /// The Windows graphical user interface (GUI) subsystem
    WindowsGui = 2,
    /// The Windows character subsystem
    WindowsCui = 3,
    /// The OS/2 character subsystem
    Os2Cui = 5,
    /// The Posix character subsystem
    PosixCui = 7,
    /// Native Win9x driver
    NativeWindows = 8,
    /// Windows CE
    WindowsCeGui = 9,
    /// An Extensible Firmware Interface (EFI) application
    EfiApplication = 10,
    /// An EFI driver with boot services
    EbiBootServiceDriver = 11,
    /// An EFI driver with run-time services
    EfiRuntimeDriver = 12,
    /// An EFI ROM image
    EfiRom = 13,
    /// XBOX
    Xbox = 14,
    /// Windows boot application.
    WindowsBootApplication = 15,
    /// Other
    Other(u16),
}

impl ImageSubsystem {
    pub fn to_u16(&self) -> u16 {
        match self {
            Self::Unknown => 0,
            Self::Native => 1,
            Self::WindowsGui => 2,
            Self::WindowsCui => 3,
            Self::Os2Cui => 5,
            Self::PosixCui => 7,
            Self::NativeWindows => 8,
            Self::WindowsCeGui => 9,
            Self::EfiApplication => 10,
            Self::EbiBootServiceDriver => 11,
            Self::EfiRuntimeDriver => 12,
            Self::EfiRom => 13,
            Self::Xbox => 14,
            Self::WindowsBootApplication => 15,
            Self::Other(n) => *n,
        }
    }

    pub fn from_u16(subsystem: u16) -> Self {
        match subsystem {
            0 => Self::Unknown,
            1 => Self::Native,
            2 => Self::WindowsGui,
            3 => Self::WindowsCui,
            5 => Self::Os2Cui,
            7 => Self::PosixCui,
            8 => Self::NativeWindows,
            9 => Self::WindowsCeGui,
            10 => Self::EfiApplication,
            11 => Self::EbiBootServiceDriver,
            12 => Self::EfiRuntimeDriver,
            13 => Self::EfiRom,
            14 => Self::Xbox,
            15 => Self::WindowsBootApplication,
            n => Self::Other(n),
        }
    }
}

bitflags! {
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ImageDllCharacteristics: u16 {
        /// Reserved, must be zero.
        const RESERVED = 0x01 | 0x02 | 0x04 | 0x08;
        /// Image can handle a high entropy 64-bit virtual address space.
        const HIGH_ENTROPY_VA = 0x0020;
        /// DLL can be relocated at load time.
        const DYNAMIC_BASE = 0x0040;
        /// Code Integrity checks are enforced.
        const FORCE_INTEGRITY = 0x0080;
        /// Image is NX compatible.
        const NX_COMPAT = 0x0100;
        /// Isolation aware, but do not isolate the image.
        const NO_ISOLATION = 0x0200;
        /// Does not use structured exception (SE) handling. No SE handler
        /// may be called in this image.
        const NO_SEH = 0x0400;
        /// Do not bind the image.
        const NO_BIND = 0x0800;
        /// Image must execute in an AppContainer.
        const APPCONTAINER = 0x1000;
        /// A WDM driver.
        const WDM_DRIVER = 0x2000;
        /// Image supports Control Flow Guard.
        const GUARD_CF = 0x4000;
        /// Terminal Server aware.
        const TERMINAL_SERVER_AWARE = 0x8000;
    }
}

/// Used to determine the field size in the
/// [`OptionalHeaderWindowsSpecificFields`] struct.
pub trait OptVariant {
    type Addr: ReadData + Copy;
}

/// 32bit address size for Pe32.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct Pe32;
impl OptVariant for Pe32 {
    type Addr = u32;
}

/// 64bit address size for Pe32+.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct Pe32Plus;
impl OptVariant for Pe32Plus {
    type Addr = u64;
}

pub(crate) trait CalulateOptVariantSize<A: OptVariant> {
    fn calculate_size() -> usize;
}

/// These 21 fields are an extension to the COFF optional header format.
/// They contain additional information that is required by the linker and loader in Windows.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct OptionalHeaderWindowsSpecificFields<A: OptVariant> {
    /// The preferred address of the first byte of image when loaded into memory.
    pub image_base: A::Addr,
    /// The alignment (in bytes) of sections when they are loaded into memory.
    pub section_alignment: u32,
    /// The alignment factor (in bytes) that is used to align the raw data of sections
    /// in the image file.
    pub file_alignment: u32,
    /// The major version number of the required operating system.
    pub major_operating_system_version: u16,
    /// The minor version number of the required operating system.
    pub minor_operating_system_version: u16,
    /// The major version number of the image.
    pub major_image_version: u16,
    /// The minor version number of the image.
    pub minor_image_version: u16,
    /// The major version number of the subsystem.
    pub major_subsystem_version: u16,
    /// The minor version number of the subsystem.
    pub minor_subsystem_version: u16,
    /// Reserved, must be zero.
    pub win32_version_value: u32,
    /// The size (in bytes) of the image, including all headers,
    /// as the image is loaded in memory. It must be a multiple of SectionAlignment.
    pub size_of_image: u32,
    /// The combined size of an MS-DOS stub, PE header, and section headers rounded
    /// up to a multiple of FileAlignment.
    pub size_of_headers: u32,
    /// The image file checksum, at a fixed offset within the optional header
    /// regardless of variant - see [`crate::pe::hashrange`].
    pub check_sum: u32,
    /// The subsystem that is required to run this image.
    pub subsystem: ImageSubsystem,
    /// For more information, see [`ImageDllCharacteristics`].
    pub dll_characteristics: ImageDllCharacteristics,
    /// The size of the stack to reserve.
    pub size_of_stack_reserve: A::Addr,
    /// The size of the stack to commit.
    pub size_of_stack_commit: A::Addr,
    /// The size of the local heap space to reserve.
    pub size_of_heap_reserve: A::Addr,
    /// The size of the local heap space to commit.
    pub size_of_heap_commit: A::Addr,
    /// Reserved, must be zero.
    pub loader_flags: u32,
    /// The number of data-directory entries in the remainder of the optional header.
    pub number_of_rva_and_sizes: u32,
}

impl OptionalHeaderWindowsSpecificFields<Pe32> {
    pub const SIZE: usize = 68;
}

impl OptionalHeaderWindowsSpecificFields<Pe32Plus> {
    pub const SIZE: usize = 88;
}

impl CalulateOptVariantSize<Pe32> for OptionalHeaderWindowsSpecificFields<Pe32> {
    fn calculate_size() -> usize {
        Self::SIZE
    }
}

impl CalulateOptVariantSize<Pe32Plus> for OptionalHeaderWindowsSpecificFields<Pe32Plus> {
    fn calculate_size() -> usize {
        Self::SIZE
    }
}

impl<T: OptVariant> ReadData for OptionalHeaderWindowsSpecificFields<T> {
    fn read(reader: &mut impl crate::io::Reader) -> crate::error::Result<Self> {
        Ok(Self {
            image_base: reader.read()?,
            section_alignment: reader.read()?,
            file_alignment: reader.read()?,
            major_operating_system_version: reader.read()?,
            minor_operating_system_version: reader.read()?,
            major_image_version: reader.read()?,
            minor_image_version: reader.read()?,
            major_subsystem_version: reader.read()?,
            minor_subsystem_version: reader.read()?,
            win32_version_value: reader.read()?,
            size_of_image: reader.read()?,
            size_of_headers: reader.read()?,
            check_sum: reader.read()?,
            subsystem: ImageSubsystem::from_u16(reader.read()?),
            dll_characteristics: ImageDllCharacteristics::from_bits_retain(reader.read()?),
            size_of_stack_reserve: reader.read()?,
            size_of_stack_commit: reader.read()?,
            size_of_heap_reserve: reader.read()?,
            size_of_heap_commit: reader.read()?,
            loader_flags: reader.read()?,
            number_of_rva_and_sizes: reader.read()?,
        })
    }
}

/// Holds the Optional Header Windows Specific fields
/// for either PE32 or PE32+.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionalHeaderWindowsSpecific {
    PE32(OptionalHeaderWindowsSpecificFields<Pe32>),
    PE32Plus(OptionalHeaderWindowsSpecificFields<Pe32Plus>),
}

impl Default for OptionalHeaderWindowsSpecific {
    fn default() -> Self {
        Self::PE32(Default::default())
    }
}

impl OptionalHeaderWindowsSpecific {
    /// Returns true if the enum variant is
    /// [PE32](OptionalHeaderWindowsSpecific::PE32)
    pub fn is_pe32(&self) -> bool {
        matches!(self, Self::PE32(_))
    }

    /// Returns true if the enum variant is
    /// [PE32Plus](OptionalHeaderWindowsSpecific::PE32Plus)
    pub fn is_pe32_plus(&self) -> bool {
        matches!(self, Self::PE32Plus(_))
    }

    /// gets [image_base](OptionalHeaderWindowsSpecificFields::image_base)
    /// from the underlying variant.
    #[inline]
    pub fn image_base(&self) -> u64 {
        match self {
            Self::PE32(pe32) => pe32.image_base as u64,
            Self::PE32Plus(pe32) => pe32.image_base,
        }
    }

    /// gets [size_of_image](OptionalHeaderWindowsSpecificFields::size_of_image)
    /// from the underlying variant.
    #[inline]
    pub fn size_of_image(&self) -> u32 {
        match self {
            Self::PE32(pe32) => pe32.size_of_image,
            Self::PE32Plus(pe32) => pe32.size_of_image,
        }
    }

    /// gets [size_of_headers](OptionalHeaderWindowsSpecificFields::size_of_headers)
    /// from the underlying variant.
    #[inline]
    pub fn size_of_headers(&self) -> u32 {
        match self {
            Self::PE32(pe32) => pe32.size_of_headers,
            Self::PE32Plus(pe32) => pe32.size_of_headers,
        }
    }

    /// gets [check_sum](OptionalHeaderWindowsSpecificFields::check_sum)
    /// from the underlying variant.
    #[inline]
    pub fn check_sum(&self) -> u32 {
        match self {
            Self::PE32(pe32) => pe32.check_sum,
            Self::PE32Plus(pe32) => pe32.check_sum,
        }
    }

    /// gets [subsystem](OptionalHeaderWindowsSpecificFields::subsystem)
    /// from the underlying variant.
    #[inline]
    pub fn subsystem(&self) -> ImageSubsystem {
        match self {
            Self::PE32(pe32) => pe32.subsystem,
            Self::PE32Plus(pe32) => pe32.subsystem,
        }
    }

    /// gets [dll_characteristics](OptionalHeaderWindowsSpecificFields::dll_characteristics)
    /// from the underlying variant.
    #[inline]
    pub fn dll_characteristics(&self) -> ImageDllCharacteristics {
        match self {
            Self::PE32(pe32) => pe32.dll_characteristics,
            Self::PE32Plus(pe32) => pe32.dll_characteristics,
        }
    }

    /// gets [number_of_rva_and_sizes](OptionalHeaderWindowsSpecificFields::number_of_rva_and_sizes)
    /// from the underlying variant.
    #[inline]
    pub fn number_of_rva_and_sizes(&self) -> u32 {
        match self {
            Self::PE32(pe32) => pe32.number_of_rva_and_sizes,
            Self::PE32Plus(pe32) => pe32.number_of_rva_and_sizes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opttional_header_magic_is_2_bytes() {
        let buffer: [u8; OptionalHeaderMagic::SIZE] = 0x10B_u16.to_le_bytes();
        let read_ptr = &mut buffer.as_slice();
        OptionalHeaderMagic::read(read_ptr).unwrap();
        assert!(read_ptr.is_empty());
    }

    #[test]
    fn read_optional_header_magic() {
        assert_eq!(
            OptionalHeaderMagic::read(&mut [0x0B, 0x1u8].as_slice()).unwrap(),
            OptionalHeaderMagic::PE32
        );
        assert_eq!(
            OptionalHeaderMagic::read(&mut [0x0B, 0x2u8].as_slice()).unwrap(),
            OptionalHeaderMagic::PE32Plus
        );
    }

    #[test]
    fn unsupported_magic_is_rejected() {
        assert!(OptionalHeaderMagic::read(&mut [0xAD, 0xDEu8].as_slice()).is_err());
    }

    #[test]
    fn optional_header_standard_fields_pe_is_28() {
        let mut buffer = [0u8; OptionalHeaderStandardFields::SIZE_PE];
        buffer[..2].copy_from_slice(&OptionalHeaderMagic::PE32.to_u16().to_le_bytes());
        let read_ptr = &mut buffer.as_slice();
        OptionalHeaderStandardFields::read(read_ptr).unwrap();
        assert_eq!(read_ptr.len(), 0);
    }

    #[test]
    fn optional_header_standard_fields_pe32_plus_is_24_bytes() {
        let mut buffer = [0u8; OptionalHeaderStandardFields::SIZE_PE_PLUS];
        buffer[..2].copy_from_slice(&OptionalHeaderMagic::PE32Plus.to_u16().to_le_bytes());
        let read_ptr = &mut buffer.as_slice();
        OptionalHeaderStandardFields::read(read_ptr).unwrap();
        assert_eq!(read_ptr.len(), 0);
    }

    #[test]
    fn optional_header_win_specific_pe32_is_68() {
        let buffer = [0u8; OptionalHeaderWindowsSpecificFields::<Pe32>::SIZE];
        let read_ptr = &mut buffer.as_slice();
        OptionalHeaderWindowsSpecificFields::<Pe32>::read(read_ptr).unwrap();
        assert_eq!(read_ptr.len(), 0);
    }

    #[test]
    fn optional_header_win_specific_pe32_plus_is_88() {
        let buffer = [0u8; OptionalHeaderWindowsSpecificFields::<Pe32Plus>::SIZE];
        let read_ptr = &mut buffer.as_slice();
        OptionalHeaderWindowsSpecificFields::<Pe32Plus>::read(read_ptr).unwrap();
        assert_eq!(read_ptr.len(), 0);
    }
}

//! The facade: walks a PE image end to end and emits [`ImageFacts`].
//!
//! [`parse`] is the only entry point most callers need. It drives the
//! structural parser (`dos` → `coff` → `optional_header` → `sections`)
//! exactly once, computes the Authenticode hash-range plan alongside it, and
//! optionally extracts the attached code-signing blob - all from a single
//! borrowed byte slice, with no intermediate allocation beyond what the
//! certificate blob itself needs.

use crate::error::{self, Result};
use crate::io::stream::ByteCursor;
use crate::io::{ReadData, Reader};
use crate::pe::coff::{CoffFileHeader, ImageFileCharacteristics, ImageFileMachine};
use crate::pe::dos::ImageDosHeader;
use crate::pe::hashrange;
use crate::pe::optional_header::data_directories::DataDirectoryName;
use crate::pe::optional_header::{ImageDllCharacteristics, ImageSubsystem, OptionalHeader};
use crate::pe::options::Mode;
use crate::pe::sections::certificate::Certificate;
use crate::pe::sections::{translate_virtual_address, SectionTable};
use crate::pe::NT_SIGNATURE;
use crate::rangeplan::{HashRangePlan, StreamRange};

/// Everything this crate knows about one PE image once [`parse`] returns.
///
/// Immutable, owns its own buffers (the signature blob is copied out of the
/// input), and carries no borrow of the slice it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFacts {
    pub machine: ImageFileMachine,
    pub characteristics: ImageFileCharacteristics,
    pub subsystem: ImageSubsystem,
    pub dll_characteristics: ImageDllCharacteristics,
    /// True iff a non-empty, in-bounds Certificate Table directory exists.
    pub has_signature: bool,
    /// The PKCS#7 `SignedData` blob attached to the first WIN_CERTIFICATE
    /// entry, present only when [`Mode::READ_CODE_SIGNATURE`] was requested
    /// and `has_signature` is true.
    pub cms_signature_blob: Option<Vec<u8>>,
    /// True iff the COM Descriptor directory resolves to a non-zero file
    /// offset via section translation.
    pub has_metadata: bool,
    /// On-stream position and length of the 8-byte Certificate Table
    /// directory slot itself (excluded from the hash range).
    pub security_data_directory_range: StreamRange,
    pub hash_range_plan: HashRangePlan,
    pub entry_point: u32,
    pub image_base: u64,
    pub size_of_image: u32,
    pub number_of_sections: u16,
    pub timestamp: u32,
}

/// True iff the DOS and NT magics match, without any further parsing.
/// Never panics - a too-short or malformed slice yields `false`.
pub fn is_pe(data: &[u8]) -> bool {
    probe_signatures(data).is_ok()
}

fn probe_signatures(data: &[u8]) -> Result<()> {
    if data.len() < ImageDosHeader::SIZE {
        return Err(error::Error::truncated(ImageDosHeader::SIZE, data.len()));
    }
    let dos_header: ImageDosHeader = ReadData::read(&mut &data[..ImageDosHeader::SIZE])?;
    if dos_header.e_magic != ImageDosHeader::MAGIC_CONSTANT {
        return Err(error::Error::not_pe("DOS magic mismatch"));
    }
    let mut cursor = ByteCursor::new(data);
    cursor.seek(dos_header.e_lfanew as usize);
    let nt_signature: [u8; 4] = cursor.read()?;
    if nt_signature != NT_SIGNATURE {
        return Err(error::Error::not_pe("NT signature mismatch"));
    }
    Ok(())
}

/// Parses `data` as a PE image and returns the facts Authenticode cares
/// about. Side-effect-free on success; fails with a typed [`error::Error`]
/// and no partial result on any short read or structural mismatch.
pub fn parse(data: &[u8], mode: Mode) -> Result<ImageFacts> {
    let file_length = data.len() as u64;
    let mut cursor = ByteCursor::new(data);

    if data.len() < ImageDosHeader::SIZE {
        return Err(error::Error::truncated(ImageDosHeader::SIZE, data.len()));
    }
    let dos_header: ImageDosHeader = cursor.read()?;
    if dos_header.e_magic != ImageDosHeader::MAGIC_CONSTANT {
        return Err(error::Error::not_pe("DOS magic mismatch"));
    }

    cursor.seek(dos_header.e_lfanew as usize);
    let nt_signature: [u8; 4] = cursor.read()?;
    if nt_signature != NT_SIGNATURE {
        return Err(error::Error::not_pe("NT signature mismatch"));
    }

    let file_header: CoffFileHeader = cursor.read()?;

    let optional_header_start = cursor.position() as u64;
    let optional_header_magic_pos = optional_header_start as usize;
    if data.len() < optional_header_magic_pos + 2 {
        return Err(error::Error::truncated(
            2,
            data.len().saturating_sub(optional_header_magic_pos),
        ));
    }
    let magic = u16::from_le_bytes([
        data[optional_header_magic_pos],
        data[optional_header_magic_pos + 1],
    ]);
    let is_pe32_plus = match magic {
        0x010B => false,
        0x020B => true,
        other => return Err(error::Error::UnsupportedOptionalHeader { magic: other }),
    };

    let check_sum_range = StreamRange::new(optional_header_start + 64, 4);
    let directories_start = optional_header_start
        + if is_pe32_plus {
            OptionalHeader::size_pe32_plus() as u64
        } else {
            OptionalHeader::size_pe32() as u64
        };
    let security_idd_range = StreamRange::new(
        directories_start + DataDirectoryName::CertificateTable as u64 * 8,
        8,
    );

    let optional_header: OptionalHeader = cursor.read()?;

    let sections = SectionTable::new_linear(&mut cursor, file_header.number_of_sections as usize)?;

    let certificate_table = optional_header
        .try_get_data_directory(DataDirectoryName::CertificateTable)
        .unwrap_or_default();
    let clr_runtime_header = optional_header
        .try_get_data_directory(DataDirectoryName::ClrRuntimeHeader)
        .unwrap_or_default();

    let hash_range_plan = hashrange::plan(
        optional_header.windows_specific_fields.size_of_headers() as u64,
        file_length,
        check_sum_range,
        security_idd_range,
        &sections,
        certificate_table,
    );
    let has_signature = hashrange::has_signature(certificate_table, file_length);

    let cms_signature_blob = if has_signature && mode.contains(Mode::READ_CODE_SIGNATURE) {
        let mut cert_cursor = ByteCursor::new(data);
        cert_cursor.seek(certificate_table.virtual_address as usize);
        let certificate: Certificate = cert_cursor.read()?;
        Some(certificate.certificate)
    } else {
        None
    };

    let has_metadata = translate_virtual_address(
        &sections,
        clr_runtime_header.virtual_address,
        clr_runtime_header.size,
    )
    .is_some();

    Ok(ImageFacts {
        machine: file_header.machine,
        characteristics: file_header.characteristics,
        subsystem: optional_header.windows_specific_fields.subsystem(),
        dll_characteristics: optional_header.windows_specific_fields.dll_characteristics(),
        has_signature,
        cms_signature_blob,
        has_metadata,
        security_data_directory_range: security_idd_range,
        hash_range_plan,
        entry_point: optional_header.standard_fields.address_of_entry_point,
        image_base: optional_header.windows_specific_fields.image_base(),
        size_of_image: optional_header.windows_specific_fields.size_of_image(),
        number_of_sections: file_header.number_of_sections,
        timestamp: file_header.date_time_stamp,
    })
}

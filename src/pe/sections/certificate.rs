//! The Attribute Certificate Table (Image Only).
//!
//! Only the first WIN_CERTIFICATE entry is surfaced - chained entries beyond
//! it are not a concern of this crate (see the Non-goals this was carved
//! down from: no signature verification, no certificate-chain walking).
use crate::error::{self, Result};
use crate::io::ReadData;

/// The fixed 8-byte WIN_CERTIFICATE header: `dwLength`, `wRevision`,
/// `wCertificateType`, followed by `dwLength - 8` bytes of certificate data.
const WIN_CERTIFICATE_HEADER_SIZE: u32 = 8;

/// Version numbers defined for the `wRevision` field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum CertificateRevision {
    Revision1_0 = 0x0100,
    Revision2_0 = 0x0200,
    Other(u16),
}

impl CertificateRevision {
    pub fn from_u16(val: u16) -> Self {
        match val {
            0x0100 => Self::Revision1_0,
            0x0200 => Self::Revision2_0,
            other => Self::Other(other),
        }
    }
}

impl Default for CertificateRevision {
    fn default() -> Self {
        Self::Other(0)
    }
}

/// Values defined for the `wCertificateType` field. Only
/// [`Self::PkcsSignedData`] is a supported Authenticode signature; anything
/// else fails with [`error::Error::UnsupportedCertType`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum CertificateType {
    X509 = 0x0001,
    PkcsSignedData = 0x0002,
    Reserved1 = 0x0003,
    TsStackSigned = 0x0004,
    Other(u16),
}

impl CertificateType {
    pub fn from_u16(val: u16) -> Self {
        match val {
            0x0001 => Self::X509,
            0x0002 => Self::PkcsSignedData,
            0x0003 => Self::Reserved1,
            0x0004 => Self::TsStackSigned,
            other => Self::Other(other),
        }
    }

    fn to_u16(self) -> u16 {
        match self {
            Self::X509 => 0x0001,
            Self::PkcsSignedData => 0x0002,
            Self::Reserved1 => 0x0003,
            Self::TsStackSigned => 0x0004,
            Self::Other(n) => n,
        }
    }
}

/// The first WIN_CERTIFICATE entry in the Certificate Table, with its
/// `certificate` field - a DER-encoded PKCS#7 `SignedData` blob for
/// Authenticode - extracted verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Certificate {
    /// The length, in bytes, of this entry including the 8-byte header.
    pub length: u32,
    pub revision: CertificateRevision,
    pub certificate_type: CertificateType,
    /// The CMS/PKCS#7 signature blob: `length - 8` bytes.
    pub certificate: Vec<u8>,
}

impl ReadData for Certificate {
    fn read(reader: &mut impl crate::io::Reader) -> Result<Self> {
        let length: u32 = reader.read()?;
        let revision = CertificateRevision::from_u16(reader.read()?);
        let certificate_type_raw: u16 = reader.read()?;
        let certificate_type = CertificateType::from_u16(certificate_type_raw);

        if certificate_type.to_u16() != CertificateType::PkcsSignedData.to_u16() {
            return Err(error::Error::UnsupportedCertType {
                certificate_type: certificate_type_raw,
            });
        }

        let blob_len = length.saturating_sub(WIN_CERTIFICATE_HEADER_SIZE) as usize;
        let certificate = reader.read_slice(blob_len)?.to_vec();

        Ok(Self {
            length,
            revision,
            certificate_type,
            certificate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(certificate_type: u16, blob: &[u8]) -> Vec<u8> {
        let length = (WIN_CERTIFICATE_HEADER_SIZE as usize + blob.len()) as u32;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&length.to_le_bytes());
        bytes.extend_from_slice(&0x0200u16.to_le_bytes());
        bytes.extend_from_slice(&certificate_type.to_le_bytes());
        bytes.extend_from_slice(blob);
        bytes
    }

    #[test]
    fn reads_pkcs_signed_data_certificate() {
        let blob = [0xAAu8; 16];
        let bytes = encode(0x0002, &blob);
        let cert = Certificate::read(&mut bytes.as_slice()).unwrap();
        assert_eq!(cert.certificate_type, CertificateType::PkcsSignedData);
        assert_eq!(cert.revision, CertificateRevision::Revision2_0);
        assert_eq!(cert.certificate, blob);
    }

    #[test]
    fn rejects_non_pkcs_certificate_type() {
        let bytes = encode(0x0001, &[0u8; 4]);
        let err = Certificate::read(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            error::Error::UnsupportedCertType {
                certificate_type: 0x0001
            }
        ));
    }
}

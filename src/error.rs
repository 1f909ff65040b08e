use snafu::Snafu;

/// Crate-wide result alias.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Everything that can go wrong while parsing a PE image or planning its
/// Authenticode hash ranges.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// DOS or NT signature did not match; this is not a PE image.
    #[snafu(display("not a PE image: {reason}"))]
    NotPe { reason: &'static str },

    /// Fewer bytes remained than a read required.
    #[snafu(display("truncated: needed {needed} bytes, only {available} available"))]
    Truncated { needed: usize, available: usize },

    /// Optional header magic was neither `0x010B` (PE32) nor `0x020B` (PE32+).
    #[snafu(display("unsupported optional header magic {magic:#06x}"))]
    UnsupportedOptionalHeader { magic: u16 },

    /// The first WIN_CERTIFICATE entry was not `WIN_CERT_TYPE_PKCS_SIGNED_DATA`.
    #[snafu(display(
        "unsupported certificate type {certificate_type:#06x}, expected PKCS_SIGNED_DATA (0x0002)"
    ))]
    UnsupportedCertType { certificate_type: u16 },
}

impl Error {
    #[cold]
    pub(crate) fn truncated(needed: usize, available: usize) -> Self {
        Self::Truncated { needed, available }
    }

    #[cold]
    pub(crate) fn not_pe(reason: &'static str) -> Self {
        Self::NotPe { reason }
    }
}

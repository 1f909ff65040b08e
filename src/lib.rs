//! Authenticode code-signing extraction and PE hash-range planning.
//!
//! This crate parses the structural parts of a Portable Executable image
//! that matter for Microsoft's Authenticode scheme, and reproduces the
//! exact byte ranges a signer's "PE hash" is computed over. It does not
//! compute the digest itself, parse the PKCS#7 blob it extracts, or write
//! PE images back out — see [`pe::image`] for the one entry point that
//! matters, [`Mode`] for its configuration, and [`ImageFacts`] for what it
//! returns.

pub mod containers;
pub mod error;
pub mod io;
pub mod pe;
pub mod rangeplan;

pub use error::{Error, Result};
pub use pe::image::{is_pe, parse, ImageFacts};
pub use pe::options::Mode;

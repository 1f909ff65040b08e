use bitflags::bitflags;

bitflags! {
    /// Controls which optional, more expensive stages [`crate::pe::image::parse`] runs.
    ///
    /// The structural parse (DOS header through section table, and the
    /// hash-range plan derived from it) always happens; these flags gate the
    /// steps that require chasing a data directory beyond what the plan
    /// itself needs.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Mode: u32 {
        /// Only the hash-range plan and the structural facts needed to build it.
        const DEFAULT = 0;
        /// Also locate and extract the Authenticode signature blob from the
        /// Certificate Table directory, if present.
        const READ_CODE_SIGNATURE = 1 << 0;
    }
}

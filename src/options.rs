//! Read-side configuration.
//!
//! Real-world TIFF files disagree on strictness needs: vendor writers emit
//! tags with off-spec field types and the occasional duplicated entry. The
//! leniency policy is therefore a caller choice rather than hardcoded.

/// How the parser treats recoverable structural violations.
///
/// Leniency never extends to data that cannot be trusted at all: truncation,
/// corrupt compressed streams, and cyclic directory chains are hard errors in
/// both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Reject duplicate tags and registry type mismatches.
    #[default]
    Strict,
    /// Keep the first occurrence of a duplicated tag, accept off-registry
    /// field types, and emit `tracing` warnings instead of failing.
    Lenient,
}

/// Options governing a read pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Structural leniency policy.
    pub strictness: Strictness,
}

impl ReadOptions {
    /// Strict options (the default).
    pub fn strict() -> Self {
        ReadOptions {
            strictness: Strictness::Strict,
        }
    }

    /// Lenient options: downgrade duplicate tags and registry type
    /// mismatches to warnings.
    pub fn lenient() -> Self {
        ReadOptions {
            strictness: Strictness::Lenient,
        }
    }

    /// Whether recoverable violations should fail the parse.
    pub fn is_strict(&self) -> bool {
        self.strictness == Strictness::Strict
    }
}

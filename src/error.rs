//! Error types for catalog binning.

use thiserror::Error;

/// Failures raised by the binning core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A bin specification with no bins or an empty/inverted range.
    #[error("invalid bin spec: {bins} bins over [{low}, {high})")]
    InvalidBinSpec { bins: usize, low: f64, high: f64 },

    /// Redshift weights sum to zero (or the catalog is empty), so no PDF exists.
    #[error("redshift weights sum to {sum}; cannot normalize probability density")]
    EmptyWeightSum { sum: f64 },

    /// Redshift weights contain NaN or infinities, or overflow when summed.
    #[error("redshift weights sum to a non-finite value ({sum})")]
    NonFiniteWeightSum { sum: f64 },

    /// The angular grid of the occupancy mask differs from the binning handed
    /// to the sparse builder.
    #[error("misaligned {axis} binning: occupancy uses {expected} bins, sparse histogram got {found}")]
    MisalignedBinning {
        axis: &'static str,
        expected: usize,
        found: usize,
    },

    /// Parallel catalog columns differ in length.
    #[error("catalog column `{column}` has {found} entries, expected {expected}")]
    CatalogLength {
        column: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Result alias for the binning core.
pub type Result<T> = std::result::Result<T, Error>;

//! Normalized redshift probability histogram of the random catalog.

use tracing::debug;

use crate::binning::BinSpec;
use crate::catalog::CatalogView;
use crate::error::{Error, Result};
use crate::output::{ColumnData, Table};

/// Redshift PDF: one row per z bin, `(low_edges[i], probability[i])`.
///
/// Weights are normalized by their sum before binning, so the probabilities
/// add to one when every point falls inside the z range. The upper edge of
/// the last bin is not stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RedshiftPdf {
    pub low_edges: Vec<f64>,
    pub probability: Vec<f32>,
}

impl RedshiftPdf {
    pub fn len(&self) -> usize {
        self.probability.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probability.is_empty()
    }

    /// Sum of all bin probabilities.
    pub fn total(&self) -> f64 {
        self.probability.iter().map(|&p| p as f64).sum()
    }

    /// `pdfZ` table tagged with the random catalog's files.
    pub fn to_table<S: AsRef<str>>(&self, source_files: &[S]) -> Table {
        Table::new("pdfZ")
            .with_column("lowEdge", ColumnData::F64(self.low_edges.clone()))
            .with_column("probability", ColumnData::F32(self.probability.clone()))
            .with_comment("Redshift probability histogram.")
            .with_provenance(source_files)
    }
}

/// Build the redshift PDF from `weight_z` of `catalog`.
///
/// Fails with [`Error::EmptyWeightSum`] when the weights sum to zero (which
/// includes an empty catalog) and with [`Error::NonFiniteWeightSum`] when
/// the sum is NaN or infinite.
pub fn redshift_pdf<C: CatalogView + ?Sized>(catalog: &C, z_spec: &BinSpec) -> Result<RedshiftPdf> {
    let binner = z_spec.binner()?;
    let weights = catalog.weight_z();
    let sum: f64 = weights.iter().sum();
    if !sum.is_finite() {
        return Err(Error::NonFiniteWeightSum { sum });
    }
    if sum == 0.0 {
        return Err(Error::EmptyWeightSum { sum });
    }

    let mut freq = vec![0.0f64; binner.bins()];
    let mut dropped = 0usize;
    for (&z, &w) in catalog.z().iter().zip(weights) {
        match binner.index(z) {
            Some(i) => freq[i] += w / sum,
            None => dropped += 1,
        }
    }
    debug!(
        "Redshift PDF: {} points, {} outside z range, weight sum {}",
        catalog.len(),
        dropped,
        sum
    );

    let edges = binner.edges();
    Ok(RedshiftPdf {
        low_edges: edges[..binner.bins()].to_vec(),
        probability: freq.into_iter().map(|p| p as f32).collect(),
    })
}

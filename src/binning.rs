//! One-dimensional uniform binning.
//!
//! A [`BinSpec`] describes `bins` equal-width bins covering `[low, high]`.
//! Bin `i` covers `[edge[i], edge[i+1])`, except the last bin which also
//! includes `high`. Values outside the range (and NaN) fall in no bin and are
//! dropped by every histogram built on top of this module.

use crate::error::{Error, Result};

/// Number of bins and numeric range of a uniform binning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinSpec {
    pub bins: usize,
    pub low: f64,
    pub high: f64,
}

impl BinSpec {
    /// Create a validated bin spec.
    pub fn new(bins: usize, low: f64, high: f64) -> Result<Self> {
        let spec = Self { bins, low, high };
        spec.validate()?;
        Ok(spec)
    }

    /// Check `bins >= 1` and `low < high` (both finite).
    pub fn validate(&self) -> Result<()> {
        let range_ok = self.low.is_finite() && self.high.is_finite() && self.low < self.high;
        if self.bins < 1 || !range_ok {
            return Err(Error::InvalidBinSpec {
                bins: self.bins,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }

    /// Width of a single bin.
    pub fn width(&self) -> f64 {
        (self.high - self.low) / self.bins as f64
    }

    /// The `bins + 1` evenly spaced edges from `low` to `high` inclusive.
    pub fn edges(&self) -> Result<Vec<f64>> {
        self.validate()?;
        let step = self.width();
        let mut edges: Vec<f64> = (0..=self.bins)
            .map(|i| self.low + i as f64 * step)
            .collect();
        // Pin the upper edge so the closed last bin ends exactly at `high`.
        edges[self.bins] = self.high;
        Ok(edges)
    }

    /// Bin centers, one per bin.
    pub fn centers(&self) -> Result<Vec<f64>> {
        Ok(centers(&self.edges()?))
    }

    /// Precompute edges for repeated bin lookups.
    pub fn binner(&self) -> Result<Binner> {
        Ok(Binner {
            spec: *self,
            edges: self.edges()?,
        })
    }
}

/// Midpoints of each consecutive pair of edges.
pub fn centers(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
}

/// Bin index of `value` under `spec`, or `None` when the value lies outside
/// every bin.
pub fn bin_index(value: f64, spec: &BinSpec) -> Result<Option<usize>> {
    Ok(spec.binner()?.index(value))
}

/// A validated [`BinSpec`] with its edges cached.
///
/// Index assignment first estimates the bin arithmetically, then corrects the
/// estimate against the stored edges so that values sitting exactly on an
/// edge land in the same bin a histogram over those edges would choose.
#[derive(Debug, Clone)]
pub struct Binner {
    spec: BinSpec,
    edges: Vec<f64>,
}

impl Binner {
    pub fn bins(&self) -> usize {
        self.spec.bins
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Bin containing `value`, or `None` if it is out of range or NaN.
    #[inline]
    pub fn index(&self, value: f64) -> Option<usize> {
        let BinSpec { bins, low, high } = self.spec;
        // Also rejects NaN.
        if !(value >= low && value <= high) {
            return None;
        }
        let norm = bins as f64 / (high - low);
        let mut idx = (((value - low) * norm) as usize).min(bins - 1);
        if idx > 0 && value < self.edges[idx] {
            idx -= 1;
        } else if idx + 1 < bins && value >= self.edges[idx + 1] {
            idx += 1;
        }
        Some(idx)
    }
}

//! Read-only point catalogs consumed by the histogram builders.
//!
//! How catalogs are read from disk (file formats, chunking, RA shifting) is
//! up to the caller; the builders only see parallel columns through
//! [`CatalogView`].

use std::path::Path;

use crate::error::{Error, Result};

/// Parallel per-point columns of a random or observed catalog.
///
/// All slices returned by one view have the same length.
pub trait CatalogView {
    /// Right ascension of each point.
    fn ra(&self) -> &[f64];
    /// Declination of each point.
    fn dec(&self) -> &[f64];
    /// Redshift of each point.
    fn z(&self) -> &[f64];
    /// Full weight, used for angle-and-redshift quantities.
    fn weight(&self) -> &[f64];
    /// Redshift-independent weight, used for angular-only quantities.
    fn weight_no_z(&self) -> &[f64];
    /// Angle-independent weight, used for the redshift PDF.
    fn weight_z(&self) -> &[f64];
    /// Files the catalog was read from, recorded as provenance.
    fn source_files(&self) -> &[String];

    fn len(&self) -> usize {
        self.ra().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned in-memory catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    ra: Vec<f64>,
    dec: Vec<f64>,
    z: Vec<f64>,
    weight: Vec<f64>,
    weight_no_z: Vec<f64>,
    weight_z: Vec<f64>,
    source_files: Vec<String>,
}

impl Catalog {
    /// Build a catalog from its columns, checking that they are parallel.
    pub fn new(
        ra: Vec<f64>,
        dec: Vec<f64>,
        z: Vec<f64>,
        weight: Vec<f64>,
        weight_no_z: Vec<f64>,
        weight_z: Vec<f64>,
    ) -> Result<Self> {
        let expected = ra.len();
        let columns: [(&'static str, usize); 5] = [
            ("dec", dec.len()),
            ("z", z.len()),
            ("weight", weight.len()),
            ("weight_no_z", weight_no_z.len()),
            ("weight_z", weight_z.len()),
        ];
        for (column, found) in columns {
            if found != expected {
                return Err(Error::CatalogLength {
                    column,
                    expected,
                    found,
                });
            }
        }
        Ok(Self {
            ra,
            dec,
            z,
            weight,
            weight_no_z,
            weight_z,
            source_files: Vec::new(),
        })
    }

    /// Build a catalog where all three weight columns equal `weight`.
    pub fn with_uniform_weights(
        ra: Vec<f64>,
        dec: Vec<f64>,
        z: Vec<f64>,
        weight: Vec<f64>,
    ) -> Result<Self> {
        Self::new(ra, dec, z, weight.clone(), weight.clone(), weight)
    }

    /// Record the files this catalog was read from.
    pub fn with_source_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_files = files.into_iter().map(Into::into).collect();
        self
    }
}

impl CatalogView for Catalog {
    fn ra(&self) -> &[f64] {
        &self.ra
    }
    fn dec(&self) -> &[f64] {
        &self.dec
    }
    fn z(&self) -> &[f64] {
        &self.z
    }
    fn weight(&self) -> &[f64] {
        &self.weight
    }
    fn weight_no_z(&self) -> &[f64] {
        &self.weight_no_z
    }
    fn weight_z(&self) -> &[f64] {
        &self.weight_z
    }
    fn source_files(&self) -> &[String] {
        &self.source_files
    }
}

/// Final path component of `path`, falling back to the whole string.
pub fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

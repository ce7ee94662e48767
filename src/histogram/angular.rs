//! Masked (ra, dec) occupancy of the random and observed catalogs.
//!
//! Both catalogs are histogrammed on the same dense `n_ra x n_dec` grid. A
//! cell is kept when either histogram is positive there, and kept cells are
//! listed ra-major: row order follows the aligned index
//! `n_dec * bin_ra + bin_dec`, ascending. The sparse angle-redshift
//! histogram refers back to cells by their row in this list.

use nalgebra::DMatrix;
use tracing::debug;

use crate::binning::{BinSpec, Binner};
use crate::catalog::CatalogView;
use crate::error::Result;
use crate::output::{ColumnData, Table};

/// Flatten an angular cell into its aligned index.
#[inline]
pub fn aligned_index(n_dec: usize, bin_ra: usize, bin_dec: usize) -> usize {
    n_dec * bin_ra + bin_dec
}

/// Dense weighted 2D histogram; rows are ra bins, columns dec bins.
///
/// Points outside either range are dropped.
pub fn weighted_histogram_2d(
    ra: &[f64],
    dec: &[f64],
    weights: &[f64],
    ra_bins: &Binner,
    dec_bins: &Binner,
) -> DMatrix<f64> {
    let mut hist = DMatrix::<f64>::zeros(ra_bins.bins(), dec_bins.bins());
    for ((&a, &d), &w) in ra.iter().zip(dec).zip(weights) {
        if let (Some(i), Some(j)) = (ra_bins.index(a), dec_bins.index(d)) {
            hist[(i, j)] += w;
        }
    }
    hist
}

/// Angular cells populated by either catalog, with both weighted counts.
#[derive(Debug, Clone, PartialEq)]
pub struct AngularOccupancy {
    n_ra: usize,
    n_dec: usize,
    pub bin_ra: Vec<usize>,
    pub bin_dec: Vec<usize>,
    /// Random-catalog count rounded to the nearest integer. A positive count
    /// never rounds below 1, so `count_r > 0 || count_d > 0` holds per row.
    pub count_r: Vec<i32>,
    pub count_d: Vec<f32>,
    /// Aligned index of each row, strictly increasing.
    aligned: Vec<usize>,
}

impl AngularOccupancy {
    /// Number of ra bins of the underlying grid.
    pub fn n_ra(&self) -> usize {
        self.n_ra
    }

    /// Number of dec bins of the underlying grid.
    pub fn n_dec(&self) -> usize {
        self.n_dec
    }

    /// Number of kept cells.
    pub fn len(&self) -> usize {
        self.aligned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aligned.is_empty()
    }

    /// Aligned index of every row, in row order.
    pub fn aligned_indices(&self) -> &[usize] {
        &self.aligned
    }

    /// Row holding the cell with aligned index `aligned`, if the cell is kept.
    pub fn row_for_aligned(&self, aligned: usize) -> Option<usize> {
        self.aligned.binary_search(&aligned).ok()
    }

    /// Row holding cell `(bin_ra, bin_dec)`, if the cell is kept.
    pub fn row_for_cell(&self, bin_ra: usize, bin_dec: usize) -> Option<usize> {
        if bin_ra >= self.n_ra || bin_dec >= self.n_dec {
            return None;
        }
        self.row_for_aligned(aligned_index(self.n_dec, bin_ra, bin_dec))
    }

    /// Random-catalog counts scattered back onto the full grid.
    pub fn dense_random(&self) -> DMatrix<f64> {
        let mut grid = DMatrix::<f64>::zeros(self.n_ra, self.n_dec);
        for row in 0..self.len() {
            grid[(self.bin_ra[row], self.bin_dec[row])] = self.count_r[row] as f64;
        }
        grid
    }

    /// `ang` table tagged with the random then the observed catalog's files.
    pub fn to_table<S: AsRef<str>>(&self, random_files: &[S], observed_files: &[S]) -> Table {
        let files: Vec<&str> = random_files
            .iter()
            .chain(observed_files)
            .map(|f| f.as_ref())
            .collect();
        Table::new("ang")
            .with_column("binRA", ColumnData::from_indices(&self.bin_ra))
            .with_column("binDec", ColumnData::from_indices(&self.bin_dec))
            .with_column("countR", ColumnData::I32(self.count_r.clone()))
            .with_column("countD", ColumnData::F32(self.count_d.clone()))
            .with_comment("Unraveled angular (ra,dec) 2D histogram.")
            .with_comment("Histogram for random catalog filled with z independent weights.")
            .with_provenance(&files)
    }
}

fn stored_random_count(r: f64) -> i32 {
    let rounded = r.round() as i32;
    if r > 0.0 {
        rounded.max(1)
    } else {
        rounded
    }
}

/// Histogram both catalogs on the (ra, dec) grid and keep populated cells.
///
/// The random catalog contributes `weight_no_z`, the observed catalog
/// `weight`.
pub fn angular_occupancy<R, D>(
    random: &R,
    observed: &D,
    ra_spec: &BinSpec,
    dec_spec: &BinSpec,
) -> Result<AngularOccupancy>
where
    R: CatalogView + ?Sized,
    D: CatalogView + ?Sized,
{
    let ra_bins = ra_spec.binner()?;
    let dec_bins = dec_spec.binner()?;

    let ang_r = weighted_histogram_2d(
        random.ra(),
        random.dec(),
        random.weight_no_z(),
        &ra_bins,
        &dec_bins,
    );
    let ang_d = weighted_histogram_2d(
        observed.ra(),
        observed.dec(),
        observed.weight(),
        &ra_bins,
        &dec_bins,
    );

    let (n_ra, n_dec) = (ra_bins.bins(), dec_bins.bins());
    let mut occ = AngularOccupancy {
        n_ra,
        n_dec,
        bin_ra: Vec::new(),
        bin_dec: Vec::new(),
        count_r: Vec::new(),
        count_d: Vec::new(),
        aligned: Vec::new(),
    };
    for i in 0..n_ra {
        for j in 0..n_dec {
            let (r, d) = (ang_r[(i, j)], ang_d[(i, j)]);
            if r > 0.0 || d > 0.0 {
                occ.bin_ra.push(i);
                occ.bin_dec.push(j);
                occ.count_r.push(stored_random_count(r));
                occ.count_d.push(d as f32);
                occ.aligned.push(aligned_index(n_dec, i, j));
            }
        }
    }

    debug!(
        "Angular occupancy: {} of {} cells populated ({} random, {} observed points)",
        occ.len(),
        n_ra * n_dec,
        random.len(),
        observed.len()
    );
    Ok(occ)
}

//! Sparse (angular cell, redshift bin) histogram of the observed catalog.
//!
//! Each observed point is keyed by the row of its angular cell in an
//! [`AngularOccupancy`] and by its z bin. Per key we accumulate the sum of
//! weights (`count`) and the sum of squared weights (`err2`, the variance of
//! the weighted count). Points in cells the occupancy does not list, or
//! outside any range, are dropped.
//!
//! Accumulation runs over fixed-size point chunks in parallel. Partial maps
//! are merged in chunk order, so repeated runs over the same input are
//! bit-identical.
//!
//! Sums are Neumaier-compensated, so reordering the points leaves
//! `(count, err2)` unchanged even when large weights in one cell cancel.
//! Order independence still holds only up to the rounding of the
//! compensation term itself; a cell whose compensated `count` is exactly
//! zero is omitted.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use tracing::debug;

use super::angular::{aligned_index, AngularOccupancy};
use crate::binning::{BinSpec, Binner};
use crate::catalog::CatalogView;
use crate::error::{Error, Result};
use crate::output::{ColumnData, IntWidth, Table};

/// Points handled by one accumulation task.
const CHUNK_SIZE: usize = 1 << 16;

/// Neumaier-compensated running sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct CompensatedSum {
    sum: f64,
    comp: f64,
}

impl CompensatedSum {
    #[inline]
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.comp += (self.sum - t) + x;
        } else {
            self.comp += (x - t) + self.sum;
        }
        self.sum = t;
    }

    fn merge(&mut self, other: &CompensatedSum) {
        self.add(other.sum);
        self.comp += other.comp;
    }

    fn value(&self) -> f64 {
        self.sum + self.comp
    }
}

/// Weighted count and variance of one sparse cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Accumulator {
    count: CompensatedSum,
    err2: CompensatedSum,
}

impl Accumulator {
    #[inline]
    fn add(&mut self, w: f64) {
        self.count.add(w);
        self.err2.add(w * w);
    }

    fn merge(&mut self, other: &Accumulator) {
        self.count.merge(&other.count);
        self.err2.merge(&other.err2);
    }
}

/// Rows of the sparse histogram, sorted by `(i_align, i_z)`.
///
/// `i_align[k]` is a row index into the [`AngularOccupancy`] the histogram was
/// built against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseAngleRedshift {
    pub i_align: Vec<usize>,
    pub i_z: Vec<usize>,
    pub count: Vec<f32>,
    pub err2: Vec<f32>,
}

impl SparseAngleRedshift {
    pub fn len(&self) -> usize {
        self.i_align.len()
    }

    pub fn is_empty(&self) -> bool {
        self.i_align.is_empty()
    }

    /// `angzD` table tagged with the observed catalog's files.
    pub fn to_table<S: AsRef<str>>(&self, source_files: &[S]) -> Table {
        Table::new("angzD")
            .with_column(
                "iAlign",
                ColumnData::from_indices_at_least(&self.i_align, IntWidth::I32),
            )
            .with_column("iZ", ColumnData::from_indices(&self.i_z))
            .with_column("count", ColumnData::F32(self.count.clone()))
            .with_column("err2", ColumnData::F32(self.err2.clone()))
            .with_comment("Sparse 3D histogram (ra, dec, z) of observed galaxies.")
            .with_comment("Unraveled in (ra,dec) and masked to align with 'ang' rows.")
            .with_provenance(source_files)
    }
}

/// Fail unless `spec` has as many bins as the occupancy grid along `axis`.
fn check_alignment(axis: &'static str, expected: usize, spec: &BinSpec) -> Result<()> {
    if spec.bins != expected {
        return Err(Error::MisalignedBinning {
            axis,
            expected,
            found: spec.bins,
        });
    }
    Ok(())
}

struct Binners {
    ra: Binner,
    dec: Binner,
    z: Binner,
}

/// Accumulate points `range` of `observed` into a map keyed by
/// `(occupancy row, z bin)`. Also returns the number of dropped points.
fn accumulate_chunk<D: CatalogView + ?Sized>(
    observed: &D,
    range: std::ops::Range<usize>,
    binners: &Binners,
    occupancy: &AngularOccupancy,
) -> (HashMap<(usize, usize), Accumulator>, usize) {
    let (ra, dec, z, w) = (observed.ra(), observed.dec(), observed.z(), observed.weight());
    let n_dec = occupancy.n_dec();
    let mut cells: HashMap<(usize, usize), Accumulator> = HashMap::new();
    let mut dropped = 0usize;
    for k in range {
        let key = binners.ra.index(ra[k]).and_then(|i| {
            let j = binners.dec.index(dec[k])?;
            let row = occupancy.row_for_aligned(aligned_index(n_dec, i, j))?;
            Some((row, binners.z.index(z[k])?))
        });
        match key {
            Some(key) => cells.entry(key).or_default().add(w[k]),
            None => dropped += 1,
        }
    }
    (cells, dropped)
}

/// Build the sparse angle-redshift histogram of `observed`, restricted to the
/// cells of `occupancy`.
///
/// `ra_spec` and `dec_spec` must have the bin counts `occupancy` was built
/// with; otherwise [`Error::MisalignedBinning`] is returned before any point
/// is read.
pub fn sparse_angle_redshift<D: CatalogView + Sync + ?Sized>(
    observed: &D,
    ra_spec: &BinSpec,
    dec_spec: &BinSpec,
    z_spec: &BinSpec,
    occupancy: &AngularOccupancy,
) -> Result<SparseAngleRedshift> {
    check_alignment("ra", occupancy.n_ra(), ra_spec)?;
    check_alignment("dec", occupancy.n_dec(), dec_spec)?;
    let binners = Binners {
        ra: ra_spec.binner()?,
        dec: dec_spec.binner()?,
        z: z_spec.binner()?,
    };

    let n = observed.len();
    let starts: Vec<usize> = (0..n).step_by(CHUNK_SIZE).collect();
    let partials: Vec<_> = starts
        .par_iter()
        .map(|&start| {
            let end = (start + CHUNK_SIZE).min(n);
            accumulate_chunk(observed, start..end, &binners, occupancy)
        })
        .collect();

    let mut merged: BTreeMap<(usize, usize), Accumulator> = BTreeMap::new();
    let mut dropped = 0usize;
    for (cells, chunk_dropped) in &partials {
        dropped += chunk_dropped;
        for (key, acc) in cells {
            merged.entry(*key).or_default().merge(acc);
        }
    }

    let mut out = SparseAngleRedshift::default();
    for ((row, iz), acc) in merged {
        let count = acc.count.value();
        if count == 0.0 {
            continue;
        }
        out.i_align.push(row);
        out.i_z.push(iz);
        out.count.push(count as f32);
        out.err2.push(acc.err2.value() as f32);
    }

    debug!(
        "Sparse angle-redshift histogram: {} cells from {} points ({} dropped)",
        out.len(),
        n,
        dropped
    );
    Ok(out)
}

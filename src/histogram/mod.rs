//! Binned summaries of the random and observed catalogs.
//!
//! 1. **Redshift PDF** ([`pdf`]): normalized z histogram of the random catalog.
//! 2. **Angular occupancy** ([`angular`]): (ra, dec) histograms of both
//!    catalogs, masked to cells populated by either one.
//! 3. **Sparse angle-redshift histogram** ([`sparse`]): observed catalog
//!    binned by occupancy row and z bin, with weighted counts and variances.
//!
//! Steps 2 and 3 share one angular grid and are normally built together via
//! [`angular_tables`].

pub mod angular;
pub mod pdf;
pub mod sparse;

pub use angular::{aligned_index, angular_occupancy, weighted_histogram_2d, AngularOccupancy};
pub use pdf::{redshift_pdf, RedshiftPdf};
pub use sparse::{sparse_angle_redshift, SparseAngleRedshift};

use crate::binning::BinSpec;
use crate::catalog::CatalogView;
use crate::error::Result;

/// Build the angular occupancy of both catalogs and the sparse
/// angle-redshift histogram of `observed` aligned with it.
pub fn angular_tables<R, D>(
    random: &R,
    observed: &D,
    ra_spec: &BinSpec,
    dec_spec: &BinSpec,
    z_spec: &BinSpec,
) -> Result<(AngularOccupancy, SparseAngleRedshift)>
where
    R: CatalogView + ?Sized,
    D: CatalogView + Sync + ?Sized,
{
    let occupancy = angular_occupancy(random, observed, ra_spec, dec_spec)?;
    let sparse = sparse_angle_redshift(observed, ra_spec, dec_spec, z_spec, &occupancy)?;
    Ok((occupancy, sparse))
}

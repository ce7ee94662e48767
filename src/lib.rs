//! # skybins
//!
//! Binned summaries of galaxy catalogs for fast **two-point correlation**
//! estimators.
//!
//! Given a *random* catalog (synthetic points tracing the survey geometry) and
//! an *observed* galaxy catalog, each with right ascension, declination,
//! redshift and per-point weights, `skybins` reduces them to a handful of
//! compact tables that a correlation estimator can consume without touching
//! the raw points again.
//!
//! ## Example
//!
//! ```no_run
//! use skybins::{preprocess, BinSpec, Catalog, PreprocessConfig};
//!
//! let random = Catalog::with_uniform_weights(
//!     vec![10.0, 12.5], vec![1.0, 2.0], vec![0.5, 0.6], vec![1.0, 1.0],
//! )?
//! .with_source_files(["data/randoms.fits"]);
//! let observed = Catalog::with_uniform_weights(
//!     vec![11.0], vec![1.5], vec![0.55], vec![1.2],
//! )?
//! .with_source_files(["data/galaxies.fits"]);
//!
//! let config = PreprocessConfig {
//!     name: "demo".to_string(),
//!     binning_z: BinSpec::new(27, 0.43, 0.7)?,
//!     ..Default::default()
//! };
//! let tables = preprocess(&config, &random, &observed)?;
//! println!("{:?}", tables.names());
//! tables.save_to_file(config.output_path())?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Output tables
//!
//! | Table | Columns |
//! |---|---|
//! | `centerZ`, `centerRA`, `centerDec` | `binCenter: f64` |
//! | `pdfZ` | `lowEdge: f64`, `probability: f32` |
//! | `ang` | `binRA`, `binDec` (≥ i16), `countR: i32`, `countD: f32` |
//! | `angzD` | `iAlign` (≥ i32), `iZ` (≥ i16), `count: f32`, `err2: f32` |
//!
//! Index columns use the narrowest signed width holding their largest value.
//! `iAlign` is a row number in `ang`, so the sparse table joins back to its
//! (ra, dec) cell directly.
//!
//! ## Binning conventions
//!
//! Bins are right-open except the last, which is closed. Points outside a
//! configured range (or NaN) are dropped from every histogram.

pub mod binning;
pub mod catalog;
mod error;
pub mod histogram;
pub mod output;
pub mod preprocess;
pub mod timing;

pub use binning::{bin_index, centers, BinSpec, Binner};
pub use catalog::{Catalog, CatalogView};
pub use error::{Error, Result};
pub use histogram::{
    angular_occupancy, angular_tables, redshift_pdf, sparse_angle_redshift, AngularOccupancy,
    RedshiftPdf, SparseAngleRedshift,
};
pub use output::{select_int_width, ColumnData, IntWidth, Table, TableSet};
pub use preprocess::{preprocess, run, PreprocessConfig};

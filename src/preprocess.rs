//! End-to-end preprocessing: two catalogs in, one ordered table set out.
//!
//! Table order is fixed: `centerZ`, `centerRA`, `centerDec`, `pdfZ`, `ang`,
//! `angzD`. Every table carries a `time` card with the seconds spent
//! building it; catalog-derived tables also carry provenance cards.

use std::path::PathBuf;

use tracing::info;

use crate::binning::BinSpec;
use crate::catalog::CatalogView;
use crate::error::Result;
use crate::histogram::{angular_tables, redshift_pdf};
use crate::output::{ColumnData, Table, TableSet};
use crate::timing::timed;

/// Names of the produced tables, in output order.
pub const TABLE_NAMES: [&str; 6] = ["centerZ", "centerRA", "centerDec", "pdfZ", "ang", "angzD"];

/// Parameters controlling preprocessing.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    /// Survey name, used to build the output file name.
    pub name: String,
    /// Directory the output artifact is written to.
    pub output_dir: PathBuf,
    /// Redshift binning. Default 900 bins over [0.43, 0.7].
    pub binning_z: BinSpec,
    /// Right ascension binning (degrees). Default 2200 bins over [-50, 50].
    pub binning_ra: BinSpec,
    /// Declination binning (degrees). Default 800 bins over [-10, 20].
    pub binning_dec: BinSpec,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            name: "survey".to_string(),
            output_dir: PathBuf::from("data"),
            binning_z: BinSpec {
                bins: 900,
                low: 0.43,
                high: 0.7,
            },
            binning_ra: BinSpec {
                bins: 2200,
                low: -50.0,
                high: 50.0,
            },
            binning_dec: BinSpec {
                bins: 800,
                low: -10.0,
                high: 20.0,
            },
        }
    }
}

impl PreprocessConfig {
    /// Check every bin spec.
    pub fn validate(&self) -> Result<()> {
        self.binning_z.validate()?;
        self.binning_ra.validate()?;
        self.binning_dec.validate()
    }

    /// `<output_dir>/<name>_preprocessing.rkyv`
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_preprocessing.rkyv", self.name))
    }
}

/// Single-column table of bin centers.
pub fn bin_centers_table(spec: &BinSpec, name: &str) -> Result<Table> {
    Ok(Table::new(name).with_column("binCenter", ColumnData::F64(spec.centers()?)))
}

fn with_time(mut table: Table, secs: f64) -> Table {
    table.set_card("time", format!("{secs:.6}"));
    table
}

/// Build all tables from the random and observed catalogs.
pub fn preprocess<R, D>(config: &PreprocessConfig, random: &R, observed: &D) -> Result<TableSet>
where
    R: CatalogView + ?Sized,
    D: CatalogView + Sync + ?Sized,
{
    config.validate()?;
    info!(
        "Preprocessing '{}': {} random points, {} observed points",
        config.name,
        random.len(),
        observed.len()
    );

    let mut tables = TableSet::new();
    let centers = [
        (&config.binning_z, "centerZ"),
        (&config.binning_ra, "centerRA"),
        (&config.binning_dec, "centerDec"),
    ];
    for (spec, name) in centers {
        let (table, secs) = timed(name, || bin_centers_table(spec, name));
        tables.push(with_time(table?, secs));
    }

    let (pdf, secs) = timed("pdfZ", || redshift_pdf(random, &config.binning_z));
    tables.push(with_time(pdf?.to_table(random.source_files()), secs));

    let (angular, secs) = timed("ang", || {
        angular_tables(
            random,
            observed,
            &config.binning_ra,
            &config.binning_dec,
            &config.binning_z,
        )
    });
    let (occupancy, sparse) = angular?;
    tables.push(with_time(
        occupancy.to_table(random.source_files(), observed.source_files()),
        secs,
    ));
    tables.push(with_time(sparse.to_table(observed.source_files()), secs));

    info!(
        "Built {} tables: {} occupied cells, {} sparse entries",
        tables.len(),
        occupancy.len(),
        sparse.len()
    );
    Ok(tables)
}

/// Preprocess and write the artifact to [`PreprocessConfig::output_path`].
pub fn run<R, D>(config: &PreprocessConfig, random: &R, observed: &D) -> anyhow::Result<PathBuf>
where
    R: CatalogView + ?Sized,
    D: CatalogView + Sync + ?Sized,
{
    let tables = preprocess(config, random, observed)?;
    let path = config.output_path();
    tables.save_to_file(&path)?;
    Ok(path)
}

//! Integration tests: build synthetic random and observed catalogs, run the
//! full preprocessing pipeline, and check the invariants linking its tables.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use rand_distr::{Distribution, Normal};
use skybins::histogram::weighted_histogram_2d;
use skybins::{
    angular_tables, preprocess, redshift_pdf, run, BinSpec, Catalog, CatalogView, ColumnData,
    Error, IntWidth, PreprocessConfig, TableSet,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
}

fn survey_config(name: &str) -> PreprocessConfig {
    PreprocessConfig {
        name: name.to_string(),
        output_dir: std::env::temp_dir().join("skybins-tests"),
        binning_z: BinSpec::new(30, 0.43, 0.7).unwrap(),
        binning_ra: BinSpec::new(40, -20.0, 20.0).unwrap(),
        binning_dec: BinSpec::new(25, -5.0, 10.0).unwrap(),
    }
}

/// Points uniform on a patch slightly larger than the binned area, with a
/// Gaussian redshift distribution, so some points fall outside every range.
fn synthetic_catalog(rng: &mut StdRng, n: usize, weight_scale: f64, file: &str) -> Catalog {
    let z_dist = Normal::new(0.56, 0.06).unwrap();
    let mut ra = Vec::with_capacity(n);
    let mut dec = Vec::with_capacity(n);
    let mut z = Vec::with_capacity(n);
    let mut weight = Vec::with_capacity(n);
    let mut weight_no_z = Vec::with_capacity(n);
    let mut weight_z = Vec::with_capacity(n);
    for _ in 0..n {
        ra.push(rng.random::<f64>() * 44.0 - 22.0);
        dec.push(rng.random::<f64>() * 16.0 - 5.5);
        z.push(z_dist.sample(rng));
        let w = weight_scale * (0.5 + rng.random::<f64>());
        weight.push(w);
        weight_no_z.push(0.5 * w);
        weight_z.push(1.0 + rng.random::<f64>());
    }
    Catalog::new(ra, dec, z, weight, weight_no_z, weight_z)
        .unwrap()
        .with_source_files([file])
}

fn int_column(tables: &TableSet, table: &str, column: &str) -> Vec<i64> {
    tables
        .table(table)
        .and_then(|t| t.column(column))
        .and_then(|c| c.to_i64_vec())
        .unwrap_or_else(|| panic!("missing integer column {table}.{column}"))
}

fn f32_column<'a>(tables: &'a TableSet, table: &str, column: &str) -> &'a [f32] {
    tables
        .table(table)
        .and_then(|t| t.column(column))
        .and_then(|c| c.as_f32())
        .unwrap_or_else(|| panic!("missing f32 column {table}.{column}"))
}

#[test]
fn test_synthetic_survey_tables_are_consistent() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(42);
    let random = synthetic_catalog(&mut rng, 50_000, 1.0, "data/randoms_south.fits");
    let observed = synthetic_catalog(&mut rng, 5_000, 2.0, "data/galaxies_south.fits");
    let config = survey_config("synthetic");

    let tables = preprocess(&config, &random, &observed).expect("preprocessing failed");
    assert_eq!(
        tables.names(),
        vec!["centerZ", "centerRA", "centerDec", "pdfZ", "ang", "angzD"]
    );

    // Bin centers.
    for (name, spec) in [
        ("centerZ", config.binning_z),
        ("centerRA", config.binning_ra),
        ("centerDec", config.binning_dec),
    ] {
        let centers = tables.table(name).unwrap().column("binCenter").unwrap();
        let centers = centers.as_f64().unwrap();
        let edges = spec.edges().unwrap();
        assert_eq!(centers.len(), spec.bins);
        for i in 0..spec.bins {
            assert!((centers[i] - 0.5 * (edges[i] + edges[i + 1])).abs() < 1e-12);
        }
    }

    // Redshift PDF: normalized over in-range points only.
    let pdf = redshift_pdf(&random, &config.binning_z).unwrap();
    let binner = config.binning_z.binner().unwrap();
    let total_w: f64 = random.weight_z().iter().sum();
    let in_range_w: f64 = random
        .z()
        .iter()
        .zip(random.weight_z())
        .filter(|&(&z, _)| binner.index(z).is_some())
        .map(|(_, &w)| w)
        .sum();
    assert!((pdf.total() - in_range_w / total_w).abs() < 1e-5);
    assert_eq!(f32_column(&tables, "pdfZ", "probability"), &pdf.probability[..]);

    // Every occupancy row is populated by at least one catalog.
    let bin_ra = int_column(&tables, "ang", "binRA");
    let bin_dec = int_column(&tables, "ang", "binDec");
    let count_r = int_column(&tables, "ang", "countR");
    let count_d = f32_column(&tables, "ang", "countD");
    assert!(!bin_ra.is_empty());
    let ra_bins = config.binning_ra.binner().unwrap();
    let dec_bins = config.binning_dec.binner().unwrap();
    let hist_r = weighted_histogram_2d(
        random.ra(),
        random.dec(),
        random.weight_no_z(),
        &ra_bins,
        &dec_bins,
    );
    let hist_d = weighted_histogram_2d(
        observed.ra(),
        observed.dec(),
        observed.weight(),
        &ra_bins,
        &dec_bins,
    );
    let mut kept = 0;
    for i in 0..config.binning_ra.bins {
        for j in 0..config.binning_dec.bins {
            if hist_r[(i, j)] > 0.0 || hist_d[(i, j)] > 0.0 {
                kept += 1;
            }
        }
    }
    assert_eq!(kept, bin_ra.len());
    for row in 0..bin_ra.len() {
        let (i, j) = (bin_ra[row] as usize, bin_dec[row] as usize);
        assert!(hist_r[(i, j)] > 0.0 || hist_d[(i, j)] > 0.0);
        assert!(count_r[row] > 0 || count_d[row] > 0.0);
        if hist_r[(i, j)] > 0.0 {
            assert_eq!(count_r[row], (hist_r[(i, j)].round() as i64).max(1));
        } else {
            assert_eq!(count_r[row], 0);
        }
        assert!((count_d[row] as f64 - hist_d[(i, j)]).abs() < 1e-3);
    }

    // Every sparse entry joins back to an occupancy row.
    let i_align = int_column(&tables, "angzD", "iAlign");
    let i_z = int_column(&tables, "angzD", "iZ");
    let count = f32_column(&tables, "angzD", "count");
    let err2 = f32_column(&tables, "angzD", "err2");
    assert!(!i_align.is_empty());
    let mut per_row = vec![0.0f64; bin_ra.len()];
    for k in 0..i_align.len() {
        let row = i_align[k] as usize;
        assert!(row < bin_ra.len());
        assert!((i_z[k] as usize) < config.binning_z.bins);
        assert!(err2[k] > 0.0);
        per_row[row] += count[k] as f64;
    }
    // angzD also drops points outside the z range, so it never exceeds countD.
    for row in 0..bin_ra.len() {
        assert!(per_row[row] <= count_d[row] as f64 * (1.0 + 1e-5) + 1e-6);
    }

    // Column widths follow the index policy.
    let angzd = tables.table("angzD").unwrap();
    assert_eq!(angzd.column("iAlign").unwrap().int_width(), Some(IntWidth::I32));
    assert_eq!(angzd.column("iZ").unwrap().int_width(), Some(IntWidth::I16));
    let ang = tables.table("ang").unwrap();
    assert_eq!(ang.column("binRA").unwrap().int_width(), Some(IntWidth::I16));
    assert!(matches!(ang.column("countR"), Some(ColumnData::I32(_))));

    // Provenance.
    assert_eq!(tables.table("pdfZ").unwrap().provenance(), vec!["randoms_south.fits"]);
    assert_eq!(
        ang.provenance(),
        vec!["randoms_south.fits", "galaxies_south.fits"]
    );
    assert_eq!(angzd.provenance(), vec!["galaxies_south.fits"]);
    assert!(tables.table("centerRA").unwrap().provenance().is_empty());
}

#[test]
fn test_point_order_does_not_change_sparse_histogram() {
    let mut rng = StdRng::seed_from_u64(7);
    let n = 2_000;
    let config = survey_config("order");
    // Dyadic weights keep every partial sum exact.
    let mut points: Vec<(f64, f64, f64, f64)> = (0..n)
        .map(|_| {
            (
                rng.random::<f64>() * 40.0 - 20.0,
                rng.random::<f64>() * 15.0 - 5.0,
                0.43 + rng.random::<f64>() * 0.27,
                0.25 * (1 + rng.random_range(0..8)) as f64,
            )
        })
        .collect();
    let build = |pts: &[(f64, f64, f64, f64)]| {
        Catalog::with_uniform_weights(
            pts.iter().map(|p| p.0).collect(),
            pts.iter().map(|p| p.1).collect(),
            pts.iter().map(|p| p.2).collect(),
            pts.iter().map(|p| p.3).collect(),
        )
        .unwrap()
    };

    let forward = build(&points[..]);
    points.reverse();
    let reversed = build(&points[..]);

    let a = angular_tables(
        &forward,
        &forward,
        &config.binning_ra,
        &config.binning_dec,
        &config.binning_z,
    )
    .unwrap();
    let b = angular_tables(
        &reversed,
        &reversed,
        &config.binning_ra,
        &config.binning_dec,
        &config.binning_z,
    )
    .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_redshift_pdf_scenario() {
    let random = Catalog::new(
        vec![0.0; 3],
        vec![0.0; 3],
        vec![0.5, 1.5, 2.5],
        vec![1.0; 3],
        vec![1.0; 3],
        vec![1.0; 3],
    )
    .unwrap();
    let pdf = redshift_pdf(&random, &BinSpec::new(3, 0.0, 3.0).unwrap()).unwrap();
    assert_eq!(pdf.low_edges, vec![0.0, 1.0, 2.0]);
    for p in pdf.probability {
        assert!((p - 1.0 / 3.0).abs() < 1e-7);
    }
}

#[test]
fn test_two_point_angular_scenario() {
    let spec = BinSpec::new(2, 0.0, 2.0).unwrap();
    let z = BinSpec::new(1, 0.0, 1.0).unwrap();
    let random =
        Catalog::with_uniform_weights(vec![0.5], vec![0.5], vec![0.5], vec![1.0]).unwrap();
    let observed =
        Catalog::with_uniform_weights(vec![1.5], vec![1.5], vec![0.5], vec![2.0]).unwrap();
    let (occ, sparse) = angular_tables(&random, &observed, &spec, &spec, &z).unwrap();

    assert_eq!(occ.len(), 2);
    assert_eq!((occ.bin_ra[0], occ.bin_dec[0], occ.count_r[0], occ.count_d[0]), (0, 0, 1, 0.0));
    assert_eq!((occ.bin_ra[1], occ.bin_dec[1], occ.count_r[1], occ.count_d[1]), (1, 1, 0, 2.0));

    assert_eq!(sparse.i_align, vec![1]);
    assert_eq!(sparse.i_z, vec![0]);
    assert_eq!(sparse.count, vec![2.0]);
    assert_eq!(sparse.err2, vec![4.0]);
}

#[test]
fn test_empty_observed_catalog() {
    let config = survey_config("empty-observed");
    let mut rng = StdRng::seed_from_u64(3);
    let random = synthetic_catalog(&mut rng, 1_000, 1.0, "randoms.fits");
    let observed = Catalog::default();

    let tables = preprocess(&config, &random, &observed).unwrap();
    assert_eq!(tables.table("angzD").unwrap().num_rows(), 0);

    // Occupancy is entirely explained by the random catalog.
    let count_d = f32_column(&tables, "ang", "countD");
    assert!(!count_d.is_empty());
    assert!(count_d.iter().all(|&c| c == 0.0));
    let (occ, _) = angular_tables(
        &random,
        &observed,
        &config.binning_ra,
        &config.binning_dec,
        &config.binning_z,
    )
    .unwrap();
    assert_eq!(occ.len(), count_d.len());

    // With the catalogs swapped, the empty random catalog has no PDF.
    assert!(matches!(
        preprocess(&config, &observed, &random),
        Err(Error::EmptyWeightSum { .. })
    ));
}

#[test]
fn test_run_writes_loadable_artifact() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(11);
    let random = synthetic_catalog(&mut rng, 5_000, 1.0, "data/randoms.fits");
    let observed = synthetic_catalog(&mut rng, 800, 1.0, "data/galaxies.fits");
    let config = survey_config("roundtrip");

    let path = run(&config, &random, &observed).expect("run failed");
    assert_eq!(path, config.output_path());
    let loaded = TableSet::load_from_file(&path).expect("load failed");
    let rebuilt = preprocess(&config, &random, &observed).unwrap();

    assert_eq!(loaded.names(), rebuilt.names());
    for name in ["pdfZ", "ang", "angzD"] {
        let (a, b) = (loaded.table(name).unwrap(), rebuilt.table(name).unwrap());
        assert_eq!(a.columns, b.columns, "table {name}");
        assert_eq!(a.provenance(), b.provenance());
        assert_eq!(a.comments, b.comments);
    }
    let _ = std::fs::remove_file(&path);
}

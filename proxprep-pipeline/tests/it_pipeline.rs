//! End-to-end pipeline runs against on-disk GeoJSON workspaces.

use geo_types::{point, polygon, Geometry, Polygon};
use proxprep_pipeline::{PrepConfig, PrepRun};
use proxprep_store::{FeatureClass, Workspace};
use proxprep_tabular::{Cell, FieldInfo, FieldType, TableSchema};
use tempfile::TempDir;

fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
    polygon![
        (x: x, y: y),
        (x: x + size, y: y),
        (x: x + size, y: y + size),
        (x: x, y: y + size),
        (x: x, y: y),
    ]
}

fn poly_layer(name: &str, field: &str, squares: &[(f64, f64, f64, i64)]) -> FeatureClass {
    let schema = TableSchema::new(vec![FieldInfo::new(field, FieldType::Int64)]).unwrap();
    let mut fc = FeatureClass::new(name, 4326, schema);
    for &(x, y, size, id) in squares {
        fc.push(Geometry::Polygon(square(x, y, size)), vec![Cell::I64(id)])
            .unwrap();
    }
    fc
}

fn point_layer(name: &str, field: &str, points: &[(f64, f64, i64)]) -> FeatureClass {
    let schema = TableSchema::new(vec![FieldInfo::new(field, FieldType::Int64)]).unwrap();
    let mut fc = FeatureClass::new(name, 4326, schema);
    for &(x, y, id) in points {
        fc.push(Geometry::Point(point!(x: x, y: y)), vec![Cell::I64(id)])
            .unwrap();
    }
    fc
}

/// Three communities: A and C contain building points, B contains none
/// and gets a synthesized one. Primary sites 501-503 and advisory sites
/// 601-603 cover one community each. The registry omits 602.
struct Fixture {
    _root: TempDir,
    config: PrepConfig,
}

fn fixture() -> Fixture {
    let root = TempDir::new().unwrap();
    let default_dir = root.path().join("default");
    let scratch_dir = root.path().join("scratch");

    let default_ws = Workspace::create(&default_dir).unwrap();
    default_ws
        .write_layer(&poly_layer(
            "INDIG_AUTOCH_A",
            "PLACE_ID",
            &[(0.0, 0.0, 4.0, 1), (10.0, 0.0, 4.0, 2), (20.0, 0.0, 4.0, 3)],
        ))
        .unwrap();
    default_ws
        .write_layer(&point_layer(
            "BUILDING_P",
            "BLD_ID",
            &[(1.0, 1.0, 11), (2.0, 2.0, 12), (21.0, 1.0, 13)],
        ))
        .unwrap();

    let site_a = poly_layer(
        "site_a",
        "PD_Site_ID",
        &[
            (-1.0, -1.0, 6.0, 501),
            (9.0, -1.0, 6.0, 502),
            (19.0, -1.0, 6.0, 503),
        ],
    );
    let adv_pd = poly_layer(
        "adv_pd",
        "ADVPD_Site_ID",
        &[
            (-1.0, -1.0, 6.0, 601),
            (9.0, -1.0, 6.0, 602),
            (19.0, -1.0, 6.0, 603),
        ],
    );
    let site_p = point_layer(
        "site_p",
        "SITE_ID",
        &[
            (0.0, 0.0, 501),
            (1.0, 0.0, 502),
            (2.0, 0.0, 503),
            (3.0, 0.0, 601),
            (4.0, 0.0, 603),
        ],
    );

    let site_a_path = root.path().join("site_a.geojson");
    let adv_pd_path = root.path().join("adv_pd.geojson");
    let site_p_path = root.path().join("site_p.geojson");
    site_a.write_path(&site_a_path).unwrap();
    adv_pd.write_path(&adv_pd_path).unwrap();
    site_p.write_path(&site_p_path).unwrap();

    let mut config = PrepConfig::new(
        &default_dir,
        &scratch_dir,
        &site_a_path,
        &adv_pd_path,
        &site_p_path,
    );
    config.log_dir = root.path().join("logs");
    Fixture { _root: root, config }
}

#[test]
fn test_full_run_report() {
    let fx = fixture();
    let report = PrepRun::new(fx.config.clone()).unwrap().run().unwrap();

    assert_eq!(report.communities, 3);
    assert_eq!(report.synthesized_points, 1);
    assert_eq!(report.missing_primary, Vec::<i64>::new());
    assert_eq!(report.missing_advisory, vec![602]);
    // 3 real buildings plus the synthesized point.
    assert_eq!(report.output_rows, 4);
}

#[test]
fn test_output_carries_both_identifiers_per_point() {
    let fx = fixture();
    let config = fx.config.clone();
    PrepRun::new(config.clone()).unwrap().run().unwrap();

    let scratch = Workspace::open(&config.scratch_workspace).unwrap();
    let out = scratch.read_layer("bld_p_processed").unwrap();
    assert_eq!(out.len(), 4);

    let pd = out.table().i64_values("AUTO_PD_SITE_ID").unwrap();
    let adv = out.table().i64_values("AUTO_ADV_SITE_ID").unwrap();
    let bld = out.table().i64_values("BLD_ID").unwrap();
    for row in 0..out.len() {
        let expected = match bld[row] {
            Some(11) | Some(12) => (Some(501), Some(601)),
            Some(13) => (Some(503), Some(603)),
            // The synthesized point sits inside community B.
            None => (Some(502), Some(602)),
            other => panic!("unexpected BLD_ID {other:?}"),
        };
        assert_eq!((pd[row], adv[row]), expected, "row {row}");
    }
}

#[test]
fn test_synthesized_point_is_inside_its_community() {
    use geo::Contains;

    let fx = fixture();
    let config = fx.config.clone();
    PrepRun::new(config.clone()).unwrap().run().unwrap();

    let scratch = Workspace::open(&config.scratch_workspace).unwrap();
    let out = scratch.read_layer("bld_p_processed").unwrap();
    let bld = out.table().i64_values("BLD_ID").unwrap();
    let row = bld.iter().position(Option::is_none).unwrap();
    let Some(Geometry::Point(p)) = out.geometry(row) else {
        panic!("synthesized row is not a point");
    };
    assert!(square(10.0, 0.0, 4.0).contains(p));
}

#[test]
fn test_intermediates_are_cleaned_output_survives() {
    let fx = fixture();
    let config = fx.config.clone();
    PrepRun::new(config.clone()).unwrap().run().unwrap();

    let scratch = Workspace::open(&config.scratch_workspace).unwrap();
    assert_eq!(scratch.list_layers().unwrap(), vec!["bld_p_processed"]);
}

#[test]
fn test_keep_artifacts_retains_intermediates() {
    let fx = fixture();
    let config = fx.config.clone().with_keep_artifacts(true);
    PrepRun::new(config.clone()).unwrap().run().unwrap();

    let scratch = Workspace::open(&config.scratch_workspace).unwrap();
    let layers = scratch.list_layers().unwrap();
    assert!(layers.contains(&"bld_p_processed".to_string()));
    assert!(layers.contains(&"scratch".to_string()));
    assert!(layers.contains(&"scratch_2".to_string()));
    assert!(layers.contains(&"ia_centroids".to_string()));
    assert!(layers.contains(&"BUILDING_P_ap".to_string()));
}

#[test]
fn test_rerun_produces_identical_output() {
    let fx = fixture();
    let config = fx.config.clone();
    let first = PrepRun::new(config.clone()).unwrap().run().unwrap();
    let second = PrepRun::new(config.clone()).unwrap().run().unwrap();

    assert_eq!(first.output_rows, second.output_rows);
    assert_eq!(first.missing_advisory, second.missing_advisory);

    let scratch = Workspace::open(&config.scratch_workspace).unwrap();
    let out = scratch.read_layer("bld_p_processed").unwrap();
    assert_eq!(out.len(), first.output_rows);
}

#[test]
fn test_invalid_config_rejected_before_running() {
    let fx = fixture();
    let mut config = fx.config.clone();
    config.site_a_path = config.site_a_path.with_extension("missing");
    let err = PrepRun::new(config).unwrap_err();
    assert!(err.to_string().contains("site_a_path"));
}

// End-to-end tests for the plantreg binary against tests/fixtures/registry.
//
// Every test copies the fixture tree into a temp dir so outputs written
// relative to the config never touch the source tree.
//
// Run with: cargo test -p plantreg-cli --test cli_tests -- --nocapture

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use plantreg_io::{read_registry_csv, RegistryRow, WARNING_BANNER};
use tempfile::TempDir;

fn plantreg() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_plantreg"));
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("PLANTREG_LOG_FILE");
    cmd
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

/// Fresh copy of the fixture tree; returns the temp dir and its config path.
fn fixture() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/registry");
    copy_dir(&source, dir.path());
    let config = dir.path().join("registry.toml");
    (dir, config)
}

fn run(args: &[&str]) -> Output {
    plantreg().args(args).output().expect("run plantreg")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "exit code: {:?}\nstderr: {}",
        output.status,
        stderr(output)
    );
}

fn by_id(rows: Vec<RegistryRow>) -> BTreeMap<String, RegistryRow> {
    rows.into_iter().map(|r| (r.id.clone(), r)).collect()
}

// ===========================================================================
// build
// ===========================================================================

#[test]
fn build_writes_registry() {
    let (dir, config) = fixture();
    let output = run(&["build", path_arg(&config)]);
    assert_success(&output);

    let registry_path = dir.path().join("output/registry.csv");
    let text = fs::read_to_string(&registry_path).unwrap();
    assert_eq!(text.lines().next(), Some(WARNING_BANNER));
    let header = text.lines().nth(1).unwrap();
    assert!(header.contains("generation_gwh_2015,generation_gwh_2016,generation_gwh_2017"));
    assert!(!header.contains("in_registry"));

    let rows = by_id(read_registry_csv(&registry_path).unwrap());
    let ids: Vec<&str> = rows.keys().map(String::as_str).collect();
    assert_eq!(
        ids,
        [
            "CHL0000001",
            "GEODB0000006",
            "SRCWT0000001",
            "WRI0000001",
            "WRI0000002",
            "WRI0000004",
            "WRI0000006",
        ]
    );

    let ralco = &rows["CHL0000001"];
    assert_eq!(ralco.fuels, ["Hydro"]);
    assert_eq!(ralco.generation_for(2017), Some(2500.0));
    assert_eq!(ralco.estimated_generation_gwh, Some(2650.0));
    assert_eq!(ralco.geolocation_source.as_deref(), Some("Chile national data"));

    let north = &rows["WRI0000001"];
    assert_eq!(north.country.as_deref(), Some("Ruritania"));
    assert_eq!((north.latitude, north.longitude), (Some(45.1), Some(19.2)));
    assert_eq!(north.geolocation_source.as_deref(), Some("GEO data"));

    let east = &rows["WRI0000004"];
    assert_eq!(east.fuels, ["Coal", "Oil"]);
    assert_eq!(east.geolocation_source.as_deref(), Some("CARMA data"));

    let delimara = &rows["GEODB0000006"];
    assert_eq!(delimara.country.as_deref(), Some("Malta"));

    assert!(!dir.path().join("output/registry_dump.csv").exists());
}

#[test]
fn build_json_summary_is_single_value() {
    let (_dir, config) = fixture();
    let output = run(&["build", path_arg(&config), "--json"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).expect("stdout must be one JSON value");

    assert_eq!(value["meta"]["config_name"], "Fixture registry");
    let summary = &value["summary"];
    assert_eq!(summary["total_plants"], 7);
    assert_eq!(summary["with_generation"], 2);
    assert_eq!(summary["candidates"], 17);
    assert_eq!(summary["excluded"], 10);
    assert_eq!(summary["consumed_carbon"], 2);
    assert_eq!(summary["by_step"]["national"], 1);
    assert_eq!(summary["by_step"]["global_direct"], 1);
    assert_eq!(summary["by_step"]["global_via_geolocation"], 1);
    assert_eq!(summary["by_step"]["global_via_carbon"], 2);
    assert_eq!(summary["by_step"]["geolocation_primary"], 1);
    assert_eq!(summary["by_step"]["wiki"], 1);
    assert!(value["outputs"]["dump_csv"].is_null());
}

#[test]
fn build_dump_lists_candidates() {
    let (dir, config) = fixture();
    let output = run(&["build", path_arg(&config), "--dump"]);
    assert_success(&output);

    let rows = by_id(read_registry_csv(&dir.path().join("output/registry_dump.csv")).unwrap());
    assert_eq!(rows.len(), 17);
    assert_eq!(rows.values().filter(|r| r.in_registry == Some(true)).count(), 7);

    assert_eq!(rows["CHL0000002"].in_registry, Some(false));
    assert_eq!(rows["CHL0000003"].in_registry, Some(false));
    assert_eq!(rows["WRI0000003"].in_registry, Some(false));
    assert_eq!(rows["WRI0000005"].in_registry, Some(false));
    assert_eq!(rows["CARMA0000009"].consumed_by.as_deref(), Some("WRI0000004"));
    assert_eq!(rows["CARMA0000010"].consumed_by, None);
    assert!(stderr(&output).contains("(17 rows)"));
}

#[test]
fn build_dump_without_path_is_usage_error() {
    let (_dir, config) = fixture();
    let text = fs::read_to_string(&config).unwrap();
    fs::write(&config, text.replace("dump_csv = \"output/registry_dump.csv\"\n", "")).unwrap();

    let output = run(&["build", path_arg(&config), "--dump"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("output.dump_csv"));
}

#[test]
fn build_sqlite_replaces_previous_copy() {
    let (dir, config) = fixture();
    let db = dir.path().join("output/registry.sqlite");

    for _ in 0..2 {
        let output = run(&["build", path_arg(&config), "--sqlite", path_arg(&db)]);
        assert_success(&output);
    }

    let conn = rusqlite::Connection::open(&db).unwrap();
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM powerplants", [], |r| r.get(0)).unwrap();
    assert_eq!(count, 7);
}

#[test]
fn build_invalid_config_exit_code() {
    let (_dir, config) = fixture();
    fs::write(&config, "name = \"x\"\nminimum_capacity_mw = -1.0\n").unwrap();

    let output = run(&["build", path_arg(&config)]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn build_missing_config_exit_code() {
    let output = run(&["build", "/nonexistent/registry.toml"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(stderr(&output).contains("cannot read config"));
}

#[test]
fn build_missing_dataset_exit_code() {
    let (dir, config) = fixture();
    fs::remove_file(dir.path().join("sources/geo.json")).unwrap();

    let output = run(&["build", path_arg(&config)]);
    assert_eq!(output.status.code(), Some(62));
    assert!(stderr(&output).contains("geo.json"));
}

#[test]
fn build_broken_resource_exit_code() {
    let (dir, config) = fixture();
    fs::write(
        dir.path().join("resources/master_plant_concordance.csv"),
        "wri_id,geo_id\n1,5\n1,6\n",
    )
    .unwrap();

    let output = run(&["build", path_arg(&config)]);
    assert_eq!(output.status.code(), Some(61));
}

#[test]
fn build_log_file_receives_events() {
    let (dir, config) = fixture();
    let log = dir.path().join("build.log");

    let output = run(&["build", path_arg(&config), "--log-file", path_arg(&log)]);
    assert_success(&output);

    let text = fs::read_to_string(&log).unwrap();
    assert!(text.contains("admission step complete"));
    assert!(text.contains("concordance link points to a missing record"));
    assert!(!text.contains('\u{1b}'), "log file must not contain ANSI escapes");
}

// ===========================================================================
// check
// ===========================================================================

#[test]
fn check_passes_on_fixture() {
    let (_dir, config) = fixture();
    let output = run(&["check", path_arg(&config)]);
    assert_success(&output);
    assert!(stderr(&output).contains("0 errors"));
}

#[test]
fn check_links_reports_broken_concordance() {
    let (_dir, config) = fixture();
    let output = run(&["check", path_arg(&config), "--links", "--json"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    let findings = value["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0]["severity"], "warning");
    assert!(findings[0]["message"].as_str().unwrap().contains("GEODB0000099"));
}

#[test]
fn check_fails_on_bad_thesaurus() {
    let (dir, _config) = fixture();
    let output = run(&["check", path_arg(&dir.path().join("bad_thesaurus.toml"))]);
    assert_eq!(output.status.code(), Some(64));

    let err = stderr(&output);
    assert!(err.contains("'LNG'"), "stderr: {err}");
    assert!(err.contains("claimed by both"), "stderr: {err}");
}

#[test]
fn check_fails_when_national_iso3_is_a_source_code() {
    let (dir, config) = fixture();
    let countries = dir.path().join("resources/country_information.csv");
    let text = fs::read_to_string(&countries).unwrap();
    fs::write(&countries, format!("{text}Georgia,GEO,GE,1,0,,,\n")).unwrap();
    let text = fs::read_to_string(&config).unwrap();
    fs::write(&config, text.replace("code = \"GEODB\"", "code = \"GEO\"")).unwrap();

    let output = run(&["check", path_arg(&config)]);
    assert_eq!(output.status.code(), Some(64));
    let err = stderr(&output);
    assert!(err.contains("Georgia: iso3 'GEO' is also the geolocation source code"), "stderr: {err}");
}

// ===========================================================================
// convert
// ===========================================================================

#[test]
fn convert_copies_registry_once() {
    let (dir, config) = fixture();
    assert_success(&run(&["build", path_arg(&config)]));

    let csv = dir.path().join("output/registry.csv");
    let db = dir.path().join("copy.sqlite");
    let output = run(&["convert", path_arg(&csv), path_arg(&db)]);
    assert_success(&output);
    assert!(stderr(&output).contains("copied 7 plants"));

    let again = run(&["convert", path_arg(&csv), path_arg(&db)]);
    assert_eq!(again.status.code(), Some(63));
    assert!(stderr(&again).contains("hint:"));
}

#[test]
fn convert_missing_csv_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("copy.sqlite");
    let output = run(&["convert", "/nonexistent/registry.csv", path_arg(&db)]);
    assert_eq!(output.status.code(), Some(62));
}

// Load tables and datasets from disk, conflate, write and read back the registry.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use plantreg_conflate::{run, ConflateConfig, ConflateInput, Dataset};
use plantreg_io::{
    copy_csv_to_sqlite, load_concordance, load_country_reference, load_dataset, load_fuel_thesaurus,
    load_national_datasets, read_registry_csv, write_dump_csv, write_registry_csv, Vocabulary, WARNING_BANNER,
};
use tempfile::tempdir;

const CONFIG: &str = r#"
name = "Pipeline"
minimum_capacity_mw = 1.0
generation_years = [2016, 2017]

[resources]
fuel_thesaurus = "fuel.csv"
country_information = "countries.csv"
concordance = "concordance.csv"

[sources.global]
code = "WRI"
label = "WRI"
file = "wri.json"

[sources.geolocation]
code = "GEODB"
label = "GEO"
file = "geo.json"

[sources.carbon]
code = "CARMA"
label = "CARMA"
file = "carma.json"

[sources.wiki]
code = "SRCWT"
label = "SourceWatch"
file = "wiki.csv"
"#;

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn seed(dir: &Path) {
    write(dir, "fuel.csv", "label,aliases\nCoal,coal,hard coal\nGas,gas,natural gas\nHydro,hydro,water\n");
    write(
        dir,
        "countries.csv",
        "name,iso3,iso2,has_api,use_geo,geo_name,carma_name,fusion_table_id\n\
         Chile,CHL,CL,1,0,,,\n\
         Ruritania,RUR,RU,0,0,Ruritania Republic,RURITANIA,\n",
    );
    write(dir, "concordance.csv", "wri,geo,carma,osm\n1,5,,\n2,,8,\n");
    write(
        dir,
        "source_databases/CHL.json",
        r#"[{"id": "CHL0000001", "name": "Ralco", "country": "Chile", "capacity_mw": 690,
             "fuel": ["water"], "location": {"latitude": -38.0, "longitude": -71.5},
             "generation": [{"gwh": 2500.0, "start_date": "2017-01-01", "end_date": "2017-12-31"}]}]"#,
    );
    write(
        dir,
        "wri.json",
        r#"[
            {"id": "WRI0000001", "name": "North", "country": "Ruritania Republic", "capacity_mw": 300, "fuel": ["Hard Coal"]},
            {"id": "WRI0000002", "name": "South", "country": "Ruritania", "capacity_mw": 50, "fuel": ["natural gas"]},
            {"id": "WRI0000003", "name": "Shadowed", "country": "Chile", "capacity_mw": 80,
             "location": {"latitude": -33.0, "longitude": -70.0}}
        ]"#,
    );
    write(
        dir,
        "geo.json",
        r#"[{"id": "GEODB0000005", "name": "North (geo)", "country": "Ruritania", "location": {"latitude": 45.1, "longitude": 19.2}}]"#,
    );
    write(
        dir,
        "carma.json",
        r#"[{"id": "CARMA0000008", "name": "SOUTH", "country": "RURITANIA", "location": {"latitude": 44.0, "longitude": 20.0}}]"#,
    );
    write(dir, "wiki.csv", "name,id,country,latitude,longitude\nHilltop,SRCWT0000001,Ruritania,43.5,21.0\n");
}

struct Loaded {
    config: ConflateConfig,
    result: plantreg_conflate::ConflateResult,
}

fn load_and_run(dir: &Path) -> Loaded {
    let config = ConflateConfig::from_toml(CONFIG).unwrap();
    let fuel = load_fuel_thesaurus(&dir.join("fuel.csv")).unwrap();
    let countries = load_country_reference(&dir.join("countries.csv")).unwrap();
    let country_names = countries.thesaurus().unwrap();
    let vocabulary = Some(Vocabulary {
        fuel: &fuel,
        country: &country_names,
    });
    let codes = config.concordance_codes().unwrap();
    let concordance = load_concordance(&dir.join("concordance.csv"), codes.clone()).unwrap();

    let source = |file: &str, code| -> Dataset { load_dataset(&dir.join(file), code, vocabulary).unwrap() };
    let input = ConflateInput {
        national: load_national_datasets(&dir.join("source_databases"), &countries, vocabulary).unwrap(),
        global: source("wri.json", &codes.global),
        geolocation: source("geo.json", &codes.geolocation),
        carbon: source("carma.json", &codes.carbon),
        wiki: source("wiki.csv", &config.wiki_code().unwrap()),
    };

    let result = run(&config, &countries, &concordance, &input).unwrap();
    Loaded { config, result }
}

#[test]
fn registry_from_files() {
    let dir = tempdir().unwrap();
    seed(dir.path());
    let Loaded { result, .. } = load_and_run(dir.path());

    let ids: Vec<String> = result.registry.records().map(|r| r.id.to_string()).collect();
    assert_eq!(ids, ["CHL0000001", "SRCWT0000001", "WRI0000001", "WRI0000002"]);

    let north = result.registry.get(&"WRI0000001".parse().unwrap()).unwrap();
    assert_eq!(north.record.country.as_deref(), Some("Ruritania"));
    assert_eq!(north.record.fuel.iter().next().map(String::as_str), Some("Coal"));
    assert_eq!(north.record.location.coordinates(), Some((45.1, 19.2)));

    let ralco = result.registry.get(&"CHL0000001".parse().unwrap()).unwrap();
    assert_eq!(ralco.record.fuel.iter().next().map(String::as_str), Some("Hydro"));
}

#[test]
fn registry_csv_round_trip() {
    let dir = tempdir().unwrap();
    seed(dir.path());
    let Loaded { config, result } = load_and_run(dir.path());

    let out = dir.path().join("output/registry.csv");
    let written = write_registry_csv(&out, &result.registry, &config.generation_years).unwrap();
    assert_eq!(written, 4);

    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().next(), Some(WARNING_BANNER));

    let rows = read_registry_csv(&out).unwrap();
    assert_eq!(rows.len(), 4);
    let ralco = rows.iter().find(|r| r.id == "CHL0000001").unwrap();
    assert_eq!(ralco.capacity_mw, Some(690.0));
    assert_eq!(ralco.generation_for(2017), Some(2500.0));
    assert_eq!(ralco.generation_for(2016), None);
    assert_eq!(ralco.geolocation_source.as_deref(), Some("Chile national data"));

    let south = rows.iter().find(|r| r.id == "WRI0000002").unwrap();
    assert_eq!(south.geolocation_source.as_deref(), Some("CARMA data"));
    assert_eq!(south.fuels, ["Gas"]);
}

#[test]
fn dump_lists_every_candidate() {
    let dir = tempdir().unwrap();
    seed(dir.path());
    let Loaded { config, result } = load_and_run(dir.path());

    let out = dir.path().join("output/dump.csv");
    write_dump_csv(&out, &result.audit, &config.generation_years).unwrap();
    let rows = read_registry_csv(&out).unwrap();

    let by_id: BTreeMap<&str, _> = rows.iter().map(|r| (r.id.as_str(), r)).collect();
    assert_eq!(by_id["WRI0000003"].in_registry, Some(false));
    assert_eq!(by_id["WRI0000001"].in_registry, Some(true));
    let carma = by_id["CARMA0000008"];
    assert_eq!(carma.in_registry, Some(false));
    assert_eq!(carma.consumed_by.as_deref(), Some("WRI0000002"));
}

#[test]
fn csv_copies_into_sqlite() {
    let dir = tempdir().unwrap();
    seed(dir.path());
    let Loaded { config, result } = load_and_run(dir.path());

    let csv_path = dir.path().join("registry.csv");
    write_registry_csv(&csv_path, &result.registry, &config.generation_years).unwrap();
    let db = dir.path().join("registry.sqlite");
    assert_eq!(copy_csv_to_sqlite(&csv_path, &db).unwrap(), 4);

    let conn = rusqlite::Connection::open(&db).unwrap();
    let name: String = conn
        .query_row("SELECT name FROM powerplants WHERE id = 'WRI0000001'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(name, "North");
}

#[test]
fn missing_national_dataset_is_error() {
    let dir = tempdir().unwrap();
    seed(dir.path());
    fs::remove_file(dir.path().join("source_databases/CHL.json")).unwrap();
    let countries = load_country_reference(&dir.path().join("countries.csv")).unwrap();
    let err = load_national_datasets(&dir.path().join("source_databases"), &countries, None).unwrap_err();
    assert!(err.to_string().contains("Chile"));
}

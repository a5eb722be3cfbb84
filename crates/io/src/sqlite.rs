// SQLite copy of the registry

use std::path::Path;

use rusqlite::{params, Connection};

use crate::dataset::read_registry_csv;
use crate::error::IoError;
use crate::row::RegistryRow;

const SCHEMA: &str = r#"
CREATE TABLE powerplants (
    name TEXT NOT NULL,
    id TEXT NOT NULL UNIQUE,
    capacity_mw REAL,
    year_of_capacity_data INTEGER,
    country TEXT,
    owner TEXT,
    source TEXT,
    url TEXT,
    latitude REAL,
    longitude REAL,
    fuel1 TEXT,
    fuel2 TEXT,
    fuel3 TEXT,
    fuel4 TEXT,
    commissioning_year REAL,
    estimated_generation_gwh REAL,
    geolocation_source TEXT
);

CREATE TABLE annual_generation (
    id TEXT NOT NULL REFERENCES powerplants (id),
    year INTEGER NOT NULL,
    gwh REAL NOT NULL,
    PRIMARY KEY (id, year)
);
"#;

fn table_exists(conn: &Connection, name: &str) -> Result<bool, IoError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Write registry rows into a new `powerplants` table. Refuses to touch a
/// database that already has one.
pub fn write_sqlite(path: &Path, rows: &[RegistryRow]) -> Result<usize, IoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| IoError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut conn = Connection::open(path)?;
    if table_exists(&conn, "powerplants")? {
        return Err(IoError::TableExists {
            path: path.to_path_buf(),
        });
    }

    // Schema and rows commit together; a failed insert leaves no tables behind
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA)?;
    {
        let mut plant = tx.prepare(
            "INSERT INTO powerplants (name, id, capacity_mw, year_of_capacity_data, country, owner, source, url,
                latitude, longitude, fuel1, fuel2, fuel3, fuel4, commissioning_year, estimated_generation_gwh,
                geolocation_source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        )?;
        let mut generation = tx.prepare("INSERT INTO annual_generation (id, year, gwh) VALUES (?1, ?2, ?3)")?;

        for row in rows {
            let fuel = |i: usize| row.fuels.get(i).cloned();
            plant.execute(params![
                row.name,
                row.id,
                row.capacity_mw,
                row.capacity_year,
                row.country,
                row.owner,
                row.source,
                row.url,
                row.latitude,
                row.longitude,
                fuel(0),
                fuel(1),
                fuel(2),
                fuel(3),
                row.commissioning_year,
                row.estimated_generation_gwh,
                row.geolocation_source,
            ])?;
            for &(year, gwh) in &row.generation {
                if let Some(gwh) = gwh {
                    generation.execute(params![row.id, year, gwh])?;
                }
            }
        }
    }
    tx.commit()?;

    tracing::info!(rows = rows.len(), path = %path.display(), "wrote SQLite registry");
    Ok(rows.len())
}

/// Copy a registry CSV into a new SQLite database.
pub fn copy_csv_to_sqlite(csv_path: &Path, sqlite_path: &Path) -> Result<usize, IoError> {
    let rows = read_registry_csv(csv_path)?;
    write_sqlite(sqlite_path, &rows)
}

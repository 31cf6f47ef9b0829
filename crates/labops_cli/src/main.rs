//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `labops_core` linkage and print the core version.
//! - Given a database path, open and migrate it, then print row counts.
//! - Write logs to `logs/` next to the database file.
//!
//! Usage: `labops [DB_PATH [CONFIG_JSON]]`

use labops_core::db::migrations::current_user_version;
use labops_core::{
    core_version, default_log_level, init_logging, open_db_with_options, ping, CoreConfig,
    StoreOptions,
};
use log::{error, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const LOG_DIR_NAME: &str = "logs";

const COUNTED_TABLES: [&str; 6] = [
    "users",
    "reports",
    "tasks",
    "inventory_items",
    "audit_trail",
    "activity_logs",
];

fn main() -> ExitCode {
    println!("labops_core ping={}", ping());
    println!("labops_core version={}", core_version());

    let mut args = std::env::args().skip(1);
    let Some(db_path) = args.next() else {
        return ExitCode::SUCCESS;
    };
    start_logging(&db_path);

    let code = match describe_store(&db_path, args.next().as_deref()) {
        Ok(()) => {
            info!("event=cli_store module=cli status=ok db_path={db_path}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            error!("event=cli_store module=cli status=error error={message}");
            eprintln!("labops: {message}");
            ExitCode::FAILURE
        }
    };
    // The logger lives in a static and is never dropped.
    log::logger().flush();
    code
}

/// Logging failures are reported on stderr and never stop the command.
fn start_logging(db_path: &str) {
    let result = log_dir_for(Path::new(db_path)).and_then(|dir| {
        init_logging(default_log_level(), &dir.to_string_lossy()).map_err(|err| err.to_string())
    });
    if let Err(message) = result {
        eprintln!("labops: logging disabled: {message}");
    }
}

fn log_dir_for(db_path: &Path) -> Result<PathBuf, String> {
    let db_path = if db_path.is_absolute() {
        db_path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|err| format!("cannot resolve working directory: {err}"))?
            .join(db_path)
    };
    let parent = db_path.parent().unwrap_or(Path::new("/"));
    Ok(parent.join(LOG_DIR_NAME))
}

fn describe_store(db_path: &str, config_path: Option<&str>) -> Result<(), String> {
    let config = match config_path {
        Some(path) => CoreConfig::from_json_file(path).map_err(|err| err.to_string())?,
        None => CoreConfig::default(),
    };
    let conn = open_db_with_options(db_path, StoreOptions::from(&config))
        .map_err(|err| format!("cannot open `{db_path}`: {err}"))?;
    let version = current_user_version(&conn).map_err(|err| err.to_string())?;
    println!("schema_version={version}");
    for table in COUNTED_TABLES {
        println!("{table}={}", count_rows(&conn, table)?);
    }
    Ok(())
}

fn count_rows(conn: &Connection, table: &str) -> Result<i64, String> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .map_err(|err| format!("cannot count `{table}`: {err}"))
}

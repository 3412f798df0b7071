//! CLI smoke entry point.
//!
//! Prints core linkage info and, when `TENANTDOCS_DB_PATH` is set, opens that
//! database (migrating it) and reports its schema version.

use std::process::ExitCode;
use tenantdocs_core::db::migrations::current_user_version;
use tenantdocs_core::db::open_db;
use tenantdocs_core::{init_logging_from_config, CoreConfig};

fn main() -> ExitCode {
    let config = CoreConfig::from_env();
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("tenantdocs logging disabled: {err}");
    }

    println!("tenantdocs_core ping={}", tenantdocs_core::ping());
    println!("tenantdocs_core version={}", tenantdocs_core::core_version());

    let Some(path) = config.db_path.as_deref() else {
        return ExitCode::SUCCESS;
    };

    match open_db(path).and_then(|conn| current_user_version(&conn)) {
        Ok(version) => {
            println!("tenantdocs_core schema_version={version}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("event=cli_open module=cli status=error error={err}");
            eprintln!("failed to open `{}`: {err}", path.display());
            ExitCode::FAILURE
        }
    }
}

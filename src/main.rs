// ==========================================
// Vending Sales Ingest - CLI entry
// ==========================================
// Usage: vending-ingest <file.csv> [db_path]
// Prints the upload response as JSON; non-200 exits with status 1.
// ==========================================

use std::path::Path;
use std::process::ExitCode;
use vending_sales::api::UploadApi;
use vending_sales::db::{
    get_default_db_path, init_schema, open_sqlite_connection, read_schema_version,
};
use vending_sales::logging;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let mut args = std::env::args().skip(1);
    let Some(file_arg) = args.next() else {
        eprintln!("usage: vending-ingest <file.csv> [db_path]");
        return ExitCode::from(2);
    };
    let db_path = args.next().unwrap_or_else(get_default_db_path);

    tracing::info!(
        version = vending_sales::VERSION,
        db_path = %db_path,
        "{}",
        vending_sales::APP_NAME
    );

    if let Err(e) = prepare_database(&db_path) {
        tracing::error!(error = %e, db_path = %db_path, "database initialization failed");
        return ExitCode::FAILURE;
    }

    let path = Path::new(&file_arg);
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(error = %e, file = %file_arg, "cannot read upload");
            return ExitCode::FAILURE;
        }
    };
    let file_name = path.file_name().and_then(|n| n.to_str());

    let api = UploadApi::new(db_path);
    let (status, body) = api.handle(file_name, &content).await;

    match serde_json::to_string_pretty(&body) {
        Ok(text) => println!("{}", text),
        Err(e) => tracing::error!(error = %e, "cannot render response"),
    }

    if status == 200 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn prepare_database(db_path: &str) -> rusqlite::Result<()> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    let version = read_schema_version(&conn)?;
    tracing::debug!(schema_version = ?version, "database ready");
    Ok(())
}

//! One-shot data migration: rewrite care-type fields between the legacy
//! French labels ("plein", "soir", ...) and the integer storage codes.
//!
//! Usage: convert-care-types <forward|backward>

use famille_search::config::Settings;
use famille_search::services::{PostgresClient, RemapDirection};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt().with_target(false).init();

    let direction = match std::env::args().nth(1).as_deref() {
        Some("forward") => RemapDirection::Forward,
        Some("backward") => RemapDirection::Backward,
        _ => {
            eprintln!("usage: convert-care-types <forward|backward>");
            std::process::exit(2);
        }
    };

    let settings = Settings::load()?;

    let postgres = PostgresClient::from_settings(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.min_connections,
    )
    .await?;

    let updated = postgres.convert_care_types(direction).await?;

    info!("Rewrote care_types on {} rows", updated);

    Ok(())
}

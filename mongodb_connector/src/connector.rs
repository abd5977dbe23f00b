use common::config::SETTINGS;
use mongodb::{Client, Database};

use crate::errors::PersistenceError;

/// Opens the single `mongodb::Client` (itself internally pooled) shared by
/// every store in the process, returning it alongside the configured
/// database handle; `CatalogStore` needs the bare client to start the
/// sessions its transactions run in.
pub async fn connect() -> Result<(Client, Database), PersistenceError> {
    let client = Client::with_uri_str(&SETTINGS.mongo_uri).await?;
    let db = client.database(&SETTINGS.database_name);

    Ok((client, db))
}

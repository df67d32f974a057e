use mongodb::{Client, Database};

use crate::{error::StoreError, models::worker::Worker};

#[cfg(test)]
pub mod memory;
pub mod mongo;

pub async fn connect(uri: &str, name: &str) -> Result<Database, StoreError> {
    let client = Client::with_uri_str(uri).await?;
    Ok(client.database(name))
}

/// Persistence boundary for worker records.
///
/// Every write touches exactly one document, so a failed call leaves the
/// stored record as it was.
#[allow(async_fn_in_trait)]
pub trait WorkerStore {
    /// Assigns a fresh identifier to `worker` and inserts it.
    async fn insert(&self, worker: &mut Worker) -> Result<i64, StoreError>;
    async fn find_by_id(&self, _id: i64) -> Result<Option<Worker>, StoreError>;
    /// Replaces the stored document with the same `_id`. Returns `false` when
    /// no such document exists.
    async fn replace(&self, worker: &Worker) -> Result<bool, StoreError>;
}

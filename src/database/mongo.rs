use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, ReturnDocument},
    Collection, Database,
};

use super::WorkerStore;
use crate::{error::StoreError, models::worker::Worker};

const WORKERS: &str = "workers";
const COUNTERS: &str = "counters";

#[derive(Clone)]
pub struct MongoWorkerStore {
    workers: Collection<Worker>,
    counters: Collection<Document>,
}

impl MongoWorkerStore {
    pub fn new(db: &Database) -> Self {
        MongoWorkerStore {
            workers: db.collection::<Worker>(WORKERS),
            counters: db.collection::<Document>(COUNTERS),
        }
    }
    async fn next_id(&self) -> Result<i64, StoreError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        self.counters
            .find_one_and_update(
                doc! { "_id": WORKERS },
                doc! { "$inc": { "seq": 1_i64 } },
                options,
            )
            .await?
            .and_then(|counter| counter.get_i64("seq").ok())
            .ok_or_else(|| StoreError::Rejected("WORKER_ID_UNAVAILABLE".to_string()))
    }
}

impl WorkerStore for MongoWorkerStore {
    async fn insert(&self, worker: &mut Worker) -> Result<i64, StoreError> {
        let _id = self.next_id().await?;
        worker._id = Some(_id);

        self.workers
            .insert_one(&*worker, None)
            .await
            .map_err(StoreError::from)
            .map(|_| _id)
    }
    async fn find_by_id(&self, _id: i64) -> Result<Option<Worker>, StoreError> {
        self.workers
            .find_one(doc! { "_id": _id }, None)
            .await
            .map_err(StoreError::from)
    }
    async fn replace(&self, worker: &Worker) -> Result<bool, StoreError> {
        let _id = worker
            ._id
            .ok_or_else(|| StoreError::Rejected("WORKER_ID_MISSING".to_string()))?;

        self.workers
            .replace_one(doc! { "_id": _id }, worker, None)
            .await
            .map_err(StoreError::from)
            .map(|result| result.matched_count == 1)
    }
}

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use super::WorkerStore;
use crate::{error::StoreError, models::worker::Worker};

/// In-process store for tests. `reject_writes` makes every write fail the
/// way a storage-side constraint violation would.
#[derive(Default)]
pub struct MemoryWorkerStore {
    workers: Mutex<BTreeMap<i64, Worker>>,
    reject_writes: AtomicBool,
}

impl MemoryWorkerStore {
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }
    pub fn count(&self) -> usize {
        self.workers.lock().unwrap().len()
    }
    fn check_writable(&self) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            Err(StoreError::Rejected("WRITE_REJECTED".to_string()))
        } else {
            Ok(())
        }
    }
}

impl WorkerStore for MemoryWorkerStore {
    async fn insert(&self, worker: &mut Worker) -> Result<i64, StoreError> {
        self.check_writable()?;
        let mut workers = self.workers.lock().unwrap();
        let _id = workers.keys().next_back().map_or(1, |last| last + 1);
        worker._id = Some(_id);
        workers.insert(_id, worker.clone());
        Ok(_id)
    }
    async fn find_by_id(&self, _id: i64) -> Result<Option<Worker>, StoreError> {
        Ok(self.workers.lock().unwrap().get(&_id).cloned())
    }
    async fn replace(&self, worker: &Worker) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut workers = self.workers.lock().unwrap();
        match worker._id.and_then(|_id| workers.get_mut(&_id)) {
            Some(stored) => {
                *stored = worker.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

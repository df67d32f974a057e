use chrono::{DateTime, Utc};
use log::{error, info, warn};

use crate::{
    database::WorkerStore,
    error::WorkerError,
    models::{
        actor::Actor,
        worker::{to_bson_datetime, Worker, WorkerForm},
    },
};

fn report(error: WorkerError) -> WorkerError {
    match &error {
        WorkerError::Persistence(cause) => error!("worker persistence failed: {cause}"),
        WorkerError::Validation(invalid) => {
            warn!("worker submission rejected: invalid {}", invalid.field())
        }
        _ => warn!("worker submission rejected: {error}"),
    }
    error
}

/// Validates `form` and stores it as a new worker attributed to `actor`.
/// Resubmitting the same form creates another record.
pub async fn register<S: WorkerStore>(
    store: &S,
    form: WorkerForm,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<i64, WorkerError> {
    Actor::check(actor).map_err(|e| report(e.into()))?;
    let today = now.date_naive();
    let profile = form.into_profile(today).map_err(|e| report(e.into()))?;
    let mut worker = Worker::new_registration(profile, today, actor, to_bson_datetime(now));

    let _id = store
        .insert(&mut worker)
        .await
        .map_err(|e| report(e.into()))?;
    info!("worker {_id} registered by {actor}");
    Ok(_id)
}

/// Replaces every submitted field of worker `_id`. Registration audit fields
/// are carried over from the stored record; age is always recomputed.
pub async fn update<S: WorkerStore>(
    store: &S,
    _id: i64,
    form: WorkerForm,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<i64, WorkerError> {
    let current = find(store, _id).await?;
    Actor::check(actor).map_err(|e| report(e.into()))?;

    let today = now.date_naive();
    let profile = form.into_profile(today).map_err(|e| report(e.into()))?;
    let worker = current.revised(profile, today, actor, to_bson_datetime(now));

    match store.replace(&worker).await {
        Ok(true) => {
            info!("worker {_id} updated by {actor}");
            Ok(_id)
        }
        Ok(false) => Err(report(WorkerError::NotFound(_id))),
        Err(e) => Err(report(e.into())),
    }
}

pub async fn find<S: WorkerStore>(store: &S, _id: i64) -> Result<Worker, WorkerError> {
    match store.find_by_id(_id).await {
        Ok(Some(worker)) => Ok(worker),
        Ok(None) => Err(report(WorkerError::NotFound(_id))),
        Err(e) => Err(report(e.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::memory::MemoryWorkerStore,
        error::{StoreError, ValidationError},
        models::worker::sample_form,
    };

    fn at(value: &str) -> DateTime<Utc> {
        value.parse().unwrap()
    }

    /// Reads through to `inner` but reports every replace as unmatched, as
    /// when the document is removed between the read and the write.
    struct VanishingStore {
        inner: MemoryWorkerStore,
    }

    impl WorkerStore for VanishingStore {
        async fn insert(&self, worker: &mut Worker) -> Result<i64, StoreError> {
            self.inner.insert(worker).await
        }
        async fn find_by_id(&self, _id: i64) -> Result<Option<Worker>, StoreError> {
            self.inner.find_by_id(_id).await
        }
        async fn replace(&self, _worker: &Worker) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[actix_web::test]
    async fn registered_worker_reads_back_as_submitted() {
        let store = MemoryWorkerStore::default();
        let now = at("2024-06-14T09:00:00Z");

        let _id = register(&store, sample_form(), "tanaka", now).await.unwrap();
        let worker = find(&store, _id).await.unwrap();

        let expected = sample_form().into_profile(now.date_naive()).unwrap();
        assert_eq!(worker._id, Some(_id));
        assert_eq!(worker.profile, expected);
        assert_eq!(worker.age, 23);
        assert_eq!(worker.registered_by, "tanaka");
        assert_eq!(worker.modified_by, "tanaka");
        assert_eq!(worker.registration_date, to_bson_datetime(now));
        assert_eq!(worker.last_modified_date, to_bson_datetime(now));
    }

    #[actix_web::test]
    async fn resubmission_creates_a_second_record() {
        let store = MemoryWorkerStore::default();
        let now = at("2024-06-14T09:00:00Z");

        let first = register(&store, sample_form(), "tanaka", now).await.unwrap();
        let second = register(&store, sample_form(), "tanaka", now).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.count(), 2);
    }

    #[actix_web::test]
    async fn invalid_registration_stores_nothing() {
        let store = MemoryWorkerStore::default();
        let now = at("2024-06-14T09:00:00Z");

        let mut form = sample_form();
        form.name = None;
        let result = register(&store, form, "tanaka", now).await;
        assert!(matches!(
            result,
            Err(WorkerError::Validation(ValidationError::Missing("name")))
        ));

        let mut form = sample_form();
        form.visa_expiry = Some("15/06/2024".to_string());
        let result = register(&store, form, "tanaka", now).await;
        assert!(matches!(
            result,
            Err(WorkerError::Validation(ValidationError::InvalidDate { .. }))
        ));

        assert_eq!(store.count(), 0);
    }

    #[actix_web::test]
    async fn rejected_insert_reports_cause() {
        let store = MemoryWorkerStore::default();
        store.reject_writes(true);

        let error = register(&store, sample_form(), "tanaka", at("2024-06-14T09:00:00Z"))
            .await
            .unwrap_err();

        assert!(matches!(error, WorkerError::Persistence(_)));
        assert!(error.to_string().contains("WRITE_REJECTED"));
        assert_eq!(store.count(), 0);
    }

    #[actix_web::test]
    async fn update_of_unknown_worker_is_not_found() {
        let store = MemoryWorkerStore::default();

        let result = update(
            &store,
            999999,
            sample_form(),
            "tanaka",
            at("2024-06-14T09:00:00Z"),
        )
        .await;

        assert!(matches!(result, Err(WorkerError::NotFound(999999))));
    }

    #[actix_web::test]
    async fn worker_removed_before_replace_is_not_found() {
        let store = VanishingStore {
            inner: MemoryWorkerStore::default(),
        };
        let _id = register(&store, sample_form(), "tanaka", at("2024-06-14T09:00:00Z"))
            .await
            .unwrap();
        let before = find(&store, _id).await.unwrap();

        let mut form = sample_form();
        form.name = Some("別名".to_string());
        let result = update(&store, _id, form, "suzuki", at("2024-06-16T09:00:00Z")).await;

        assert!(matches!(result, Err(WorkerError::NotFound(id)) if id == _id));
        let after = find(&store, _id).await.unwrap();
        assert_eq!(after.profile, before.profile);
        assert_eq!(after.modified_by, "tanaka");
        assert_eq!(after.last_modified_date, before.last_modified_date);
    }

    #[actix_web::test]
    async fn overlong_actor_is_rejected() {
        let store = MemoryWorkerStore::default();
        let actor = "a".repeat(101);

        let result = register(&store, sample_form(), &actor, at("2024-06-14T09:00:00Z")).await;
        assert!(matches!(
            result,
            Err(WorkerError::Validation(ValidationError::TooLong { field: "actor", max: 100 }))
        ));
        assert_eq!(store.count(), 0);

        let name = "a".repeat(100);
        let _id = register(&store, sample_form(), &name, at("2024-06-14T09:00:00Z"))
            .await
            .unwrap();
        let result = update(&store, _id, sample_form(), &actor, at("2024-06-15T09:00:00Z")).await;
        assert!(matches!(result, Err(WorkerError::Validation(_))));
        assert_eq!(find(&store, _id).await.unwrap().modified_by, name);
    }

    #[actix_web::test]
    async fn updates_keep_registration_and_advance_modification() {
        let store = MemoryWorkerStore::default();
        let registered_at = at("2024-06-14T09:00:00Z");
        let _id = register(&store, sample_form(), "tanaka", registered_at)
            .await
            .unwrap();

        let mut previous = find(&store, _id).await.unwrap().last_modified_date;
        for (actor, time) in [
            ("suzuki", "2024-06-15T10:00:00Z"),
            ("sato", "2024-06-15T10:00:00Z"),
            ("takahashi", "2024-07-01T08:30:00Z"),
        ] {
            let mut form = sample_form();
            form.phone = Some(format!("070-0000-{}", actor.len()));
            update(&store, _id, form, actor, at(time)).await.unwrap();

            let worker = find(&store, _id).await.unwrap();
            assert_eq!(worker.registration_date, to_bson_datetime(registered_at));
            assert_eq!(worker.registered_by, "tanaka");
            assert_eq!(worker.modified_by, actor);
            assert!(worker.last_modified_date >= previous);
            previous = worker.last_modified_date;
        }
    }

    #[actix_web::test]
    async fn update_recomputes_age_from_submitted_birth_date() {
        let store = MemoryWorkerStore::default();
        let _id = register(&store, sample_form(), "tanaka", at("2024-06-14T09:00:00Z"))
            .await
            .unwrap();
        assert_eq!(find(&store, _id).await.unwrap().age, 23);

        update(&store, _id, sample_form(), "tanaka", at("2024-06-15T09:00:00Z"))
            .await
            .unwrap();
        assert_eq!(find(&store, _id).await.unwrap().age, 24);
    }

    #[actix_web::test]
    async fn same_update_twice_yields_same_fields() {
        let store = MemoryWorkerStore::default();
        let _id = register(&store, sample_form(), "tanaka", at("2024-06-14T09:00:00Z"))
            .await
            .unwrap();

        let mut form = sample_form();
        form.address = Some("大阪府大阪市北区梅田".to_string());
        form.building_name = None;

        update(&store, _id, form.clone(), "suzuki", at("2024-06-16T09:00:00Z"))
            .await
            .unwrap();
        let first = find(&store, _id).await.unwrap();
        update(&store, _id, form, "suzuki", at("2024-06-17T09:00:00Z"))
            .await
            .unwrap();
        let second = find(&store, _id).await.unwrap();

        assert_eq!(first.profile, second.profile);
        assert_eq!(first.age, second.age);
        assert_eq!(second.profile.building_name, None);
        assert!(second.last_modified_date > first.last_modified_date);
    }

    #[actix_web::test]
    async fn failed_update_leaves_record_untouched() {
        let store = MemoryWorkerStore::default();
        let _id = register(&store, sample_form(), "tanaka", at("2024-06-14T09:00:00Z"))
            .await
            .unwrap();
        let before = find(&store, _id).await.unwrap();

        let mut form = sample_form();
        form.passport_expiry = Some("2030/01/09".to_string());
        let result = update(&store, _id, form, "suzuki", at("2024-06-16T09:00:00Z")).await;
        assert!(matches!(result, Err(WorkerError::Validation(_))));

        store.reject_writes(true);
        let mut form = sample_form();
        form.name = Some("別名".to_string());
        let result = update(&store, _id, form, "suzuki", at("2024-06-16T09:00:00Z")).await;
        assert!(matches!(result, Err(WorkerError::Persistence(_))));

        let after = find(&store, _id).await.unwrap();
        assert_eq!(after.profile, before.profile);
        assert_eq!(after.modified_by, "tanaka");
        assert_eq!(after.last_modified_date, before.last_modified_date);
    }
}

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;

use crate::{
    database::WorkerStore,
    error::WorkerError,
    models::{
        actor::Actor,
        worker::{WorkerForm, WorkerOperationResponse},
    },
    services::worker,
};

// Handlers are generic over the store, so they are mounted here instead of
// with the `#[get]`/`#[post]`/`#[put]` attributes.
pub fn configure<S: WorkerStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/workers").route(web::post().to(create_worker::<S>)))
        .service(
            web::resource("/workers/{worker_id}")
                .route(web::get().to(get_worker::<S>))
                .route(web::put().to(update_worker::<S>))
                .route(web::post().to(update_worker::<S>)),
        );
}

fn parse_id(worker_id: &str) -> Result<i64, WorkerError> {
    worker_id
        .parse()
        .map_err(|_| WorkerError::InvalidId(worker_id.to_string()))
}

pub async fn get_worker<S: WorkerStore + 'static>(
    store: web::Data<S>,
    worker_id: web::Path<String>,
) -> Result<HttpResponse, WorkerError> {
    let worker_id = parse_id(&worker_id)?;

    let worker = worker::find(store.get_ref(), worker_id).await?;
    Ok(HttpResponse::Ok().json(worker.into_response(Utc::now().date_naive())))
}
pub async fn create_worker<S: WorkerStore + 'static>(
    store: web::Data<S>,
    payload: web::Form<WorkerForm>,
    req: HttpRequest,
) -> Result<HttpResponse, WorkerError> {
    let actor = Actor::resolve(&req);

    let worker_id =
        worker::register(store.get_ref(), payload.into_inner(), &actor, Utc::now()).await?;
    Ok(HttpResponse::Created().json(WorkerOperationResponse::succeeded(worker_id)))
}
pub async fn update_worker<S: WorkerStore + 'static>(
    store: web::Data<S>,
    worker_id: web::Path<String>,
    payload: web::Form<WorkerForm>,
    req: HttpRequest,
) -> Result<HttpResponse, WorkerError> {
    let worker_id = parse_id(&worker_id)?;
    let actor = Actor::resolve(&req);

    worker::update(
        store.get_ref(),
        worker_id,
        payload.into_inner(),
        &actor,
        Utc::now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(WorkerOperationResponse::succeeded(worker_id)))
}

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};
use std::io;

mod config;
mod database;
mod error;
mod models;
mod routes;
mod services;

use config::Config;
use database::mongo::MongoWorkerStore;
use models::actor::ActorMiddlewareFactory;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        error!("invalid configuration: {e}");
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let db = database::connect(&config.mongodb_uri, &config.mongodb_database)
        .await
        .map_err(|e| {
            error!("failed to connect to database: {e}");
            io::Error::other(e)
        })?;
    let store = web::Data::new(MongoWorkerStore::new(&db));

    let actor_header = config.actor_header.clone();
    let allowed_origin = config.allowed_origin.clone();

    info!(
        "worker registry listening on {}:{} (database {})",
        config.host, config.port, config.mongodb_database
    );

    HttpServer::new(move || {
        let cors = match &allowed_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allowed_methods(vec!["GET", "POST", "PUT"])
                .allow_any_header(),
            None => Cors::default(),
        };

        App::new()
            .app_data(store.clone())
            .wrap(ActorMiddlewareFactory::new(actor_header.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(routes::worker::configure::<MongoWorkerStore>)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

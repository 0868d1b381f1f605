use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use drawing_server::config::Config;
use drawing_server::diagram_store::DiagramStore;
use drawing_server::handlers;
use drawing_server::server::spawn_server;

fn cors(allowed_origins: &[String]) -> Cors {
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(std::io::Error::other)?;

    let store = match &config.data_file {
        Some(path) => DiagramStore::open(path)
            .await
            .map_err(std::io::Error::other)?,
        None => {
            log::warn!("No data file configured; diagrams are kept in memory only");
            DiagramStore::in_memory()
        }
    };
    let store = web::Data::new(store);
    let relay = web::Data::new(spawn_server(config.outbox_capacity));

    log::info!("Listening on {}", config.bind_address);
    let allowed_origins = config.allowed_origins.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(cors(&allowed_origins))
            .wrap(Logger::default())
            .app_data(store.clone())
            .app_data(relay.clone())
            .configure(handlers::root)
    })
    .bind(config.bind_address.as_str())?
    .run()
    .await
}

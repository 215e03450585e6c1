use actix_web::{App, HttpServer};
use dotenv::dotenv;

use astro_engine::app::{init_app, register_state};
use astro_engine::config::app_config::AppConfig;
use astro_engine::db::setup_database;
use astro_engine::logger::init_logger;
use astro_engine::services::{build_ai_clients, Services};

fn startup_error(e: anyhow::Error) -> std::io::Error {
    log::error!("Fallo al iniciar la API: {:?}", e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{:#}", e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = AppConfig::from_env().map_err(startup_error)?;

    // Conectarnos a la DB (crea el archivo y corre migraciones)
    let db_pool = setup_database(&config.database_url)
        .await
        .map_err(startup_error)?;

    let services = Services::build(db_pool.clone(), &config, build_ai_clients(&config));
    let state = register_state(services, config.clone(), db_pool);

    // Levantar servidor
    log::info!(
        "Levantando servidor en 0.0.0.0:{} con {} workers",
        config.port,
        config.http_workers
    );
    HttpServer::new(move || App::new().configure(state.clone()).configure(init_app))
        .workers(config.http_workers)
        .bind(("0.0.0.0", config.port))?
        .run()
        .await
}

use actix_web::{App, HttpServer, middleware, web};
use dotenvy::dotenv;

use pion_catalog::config::ServerConfig;
use pion_catalog::db::{establish_connection_pool, run_migrations};
use pion_catalog::repository::DieselRepository;
use pion_catalog::routes::{configure_api, front_end, uploads};
use pion_catalog::storage::FileSystemStorage;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok(); // Load .env file

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let pool = match establish_connection_pool(&config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    match run_migrations(&pool) {
        Ok(0) => {}
        Ok(applied) => log::info!("Applied {applied} database migration(s)"),
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    }

    let repo = DieselRepository::new(pool);

    let storage = FileSystemStorage::new(&config.uploads_dir);
    if let Err(e) = storage.ensure_root() {
        log::error!(
            "Failed to prepare uploads directory {}: {e}",
            storage.root().display()
        );
        std::process::exit(1);
    }

    let address = config.address.clone();
    let port = config.port;
    log::info!("Listening on {address}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .configure(configure_api)
            .service(uploads(&config.uploads_dir))
            .service(front_end(&config.static_dir))
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(config.clone()))
    })
    .bind((address, port))?
    .run()
    .await
}

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use chrono::Datelike;
use dotenvy::dotenv;
use std::time::Duration;

use leave_engine::config::Config;
use leave_engine::db::init_db;
use leave_engine::docs::ApiDoc;
use leave_engine::leave::carry_forward;
use leave_engine::routes;
use leave_engine::store::MySqlStore;

use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Leave engine up"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;
    let store = MySqlStore::new(pool);

    // Yearly carry-forward. One task system-wide; the job skips existing
    // rows, so re-runs after a restart are harmless.
    let store_for_job = store.clone();
    let job_interval = Duration::from_secs(config.carry_forward_interval_hours * 3600);
    actix_web::rt::spawn(async move {
        loop {
            let year = chrono::Utc::now().year();
            if let Err(e) = carry_forward::run(&store_for_job, year).await {
                error!(error = %e, "carry-forward job failed");
            }
            actix_web::rt::time::sleep(job_interval).await;
        }
    });

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(store.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}

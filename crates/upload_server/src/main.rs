use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};
use upload_server::{
    AppState, Config,
    handler::{self, build_cors},
};

#[derive(Parser)]
#[clap(
    name = "upload_server",
    about = "Brokers S3 multipart uploads through pre-signed part URLs"
)]
struct Opt {
    #[clap(short = 'c', long = "config", long_help = "Config file path")]
    config_file: Option<std::path::PathBuf>,
}

#[actix_web::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    // AWS SDK suppression filter
    let third_party_filter =
        "hyper_util=warn,aws_smithy=warn,aws_sdk=warn,actix_web=warn,actix_server=warn,h2=warn";
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .map(|filter| {
                    format!("{filter},{third_party_filter}")
                        .parse()
                        .unwrap_or(filter)
                })
                .unwrap_or_else(|_| format!("info,{third_party_filter}").into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .without_time()
                .with_filter(tracing_subscriber::filter::LevelFilter::ERROR),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_filter(
            tracing_subscriber::filter::filter_fn(|meta| *meta.level() != tracing::Level::ERROR),
        ))
        .init();

    if let Err(e) = dotenv_result
        && !e.not_found()
    {
        warn!("failed to read .env file: {e}");
    }

    let opt = Opt::parse();
    let config = Config::load(opt.config_file.as_deref()).unwrap_or_else(|e| {
        error!("{e}");
        std::process::exit(1);
    });

    if config.with_metrics {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let metrics_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.metrics_port);
        if let Err(e) = PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
        {
            error!("Could not install Prometheus exporter on {metrics_addr}: {e}");
            std::process::exit(1);
        }
        info!(%metrics_addr, "Metrics exporter for Prometheus installed");
    }

    let port = config.port;
    let cors_allow_origins = config.cors_allow_origins.clone();
    let app_state_arc = Arc::new(AppState::new(Arc::new(config)).await);

    let worker_count = num_cpus::get();
    let http_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);

    let http_server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state_arc.clone()))
            .wrap(build_cors(&cors_allow_origins))
            .wrap(Logger::default())
            .configure(handler::configure)
    })
    .workers(worker_count)
    .bind(http_addr)
    .unwrap_or_else(|e| {
        error!("Failed to bind HTTP listener on {http_addr}: {e}");
        std::process::exit(1);
    });

    info!(port, worker_count, "HTTP server started");
    if let Err(e) = http_server.run().await {
        error!("HTTP server stopped: {e}");
    }
}

#[macro_use]
extern crate tracing;

use axum::Router;
use axum_server::{
    tls_rustls::RustlsConfig,
    Handle,
};
use color_eyre::Result;
use eyre::eyre;
use std::time::Duration;
use sync_status_config::{
    Args,
    Config,
    LogFormat,
};
use tokio::net::TcpListener;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub fn init_errors() -> Result<()> {
    color_eyre::install()
}

/// `RUST_LOG` selects the verbosity, `info` when unset.
pub fn init_logging(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = match format {
        LogFormat::Pretty => fmt::layer().boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for ctrl-c, shutting down: {}", e);
    }
    info!("Shutting down");
}

pub async fn start_server(args: Args) -> Result<()> {
    let tls = match (args.tls, &args.certificate, &args.private_key) {
        (true, Some(certificate), Some(private_key)) => Some((certificate.clone(), private_key.clone())),
        (true, _, _) => return Err(eyre!("--tls needs both --certificate and --private-key")),
        (false, _, _) => None,
    };

    let config = Config::new(args)?;
    let address = config.listen_address();
    info!(
        data_dir = %config.data_dir().display(),
        backup_dir = %config.backup_dir().display(),
        features = config.features.enabled_count(),
        "Starting status service"
    );
    let app: Router = sync_status_http::create_router(config);

    if let Some((certificate, private_key)) = tls {
        let rustls_config = RustlsConfig::from_pem_file(certificate, private_key).await?;
        let handle = Handle::new();
        tokio::spawn({
            let handle = handle.clone();
            async move {
                shutdown_signal().await;
                handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
            }
        });

        info!("listening on https://{}", address);
        axum_server::bind_rustls(address, rustls_config)
            .handle(handle)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = TcpListener::bind(address).await?;
        info!("listening on http://{}", address);
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    }

    Ok(())
}

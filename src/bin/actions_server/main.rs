use actions_timing::{server, ActionsTiming};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

mod cli;
mod logging;
mod signals;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Args::parse();
    logging::init(args.log_format);
    let config = args.to_config();

    // Opening runs schema setup, which blocks
    let open_config = config.clone();
    let opened = tokio::task::spawn_blocking(move || ActionsTiming::open(&open_config)).await;
    let service = match opened {
        Ok(Ok(service)) => Arc::new(service),
        Ok(Err(err)) => {
            tracing::error!(
                error = %err,
                db = %config.database_path.display(),
                schema = %config.schema,
                "failed to open store"
            );
            return ExitCode::FAILURE;
        }
        Err(err) => {
            tracing::error!(error = %err, "store setup task failed");
            return ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, bind = %config.bind, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        bind = %config.bind,
        db = %config.database_path.display(),
        schema = %config.schema,
        "actions timing server ready"
    );

    if let Err(err) = server::serve(listener, service, signals::shutdown_signal()).await {
        tracing::error!(error = %err, "server stopped with error");
        return ExitCode::FAILURE;
    }

    tracing::info!("server shutdown complete");
    ExitCode::SUCCESS
}

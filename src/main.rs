use std::process::ExitCode;

use clap::Parser;

use doc_indexer::config::Config;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    match doc_indexer::run(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = e.kind(), "{e}");
            ExitCode::FAILURE
        }
    }
}

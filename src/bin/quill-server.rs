//! quill HTTP server.
//!
//! - `POST /api/generate`: one generation from a multipart form
//! - `POST /api/batch`: one reply per post in `batchPosts`
//! - `GET  /health`: server status
//!
//! Build and run: `cargo run --features server --bin quill-server`

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use miette::{IntoDiagnostic, Result};

use quill::config::QuillConfig;
use quill::generate::Generator;
use quill::paths::QuillPaths;
use quill::server::{AppState, router};

#[derive(Parser)]
#[command(name = "quill-server", version, about = "quill HTTP server")]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/quill/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => QuillPaths::resolve()?.config_file(),
    };
    let mut config = QuillConfig::load_or_default(&config_path)?;
    config.apply_env()?;

    let generator = Generator::from_config(&config)?;
    let addr = config.server.addr();
    tracing::info!(
        model = %config.provider.model,
        pdf_mode = %config.ingest.pdf_mode,
        max_upload_mb = config.server.max_upload_mb,
        "quill server initialized"
    );

    let app = router(Arc::new(AppState::new(config, generator)));

    let listener = tokio::net::TcpListener::bind(&addr).await.into_diagnostic()?;
    tracing::info!("quill server listening on {addr}");
    axum::serve(listener, app).await.into_diagnostic()?;
    Ok(())
}

use cv_image_processor::{init_thread_pool, session, viewer};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "image processor failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let threads = init_thread_pool(None)?;
    tracing::info!(threads, "thread pool ready");

    let session_config = session::SessionConfig::from_env();
    match &session_config.face_cascade {
        Some(path) => tracing::info!(path = %path.display(), "face cascade configured"),
        None => tracing::warn!("no face cascade found; face detection will be unavailable"),
    }
    let viewer_config = viewer::ViewerConfig::from_env()?;

    viewer::run(viewer_config, session::ImageSession::new(session_config))?;
    Ok(())
}

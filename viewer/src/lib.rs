//! Desktop shell: a window with the operation buttons, the image canvas and
//! a status bar, driving a [`cv_session::ImageSession`].

pub mod app;
pub mod config;
pub mod display;

pub use app::ImageProcessorApp;
pub use config::ViewerConfig;
pub use display::{to_color_image, DisplayAdapter};

use cv_session::ImageSession;

pub type Result<T> = std::result::Result<T, ViewerError>;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Invalid viewer configuration: {0}")]
    Config(String),

    #[error("Window error: {0}")]
    Window(#[from] eframe::Error),
}

/// Open the main window and block until it is closed.
pub fn run(config: ViewerConfig, session: ImageSession) -> Result<()> {
    let (width, height) = config.window_size;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.title.clone())
            .with_inner_size([width as f32, height as f32]),
        ..Default::default()
    };

    tracing::info!(width, height, "opening viewer window");
    eframe::run_native(
        &config.title,
        options,
        Box::new(move |_cc| Ok(Box::new(ImageProcessorApp::new(session)))),
    )?;
    tracing::info!("viewer window closed");
    Ok(())
}

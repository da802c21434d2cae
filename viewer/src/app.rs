use crate::display::DisplayAdapter;
use cv_session::{ImageSession, Operation};
use std::path::PathBuf;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// What the user asked for this frame.
enum Action {
    Load(PathBuf),
    Apply(Operation),
    Reset,
}

pub struct ImageProcessorApp {
    session: ImageSession,
    display: DisplayAdapter,
    /// The session image changed and must be uploaded again.
    needs_upload: bool,
}

impl ImageProcessorApp {
    pub fn new(session: ImageSession) -> Self {
        let needs_upload = session.is_loaded();
        Self {
            session,
            display: DisplayAdapter::new(),
            needs_upload,
        }
    }

    pub fn session(&self) -> &ImageSession {
        &self.session
    }

    fn handle(&mut self, action: Action) {
        // Failures are already reported through the session status line.
        let changed = match action {
            Action::Load(path) => self.session.load(path).is_ok(),
            Action::Apply(op) => self.session.apply(op).is_ok(),
            Action::Reset => self.session.reset().is_ok(),
        };
        self.needs_upload |= changed;
    }

    fn controls(&self, ui: &mut egui::Ui) -> Option<Action> {
        let mut action = None;
        ui.vertical_centered_justified(|ui| {
            ui.add_space(8.0);
            if ui.button("Load Image").clicked() {
                action = Some(Action::Load(pick_image_file()));
            }
            ui.separator();
            for op in Operation::menu() {
                if ui.button(op.label()).clicked() {
                    action = Some(Action::Apply(op));
                }
            }
            ui.separator();
            if ui.button("Reset").clicked() {
                action = Some(Action::Reset);
            }
        });
        action
    }
}

impl eframe::App for ImageProcessorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        for path in dropped {
            self.handle(Action::Load(path));
        }

        let action = egui::SidePanel::left("controls")
            .resizable(false)
            .exact_width(180.0)
            .show(ctx, |ui| self.controls(ui))
            .inner;
        if let Some(action) = action {
            self.handle(action);
        }

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(self.session.status());
        });

        if self.needs_upload {
            match self.session.current() {
                Some(buffer) => {
                    self.display.render(ctx, buffer);
                }
                None => self.display.clear(),
            }
            self.needs_upload = false;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| match self.display.texture() {
                Some(texture) => {
                    ui.image((texture.id(), texture.size_vec2()));
                }
                None => {
                    ui.centered_and_justified(|ui| ui.label("Load an image to begin."));
                }
            });
        });
    }
}

/// Ask for an image file. A cancelled dialog yields an empty path, which the
/// session reports as "no file selected".
fn pick_image_file() -> PathBuf {
    rfd::FileDialog::new()
        .set_title("Select an image")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_actions_do_not_trigger_upload() {
        let mut app = ImageProcessorApp::new(ImageSession::default());
        app.handle(Action::Apply(Operation::Grayscale));
        app.handle(Action::Load(PathBuf::new()));
        app.handle(Action::Reset);

        assert!(!app.needs_upload);
        assert_eq!(app.session().status(), "No image loaded. Load an image first.");
    }
}

#[cfg(feature = "gui")]
mod app;

#[cfg(feature = "gui")]
pub fn launch(config: crate::config::Config) {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 700.0]),
        ..Default::default()
    };

    let _ = eframe::run_native(
        "MusicdlGUI",
        options,
        Box::new(move |cc| Ok(Box::new(app::MusicdlApp::new(cc, config)))),
    );
}

mod cli;
mod config;
mod download;
mod error;
mod fsutil;
mod models;
mod results;
mod sources;
mod task;

#[cfg(feature = "gui")]
mod gui;

use clap::Parser;

/// Top-level error boundary: a panic anywhere (including a background task
/// thread) is reported instead of vanishing, and only the faulting thread
/// dies. Installed once at startup.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_hook(info);
        #[cfg(feature = "gui")]
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title("Error")
            .set_description(format!("An unexpected error occurred:\n{info}"))
            .show();
    }));
}

fn main() {
    install_panic_hook();

    let cli = cli::Cli::parse();

    if let Err(e) = cli::run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

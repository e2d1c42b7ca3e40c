use agar_manager::api::ApiClient;
use agar_manager::app::DocumentManager;
use agar_manager::config;
use agar_manager::error::AppError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run() {
        error!(error = %err, "agar-manager exited with an error");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let config = config::load()?;
    let api = ApiClient::new(&config.api.base_url)?;
    let runtime = tokio::runtime::Runtime::new().map_err(AppError::Runtime)?;
    info!(api = %config.api.base_url, "starting Agar document manager");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Agar Document Manager",
        options,
        Box::new(move |cc| Box::new(DocumentManager::new(cc, config, api, runtime))),
    )
    .map_err(|err| AppError::Ui(err.to_string()))
}

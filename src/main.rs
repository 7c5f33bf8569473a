//! Application entry point — recommendation assistant.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime that runs requests and clipboard writes.
//! 4. Build the HTTP recommendation client from config.
//! 5. Load the Whisper model for dictation (optional; dictation reports
//!    itself unsupported without it).
//! 6. Start the clipboard thread, which keeps the copied text served.
//! 7. Wire the [`UiController`] and run [`eframe::run_native`], which blocks
//!    the main thread until the window is closed.

use std::sync::Arc;

use eframe::egui;
use recommend_assistant::{
    app::AssistantApp,
    clipboard::SystemClipboard,
    config::{AppConfig, AppPaths},
    controller::{Services, UiController},
    dictation::WhisperRecognizer,
    recommend::HttpRecommendationClient,
    stt::{SttEngine, TranscribeParams, WhisperEngine},
};

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_title("Recommendation Assistant")
        .with_inner_size([520.0, 220.0])
        .with_min_inner_size([360.0, 140.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

fn load_stt(paths: &AppPaths, config: &AppConfig) -> Option<Arc<dyn SttEngine>> {
    let model_path = paths.model_file(&config.dictation.model);
    match WhisperEngine::load(&model_path, TranscribeParams::default()) {
        Ok(engine) => {
            log::info!("Whisper model loaded: {}", model_path.display());
            Some(Arc::new(engine))
        }
        Err(e) => {
            log::warn!(
                "Could not load Whisper model ({}): {e}. Dictation is disabled.",
                model_path.display()
            );
            None
        }
    }
}

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("recommendation assistant starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Recommendation client
    let client = HttpRecommendationClient::from_config(&config.service);
    log::info!("recommendation endpoint: {}", client.endpoint());

    // 5. Dictation
    let paths = AppPaths::new();
    let recognizer = WhisperRecognizer::new(
        load_stt(&paths, &config),
        paths.model_file(&config.dictation.model),
        config.dictation.clone(),
    );

    // 6. Clipboard thread
    let clipboard = SystemClipboard::spawn().expect("failed to spawn clipboard thread");

    // 7. Controller + window
    let services = Services {
        client: Arc::new(client),
        recognizer: Arc::new(recognizer),
        clipboard: Arc::new(clipboard),
    };
    let controller = UiController::new(services, &config, rt.handle().clone());
    let app = AssistantApp::new(controller);

    eframe::run_native(
        "Recommendation Assistant",
        native_options(&config),
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}

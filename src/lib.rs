mod commands;
pub mod error;
pub mod models;
pub mod services;

use services::classifier::engine::{self, ClassifierEngine};
use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    env_logger::init();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_window_state::Builder::default().build())
        .setup(|app| {
            let mut candidates = Vec::new();
            if let Ok(dir) = app.path().resource_dir() {
                candidates.push(dir.join("models"));
            }
            if let Ok(dir) = app.path().app_data_dir() {
                candidates.push(dir.join("models"));
            }

            // A missing or unloadable classifier is an unrecoverable startup
            // condition: nothing on the screen works without it.
            let (model_path, config_path) = engine::find_model_files(&candidates)
                .expect("Classifier model files not found");
            let classifier = ClassifierEngine::load(&model_path, &config_path)
                .expect("Failed to construct image classifier");
            app.manage(classifier);

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::photo::load_photo,
            commands::classifier::get_model_status,
            commands::classifier::classify_photo,
            commands::classifier::classify_capture,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

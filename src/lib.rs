//! Reply-Glass — Tauri application entry point.
//!
//! This is the app shell that wires together all domains and commands.
//! No business logic lives here — only module declarations, plugin
//! registration, state management, and the command registry.
//!
//! Commands are split across:
//!   - commands.rs           — simple one-step commands (state reads, clipboard, context)
//!   - pipeline.rs           — multi-step orchestration (process_screenshot, generate_reply)
//!   - settings_commands.rs  — settings panel + provider resolution

mod commands;
pub mod context;
pub mod llm;
pub mod ocr;
mod pipeline;
pub mod settings_commands;

use llm::ReplyState;

/// Entry point — called by Tauri runtime.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Load .env.local → .env from project root.
    // Uses CARGO_MANIFEST_DIR (compile-time path to the crate root) to
    // reliably find the files regardless of the binary's working directory.
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));

    'env_load: for env_file in [".env.local", ".env"] {
        let path = manifest_dir.join(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            break 'env_load;
        }
    }

    env_logger::init();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .manage(ReplyState::new())
        .invoke_handler(tauri::generate_handler![
            // Simple commands (commands.rs)
            commands::copy_to_clipboard,
            commands::get_transcript,
            commands::set_transcript,
            commands::get_reply,
            commands::get_ocr_result,
            commands::get_background_info,
            commands::save_background_info,
            commands::get_contact_info,
            commands::save_contact_info,
            // Pipeline commands (pipeline.rs)
            pipeline::process_screenshot,
            pipeline::generate_reply,
            // Settings commands (settings_commands.rs)
            settings_commands::get_provider_config,
            settings_commands::set_active_provider,
            settings_commands::save_api_key,
            settings_commands::save_ocr_credentials,
            settings_commands::test_provider,
            settings_commands::open_settings,
            settings_commands::close_settings,
        ])
        .setup(|_app| {
            log::info!("Reply-Glass starting up");
            log::info!(
                "[STARTUP] Active provider: {}",
                settings_commands::resolve_provider()
            );
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("Error running Reply-Glass");
}

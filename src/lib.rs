//! Overlay shell hosting the Gemini web app in a borderless, floating,
//! always-on-top window, toggled system-wide by a configurable trigger.

mod config;
mod launcher;
mod surface;
mod tray;
mod trigger;
mod window;

use std::sync::Arc;

use tauri::{Manager, Theme, WebviewUrl, WebviewWindowBuilder};
use tauri_plugin_autostart::MacosLauncher;

use config::AppConfig;
use trigger::TriggerListener;

/// Top-level shell state. Subsystems get narrow handles (the tray and the
/// bridge commands reach the trigger listener through here), never the whole
/// app delegate.
pub struct OverlayState {
    pub trigger: Arc<TriggerListener>,
}

// ── bridge commands (invoked by the injected page script) ──

/// Inbound `backgroundColorHandler` channel: recolor the drag bar to match
/// the page. Malformed colors are dropped without touching anything.
#[tauri::command]
fn report_background_color(webview_window: tauri::WebviewWindow, color: String) {
    if webview_window.label() != window::MAIN_WINDOW {
        return;
    }
    if let Some(parsed) = surface::parse_rgb(&color) {
        let _ = webview_window.eval(surface::drag_bar_color_script(parsed));
    }
}

/// Inbound `debugLogger` channel: process log only.
#[tauri::command]
fn debug_log(message: String) {
    log::info!("[page] {message}");
}

#[tauri::command]
fn hide_window(app: tauri::AppHandle) {
    window::hide(&app);
}

#[tauri::command]
fn new_chat(webview_window: tauri::WebviewWindow) {
    let _ = webview_window.eval(surface::NEW_CHAT_SCRIPT);
}

#[tauri::command]
fn toggle_sidebar(webview_window: tauri::WebviewWindow) {
    let _ = webview_window.eval(surface::TOGGLE_SIDEBAR_SCRIPT);
}

#[tauri::command]
fn open_saved_settings(webview_window: tauri::WebviewWindow) {
    let _ = webview_window.eval(surface::OPEN_SAVED_SETTINGS_SCRIPT);
}

pub fn run() {
    tauri::Builder::default()
        .plugin(
            tauri_plugin_log::Builder::default()
                .level(log::LevelFilter::Info)
                .build(),
        )
        .plugin(tauri_plugin_window_state::Builder::default().build())
        .plugin(tauri_plugin_autostart::init(
            MacosLauncher::LaunchAgent,
            None,
        ))
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .setup(|app| {
            // menubar/tray app only, no Dock presence
            #[cfg(target_os = "macos")]
            app.set_activation_policy(tauri::ActivationPolicy::Accessory);

            let overlay = WebviewWindowBuilder::new(
                app,
                window::MAIN_WINDOW,
                WebviewUrl::External(surface::SURFACE_URL.parse()?),
            )
            .title("Gemini Overlay")
            .inner_size(970.0, 750.0)
            .position(500.0, 200.0)
            .decorations(false)
            .transparent(true)
            .always_on_top(true)
            .visible_on_all_workspaces(true)
            .accept_first_mouse(true)
            .user_agent(surface::USER_AGENT)
            .initialization_script(surface::BRIDGE_SCRIPT)
            .build()?;

            let theme = overlay.theme().unwrap_or(Theme::Light);
            tray::build(app.handle(), theme)?;

            let config = AppConfig::load_or_default();
            log::info!("[shell] trigger is {}", config.trigger.label());
            let listener = TriggerListener::new(app.handle().clone(), config.trigger);
            app.manage(OverlayState {
                trigger: Arc::clone(&listener),
            });

            // The interception is a revocable OS grant; missing permission is
            // not fatal, the tray menu stays as the show/hide fallback.
            match listener.arm() {
                Ok(()) => listener.spawn_supervisor(),
                Err(e) => log::warn!("[shell] global trigger unavailable: {e}"),
            }

            window::show(app.handle());
            Ok(())
        })
        .on_window_event(|win, event| {
            if let tauri::WindowEvent::ThemeChanged(theme) = event {
                tray::update_icon(win.app_handle(), *theme);
            }
        })
        .on_page_load(|webview, payload| {
            if matches!(payload.event(), tauri::webview::PageLoadEvent::Finished)
                && webview.label() == window::MAIN_WINDOW
            {
                log::info!("[shell] navigation finished: {}", payload.url());
                if let Some(overlay) = webview.app_handle().get_webview_window(window::MAIN_WINDOW)
                {
                    window::schedule_focus_retry(&overlay);
                }
            }
        })
        .invoke_handler(tauri::generate_handler![
            report_background_color,
            debug_log,
            hide_window,
            new_chat,
            toggle_sidebar,
            open_saved_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

//! Show/hide orchestration for the overlay window.
//!
//! The window is created once at startup and never destroyed by `hide`; only
//! focus and front-ness change. All entry points take an [`AppHandle`] so the
//! tray, the global trigger, and the bridge commands share one code path.

use std::time::Duration;

use tauri::{AppHandle, Manager, Runtime, WebviewWindow};

use crate::surface;

pub const MAIN_WINDOW: &str = "main";

/// Delay before re-focusing the prompt after a page load; the field may not
/// exist the instant navigation finishes.
const FOCUS_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Show,
    Hide,
}

/// Visibility decision for a toggle request: hide when the overlay is the key
/// window, otherwise bring it forward.
pub fn toggle_action(is_focused: bool) -> ToggleAction {
    if is_focused {
        ToggleAction::Hide
    } else {
        ToggleAction::Show
    }
}

fn main_window<R: Runtime>(app: &AppHandle<R>) -> Option<WebviewWindow<R>> {
    let window = app.get_webview_window(MAIN_WINDOW);
    if window.is_none() {
        log::error!("[window] main window is gone");
    }
    window
}

/// Bring the overlay to front, make it the active input target, and ask the
/// page to focus its prompt field.
pub fn show<R: Runtime>(app: &AppHandle<R>) {
    if let Some(window) = main_window(app) {
        let _ = window.show();
        let _ = window.set_focus();
        focus_prompt(&window);
    }
}

/// Hide the overlay; focus returns to whatever application was active before.
pub fn hide<R: Runtime>(app: &AppHandle<R>) {
    if let Some(window) = main_window(app) {
        let _ = window.hide();
    }
}

pub fn toggle_visibility<R: Runtime>(app: &AppHandle<R>) {
    let Some(window) = main_window(app) else {
        return;
    };
    let focused = window.is_focused().unwrap_or(false)
        && window.is_visible().unwrap_or(false);
    match toggle_action(focused) {
        ToggleAction::Show => show(app),
        ToggleAction::Hide => hide(app),
    }
}

/// Return to the landing page (in case the user navigated away).
pub fn go_home<R: Runtime>(app: &AppHandle<R>) {
    if let Some(mut window) = main_window(app) {
        match surface::SURFACE_URL.parse() {
            Ok(url) => {
                if let Err(e) = window.navigate(url) {
                    log::error!("[window] home navigation failed: {e}");
                }
            }
            Err(e) => log::error!("[window] bad home url: {e}"),
        }
    }
}

/// Drop all webview browsing data (cookies can wedge the hosted page).
pub fn clear_web_cache<R: Runtime>(app: &AppHandle<R>) {
    if let Some(window) = main_window(app) {
        match window.clear_all_browsing_data() {
            Ok(()) => log::info!("[window] web cache cleared"),
            Err(e) => log::error!("[window] clearing web cache failed: {e}"),
        }
    }
}

/// Fire-and-forget focus request into the page.
pub fn focus_prompt<R: Runtime>(window: &WebviewWindow<R>) {
    let _ = window.eval(surface::FOCUS_PROMPT_SCRIPT);
}

/// One-shot deferred focus retry, scheduled after each finished navigation.
pub fn schedule_focus_retry<R: Runtime>(window: &WebviewWindow<R>) {
    let window = window.clone();
    std::thread::spawn(move || {
        std::thread::sleep(FOCUS_RETRY_DELAY);
        focus_prompt(&window);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfocused_window_is_shown() {
        assert_eq!(toggle_action(false), ToggleAction::Show);
    }

    #[test]
    fn focused_window_is_hidden() {
        assert_eq!(toggle_action(true), ToggleAction::Hide);
    }

    // Show then hide lands back on hidden: the toggle decision depends only on
    // key-window status, so two toggles from hidden always round-trip.
    #[test]
    fn toggling_twice_returns_to_hidden() {
        let mut focused = false;
        let first = toggle_action(focused);
        assert_eq!(first, ToggleAction::Show);
        focused = true; // show made the overlay the key window

        let second = toggle_action(focused);
        assert_eq!(second, ToggleAction::Hide);
    }
}

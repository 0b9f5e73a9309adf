//! Persistent status-area icon with the fixed action menu.
//!
//! The glyph comes in two pre-rendered variants and tracks the OS light/dark
//! appearance; nothing is rendered at runtime.

use tauri::image::Image;
use tauri::menu::{Menu, MenuItem, PredefinedMenuItem};
use tauri::tray::TrayIconBuilder;
use tauri::{AppHandle, Manager, Theme};

use crate::{launcher, window, OverlayState};

pub const TRAY_ID: &str = "status";

const APP_TITLE: &str = "Gemini";

// dark glyph on light menubars, white glyph on dark ones
const LOGO_BLACK: &[u8] = include_bytes!("../icons/logo-black.png");
const LOGO_WHITE: &[u8] = include_bytes!("../icons/logo-white.png");

fn icon_for_theme(theme: Theme) -> tauri::Result<Image<'static>> {
    let bytes = match theme {
        Theme::Dark => LOGO_WHITE,
        _ => LOGO_BLACK,
    };
    Image::from_bytes(bytes)
}

pub fn build(app: &AppHandle, theme: Theme) -> tauri::Result<()> {
    let show = MenuItem::with_id(app, "show", format!("Show {APP_TITLE}"), true, None::<&str>)?;
    let hide = MenuItem::with_id(app, "hide", format!("Hide {APP_TITLE}"), true, Some("CmdOrCtrl+H"))?;
    let home = MenuItem::with_id(app, "home", "Home", true, Some("CmdOrCtrl+G"))?;
    let clear_cache = MenuItem::with_id(app, "clear-cache", "Clear Web Cache", true, None::<&str>)?;
    let set_trigger = MenuItem::with_id(app, "set-trigger", "Set New Trigger", true, None::<&str>)?;
    let install = MenuItem::with_id(app, "install", "Install Autolauncher", true, None::<&str>)?;
    let uninstall = MenuItem::with_id(app, "uninstall", "Uninstall Autolauncher", true, None::<&str>)?;
    let quit = MenuItem::with_id(app, "quit", "Quit", true, Some("CmdOrCtrl+Q"))?;

    let menu = Menu::with_items(
        app,
        &[
            &show,
            &hide,
            &home,
            &PredefinedMenuItem::separator(app)?,
            &clear_cache,
            &set_trigger,
            &PredefinedMenuItem::separator(app)?,
            &install,
            &uninstall,
            &PredefinedMenuItem::separator(app)?,
            &quit,
        ],
    )?;

    TrayIconBuilder::with_id(TRAY_ID)
        .icon(icon_for_theme(theme)?)
        .icon_as_template(false)
        .tooltip(format!("{APP_TITLE} Overlay"))
        .menu(&menu)
        .show_menu_on_left_click(true)
        .on_menu_event(|app, event| match event.id.as_ref() {
            "show" => window::show(app),
            "hide" => window::hide(app),
            "home" => window::go_home(app),
            "clear-cache" => window::clear_web_cache(app),
            "set-trigger" => app.state::<OverlayState>().trigger.begin_capture(),
            "install" => launcher::install(app),
            "uninstall" => launcher::uninstall(app),
            "quit" => app.exit(0),
            _ => {}
        })
        .build(app)?;

    Ok(())
}

/// Swap the glyph when the OS appearance changes.
pub fn update_icon(app: &AppHandle, theme: Theme) {
    let Some(tray) = app.tray_by_id(TRAY_ID) else {
        return;
    };
    match icon_for_theme(theme) {
        Ok(icon) => {
            if let Err(e) = tray.set_icon(Some(icon)) {
                log::warn!("[tray] icon swap failed: {e}");
            }
        }
        Err(e) => log::warn!("[tray] glyph decode failed: {e}"),
    }
}

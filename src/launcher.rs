//! Login-item registration. Both operations are one-shot and never retried;
//! failures are logged and leave process state untouched.

use tauri::AppHandle;
use tauri_plugin_autostart::ManagerExt;

/// Register the shell to launch at login. On success the current process
/// exits; the registered launch path starts a fresh instance.
pub fn install(app: &AppHandle) {
    match app.autolaunch().enable() {
        Ok(()) => {
            log::info!("[launcher] autolaunch installed, exiting");
            app.exit(0);
        }
        Err(e) => log::error!("[launcher] install failed: {e}"),
    }
}

/// Deregister the login item; the overlay just hides instead of exiting.
pub fn uninstall(app: &AppHandle) {
    match app.autolaunch().disable() {
        Ok(()) => {
            log::info!("[launcher] autolaunch uninstalled");
            crate::window::hide(app);
        }
        Err(e) => log::error!("[launcher] uninstall failed: {e}"),
    }
}

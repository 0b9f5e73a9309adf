//! System-wide show/hide trigger.
//!
//! The OS-level shortcut registration is a scarce, revocable grant: the OS may
//! drop it under load or after a permission hiccup, so the listener is modeled
//! as a supervised resource with an explicit [`TapHandle`] contract and a
//! fixed-period liveness check rather than assumed to stay active for the
//! process lifetime. A matched press is consumed by the registration and never
//! reaches other applications; everything else passes through untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rdev::EventType;
use tauri::{AppHandle, Manager};
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Modifiers, Shortcut, ShortcutState};

use crate::config::{AppConfig, ConfigError, TriggerCombination};
use crate::window;

const LIVENESS_PERIOD: Duration = Duration::from_secs(1);

/// Liveness contract for the revocable OS interception.
pub trait TapHandle {
    fn is_active(&self) -> bool;
    fn reactivate(&self) -> Result<(), String>;
}

/// One supervision step: report liveness, re-arming the tap first if the OS
/// silently dropped it.
pub fn ensure_active<T: TapHandle + ?Sized>(tap: &T) -> bool {
    if tap.is_active() {
        return true;
    }
    log::warn!("[trigger] interception was dropped, re-arming");
    if let Err(e) = tap.reactivate() {
        log::warn!("[trigger] re-arm failed: {e}");
        return false;
    }
    tap.is_active()
}

pub struct TriggerListener {
    app: AppHandle,
    current: Mutex<TriggerCombination>,
    capturing: Arc<AtomicBool>,
    capture_thread_started: AtomicBool,
}

impl TriggerListener {
    pub fn new(app: AppHandle, initial: TriggerCombination) -> Arc<Self> {
        Arc::new(Self {
            app,
            current: Mutex::new(initial),
            capturing: Arc::new(AtomicBool::new(false)),
            capture_thread_started: AtomicBool::new(false),
        })
    }

    pub fn combination(&self) -> TriggerCombination {
        self.current.lock().expect("trigger lock poisoned").clone()
    }

    fn shortcut(&self) -> Result<Shortcut, ConfigError> {
        self.combination().to_shortcut()
    }

    /// Register the current combination; a matched press toggles the overlay.
    pub fn arm(&self) -> anyhow::Result<()> {
        let shortcut = self.shortcut()?;
        self.app
            .global_shortcut()
            .on_shortcut(shortcut, |app, _shortcut, event| {
                if event.state == ShortcutState::Pressed {
                    window::toggle_visibility(app);
                }
            })?;
        log::info!("[trigger] armed {}", self.combination().label());
        Ok(())
    }

    /// Swap in a new combination, replacing the previous registration.
    pub fn rearm(&self, next: TriggerCombination) -> anyhow::Result<()> {
        if let Ok(old) = self.shortcut() {
            let _ = self.app.global_shortcut().unregister(old);
        }
        *self.current.lock().expect("trigger lock poisoned") = next;
        self.arm()
    }

    /// Check liveness every second, re-arming when the OS drops the grant.
    pub fn spawn_supervisor(self: &Arc<Self>) {
        let listener = Arc::clone(self);
        std::thread::spawn(move || loop {
            std::thread::sleep(LIVENESS_PERIOD);
            ensure_active(listener.as_ref());
        });
    }

    /// Capture the next non-modifier key-down system-wide and adopt it as the
    /// new trigger. The raw listener thread is started once and kept for the
    /// process lifetime; outside capture mode it ignores everything.
    pub fn begin_capture(self: &Arc<Self>) {
        if self.capturing.swap(true, Ordering::SeqCst) {
            return;
        }
        log::info!("[trigger] capturing next key combination");

        if self.capture_thread_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let listener = Arc::clone(self);
        let capturing = Arc::clone(&self.capturing);
        std::thread::spawn(move || {
            let state = Mutex::new(CaptureState::default());
            let callback = move |event: rdev::Event| {
                if !capturing.load(Ordering::SeqCst) {
                    return;
                }
                let combo = state
                    .lock()
                    .expect("capture lock poisoned")
                    .apply(&event.event_type);
                if let Some(combo) = combo {
                    capturing.store(false, Ordering::SeqCst);
                    listener.adopt(combo);
                }
            };
            if let Err(e) = rdev::listen(callback) {
                log::error!("[trigger] raw listener failed: {e:?}");
            }
        });
    }

    fn adopt(&self, combo: TriggerCombination) {
        log::info!("[trigger] captured {}", combo.label());
        let config = AppConfig {
            trigger: combo.clone(),
        };
        if let Err(e) = config.save() {
            log::error!("[trigger] persisting trigger failed: {e}");
        }
        // shortcut (de)registration must happen on the UI thread
        let app = self.app.clone();
        let _ = self.app.run_on_main_thread(move || {
            let state = app.state::<crate::OverlayState>();
            if let Err(e) = state.trigger.rearm(combo) {
                log::error!("[trigger] re-arming new trigger failed: {e}");
            }
        });
    }
}

impl TapHandle for TriggerListener {
    fn is_active(&self) -> bool {
        self.shortcut()
            .map(|s| self.app.global_shortcut().is_registered(s))
            .unwrap_or(false)
    }

    fn reactivate(&self) -> Result<(), String> {
        self.arm().map_err(|e| e.to_string())
    }
}

/// Folds raw key events into a combination: modifiers accumulate while held,
/// the first non-modifier key-down completes the capture.
#[derive(Debug, Default)]
pub struct CaptureState {
    held: Modifiers,
}

impl CaptureState {
    pub fn apply(&mut self, event: &EventType) -> Option<TriggerCombination> {
        match event {
            EventType::KeyPress(key) => {
                if let Some(modifier) = modifier_for(*key) {
                    self.held |= modifier;
                    None
                } else {
                    code_for(*key).map(|code| TriggerCombination::new(self.held, code))
                }
            }
            EventType::KeyRelease(key) => {
                if let Some(modifier) = modifier_for(*key) {
                    self.held.remove(modifier);
                }
                None
            }
            _ => None,
        }
    }
}

fn modifier_for(key: rdev::Key) -> Option<Modifiers> {
    use rdev::Key;
    match key {
        Key::Alt | Key::AltGr => Some(Modifiers::ALT),
        Key::ControlLeft | Key::ControlRight => Some(Modifiers::CONTROL),
        Key::ShiftLeft | Key::ShiftRight => Some(Modifiers::SHIFT),
        Key::MetaLeft | Key::MetaRight => Some(Modifiers::SUPER),
        _ => None,
    }
}

fn code_for(key: rdev::Key) -> Option<Code> {
    use rdev::Key;
    Some(match key {
        Key::KeyA => Code::KeyA,
        Key::KeyB => Code::KeyB,
        Key::KeyC => Code::KeyC,
        Key::KeyD => Code::KeyD,
        Key::KeyE => Code::KeyE,
        Key::KeyF => Code::KeyF,
        Key::KeyG => Code::KeyG,
        Key::KeyH => Code::KeyH,
        Key::KeyI => Code::KeyI,
        Key::KeyJ => Code::KeyJ,
        Key::KeyK => Code::KeyK,
        Key::KeyL => Code::KeyL,
        Key::KeyM => Code::KeyM,
        Key::KeyN => Code::KeyN,
        Key::KeyO => Code::KeyO,
        Key::KeyP => Code::KeyP,
        Key::KeyQ => Code::KeyQ,
        Key::KeyR => Code::KeyR,
        Key::KeyS => Code::KeyS,
        Key::KeyT => Code::KeyT,
        Key::KeyU => Code::KeyU,
        Key::KeyV => Code::KeyV,
        Key::KeyW => Code::KeyW,
        Key::KeyX => Code::KeyX,
        Key::KeyY => Code::KeyY,
        Key::KeyZ => Code::KeyZ,
        Key::Num0 => Code::Digit0,
        Key::Num1 => Code::Digit1,
        Key::Num2 => Code::Digit2,
        Key::Num3 => Code::Digit3,
        Key::Num4 => Code::Digit4,
        Key::Num5 => Code::Digit5,
        Key::Num6 => Code::Digit6,
        Key::Num7 => Code::Digit7,
        Key::Num8 => Code::Digit8,
        Key::Num9 => Code::Digit9,
        Key::Space => Code::Space,
        Key::Return => Code::Enter,
        Key::Escape => Code::Escape,
        Key::Tab => Code::Tab,
        Key::Backspace => Code::Backspace,
        Key::Delete => Code::Delete,
        Key::Insert => Code::Insert,
        Key::Home => Code::Home,
        Key::End => Code::End,
        Key::PageUp => Code::PageUp,
        Key::PageDown => Code::PageDown,
        Key::UpArrow => Code::ArrowUp,
        Key::DownArrow => Code::ArrowDown,
        Key::LeftArrow => Code::ArrowLeft,
        Key::RightArrow => Code::ArrowRight,
        Key::F1 => Code::F1,
        Key::F2 => Code::F2,
        Key::F3 => Code::F3,
        Key::F4 => Code::F4,
        Key::F5 => Code::F5,
        Key::F6 => Code::F6,
        Key::F7 => Code::F7,
        Key::F8 => Code::F8,
        Key::F9 => Code::F9,
        Key::F10 => Code::F10,
        Key::F11 => Code::F11,
        Key::F12 => Code::F12,
        Key::Minus => Code::Minus,
        Key::Equal => Code::Equal,
        Key::LeftBracket => Code::BracketLeft,
        Key::RightBracket => Code::BracketRight,
        Key::SemiColon => Code::Semicolon,
        Key::Quote => Code::Quote,
        Key::BackSlash => Code::Backslash,
        Key::Comma => Code::Comma,
        Key::Dot => Code::Period,
        Key::Slash => Code::Slash,
        Key::BackQuote => Code::Backquote,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    // Mock interception handle whose OS grant can be flipped off externally.
    struct MockTap {
        active: AtomicBool,
        reactivations: AtomicUsize,
        fail_reactivate: bool,
    }

    impl MockTap {
        fn new(active: bool) -> Self {
            Self {
                active: AtomicBool::new(active),
                reactivations: AtomicUsize::new(0),
                fail_reactivate: false,
            }
        }
    }

    impl TapHandle for MockTap {
        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }

        fn reactivate(&self) -> Result<(), String> {
            self.reactivations.fetch_add(1, Ordering::SeqCst);
            if self.fail_reactivate {
                return Err("denied".into());
            }
            self.active.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn live_tap_is_left_alone() {
        let tap = MockTap::new(true);
        assert!(ensure_active(&tap));
        assert_eq!(tap.reactivations.load(Ordering::SeqCst), 0);
    }

    // A dead tap found at one periodic check must report live at the next.
    #[test]
    fn dropped_tap_is_reactivated() {
        let tap = MockTap::new(false);
        assert!(ensure_active(&tap));
        assert_eq!(tap.reactivations.load(Ordering::SeqCst), 1);
        assert!(ensure_active(&tap));
        assert_eq!(tap.reactivations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_reactivation_reports_dead() {
        let mut tap = MockTap::new(false);
        tap.fail_reactivate = true;
        assert!(!ensure_active(&tap));
    }

    #[test]
    fn capture_folds_modifiers_then_key() {
        use rdev::Key;
        let mut state = CaptureState::default();
        assert!(state.apply(&EventType::KeyPress(Key::ControlLeft)).is_none());
        assert!(state.apply(&EventType::KeyPress(Key::ShiftLeft)).is_none());
        let combo = state.apply(&EventType::KeyPress(Key::KeyG)).unwrap();
        assert_eq!(combo.modifiers(), Modifiers::CONTROL | Modifiers::SHIFT);
        assert_eq!(combo.code().unwrap(), Code::KeyG);
    }

    #[test]
    fn released_modifiers_are_dropped() {
        use rdev::Key;
        let mut state = CaptureState::default();
        state.apply(&EventType::KeyPress(Key::Alt));
        state.apply(&EventType::KeyRelease(Key::Alt));
        let combo = state.apply(&EventType::KeyPress(Key::Space)).unwrap();
        assert!(combo.modifiers().is_empty());
        assert_eq!(combo.code().unwrap(), Code::Space);
    }

    #[test]
    fn bare_modifier_press_never_completes_capture() {
        use rdev::Key;
        let mut state = CaptureState::default();
        for key in [Key::MetaLeft, Key::ShiftRight, Key::AltGr, Key::ControlRight] {
            assert!(state.apply(&EventType::KeyPress(key)).is_none());
        }
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        use rdev::Key;
        let mut state = CaptureState::default();
        assert!(state.apply(&EventType::KeyPress(Key::CapsLock)).is_none());
        assert!(state
            .apply(&EventType::MouseMove { x: 1.0, y: 2.0 })
            .is_none());
    }

    #[test]
    fn captured_combination_converts_to_shortcut() {
        use rdev::Key;
        let mut state = CaptureState::default();
        state.apply(&EventType::KeyPress(Key::MetaLeft));
        let combo = state.apply(&EventType::KeyPress(Key::Num1)).unwrap();
        let shortcut = combo.to_shortcut().unwrap();
        assert!(shortcut.matches(Modifiers::SUPER, Code::Digit1));
    }
}

//! The hosted web page and the narrow script bridge between it and the shell.
//!
//! The page is an opaque third-party chat app. The shell only ever injects
//! fire-and-forget scripts (each one selector-guarded, a silent no-op when the
//! target element is missing) and receives two one-way signals back: the page
//! background color and a free-text debug string.

pub const SURFACE_URL: &str = "https://gemini.google.com/";

/// The page refuses some embedded user agents, so present as desktop Safari.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

pub const DRAG_BAR_HEIGHT: u32 = 30;

/// Injected into every page before it runs. Builds the drag bar + close
/// control, wires the two inbound bridge channels, and maps in-window key
/// commands onto shell commands.
pub const BRIDGE_SCRIPT: &str = r#"
(function () {
  if (window !== window.top) { return; }
  const invoke = (cmd, args) => {
    try { window.__TAURI__.core.invoke(cmd, args); } catch (e) {}
  };
  const debugLog = (message) => invoke('debug_log', { message: String(message) });

  function sendBackgroundColor() {
    const color = window.getComputedStyle(document.body).backgroundColor;
    invoke('report_background_color', { color: color });
  }

  function buildDragBar() {
    if (document.getElementById('__overlay_drag_bar')) { return; }
    const bar = document.createElement('div');
    bar.id = '__overlay_drag_bar';
    bar.setAttribute('data-tauri-drag-region', '');
    bar.style.cssText = 'position:fixed;top:0;left:0;right:0;height:30px;' +
      'z-index:2147483647;background:transparent;';
    const close = document.createElement('div');
    close.textContent = '✕';
    close.style.cssText = 'position:absolute;left:8px;top:5px;width:20px;height:20px;' +
      'line-height:20px;text-align:center;border-radius:50%;cursor:pointer;' +
      'font-size:12px;opacity:0.55;';
    close.addEventListener('click', (e) => {
      e.stopPropagation();
      invoke('hide_window');
    });
    bar.appendChild(close);
    document.body.appendChild(bar);
  }

  function roundCorners() {
    const style = document.createElement('style');
    style.textContent = 'html{border-radius:12px;overflow:hidden;}';
    (document.head || document.documentElement).appendChild(style);
  }

  document.addEventListener('keydown', (e) => {
    const cmd = e.metaKey || e.ctrlKey;
    if (!cmd || e.altKey) { return; }
    const key = e.key.toLowerCase();
    if (key === 's' && e.ctrlKey && e.metaKey) {
      e.preventDefault();
      invoke('toggle_sidebar');
    } else if (key === 'n') {
      e.preventDefault();
      invoke('new_chat');
    } else if (key === ',' && e.metaKey && !e.ctrlKey) {
      e.preventDefault();
      invoke('open_saved_settings');
    } else if (key === 'h') {
      e.preventDefault();
      invoke('hide_window');
    }
  }, true);

  window.addEventListener('DOMContentLoaded', () => {
    roundCorners();
    buildDragBar();
    sendBackgroundColor();
    new MutationObserver(sendBackgroundColor)
      .observe(document.body, { attributes: true, attributeFilter: ['style'] });
    debugLog('bridge ready: ' + location.href);
  });
})();
"#;

/// Focus the prompt field, guarded against the field not existing yet.
pub const FOCUS_PROMPT_SCRIPT: &str = r#"
(function () {
  const sel = '[aria-label="Enter a prompt here"], [data-placeholder="Ask Gemini"]';
  const el = document.querySelector(sel) || document.querySelector('textarea');
  if (el) { el.focus(); }
})();
"#;

/// Click the "New chat" control, falling back to reloading the home page.
pub const NEW_CHAT_SCRIPT: &str = r#"
(function () {
  const sel = '[aria-label="New chat"], [aria-label="New conversation"], [data-command="new-conversation"]';
  const btn = document.querySelector(sel);
  if (btn) { btn.click(); } else { location.href = 'https://gemini.google.com/'; }
})();
"#;

pub const TOGGLE_SIDEBAR_SCRIPT: &str = r#"
(function () {
  const selectors = ['[aria-label="Main menu"]', '[data-test-id="side-nav-menu-button"]'];
  let btn = null;
  for (const sel of selectors) { btn = document.querySelector(sel); if (btn) break; }
  if (btn) { btn.click(); }
})();
"#;

/// Open the settings menu, then its "Saved info" entry after a short delay so
/// the menu has time to mount.
pub const OPEN_SAVED_SETTINGS_SCRIPT: &str = r#"
(function () {
  function clickSettings() {
    const btn = document.querySelector('[aria-label="Settings & help"], [data-test-id="settings-and-help-button"]');
    if (btn) { btn.click(); return true; }
    return false;
  }
  function clickSaved() {
    let link = document.querySelector('a[href*="/saved-info"]');
    if (!link) {
      const items = document.querySelectorAll('a[role="menuitem"], button[role="menuitem"]');
      for (const el of items) {
        if (el.textContent && el.textContent.trim().toLowerCase().includes('saved info')) {
          link = el;
          break;
        }
      }
    }
    if (link) { link.click(); }
  }
  if (clickSettings()) { setTimeout(clickSaved, 50); }
})();
"#;

/// An opaque color with components normalized to the 0–1 range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Parse a CSS `rgb(r, g, b[, a])` string into a normalized color.
///
/// Only the `rgb` prefix with both parentheses is accepted; the first three
/// components are scaled from 0–255 to 0–1 and any alpha is ignored. Anything
/// else yields `None`, which callers treat as "no visual update".
pub fn parse_rgb(value: &str) -> Option<SurfaceColor> {
    let value = value.trim();
    if !value.starts_with("rgb") {
        return None;
    }
    let open = value.find('(')?;
    let close = value.find(')')?;
    if close <= open {
        return None;
    }
    let components: Vec<f64> = value[open + 1..close]
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if components.len() < 3 {
        return None;
    }
    Some(SurfaceColor {
        r: components[0] / 255.0,
        g: components[1] / 255.0,
        b: components[2] / 255.0,
    })
}

/// Script that recolors the drag bar to keep it visually continuous with the
/// page behind it.
pub fn drag_bar_color_script(color: SurfaceColor) -> String {
    let to_byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "(function () {{ \
           const bar = document.getElementById('__overlay_drag_bar'); \
           if (bar) {{ bar.style.background = 'rgb({}, {}, {})'; }} \
         }})();",
        to_byte(color.r),
        to_byte(color.g),
        to_byte(color.b),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn parses_plain_rgb() {
        let c = parse_rgb("rgb(255, 128, 0)").unwrap();
        assert!(close(c.r, 1.0));
        assert!(close(c.g, 128.0 / 255.0));
        assert!(close(c.b, 0.0));
    }

    #[test]
    fn components_normalize_exactly() {
        for (r, g, b) in [(0u16, 0, 0), (255, 255, 255), (1, 2, 3), (17, 170, 204)] {
            let c = parse_rgb(&format!("rgb({r}, {g}, {b})")).unwrap();
            assert!(close(c.r, f64::from(r) / 255.0));
            assert!(close(c.g, f64::from(g) / 255.0));
            assert!(close(c.b, f64::from(b) / 255.0));
        }
    }

    #[test]
    fn alpha_component_is_ignored() {
        let c = parse_rgb("rgba(10, 20, 30, 0.5)").unwrap();
        assert!(close(c.r, 10.0 / 255.0));
        assert!(close(c.g, 20.0 / 255.0));
        assert!(close(c.b, 30.0 / 255.0));
    }

    #[test]
    fn malformed_strings_are_rejected() {
        for bad in [
            "",
            "red",
            "#ff8800",
            "rgb",
            "rgb 255, 0, 0",
            "rgb(255, 0)",
            "rgb(a, b, c)",
            "hsl(120, 50%, 50%)",
            ")rgb(1,2,3",
        ] {
            assert!(parse_rgb(bad).is_none(), "accepted {bad:?}");
        }
    }

    #[test]
    fn recolor_script_targets_the_drag_bar() {
        let script = drag_bar_color_script(SurfaceColor {
            r: 1.0,
            g: 0.0,
            b: 128.0 / 255.0,
        });
        assert!(script.contains("__overlay_drag_bar"));
        assert!(script.contains("rgb(255, 0, 128)"));
    }

    #[test]
    fn action_scripts_guard_their_selectors() {
        // Every outbound script must tolerate a missing target element.
        for script in [
            FOCUS_PROMPT_SCRIPT,
            NEW_CHAT_SCRIPT,
            TOGGLE_SIDEBAR_SCRIPT,
            OPEN_SAVED_SETTINGS_SCRIPT,
        ] {
            assert!(script.contains("querySelector"));
            assert!(script.contains("if ("));
        }
    }
}

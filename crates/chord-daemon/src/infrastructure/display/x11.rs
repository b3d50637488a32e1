//! X11 display connection: replays events into the controlled window.
//!
//! Events are re-emitted with `XSendEvent(propagate = True)` addressed to the
//! controlled window, which is either configured explicitly or taken from
//! the input focus at start-up.  Synthetic keystrokes resolve their keysym to
//! a keycode with `XKeysymToKeycode` and carry their modifiers in the event
//! state, so the application sees e.g. Control+Shift+V without any modifier
//! key going down on the server.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Xlib FFI calls.  The raw
//! `Display` pointer is only ever touched while holding the connection mutex.

#![cfg(target_os = "linux")]

use std::ffi::CString;
use std::os::raw::{c_int, c_long, c_uint};
use std::ptr;
use std::sync::{Mutex, Once};

use chord_core::{EventKind, Keystroke, RawEvent};
use tracing::{debug, info, warn};
use x11::xlib;

use crate::application::replay::{DisplayConnection, DisplayError};

/// `CurrentTime` for synthesized keystrokes.
const CURRENT_TIME: xlib::Time = 0;

/// Event mask passed to `XSendEvent`; the key masks route the event to
/// clients selecting key input on the window or its ancestors.
const KEY_EVENT_MASK: c_long = xlib::KeyPressMask | xlib::KeyReleaseMask;

static INIT_THREADS: Once = Once::new();

/// Prepares Xlib for use from several threads and installs an error handler
/// that logs instead of terminating the process.
pub(crate) fn init_xlib() {
    INIT_THREADS.call_once(|| {
        // SAFETY: called once, before any connection is opened.
        unsafe {
            xlib::XInitThreads();
            xlib::XSetErrorHandler(Some(log_x_error));
        }
    });
}

unsafe extern "C" fn log_x_error(
    _display: *mut xlib::Display,
    event: *mut xlib::XErrorEvent,
) -> c_int {
    if let Some(event) = event.as_ref() {
        warn!(
            error_code = event.error_code,
            request_code = event.request_code,
            resource = event.resourceid,
            "X protocol error"
        );
    }
    0
}

/// Opens a connection to `name`, or to `$DISPLAY` when `None`.
pub(crate) fn open_display(name: Option<&str>) -> Result<*mut xlib::Display, String> {
    init_xlib();
    let label = name.unwrap_or("$DISPLAY").to_string();
    let c_name = match name {
        Some(name) => Some(CString::new(name).map_err(|_| label.clone())?),
        None => None,
    };
    let name_ptr = c_name.as_ref().map_or(ptr::null(), |n| n.as_ptr());
    // SAFETY: name_ptr is null or a NUL-terminated string that outlives the call.
    let display = unsafe { xlib::XOpenDisplay(name_ptr) };
    if display.is_null() {
        Err(label)
    } else {
        Ok(display)
    }
}

struct Connection(*mut xlib::Display);

// SAFETY: Xlib was initialised with XInitThreads and the pointer is only
// dereferenced behind the mutex in `X11Display`.
unsafe impl Send for Connection {}

/// Production [`DisplayConnection`] talking to the X server.
pub struct X11Display {
    connection: Mutex<Connection>,
    window: xlib::Window,
    root: xlib::Window,
}

impl X11Display {
    /// Connects to the X display and selects the controlled window.
    ///
    /// # Errors
    ///
    /// Returns `DisplayError::Unavailable` if the display cannot be opened.
    pub fn connect(name: Option<&str>, target_window: Option<u64>) -> Result<Self, DisplayError> {
        let display = open_display(name).map_err(|label| {
            warn!(display = %label, "cannot open display");
            DisplayError::Unavailable
        })?;

        // SAFETY: display is a live connection returned by XOpenDisplay.
        let (window, root) = unsafe {
            let root = xlib::XDefaultRootWindow(display);
            let window = match target_window {
                Some(window) => window as xlib::Window,
                None => {
                    let mut focus: xlib::Window = 0;
                    let mut revert: c_int = 0;
                    xlib::XGetInputFocus(display, &mut focus, &mut revert);
                    focus
                }
            };
            (window, root)
        };
        // PointerRoot (1) and None (0) are not real windows.
        if window <= 1 {
            // SAFETY: display is live and not used after this point.
            unsafe { xlib::XCloseDisplay(display) };
            return Err(DisplayError::Platform("no focused window to control".to_string()));
        }

        info!(window = %format!("0x{window:x}"), "controlling window");
        Ok(Self {
            connection: Mutex::new(Connection(display)),
            window,
            root,
        })
    }

    /// The controlled window.
    pub fn window(&self) -> u64 {
        self.window as u64
    }

    fn with_display<T>(&self, f: impl FnOnce(*mut xlib::Display) -> T) -> Result<T, DisplayError> {
        let connection = self.connection.lock().map_err(|_| DisplayError::Unavailable)?;
        Ok(f(connection.0))
    }

    fn key_event(
        &self,
        display: *mut xlib::Display,
        kind: c_int,
        keycode: c_uint,
        state: c_uint,
        time: xlib::Time,
    ) -> xlib::XEvent {
        xlib::XEvent {
            key: xlib::XKeyEvent {
                type_: kind,
                serial: 0,
                send_event: xlib::True,
                display,
                window: self.window,
                root: self.root,
                subwindow: 0,
                time,
                x: 1,
                y: 1,
                x_root: 1,
                y_root: 1,
                state,
                keycode,
                same_screen: xlib::True,
            },
        }
    }

    fn send(&self, display: *mut xlib::Display, mut event: xlib::XEvent) -> Result<(), DisplayError> {
        // SAFETY: display is live and event is a fully initialised key event.
        let status = unsafe {
            xlib::XSendEvent(display, self.window, xlib::True, KEY_EVENT_MASK, &mut event)
        };
        if status == 0 {
            return Err(DisplayError::Platform("XSendEvent failed".to_string()));
        }
        Ok(())
    }
}

impl DisplayConnection for X11Display {
    fn send_event(&self, event: &RawEvent) -> Result<(), DisplayError> {
        let kind = match event.kind {
            EventKind::Press => xlib::KeyPress,
            EventKind::Release => xlib::KeyRelease,
            EventKind::Other => {
                debug!("skipping non-key event");
                return Ok(());
            }
        };
        self.with_display(|display| {
            let xevent = self.key_event(
                display,
                kind,
                event.keycode as c_uint,
                event.state.bits() as c_uint,
                event.time as xlib::Time,
            );
            self.send(display, xevent)
        })?
    }

    fn press(&self, keystroke: Keystroke) -> Result<(), DisplayError> {
        self.with_display(|display| {
            // SAFETY: display is live.
            let keycode =
                unsafe { xlib::XKeysymToKeycode(display, keystroke.keysym as xlib::KeySym) };
            if keycode == 0 {
                return Err(DisplayError::UnmappedKeysym(keystroke.keysym));
            }
            let state = keystroke.modifiers.bits() as c_uint;
            for kind in [xlib::KeyPress, xlib::KeyRelease] {
                let xevent =
                    self.key_event(display, kind, c_uint::from(keycode), state, CURRENT_TIME);
                self.send(display, xevent)?;
            }
            // SAFETY: display is live.
            unsafe {
                xlib::XFlush(display);
                xlib::XSync(display, xlib::False);
            }
            Ok(())
        })?
    }

    fn sync(&self) -> Result<(), DisplayError> {
        self.with_display(|display| {
            // SAFETY: display is live.
            unsafe {
                xlib::XFlush(display);
                xlib::XSync(display, xlib::False);
            }
        })
    }
}

impl Drop for X11Display {
    fn drop(&mut self) {
        if let Ok(connection) = self.connection.get_mut() {
            // SAFETY: the connection is live and never used after drop.
            unsafe { xlib::XCloseDisplay(connection.0) };
        }
    }
}

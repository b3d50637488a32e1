//! X11 key grab implementation.
//!
//! A dedicated thread opens its own display connection, passively grabs
//! every key under every modifier combination on the controlled window with
//! `XGrabKey(AnyKey, AnyModifier)`, and reads the grabbed events.  Each key
//! event is resolved from the keysym at index 0 of its keycode and sent to
//! the session loop as a [`RawEvent`].
//!
//! The grab keeps the controlled window from ever seeing the original
//! events; anything the session does not claim reaches it only through
//! replay.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Xlib FFI calls.  The
//! capture connection never leaves the capture thread.

#![cfg(target_os = "linux")]

use std::mem::MaybeUninit;
use std::os::raw::{c_int, c_uint};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chord_core::{EventKind, ModifierMask, RawEvent};
use tracing::{debug, error, info};
use x11::xlib;

use super::{CaptureError, InputSource};
use crate::infrastructure::display::x11::open_display;

/// `AnyKey` from the core protocol.
const ANY_KEY: c_int = 0;
/// `AnyModifier` from the core protocol.
const ANY_MODIFIER: c_uint = 1 << 15;

/// Poll interval while no event is pending; bounds the latency of `stop()`.
const IDLE_POLL: Duration = Duration::from_millis(5);

/// X11 passive key grab on one window.
pub struct X11InputSource {
    display_name: Option<String>,
    window: u64,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl X11InputSource {
    /// Creates an unstarted source grabbing keys on `window`.
    pub fn new(display_name: Option<String>, window: u64) -> Self {
        Self {
            display_name,
            window,
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }
}

impl InputSource for X11InputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawEvent>, CaptureError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::channel::<RawEvent>();
        // The capture thread reports whether the display opened before the
        // receiver is handed out.
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), CaptureError>>();

        let display_name = self.display_name.clone();
        let window = self.window as xlib::Window;
        let running = Arc::clone(&self.running);
        let spawned = thread::Builder::new()
            .name("chord-capture".to_string())
            .spawn(move || run_capture_loop(display_name, window, running, tx, ready_tx));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(CaptureError::ThreadSpawn(e.to_string()));
            }
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(CaptureError::ThreadSpawn("capture thread exited".to_string()));
            }
        }

        if let Ok(mut worker) = self.worker.lock() {
            *worker = Some(handle);
        }
        info!(window = %format!("0x{:x}", self.window), "key grab installed");
        Ok(rx)
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let handle = self.worker.lock().ok().and_then(|mut worker| worker.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("capture thread panicked");
            }
        }
    }
}

impl Drop for X11InputSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Entry point for the capture thread.
fn run_capture_loop(
    display_name: Option<String>,
    window: xlib::Window,
    running: Arc<AtomicBool>,
    events: Sender<RawEvent>,
    ready: Sender<Result<(), CaptureError>>,
) {
    let display = match open_display(display_name.as_deref()) {
        Ok(display) => display,
        Err(label) => {
            let _ = ready.send(Err(CaptureError::DisplayUnavailable(label)));
            return;
        }
    };

    // SAFETY: display is a live connection owned by this thread.
    unsafe {
        xlib::XGrabKey(
            display,
            ANY_KEY,
            ANY_MODIFIER,
            window,
            xlib::True,
            xlib::GrabModeAsync,
            xlib::GrabModeAsync,
        );
        xlib::XSync(display, xlib::False);
    }
    let _ = ready.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        // SAFETY: display is live; XPending only inspects the queue.
        if unsafe { xlib::XPending(display) } == 0 {
            thread::sleep(IDLE_POLL);
            continue;
        }
        let mut xevent = MaybeUninit::<xlib::XEvent>::uninit();
        // SAFETY: XNextEvent fully initialises the event it returns.
        let mut xevent = unsafe {
            xlib::XNextEvent(display, xevent.as_mut_ptr());
            xevent.assume_init()
        };
        let event = to_raw_event(&mut xevent);
        if events.send(event).is_err() {
            debug!("event receiver dropped, stopping capture");
            break;
        }
    }

    // SAFETY: display is live and not used after close.
    unsafe {
        xlib::XUngrabKey(display, ANY_KEY, ANY_MODIFIER, window);
        xlib::XCloseDisplay(display);
    }
    info!("key grab released");
}

/// What the capture loop does with an X event of a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Incoming {
    Key(EventKind),
    /// The server's keycode to keysym table changed.
    MappingChanged,
    Other,
}

fn classify(event_type: c_int) -> Incoming {
    match event_type {
        xlib::KeyPress => Incoming::Key(EventKind::Press),
        xlib::KeyRelease => Incoming::Key(EventKind::Release),
        xlib::MappingNotify => Incoming::MappingChanged,
        _ => Incoming::Other,
    }
}

fn to_raw_event(xevent: &mut xlib::XEvent) -> RawEvent {
    let kind = match classify(xevent.get_type()) {
        Incoming::Key(kind) => kind,
        Incoming::MappingChanged => {
            // SAFETY: the event type is MappingNotify, so `mapping` is the
            // active union member.
            unsafe { xlib::XRefreshKeyboardMapping(&mut xevent.mapping) };
            debug!("keyboard mapping refreshed");
            return RawEvent::other(0);
        }
        Incoming::Other => return RawEvent::other(0),
    };
    // SAFETY: the event type is KeyPress or KeyRelease, so `key` is the
    // active union member.
    let key = unsafe { &mut xevent.key };
    // SAFETY: key is a valid key event.
    let keysym = unsafe { xlib::XLookupKeysym(&mut *key, 0) };
    RawEvent::key(
        kind,
        key.keycode,
        u32::try_from(keysym).unwrap_or(0),
        ModifierMask(key.state),
        key.time as u64,
    )
}

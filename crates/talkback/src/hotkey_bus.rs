//! OS-level hotkey delivery behind the core bus trait.
//!
//! The full key set from the config is registered with the OS once at
//! startup, on the main thread, where tao's event loop pumps the messages
//! Windows needs for `WM_HOTKEY` delivery. Sessions then register and drop
//! their callbacks on this bus freely; a single dispatcher thread drains the
//! global event channel and fires whatever is currently registered.

use crate::{AppError, AppResult};

use std::{
    collections::HashMap,
    panic::Location,
    sync::{Arc, Condvar, Mutex},
    thread,
};

use error_location::ErrorLocation;
use global_hotkey::{
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
    hotkey::{Code, HotKey},
};
use talkback_core::{AudioError, CoreResult, HotkeyBus, HotkeyCallback, HotkeyHandle, Key};
use tracing::{debug, info, instrument, warn};

/// Process-wide hotkey bus over the `global-hotkey` crate.
pub struct GlobalHotkeyBus {
    inner: Mutex<BusInner>,
    cond: Condvar,
}

struct BusInner {
    next_id: u64,
    callbacks: HashMap<u64, (Key, HotkeyCallback)>,
    /// Press generation per key, bumped by the dispatcher on every press.
    generations: HashMap<Key, u64>,
}

impl GlobalHotkeyBus {
    /// Register `keys` with the OS and start the dispatcher thread.
    ///
    /// Must be called on a thread with a message pump. The caller keeps
    /// `manager` alive for the process lifetime; dropping it unregisters
    /// every key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::HotkeyRegistrationFailed`] if a key cannot be
    /// mapped or the OS rejects a registration.
    #[track_caller]
    #[instrument(skip(manager, keys))]
    pub fn start(manager: &GlobalHotKeyManager, keys: &[Key]) -> AppResult<Arc<Self>> {
        let mut id_map: HashMap<u32, Key> = HashMap::new();

        for &key in keys {
            let code = code_for(key).ok_or_else(|| AppError::HotkeyRegistrationFailed {
                reason: format!("No OS key code for '{}'", key),
                location: ErrorLocation::from(Location::caller()),
            })?;

            let hotkey = HotKey::new(None, code);
            if id_map.values().any(|&registered| registered == key) {
                continue;
            }

            manager
                .register(hotkey)
                .map_err(|e| AppError::HotkeyRegistrationFailed {
                    reason: format!("Failed to register '{}': {}", key, e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
            id_map.insert(hotkey.id(), key);
        }

        info!(key_count = id_map.len(), "Global hotkeys registered");

        let bus = Arc::new(Self {
            inner: Mutex::new(BusInner {
                next_id: 0,
                callbacks: HashMap::new(),
                // Seeding marks each key as managed; `register` rejects any
                // key the OS never heard about.
                generations: id_map.values().map(|&key| (key, 0)).collect(),
            }),
            cond: Condvar::new(),
        });

        // The receiver is a crossbeam channel with blocking recv: one
        // thread, zero polling. It lives for the process lifetime and is
        // reclaimed by the OS on exit.
        let dispatcher = Arc::clone(&bus);
        let receiver = GlobalHotKeyEvent::receiver().clone();
        thread::spawn(move || {
            while let Ok(event) = receiver.recv() {
                if event.state != HotKeyState::Pressed {
                    continue;
                }
                match id_map.get(&event.id) {
                    Some(&key) => dispatcher.dispatch(key),
                    None => debug!(hotkey_id = event.id, "Press for unmanaged hotkey ignored"),
                }
            }
        });

        Ok(bus)
    }

    /// Bump the key's press generation and fire a snapshot of the current
    /// callbacks outside the lock, so a callback may deregister freely.
    fn dispatch(&self, key: Key) {
        let snapshot: Vec<HotkeyCallback> = {
            let mut inner = self.lock();
            *inner.generations.entry(key).or_insert(0) += 1;
            inner
                .callbacks
                .values()
                .filter(|(registered, _)| *registered == key)
                .map(|(_, callback)| Arc::clone(callback))
                .collect()
        };
        self.cond.notify_all();

        debug!(key = %key, callback_count = snapshot.len(), "Hotkey pressed");
        for callback in snapshot {
            callback();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BusInner> {
        self.inner.lock().unwrap_or_else(|e| {
            warn!("Hotkey bus lock poisoned, recovering");
            e.into_inner()
        })
    }
}

impl HotkeyBus for GlobalHotkeyBus {
    fn register(&self, key: Key, callback: HotkeyCallback) -> CoreResult<HotkeyHandle> {
        let mut inner = self.lock();

        if !inner.generations.contains_key(&key) {
            // The key was never handed to the OS at startup; a callback on
            // it would simply never fire. Fail loudly instead.
            return Err(AudioError::HotkeyError {
                reason: format!("Key '{}' is not in the managed set", key),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.callbacks.insert(id, (key, callback));
        Ok(HotkeyHandle::new(id, key))
    }

    fn deregister(&self, handle: &HotkeyHandle) {
        let _ = self.lock().callbacks.remove(&handle.id());
    }

    fn block_until(&self, key: Key) {
        let mut inner = self.lock();
        let parked_at = inner.generations.get(&key).copied().unwrap_or(0);

        while inner.generations.get(&key).copied().unwrap_or(0) <= parked_at {
            inner = self.cond.wait(inner).unwrap_or_else(|e| e.into_inner());
        }
    }
}

/// Map a key symbol to the OS key code.
fn code_for(key: Key) -> Option<Code> {
    let code = match key.symbol() {
        'a' => Code::KeyA,
        'b' => Code::KeyB,
        'c' => Code::KeyC,
        'd' => Code::KeyD,
        'e' => Code::KeyE,
        'f' => Code::KeyF,
        'g' => Code::KeyG,
        'h' => Code::KeyH,
        'i' => Code::KeyI,
        'j' => Code::KeyJ,
        'k' => Code::KeyK,
        'l' => Code::KeyL,
        'm' => Code::KeyM,
        'n' => Code::KeyN,
        'o' => Code::KeyO,
        'p' => Code::KeyP,
        'q' => Code::KeyQ,
        'r' => Code::KeyR,
        's' => Code::KeyS,
        't' => Code::KeyT,
        'u' => Code::KeyU,
        'v' => Code::KeyV,
        'w' => Code::KeyW,
        'x' => Code::KeyX,
        'y' => Code::KeyY,
        'z' => Code::KeyZ,
        '0' => Code::Digit0,
        '1' => Code::Digit1,
        '2' => Code::Digit2,
        '3' => Code::Digit3,
        '4' => Code::Digit4,
        '5' => Code::Digit5,
        '6' => Code::Digit6,
        '7' => Code::Digit7,
        '8' => Code::Digit8,
        '9' => Code::Digit9,
        _ => return None,
    };
    Some(code)
}

//! Hotkey bus abstraction.
//!
//! Sessions never talk to a keyboard backend directly. They observe key
//! presses through the [`HotkeyBus`] trait, which a backend (the
//! `global-hotkey` bus in the application crate, or a synchronous fake in
//! tests) implements. Callbacks fire on the bus's own dispatcher thread, so
//! anything a callback touches must be `Send + Sync`.

use std::{fmt, sync::Arc};

use crate::CoreResult;

/// A single printable hotkey symbol, e.g. `c` or `q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(char);

impl Key {
    /// Create a key from an ASCII letter or digit.
    ///
    /// Returns `None` for anything a keyboard backend cannot map to a
    /// physical key code. Letters are normalized to lowercase.
    #[must_use]
    pub fn from_char(symbol: char) -> Option<Self> {
        symbol
            .is_ascii_alphanumeric()
            .then(|| Self(symbol.to_ascii_lowercase()))
    }

    /// The underlying character symbol.
    #[must_use]
    pub const fn symbol(&self) -> char {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback fired on the bus dispatcher thread whenever its key is pressed.
pub type HotkeyCallback = Arc<dyn Fn() + Send + Sync>;

/// Handle for one callback registration, used for deregistration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyHandle {
    id: u64,
    key: Key,
}

impl HotkeyHandle {
    /// Construct a handle. Called by bus implementations only.
    #[must_use]
    pub const fn new(id: u64, key: Key) -> Self {
        Self { id, key }
    }

    /// Bus-assigned registration id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The key this registration listens for.
    #[must_use]
    pub const fn key(&self) -> Key {
        self.key
    }
}

/// Process-wide registry mapping key symbols to callbacks.
///
/// The bus is shared by every session in the process; a registered callback
/// fires on every press of its key for as long as the registration lives,
/// regardless of which component registered it.
pub trait HotkeyBus: Send + Sync {
    /// Register `callback` to fire on every press of `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot observe `key`.
    fn register(&self, key: Key, callback: HotkeyCallback) -> CoreResult<HotkeyHandle>;

    /// Remove a registration.
    ///
    /// Idempotent: deregistering twice, or with a handle the bus no longer
    /// knows, is a no-op.
    fn deregister(&self, handle: &HotkeyHandle);

    /// Park the calling thread until the *next* press of `key`, consuming
    /// that single press. Presses that happened before the call do not
    /// satisfy the wait.
    fn block_until(&self, key: Key);
}

/// RAII wrapper that guarantees deregistration on every exit path.
///
/// A session that registers a hotkey and then errors, cancels, or unwinds
/// would otherwise leak a global listener that keeps firing for unrelated
/// later sessions. Dropping the guard deregisters exactly once; explicit
/// [`release`](HotkeyGuard::release) does the same eagerly when ordering
/// relative to a return value matters.
pub struct HotkeyGuard {
    bus: Arc<dyn HotkeyBus>,
    handle: Option<HotkeyHandle>,
}

impl HotkeyGuard {
    /// Register `callback` for `key` and wrap the handle in a guard.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus rejects the registration.
    pub fn register(
        bus: Arc<dyn HotkeyBus>,
        key: Key,
        callback: HotkeyCallback,
    ) -> CoreResult<Self> {
        let handle = bus.register(key, callback)?;
        Ok(Self {
            bus,
            handle: Some(handle),
        })
    }

    /// Deregister now rather than at drop.
    pub fn release(mut self) {
        self.deregister_once();
    }

    fn deregister_once(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.bus.deregister(&handle);
        }
    }
}

impl Drop for HotkeyGuard {
    fn drop(&mut self) {
        self.deregister_once();
    }
}

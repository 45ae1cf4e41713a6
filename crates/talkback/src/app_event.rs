/// User events delivered to the main-thread event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The quit key fired; exit the process.
    Shutdown,
}

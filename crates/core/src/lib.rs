//! Domain models, error kinds, and the bar window manager shared by the
//! rest of the Wyckoff signal engine workspace.

pub mod bar_window;
pub mod error;
pub mod models;

pub use bar_window::{BarWindow, BarWindowManager, DEFAULT_WINDOW_CAPACITY};
pub use error::{EngineError, EngineResult};
pub use models::*;

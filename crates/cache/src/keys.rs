//! Cache key generators for consistent key naming

/// Cache key prefixes
pub mod prefix {
    pub const EVENT_REPLAY: &str = "events:replay";
}

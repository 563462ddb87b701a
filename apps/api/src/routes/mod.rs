//! API routes

pub mod auth;
pub mod campaigns;
pub mod positions;
pub mod queue;
pub mod signals;
pub mod streaming;

pub use auth::auth_routes;
pub use campaigns::campaign_routes;
pub use positions::position_routes;
pub use queue::queue_routes;
pub use signals::signal_routes;
pub use streaming::streaming_routes;

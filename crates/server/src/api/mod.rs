pub mod handlers;
pub mod middleware;
pub mod queue;
pub mod registrations;
pub mod routes;
pub mod ws;

pub use routes::create_router;
pub use ws::{WsBroadcaster, WsMessage};

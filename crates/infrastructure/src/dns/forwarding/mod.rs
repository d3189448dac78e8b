mod exchange;
mod forwarder;

pub use exchange::exchange;
pub use forwarder::Forwarder;

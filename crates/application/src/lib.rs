pub mod ports;
pub mod rules;
pub mod session;

pub use session::{CompleteHook, Middleware, Session};

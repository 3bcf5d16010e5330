//! Status publishing: a synchronous dispatcher and the handler trait
//! display consumers implement.

pub mod dispatcher;
pub mod handler;

pub use dispatcher::EventDispatcher;
pub use handler::WatchdogEventHandler;

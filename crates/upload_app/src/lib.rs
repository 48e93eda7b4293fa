//! Upload app: binds the pure core to the engine for one embedding UI.
mod handlers;
mod observer;
mod runner;
mod session;

pub use handlers::{ControlAction, ControlHandler, HandlerError, HandlerRegistry};
pub use observer::{LoggingObserver, SessionObserver};
pub use session::{SessionError, UploadSession};

//! Recording sessions and result delivery

mod registry;
mod result;
mod session;

pub use registry::{Listener, Registry};
pub use result::{Outcome, RecordingResult, SessionId};
pub use session::RecordingSession;

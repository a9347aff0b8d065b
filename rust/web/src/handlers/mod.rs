pub mod health;
pub mod session;

pub use session::{start_session, session_action, SessionActionRequest, StartQuery};

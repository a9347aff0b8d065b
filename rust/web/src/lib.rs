pub mod auth;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod score;
pub mod server;
pub mod session;

pub use auth::{AuthError, Authenticator, TOKEN_TTL_SECS};
pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse};
pub use logging::init_logging;
pub use score::{MemoryScoreStore, ScoreError, ScoreStore};
pub use server::{AppContext, ServerConfig, ServerError, ServerHandle, WebServer};
pub use session::{CardView, SessionError, SessionManager, SessionView};

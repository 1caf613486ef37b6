pub mod handlers;
pub mod middleware;
pub mod session;

pub use session::{SessionContext, SessionToken, TOKEN_KEY, VIEW_KEY};

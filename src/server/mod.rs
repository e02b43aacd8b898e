mod app;
mod middleware;
mod state;

pub use app::create_app;
pub use middleware::{read_cookie, session_cookie, session_layer};
pub use state::AppState;

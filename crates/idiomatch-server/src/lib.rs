pub mod handlers;
pub mod rate_limit;

pub use handlers::{AppState, MAX_SENTENCE_LEN, router};

//! HTTP Handlers

mod catalog;
mod narration;
mod ping;
mod websocket;

pub use catalog::{get_topic, list_questions, list_topics};
pub use narration::{
    jump, load, next, pause, play, previous, resume, set_auto_advance, set_mode, set_rate, status,
    stop,
};
pub use ping::ping;
pub use websocket::status_websocket_handler;

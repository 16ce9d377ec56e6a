//! HTTP Handlers

mod narration;
mod ping;
mod websocket;

pub use narration::*;
pub use ping::*;
pub use websocket::*;

//! HTTP Handlers

mod echo;
mod ping;

pub use echo::*;
pub use ping::*;

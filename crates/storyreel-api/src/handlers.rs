//! Request handlers.

pub mod health;
pub mod images;
pub mod story;
pub mod videos;

pub use health::*;
pub use images::*;
pub use story::*;
pub use videos::*;

#![forbid(unsafe_code)]

mod autosave;
mod render;
mod routing;
mod session;
mod templates;
mod transfer;

pub use autosave::*;
pub use render::*;
pub use routing::*;
pub use session::*;
pub use templates::*;
pub use transfer::*;

#![forbid(unsafe_code)]

mod connect;
mod node;
mod state;

pub use connect::*;
pub use node::*;
pub use state::*;

#[cfg(test)]
mod tests;

#![forbid(unsafe_code)]

mod clock;
mod document;
mod error;
mod index;
mod kv;
mod migrate;

pub use clock::*;
pub use document::*;
pub use error::StoreError;
pub use index::*;
pub use kv::KvStore;
pub use migrate::*;

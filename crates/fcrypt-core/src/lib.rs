pub mod config;
pub mod error;
pub mod types;

pub use error::{FcryptError, FcryptResult};
pub use types::Direction;

pub mod abi;
pub mod decoder;
pub mod provider;

pub use abi::SimpleToken;
pub use decoder::{TokenEvent, decode_log};
pub use provider::create_provider;

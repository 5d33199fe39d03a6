pub mod config;
pub mod corpus;
pub mod error;
pub mod search;
pub mod server;
pub mod service;
pub mod util;

pub use error::{Error, ParseError, Result};
pub use service::RecordService;

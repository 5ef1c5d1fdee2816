mod config;
mod error;
mod log;
mod routes;
mod schema;
mod service;

pub use config::Config;
pub use error::*;
pub use log::init_logger;
pub use routes::API;

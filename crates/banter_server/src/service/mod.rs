mod api_service;
mod auth_service;
mod chat_service;
mod conversation_service;
mod db_service;
mod rate_limit_service;

pub use api_service::*;
pub use auth_service::*;
pub use chat_service::*;
pub use conversation_service::*;
pub use rate_limit_service::*;

pub struct Service;

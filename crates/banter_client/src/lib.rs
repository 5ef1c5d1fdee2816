mod client;
mod display;
mod error;
mod gateway;
mod state;

pub use client::*;
pub use display::*;
pub use error::*;
pub use gateway::*;
pub use state::*;

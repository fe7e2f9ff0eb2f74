mod client;
mod error;

pub use client::{PostmanClient, DEFAULT_API_URL};
pub use error::{PostmanError, Result};

mod health;
mod provision;
mod status;
pub mod sse;

pub use health::*;
pub use provision::*;
pub use status::*;

pub mod naming;
pub mod request;

//! Backend module - inference invoker trait and the HTTP worker client

pub mod http_backend;
pub mod traits;

pub use http_backend::HttpBackend;
pub use traits::{InpaintBackend, InpaintRequest};

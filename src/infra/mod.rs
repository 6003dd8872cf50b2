//! Infrastructure adapters and runtime bootstrap.

pub mod assets;
pub mod captcha;
pub mod content;
pub mod db;
pub mod error;
pub mod http;
pub mod mail;
pub mod telemetry;

pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod logging;
pub mod photo;
pub mod review;
pub mod server;

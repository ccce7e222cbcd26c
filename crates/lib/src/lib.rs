//! mediarelay core library: webhook gateway, provider adapters, and the media
//! fetch / store / relay pipeline used by the CLI.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
pub mod media;
pub mod pipeline;

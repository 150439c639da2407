pub mod classify;
pub mod comments;
pub mod config;
pub mod output;
pub mod progress;
pub mod video;

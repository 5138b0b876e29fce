pub mod animation;
pub mod config;
pub mod input;
pub mod time;

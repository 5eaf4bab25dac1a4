pub mod config;
pub mod midi;
pub mod mml;
pub mod score;
pub mod timeline;

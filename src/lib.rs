pub mod app;
pub mod audio;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod dictation;
pub mod query;
pub mod recommend;
pub mod render;
pub mod stt;

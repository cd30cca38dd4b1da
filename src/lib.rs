pub mod assembler;
pub mod catalog;
pub mod config;
pub mod ffmpeg;
pub mod init;
pub mod pipeline;
pub mod story;
pub mod title_card;
pub mod transcribe;
pub mod tts;
pub mod voices;

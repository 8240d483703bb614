//! Subrelay - Caption Extraction, Translation and Burn-in Pipeline
//!
//! Extracts audio from a video with ffmpeg, transcribes it with whisper into an
//! SRT caption document, translates the captions line by line through a shared
//! translation engine, and burns the translated captions back onto the video.

pub mod cli;
pub mod config;
pub mod workflow;
pub mod transcribe;
pub mod translate;
pub mod subtitle;
pub mod media;
pub mod staging;
pub mod error;

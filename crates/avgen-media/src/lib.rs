#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for combining generated media.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs and stream maps
//! - Progress parsing from `-progress pipe:2`
//! - Duration probing via FFprobe
//! - The shortest-wins mux of one video stream and one audio stream

pub mod command;
pub mod error;
pub mod fs_utils;
pub mod mux;
pub mod probe;
pub mod progress;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{copy_file, remove_if_exists};
pub use mux::{Combiner, FfmpegMuxer, MuxOutput, MuxPlan, MuxerConfig, TrimmedInput};
pub use probe::{probe_media, MediaInfo};
pub use progress::FfmpegProgress;

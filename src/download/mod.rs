//! Download management and processing

pub mod archive;
pub mod downloader;
pub mod fetch;
pub mod formats;
pub mod metadata;
pub mod queue;
pub mod ytdlp;

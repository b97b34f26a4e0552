//! # API Route Modules
//!
//! - `upload`: `POST /upload`, the hash, pin and anchor pipeline.
//! - `uploads`: read-only saga records under `/v1/uploads`.
//! - `content`: integrity check of pinned content by CID.

pub mod content;
pub mod upload;
pub mod uploads;

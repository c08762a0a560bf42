//! Movie scene generator - dialogue and scene images for top-rated films
//!
//! Scrapes the IMDb top chart, loads details for a chosen title, then asks a
//! text model for dialogue and a scene description and an image model for a
//! render of that scene. Artifacts are displayed and saved locally.

pub mod ai;
pub mod app;
pub mod display;
pub mod error;
pub mod image;
pub mod models;
pub mod movies;
pub mod orchestrator;
pub mod prompts;
pub mod storage;

pub use error::{Error, Result};

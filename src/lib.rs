//! Hands-free jump control: a webcam hand tracker turns a peace sign into a
//! held key press.

pub mod app;
pub mod args;
pub mod camera;
pub mod config;
pub mod controller;
pub mod detector;
pub mod error;
pub mod font;
pub mod gesture;
pub mod inference;
pub mod keys;
pub mod output;
pub mod overlay;
pub mod pipeline;
pub mod ttf;
pub mod types;

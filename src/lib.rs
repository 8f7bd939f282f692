// src/lib.rs

//! uniscan: university page extraction, validation and merge.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;

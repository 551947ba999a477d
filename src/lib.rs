// src/lib.rs

//! Incremental sync of MLTD ranking border data.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

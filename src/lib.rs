//! Forum pain-point analyzer.
//!
//! Fetches posts from subreddits, groups them by topic and asks a language
//! model to name each group's shared pain point. Also ranks subreddits found
//! by keyword search by subscriber count.

pub mod analysis;
pub mod clustering;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod forums;
pub mod llm;
pub mod models;
pub mod summarize;
pub mod web;

/// Core module for signature-based file classification
///
/// This module contains the matching engine: exact pattern search, the ordered
/// signature table, per-file classification and the concurrent scheduler.

pub mod classifier;
pub mod errors;
pub mod kmp;
pub mod scheduler;
pub mod signatures;

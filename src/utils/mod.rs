/// Utility modules for the signature analyzer
///
/// This module contains utility functions for file handling and output
/// formatting around the classification engine.

pub mod file_utils;
pub mod output_formatter;

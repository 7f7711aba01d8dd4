//! Dynamic RDS: style text compilation and transmission scheduling.

pub mod engine;
pub mod framing;
pub mod metadata;
pub mod processor;
pub mod segmenter;
pub mod style;
pub mod transmitter;

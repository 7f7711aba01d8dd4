//! Cyclic rotation over evaluated lines.
//!
//! The transmitter shows one line at a time at a fixed cadence. [`Segmenter`]
//! hands out the lines of the latest [`EvaluatedOutput`] in order and wraps
//! around forever. Installing a new output restarts the rotation at the first
//! line, so a shorter list never sees a stale position.
//!
//! When every group was omitted there is nothing to rotate; the segmenter then
//! yields its fallback text, empty unless the caller configures one.

use crate::rds::style::EvaluatedOutput;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmenter {
    lines: Vec<String>,
    position: usize,
    fallback: String,
}

impl Segmenter {
    pub fn new(output: EvaluatedOutput) -> Self {
        Self {
            lines: output.into_lines(),
            position: 0,
            fallback: String::new(),
        }
    }

    /// Text to yield while there are no lines.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn set_fallback(&mut self, fallback: impl Into<String>) {
        self.fallback = fallback.into();
    }

    /// Install a fresh output and restart from its first line.
    pub fn update(&mut self, output: EvaluatedOutput) {
        self.lines = output.into_lines();
        self.position = 0;
    }

    /// Start over from the first line.
    pub fn restart(&mut self) {
        self.position = 0;
    }

    /// The line to show now; advances the rotation.
    pub fn next_line(&mut self) -> &str {
        if self.lines.is_empty() {
            return &self.fallback;
        }
        let index = self.position;
        self.position = (self.position + 1) % self.lines.len();
        &self.lines[index]
    }

    /// Index of the line the next call will return.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Never ends: wraps around, or repeats the fallback when there are no lines.
impl Iterator for Segmenter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        Some(self.next_line().to_string())
    }
}

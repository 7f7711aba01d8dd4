//! # dynrds
//!
//! Dynamic RDS text for FM transmitters.
//!
//! File Layout
//!
//! The library is split along the path a style string travels:
//! src/rds
//!   ├── style        Style text compiler: token, lexing, parsing, evaluation, cache, formats
//!   ├── metadata     The values a style string can reference
//!   ├── segmenter    Cyclic rotation over evaluated lines
//!   ├── framing      PS and RadioText screen framing
//!   ├── transmitter  Seam to the transmitter driver
//!   ├── engine       The long running worker fed by the player callbacks
//!   └── processor    Stage/format processing used by the CLI
//!
//! The compiler is total: any style string parses, and evaluation never fails.
//! Only the engine's I/O edges return errors.

pub mod rds;

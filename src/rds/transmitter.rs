//! Transmitter seam.
//!
//! The engine decides *what* to show and *when*; a [`Transmitter`] puts it on
//! air. Hardware drivers live outside this crate. [`LogTransmitter`] frames the
//! text exactly like a driver would and logs it instead of writing registers,
//! and [`MemoryTransmitter`] records every call for inspection.

use crate::rds::framing::{ps_fragments, rt_frame};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum TransmitterError {
    #[error("transmitter is not active")]
    Inactive,
}

pub type Result<T> = std::result::Result<T, TransmitterError>;

pub trait Transmitter {
    /// Bring the carrier and RDS encoder up.
    fn startup(&mut self) -> Result<()>;

    fn shutdown(&mut self) -> Result<()>;

    fn is_active(&self) -> bool;

    /// Show one Program Service line.
    fn send_ps(&mut self, text: &str) -> Result<()>;

    /// Show one RadioText line.
    fn send_rt(&mut self, text: &str) -> Result<()>;

    /// RadioText buffer size changed in the settings.
    fn set_rt_size(&mut self, _rt_size: usize) {}
}

/// Frames text like a driver and writes it to the log.
#[derive(Debug, Clone)]
pub struct LogTransmitter {
    rt_size: usize,
    active: bool,
}

impl LogTransmitter {
    pub fn new(rt_size: usize) -> Self {
        Self {
            rt_size,
            active: false,
        }
    }
}

impl Transmitter for LogTransmitter {
    fn set_rt_size(&mut self, rt_size: usize) {
        self.rt_size = rt_size;
    }

    fn startup(&mut self) -> Result<()> {
        info!("transmitter starting");
        self.active = true;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        info!("transmitter stopping");
        self.active = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn send_ps(&mut self, text: &str) -> Result<()> {
        if !self.active {
            return Err(TransmitterError::Inactive);
        }
        info!(fragments = ?ps_fragments(text), "PS");
        Ok(())
    }

    fn send_rt(&mut self, text: &str) -> Result<()> {
        if !self.active {
            return Err(TransmitterError::Inactive);
        }
        let frame = rt_frame(text, self.rt_size);
        info!(fragment = %frame.replace('\r', "\\r"), "RT");
        Ok(())
    }
}

/// Something the engine asked a [`MemoryTransmitter`] to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Startup,
    Shutdown,
    Ps(String),
    Rt(String),
}

/// Keeps every call in order.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransmitter {
    pub sent: Vec<Sent>,
    active: bool,
}

impl MemoryTransmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ps_lines(&self) -> Vec<&str> {
        self.sent
            .iter()
            .filter_map(|s| match s {
                Sent::Ps(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn rt_lines(&self) -> Vec<&str> {
        self.sent
            .iter()
            .filter_map(|s| match s {
                Sent::Rt(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Transmitter for MemoryTransmitter {
    fn startup(&mut self) -> Result<()> {
        self.active = true;
        self.sent.push(Sent::Startup);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.active = false;
        self.sent.push(Sent::Shutdown);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn send_ps(&mut self, text: &str) -> Result<()> {
        if !self.active {
            return Err(TransmitterError::Inactive);
        }
        self.sent.push(Sent::Ps(text.to_string()));
        Ok(())
    }

    fn send_rt(&mut self, text: &str) -> Result<()> {
        if !self.active {
            return Err(TransmitterError::Inactive);
        }
        self.sent.push(Sent::Rt(text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_transmitter_refuses_text() {
        let mut tx = LogTransmitter::new(32);
        assert!(matches!(tx.send_ps("x"), Err(TransmitterError::Inactive)));
        tx.startup().expect("startup");
        assert!(tx.send_ps("x").is_ok());
        assert!(tx.send_rt("x").is_ok());
        tx.shutdown().expect("shutdown");
        assert!(!tx.is_active());
    }

    #[test]
    fn test_memory_transmitter_records_in_order() {
        let mut tx = MemoryTransmitter::new();
        tx.startup().expect("startup");
        tx.send_ps("Merry").expect("ps");
        tx.send_rt("Silent Night").expect("rt");
        tx.shutdown().expect("shutdown");
        assert_eq!(
            tx.sent,
            vec![
                Sent::Startup,
                Sent::Ps("Merry".into()),
                Sent::Rt("Silent Night".into()),
                Sent::Shutdown,
            ]
        );
        assert_eq!(tx.ps_lines(), vec!["Merry"]);
    }
}

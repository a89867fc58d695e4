//! Standard output writer

use super::Writer;
use crate::core::error::{LoggerError, Result};
use std::io::{self, Write};

/// Writes each record to stdout in one locked call
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutWriter;

impl StdoutWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Writer for StdoutWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        let mut out = io::stdout().lock();
        out.write_all(buf).map_err(LoggerError::write)?;
        Ok(buf.len())
    }

    fn close(&self) -> Result<()> {
        io::stdout().flush().map_err(LoggerError::write)
    }

    fn name(&self) -> &str {
        "stdout"
    }
}

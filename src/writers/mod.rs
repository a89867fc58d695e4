//! Output connections for rendered records

pub mod net;
pub mod reconnecting;
pub mod stdout;
#[cfg(unix)]
pub mod unixgram;

pub use net::NetWriter;
pub use reconnecting::{ConnectionState, ReconnectingWriter};
pub use stdout::StdoutWriter;
#[cfg(unix)]
pub use unixgram::NonBlockingDatagramWriter;

use crate::core::config::BackoffPolicy;
use crate::core::error::{LoggerError, Result};
use std::sync::Arc;

/// A connection that accepts whole records
///
/// Writers are shared by every worker thread of a transport, so all methods
/// take `&self`. `write` returns the number of bytes accepted; anything short
/// of the full record counts as a failed delivery.
///
/// # Example
///
/// ```
/// use rust_log_transport::writers::Writer;
/// use rust_log_transport::core::Result;
/// use std::sync::Mutex;
///
/// struct MemoryWriter(Mutex<Vec<u8>>);
///
/// impl Writer for MemoryWriter {
///     fn write(&self, buf: &[u8]) -> Result<usize> {
///         self.0.lock().unwrap().extend_from_slice(buf);
///         Ok(buf.len())
///     }
///
///     fn close(&self) -> Result<()> {
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "memory"
///     }
/// }
/// ```
pub trait Writer: Send + Sync {
    fn write(&self, buf: &[u8]) -> Result<usize>;
    fn close(&self) -> Result<()>;
    fn name(&self) -> &str;
}

impl<W: Writer + ?Sized> Writer for Arc<W> {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<W: Writer + ?Sized> Writer for Box<W> {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Opens a connection for `(network, address)`
pub type Dialer = Arc<dyn Fn(&str, &str) -> Result<Box<dyn Writer>> + Send + Sync>;

/// Open a connection of the given kind
///
/// An empty network or address selects stdout.
#[cfg_attr(not(unix), allow(unused_variables))]
pub fn dial(network: &str, address: &str, backoff: &BackoffPolicy) -> Result<Box<dyn Writer>> {
    if network.is_empty() || address.is_empty() {
        return Ok(Box::new(StdoutWriter::new()));
    }

    match network {
        #[cfg(unix)]
        "unixgram_nonblocking" => Ok(Box::new(NonBlockingDatagramWriter::new(
            address,
            backoff.clone(),
        )?)),
        #[cfg(unix)]
        "unixgram" => Ok(Box::new(NetWriter::unixgram(address)?)),
        #[cfg(unix)]
        "unix" => Ok(Box::new(NetWriter::unix(address)?)),
        "tcp" | "tcp4" | "tcp6" => Ok(Box::new(NetWriter::tcp(network, address)?)),
        "udp" | "udp4" | "udp6" => Ok(Box::new(NetWriter::udp(network, address)?)),
        other => Err(LoggerError::config(
            "network",
            format!("unsupported network '{}'", other),
        )),
    }
}

/// Dialer backed by [`dial`]
pub fn default_dialer(backoff: BackoffPolicy) -> Dialer {
    Arc::new(move |network: &str, address: &str| dial(network, address, &backoff))
}

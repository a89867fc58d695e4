//! Connected socket writers (TCP, UDP and Unix sockets)

use super::Writer;
use crate::core::error::{LoggerError, Result};
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::net::{UnixDatagram, UnixStream};

/// Write deadline for stream sockets
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(50);

enum Connection {
    Tcp(TcpStream),
    Udp(UdpSocket),
    #[cfg(unix)]
    Unix(UnixStream),
    #[cfg(unix)]
    Unixgram(UnixDatagram),
}

/// One connected socket
///
/// Stream sockets write the whole record or fail; datagram sockets send the
/// record as a single datagram.
pub struct NetWriter {
    conn: Connection,
    name: &'static str,
}

impl NetWriter {
    /// Connect over TCP; `tcp4`/`tcp6` restrict the address family
    pub fn tcp(network: &str, address: &str) -> Result<Self> {
        let addrs = resolve(network, address)?;
        let stream =
            TcpStream::connect(&addrs[..]).map_err(|e| LoggerError::connect(network, address, e))?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            conn: Connection::Tcp(stream),
            name: "tcp",
        })
    }

    /// Connected UDP socket; `udp4`/`udp6` restrict the address family
    pub fn udp(network: &str, address: &str) -> Result<Self> {
        let addrs = resolve(network, address)?;
        let mut last_err = None;

        for addr in addrs {
            let local = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
            let attempt = UdpSocket::bind(local).and_then(|socket| {
                socket.connect(addr)?;
                Ok(socket)
            });
            match attempt {
                Ok(socket) => {
                    return Ok(Self {
                        conn: Connection::Udp(socket),
                        name: "udp",
                    })
                }
                Err(e) => last_err = Some(e),
            }
        }

        let source = last_err
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no usable address"));
        Err(LoggerError::connect(network, address, source))
    }

    #[cfg(unix)]
    pub fn unix(path: &str) -> Result<Self> {
        let stream = UnixStream::connect(path).map_err(|e| LoggerError::connect("unix", path, e))?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;

        Ok(Self {
            conn: Connection::Unix(stream),
            name: "unix",
        })
    }

    /// Blocking datagram socket connected to `path`
    #[cfg(unix)]
    pub fn unixgram(path: &str) -> Result<Self> {
        let socket = UnixDatagram::unbound()?;
        socket
            .connect(path)
            .map_err(|e| LoggerError::connect("unixgram", path, e))?;

        Ok(Self {
            conn: Connection::Unixgram(socket),
            name: "unixgram",
        })
    }
}

fn resolve(network: &str, address: &str) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = address
        .to_socket_addrs()
        .map_err(|e| LoggerError::connect(network, address, e))?
        .filter(|addr| match network.as_bytes().last() {
            Some(b'4') => addr.is_ipv4(),
            Some(b'6') => addr.is_ipv6(),
            _ => true,
        })
        .collect();

    if addrs.is_empty() {
        return Err(LoggerError::connect(
            network,
            address,
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no address for this network"),
        ));
    }
    Ok(addrs)
}

impl Writer for NetWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        let written = match &self.conn {
            Connection::Tcp(stream) => {
                let mut stream = stream;
                stream.write_all(buf).map(|()| buf.len())
            }
            Connection::Udp(socket) => socket.send(buf),
            #[cfg(unix)]
            Connection::Unix(stream) => {
                let mut stream = stream;
                stream.write_all(buf).map(|()| buf.len())
            }
            #[cfg(unix)]
            Connection::Unixgram(socket) => socket.send(buf),
        };
        written.map_err(LoggerError::write)
    }

    fn close(&self) -> Result<()> {
        let result = match &self.conn {
            Connection::Tcp(stream) => stream.shutdown(Shutdown::Both),
            Connection::Udp(_) => Ok(()),
            #[cfg(unix)]
            Connection::Unix(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Connection::Unixgram(socket) => socket.shutdown(Shutdown::Both),
        };

        match result {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        self.name
    }
}

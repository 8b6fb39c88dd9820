//! Free port discovery for the preview server.

use std::net::Ipv4Addr;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::debug;

/// How many ports past the start are probed.
pub const PORT_RANGE: u16 = 1000;

/// Port scan errors.
#[derive(Debug, Error)]
pub enum PortError {
    /// Every port in the range was taken.
    #[error("no available port found in range {start}-{end}")]
    NoFreePort { start: u16, end: u16 },
}

/// Result type for port operations.
pub type Result<T> = std::result::Result<T, PortError>;

/// First port in `[start, start + 1000]` that can be bound on localhost.
pub async fn find_port(start: u16) -> Result<u16> {
    let end = start.saturating_add(PORT_RANGE);

    for port in start..=end {
        match TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await {
            Ok(_) => return Ok(port),
            Err(e) => debug!(port, error = %e, "port unavailable"),
        }
    }

    Err(PortError::NoFreePort { start, end })
}

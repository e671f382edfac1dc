//! Emulator targets (direct QEMU vs phone-simulator relay).
//!
//! parse_target -> TargetSpec { Qemu | Phonesim }
//! connect      -> Box<dyn Transport> for the parsed target.
//!
pub mod protocol;
pub mod transport;

use anyhow::{Context, Result, bail};
use std::fmt;
use url::Url;

pub use transport::{PhoneEndpoint, PhonesimTransport, QemuTransport, Transport};

/// Which of the two transport variants a target uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Direct TCP connection to the emulator's control port.
    Qemu,
    /// WebSocket connection to the phone simulator, which relays to the emulator.
    Phonesim,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetKind::Qemu => "qemu",
            TargetKind::Phonesim => "phonesim",
        })
    }
}

/// A parsed representation of a user-supplied target string.
#[derive(Debug, Clone)]
pub enum TargetSpec {
    Qemu {
        original: String,
        host: String,
        port: u16,
    },
    Phonesim {
        original: String,
        url: Url,
    },
}

impl TargetSpec {
    /// Returns the original user-supplied form.
    pub fn original(&self) -> &str {
        match self {
            TargetSpec::Qemu { original, .. } => original,
            TargetSpec::Phonesim { original, .. } => original,
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            TargetSpec::Qemu { .. } => TargetKind::Qemu,
            TargetSpec::Phonesim { .. } => TargetKind::Phonesim,
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::Qemu { host, port, .. } => write!(f, "qemu: {host}:{port}"),
            TargetSpec::Phonesim { url, .. } => write!(f, "phonesim: {url}"),
        }
    }
}

/// Parse a `--target` value into a structured `TargetSpec`.
///
/// - `ws://` / `wss://` URLs -> phone-simulator relay
/// - `qemu://host:port` / `tcp://host:port` -> direct emulator connection
/// - bare `host:port` (IPv6 hosts in brackets) -> direct emulator connection
///
/// Other schemes, missing ports and empty strings are rejected.
pub fn parse_target(raw: &str) -> Result<TargetSpec> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("Target string is empty");
    }

    // `localhost:12344` would parse as a URL with scheme "localhost".
    if !trimmed.contains("://") {
        let (host, port) = split_host_port(trimmed)?;
        return Ok(TargetSpec::Qemu {
            original: raw.to_string(),
            host,
            port,
        });
    }

    let url = Url::parse(trimmed).with_context(|| format!("Invalid target URL: '{trimmed}'"))?;
    match url.scheme() {
        "ws" | "wss" => Ok(TargetSpec::Phonesim {
            original: raw.to_string(),
            url,
        }),
        "qemu" | "tcp" => {
            let host = url
                .host_str()
                .filter(|h| !h.is_empty())
                .context("Emulator target is missing a host")?
                .trim_start_matches('[')
                .trim_end_matches(']')
                .to_string();
            let port = url.port().context("Emulator target is missing a port")?;
            Ok(TargetSpec::Qemu {
                original: raw.to_string(),
                host,
                port,
            })
        }
        other => bail!("Unsupported target scheme '{other}' (expected qemu, tcp, ws or wss)"),
    }
}

fn split_host_port(s: &str) -> Result<(String, u16)> {
    let (host, port) = s
        .rsplit_once(':')
        .with_context(|| format!("Emulator target '{s}' must be HOST:PORT"))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        bail!("Emulator target '{s}' is missing a host");
    }
    let port = port
        .parse::<u16>()
        .with_context(|| format!("Invalid port in emulator target '{s}'"))?;
    Ok((host.to_string(), port))
}

/// Open the transport variant selected by the target.
pub async fn connect(spec: &TargetSpec) -> std::io::Result<Box<dyn Transport>> {
    match spec {
        TargetSpec::Qemu { host, port, .. } => {
            let transport = QemuTransport::connect(host, *port).await?;
            Ok(Box::new(transport))
        }
        TargetSpec::Phonesim { url, .. } => {
            let transport = PhonesimTransport::connect(url).await?;
            Ok(Box::new(transport))
        }
    }
}

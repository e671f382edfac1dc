//! Transport capability shared by both emulator connection variants.
//!
//! `QemuTransport` writes framed event bodies straight to the emulator's TCP
//! control port. `PhonesimTransport` wraps each body in a relay message and
//! sends it over the phone simulator's websocket; it is also the only variant
//! that can talk to the phone simulator itself (app configuration).

use std::io;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::TargetKind;
use super::protocol::{AppConfigMessage, EmulatorEvent};
use crate::{log_debug, log_trace};

/* ---- QEMU framing ---- */

const QEMU_HEADER_SIGNATURE: u16 = 0xFEED;
const QEMU_FOOTER_SIGNATURE: u16 = 0xBEEF;

/* ---- Phone simulator websocket opcodes ---- */

const WS_RELAY_QEMU: u8 = 0x0b;

/// Phone-simulator endpoints a correlated response can be awaited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneEndpoint {
    AppConfig,
}

impl PhoneEndpoint {
    pub const fn opcode(self) -> u8 {
        match self {
            PhoneEndpoint::AppConfig => 0x0a,
        }
    }
}

/// A live connection able to deliver emulator events.
///
/// `send_event` is the one polymorphic send every command uses. The phone
/// simulator operations default to `Unsupported` so only the relay variant
/// has to implement them.
#[async_trait]
pub trait Transport: Send {
    fn kind(&self) -> TargetKind;

    async fn send_event(&mut self, event: &EmulatorEvent) -> io::Result<()>;

    async fn send_app_config(&mut self, _message: &AppConfigMessage) -> io::Result<()> {
        Err(unsupported(self.kind(), "app configuration messages"))
    }

    /// Block until the phone simulator sends a message on `endpoint`,
    /// returning its body (opcode stripped). Messages for other endpoints are discarded.
    async fn read_phone_message(&mut self, _endpoint: PhoneEndpoint) -> io::Result<Vec<u8>> {
        Err(unsupported(self.kind(), "phone simulator responses"))
    }

    /// End the session after the last send.
    async fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn unsupported(kind: TargetKind, what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{kind} transport cannot carry {what}"),
    )
}

/* ---- Direct emulator transport ---- */

pub struct QemuTransport {
    stream: TcpStream,
}

impl QemuTransport {
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await.map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Could not connect to emulator at {host}:{port}: {e}"),
            )
        })?;
        log_debug!("[qemu] connected to {host}:{port}");
        Ok(Self { stream })
    }
}

/// Wrap an event body in the emulator's serial envelope.
pub fn frame_qemu(protocol: u16, body: &[u8]) -> io::Result<Vec<u8>> {
    let len = u16::try_from(body.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("payload of {} bytes exceeds the emulator frame limit", body.len()),
        )
    })?;
    let mut frame = Vec::with_capacity(body.len() + 8);
    frame.extend_from_slice(&QEMU_HEADER_SIGNATURE.to_be_bytes());
    frame.extend_from_slice(&protocol.to_be_bytes());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(body);
    frame.extend_from_slice(&QEMU_FOOTER_SIGNATURE.to_be_bytes());
    Ok(frame)
}

#[async_trait]
impl Transport for QemuTransport {
    fn kind(&self) -> TargetKind {
        TargetKind::Qemu
    }

    async fn send_event(&mut self, event: &EmulatorEvent) -> io::Result<()> {
        let frame = frame_qemu(event.protocol(), &event.encode())?;
        log_trace!("[qemu] -> {} ({} bytes)", event.label(), frame.len());
        self.stream.write_all(&frame).await?;
        self.stream.flush().await
    }

    async fn finish(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}

/* ---- Phone simulator relay transport ---- */

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct PhonesimTransport {
    ws: WsStream,
}

impl PhonesimTransport {
    pub async fn connect(url: &Url) -> io::Result<Self> {
        let (ws, _response) = connect_async(url.as_str()).await.map_err(ws_error)?;
        log_debug!("[phonesim] connected to {url}");
        Ok(Self { ws })
    }

    async fn send_binary(&mut self, frame: Vec<u8>) -> io::Result<()> {
        self.ws
            .send(Message::Binary(frame.into()))
            .await
            .map_err(ws_error)
    }
}

/// Wrap an event body in a relay-to-emulator websocket message.
pub fn frame_relay(event: &EmulatorEvent) -> Vec<u8> {
    let body = event.encode();
    let mut frame = Vec::with_capacity(body.len() + 2);
    frame.push(WS_RELAY_QEMU);
    // Relay messages carry the protocol number in a single byte.
    frame.push(event.protocol() as u8);
    frame.extend_from_slice(&body);
    frame
}

fn frame_app_config(message: &AppConfigMessage) -> Vec<u8> {
    let body = message.encode();
    let mut frame = Vec::with_capacity(body.len() + 1);
    frame.push(PhoneEndpoint::AppConfig.opcode());
    frame.extend_from_slice(&body);
    frame
}

fn ws_error(err: tungstenite::Error) -> io::Error {
    match err {
        tungstenite::Error::Io(e) => e,
        other => io::Error::other(other),
    }
}

#[async_trait]
impl Transport for PhonesimTransport {
    fn kind(&self) -> TargetKind {
        TargetKind::Phonesim
    }

    async fn send_event(&mut self, event: &EmulatorEvent) -> io::Result<()> {
        log_trace!("[phonesim] relay -> {}", event.label());
        self.send_binary(frame_relay(event)).await
    }

    async fn send_app_config(&mut self, message: &AppConfigMessage) -> io::Result<()> {
        log_trace!("[phonesim] -> {}", message.label());
        self.send_binary(frame_app_config(message)).await
    }

    async fn read_phone_message(&mut self, endpoint: PhoneEndpoint) -> io::Result<Vec<u8>> {
        let opcode = endpoint.opcode();
        loop {
            match self.ws.next().await {
                None | Some(Ok(Message::Close(_))) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "phone simulator closed the connection",
                    ));
                }
                Some(Err(e)) => return Err(ws_error(e)),
                Some(Ok(Message::Binary(data))) => match data.split_first() {
                    Some((&op, body)) if op == opcode => return Ok(body.to_vec()),
                    Some((&op, _)) => log_trace!("[phonesim] skipping message for opcode 0x{op:02x}"),
                    None => log_trace!("[phonesim] skipping empty message"),
                },
                Some(Ok(_)) => continue,
            }
        }
    }

    async fn finish(&mut self) -> io::Result<()> {
        log_trace!("[phonesim] closing websocket");
        self.ws.close(None).await.map_err(ws_error)
    }
}

/* ---- In-memory transport for command tests ---- */


#[cfg(test)]
mod tests {
    use super::*;
    use crate::emu::protocol::{AccelSample, AccelSamples, Button};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn qemu_frame_layout() {
        let frame = frame_qemu(8, &[4]).unwrap();
        assert_eq!(frame, vec![0xFE, 0xED, 0x00, 0x08, 0x00, 0x01, 0x04, 0xBE, 0xEF]);
    }

    #[test]
    fn qemu_frame_rejects_oversized_bodies() {
        let err = frame_qemu(6, &vec![0u8; 70_000]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn relay_frame_prefixes_opcode_and_protocol() {
        let frame = frame_relay(&EmulatorEvent::Battery {
            percent: 50,
            charging: false,
        });
        assert_eq!(frame, vec![0x0b, 5, 50, 0]);
    }

    #[test]
    fn app_config_frame_uses_config_opcode() {
        assert_eq!(frame_app_config(&AppConfigMessage::Cancelled), vec![0x0a, 0x03]);
    }

    #[tokio::test]
    async fn qemu_transport_writes_framed_event() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            sock.read_to_end(&mut buf).await.unwrap();
            buf
        });

        let mut transport = QemuTransport::connect("127.0.0.1", port).await.unwrap();
        assert_eq!(transport.kind(), TargetKind::Qemu);
        let samples = AccelSamples::try_from(vec![AccelSample::new(0, 0, 0)]).unwrap();
        transport
            .send_event(&EmulatorEvent::Accel { samples })
            .await
            .unwrap();
        drop(transport);

        let received = server.await.unwrap();
        assert_eq!(
            received,
            vec![0xFE, 0xED, 0, 6, 0, 7, 1, 0, 0, 0, 0, 0, 0, 0xBE, 0xEF]
        );
    }

    #[tokio::test]
    async fn qemu_transport_refuses_phone_operations() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _accept = tokio::spawn(async move { listener.accept().await });

        let mut transport = QemuTransport::connect("127.0.0.1", port).await.unwrap();
        let err = transport
            .send_app_config(&AppConfigMessage::Setup)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn phonesim_transport_relays_and_reads_correlated_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (sock, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(sock).await.unwrap();
            let mut received = Vec::new();
            for _ in 0..2 {
                if let Some(Ok(Message::Binary(data))) = ws.next().await {
                    received.push(data.to_vec());
                }
            }
            // Unrelated traffic first, then the app config reply.
            ws.send(Message::Binary(vec![0x01, 0xAA].into())).await.unwrap();
            ws.send(Message::Text("log line".into())).await.unwrap();
            ws.send(Message::Binary(vec![0x0a, 0x01, 0, 0, 0, 2, b'h', b'i'].into()))
                .await
                .unwrap();
            let closed = matches!(ws.next().await, Some(Ok(Message::Close(_))));
            (received, closed)
        });

        let url = Url::parse(&format!("ws://127.0.0.1:{port}/")).unwrap();
        let mut transport = PhonesimTransport::connect(&url).await.unwrap();
        transport
            .send_event(&EmulatorEvent::Button {
                button: Button::Up,
            })
            .await
            .unwrap();
        transport
            .send_app_config(&AppConfigMessage::Setup)
            .await
            .unwrap();
        let body = transport
            .read_phone_message(PhoneEndpoint::AppConfig)
            .await
            .unwrap();
        assert_eq!(body, vec![0x01, 0, 0, 0, 2, b'h', b'i']);
        transport.finish().await.unwrap();

        let (received, closed) = server.await.unwrap();
        assert_eq!(received, vec![vec![0x0b, 8, 2], vec![0x0a, 0x01]]);
        assert!(closed, "expected a websocket close frame after finish");
    }
}

//! Browser controller for app configuration pages.
//!
//! The configuration page is told to navigate to
//! `http://localhost:<port>/close?<query>` when it is done. A loopback axum
//! server answers that request and hands the query string back to the waiting
//! command over a oneshot channel.

use std::io;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::ToolError;
use crate::{log_debug, log_error};

/// How long `closed()` waits for open browser connections to drain.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// How the configuration URL reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    /// Open the system browser (`BROWSER`, else the platform opener).
    System,
    /// Only print the URL.
    PrintOnly,
}

#[derive(Debug, Clone)]
pub struct BrowserController {
    launch: Launch,
}

/// A configuration page that has been opened and whose close is pending.
pub struct PendingClose {
    /// The URL handed to the browser, including `return_to`.
    pub url: String,
    pub port: u16,
    rx: oneshot::Receiver<String>,
    shutdown_tx: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

impl PendingClose {
    /// Wait for the page to navigate to `/close`. Resolves to the raw query
    /// string; an empty string means the user cancelled.
    pub async fn closed(self) -> Result<String, ToolError> {
        let PendingClose {
            rx,
            shutdown_tx,
            server,
            ..
        } = self;
        let query = rx
            .await
            .map_err(|_| ToolError::Browser("listener stopped before the page was closed".into()));
        let _ = shutdown_tx.send(());
        if tokio::time::timeout(SHUTDOWN_GRACE, server).await.is_err() {
            log_debug!("[browser] return listener still draining, leaving it behind");
        }
        query
    }
}

/// The close sender, taken by whichever request reaches `/close` first.
type CloseSlot = Arc<Mutex<Option<oneshot::Sender<String>>>>;

impl BrowserController {
    pub fn new(launch: Launch) -> Self {
        Self { launch }
    }

    /// Start the return listener, then open `config_url` with `return_to` appended.
    pub async fn open_config_page(&self, config_url: &str) -> Result<PendingClose, ToolError> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| ToolError::Browser(format!("cannot bind return listener: {e}")))?;
        let port = listener
            .local_addr()
            .map_err(|e| ToolError::Browser(e.to_string()))?
            .port();

        let url = append_return_to(config_url, port);
        let (tx, rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = Router::new()
            .route("/close", get(close))
            .with_state(Arc::new(Mutex::new(Some(tx))) as CloseSlot);

        let server = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                log_debug!("[browser] return listener failed: {e}");
            }
        });
        log_debug!("[browser] waiting for /close on port {port}");

        match self.launch {
            Launch::System => {
                if let Err(e) = open_browser(&url) {
                    log_error!("failed to open browser: {e}");
                    println!("Open this URL in a browser: {url}");
                }
            }
            Launch::PrintOnly => println!("Open this URL in a browser: {url}"),
        }

        Ok(PendingClose {
            url,
            port,
            rx,
            shutdown_tx,
            server,
        })
    }
}

/// Append `return_to` to the URL fragment; the emulator's config pages read it from there.
pub fn append_return_to(url: &str, port: u16) -> String {
    let return_to = format!("http://localhost:{port}/close?");
    let param = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("return_to", &return_to)
        .finish();
    let sep = if url.contains('#') { '&' } else { '#' };
    format!("{url}{sep}{param}")
}

/// `GET /close?<query>`: hand the raw query back (absent means empty).
async fn close(State(slot): State<CloseSlot>, RawQuery(query): RawQuery) -> &'static str {
    let sender = slot.lock().ok().and_then(|mut pending| pending.take());
    match sender {
        Some(tx) => {
            let _ = tx.send(query.unwrap_or_default());
        }
        None => log_debug!("[browser] ignoring repeated /close"),
    }
    "OK"
}

fn open_browser(url: &str) -> io::Result<()> {
    if let Ok(browser) = std::env::var("BROWSER")
        && !browser.trim().is_empty()
    {
        let parts = shell_words::split(&browser)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        if let Some((program, args)) = parts.split_first() {
            Command::new(program).args(args).arg(url).spawn()?;
            return Ok(());
        }
    }

    #[cfg(target_os = "windows")]
    {
        Command::new("cmd").args(["/C", "start", "", url]).spawn()?;
    }
    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg(url).spawn()?;
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Command::new("xdg-open").arg(url).spawn()?;
    }
    Ok(())
}

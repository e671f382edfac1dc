/*!
`app_config.rs`

Implements `emu-app-config [--file PATH] [--timeout SECS] [--no-open]`.

Flow (phone-simulator relay targets only):
  1. Obtain the configuration URL:
       - default: send a config *setup* request and wait for the phone
         simulator's correlated response carrying the URL
       - `--file`: use `file://<absolute path>` and skip the exchange
  2. Open the URL in a browser with a `return_to` pointing at a loopback
     listener, and wait for the page to navigate there.
  3. Empty query -> send *config cancelled*; anything else -> send
     *config response* carrying the query verbatim.

The listener runs as its own task; its result is handed back over a
oneshot channel and the follow-up send happens on the command's task, which
owns the transport.
*/

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cmd::shared::{Invocation, announce, finish, report, runtime};
use crate::emu::protocol::{AppConfigMessage, decode_config_url};
use crate::emu::{self, PhoneEndpoint, TargetKind, Transport};
use crate::error::ToolError;
use crate::{log_debug, log_info};
use crate::utils::browser::{BrowserController, Launch};

pub const COMMAND: &str = "emu-app-config";

/// CLI arguments for `emu-app-config`
#[derive(Args, Debug)]
pub struct AppConfigArgs {
    /// Local file to use as the settings page in lieu of the URL the app provides
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Seconds to wait for the phone simulator to answer with the config URL (0 waits forever)
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Print the configuration URL instead of launching a browser
    #[arg(long)]
    pub no_open: bool,
}

impl AppConfigArgs {
    fn response_timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}

pub fn execute_app_config(args: AppConfigArgs, inv: &Invocation) -> Result<()> {
    announce(COMMAND, inv.json);
    let spec = inv.require_target()?;
    require_relay(spec.kind())?;

    let launch = if args.no_open {
        Launch::PrintOnly
    } else {
        Launch::System
    };
    let browser = BrowserController::new(launch);
    let local_page = args.file.as_deref().map(file_url).transpose()?;

    let rt = runtime()?;
    let sent = rt.block_on(async {
        let mut transport = emu::connect(spec).await.map_err(ToolError::from)?;
        let url = match local_page {
            Some(url) => url,
            None => request_config_url(transport.as_mut(), args.response_timeout()).await?,
        };
        if inv.json {
            eprintln!("{url}");
        } else {
            println!("{url}");
        }

        let pending = browser.open_config_page(&url).await?;
        log_debug!("opened {} (return listener on port {})", pending.url, pending.port);
        log_info!("waiting for the configuration page to close");
        let query = pending.closed().await?;
        let sent = handle_config_close(transport.as_mut(), &query).await?;
        finish(transport.as_mut()).await;
        Ok::<_, ToolError>(sent)
    })?;

    report(COMMAND, sent.label(), spec, &sent, inv.json);
    Ok(())
}

fn require_relay(kind: TargetKind) -> Result<(), ToolError> {
    if kind != TargetKind::Phonesim {
        return Err(ToolError::usage(
            "App config is only supported over phonesim connections",
        ));
    }
    Ok(())
}

/// `file://` URL for a local settings page.
pub fn file_url(path: &Path) -> Result<String, ToolError> {
    let abs = std::fs::canonicalize(path).map_err(|e| {
        ToolError::usage(format!("Cannot resolve config file '{}': {e}", path.display()))
    })?;
    Ok(format!("file://{}", abs.display()))
}

/// Ask the phone simulator for the app's configuration URL and wait for the
/// correlated reply.
pub async fn request_config_url(
    transport: &mut dyn Transport,
    timeout: Option<Duration>,
) -> Result<String, ToolError> {
    require_relay(transport.kind())?;
    transport.send_app_config(&AppConfigMessage::Setup).await?;

    let reply = transport.read_phone_message(PhoneEndpoint::AppConfig);
    let body = match timeout {
        Some(limit) => tokio::time::timeout(limit, reply).await.map_err(|_| {
            ToolError::Transport(format!(
                "Timed out after {}s waiting for the app configuration URL",
                limit.as_secs()
            ))
        })??,
        None => reply.await?,
    };
    decode_config_url(&body)
}

/// Translate the browser's close notification into the follow-up message and send it.
pub async fn handle_config_close(
    transport: &mut dyn Transport,
    query: &str,
) -> Result<AppConfigMessage, ToolError> {
    let message = if query.is_empty() {
        AppConfigMessage::Cancelled
    } else {
        AppConfigMessage::Response(query.to_string())
    };
    transport.send_app_config(&message).await?;
    Ok(message)
}

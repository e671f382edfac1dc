/*!
shared.rs - dispatch scaffolding shared by every emulator subcommand.

Focus:
  - Invocation: resolved global options (target, json output)
  - announce: the "Running {command}..." banner
  - dispatch: build event -> connect -> send -> report
  - deliver: the single send boundary that turns I/O errors into tool errors
  - finish: close the session once the last message is out
*/

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cmd::format::{Role, StyleOptions, color, emoji};
use crate::emu::protocol::EmulatorEvent;
use crate::emu::{self, TargetSpec, Transport};
use crate::error::ToolError;
use crate::log_debug;

/* ---- Global options ---- */

/// Options resolved once in `main` and handed to every command.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// Target from `--target` or `EMU_TARGET`, already parsed.
    pub target: Option<TargetSpec>,
    /// Emit machine-readable JSON instead of styled text.
    pub json: bool,
}

impl Invocation {
    pub fn require_target(&self) -> Result<&TargetSpec, ToolError> {
        self.target.as_ref().ok_or_else(|| {
            ToolError::usage("no emulator target specified (use --target or EMU_TARGET)")
        })
    }
}

/* ---- Dispatch ---- */

/// Print the start banner. In JSON mode it goes to stderr to keep stdout parseable.
pub fn announce(command: &str, json: bool) {
    if json {
        eprintln!("Running {command}...");
    } else {
        println!("Running {command}...");
    }
}

/// Create the per-command runtime.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")
}

/// Shared body of every single-event command.
///
/// The event is built before connecting so usage errors never touch the emulator.
pub fn dispatch(
    command: &str,
    inv: &Invocation,
    build: impl FnOnce() -> Result<EmulatorEvent, ToolError>,
) -> Result<()> {
    announce(command, inv.json);
    let event = build()?;
    let spec = inv.require_target()?;

    let rt = runtime()?;
    rt.block_on(async {
        let mut transport = emu::connect(spec).await.map_err(ToolError::from)?;
        deliver(transport.as_mut(), &event).await?;
        finish(transport.as_mut()).await;
        Ok::<_, ToolError>(())
    })?;

    report(command, event.label(), spec, &event, inv.json);
    Ok(())
}

/// Send one event, re-signalling any I/O failure as a transport error.
pub async fn deliver(transport: &mut dyn Transport, event: &EmulatorEvent) -> Result<(), ToolError> {
    transport.send_event(event).await.map_err(ToolError::from)
}

/// Close the session. The payload is already delivered, so a failed close is only logged.
pub async fn finish(transport: &mut dyn Transport) {
    if let Err(e) = transport.finish().await {
        log_debug!("closing {} transport failed: {e}", transport.kind());
    }
}

/* ---- Output ---- */

#[derive(Serialize)]
struct Delivered<'a, T: Serialize> {
    status: &'static str,
    command: &'a str,
    target: &'a str,
    transport: String,
    #[serde(flatten)]
    payload: &'a T,
}

/// Print the confirmation for a delivered payload: the event label and the target,
/// or a JSON object carrying the command and payload fields.
pub fn report<T: Serialize>(
    command: &str,
    label: &str,
    spec: &TargetSpec,
    payload: &T,
    json: bool,
) {
    if json {
        let out = Delivered {
            status: "ok",
            command,
            target: spec.original(),
            transport: spec.kind().to_string(),
            payload,
        };
        println!(
            "{}",
            serde_json::to_string(&out).unwrap_or_else(|_| r#"{"status":"ok"}"#.into())
        );
        return;
    }

    let style = StyleOptions::detect();
    println!("{}", confirmation_line(label, spec, &style));
}

fn confirmation_line(label: &str, spec: &TargetSpec, style: &StyleOptions) -> String {
    let mark = emoji("success", style);
    let head = color(Role::Success, format!("{label} delivered"), style);
    let tail = color(Role::Secondary, format!("({spec})"), style);
    if mark.is_empty() {
        format!("{head} {tail}")
    } else {
        format!("{mark} {head} {tail}")
    }
}

/* ---- Tests ---- */

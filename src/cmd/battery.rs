/*!
`battery.rs`

Implements `emu-battery [--pct N] [--charging]`.
*/

use anyhow::Result;
use clap::Args;

use crate::cmd::shared::{Invocation, dispatch};
use crate::emu::protocol::EmulatorEvent;
use crate::error::ToolError;

pub const COMMAND: &str = "emu-battery";

/// CLI arguments for `emu-battery`
#[derive(Args, Debug)]
pub struct BatteryArgs {
    /// Set the percentage battery remaining (0 to 100) on the emulator
    #[arg(long, default_value_t = 80)]
    pub pct: u8,

    /// Set the emulator to charging mode
    #[arg(long)]
    pub charging: bool,
}

pub fn execute_battery(args: BatteryArgs, inv: &Invocation) -> Result<()> {
    dispatch(COMMAND, inv, || build_event(&args))
}

pub fn build_event(args: &BatteryArgs) -> Result<EmulatorEvent, ToolError> {
    Ok(EmulatorEvent::Battery {
        percent: args.pct,
        charging: args.charging,
    })
}

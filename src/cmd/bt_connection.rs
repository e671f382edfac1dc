/*!
`bt_connection.rs`

Implements `emu-bt-connection [--connected {yes,no}]`.
*/

use anyhow::Result;
use clap::Args;

use crate::cmd::shared::{Invocation, dispatch};
use crate::emu::protocol::EmulatorEvent;
use crate::error::ToolError;

pub const COMMAND: &str = "emu-bt-connection";

#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum YesNo {
    Yes,
    No,
}

/// CLI arguments for `emu-bt-connection`
#[derive(Args, Debug)]
pub struct BtConnectionArgs {
    /// Set the emulator BT connection status
    #[arg(long, value_enum, default_value_t = YesNo::Yes)]
    pub connected: YesNo,
}

pub fn execute_bt_connection(args: BtConnectionArgs, inv: &Invocation) -> Result<()> {
    dispatch(COMMAND, inv, || build_event(&args))
}

pub fn build_event(args: &BtConnectionArgs) -> Result<EmulatorEvent, ToolError> {
    Ok(EmulatorEvent::BluetoothConnection {
        connected: args.connected == YesNo::Yes,
    })
}

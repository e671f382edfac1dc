/*!
`button.rs`

Implements `emu-button <button>`: a single press of back, up, select or down.
*/

use anyhow::Result;
use clap::Args;

use crate::cmd::shared::{Invocation, dispatch};
use crate::emu::protocol::{Button, EmulatorEvent};
use crate::error::ToolError;

pub const COMMAND: &str = "emu-button";

/// CLI arguments for `emu-button`
#[derive(Args, Debug)]
pub struct ButtonArgs {
    /// Send a button press to the emulator
    pub button: Button,
}

pub fn execute_button(args: ButtonArgs, inv: &Invocation) -> Result<()> {
    dispatch(COMMAND, inv, || build_event(&args))
}

pub fn build_event(args: &ButtonArgs) -> Result<EmulatorEvent, ToolError> {
    Ok(EmulatorEvent::Button {
        button: args.button,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        cmd: TestSub,
    }

    #[derive(clap::Subcommand, Debug)]
    enum TestSub {
        EmuButton(ButtonArgs),
    }

    #[test]
    fn each_button_name_maps_to_its_variant() {
        for (name, button, bit) in [
            ("back", Button::Back, 1),
            ("up", Button::Up, 2),
            ("select", Button::Select, 4),
            ("down", Button::Down, 8),
        ] {
            let TestSub::EmuButton(args) =
                TestCli::try_parse_from(["t", "emu-button", name]).unwrap().cmd;
            let event = build_event(&args).unwrap();
            assert_eq!(event, EmulatorEvent::Button { button });
            assert_eq!(event.encode(), vec![bit]);
        }
    }

    #[test]
    fn button_is_required_and_restricted() {
        assert!(TestCli::try_parse_from(["t", "emu-button"]).is_err());
        assert!(TestCli::try_parse_from(["t", "emu-button", "left"]).is_err());
    }
}

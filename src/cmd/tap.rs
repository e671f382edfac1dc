/*!
`tap.rs`

Implements `emu-tap [--direction {x+,x-,y+,y-,z+,z-}]`.

The direction is `<axis><sign>`: axis x, y or z, sign `+` (1) or `-` (-1).
*/

use anyhow::Result;
use clap::Args;

use crate::cmd::shared::{Invocation, dispatch};
use crate::emu::protocol::{Axis, EmulatorEvent};
use crate::error::ToolError;

pub const COMMAND: &str = "emu-tap";

/// CLI arguments for `emu-tap`
#[derive(Args, Debug)]
pub struct TapArgs {
    /// Set the direction of the accel tap in the emulator (x+, x-, y+, y-, z+, z-)
    #[arg(long, default_value = "x+", allow_hyphen_values = true)]
    pub direction: String,
}

pub fn execute_tap(args: TapArgs, inv: &Invocation) -> Result<()> {
    dispatch(COMMAND, inv, || build_event(&args))
}

pub fn build_event(args: &TapArgs) -> Result<EmulatorEvent, ToolError> {
    let (axis, direction) = parse_direction(&args.direction)?;
    Ok(EmulatorEvent::Tap { axis, direction })
}

pub fn parse_direction(raw: &str) -> Result<(Axis, i8), ToolError> {
    let mut chars = raw.trim().chars();
    let axis = match chars.next() {
        Some('x') => Axis::X,
        Some('y') => Axis::Y,
        Some('z') => Axis::Z,
        _ => return Err(ToolError::usage("Nice try, Pebble doesn't operate in 4-D space")),
    };
    let direction = match (chars.next(), chars.next()) {
        (Some('+'), None) => 1,
        (Some('-'), None) => -1,
        _ => {
            return Err(ToolError::usage(format!(
                "Invalid tap direction '{raw}' (expected one of x+, x-, y+, y-, z+, z-)"
            )));
        }
    };
    Ok((axis, direction))
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
        EmuTap(TapArgs),
    }

    fn build(argv: &[&str]) -> Result<EmulatorEvent, ToolError> {
        let TestSub::EmuTap(args) = TestCli::try_parse_from(argv).unwrap().cmd;
        build_event(&args)
    }

    #[test]
    fn default_is_x_plus() {
        assert_eq!(
            build(&["t", "emu-tap"]).unwrap(),
            EmulatorEvent::Tap {
                axis: Axis::X,
                direction: 1
            }
        );
    }

    #[test]
    fn y_minus() {
        assert_eq!(
            build(&["t", "emu-tap", "--direction", "y-"]).unwrap(),
            EmulatorEvent::Tap {
                axis: Axis::Y,
                direction: -1
            }
        );
    }

    #[test]
    fn all_six_directions() {
        for (raw, axis, dir) in [
            ("x+", Axis::X, 1),
            ("x-", Axis::X, -1),
            ("y+", Axis::Y, 1),
            ("y-", Axis::Y, -1),
            ("z+", Axis::Z, 1),
            ("z-", Axis::Z, -1),
        ] {
            assert_eq!(parse_direction(raw).unwrap(), (axis, dir), "{raw}");
        }
    }

    #[test]
    fn fourth_dimension_is_rejected() {
        let err = build(&["t", "emu-tap", "--direction", "w+"]).unwrap_err();
        assert!(err.is_usage());
        assert_eq!(err.to_string(), "Nice try, Pebble doesn't operate in 4-D space");
    }

    #[test]
    fn malformed_sign_is_rejected() {
        assert!(parse_direction("x").is_err());
        assert!(parse_direction("x*").is_err());
        assert!(parse_direction("x+-").is_err());
    }
}

/*!
`compass.rs`

Implements `emu-compass [--heading N] [--calib {invalid,calibrating,calibrated}]`.

Headings are given in degrees (0 to 359 expected) and sent as fixed-point
units where a full turn is 0x10000:

    heading_units = floor((degrees * 65536 + 180) / 360)

Without `--heading` the emulator receives the "unknown heading" sentinel.
*/

use anyhow::Result;
use clap::Args;

use crate::cmd::shared::{Invocation, dispatch};
use crate::emu::protocol::{Calibration, EmulatorEvent, HEADING_UNKNOWN};
use crate::error::ToolError;

pub const COMMAND: &str = "emu-compass";

const UNITS_PER_TURN: i64 = 0x10000;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum CalibArg {
    Invalid,
    Calibrating,
    Calibrated,
}

impl From<CalibArg> for Calibration {
    fn from(arg: CalibArg) -> Self {
        match arg {
            CalibArg::Invalid => Calibration::Uncalibrated,
            CalibArg::Calibrating => Calibration::Refining,
            CalibArg::Calibrated => Calibration::Complete,
        }
    }
}

/// CLI arguments for `emu-compass`
#[derive(Args, Debug)]
pub struct CompassArgs {
    /// Set the emulator compass heading (0 to 359)
    #[arg(long, allow_negative_numbers = true)]
    pub heading: Option<i32>,

    /// Set the emulator compass calibration status
    #[arg(long, value_enum, default_value_t = CalibArg::Calibrated)]
    pub calib: CalibArg,
}

pub fn execute_compass(args: CompassArgs, inv: &Invocation) -> Result<()> {
    dispatch(COMMAND, inv, || build_event(&args))
}

pub fn build_event(args: &CompassArgs) -> Result<EmulatorEvent, ToolError> {
    let heading = args.heading.map(heading_units).transpose()?;
    Ok(EmulatorEvent::Compass {
        heading,
        calibration: args.calib.into(),
    })
}

/// Convert degrees to heading units with floor division.
///
/// Values whose result does not fit the unsigned wire field (negative
/// headings) or that would collide with the unknown sentinel are rejected.
pub fn heading_units(degrees: i32) -> Result<u32, ToolError> {
    let units = (i64::from(degrees) * UNITS_PER_TURN + 180).div_euclid(360);
    u32::try_from(units)
        .ok()
        .filter(|u| *u != HEADING_UNKNOWN)
        .ok_or_else(|| ToolError::usage(format!("Compass heading {degrees} is out of range")))
}

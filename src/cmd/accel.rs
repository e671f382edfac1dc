/*!
`accel.rs`

Implements `emu-accel <motion> [--file PATH]`.

Presets map to fixed sample tables. `custom` reads samples from a text file,
one `x,y,z` triple of signed integers per line; blank lines are skipped.
At most 255 samples fit in one event.
*/

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use crate::cmd::shared::{Invocation, dispatch};
use crate::emu::protocol::{AccelSample, AccelSamples, EmulatorEvent};
use crate::error::ToolError;

pub const COMMAND: &str = "emu-accel";

/// Accelerometer motion to simulate.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Motion {
    TiltLeft,
    TiltRight,
    TiltForward,
    TiltBack,
    #[value(name = "gravity+x")]
    GravityPlusX,
    #[value(name = "gravity-x")]
    GravityMinusX,
    #[value(name = "gravity+y")]
    GravityPlusY,
    #[value(name = "gravity-y")]
    GravityMinusY,
    #[value(name = "gravity+z")]
    GravityPlusZ,
    #[value(name = "gravity-z")]
    GravityMinusZ,
    #[value(name = "none")]
    AtRest,
    /// Samples read from --file
    Custom,
}

const fn s(x: i16, y: i16, z: i16) -> AccelSample {
    AccelSample::new(x, y, z)
}

impl Motion {
    /// Fixed sample table for a preset; `None` for `custom`.
    pub fn preset_samples(self) -> Option<&'static [AccelSample]> {
        const TILT_LEFT: &[AccelSample] = &[s(-500, 0, -900), s(-900, 0, -500), s(-1000, 0, 0)];
        const TILT_RIGHT: &[AccelSample] = &[s(500, 0, -900), s(900, 0, -500), s(1000, 0, 0)];
        const TILT_FORWARD: &[AccelSample] = &[s(0, 500, -900), s(0, 900, -500), s(0, 1000, 0)];
        const TILT_BACK: &[AccelSample] = &[s(0, -500, -900), s(0, -900, -500), s(0, -1000, 0)];
        const GRAVITY_PLUS_X: &[AccelSample] = &[s(1000, 0, 0)];
        const GRAVITY_MINUS_X: &[AccelSample] = &[s(-1000, 0, 0)];
        const GRAVITY_PLUS_Y: &[AccelSample] = &[s(0, 1000, 0)];
        const GRAVITY_MINUS_Y: &[AccelSample] = &[s(0, -1000, 0)];
        const GRAVITY_PLUS_Z: &[AccelSample] = &[s(0, 0, 1000)];
        const GRAVITY_MINUS_Z: &[AccelSample] = &[s(0, 0, -1000)];
        const AT_REST: &[AccelSample] = &[s(0, 0, 0)];

        let samples = match self {
            Motion::TiltLeft => TILT_LEFT,
            Motion::TiltRight => TILT_RIGHT,
            Motion::TiltForward => TILT_FORWARD,
            Motion::TiltBack => TILT_BACK,
            Motion::GravityPlusX => GRAVITY_PLUS_X,
            Motion::GravityMinusX => GRAVITY_MINUS_X,
            Motion::GravityPlusY => GRAVITY_PLUS_Y,
            Motion::GravityMinusY => GRAVITY_MINUS_Y,
            Motion::GravityPlusZ => GRAVITY_PLUS_Z,
            Motion::GravityMinusZ => GRAVITY_MINUS_Z,
            Motion::AtRest => AT_REST,
            Motion::Custom => return None,
        };
        Some(samples)
    }
}

/// CLI arguments for `emu-accel`
#[derive(Args, Debug)]
pub struct AccelArgs {
    /// The type of accelerometer motion to send to the emulator. If using an
    /// accel file, specify 'custom' and then give the filename with '--file'
    pub motion: Motion,

    /// File of custom accel data: one comma-separated x, y, z reading per
    /// line (e.g. '-24, -88, -1032')
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

pub fn execute_accel(args: AccelArgs, inv: &Invocation) -> Result<()> {
    dispatch(COMMAND, inv, || build_event(&args))
}

pub fn build_event(args: &AccelArgs) -> Result<EmulatorEvent, ToolError> {
    let samples = match (args.motion.preset_samples(), &args.file) {
        (Some(preset), _) => preset.to_vec(),
        (None, Some(path)) => read_samples(path)?,
        (None, None) => {
            return Err(ToolError::usage(
                "No filename specified: 'custom' motion requires --file PATH",
            ));
        }
    };
    let samples = AccelSamples::try_from(samples)?;
    Ok(EmulatorEvent::Accel { samples })
}

fn read_samples(path: &Path) -> Result<Vec<AccelSample>, ToolError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ToolError::usage(format!("Cannot read accel file '{}': {e}", path.display()))
    })?;
    parse_samples(&text, &path.display().to_string())
}

/// Parse custom accel data. `source` names the file in error messages.
pub fn parse_samples(text: &str, source: &str) -> Result<Vec<AccelSample>, ToolError> {
    let mut samples = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let sample = parse_line(line).ok_or_else(|| {
            ToolError::usage(format!(
                "{source}:{}: expected three comma-separated integers (x,y,z), got '{line}'",
                idx + 1
            ))
        })?;
        samples.push(sample);
    }
    Ok(samples)
}

fn parse_line(line: &str) -> Option<AccelSample> {
    let mut parts = line.split(',').map(|p| p.trim().parse::<i16>());
    let x = parts.next()?.ok()?;
    let y = parts.next()?.ok()?;
    let z = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(AccelSample::new(x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Parser, ValueEnum};
    use std::io::Write;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        cmd: TestSub,
    }

    #[derive(clap::Subcommand, Debug)]
    enum TestSub {
        EmuAccel(AccelArgs),
    }

    fn parse(argv: &[&str]) -> AccelArgs {
        let TestSub::EmuAccel(args) = TestCli::try_parse_from(argv).unwrap().cmd;
        args
    }

    fn samples_of(event: EmulatorEvent) -> Vec<AccelSample> {
        match event {
            EmulatorEvent::Accel { samples } => samples.as_slice().to_vec(),
            other => panic!("expected accel event, got {other:?}"),
        }
    }

    #[test]
    fn clap_accepts_gravity_names() {
        let args = parse(&["t", "emu-accel", "gravity-z"]);
        assert_eq!(args.motion, Motion::GravityMinusZ);
        assert!(TestCli::try_parse_from(["t", "emu-accel", "sideways"]).is_err());
    }

    #[test]
    fn every_preset_matches_its_table() {
        let expected: &[(&str, &[(i16, i16, i16)])] = &[
            ("tilt-left", &[(-500, 0, -900), (-900, 0, -500), (-1000, 0, 0)]),
            ("tilt-right", &[(500, 0, -900), (900, 0, -500), (1000, 0, 0)]),
            ("tilt-forward", &[(0, 500, -900), (0, 900, -500), (0, 1000, 0)]),
            ("tilt-back", &[(0, -500, -900), (0, -900, -500), (0, -1000, 0)]),
            ("gravity+x", &[(1000, 0, 0)]),
            ("gravity-x", &[(-1000, 0, 0)]),
            ("gravity+y", &[(0, 1000, 0)]),
            ("gravity-y", &[(0, -1000, 0)]),
            ("gravity+z", &[(0, 0, 1000)]),
            ("gravity-z", &[(0, 0, -1000)]),
            ("none", &[(0, 0, 0)]),
        ];
        assert_eq!(expected.len(), Motion::value_variants().len() - 1);

        for &(name, table) in expected {
            let args = parse(&["t", "emu-accel", name]);
            let got = samples_of(build_event(&args).unwrap());
            let want: Vec<AccelSample> = table
                .iter()
                .map(|&(x, y, z)| AccelSample::new(x, y, z))
                .collect();
            assert_eq!(got, want, "preset {name}");
        }
    }

    #[test]
    fn custom_without_file_is_usage_error() {
        let args = parse(&["t", "emu-accel", "custom"]);
        let err = build_event(&args).unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("No filename specified"));
    }

    #[test]
    fn preset_ignores_file() {
        let args = parse(&["t", "emu-accel", "none", "--file", "/does/not/exist"]);
        assert_eq!(samples_of(build_event(&args).unwrap()), vec![AccelSample::new(0, 0, 0)]);
    }

    #[test]
    fn parse_samples_skips_blank_lines_and_trims() {
        let text = "-24, -88, -1032\n\n  1,2,3  \n";
        let samples = parse_samples(text, "f").unwrap();
        assert_eq!(
            samples,
            vec![AccelSample::new(-24, -88, -1032), AccelSample::new(1, 2, 3)]
        );
    }

    #[test]
    fn parse_samples_reports_line_number() {
        let err = parse_samples("1,2,3\n4,5\n", "accel.txt").unwrap_err();
        assert!(err.to_string().starts_with("accel.txt:2:"));
        assert!(parse_samples("1,2,3,4", "f").is_err());
        assert!(parse_samples("1,2,40000", "f").is_err());
        assert!(parse_samples("a,b,c", "f").is_err());
    }

    fn write_samples(count: usize) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        for i in 0..count {
            writeln!(f, "{},{},{}", i, -(i as i32), 1000).unwrap();
        }
        f.flush().unwrap();
        f
    }

    #[test]
    fn custom_file_with_255_samples_is_accepted() {
        let f = write_samples(255);
        let path = f.path().to_str().unwrap();
        let args = parse(&["t", "emu-accel", "custom", "--file", path]);
        let samples = samples_of(build_event(&args).unwrap());
        assert_eq!(samples.len(), 255);
        assert_eq!(samples[254], AccelSample::new(254, -254, 1000));
    }

    #[test]
    fn custom_file_with_256_samples_is_rejected() {
        let f = write_samples(256);
        let path = f.path().to_str().unwrap();
        let args = parse(&["t", "emu-accel", "custom", "--file", path]);
        let err = build_event(&args).unwrap_err();
        assert!(matches!(err, ToolError::TooManySamples { count: 256, max: 255 }));
    }

    #[test]
    fn unreadable_custom_file_is_usage_error() {
        let args = parse(&["t", "emu-accel", "custom", "--file", "/no/such/accel.txt"]);
        let err = build_event(&args).unwrap_err();
        assert!(err.to_string().contains("/no/such/accel.txt"));
    }
}

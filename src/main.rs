use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod emu;
mod error;
mod utils;

use cmd::{
    AccelArgs, AppConfigArgs, BatteryArgs, BtConnectionArgs, ButtonArgs, CompassArgs, Invocation,
    TapArgs,
};

/// emuctl - inject simulated sensor and input events into a running watch emulator
///
/// Commands:
///   emuctl emu-accel <motion> [--file PATH]
///   emuctl emu-app-config [--file PATH] [--timeout SECS] [--no-open]
///   emuctl emu-battery [--pct N] [--charging]
///   emuctl emu-button <back|up|select|down>
///   emuctl emu-bt-connection [--connected yes|no]
///   emuctl emu-compass [--heading N] [--calib invalid|calibrating|calibrated]
///   emuctl emu-tap [--direction x+|x-|y+|y-|z+|z-]
///
/// Global flags / env:
///   -t / --target   Emulator target (or EMU_TARGET env)
///   --json          Machine-readable confirmation on stdout
///   -v / -vv        Increase verbosity
///   -q / --quiet    Errors only
///
/// Target kinds:
///   Direct emulator:  "localhost:12344", "qemu://localhost:12344", "tcp://10.0.0.5:12344"
///   Phone simulator:  "ws://localhost:9000"  (relays to the emulator; required by emu-app-config)
///
/// Examples:
///   emuctl -t localhost:12344 emu-battery --pct 15 --charging
///   emuctl -t ws://localhost:9000 emu-accel tilt-left
///   emuctl -t ws://localhost:9000 emu-app-config --file ./settings.html
#[derive(Parser, Debug)]
#[command(
    name = "emuctl",
    version,
    author,
    about = "emuctl - inject simulated sensor and input events into a running watch emulator",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emulator target (HOST:PORT, qemu://HOST:PORT or ws://HOST:PORT)
    #[arg(short = 't', long = "target", global = true, value_name = "TARGET")]
    target: Option<String>,

    /// Print the delivery confirmation as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send accelerometer motion
    EmuAccel(AccelArgs),

    /// Run an app's configuration page against the phone simulator
    EmuAppConfig(AppConfigArgs),

    /// Set battery level and charging state
    EmuBattery(BatteryArgs),

    /// Press a button
    EmuButton(ButtonArgs),

    /// Set the Bluetooth connection state
    EmuBtConnection(BtConnectionArgs),

    /// Set compass heading and calibration
    EmuCompass(CompassArgs),

    /// Send an accelerometer tap
    EmuTap(TapArgs),
}

/// Effective target string: CLI flag, else non-blank `EMU_TARGET`.
fn resolve_target(flag: Option<String>) -> Option<String> {
    flag.or_else(|| {
        std::env::var("EMU_TARGET")
            .ok()
            .filter(|s| !s.trim().is_empty())
    })
}

/// Process exit status for a failed command. Usage errors share the code clap
/// uses for bad arguments.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<error::ToolError>() {
        Some(tool) if tool.is_usage() => 2,
        _ => 1,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    let target = match resolve_target(cli.target) {
        Some(t) => match emu::parse_target(&t) {
            Ok(spec) => Some(spec),
            Err(e) => {
                eprintln!("Invalid target '{}': {e}", t);
                std::process::exit(2);
            }
        },
        None => None,
    };
    let inv = Invocation {
        target,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::EmuAccel(args) => cmd::execute_accel(args, &inv),
        Commands::EmuAppConfig(args) => cmd::execute_app_config(args, &inv),
        Commands::EmuBattery(args) => cmd::execute_battery(args, &inv),
        Commands::EmuButton(args) => cmd::execute_button(args, &inv),
        Commands::EmuBtConnection(args) => cmd::execute_bt_connection(args, &inv),
        Commands::EmuCompass(args) => cmd::execute_compass(args, &inv),
        Commands::EmuTap(args) => cmd::execute_tap(args, &inv),
    };

    if let Err(err) = &result
        && exit_code(err) != 1
    {
        eprintln!("Error: {err}");
        std::process::exit(exit_code(err));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcommand_names_are_kebab_case() {
        for argv in [
            vec!["emuctl", "emu-accel", "none"],
            vec!["emuctl", "emu-app-config"],
            vec!["emuctl", "emu-battery"],
            vec!["emuctl", "emu-button", "back"],
            vec!["emuctl", "emu-bt-connection"],
            vec!["emuctl", "emu-compass"],
            vec!["emuctl", "emu-tap"],
        ] {
            assert!(Cli::try_parse_from(&argv).is_ok(), "{argv:?}");
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "emuctl",
            "emu-battery",
            "--pct",
            "20",
            "-t",
            "localhost:12344",
            "--json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.target.as_deref(), Some("localhost:12344"));
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::EmuBattery(BatteryArgs { pct: 20, .. })));
    }

    #[test]
    fn usage_errors_exit_with_two() {
        let usage = anyhow::Error::from(error::ToolError::usage("bad arg"));
        assert_eq!(exit_code(&usage), 2);

        let too_many = anyhow::Error::from(error::ToolError::TooManySamples {
            count: 256,
            max: 255,
        });
        assert_eq!(exit_code(&too_many), 2);
    }

    #[test]
    fn other_failures_exit_with_one() {
        let transport = anyhow::Error::from(error::ToolError::Transport("connection refused".into()));
        assert_eq!(exit_code(&transport), 1);

        let plain = anyhow::anyhow!("Failed to create Tokio runtime");
        assert_eq!(exit_code(&plain), 1);
    }

    #[test]
    fn explicit_target_wins() {
        assert_eq!(
            resolve_target(Some("ws://a:1".into())).as_deref(),
            Some("ws://a:1")
        );
    }
}

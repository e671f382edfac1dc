/*!
Emulator control subcommands.

Each subcommand lives in its own file and exposes one `execute_*` function
returning `anyhow::Result<()>`, plus a `build_event` (or equivalent) that maps
its parsed arguments to a payload without touching the network.

Layout:
  src/cmd/
    mod.rs            (this file)
    shared.rs         (Invocation, announce, dispatch, deliver, report)
    format.rs         (color / emoji helpers for human output)
    accel.rs          emu-accel
    app_config.rs     emu-app-config
    battery.rs        emu-battery
    button.rs         emu-button
    bt_connection.rs  emu-bt-connection
    compass.rs        emu-compass
    tap.rs            emu-tap

Conventions:
  - Argument structs derive `clap::Args`; fixed choices use `clap::ValueEnum`.
  - Every command prints `Running {command}...` first.
  - Arguments are validated before a connection is opened.
*/

pub mod accel;
pub mod app_config;
pub mod battery;
pub mod bt_connection;
pub mod button;
pub mod compass;
pub mod format;
pub mod shared;
pub mod tap;

pub use accel::{AccelArgs, execute_accel};
pub use app_config::{AppConfigArgs, execute_app_config};
pub use battery::{BatteryArgs, execute_battery};
pub use bt_connection::{BtConnectionArgs, execute_bt_connection};
pub use button::{ButtonArgs, execute_button};
pub use compass::{CompassArgs, execute_compass};
pub use shared::Invocation;
pub use tap::{TapArgs, execute_tap};

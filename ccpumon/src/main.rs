//! `ccpumon <host> <username>`: redraw a device's CPU history every second.
//!
//! The password is read from the terminal with echo off. Ctrl-C stops the
//! loop, closes the session and exits 0.
//!
//! Set `RUST_LOG=debug` to see the session's progress on stderr.

use std::process::ExitCode;

use clap::Parser;
use log::debug;

use ccpumon::credential::{MAX_PASSWORD_LEN, read_password};
use ccpumon::{CancellationToken, Error, MonitorBuilder, spawn_interrupt_listener};

#[derive(Parser)]
#[command(name = "ccpumon")]
#[command(version)]
#[command(about = "Monitor a network device's CPU history over SSH")]
struct Args {
    /// Device hostname or address
    host: String,

    /// Login username
    username: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr and stay quiet unless RUST_LOG asks
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    // Installed before the password prompt so Ctrl-C there still restores echo
    let cancel = CancellationToken::new();
    let listener = spawn_interrupt_listener(cancel.clone());

    let result = run(args, &cancel).await;

    // Let the listener task finish
    cancel.cancel();
    if let Err(e) = listener.await {
        debug!("interrupt listener ended abnormally: {}", e);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ccpumon: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args, cancel: &CancellationToken) -> Result<(), Error> {
    let builder = MonitorBuilder::new(args.host).username(args.username);
    builder.check()?;

    let Some(password) = read_password("Password: ", MAX_PASSWORD_LEN, cancel).await? else {
        debug!("interrupted at password prompt");
        return Ok(());
    };

    let monitor = builder.password(password).build()?;
    monitor.run(cancel.clone()).await
}

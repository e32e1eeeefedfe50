use clap::{Parser, Subcommand};

use crate::settings::schema_field;

#[derive(Parser, Debug)]
#[command(name = "psucontrol-raspberrymatic")]
#[command(version)]
#[command(about = "Switch and sense a PSU through a Raspberrymatic/Homematic CCU")]
pub struct Args {
    /// TOML file holding ip, onCommand, offCommand and senseCommand
    #[arg(long, short, default_value = "psucontrol_raspberrymatic.toml")]
    pub settings: String,

    /// Log filter directive (overrides RUST_LOG), e.g. "debug"
    #[arg(long)]
    pub log_level: Option<String>,

    /// Give up connecting to the gateway after this many seconds
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Give up waiting for the gateway's reply after this many seconds
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Ignore HTTP_PROXY/HTTPS_PROXY when talking to the gateway
    #[arg(long)]
    pub no_proxy: bool,

    /// Treat any non-empty datapoint value as "on" (first-release behaviour)
    #[arg(long)]
    pub legacy_state: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Switch the PSU on
    On,
    /// Switch the PSU off
    Off,
    /// Read the PSU state from the sense command
    State,
    /// Show the effective configuration
    Config,
    /// Save one setting (ip, onCommand, offCommand, senseCommand)
    Set {
        #[arg(value_parser = parse_setting_key)]
        key: String,
        value: String,
    },
    /// Print the software-update record as JSON
    UpdateInfo,
}

fn parse_setting_key(key: &str) -> Result<String, String> {
    schema_field(key)
        .map(|f| f.key.to_string())
        .ok_or_else(|| format!("unknown setting '{key}' (expected ip, onCommand, offCommand or senseCommand)"))
}

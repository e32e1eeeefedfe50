use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use colored::*;

use psucontrol_raspberrymatic::cli::{Args, Command};
use psucontrol_raspberrymatic::logging::{init_tracing, resolve_filter};
use psucontrol_raspberrymatic::metadata::update_information;
use psucontrol_raspberrymatic::{
    BridgeError, GatewayConfig, PsuBridge, SettingsPlugin, StateCoercion, TomlSettings, UNSET,
};

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    let env_filter = std::env::var("RUST_LOG").ok();
    init_tracing(&resolve_filter(args.log_level.as_deref(), env_filter.as_deref()));

    if args.command == Command::UpdateInfo {
        println!("{}", serde_json::to_string_pretty(&update_information())?);
        return Ok(ExitCode::SUCCESS);
    }

    let store = TomlSettings::load(&args.settings)?;
    let mut builder = PsuBridge::builder().settings(store);
    if let Some(secs) = args.connect_timeout {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = args.request_timeout {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    if args.no_proxy {
        builder = builder.no_proxy();
    }
    if args.legacy_state {
        builder = builder.coercion(StateCoercion::NonEmpty);
    }
    let bridge = builder.build();
    bridge.on_settings_initialized();

    let code = match args.command {
        Command::On => report_switch("on", bridge.try_turn_on()),
        Command::Off => report_switch("off", bridge.try_turn_off()),
        Command::State => match bridge.try_get_state() {
            Ok(true) => {
                println!("{}", "on".bright_green().bold());
                ExitCode::SUCCESS
            }
            Ok(false) => {
                println!("{}", "off".bright_red().bold());
                ExitCode::SUCCESS
            }
            Err(e) => report_error(&e),
        },
        Command::Config => {
            print_config(&bridge.config());
            ExitCode::SUCCESS
        }
        Command::Set { key, value } => {
            let mut data = serde_json::Map::new();
            data.insert(key.clone(), serde_json::Value::String(value.clone()));
            bridge.on_settings_save(&serde_json::Value::Object(data));
            println!("{} {} = {}", "saved".bright_green(), key, value);
            print_config(&bridge.config());
            ExitCode::SUCCESS
        }
        Command::UpdateInfo => ExitCode::SUCCESS,
    };

    Ok(code)
}

fn report_switch(action: &str, result: Result<(), BridgeError>) -> ExitCode {
    match result {
        Ok(()) => {
            println!("{} {}", "switched".bright_green(), action.bold());
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}

fn report_error(e: &BridgeError) -> ExitCode {
    if e.is_disabled() {
        eprintln!("{} {}", "[disabled]".bright_yellow(), e);
        ExitCode::from(2)
    } else {
        eprintln!("{} {}", "[error]".bright_red(), e);
        ExitCode::FAILURE
    }
}

fn print_config(config: &GatewayConfig) {
    let show = |v: &Option<String>| v.clone().unwrap_or_else(|| UNSET.to_string());
    let gate = |enabled: bool| {
        if enabled {
            "enabled".bright_green()
        } else {
            "disabled".bright_yellow()
        }
    };

    println!("  ip           {}", show(&config.gateway_url));
    println!("  onCommand    {}", show(&config.on_path));
    println!("  offCommand   {}", show(&config.off_path));
    println!("  senseCommand {}", show(&config.sense_path));
    println!("  switching    {}", gate(config.switching_enabled()));
    println!("  sensing      {}", gate(config.sensing_enabled()));
}

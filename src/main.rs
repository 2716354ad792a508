/* 3rd party libraries */
use clap::{Arg, Command};
use log::info;
use std::io;
use std::path::Path;

/* Custom libraries */
use lift_control::config::{self, Config};
use lift_control::console;
use lift_control::unwrap_or_exit;
use lift_control::ElevatorController;

/* Main */
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("lift_control")
        .about("Single cabin elevator controller, driven from the terminal")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .takes_value(true)
                .help("Path to the TOML configuration file"),
        )
        .arg(
            Arg::new("first")
                .long("first")
                .takes_value(true)
                .allow_hyphen_values(true)
                .help("Override the first floor"),
        )
        .arg(
            Arg::new("last")
                .long("last")
                .takes_value(true)
                .allow_hyphen_values(true)
                .help("Override the last floor"),
        )
        .get_matches();

    // Load the configuration
    let mut config = match matches.value_of("config") {
        Some(path) => unwrap_or_exit!(config::load_config(Path::new(path))),
        None if Path::new("config.toml").exists() => {
            unwrap_or_exit!(config::load_config(Path::new("config.toml")))
        }
        None => Config::default(),
    };

    if let Some(first) = matches.value_of("first") {
        config.elevator.first_floor = unwrap_or_exit!(first.parse::<i32>());
    }
    if let Some(last) = matches.value_of("last") {
        config.elevator.last_floor = unwrap_or_exit!(last.parse::<i32>());
    }
    unwrap_or_exit!(config::validate(&config));

    // Start the controller
    let controller = unwrap_or_exit!(ElevatorController::new(&config.elevator));
    info!(
        "Controller ready: floors {}..={}, doors open {:?}, reversal {:?}",
        controller.first_floor(),
        controller.last_floor(),
        controller.pause_duration(),
        controller.reversal_delay()
    );

    // Console view
    controller.subscribe(|notification| println!("{}", console::describe(notification)));

    println!("{}", console::HELP);
    unwrap_or_exit!(console::run(&controller, io::stdin().lock(), io::stdout()));
}

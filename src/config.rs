/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{ConfigError, ControllerError, FloorRange};

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub elevator: ElevatorConfig,
}

/**
 * Cabin configuration.
 *
 * # Fields
 * - `first_floor`:     Lowest floor served, may be negative.
 * - `last_floor`:      Highest floor served, strictly above `first_floor`.
 * - `door_open_time`:  Doors-open pause at each stop, in milliseconds.
 * - `reversal_time`:   Extra pause when the cabin turns around at a stop, in milliseconds.
 */
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ElevatorConfig {
    pub first_floor: i32,
    pub last_floor: i32,
    pub door_open_time: u64,
    pub reversal_time: u64,
}

impl ElevatorConfig {
    pub fn floor_range(&self) -> Result<FloorRange, ControllerError> {
        FloorRange::new(self.first_floor, self.last_floor)
    }

    pub fn pause_duration(&self) -> Duration {
        Duration::from_millis(self.door_open_time)
    }

    pub fn reversal_delay(&self) -> Duration {
        Duration::from_millis(self.reversal_time)
    }
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        ElevatorConfig {
            first_floor: 0,
            last_floor: 10,
            door_open_time: 6_000,
            reversal_time: 10_000,
        }
    }
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config_str = fs::read_to_string(path)?;
    parse_config(&config_str)
}

pub fn parse_config(config_str: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(config_str)?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let elevator = &config.elevator;
    if elevator.first_floor >= elevator.last_floor {
        return Err(ConfigError::InvalidFloorRange {
            first: elevator.first_floor,
            last: elevator.last_floor,
        });
    }
    Ok(())
}

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        // Arrange
        let config_str = r#"
            [elevator]
            first_floor = -2
            last_floor = 5
            door_open_time = 1500
            reversal_time = 2500
        "#;

        // Act
        let config = parse_config(config_str).unwrap();

        // Assert
        assert_eq!(config.elevator.first_floor, -2);
        assert_eq!(config.elevator.last_floor, 5);
        assert_eq!(config.elevator.pause_duration(), Duration::from_millis(1500));
        assert_eq!(config.elevator.reversal_delay(), Duration::from_millis(2500));
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let config = parse_config("[elevator]\nlast_floor = 4\n").unwrap();

        assert_eq!(config.elevator.first_floor, 0);
        assert_eq!(config.elevator.last_floor, 4);
        assert_eq!(config.elevator.door_open_time, 6_000);
        assert_eq!(config.elevator.reversal_time, 10_000);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn test_inverted_floor_range_is_rejected() {
        let result = parse_config("[elevator]\nfirst_floor = 3\nlast_floor = 3\n");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidFloorRange { first: 3, last: 3 })
        ));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let result = parse_config("[elevator\nfirst_floor = ");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = load_config(Path::new("does/not/exist.toml"));

        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}

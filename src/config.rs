/*
 *  config.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  YAML configuration layered under command line overrides
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::datetime::ClockStyle;
use crate::display::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::fuzzy::HourStyle;
use crate::geoloc::Coordinates;
use crate::watchface::FaceSettings;

const DEFAULT_REFRESH_MINS: u32 = 30;
const MIN_SCREEN_HEIGHT: u32 = 42;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>, // e.g., "info" | "debug"
    pub watchface: Option<WatchfaceConfig>,
    pub weather: Option<WeatherConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WatchfaceConfig {
    pub hour_style: Option<HourStyle>,
    pub clock: Option<ClockStyle>,
    pub refresh_mins: Option<u32>,
}

/// OpenWeatherMap access. No key, no weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "tidey", version, about = "Fuzzy words watchface")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// shorthand for --log-level debug
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long, value_enum)]
    pub hour_style: Option<HourStyle>,
    /// show the date line clock as 12 hour
    #[arg(long = "clock-12h", action = ArgAction::SetTrue)]
    pub clock_12h: bool,
    /// OpenWeatherMap API key
    #[arg(long)]
    pub weather_key: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,
    /// minutes between weather requests
    #[arg(long)]
    pub refresh_mins: Option<u32>,
    /// render one frame and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub once: bool,
    /// print each frame to stdout as text art
    #[arg(long, action = ArgAction::SetTrue)]
    pub ascii: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

impl Config {
    pub fn face_settings(&self) -> FaceSettings {
        let face = self.watchface.clone().unwrap_or_default();
        let display = self.display.clone().unwrap_or_default();
        FaceSettings {
            hour_style: face.hour_style.unwrap_or_default(),
            clock: face.clock.unwrap_or_default(),
            refresh_mins: face.refresh_mins.unwrap_or(DEFAULT_REFRESH_MINS),
            width: display.width.unwrap_or(SCREEN_WIDTH),
            height: display.height.unwrap_or(SCREEN_HEIGHT),
        }
    }

    /// Non-empty API key, if weather is enabled.
    pub fn api_key(&self) -> Option<&str> {
        self.weather
            .as_ref()
            .and_then(|w| w.api_key.as_deref())
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Fixed position; None means look it up from the IP address.
    pub fn position(&self) -> Option<Coordinates> {
        let w = self.weather.as_ref()?;
        Some(Coordinates { lat: w.lat?, lon: w.lon? })
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<(Config, Cli), ConfigError> {
    let cli = Cli::parse();
    let cfg = load_from(&cli)?;
    Ok((cfg, cli))
}

/// Defaults, then the YAML file, then the command line.
pub fn load_from(cli: &Cli) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();

    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    apply_cli_overrides(&mut cfg, cli);
    validate(&cfg)?;
    Ok(cfg)
}

/// Pretty YAML of the effective config.
pub fn dump_config(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/tidey/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/tidey.yaml");
        if p.exists() { return Some(p) }
    }
    for candidate in &["tidey.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

pub fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
pub fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some() { dst.log_level = src.log_level; }
    match (&mut dst.watchface, src.watchface) {
        (None, Some(c)) => dst.watchface = Some(c),
        (Some(d), Some(s)) => merge_watchface(d, s),
        _ => {}
    }
    match (&mut dst.weather, src.weather) {
        (None, Some(c)) => dst.weather = Some(c),
        (Some(d), Some(s)) => merge_weather(d, s),
        _ => {}
    }
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
}

fn merge_watchface(dst: &mut WatchfaceConfig, src: WatchfaceConfig) {
    if src.hour_style.is_some()   { dst.hour_style = src.hour_style; }
    if src.clock.is_some()        { dst.clock = src.clock; }
    if src.refresh_mins.is_some() { dst.refresh_mins = src.refresh_mins; }
}

fn merge_weather(dst: &mut WeatherConfig, src: WeatherConfig) {
    if src.api_key.is_some() { dst.api_key = src.api_key; }
    if src.lat.is_some()     { dst.lat = src.lat; }
    if src.lon.is_some()     { dst.lon = src.lon; }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.width.is_some()  { dst.width = src.width; }
    if src.height.is_some() { dst.height = src.height; }
}

pub fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }
    if cli.debug               { cfg.log_level = Some("debug".into()); }

    if cli.hour_style.is_some() || cli.clock_12h || cli.refresh_mins.is_some() {
        let face = cfg.watchface.get_or_insert_with(WatchfaceConfig::default);
        if cli.hour_style.is_some()   { face.hour_style = cli.hour_style; }
        if cli.clock_12h              { face.clock = Some(ClockStyle::Twelve); }
        if cli.refresh_mins.is_some() { face.refresh_mins = cli.refresh_mins; }
    }

    if cli.weather_key.is_some() || cli.lat.is_some() || cli.lon.is_some() {
        let weather = cfg.weather.get_or_insert_with(WeatherConfig::default);
        if cli.weather_key.is_some() { weather.api_key = cli.weather_key.clone(); }
        if cli.lat.is_some()         { weather.lat = cli.lat; }
        if cli.lon.is_some()         { weather.lon = cli.lon; }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(face) = cfg.watchface.as_ref() {
        if face.refresh_mins == Some(0) {
            return Err(ConfigError::Validation("watchface refresh_mins must be >= 1".into()));
        }
    }
    if let Some(weather) = cfg.weather.as_ref() {
        match (weather.lat, weather.lon) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(ConfigError::Validation(format!("weather lat {lat} out of range")));
                }
                if !(-180.0..=180.0).contains(&lon) {
                    return Err(ConfigError::Validation(format!("weather lon {lon} out of range")));
                }
            }
            (None, None) => {}
            _ => return Err(ConfigError::Validation("weather lat and lon must be given together".into())),
        }
    }
    if let Some(display) = cfg.display.as_ref() {
        if display.width == Some(0) {
            return Err(ConfigError::Validation("display width must be > 0".into()));
        }
        if let Some(h) = display.height {
            if h < MIN_SCREEN_HEIGHT {
                return Err(ConfigError::Validation(format!(
                    "display height must be >= {MIN_SCREEN_HEIGHT}"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
log_level: warn
watchface:
  hour_style: named
  clock: 12h
weather:
  api_key: abc123
  lat: 53.8
  lon: -1.55
display:
  height: 200
"#;

    #[test]
    fn yaml_parses() {
        let cfg = parse_yaml(SAMPLE).unwrap();
        let face = cfg.face_settings();
        assert_eq!(face.hour_style, HourStyle::Named);
        assert_eq!(face.clock, ClockStyle::Twelve);
        assert_eq!(face.refresh_mins, 30);
        assert_eq!((face.width, face.height), (144, 200));
        assert_eq!(cfg.api_key(), Some("abc123"));
        assert_eq!(cfg.position(), Some(Coordinates { lat: 53.8, lon: -1.55 }));
        assert_eq!(cfg.log_level(), "warn");
    }

    #[test]
    fn defaults_without_file() {
        let cfg = Config::default();
        assert_eq!(cfg.face_settings(), FaceSettings::default());
        assert_eq!(cfg.api_key(), None);
        assert_eq!(cfg.position(), None);
        assert_eq!(cfg.log_level(), "info");
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let mut cfg = parse_yaml(SAMPLE).unwrap();
        let over = parse_yaml("watchface:\n  refresh_mins: 5\n").unwrap();
        merge(&mut cfg, over);
        let face = cfg.watchface.as_ref().unwrap();
        assert_eq!(face.refresh_mins, Some(5));
        assert_eq!(face.hour_style, Some(HourStyle::Named));
    }

    #[test]
    fn cli_wins_over_yaml() {
        let mut cfg = parse_yaml(SAMPLE).unwrap();
        let cli = Cli::parse_from([
            "tidey", "--hour-style", "oclock", "--weather-key", "k2", "--debug", "--refresh-mins", "1",
        ]);
        apply_cli_overrides(&mut cfg, &cli);
        validate(&cfg).unwrap();
        let face = cfg.face_settings();
        assert_eq!(face.hour_style, HourStyle::OClock);
        assert_eq!(face.refresh_mins, 1);
        assert_eq!(face.clock, ClockStyle::Twelve);
        assert_eq!(cfg.api_key(), Some("k2"));
        assert_eq!(cfg.log_level(), "debug");
    }

    #[test]
    fn negative_coordinates_on_command_line() {
        let cli = Cli::parse_from(["tidey", "--lat", "-33.9", "--lon", "-18.4"]);
        let mut cfg = Config::default();
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg.position(), Some(Coordinates { lat: -33.9, lon: -18.4 }));
    }

    #[test]
    fn blank_api_key_disables_weather() {
        let cfg = parse_yaml("weather:\n  api_key: '  '\n").unwrap();
        assert_eq!(cfg.api_key(), None);
    }

    #[test]
    fn validation_rejects_bad_values() {
        for bad in [
            "watchface:\n  refresh_mins: 0\n",
            "weather:\n  lat: 10.0\n",
            "weather:\n  lat: 91.0\n  lon: 0.0\n",
            "weather:\n  lat: 0.0\n  lon: 181.0\n",
            "display:\n  height: 41\n",
            "display:\n  width: 0\n",
        ] {
            let cfg = parse_yaml(bad).unwrap();
            assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))), "{bad}");
        }
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/tidey.yaml")),
            ..Default::default()
        };
        assert!(matches!(load_from(&cli), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn dump_round_trips() {
        let cfg = parse_yaml(SAMPLE).unwrap();
        let text = dump_config(&cfg).unwrap();
        assert_eq!(parse_yaml(&text).unwrap(), cfg);
    }

    #[test]
    fn unknown_hour_style_is_a_yaml_error() {
        assert!(matches!(
            parse_yaml("watchface:\n  hour_style: loud\n"),
            Err(ConfigError::Yaml(_))
        ));
    }
}

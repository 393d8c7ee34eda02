/*
 *  weather.rs
 *
 *  Tidey - fuzzy words watchface
 *	(c) 2020-26 Stuart Hunter
 *
 *	Companion side weather - OpenWeatherMap 5 day / 3 hour forecast
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
use serde::Deserialize;
use serde_json::Error as JsonError;
use reqwest::{Client, header};
use std::fmt::{self, Display};
use std::future::Future;
use std::io::Read;
use std::time::Duration;
use log::{debug, info, warn};
use flate2::read::GzDecoder;

use crate::geoloc::{fetch_location, Coordinates};
use crate::message::{Dictionary, MessageKey, Tuple};

const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";
const FORECAST_SLOTS: &str = "10";
const MAX_ATTEMPTS: u8 = 3;

/// Sent when the phone cannot work out where it is.
pub const LOCATION_UNAVAILABLE: &str = "Loc Unavailable";
pub const TEMPERATURE_UNAVAILABLE: &str = "N/A";

// Custom error type for weather API operations.
#[derive(Debug)]
pub enum WeatherApiError {
    HttpRequestError(reqwest::Error),
    DeserializationError(JsonError),
    ApiKeyError(String),
    GeolocationError(String),
    MissingData(String),
}

impl Display for WeatherApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherApiError::HttpRequestError(e) => write!(f, "HTTP request error: {}", e),
            WeatherApiError::DeserializationError(e) => write!(f, "JSON deserialization error: {}", e),
            WeatherApiError::ApiKeyError(msg) => write!(f, "OpenWeatherMap API key required: {}", msg),
            WeatherApiError::GeolocationError(msg) => write!(f, "Geolocation error: {}", msg),
            WeatherApiError::MissingData(msg) => write!(f, "Missing weather data: {}", msg),
        }
    }
}

impl std::error::Error for WeatherApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WeatherApiError::HttpRequestError(e) => Some(e),
            WeatherApiError::DeserializationError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WeatherApiError {
    fn from(err: reqwest::Error) -> Self {
        WeatherApiError::HttpRequestError(err)
    }
}

impl From<JsonError> for WeatherApiError {
    fn from(err: JsonError) -> Self {
        WeatherApiError::DeserializationError(err)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub list: Vec<ForecastEntry>,
    pub city: City,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntry {
    /// Slot start, unix seconds
    pub dt: i64,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    /// Kelvin
    pub temp: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct City {
    pub name: String,
}

/// What the phone tells the watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherReport {
    pub temperature_c: i32,
    pub location: String,
    pub description: String,
    /// Seconds from now until the chosen forecast slot (negative if all slots are past).
    pub forecast_offset_secs: i64,
}

/// Whole degrees Celsius, halves rounding up.
pub fn kelvin_to_celsius(kelvin: f64) -> i32 {
    (kelvin - 273.15 + 0.5).floor() as i32
}

/// Index of the first slot at or after `now_epoch`, falling back to the first slot.
pub fn select_slot(list: &[ForecastEntry], now_epoch: i64) -> Option<usize> {
    if list.is_empty() {
        return None;
    }
    Some(list.iter().position(|e| e.dt >= now_epoch).unwrap_or(0))
}

impl WeatherReport {
    pub fn from_forecast(forecast: &ForecastResponse, now_epoch: i64) -> Result<Self, WeatherApiError> {
        let idx = select_slot(&forecast.list, now_epoch)
            .ok_or_else(|| WeatherApiError::MissingData("forecast list is empty".to_string()))?;
        let slot = &forecast.list[idx];
        let description = slot
            .weather
            .first()
            .map(|c| c.description.clone())
            .ok_or_else(|| WeatherApiError::MissingData(format!("slot {} has no conditions", idx)))?;
        debug!("forecast slot {} of {} selected (dt={})", idx, forecast.list.len(), slot.dt);

        Ok(Self {
            temperature_c: kelvin_to_celsius(slot.main.temp),
            location: forecast.city.name.clone(),
            description,
            forecast_offset_secs: slot.dt - now_epoch,
        })
    }

    pub fn to_dictionary(&self) -> Dictionary {
        let offset = i32::try_from(self.forecast_offset_secs)
            .unwrap_or(if self.forecast_offset_secs < 0 { i32::MIN } else { i32::MAX });
        [
            Tuple::int(MessageKey::Temperature, self.temperature_c),
            Tuple::cstring(MessageKey::Location, self.location.clone()),
            Tuple::cstring(MessageKey::WeatherDescription, self.description.clone()),
            Tuple::int(MessageKey::UnixTimestamp, offset),
        ]
        .into_iter()
        .collect()
    }
}

impl Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "It is {} degrees in {} => {} seconds. {}",
            self.temperature_c, self.location, self.forecast_offset_secs, self.description
        )
    }
}

/// Reply for when location lookup failed.
pub fn location_unavailable() -> Dictionary {
    [
        Tuple::cstring(MessageKey::Location, LOCATION_UNAVAILABLE),
        Tuple::cstring(MessageKey::Temperature, TEMPERATURE_UNAVAILABLE),
    ]
    .into_iter()
    .collect()
}

/// Gunzip when the body is compressed, otherwise take it as text.
pub fn decode_body(raw: &[u8]) -> String {
    let mut decoder = GzDecoder::new(raw);
    let mut decoded = String::new();
    match decoder.read_to_string(&mut decoded) {
        Ok(_) => decoded,
        Err(_) => String::from_utf8_lossy(raw).to_string(),
    }
}

/// Where the companion gets location and forecasts from.
pub trait WeatherSource: Send {
    fn locate(&mut self) -> impl Future<Output = Result<Coordinates, WeatherApiError>> + Send;
    fn forecast(&mut self, at: Coordinates) -> impl Future<Output = Result<ForecastResponse, WeatherApiError>> + Send;
}

/// OpenWeatherMap client
#[derive(Debug)]
pub struct OpenWeather {
    base_url: String,
    api_key: String,
    client: Client,
    /// Fixed position from config; IP geolocation when None
    position: Option<Coordinates>,
}

impl OpenWeather {
    pub fn new(api_key: &str, position: Option<Coordinates>) -> Result<Self, WeatherApiError> {
        const VERSION: &str = concat!("Tidey ", env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        if api_key.trim().is_empty() {
            return Err(WeatherApiError::ApiKeyError("no key specified".to_string()));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));
        headers.insert("Accept-Encoding", header::HeaderValue::from_static("gzip"));
        headers.insert("Connection", header::HeaderValue::from_static("close"));

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: FORECAST_URL.to_string(),
            api_key: api_key.trim().to_string(),
            client,
            position,
        })
    }

    async fn send_with_retries(&self, params: &[(&str, String)], max_attempts: u8) -> Result<String, reqwest::Error> {
        let mut attempt = 0;
        loop {
            let result = async {
                let response = self.client.get(&self.base_url).query(params).send().await?.error_for_status()?;
                response.bytes().await
            }
            .await;
            match result {
                Ok(raw) => return Ok(decode_body(&raw)),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        return Err(e);
                    }
                    warn!("forecast request failed (attempt {}/{}): {}", attempt, max_attempts, e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    pub async fn fetch_forecast(&self, at: Coordinates) -> Result<ForecastResponse, WeatherApiError> {
        info!("Fetching forecast for {:.4}, {:.4}...", at.lat, at.lon);
        let params = [
            ("lat", at.lat.to_string()),
            ("lon", at.lon.to_string()),
            ("cnt", FORECAST_SLOTS.to_string()),
            ("mode", "json".to_string()),
            ("appid", self.api_key.clone()),
        ];
        let plain = self.send_with_retries(&params, MAX_ATTEMPTS).await?;
        let forecast: ForecastResponse = serde_json::from_str(&plain)?;
        info!("Forecast fetched: {} slot(s) for {}", forecast.list.len(), forecast.city.name);
        Ok(forecast)
    }
}

impl WeatherSource for OpenWeather {
    fn locate(&mut self) -> impl Future<Output = Result<Coordinates, WeatherApiError>> + Send {
        let fixed = self.position;
        async move {
            if let Some(at) = fixed {
                return Ok(at);
            }
            info!("Latitude or longitude not provided. Attempting IP-based geolocation...");
            let geo = fetch_location()
                .await
                .map_err(|e| WeatherApiError::GeolocationError(e.to_string()))?;
            info!("Geolocation successful: {}", geo.place_name());
            Ok(geo.coordinates())
        }
    }

    fn forecast(&mut self, at: Coordinates) -> impl Future<Output = Result<ForecastResponse, WeatherApiError>> + Send {
        async move { self.fetch_forecast(at).await }
    }
}

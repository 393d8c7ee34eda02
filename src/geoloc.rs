/*
 *  geoloc.rs
 *
 *  Tidey - fuzzy words watchface
 *	(c) 2020-26 Stuart Hunter
 *
 *	Where are we - IP based location for the weather lookup
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
use serde::{Deserialize, Serialize};
use std::time::Duration;
use reqwest::{Client, header, Error};

const GEO_URL: &str = "https://ipapi.co/json/";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct GeoLocation {
    pub city: String,
    #[serde(default)]
    pub region_code: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates { lat: self.latitude, lon: self.longitude }
    }

    /// "Leeds ENG", or just the city when no region is reported
    pub fn place_name(&self) -> String {
        if self.region_code.is_empty() {
            self.city.clone()
        } else {
            format!("{} {}", self.city, self.region_code)
        }
    }
}

pub async fn fetch_location() -> Result<GeoLocation, Error> {
    const VERSION: &str = concat!("Tidey ", env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));
    let mut headers = header::HeaderMap::new();
    headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
    headers.insert("Accept", header::HeaderValue::from_static("application/json"));
    headers.insert("Connection", header::HeaderValue::from_static("close"));

    // mirrors the phone's geolocation options: 15s timeout
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .default_headers(headers)
        .timeout(Duration::from_secs(15))
        .build()?;

    let geo = client
        .get(GEO_URL)
        .send()
        .await?
        .error_for_status()? // none 2xx raise
        .json::<GeoLocation>()
        .await?;

    Ok(geo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ipapi_payload() {
        let geo: GeoLocation = serde_json::from_str(
            r#"{"ip":"203.0.113.9","city":"Leeds","region_code":"ENG","country_code":"GB",
                "utc_offset":"+0100","latitude":53.7965,"longitude":-1.5478}"#,
        )
        .unwrap();
        assert_eq!(geo.place_name(), "Leeds ENG");
        assert_eq!(geo.coordinates(), Coordinates { lat: 53.7965, lon: -1.5478 });
    }

    #[test]
    fn missing_region_is_tolerated() {
        let geo: GeoLocation =
            serde_json::from_str(r#"{"city":"Oslo","latitude":59.9,"longitude":10.7}"#).unwrap();
        assert_eq!(geo.place_name(), "Oslo");
    }
}

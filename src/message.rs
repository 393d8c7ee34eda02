/*
 *  message.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  App message dictionaries exchanged between watch and phone
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

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;

/// Inbox and outbox sizes the watch opens with.
pub const APP_MESSAGE_INBOX_SIZE: usize = 512;
pub const APP_MESSAGE_OUTBOX_SIZE: usize = 512;

/// Dictionaries queued per direction before senders wait.
const LINK_DEPTH: usize = 4;

// packed layout: count byte, then per tuple key(4) type(1) length(2) payload
const DICT_HEADER_BYTES: usize = 1;
const TUPLE_HEADER_BYTES: usize = 7;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown message key: {0}")]
    UnknownKey(String),
    #[error("invalid value for key {key}: {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("dictionary of {size} bytes exceeds {limit} byte buffer")]
    TooLarge { size: usize, limit: usize },
    #[error("outbox busy")]
    Busy,
    #[error("message link closed")]
    Closed,
}

/// Keys understood by the watchface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageKey {
    Temperature = 0,
    Location = 1,
    WeatherDescription = 2,
    /// Seconds between the phone's clock and the forecast slot.
    UnixTimestamp = 3,
    /// Watch -> phone: please send fresh weather.
    RefreshRequest = 5,
}

impl MessageKey {
    pub fn key(self) -> u32 {
        self as u32
    }

    pub fn from_key(key: u32) -> Option<Self> {
        match key {
            0 => Some(MessageKey::Temperature),
            1 => Some(MessageKey::Location),
            2 => Some(MessageKey::WeatherDescription),
            3 => Some(MessageKey::UnixTimestamp),
            5 => Some(MessageKey::RefreshRequest),
            _ => None,
        }
    }

    /// Names the phone side may use instead of numbers.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "temperature" => Some(MessageKey::Temperature),
            "city" | "location" => Some(MessageKey::Location),
            "description" | "weather_description" => Some(MessageKey::WeatherDescription),
            "timestamp" | "unix_timestamp" => Some(MessageKey::UnixTimestamp),
            "refresh" => Some(MessageKey::RefreshRequest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TupleValue {
    Int(i32),
    CString(String),
}

impl fmt::Display for TupleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TupleValue::Int(v) => write!(f, "{}", v),
            TupleValue::CString(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    pub key: u32,
    pub value: TupleValue,
}

impl Tuple {
    pub fn int(key: MessageKey, value: i32) -> Self {
        Self { key: key.key(), value: TupleValue::Int(value) }
    }

    pub fn cstring(key: MessageKey, value: impl Into<String>) -> Self {
        Self { key: key.key(), value: TupleValue::CString(value.into()) }
    }

    pub fn message_key(&self) -> Option<MessageKey> {
        MessageKey::from_key(self.key)
    }

    pub fn as_int(&self) -> Option<i32> {
        match self.value {
            TupleValue::Int(v) => Some(v),
            TupleValue::CString(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            TupleValue::CString(s) => Some(s),
            TupleValue::Int(_) => None,
        }
    }

    fn packed_len(&self) -> usize {
        TUPLE_HEADER_BYTES
            + match &self.value {
                TupleValue::Int(_) => 4,
                TupleValue::CString(s) => s.len() + 1,
            }
    }
}

/// Ordered set of tuples with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    tuples: Vec<Tuple>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch -> phone request for a weather update.
    pub fn refresh_request() -> Self {
        let mut dict = Self::new();
        dict.push(Tuple::int(MessageKey::RefreshRequest, 5));
        dict
    }

    /// Insert, replacing any tuple with the same key in place.
    pub fn push(&mut self, tuple: Tuple) {
        match self.tuples.iter_mut().find(|t| t.key == tuple.key) {
            Some(existing) => *existing = tuple,
            None => self.tuples.push(tuple),
        }
    }

    pub fn get(&self, key: MessageKey) -> Option<&Tuple> {
        self.tuples.iter().find(|t| t.key == key.key())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter()
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Bytes this dictionary occupies in an inbox or outbox buffer.
    pub fn packed_size(&self) -> usize {
        DICT_HEADER_BYTES + self.tuples.iter().map(Tuple::packed_len).sum::<usize>()
    }

    /// Parse the JSON object the phone sends, e.g. `{"0": 7, "2": "light rain"}`.
    pub fn from_json(json: &str) -> Result<Self, MessageError> {
        let map: Map<String, Value> = serde_json::from_str(json)?;
        let mut dict = Self::new();
        for (name, value) in map {
            let key = match name.parse::<u32>() {
                Ok(k) => k,
                Err(_) => MessageKey::from_name(&name)
                    .map(MessageKey::key)
                    .ok_or_else(|| MessageError::UnknownKey(name.clone()))?,
            };
            let value = match value {
                Value::Number(n) => {
                    let v = n.as_i64().and_then(|v| i32::try_from(v).ok()).ok_or_else(|| {
                        MessageError::InvalidValue { key: name.clone(), reason: format!("{} is not an int32", n) }
                    })?;
                    TupleValue::Int(v)
                }
                Value::String(s) => TupleValue::CString(s),
                other => {
                    return Err(MessageError::InvalidValue {
                        key: name,
                        reason: format!("unsupported value {}", other),
                    })
                }
            };
            dict.push(Tuple { key, value });
        }
        debug!("decoded dictionary with {} tuple(s)", dict.len());
        Ok(dict)
    }

    pub fn to_json(&self) -> Result<String, MessageError> {
        let mut map = Map::new();
        for t in &self.tuples {
            map.insert(t.key.to_string(), serde_json::to_value(&t.value)?);
        }
        Ok(serde_json::to_string(&map)?)
    }
}

impl FromIterator<Tuple> for Dictionary {
    fn from_iter<I: IntoIterator<Item = Tuple>>(iter: I) -> Self {
        let mut dict = Self::new();
        for t in iter {
            dict.push(t);
        }
        dict
    }
}

/// Sending half of one direction of the link, with its buffer limit.
#[derive(Debug, Clone)]
pub struct MessageSender {
    tx: mpsc::Sender<Dictionary>,
    limit: usize,
}

impl MessageSender {
    fn check(&self, dict: &Dictionary) -> Result<(), MessageError> {
        let size = dict.packed_size();
        if size > self.limit {
            warn!("dropping dictionary of {} bytes (limit {})", size, self.limit);
            return Err(MessageError::TooLarge { size, limit: self.limit });
        }
        Ok(())
    }

    pub async fn send(&self, dict: Dictionary) -> Result<(), MessageError> {
        self.check(&dict)?;
        self.tx.send(dict).await.map_err(|_| MessageError::Closed)
    }

    /// Non-blocking send for callers outside an async context.
    pub fn try_send(&self, dict: Dictionary) -> Result<(), MessageError> {
        self.check(&dict)?;
        self.tx.try_send(dict).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => MessageError::Busy,
            mpsc::error::TrySendError::Closed(_) => MessageError::Closed,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// The watch's end: its outbox goes to the phone, its inbox comes from it.
#[derive(Debug)]
pub struct WatchEndpoint {
    pub outbox: MessageSender,
    pub inbox: mpsc::Receiver<Dictionary>,
}

/// The phone's end of the same link.
#[derive(Debug)]
pub struct PhoneEndpoint {
    pub outbox: MessageSender,
    pub inbox: mpsc::Receiver<Dictionary>,
}

/// Open the link with the watch's inbox and outbox sizes.
pub fn open(inbox_size: usize, outbox_size: usize) -> (WatchEndpoint, PhoneEndpoint) {
    let (to_phone, from_watch) = mpsc::channel(LINK_DEPTH);
    let (to_watch, from_phone) = mpsc::channel(LINK_DEPTH);
    (
        WatchEndpoint {
            outbox: MessageSender { tx: to_phone, limit: outbox_size },
            inbox: from_phone,
        },
        PhoneEndpoint {
            outbox: MessageSender { tx: to_watch, limit: inbox_size },
            inbox: from_watch,
        },
    )
}

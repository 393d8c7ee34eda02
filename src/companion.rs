/*
 *  companion.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
 *
 *  Phone side of the link - answers watch requests with weather
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

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::message::{Dictionary, MessageError, MessageKey, PhoneEndpoint};
use crate::weather::{location_unavailable, WeatherReport, WeatherSource};

pub struct Companion<S> {
    source: S,
    endpoint: PhoneEndpoint,
}

impl<S: WeatherSource> Companion<S> {
    pub fn new(source: S, endpoint: PhoneEndpoint) -> Self {
        Self { source, endpoint }
    }

    /// Work out the reply for a refresh at `now_epoch`.
    ///
    /// Location failures still produce a reply so the watch can say so;
    /// forecast failures produce nothing and the watch keeps what it has.
    pub async fn build_reply(&mut self, now_epoch: i64) -> Option<Dictionary> {
        let at = match self.source.locate().await {
            Ok(at) => at,
            Err(e) => {
                warn!("location error ({})", e);
                return Some(location_unavailable());
            }
        };
        let report = self
            .source
            .forecast(at)
            .await
            .and_then(|f| WeatherReport::from_forecast(&f, now_epoch));
        match report {
            Ok(report) => {
                info!("{}", report);
                Some(report.to_dictionary())
            }
            Err(e) => {
                error!("Weather fetch failed: {}", e);
                None
            }
        }
    }

    /// One request/reply cycle.
    pub async fn refresh(&mut self) -> Result<(), MessageError> {
        let now = Utc::now().timestamp();
        match self.build_reply(now).await {
            Some(reply) => {
                self.endpoint.outbox.send(reply).await?;
                debug!("weather reply sent");
            }
            None => debug!("no weather reply this time"),
        }
        Ok(())
    }

    /// Refresh once on start, then on every watch request until stopped.
    pub async fn run(mut self, mut stop: mpsc::Receiver<()>) {
        info!("Companion ready");
        if let Err(e) = self.refresh().await {
            error!("Initial weather reply failed: {}", e);
        }
        loop {
            tokio::select! {
                msg = self.endpoint.inbox.recv() => {
                    let Some(msg) = msg else {
                        info!("Watch closed the link. Companion exiting.");
                        break;
                    };
                    if msg.get(MessageKey::RefreshRequest).is_none() {
                        debug!("watch message without refresh key, refreshing anyway");
                    }
                    match self.refresh().await {
                        Ok(()) => {}
                        Err(MessageError::Closed) => {
                            info!("Watch closed the link. Companion exiting.");
                            break;
                        }
                        Err(e) => error!("Weather reply failed: {}", e),
                    }
                }
                _ = stop.recv() => {
                    info!("Companion received stop signal. Exiting.");
                    break;
                }
            }
        }
    }
}

/// Running companion task
pub struct CompanionHandle {
    stop_sender: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl CompanionHandle {
    pub async fn stop(self) {
        if let Err(e) = self.stop_sender.send(()).await {
            debug!("companion already gone: {}", e);
        }
        self.handle
            .await
            .unwrap_or_else(|e| error!("Companion task failed to join: {}", e));
        info!("Companion stopped.");
    }
}

pub fn spawn<S: WeatherSource + 'static>(source: S, endpoint: PhoneEndpoint) -> CompanionHandle {
    let (stop_sender, stop_rx) = mpsc::channel(1);
    let companion = Companion::new(source, endpoint);
    let handle = tokio::spawn(companion.run(stop_rx));
    CompanionHandle { stop_sender, handle }
}

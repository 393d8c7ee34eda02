/*
 *  main.rs
 *
 *  Tidey - fuzzy words watchface
 *  (c) 2020-26 Stuart Hunter
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

use anyhow::Context;
use chrono::Local;
use env_logger::Env;
use log::{debug, error, info, warn};
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};

use tidey::companion::{self, CompanionHandle};
use tidey::config;
use tidey::display::FrameBuffer;
use tidey::message::{self, Dictionary, MessageSender, APP_MESSAGE_INBOX_SIZE, APP_MESSAGE_OUTBOX_SIZE};
use tidey::tick;
use tidey::watchface::DisplayContext;
use tidey::weather::OpenWeather;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// How long --once waits for the first weather reply.
const FIRST_REPLY_WAIT: Duration = Duration::from_secs(15);

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn signal_handler() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

fn request_weather(outbox: &MessageSender, request: Option<Dictionary>, weather_on: bool) {
    let Some(request) = request else { return };
    if !weather_on {
        return;
    }
    match outbox.try_send(request) {
        Ok(()) => debug!("weather refresh requested"),
        Err(e) => warn!("weather refresh not sent: {}", e),
    }
}

fn draw(face: &DisplayContext, frame: &mut FrameBuffer, ascii: bool) {
    face.render(frame).unwrap_or_else(|e| match e {});
    info!(
        "[{}] [{}] [{}]",
        face.weather.text(),
        face.time.text(),
        face.date.text()
    );
    if ascii {
        println!("{}", frame.to_ascii());
    }
}

async fn shutdown(companion: Option<CompanionHandle>) {
    if let Some(handle) = companion {
        handle.stop().await;
    }
    info!("Tidey stopped.");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (cfg, cli) = config::load().context("loading configuration")?;
    if cli.dump_config {
        println!("{}", config::dump_config(&cfg)?);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level()))
        .format_timestamp_secs()
        .init();

    info!("This is {} telling the time in words", env!("CARGO_PKG_NAME"));
    info!("v.{} built {} ({} {})", env!("CARGO_PKG_VERSION"), BUILD_DATE, BUILD_TARGET, BUILD_PROFILE);

    let settings = cfg.face_settings();
    let mut face = DisplayContext::new(settings)?;
    let mut frame = FrameBuffer::new(settings.width, settings.height)?;

    let (mut watch, phone) = message::open(APP_MESSAGE_INBOX_SIZE, APP_MESSAGE_OUTBOX_SIZE);
    let companion = match cfg.api_key() {
        Some(key) => match OpenWeather::new(key, cfg.position()) {
            Ok(source) => Some(companion::spawn(source, phone)),
            Err(e) => {
                error!("Weather disabled: {}", e);
                None
            }
        },
        None => {
            info!("No weather key configured, weather disabled");
            None
        }
    };
    let weather_on = companion.is_some();

    let request = face.handle_minute_tick(&Local::now().naive_local());
    request_weather(&watch.outbox, request, weather_on);

    if cli.once {
        if weather_on {
            match tokio::time::timeout(FIRST_REPLY_WAIT, watch.inbox.recv()).await {
                Ok(Some(dict)) => {
                    face.in_received(&dict);
                }
                Ok(None) => warn!("weather link closed before first reply"),
                Err(_) => warn!("no weather within {:?}", FIRST_REPLY_WAIT),
            }
        }
        draw(&face, &mut frame, cli.ascii);
        shutdown(companion).await;
        return Ok(());
    }

    draw(&face, &mut frame, cli.ascii);

    let signals = signal_handler();
    tokio::pin!(signals);

    loop {
        tokio::select! {
            res = &mut signals => {
                if let Err(e) = res {
                    error!("signal handler failed: {}", e);
                }
                break;
            }
            _ = tick::next_minute() => {
                let request = face.handle_minute_tick(&Local::now().naive_local());
                request_weather(&watch.outbox, request, weather_on);
                draw(&face, &mut frame, cli.ascii);
            }
            Some(dict) = watch.inbox.recv() => {
                debug!("inbox: {} tuples, {} bytes", dict.len(), dict.packed_size());
                if face.in_received(&dict) {
                    draw(&face, &mut frame, cli.ascii);
                }
            }
        }
    }

    shutdown(companion).await;
    Ok(())
}

//! Counting fakes for the extraction and device-control leaves

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use twitchcast::models::StreamInfo;
use twitchcast::stream::{DeviceController, DeviceError, ExtractError, StreamExtractor};

pub fn stream_url(tier: &str) -> String {
    format!("https://cdn.example/{}.m3u8", tier)
}

enum Behavior {
    Streams(HashMap<String, StreamInfo>),
    Offline,
    Fail(String),
}

pub struct FakeExtractor {
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeExtractor {
    /// Offers exactly these tiers, each with a distinct URL
    pub fn with_tiers(tiers: &[&str]) -> Self {
        let streams = tiers
            .iter()
            .map(|t| {
                (
                    t.to_string(),
                    StreamInfo {
                        stream_type: "hls".into(),
                        url: stream_url(t),
                        headers: HashMap::new(),
                    },
                )
            })
            .collect();
        Self::from_map(streams)
    }

    pub fn from_map(streams: HashMap<String, StreamInfo>) -> Self {
        Self {
            behavior: Behavior::Streams(streams),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn offline() -> Self {
        Self {
            behavior: Behavior::Offline,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            behavior: Behavior::Fail(message.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamExtractor for FakeExtractor {
    async fn streams(&self, channel: &str) -> Result<HashMap<String, StreamInfo>, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.behavior {
            Behavior::Streams(streams) => Ok(streams.clone()),
            Behavior::Offline => Err(ExtractError::Offline(channel.to_string())),
            Behavior::Fail(message) => Err(ExtractError::Failed(message.clone())),
        }
    }
}

#[derive(Default)]
pub struct FakeDevice {
    fail: bool,
    plays: Mutex<Vec<(IpAddr, String)>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            plays: Mutex::new(Vec::new()),
        }
    }

    pub fn plays(&self) -> Vec<(IpAddr, String)> {
        self.plays.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceController for FakeDevice {
    async fn play(&self, address: IpAddr, url: &str) -> Result<(), DeviceError> {
        self.plays.lock().unwrap().push((address, url.to_string()));
        if self.fail {
            return Err(DeviceError::Rejected {
                address,
                message: "device unreachable".into(),
            });
        }
        Ok(())
    }
}

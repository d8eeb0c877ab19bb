use std::fmt;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use log::{error, info, warn};
use reqwest::blocking::Client;

use crate::config::{FetcherConfig, RetryPolicy};
use crate::error::{ExtractError, Result};
use crate::snapshot::TickerSnapshot;

const STATUS_OK: u16 = 200;
const STATUS_BANNED: u16 = 418;
const STATUS_RATE_LIMITED: u16 = 429;

/// Status and body of one completed request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// A single GET. Any `Err` counts as a transport failure and is retried.
pub trait Transport {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        (**self).get(url)
    }
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self.client.get(url).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(HttpResponse { status, body })
    }
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration)
    }
}

/// Anything that can produce a ticker snapshot.
pub trait TickerSource {
    fn fetch(&self) -> Result<TickerSnapshot>;
}

impl<S: TickerSource + ?Sized> TickerSource for &S {
    fn fetch(&self) -> Result<TickerSnapshot> {
        (**self).fetch()
    }
}

/// Details of an upstream IP ban.
#[derive(Debug, Clone, PartialEq)]
pub struct BanNotice {
    pub until: Option<DateTime<Utc>>,
}

impl BanNotice {
    pub fn from_body(body: &str) -> Self {
        Self {
            until: parse_ban_until(body),
        }
    }
}

impl fmt::Display for BanNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.until {
            Some(until) => write!(
                f,
                "IP banned until: {} (local time)",
                until.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S %Z")
            ),
            None => write!(f, "IP banned (HTTP 418), but couldn't parse expiration time"),
        }
    }
}

/// Find the first `until <epoch-millis>` in a ban message.
pub fn parse_ban_until(body: &str) -> Option<DateTime<Utc>> {
    body.match_indices("until ")
        .find_map(|(index, marker)| {
            let rest = &body[index + marker.len()..];
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            rest[..end].parse::<i64>().ok()
        })
        .and_then(DateTime::from_timestamp_millis)
}

/// Blocking fetch of the 24hr ticker endpoint.
///
/// Network errors, 429s and unexpected statuses are retried with the waits
/// from [`RetryPolicy`]. A 418 returns [`ExtractError::Banned`] immediately.
pub struct Fetcher<T = ReqwestTransport, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    endpoint: String,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn from_config(config: &FetcherConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Ok(Fetcher::new(
            transport,
            ThreadSleeper,
            &config.endpoint,
            config.retry.clone(),
        ))
    }
}

impl<T: Transport, S: Sleeper> Fetcher<T, S> {
    pub fn new(transport: T, sleeper: S, endpoint: &str, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper,
            endpoint: endpoint.to_string(),
            policy,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn fetch_snapshot(&self) -> Result<TickerSnapshot> {
        let mut rate_limited = 0u32;
        let mut retries = 0u32;

        loop {
            let (wait, failure) = match self.transport.get(&self.endpoint) {
                Err(e) => {
                    warn!(
                        "[network error] {}. Retrying in {:.0?}...",
                        e, self.policy.network_delay
                    );
                    (self.policy.network_delay, e.to_string())
                }
                Ok(response) => match response.status {
                    STATUS_OK => {
                        info!("Retrieved ticker data after {} retries", retries);
                        return TickerSnapshot::from_json(&response.body);
                    }
                    STATUS_RATE_LIMITED => {
                        rate_limited += 1;
                        let wait = self
                            .policy
                            .rate_limit_delay(rate_limited, self.policy.sample_jitter());
                        warn!(
                            "[429] Rate limited. Retry {}. Waiting {:.2}s...",
                            rate_limited,
                            wait.as_secs_f64()
                        );
                        (wait, "rate limited (429)".to_string())
                    }
                    STATUS_BANNED => {
                        let notice = BanNotice::from_body(&response.body);
                        error!("{}", notice);
                        return Err(ExtractError::Banned(notice));
                    }
                    status => {
                        warn!(
                            "[error] Unexpected status {}: {}. Retrying in {:.0?}...",
                            status,
                            preview(&response.body),
                            self.policy.unexpected_status_delay
                        );
                        (
                            self.policy.unexpected_status_delay,
                            format!("unexpected status {}", status),
                        )
                    }
                },
            };

            retries += 1;
            if let Some(max) = self.policy.max_retries {
                if retries > max {
                    return Err(ExtractError::RetriesExhausted {
                        retries: max,
                        last: failure,
                    });
                }
            }

            self.sleeper.sleep(wait);
        }
    }
}

impl<T: Transport, S: Sleeper> TickerSource for Fetcher<T, S> {
    fn fetch(&self) -> Result<TickerSnapshot> {
        self.fetch_snapshot()
    }
}

fn preview(body: &str) -> String {
    const LIMIT: usize = 200;
    match body.char_indices().nth(LIMIT) {
        Some((end, _)) => format!("{}... (truncated)", &body[..end]),
        None => body.to_string(),
    }
}

use std::sync::Arc;
use std::time::Duration;

use macaddr::MacAddr6;
use tokio::time::{sleep, timeout};

use crate::error::{Error, Result};
use crate::locator::{DeviceIdentity, DeviceLocator, ScanOptions, Scanner};
use crate::observer::{Event, NoopObserver, Observer};
use crate::retry::RetryPolicy;
use crate::session::{SensorSession, Transport};
use crate::waveplus::{RawTelemetryRecord, SensorReading, TelemetryDecoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub scan: ScanOptions,
    /// Upper bound for connect + read of a single pass, and for each teardown step after it.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            scan: ScanOptions::default(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Runs locate -> connect -> read -> disconnect -> decode against one radio, one device at a time.
pub struct Poller<S, T: Transport> {
    locator: DeviceLocator<S>,
    session: SensorSession<T>,
    decoder: TelemetryDecoder,
    options: PollOptions,
    observer: Arc<dyn Observer>,
}

impl<S: Scanner, T: Transport> Poller<S, T> {
    pub fn new(scanner: S, transport: T, decoder: TelemetryDecoder, options: PollOptions) -> Self {
        Self {
            locator: DeviceLocator::new(scanner, options.scan),
            session: SensorSession::new(transport),
            decoder,
            options,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(self, observer: Arc<dyn Observer>) -> Self {
        Self {
            locator: self.locator.with_observer(observer.clone()),
            session: self.session.with_observer(observer.clone()),
            observer,
            ..self
        }
    }

    /// A single pass. The session is disconnected on every exit path once a connect was attempted.
    pub async fn poll(&mut self, identity: &mut DeviceIdentity) -> Result<SensorReading> {
        let address = identity.resolve(&mut self.locator).await?;

        let result = self.read_scoped(address).await;
        if let Err(err) = &result
            && err.invalidates_address()
        {
            identity.forget_address();
        }

        result
    }

    /// Repeats [`Poller::poll`] according to the retry policy.
    pub async fn poll_with_retry(&mut self, identity: &mut DeviceIdentity) -> Result<SensorReading> {
        let RetryPolicy {
            max_attempts,
            backoff,
        } = self.options.retry;
        let max_attempts = max_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.poll(identity).await {
                Ok(reading) => return Ok(reading),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = backoff.delay(attempt);
                    self.observer.on_event(&Event::RetryScheduled {
                        attempt,
                        max_attempts,
                        delay,
                        error: &err,
                    });

                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn read_scoped(&mut self, address: MacAddr6) -> Result<SensorReading> {
        let limit = self.options.timeout;

        let record = match timeout(limit, self.connect_and_read(address)).await {
            Ok(record) => {
                self.release(address, limit, false).await;
                record?
            }
            Err(_) => {
                self.observer.on_event(&Event::PollTimedOut {
                    address,
                    timeout: limit,
                });
                self.release(address, limit, true).await;
                return Err(Error::Timeout(limit));
            }
        };

        Ok(self.decoder.decode(&record)?)
    }

    /// Disconnects within `limit`. The transport is told to let go of `address` as well when `force` is
    /// set or when the link does not come down in time. Failures are reported, never returned.
    async fn release(&mut self, address: MacAddr6, limit: Duration, force: bool) {
        let hung = match timeout(limit, self.session.disconnect()).await {
            Ok(Ok(())) => false,
            Ok(Err(err)) => {
                self.observer
                    .on_event(&Event::DisconnectFailed { address, error: &err });
                false
            }
            Err(_) => {
                self.observer.on_event(&Event::PollTimedOut {
                    address,
                    timeout: limit,
                });
                true
            }
        };
        if !(force || hung) {
            return;
        }

        // The session is already `Disconnected` here, so this only reaches the transport.
        let error = match timeout(limit, self.session.abort(address)).await {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err,
            Err(_) => Error::Timeout(limit),
        };
        self.observer
            .on_event(&Event::DisconnectFailed { address, error: &error });
    }

    async fn connect_and_read(&mut self, address: MacAddr6) -> Result<RawTelemetryRecord> {
        self.session.connect(address).await?;
        self.session.read().await
    }
}

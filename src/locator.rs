use std::sync::Arc;
use std::time::Duration;

use macaddr::MacAddr6;

use crate::error::{Error, Result};
use crate::observer::{Event, NoopObserver, Observer};
use crate::waveplus::parse_serial_number;

/// One peer seen during a scan round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub address: MacAddr6,

    /// Raw manufacturer data payloads, each starting with the little-endian company identifier.
    pub manufacturer_data: Vec<Vec<u8>>,
}

impl Advertisement {
    pub fn serial_number(&self) -> Option<u32> {
        self.manufacturer_data
            .iter()
            .find_map(|data| parse_serial_number(data))
    }
}

#[allow(async_fn_in_trait)]
pub trait Scanner {
    /// Scans for `window` and returns every peer currently advertising.
    async fn scan(&mut self, window: Duration) -> btleplug::Result<Vec<Advertisement>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub max_rounds: u32,
    pub window: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_rounds: 50,
            window: Duration::from_millis(100),
        }
    }
}

pub struct DeviceLocator<S> {
    scanner: S,
    options: ScanOptions,
    observer: Arc<dyn Observer>,
}

impl<S: Scanner> DeviceLocator<S> {
    pub fn new(scanner: S, options: ScanOptions) -> Self {
        Self {
            scanner,
            options,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Scans in bounded rounds until a peer advertises `serial_number`.
    pub async fn locate(&mut self, serial_number: u32) -> Result<MacAddr6> {
        let max_rounds = self.options.max_rounds;

        for round in 1..=max_rounds {
            let advertisements = self
                .scanner
                .scan(self.options.window)
                .await
                .map_err(Error::Scan)?;

            self.observer.on_event(&Event::ScanRound {
                round,
                max_rounds,
                peers: advertisements.len(),
            });

            for advertisement in &advertisements {
                let found = advertisement.serial_number();

                self.observer.on_event(&Event::PeerChecked {
                    address: advertisement.address,
                    serial_number: found,
                });

                if found == Some(serial_number) {
                    self.observer.on_event(&Event::DeviceFound {
                        serial_number,
                        address: advertisement.address,
                    });
                    return Ok(advertisement.address);
                }
            }
        }

        Err(Error::DeviceNotFound {
            serial_number,
            rounds: max_rounds,
        })
    }
}

/// A device known by serial number, with its address cached once discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    serial_number: u32,
    address: Option<MacAddr6>,
}

impl DeviceIdentity {
    pub fn new(serial_number: u32) -> Self {
        Self {
            serial_number,
            address: None,
        }
    }

    pub fn serial_number(&self) -> u32 {
        self.serial_number
    }

    pub fn address(&self) -> Option<MacAddr6> {
        self.address
    }

    /// Returns the cached address, or runs discovery and caches its result.
    pub async fn resolve<S: Scanner>(&mut self, locator: &mut DeviceLocator<S>) -> Result<MacAddr6> {
        if let Some(address) = self.address {
            return Ok(address);
        }

        let address = locator.locate(self.serial_number).await?;
        self.address = Some(address);

        Ok(address)
    }

    pub fn forget_address(&mut self) {
        self.address = None;
    }
}

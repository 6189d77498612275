use std::time::Duration;

use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use macaddr::MacAddr6;
use tokio::time::sleep;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::locator::{Advertisement, Scanner};
use crate::session::{Link, Transport};

/// The first Bluetooth adapter of the host, used for both scanning and connecting.
#[derive(Clone)]
pub struct BleAdapter {
    _manager: Manager,
    adapter: Adapter,
}

impl BleAdapter {
    pub async fn first() -> Result<Self> {
        let manager = Manager::new().await.map_err(Error::Scan)?;

        let adapters = manager.adapters().await.map_err(Error::Scan)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::AdapterUnavailable)?;

        Ok(Self {
            _manager: manager,
            adapter,
        })
    }

    async fn find_peripheral(&self, address: MacAddr6) -> btleplug::Result<Option<Peripheral>> {
        Ok(self
            .adapter
            .peripherals()
            .await?
            .into_iter()
            .find(|p| MacAddr6::from(p.address().into_inner()) == address))
    }
}

impl Scanner for BleAdapter {
    async fn scan(&mut self, window: Duration) -> btleplug::Result<Vec<Advertisement>> {
        self.adapter.start_scan(ScanFilter::default()).await?;
        sleep(window).await;
        self.adapter.stop_scan().await?;

        let mut advertisements = Vec::new();
        for peripheral in self.adapter.peripherals().await? {
            // Peripherals that vanished mid-round are skipped, not fatal.
            let Ok(Some(properties)) = peripheral.properties().await else {
                continue;
            };

            advertisements.push(Advertisement {
                address: peripheral.address().into_inner().into(),
                manufacturer_data: properties
                    .manufacturer_data
                    .iter()
                    .map(|(&company_id, data)| raw_manufacturer_data(company_id, data))
                    .collect(),
            });
        }

        Ok(advertisements)
    }
}

impl Transport for BleAdapter {
    type Link = BleLink;

    async fn connect(&mut self, address: MacAddr6) -> btleplug::Result<BleLink> {
        let peripheral = self
            .find_peripheral(address)
            .await?
            .ok_or(btleplug::Error::DeviceNotFound)?;

        peripheral.connect().await?;

        Ok(BleLink { peripheral })
    }

    async fn abort(&mut self, address: MacAddr6) -> btleplug::Result<()> {
        let Some(peripheral) = self.find_peripheral(address).await? else {
            return Ok(());
        };

        if peripheral.is_connected().await? {
            peripheral.disconnect().await?;
        }

        Ok(())
    }
}

pub struct BleLink {
    peripheral: Peripheral,
}

impl Link for BleLink {
    type Characteristic = Characteristic;

    async fn characteristic(&mut self, uuid: Uuid) -> btleplug::Result<Option<Characteristic>> {
        self.peripheral.discover_services().await?;

        Ok(self
            .peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid))
    }

    async fn read(&mut self, characteristic: &Characteristic) -> btleplug::Result<Vec<u8>> {
        self.peripheral.read(characteristic).await
    }

    async fn disconnect(&mut self) -> btleplug::Result<()> {
        self.peripheral.disconnect().await
    }
}

/// btleplug strips the company identifier from manufacturer data; put it back in front.
fn raw_manufacturer_data(company_id: u16, data: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(data.len() + 2);
    raw.extend_from_slice(&company_id.to_le_bytes());
    raw.extend_from_slice(data);
    raw
}

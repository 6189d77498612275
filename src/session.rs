use std::sync::Arc;

use macaddr::MacAddr6;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::observer::{Event, NoopObserver, Observer};
use crate::waveplus::{RawTelemetryRecord, TELEMETRY_CHARACTERISTIC_UUID};

/// An established link to one peripheral.
#[allow(async_fn_in_trait)]
pub trait Link {
    type Characteristic;

    /// Discovers services and looks up a characteristic by UUID.
    async fn characteristic(&mut self, uuid: Uuid) -> btleplug::Result<Option<Self::Characteristic>>;

    async fn read(&mut self, characteristic: &Self::Characteristic) -> btleplug::Result<Vec<u8>>;

    async fn disconnect(&mut self) -> btleplug::Result<()>;
}

#[allow(async_fn_in_trait)]
pub trait Transport {
    type Link: Link;

    async fn connect(&mut self, address: MacAddr6) -> btleplug::Result<Self::Link>;

    /// Releases whatever the radio still holds for `address`, e.g. after an abandoned connect.
    async fn abort(&mut self, _address: MacAddr6) -> btleplug::Result<()> {
        Ok(())
    }
}

enum State<L: Link> {
    Disconnected,
    Connected {
        address: MacAddr6,
        link: L,
        characteristic: L::Characteristic,
    },
}

/// Connection lifecycle for a single device: `Disconnected -> Connected -> Disconnected`.
pub struct SensorSession<T: Transport> {
    transport: T,
    state: State<T::Link>,
    observer: Arc<dyn Observer>,
}

impl<T: Transport> SensorSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: State::Disconnected,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, State::Connected { .. })
    }

    pub fn connected_address(&self) -> Option<MacAddr6> {
        match &self.state {
            State::Connected { address, .. } => Some(*address),
            State::Disconnected => None,
        }
    }

    /// Links to `address` and resolves the telemetry characteristic.
    ///
    /// A no-op when already connected to `address`.
    pub async fn connect(&mut self, address: MacAddr6) -> Result<()> {
        match self.connected_address() {
            Some(connected) if connected == address => return Ok(()),
            Some(connected) => return Err(Error::AlreadyConnected { address: connected }),
            None => {}
        }

        self.observer.on_event(&Event::Connecting { address });

        let mut link = self
            .transport
            .connect(address)
            .await
            .map_err(|source| Error::ConnectionFailed { address, source })?;

        self.observer.on_event(&Event::Connected { address });

        let characteristic = match link.characteristic(TELEMETRY_CHARACTERISTIC_UUID).await {
            Ok(Some(c)) => c,
            Ok(None) => {
                self.release(address, link).await;
                return Err(Error::CharacteristicNotFound(TELEMETRY_CHARACTERISTIC_UUID));
            }
            Err(source) => {
                self.release(address, link).await;
                return Err(Error::ConnectionFailed { address, source });
            }
        };

        self.observer.on_event(&Event::CharacteristicResolved {
            uuid: TELEMETRY_CHARACTERISTIC_UUID,
        });

        self.state = State::Connected {
            address,
            link,
            characteristic,
        };

        Ok(())
    }

    /// Drops a link that never reached `Connected`.
    async fn release(&self, address: MacAddr6, mut link: T::Link) {
        if let Err(source) = link.disconnect().await {
            self.observer.on_event(&Event::DisconnectFailed {
                address,
                error: &Error::ConnectionFailed { address, source },
            });
        }
    }

    pub async fn read(&mut self) -> Result<RawTelemetryRecord> {
        let State::Connected {
            link,
            characteristic,
            ..
        } = &mut self.state
        else {
            return Err(Error::NotConnected);
        };

        let bytes = link.read(characteristic).await.map_err(Error::Read)?;

        Ok(RawTelemetryRecord::try_from(bytes.as_slice())?)
    }

    /// Tears down the link. The session is `Disconnected` afterwards even if the teardown fails.
    pub async fn disconnect(&mut self) -> Result<()> {
        let State::Connected {
            address, mut link, ..
        } = std::mem::replace(&mut self.state, State::Disconnected)
        else {
            self.observer.on_event(&Event::DisconnectSkipped);
            return Ok(());
        };

        self.observer.on_event(&Event::Disconnecting { address });

        link.disconnect()
            .await
            .map_err(|source| Error::ConnectionFailed { address, source })
    }

    /// Disconnects and asks the transport to release anything left over for `address`.
    pub async fn abort(&mut self, address: MacAddr6) -> Result<()> {
        let disconnected = self.disconnect().await;

        self.transport
            .abort(address)
            .await
            .map_err(|source| Error::ConnectionFailed { address, source })?;

        disconnected
    }
}

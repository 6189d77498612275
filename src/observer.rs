use std::time::Duration;

use macaddr::MacAddr6;
use uuid::Uuid;

use crate::error::Error;

/// Something that happened inside the poll pipeline, reported to an [`Observer`].
#[derive(Debug)]
pub enum Event<'a> {
    ScanRound { round: u32, max_rounds: u32, peers: usize },
    PeerChecked { address: MacAddr6, serial_number: Option<u32> },
    DeviceFound { serial_number: u32, address: MacAddr6 },
    Connecting { address: MacAddr6 },
    Connected { address: MacAddr6 },
    CharacteristicResolved { uuid: Uuid },
    Disconnecting { address: MacAddr6 },
    DisconnectSkipped,
    DisconnectFailed { address: MacAddr6, error: &'a Error },
    PollTimedOut { address: MacAddr6, timeout: Duration },
    RetryScheduled { attempt: u32, max_attempts: u32, delay: Duration, error: &'a Error },
}

pub trait Observer: Send + Sync {
    fn on_event(&self, event: &Event<'_>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_event(&self, _event: &Event<'_>) {}
}

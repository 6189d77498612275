pub mod ble;
pub mod document;
pub mod error;
pub mod locator;
pub mod observer;
pub mod poll;
pub mod retry;
pub mod session;
pub mod waveplus;

pub use error::{DecodeError, Error, Result};

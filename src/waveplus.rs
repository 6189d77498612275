mod decode;
mod reading;
mod record;
mod serial_number;

pub use decode::*;
pub use reading::*;
pub use record::*;
pub use serial_number::*;

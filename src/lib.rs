mod client;
mod crypto;
mod error;
mod logger;
mod protocol;
mod session;
mod state;
mod transport;
mod types;

pub use client::{
    ElectroluxClient, ElectroluxClientBuilder, DEFAULT_MAX_TEMP, DEFAULT_MIN_TEMP, DEFAULT_PORT,
};
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use protocol::{ABSOLUTE_MAX_TEMP, ABSOLUTE_MIN_TEMP, DEVICE_TYPE};
pub use state::{
    plan_hvac_transition, ClimateState, FanMode, HvacMode, SwingMode, TransitionPlan,
};
pub use transport::{Transport, UdpTransport};
pub use types::{AcMode, DeviceStatus, FanSpeed};

use serde::Deserialize;

/// Operating mode codes as the AC firmware numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcMode {
    Cool,
    Heat,
    Dry,
    Fan,
    Auto,
    /// Extended 8 degree heating mode; surfaces as HEAT_COOL on the
    /// platform side.
    Heat8,
}

impl AcMode {
    pub fn code(&self) -> u8 {
        match self {
            AcMode::Cool => 0,
            AcMode::Heat => 1,
            AcMode::Dry => 2,
            AcMode::Fan => 3,
            AcMode::Auto => 4,
            AcMode::Heat8 => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AcMode::Cool),
            1 => Some(AcMode::Heat),
            2 => Some(AcMode::Dry),
            3 => Some(AcMode::Fan),
            4 => Some(AcMode::Auto),
            6 => Some(AcMode::Heat8),
            _ => None,
        }
    }
}

/// Fan speed codes (`ac_mark` in the status payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanSpeed {
    Auto,
    Low,
    Mid,
    High,
    Turbo,
    Quiet,
}

impl FanSpeed {
    pub fn code(&self) -> u8 {
        match self {
            FanSpeed::Auto => 0,
            FanSpeed::Low => 1,
            FanSpeed::Mid => 2,
            FanSpeed::High => 3,
            FanSpeed::Turbo => 4,
            FanSpeed::Quiet => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(FanSpeed::Auto),
            1 => Some(FanSpeed::Low),
            2 => Some(FanSpeed::Mid),
            3 => Some(FanSpeed::High),
            4 => Some(FanSpeed::Turbo),
            5 => Some(FanSpeed::Quiet),
            _ => None,
        }
    }
}

/// Snapshot returned by a status query. Fields missing from a firmware's
/// payload fall back to defaults rather than failing the whole poll.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceStatus {
    /// Device serial number, reported by the device itself.
    #[serde(default)]
    pub sn: String,
    #[serde(default)]
    pub ac_pwr: u8,
    #[serde(default)]
    pub ac_mode: u8,
    #[serde(default)]
    pub ac_mark: u8,
    #[serde(default)]
    pub ac_vdir: u8,
    /// Indicator LED / display state.
    #[serde(default)]
    pub scrdisp: u8,
    #[serde(default)]
    pub ac_slp: u8,
    #[serde(default)]
    pub mldprf: u8,
    /// Set-point temperature in Celsius.
    #[serde(default)]
    pub temp: f64,
    /// Ambient temperature in Celsius.
    #[serde(default)]
    pub envtemp: f64,
}

//! Translation between raw device status fields and the platform-neutral
//! climate model. Everything here is pure; unknown firmware codes default
//! to AUTO instead of failing the poll.

use crate::types::{AcMode, DeviceStatus, FanSpeed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HvacMode {
    #[default]
    Off,
    Auto,
    Heat,
    Cool,
    Dry,
    FanOnly,
    HeatCool,
}

impl HvacMode {
    pub fn from_ac_mode(mode: AcMode) -> Self {
        match mode {
            AcMode::Auto => HvacMode::Auto,
            AcMode::Cool => HvacMode::Cool,
            AcMode::Heat => HvacMode::Heat,
            AcMode::Heat8 => HvacMode::HeatCool,
            AcMode::Dry => HvacMode::Dry,
            AcMode::Fan => HvacMode::FanOnly,
        }
    }

    /// Device mode behind this HVAC mode. `Off` has no device mode; it is
    /// expressed through the power flag instead.
    pub fn ac_mode(&self) -> Option<AcMode> {
        match self {
            HvacMode::Off => None,
            HvacMode::Auto => Some(AcMode::Auto),
            HvacMode::Heat => Some(AcMode::Heat),
            HvacMode::Cool => Some(AcMode::Cool),
            HvacMode::Dry => Some(AcMode::Dry),
            HvacMode::FanOnly => Some(AcMode::Fan),
            HvacMode::HeatCool => Some(AcMode::Heat8),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanMode {
    #[default]
    Auto,
    Low,
    Medium,
    High,
    Quiet,
    Turbo,
}

impl FanMode {
    pub fn from_speed(speed: FanSpeed) -> Self {
        match speed {
            FanSpeed::Auto => FanMode::Auto,
            FanSpeed::Low => FanMode::Low,
            FanSpeed::Mid => FanMode::Medium,
            FanSpeed::High => FanMode::High,
            FanSpeed::Quiet => FanMode::Quiet,
            FanSpeed::Turbo => FanMode::Turbo,
        }
    }

    pub fn speed(&self) -> FanSpeed {
        match self {
            FanMode::Auto => FanSpeed::Auto,
            FanMode::Low => FanSpeed::Low,
            FanMode::Medium => FanSpeed::Mid,
            FanMode::High => FanSpeed::High,
            FanMode::Quiet => FanSpeed::Quiet,
            FanMode::Turbo => FanSpeed::Turbo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwingMode {
    #[default]
    Off,
    Vertical,
}

/// Platform-facing snapshot derived from one status poll. Never cached
/// across polls; each poll fully replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClimateState {
    pub available: bool,
    pub hvac_mode: HvacMode,
    pub fan_mode: FanMode,
    pub swing_mode: SwingMode,
    pub current_temperature: f64,
    pub target_temperature: f64,
    pub led_on: bool,
}

impl ClimateState {
    /// State reported when the device cannot be trusted this cycle
    /// (serial mismatch or undecodable status).
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Map a raw status snapshot. `expected_serial` of `None` skips the
    /// serial check (the caller has not pinned a device yet).
    pub fn from_status(status: &DeviceStatus, expected_serial: Option<&str>) -> Self {
        if let Some(sn) = expected_serial
            && sn != status.sn
        {
            return Self::unavailable();
        }

        let hvac_mode = if status.ac_pwr == 0 {
            HvacMode::Off
        } else {
            AcMode::from_code(status.ac_mode)
                .map(HvacMode::from_ac_mode)
                .unwrap_or(HvacMode::Auto)
        };

        let fan_mode = FanSpeed::from_code(status.ac_mark)
            .map(FanMode::from_speed)
            .unwrap_or(FanMode::Auto);

        let swing_mode = if status.ac_vdir == 0 {
            SwingMode::Off
        } else {
            SwingMode::Vertical
        };

        Self {
            available: true,
            hvac_mode,
            fan_mode,
            swing_mode,
            current_temperature: status.envtemp,
            target_temperature: status.temp,
            led_on: status.scrdisp == 1,
        }
    }
}

/// Device calls needed to move from one HVAC mode to another: an optional
/// power toggle followed by an optional mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionPlan {
    pub power: Option<bool>,
    pub mode: Option<AcMode>,
}

pub fn plan_hvac_transition(current: HvacMode, requested: HvacMode) -> TransitionPlan {
    if requested == HvacMode::Off {
        return TransitionPlan {
            power: (current != HvacMode::Off).then_some(false),
            mode: None,
        };
    }

    TransitionPlan {
        power: (current == HvacMode::Off).then_some(true),
        mode: Some(requested.ac_mode().unwrap_or(AcMode::Auto)),
    }
}

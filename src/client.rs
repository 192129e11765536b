use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, trace, warn};

use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol;
use crate::session::Session;
use crate::state::{plan_hvac_transition, ClimateState, FanMode, HvacMode, SwingMode};
use crate::transport::{Transport, UdpTransport};
use crate::types::{AcMode, DeviceStatus, FanSpeed};
use crate::{Error, Result};

pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_MIN_TEMP: i32 = 17;
pub const DEFAULT_MAX_TEMP: i32 = 30;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ElectroluxClientBuilder {
    host: String,
    port: u16,
    mac: String,
    device_type: u16,
    serial: Option<String>,
    timeout: Duration,
    min_temp: i32,
    max_temp: i32,
    log: Option<(MessageLogMode, String)>,
    transport: Option<Box<dyn Transport>>,
}

impl ElectroluxClientBuilder {
    pub fn new(host: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            mac: mac.into(),
            device_type: protocol::DEVICE_TYPE,
            serial: None,
            timeout: DEFAULT_TIMEOUT,
            min_temp: DEFAULT_MIN_TEMP,
            max_temp: DEFAULT_MAX_TEMP,
            log: None,
            transport: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn device_type(mut self, device_type: u16) -> Self {
        self.device_type = device_type;
        self
    }

    /// Pin the expected device serial. Status polls from a device
    /// reporting a different serial map to an unavailable state.
    pub fn serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Advertised set-point range for the platform UI. Commands are still
    /// clamped to the device's absolute 0–40 range.
    pub fn temperature_bounds(mut self, min: i32, max: i32) -> Self {
        self.min_temp = min;
        self.max_temp = max;
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log = Some((mode, path.into()));
        self
    }

    /// Replace the UDP transport, e.g. with a scripted one in tests.
    pub fn transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<ElectroluxClient> {
        let mac = parse_mac(&self.mac)?;

        let transport: Box<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Box::new(UdpTransport::connect(&self.host, self.port, self.timeout)?),
        };

        let logger = match self.log {
            Some((mode, path)) => Some(MessageLogger::new(mode, &path)?),
            None => None,
        };

        // Exchange counter starts at an arbitrary point in the upper half,
        // matching what the devices expect from fresh clients.
        let count = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u16)
            .unwrap_or(0)
            | 0x8000;

        Ok(ElectroluxClient {
            transport,
            session: Session::new(),
            device_type: self.device_type,
            mac,
            serial: self.serial,
            min_temp: self.min_temp.clamp(protocol::ABSOLUTE_MIN_TEMP, protocol::ABSOLUTE_MAX_TEMP),
            max_temp: self.max_temp.clamp(protocol::ABSOLUTE_MIN_TEMP, protocol::ABSOLUTE_MAX_TEMP),
            count,
            logger,
        })
    }
}

/// Client for one air conditioner. One instance per device; every
/// operation is a single blocking request/response exchange, and the
/// `&mut self` receivers guarantee at most one exchange in flight.
pub struct ElectroluxClient {
    transport: Box<dyn Transport>,
    session: Session,
    device_type: u16,
    mac: [u8; 6],
    serial: Option<String>,
    min_temp: i32,
    max_temp: i32,
    count: u16,
    logger: Option<MessageLogger>,
}

impl ElectroluxClient {
    pub fn builder(host: impl Into<String>, mac: impl Into<String>) -> ElectroluxClientBuilder {
        ElectroluxClientBuilder::new(host, mac)
    }

    /// Run the key-exchange handshake. Must succeed before any command;
    /// never retried internally. Calling it again renegotiates from the
    /// default key.
    pub fn authenticate(&mut self) -> Result<()> {
        self.session.reset();
        debug!(device_type = self.device_type, "authenticating");

        let payload = protocol::auth_payload();
        let result = self.send_packet(protocol::PACKET_AUTH, &payload);
        let body = match result {
            Ok(body) => body,
            Err(e) => {
                if let Some(ref mut logger) = self.logger {
                    logger.log_auth(false);
                }
                return Err(e);
            }
        };

        self.session.apply_auth_response(&body)?;
        if let Some(ref mut logger) = self.logger {
            logger.log_auth(true);
        }
        debug!(device_id = ?self.session.device_id(), "session established");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Expected serial configured at build time, if any.
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Advertised set-point range.
    pub fn temperature_bounds(&self) -> (i32, i32) {
        (self.min_temp, self.max_temp)
    }

    pub fn get_status(&mut self) -> Result<DeviceStatus> {
        let raw = self.command(protocol::CMD_GET_STATUS, protocol::status_payload())?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Protocol(format!("undecodable status payload: {e}")))
    }

    /// One poll cycle: fetch status and map it to the platform model.
    /// An undecodable status or a serial mismatch yields an unavailable
    /// state; transport and device errors still propagate.
    pub fn poll_state(&mut self) -> Result<ClimateState> {
        let raw = self.command(protocol::CMD_GET_STATUS, protocol::status_payload())?;
        let status: DeviceStatus = match serde_json::from_str(&raw) {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "status payload did not decode, reporting unavailable");
                return Ok(ClimateState::unavailable());
            }
        };
        Ok(ClimateState::from_status(&status, self.serial.as_deref()))
    }

    /// Set the target temperature, clamped to the device's 0–40 °C range.
    pub fn set_temperature(&mut self, celsius: i32) -> Result<String> {
        self.command(protocol::CMD_SET_TEMP, protocol::temp_payload(celsius))
    }

    pub fn set_power(&mut self, on: bool) -> Result<String> {
        self.command(protocol::CMD_SET_POWER, protocol::power_payload(on))
    }

    pub fn set_mode(&mut self, mode: AcMode) -> Result<String> {
        self.command(protocol::CMD_SET_SETTING, protocol::mode_payload(mode.code()))
    }

    pub fn set_fan(&mut self, speed: FanSpeed) -> Result<String> {
        self.command(protocol::CMD_SET_SETTING, protocol::fan_payload(speed.code()))
    }

    pub fn set_swing(&mut self, on: bool) -> Result<String> {
        self.command(protocol::CMD_SET_SETTING, protocol::swing_payload(on))
    }

    /// Indicator LED / display panel on the unit.
    pub fn set_led(&mut self, on: bool) -> Result<String> {
        self.command(protocol::CMD_SET_SETTING, protocol::led_payload(on))
    }

    pub fn set_sleep(&mut self, on: bool) -> Result<String> {
        self.command(protocol::CMD_SET_POWER, protocol::sleep_payload(on))
    }

    pub fn set_self_clean(&mut self, on: bool) -> Result<String> {
        self.command(protocol::CMD_SET_POWER, protocol::self_clean_payload(on))
    }

    /// Program the on/off timer. Hours clamp to 0–23, minutes to 0–59.
    pub fn set_timer(&mut self, enabled: bool, hours: u8, minutes: u8) -> Result<String> {
        self.command(
            protocol::CMD_SET_TIMER,
            protocol::timer_payload(enabled, hours, minutes),
        )
    }

    pub fn clear_timer(&mut self) -> Result<String> {
        self.set_timer(false, 0, 0)
    }

    /// Apply an HVAC mode change the way the platform expects: power
    /// toggles for transitions into/out of OFF, then the mode itself.
    pub fn apply_hvac_mode(&mut self, current: HvacMode, requested: HvacMode) -> Result<()> {
        let plan = plan_hvac_transition(current, requested);
        if let Some(on) = plan.power {
            self.set_power(on)?;
        }
        if let Some(mode) = plan.mode {
            self.set_mode(mode)?;
        }
        Ok(())
    }

    pub fn set_fan_mode(&mut self, mode: FanMode) -> Result<String> {
        self.set_fan(mode.speed())
    }

    pub fn set_swing_mode(&mut self, mode: SwingMode) -> Result<String> {
        self.set_swing(mode == SwingMode::Vertical)
    }

    /// Full command path: inner frame → encrypt → outer packet → exchange
    /// → outer validation → decrypt → inner validation → UTF-8 payload.
    fn command(&mut self, code: u16, payload: Vec<u8>) -> Result<String> {
        if !self.session.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }

        let frame = protocol::encode_frame(code, &payload);
        if let Some(ref mut logger) = self.logger {
            logger.log_request(code, &payload, &frame);
        }

        let body = self.send_packet(protocol::PACKET_COMMAND, &frame)?;
        let response = protocol::decode_frame(&body)?;
        if let Some(ref mut logger) = self.logger {
            logger.log_response(code, &response);
        }

        String::from_utf8(response)
            .map_err(|_| Error::Protocol("response payload is not valid UTF-8".to_string()))
    }

    /// Wrap a plaintext body into an outer packet, exchange it, and return
    /// the decrypted response body. The device error code is checked
    /// before decryption.
    fn send_packet(&mut self, packet_type: u16, payload: &[u8]) -> Result<Vec<u8>> {
        self.count = self.count.wrapping_add(1);
        let encrypted = self.session.encrypt(payload);
        let packet = protocol::build_packet(
            self.device_type,
            packet_type,
            self.count,
            self.mac,
            self.session.device_id(),
            payload,
            &encrypted,
        );

        trace!(
            packet_type,
            count = self.count,
            len = packet.len(),
            "sending packet"
        );
        let response = self.transport.exchange(&packet)?;

        protocol::check_packet(&response)?;
        self.session.decrypt(protocol::packet_body(&response))
    }
}

fn parse_mac(mac: &str) -> Result<[u8; 6]> {
    let cleaned: String = mac
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .collect();
    if cleaned.len() != 12 {
        return Err(Error::InvalidMac(mac.to_string()));
    }

    let mut out = [0u8; 6];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&cleaned[i * 2..i * 2 + 2], 16)
            .map_err(|_| Error::InvalidMac(mac.to_string()))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mac_formats() {
        let expected = [0xaa, 0xbb, 0xcc, 0x00, 0x11, 0x22];
        assert_eq!(parse_mac("aa:bb:cc:00:11:22").unwrap(), expected);
        assert_eq!(parse_mac("aa-bb-cc-00-11-22").unwrap(), expected);
        assert_eq!(parse_mac("aabbcc001122").unwrap(), expected);
        assert_eq!(parse_mac("AABBCC001122").unwrap(), expected);
    }

    #[test]
    fn rejects_bad_mac() {
        assert!(matches!(parse_mac(""), Err(Error::InvalidMac(_))));
        assert!(matches!(parse_mac("aabbcc0011"), Err(Error::InvalidMac(_))));
        assert!(matches!(
            parse_mac("zzbbcc001122"),
            Err(Error::InvalidMac(_))
        ));
    }
}

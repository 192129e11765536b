use std::sync::{Arc, Mutex};

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use electrolux_ac::{
    AcMode, ElectroluxClient, Error, FanSpeed, HvacMode, MessageLogMode, Result, Transport,
};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

const DEFAULT_KEY: [u8; 16] = [
    0x09, 0x76, 0x28, 0x34, 0x3f, 0xe9, 0x9e, 0x23, 0x76, 0x5c, 0x15, 0x13, 0xac, 0xcf, 0x8b,
    0x02,
];
const IV: [u8; 16] = [
    0x56, 0x2e, 0x17, 0x99, 0x6d, 0x09, 0x3d, 0x28, 0xdd, 0xb3, 0xba, 0x69, 0x5a, 0x2e, 0x6f,
    0x58,
];
const SESSION_KEY: [u8; 16] = [0x42; 16];
const DEVICE_ID: [u8; 4] = [0x01, 0x02, 0x03, 0x04];

fn encrypt(key: &[u8; 16], data: &[u8]) -> Vec<u8> {
    let mut padded = data.to_vec();
    while padded.len() % 16 != 0 {
        padded.push(0);
    }
    Aes128CbcEnc::new(key.into(), (&IV).into()).encrypt_padded_vec_mut::<NoPadding>(&padded)
}

fn decrypt(key: &[u8; 16], data: &[u8]) -> Vec<u8> {
    Aes128CbcDec::new(key.into(), (&IV).into())
        .decrypt_padded_vec_mut::<NoPadding>(data)
        .expect("test ciphertext is block aligned")
}

fn checksum(seed: u16, bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(seed, |acc, b| acc.wrapping_add(u16::from(*b)))
}

/// Inner frame as the firmware sends it back: payload at offset 0x0E.
fn response_frame(command: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0u8; 0x0e];
    frame[0x00..0x02].copy_from_slice(&command.to_le_bytes());
    frame[0x02..0x06].copy_from_slice(&[0xa5, 0xa5, 0x5a, 0x5a]);
    frame[0x08] = if payload.len() <= 2 { 0x01 } else { 0x02 };
    frame[0x09] = 0x0b;
    frame[0x0a..0x0c].copy_from_slice(&(payload.len() as u16).to_le_bytes());
    frame.extend_from_slice(payload);
    let ck = checksum(0xc0ad, &frame[0x08..]);
    frame[0x06..0x08].copy_from_slice(&ck.to_le_bytes());
    frame
}

fn outer_response(error: i16, encrypted_body: &[u8]) -> Vec<u8> {
    let mut packet = vec![0u8; 0x38];
    packet[0x22..0x24].copy_from_slice(&error.to_le_bytes());
    packet.extend_from_slice(encrypted_body);
    // checksum bytes at 0x20 are still zero here, so a plain sum works
    let ck = checksum(0xbeaf, &packet);
    packet[0x20..0x22].copy_from_slice(&ck.to_le_bytes());
    packet
}

#[derive(Default)]
struct DeviceBehavior {
    reject_auth: bool,
    error_code: Option<i16>,
    time_out: bool,
    corrupt_inner_checksum: bool,
}

/// In-process stand-in for the AC: decrypts requests, answers with
/// properly framed and encrypted responses, and records what it saw.
struct FakeDevice {
    status: serde_json::Value,
    behavior: DeviceBehavior,
    exchanges: Arc<Mutex<usize>>,
    commands: Arc<Mutex<Vec<(u16, String)>>>,
    authed: bool,
}

impl FakeDevice {
    fn new(status: serde_json::Value) -> Self {
        Self {
            status,
            behavior: DeviceBehavior::default(),
            exchanges: Arc::new(Mutex::new(0)),
            commands: Arc::new(Mutex::new(Vec::new())),
            authed: false,
        }
    }

    fn key(&self) -> [u8; 16] {
        if self.authed { SESSION_KEY } else { DEFAULT_KEY }
    }
}

impl Transport for FakeDevice {
    fn exchange(&mut self, packet: &[u8]) -> Result<Vec<u8>> {
        *self.exchanges.lock().unwrap() += 1;
        if self.behavior.time_out {
            return Err(Error::Timeout);
        }

        assert!(packet.len() >= 0x38, "request shorter than packet header");
        let packet_type = u16::from_le_bytes([packet[0x26], packet[0x27]]);

        if packet_type == 0x65 {
            if self.behavior.reject_auth {
                return Ok(outer_response(-7, &[]));
            }
            let mut body = vec![0u8; 0x14];
            body[0x00..0x04].copy_from_slice(&DEVICE_ID);
            body[0x04..0x14].copy_from_slice(&SESSION_KEY);
            let resp = outer_response(0, &encrypt(&DEFAULT_KEY, &body));
            self.authed = true;
            return Ok(resp);
        }

        assert_eq!(packet_type, 0x6a, "unexpected packet type");
        let frame = decrypt(&self.key(), &packet[0x38..]);

        let command = u16::from_le_bytes([frame[0x00], frame[0x01]]);
        let declared = u16::from_le_bytes([frame[0x06], frame[0x07]]);
        assert_eq!(
            checksum(0xc0ad, &frame[0x08..]),
            declared,
            "request frame checksum invalid"
        );
        let len = u16::from_le_bytes([frame[0x0a], frame[0x0b]]) as usize;
        let payload = String::from_utf8(frame[0x0d..0x0d + len].to_vec()).unwrap();
        self.commands.lock().unwrap().push((command, payload));

        if let Some(code) = self.behavior.error_code {
            return Ok(outer_response(code, &[]));
        }

        let reply = if command == 0x0e {
            self.status.to_string()
        } else {
            "{}".to_string()
        };
        let mut frame = response_frame(command, reply.as_bytes());
        if self.behavior.corrupt_inner_checksum {
            frame[0x06] ^= 0xff;
        }
        Ok(outer_response(0, &encrypt(&self.key(), &frame)))
    }
}

fn default_status() -> serde_json::Value {
    serde_json::json!({
        "sn": "EL123456",
        "ac_pwr": 1,
        "ac_mode": 0,
        "ac_mark": 2,
        "ac_vdir": 0,
        "scrdisp": 1,
        "ac_slp": 0,
        "mldprf": 0,
        "temp": 22,
        "envtemp": 25.5
    })
}

struct Harness {
    exchanges: Arc<Mutex<usize>>,
    commands: Arc<Mutex<Vec<(u16, String)>>>,
}

fn client_with(device: FakeDevice) -> (ElectroluxClient, Harness) {
    let harness = Harness {
        exchanges: device.exchanges.clone(),
        commands: device.commands.clone(),
    };
    let client = ElectroluxClient::builder("192.168.1.50", "aa:bb:cc:dd:ee:ff")
        .serial("EL123456")
        .transport(Box::new(device))
        .build()
        .expect("builder should succeed");
    (client, harness)
}

#[test]
fn authenticate_establishes_session() {
    let (mut client, harness) = client_with(FakeDevice::new(default_status()));
    assert!(!client.is_authenticated());
    client.authenticate().expect("handshake should succeed");
    assert!(client.is_authenticated());
    assert_eq!(*harness.exchanges.lock().unwrap(), 1);
}

#[test]
fn command_before_auth_fails_without_network_call() {
    let (mut client, harness) = client_with(FakeDevice::new(default_status()));
    let err = client.set_power(true).unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated), "got {err:?}");
    assert_eq!(*harness.exchanges.lock().unwrap(), 0);
}

#[test]
fn rejected_auth_leaves_client_unauthenticated() {
    let mut device = FakeDevice::new(default_status());
    device.behavior.reject_auth = true;
    let (mut client, harness) = client_with(device);

    let err = client.authenticate().unwrap_err();
    assert!(matches!(err, Error::Auth), "got {err:?}");
    assert!(!client.is_authenticated());

    let err = client.get_status().unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated), "got {err:?}");
    assert_eq!(*harness.exchanges.lock().unwrap(), 1);
}

#[test]
fn get_status_end_to_end() {
    let (mut client, _harness) = client_with(FakeDevice::new(default_status()));
    client.authenticate().unwrap();

    let status = client.get_status().unwrap();
    assert_eq!(status.sn, "EL123456");
    assert_eq!(status.ac_pwr, 1);
    assert_eq!(status.envtemp, 25.5);
}

#[test]
fn poll_state_maps_running_cool() {
    let (mut client, _harness) = client_with(FakeDevice::new(default_status()));
    client.authenticate().unwrap();

    let state = client.poll_state().unwrap();
    assert!(state.available);
    assert_eq!(state.hvac_mode, HvacMode::Cool);
    assert_eq!(state.target_temperature, 22.0);
    assert_eq!(state.current_temperature, 25.5);
    assert!(state.led_on);
}

#[test]
fn poll_state_serial_mismatch_is_unavailable() {
    let mut status = default_status();
    status["sn"] = serde_json::json!("OTHER");
    let (mut client, _harness) = client_with(FakeDevice::new(status));
    client.authenticate().unwrap();

    let state = client.poll_state().unwrap();
    assert!(!state.available);
}

#[test]
fn device_error_code_propagates() {
    let mut device = FakeDevice::new(default_status());
    device.behavior.error_code = Some(-1);
    let (mut client, _harness) = client_with(device);
    client.authenticate().unwrap();

    let err = client.get_status().unwrap_err();
    assert!(matches!(err, Error::Device(-1)), "got {err:?}");
}

#[test]
fn timeout_is_distinct_from_device_error() {
    let mut device = FakeDevice::new(default_status());
    device.behavior.time_out = true;
    let (mut client, _harness) = client_with(device);

    let err = client.authenticate().unwrap_err();
    assert!(matches!(err, Error::Timeout), "got {err:?}");
}

#[test]
fn corrupted_inner_frame_fails_checksum() {
    let mut device = FakeDevice::new(default_status());
    device.behavior.corrupt_inner_checksum = true;
    let (mut client, _harness) = client_with(device);
    client.authenticate().unwrap();

    let err = client.get_status().unwrap_err();
    assert!(matches!(err, Error::Checksum { .. }), "got {err:?}");
}

#[test]
fn setters_put_expected_payloads_on_the_wire() {
    let (mut client, harness) = client_with(FakeDevice::new(default_status()));
    client.authenticate().unwrap();

    client.set_temperature(999).unwrap();
    client.set_temperature(-5).unwrap();
    client.set_power(true).unwrap();
    client.set_mode(AcMode::Heat8).unwrap();
    client.set_fan(FanSpeed::Quiet).unwrap();
    client.set_swing(true).unwrap();
    client.set_led(false).unwrap();
    client.set_sleep(true).unwrap();
    client.set_self_clean(true).unwrap();
    client.set_timer(true, 25, 75).unwrap();
    client.clear_timer().unwrap();

    let commands = harness.commands.lock().unwrap();
    let expected: Vec<(u16, &str)> = vec![
        (0x17, r#"{"temp":40}"#),
        (0x17, r#"{"temp":0}"#),
        (0x18, r#"{"ac_pwr":1}"#),
        (0x19, r#"{"ac_mode":6}"#),
        (0x19, r#"{"ac_mark":5}"#),
        (0x19, r#"{"ac_vdir":1}"#),
        (0x19, r#"{"scrdisp":0}"#),
        (0x18, r#"{"ac_slp":1}"#),
        (0x18, r#"{"mldprf":1}"#),
        (0x1f, r#"{"timer":"2359|01"}"#),
        (0x1f, r#"{"timer":"0000|00"}"#),
    ];
    assert_eq!(commands.len(), expected.len());
    for ((cmd, payload), (want_cmd, want_payload)) in commands.iter().zip(expected) {
        assert_eq!(*cmd, want_cmd);
        assert_eq!(payload, want_payload);
    }
}

#[test]
fn apply_hvac_mode_out_of_off_powers_on_first() {
    let (mut client, harness) = client_with(FakeDevice::new(default_status()));
    client.authenticate().unwrap();

    client.apply_hvac_mode(HvacMode::Off, HvacMode::Cool).unwrap();

    let commands = harness.commands.lock().unwrap();
    assert_eq!(commands[0], (0x18, r#"{"ac_pwr":1}"#.to_string()));
    assert_eq!(commands[1], (0x19, r#"{"ac_mode":0}"#.to_string()));
}

#[test]
fn apply_hvac_mode_into_off_only_cuts_power() {
    let (mut client, harness) = client_with(FakeDevice::new(default_status()));
    client.authenticate().unwrap();

    client.apply_hvac_mode(HvacMode::Heat, HvacMode::Off).unwrap();

    let commands = harness.commands.lock().unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0], (0x18, r#"{"ac_pwr":0}"#.to_string()));
}

#[test]
fn message_log_records_exchanges() {
    let log = tempfile::NamedTempFile::new().unwrap();
    let path = log.path().to_str().unwrap().to_string();

    let device = FakeDevice::new(default_status());
    let mut client = ElectroluxClient::builder("192.168.1.50", "aabbccddeeff")
        .serial("EL123456")
        .message_log(MessageLogMode::Full, &path)
        .transport(Box::new(device))
        .build()
        .unwrap();

    client.authenticate().unwrap();
    client.get_status().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert!(lines.len() >= 3, "expected auth + req + resp entries");
    assert!(contents.contains(r#""dir":"auth""#));
    assert!(contents.contains(r#""dir":"req""#));
    assert!(contents.contains(r#""dir":"resp""#));
    assert!(contents.contains("EL123456"));
}

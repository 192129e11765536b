use serde_json::json;

use crate::{Error, Result};

/// Outer packet type carrying an encrypted command frame.
pub(crate) const PACKET_COMMAND: u16 = 0x6a;
/// Outer packet type for the authentication handshake.
pub(crate) const PACKET_AUTH: u16 = 0x65;

// Inner command codes understood by the AC firmware.
pub(crate) const CMD_GET_STATUS: u16 = 0x0e;
pub(crate) const CMD_SET_TEMP: u16 = 0x17;
pub(crate) const CMD_SET_POWER: u16 = 0x18;
pub(crate) const CMD_SET_SETTING: u16 = 0x19;
pub(crate) const CMD_SET_TIMER: u16 = 0x1f;

/// Product code reported by this AC model.
pub const DEVICE_TYPE: u16 = 0x4f9b;

pub const ABSOLUTE_MIN_TEMP: i32 = 0;
pub const ABSOLUTE_MAX_TEMP: i32 = 40;

const FRAME_MAGIC: [u8; 4] = [0xa5, 0xa5, 0x5a, 0x5a];
const FRAME_CHECKSUM_SEED: u16 = 0xc0ad;
const FRAME_HEADER_LEN: usize = 0x0d;
// Response frames carry one extra header byte before the payload.
const RESPONSE_PAYLOAD_OFFSET: usize = 0x0e;

const PACKET_MAGIC: [u8; 8] = [0x5a, 0xa5, 0xaa, 0x55, 0x5a, 0xa5, 0xaa, 0x55];
const PACKET_CHECKSUM_SEED: u16 = 0xbeaf;
const PACKET_HEADER_LEN: usize = 0x38;
const PACKET_CHECKSUM_OFFSET: usize = 0x20;
const PACKET_ERROR_OFFSET: usize = 0x22;
const PACKET_DEVTYPE_OFFSET: usize = 0x24;
const PACKET_TYPE_OFFSET: usize = 0x26;
const PACKET_COUNT_OFFSET: usize = 0x28;
const PACKET_MAC_OFFSET: usize = 0x2a;
const PACKET_ID_OFFSET: usize = 0x30;
const PACKET_PAYLOAD_CHECKSUM_OFFSET: usize = 0x34;

/// Error code the device returns when it does not accept our key.
const ERR_AUTH_REJECTED: i16 = -7;

/// Additive 16-bit checksum with wraparound, used by both frame layers
/// (seed 0xC0AD inner, 0xBEAF outer).
pub(crate) fn checksum(seed: u16, bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(seed, |acc, b| acc.wrapping_add(u16::from(*b)))
}

/// Build an inner command frame: 13-byte header followed by the payload.
/// The result is what gets encrypted into the outer packet body.
pub(crate) fn encode_frame(command: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0u8; FRAME_HEADER_LEN];
    frame[0x00..0x02].copy_from_slice(&command.to_le_bytes());
    frame[0x02..0x06].copy_from_slice(&FRAME_MAGIC);
    frame[0x08] = if payload.len() <= 2 { 0x01 } else { 0x02 };
    frame[0x09] = 0x0b;
    frame[0x0a..0x0c].copy_from_slice(&(payload.len() as u16).to_le_bytes());
    frame.extend_from_slice(payload);

    let ck = checksum(FRAME_CHECKSUM_SEED, &frame[0x08..]);
    frame[0x06..0x08].copy_from_slice(&ck.to_le_bytes());
    frame
}

/// Validate and extract the payload of a decrypted response frame.
///
/// The checksum covers everything from offset 0x08, including any cipher
/// padding; zero pad bytes do not change the additive sum. The declared
/// length field trims that padding off the returned payload.
pub(crate) fn decode_frame(frame: &[u8]) -> Result<Vec<u8>> {
    if frame.len() < RESPONSE_PAYLOAD_OFFSET {
        return Err(Error::Protocol(format!(
            "response frame too short: {} bytes",
            frame.len()
        )));
    }

    let expected = u16::from_le_bytes([frame[0x06], frame[0x07]]);
    let computed = checksum(FRAME_CHECKSUM_SEED, &frame[0x08..]);
    if computed != expected {
        return Err(Error::Checksum { expected, computed });
    }

    let len = u16::from_le_bytes([frame[0x0a], frame[0x0b]]) as usize;
    let end = RESPONSE_PAYLOAD_OFFSET + len;
    if frame.len() < end {
        return Err(Error::Protocol(format!(
            "response payload truncated: declared {len}, available {}",
            frame.len() - RESPONSE_PAYLOAD_OFFSET
        )));
    }

    Ok(frame[RESPONSE_PAYLOAD_OFFSET..end].to_vec())
}

/// Assemble the outer 0x38-byte packet around an already-encrypted body.
/// `payload` is the plaintext body, needed only for its checksum field.
pub(crate) fn build_packet(
    device_type: u16,
    packet_type: u16,
    count: u16,
    mac: [u8; 6],
    device_id: [u8; 4],
    payload: &[u8],
    encrypted: &[u8],
) -> Vec<u8> {
    let mut packet = vec![0u8; PACKET_HEADER_LEN];
    packet[0x00..0x08].copy_from_slice(&PACKET_MAGIC);
    packet[PACKET_DEVTYPE_OFFSET..PACKET_DEVTYPE_OFFSET + 2]
        .copy_from_slice(&device_type.to_le_bytes());
    packet[PACKET_TYPE_OFFSET..PACKET_TYPE_OFFSET + 2]
        .copy_from_slice(&packet_type.to_le_bytes());
    packet[PACKET_COUNT_OFFSET..PACKET_COUNT_OFFSET + 2].copy_from_slice(&count.to_le_bytes());
    for (i, b) in mac.iter().rev().enumerate() {
        packet[PACKET_MAC_OFFSET + i] = *b;
    }
    packet[PACKET_ID_OFFSET..PACKET_ID_OFFSET + 4].copy_from_slice(&device_id);

    let payload_ck = checksum(PACKET_CHECKSUM_SEED, payload);
    packet[PACKET_PAYLOAD_CHECKSUM_OFFSET..PACKET_PAYLOAD_CHECKSUM_OFFSET + 2]
        .copy_from_slice(&payload_ck.to_le_bytes());

    packet.extend_from_slice(encrypted);

    let packet_ck = checksum(PACKET_CHECKSUM_SEED, &packet);
    packet[PACKET_CHECKSUM_OFFSET..PACKET_CHECKSUM_OFFSET + 2]
        .copy_from_slice(&packet_ck.to_le_bytes());
    packet
}

/// Validate an outer response packet: length, whole-packet checksum, then
/// the device error code. The error code is checked before any decryption;
/// a nonzero value means the device rejected the request outright.
pub(crate) fn check_packet(packet: &[u8]) -> Result<()> {
    if packet.len() < PACKET_HEADER_LEN {
        return Err(Error::Protocol(format!(
            "response packet too short: {} bytes",
            packet.len()
        )));
    }

    let expected = u16::from_le_bytes([
        packet[PACKET_CHECKSUM_OFFSET],
        packet[PACKET_CHECKSUM_OFFSET + 1],
    ]);
    // The stored checksum bytes count as zero in the sum.
    let computed = packet
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != PACKET_CHECKSUM_OFFSET && *i != PACKET_CHECKSUM_OFFSET + 1)
        .fold(PACKET_CHECKSUM_SEED, |acc, (_, b)| {
            acc.wrapping_add(u16::from(*b))
        });
    if computed != expected {
        return Err(Error::Checksum { expected, computed });
    }

    let code = i16::from_le_bytes([
        packet[PACKET_ERROR_OFFSET],
        packet[PACKET_ERROR_OFFSET + 1],
    ]);
    match code {
        0 => Ok(()),
        ERR_AUTH_REJECTED => Err(Error::Auth),
        _ => Err(Error::Device(code)),
    }
}

/// Encrypted body of an outer response packet. Callers must have run
/// `check_packet` first.
pub(crate) fn packet_body(packet: &[u8]) -> &[u8] {
    &packet[PACKET_HEADER_LEN..]
}

/// Fixed plaintext template sent during the authentication handshake,
/// encrypted with the vendor default key.
pub(crate) fn auth_payload() -> [u8; 0x50] {
    let mut payload = [0u8; 0x50];
    payload[0x04..0x14].fill(0x31);
    payload[0x1e] = 0x01;
    payload[0x2d] = 0x01;
    payload[0x30..0x36].copy_from_slice(b"Test 1");
    payload
}

pub(crate) fn status_payload() -> Vec<u8> {
    b"{}".to_vec()
}

pub(crate) fn temp_payload(celsius: i32) -> Vec<u8> {
    let celsius = celsius.clamp(ABSOLUTE_MIN_TEMP, ABSOLUTE_MAX_TEMP);
    json!({ "temp": celsius }).to_string().into_bytes()
}

pub(crate) fn power_payload(on: bool) -> Vec<u8> {
    json!({ "ac_pwr": u8::from(on) }).to_string().into_bytes()
}

pub(crate) fn mode_payload(code: u8) -> Vec<u8> {
    json!({ "ac_mode": code }).to_string().into_bytes()
}

pub(crate) fn fan_payload(code: u8) -> Vec<u8> {
    json!({ "ac_mark": code }).to_string().into_bytes()
}

pub(crate) fn swing_payload(on: bool) -> Vec<u8> {
    json!({ "ac_vdir": u8::from(on) }).to_string().into_bytes()
}

pub(crate) fn led_payload(on: bool) -> Vec<u8> {
    json!({ "scrdisp": u8::from(on) }).to_string().into_bytes()
}

pub(crate) fn sleep_payload(on: bool) -> Vec<u8> {
    json!({ "ac_slp": u8::from(on) }).to_string().into_bytes()
}

pub(crate) fn self_clean_payload(on: bool) -> Vec<u8> {
    json!({ "mldprf": u8::from(on) }).to_string().into_bytes()
}

pub(crate) fn timer_payload(enabled: bool, hours: u8, minutes: u8) -> Vec<u8> {
    let hours = hours.min(23);
    let minutes = minutes.min(59);
    let timer = format!("{hours:02}{minutes:02}|0{}", u8::from(enabled));
    json!({ "timer": timer }).to_string().into_bytes()
}

//! Application CAN message catalog.
//!
//! Two fixed 8-byte messages make up the board's application traffic. Both
//! pack four 14-bit signed signals plus one byte of auxiliary data into
//! exactly 64 bits, most significant bit first:
//!
//! * **Motor control** (bus → board, id `0x210`):
//!   `rpm1:14 | rpm2:14 | current1:14 | current2:14 | mode1:4 | mode2:4`
//! * **Motor status** (board → bus, id `0x310`):
//!   `rpm1:14 | current1:14 | rpm2:14 | current2:14 | status:8`
//!
//! A 14-bit signed field represents `[-8192, 8191]`; encoding rejects
//! anything outside that window rather than truncating.

use torqbus_hal::CanFrame;

/// Identifier of the incoming motor-control message.
pub const MOTOR_CONTROL_ID: u32 = 0x210;
/// Expected data length of the motor-control message.
pub const MOTOR_CONTROL_DLC: u8 = 8;

/// Identifier of the outgoing motor-status message.
pub const MOTOR_STATUS_ID: u32 = 0x310;
/// Data length of the motor-status message.
pub const MOTOR_STATUS_DLC: u8 = 8;

/// Largest value a 14-bit signal field can carry.
pub const SIGNAL_MAX: i32 = 8191;
/// Smallest value a 14-bit signal field can carry.
pub const SIGNAL_MIN: i32 = -8192;

/// Whether a value fits a 14-bit signed signal field.
pub fn in_signal_range(value: i32) -> bool {
    (SIGNAL_MIN..=SIGNAL_MAX).contains(&value)
}

fn pack14(value: i32) -> u64 {
    (value as u64) & 0x3FFF
}

fn unpack14(raw: u64) -> i32 {
    // Sign-extend the 14-bit field.
    (((raw << 50) as i64) >> 50) as i32
}

/// Decoded motor-control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorControl {
    /// Requested RPM setpoint for motor 1.
    pub rpm1: i32,
    /// Requested RPM setpoint for motor 2.
    pub rpm2: i32,
    /// Requested current setpoint for motor 1, in milliamperes.
    pub current1: i32,
    /// Requested current setpoint for motor 2, in milliamperes.
    pub current2: i32,
    /// Requested operating mode for motor 1 (4-bit code).
    pub mode1: u8,
    /// Requested operating mode for motor 2 (4-bit code).
    pub mode2: u8,
}

impl MotorControl {
    /// Decode a motor-control frame.
    ///
    /// Returns `None` when the identifier or length does not match the
    /// catalog entry.
    pub fn decode(frame: &CanFrame) -> Option<MotorControl> {
        if frame.id != MOTOR_CONTROL_ID || frame.dlc != MOTOR_CONTROL_DLC {
            return None;
        }
        let bits = u64::from_be_bytes(frame.data);
        Some(MotorControl {
            rpm1: unpack14(bits >> 50),
            rpm2: unpack14(bits >> 36),
            current1: unpack14(bits >> 22),
            current2: unpack14(bits >> 8),
            mode1: ((bits >> 4) & 0xF) as u8,
            mode2: (bits & 0xF) as u8,
        })
    }

    /// Encode this message into a frame.
    ///
    /// Returns `None` when any signal is outside its encodable range.
    pub fn encode(&self) -> Option<CanFrame> {
        let signals = [self.rpm1, self.rpm2, self.current1, self.current2];
        if !signals.iter().copied().all(in_signal_range) {
            return None;
        }
        if self.mode1 > 0xF || self.mode2 > 0xF {
            return None;
        }
        let bits = pack14(self.rpm1) << 50
            | pack14(self.rpm2) << 36
            | pack14(self.current1) << 22
            | pack14(self.current2) << 8
            | u64::from(self.mode1) << 4
            | u64::from(self.mode2);
        Some(CanFrame {
            id: MOTOR_CONTROL_ID,
            dlc: MOTOR_CONTROL_DLC,
            data: bits.to_be_bytes(),
        })
    }
}

/// Encode the outgoing motor-status message.
///
/// Returns `None` when any of the four measurement values is outside its
/// 14-bit signal range; nothing is partially encoded in that case.
pub fn encode_motor_status(
    rpm1: i32,
    current1: i32,
    rpm2: i32,
    current2: i32,
    status: u8,
) -> Option<CanFrame> {
    let signals = [rpm1, current1, rpm2, current2];
    if !signals.iter().copied().all(in_signal_range) {
        return None;
    }
    let bits = pack14(rpm1) << 50
        | pack14(current1) << 36
        | pack14(rpm2) << 22
        | pack14(current2) << 8
        | u64::from(status);
    Some(CanFrame {
        id: MOTOR_STATUS_ID,
        dlc: MOTOR_STATUS_DLC,
        data: bits.to_be_bytes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_round_trip() {
        let msg = MotorControl {
            rpm1: 1500,
            rpm2: -1500,
            current1: 820,
            current2: -1,
            mode1: 1,
            mode2: 2,
        };
        let frame = msg.encode().unwrap();
        assert_eq!(frame.id, MOTOR_CONTROL_ID);
        assert_eq!(frame.dlc, MOTOR_CONTROL_DLC);
        assert_eq!(MotorControl::decode(&frame), Some(msg));
    }

    #[test]
    fn test_control_extreme_values() {
        let msg = MotorControl {
            rpm1: SIGNAL_MAX,
            rpm2: SIGNAL_MIN,
            current1: SIGNAL_MIN,
            current2: SIGNAL_MAX,
            mode1: 0xF,
            mode2: 0,
        };
        let frame = msg.encode().unwrap();
        assert_eq!(MotorControl::decode(&frame), Some(msg));
    }

    #[test]
    fn test_control_encode_rejects_out_of_range() {
        let msg = MotorControl {
            rpm1: SIGNAL_MAX + 1,
            rpm2: 0,
            current1: 0,
            current2: 0,
            mode1: 0,
            mode2: 0,
        };
        assert!(msg.encode().is_none());
    }

    #[test]
    fn test_control_decode_rejects_wrong_id_or_dlc() {
        let frame = MotorControl {
            rpm1: 1,
            rpm2: 0,
            current1: 0,
            current2: 0,
            mode1: 0,
            mode2: 0,
        }
        .encode()
        .unwrap();

        let wrong_id = CanFrame { id: 0x211, ..frame };
        assert!(MotorControl::decode(&wrong_id).is_none());

        let wrong_dlc = CanFrame { dlc: 7, ..frame };
        assert!(MotorControl::decode(&wrong_dlc).is_none());
    }

    #[test]
    fn test_status_encodes_all_fields() {
        let frame = encode_motor_status(100, -200, 300, -400, 0x21).unwrap();
        assert_eq!(frame.id, MOTOR_STATUS_ID);
        assert_eq!(frame.dlc, MOTOR_STATUS_DLC);

        let bits = u64::from_be_bytes(frame.data);
        assert_eq!(unpack14(bits >> 50), 100);
        assert_eq!(unpack14(bits >> 36), -200);
        assert_eq!(unpack14(bits >> 22), 300);
        assert_eq!(unpack14(bits >> 8), -400);
        assert_eq!((bits & 0xFF) as u8, 0x21);
    }

    #[test]
    fn test_status_rejects_unrepresentable_values() {
        // A 20000 RPM or 10000 mA reading does not fit a 14-bit field.
        assert!(encode_motor_status(20_000, 0, 0, 0, 0).is_none());
        assert!(encode_motor_status(0, 10_000, 0, 0, 0).is_none());
        assert!(encode_motor_status(0, 0, -20_000, 0, 0).is_none());
        assert!(encode_motor_status(0, 0, 0, SIGNAL_MIN - 1, 0).is_none());
    }
}

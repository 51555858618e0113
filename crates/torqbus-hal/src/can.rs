//! CAN frame type and transport trait.

use crate::error::{FrameError, TransportError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A raw classic CAN frame: numeric identifier, data length code and up to
/// 8 payload bytes.
///
/// Frames are plain value types; the signal handler copies them into its
/// bounded queue, so a frame handed to a listener does not need to outlive
/// the call.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    /// Message identifier.
    pub id: u32,
    /// Data length code, 0 to 8.
    pub dlc: u8,
    /// Payload storage; only the first `dlc` bytes are meaningful.
    pub data: [u8; 8],
}

impl CanFrame {
    /// Build a frame from an identifier and payload slice.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::PayloadTooLong`] when the payload exceeds
    /// 8 bytes.
    pub fn new(id: u32, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > 8 {
            return Err(FrameError::PayloadTooLong(payload.len()));
        }
        let mut data = [0u8; 8];
        data[..payload.len()].copy_from_slice(payload);
        Ok(CanFrame {
            id,
            dlc: payload.len() as u8,
            data,
        })
    }

    /// The valid portion of the payload.
    pub fn payload(&self) -> &[u8] {
        &self.data[..usize::from(self.dlc.min(8))]
    }
}

/// Outgoing side of the CAN interface.
pub trait CanTransport {
    /// Queue a frame for transmission.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the frame could not be queued;
    /// the caller decides whether that matters.
    fn transmit(&mut self, frame: &CanFrame) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_copies_payload_and_sets_dlc() {
        let frame = CanFrame::new(0x123, &[1, 2, 3]).unwrap();
        assert_eq!(frame.id, 0x123);
        assert_eq!(frame.dlc, 3);
        assert_eq!(frame.payload(), &[1, 2, 3]);
        assert_eq!(frame.data[3..], [0; 5]);
    }

    #[test]
    fn test_new_rejects_oversized_payload() {
        let result = CanFrame::new(0x123, &[0; 9]);
        assert_eq!(result, Err(FrameError::PayloadTooLong(9)));
    }

    #[test]
    fn test_empty_payload_is_valid() {
        let frame = CanFrame::new(0x7FF, &[]).unwrap();
        assert_eq!(frame.dlc, 0);
        assert!(frame.payload().is_empty());
    }
}

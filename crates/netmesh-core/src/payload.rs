//! The in-flight message record that travels an operator's routing table.

use crate::error::SerializeError;
use crate::id::OperatorId;
use crate::serializer::{write_i32, write_u16, write_u32, Cursor};

/// Wire tag for the payload state block (see design document §4.8).
const PAYLOAD_WIRE_TAG: u16 = 0x0000;

/// A discrete packet traversing an operator's routing table.
///
/// `current_operator_id` names the operator whose routing table is being
/// walked; it never changes while the payload is in flight. Only
/// `distance_traveled` advances, one unit per step, until the payload falls
/// off the end of the routing table (or into a dead slot) and is
/// deactivated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payload {
    /// The data value being transmitted.
    pub message: i32,
    /// ID of the operator whose routing table this payload is traversing.
    pub current_operator_id: OperatorId,
    /// Current distance index into that operator's routing table.
    pub distance_traveled: u16,
    /// Whether the payload is still traversing.
    pub active: bool,
}

impl Payload {
    /// Construct a payload starting its journey at distance 0, active.
    pub fn new(message: i32, current_operator_id: OperatorId) -> Self {
        Self {
            message,
            current_operator_id,
            distance_traveled: 0,
            active: true,
        }
    }

    /// Encode this payload's state-save block (type tag, operator id,
    /// message, distance). Does not include the 1-byte length prefix used
    /// by [`crate::command`]'s framing — callers that need it wrap this
    /// output themselves (see `netmesh-engine`'s step-state format).
    pub fn encode(&self, buf: &mut Vec<u8>) {
        write_u16(buf, PAYLOAD_WIRE_TAG);
        write_u32(buf, self.current_operator_id.0);
        write_i32(buf, self.message);
        write_u16(buf, self.distance_traveled);
    }

    /// Decode a payload-state block written by [`Payload::encode`].
    ///
    /// Loaded payloads are always marked active, matching the state-save
    /// format's "only active payloads are saved" rule.
    pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self, SerializeError> {
        let tag = cursor.read_u16()?;
        if tag != PAYLOAD_WIRE_TAG {
            return Err(SerializeError::Corrupt {
                reason: format!("unexpected payload wire tag {tag}"),
            });
        }
        let current_operator_id = OperatorId(cursor.read_u32()?);
        let message = cursor.read_i32()?;
        let distance_traveled = cursor.read_u16()?;
        Ok(Self {
            message,
            current_operator_id,
            distance_traveled,
            active: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_payload_starts_active_at_distance_zero() {
        let p = Payload::new(42, OperatorId(7));
        assert_eq!(p.distance_traveled, 0);
        assert!(p.active);
        assert_eq!(p.message, 42);
        assert_eq!(p.current_operator_id, OperatorId(7));
    }

    #[test]
    fn encode_decode_round_trip_ignores_active_flag() {
        let mut p = Payload::new(-17, OperatorId(3));
        p.distance_traveled = 5;
        p.active = false;

        let mut buf = Vec::new();
        p.encode(&mut buf);
        let mut cursor = Cursor::new(&buf);
        let decoded = Payload::decode(&mut cursor).unwrap();
        cursor.expect_exhausted().unwrap();

        assert_eq!(decoded.message, -17);
        assert_eq!(decoded.current_operator_id, OperatorId(3));
        assert_eq!(decoded.distance_traveled, 5);
        // Loaded payloads are always marked active, regardless of the
        // in-memory state at encode time (only active payloads are saved).
        assert!(decoded.active);
    }

    #[test]
    fn decode_rejects_wrong_tag() {
        let mut buf = Vec::new();
        write_u16(&mut buf, 0x00FF);
        write_u32(&mut buf, 1);
        write_i32(&mut buf, 1);
        write_u16(&mut buf, 0);
        let mut cursor = Cursor::new(&buf);
        assert!(Payload::decode(&mut cursor).is_err());
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn encode_decode_round_trips_message_id_and_distance(
            message in any::<i32>(),
            operator_id in any::<u32>(),
            distance in any::<u16>(),
        ) {
            let mut p = Payload::new(message, OperatorId(operator_id));
            p.distance_traveled = distance;

            let mut buf = Vec::new();
            p.encode(&mut buf);
            let mut cursor = Cursor::new(&buf);
            let decoded = Payload::decode(&mut cursor).unwrap();
            cursor.expect_exhausted().unwrap();

            prop_assert_eq!(decoded.message, message);
            prop_assert_eq!(decoded.current_operator_id, OperatorId(operator_id));
            prop_assert_eq!(decoded.distance_traveled, distance);
        }
    }
}

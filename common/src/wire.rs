// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The 24 byte binary game-state frame sent on the pong socket. Network byte
//! order, four `f32`s followed by two `u32`s: `ballX, ballY, p1Y, p2Y, score1,
//! score2`. Deliberately not bincode or any other self-describing format —
//! the wire format is a fixed-size packed struct so that non-Rust clients can
//! decode it with a one-line `struct.unpack`.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor};

pub const FRAME_LEN: usize = 24;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GameStateFrame {
    pub ball_x: f32,
    pub ball_y: f32,
    pub p1_y: f32,
    pub p2_y: f32,
    pub score1: u32,
    pub score2: u32,
}

impl GameStateFrame {
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        {
            let mut cursor = Cursor::new(&mut buf[..]);
            // Unwraps are safe; writes into a fixed-size in-memory buffer never fail.
            cursor.write_f32::<BigEndian>(self.ball_x).unwrap();
            cursor.write_f32::<BigEndian>(self.ball_y).unwrap();
            cursor.write_f32::<BigEndian>(self.p1_y).unwrap();
            cursor.write_f32::<BigEndian>(self.p2_y).unwrap();
            cursor.write_u32::<BigEndian>(self.score1).unwrap();
            cursor.write_u32::<BigEndian>(self.score2).unwrap();
        }
        buf
    }

    pub fn decode(bytes: &[u8]) -> io::Result<Self> {
        if bytes.len() != FRAME_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("expected {} byte frame, got {}", FRAME_LEN, bytes.len()),
            ));
        }
        let mut cursor = Cursor::new(bytes);
        Ok(Self {
            ball_x: cursor.read_f32::<BigEndian>()?,
            ball_y: cursor.read_f32::<BigEndian>()?,
            p1_y: cursor.read_f32::<BigEndian>()?,
            p2_y: cursor.read_f32::<BigEndian>()?,
            score1: cursor.read_u32::<BigEndian>()?,
            score2: cursor.read_u32::<BigEndian>()?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip() {
        let frame = GameStateFrame {
            ball_x: 500.5,
            ball_y: 300.0,
            p1_y: 250.0,
            p2_y: 350.0,
            score1: 7,
            score2: 4,
        };
        let encoded = frame.encode();
        assert_eq!(encoded.len(), FRAME_LEN);
        let decoded = GameStateFrame::decode(&encoded).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn byte_layout_is_network_order() {
        let frame = GameStateFrame {
            ball_x: 1.0,
            ball_y: 0.0,
            p1_y: 0.0,
            p2_y: 0.0,
            score1: 1,
            score2: 0,
        };
        let encoded = frame.encode();
        // f32 1.0 in big-endian IEEE-754 is 0x3F800000.
        assert_eq!(&encoded[0..4], &[0x3F, 0x80, 0x00, 0x00]);
        // u32 1 in big-endian occupies the last 4 bytes.
        assert_eq!(&encoded[16..20], &[0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert!(GameStateFrame::decode(&[0u8; 23]).is_err());
        assert!(GameStateFrame::decode(&[0u8; 25]).is_err());
    }
}

use anyhow::Result;

// ============================================================================
// Wire Codec
// ============================================================================

// Frames are JSON when the `json` feature is on, bincode otherwise.

#[cfg(feature = "json")]
pub fn encode<T: serde::Serialize>(msg: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(msg)?)
}

#[cfg(feature = "json")]
pub fn decode<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(data)?)
}

#[cfg(all(feature = "bincode", not(feature = "json")))]
pub fn encode<T: bincode::Encode>(msg: &T) -> Result<Vec<u8>> {
    Ok(bincode::encode_to_vec(msg, bincode::config::standard())?)
}

#[cfg(all(feature = "bincode", not(feature = "json")))]
pub fn decode<T: bincode::Decode<()>>(data: &[u8]) -> Result<T> {
    let (msg, _) = bincode::decode_from_slice(data, bincode::config::standard())?;
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::*;

    #[test]
    fn enemy_move_survives_the_wire() {
        let msg = HostMessage::EnemyMove(HEnemyMove {
            id: EnemyId::new("guard-1"),
            pos: Position::new(123.5, 456.25),
            state: EnemyState::Chasing,
            target_id: Some(PlayerId::new("p1")),
            target_pos: None,
            investigation_timer: 0.0,
        });
        let bytes = encode(&msg).expect("encode");
        let back: HostMessage = decode(&bytes).expect("decode");
        assert_eq!(back, msg);
    }

    #[test]
    fn truncated_frame_is_an_error() {
        let msg = GuestMessage::PlayerMove(GPlayerMove {
            id: PlayerId::new("p1"),
            pos: Position::new(1.0, 2.0),
        });
        let bytes = encode(&msg).expect("encode");
        assert!(decode::<GuestMessage>(&bytes[..bytes.len() / 2]).is_err());
    }
}

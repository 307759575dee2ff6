//! Validation helpers for DTOs.

use validator::ValidationError;

/// Characters allowed in a room code. Excludes 0/O and 1/I so codes stay
/// unambiguous when read aloud.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Length of every room code.
pub const ROOM_CODE_LENGTH: usize = 6;

/// Validates that a room code is exactly six characters from the code
/// alphabet.
///
/// # Examples
///
/// ```ignore
/// validate_room_code("QWXZ23") // Ok
/// validate_room_code("qwxz23") // Err - lowercase
/// validate_room_code("QWX023") // Err - ambiguous character
/// ```
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != ROOM_CODE_LENGTH {
        let mut err = ValidationError::new("room_code_length");
        err.message = Some(
            format!(
                "Room code must be exactly {} characters (got {})",
                ROOM_CODE_LENGTH,
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code.bytes().all(|c| ROOM_CODE_ALPHABET.contains(&c)) {
        let mut err = ValidationError::new("room_code_format");
        err.message = Some("Room code contains characters outside the code alphabet".into());
        return Err(err);
    }

    Ok(())
}

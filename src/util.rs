/// The URL-safe base64 alphabet, used to encode database keys.
pub(crate) const BASE64_DIGITS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

pub(crate) fn base64_decode(ascii: u8) -> Option<u8> {
    /// The reverse lookup table to `BASE64_DIGITS`. If you index by an ASCII value, you
    /// either get the corresponding digit value OR `0xFF`, signalling that the
    /// character is not a valid base64 character.
    const DECODE_TABLE: [u8; 256] = {
        let mut out = [0xFF; 256];

        // If you wonder why we are using `while` instead of a more idiomatic loop:
        // const fns are still somewhat limited and do not allow `for`.
        let mut i = 0;
        while i < BASE64_DIGITS.len() {
            out[BASE64_DIGITS[i] as usize] = i as u8;
            i += 1;
        }

        out
    };
    let raw = DECODE_TABLE[ascii as usize];
    if raw == 0xFF {
        return None;
    }

    Some(raw)
}


#[cfg(test)]
mod tests {
    use super::{BASE64_DIGITS, base64_decode};

    #[test]
    fn decode_inverts_alphabet() {
        for (i, &digit) in BASE64_DIGITS.iter().enumerate() {
            assert_eq!(base64_decode(digit), Some(i as u8));
        }
    }

    #[test]
    fn decode_rejects_others() {
        for c in [b'+', b'/', b'=', b' ', b'*', 0, 0xFF] {
            assert_eq!(base64_decode(c), None);
        }
    }
}

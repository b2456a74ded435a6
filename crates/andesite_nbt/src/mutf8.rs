//! Java-compatible Modified UTF-8.
//!
//! Differs from standard UTF-8 in two ways: U+0000 encodes as the two-byte
//! sequence `C0 80` (a literal zero byte never appears inside a string), and
//! supplementary codepoints encode as a UTF-16 surrogate pair with each
//! surrogate emitted as its own 3-byte sequence, 6 bytes total.

const REPLACEMENT: char = '\u{FFFD}';

/// Encodes a string into Modified UTF-8 bytes.
pub fn encode(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for ch in s.chars() {
        let cp = ch as u32;
        match cp {
            0 => {
                out.push(0xC0);
                out.push(0x80);
            }
            0x01..=0x7F => out.push(cp as u8),
            0x80..=0x7FF => {
                out.push(0xC0 | (cp >> 6) as u8);
                out.push(0x80 | (cp & 0x3F) as u8);
            }
            0x800..=0xFFFF => {
                out.push(0xE0 | (cp >> 12) as u8);
                out.push(0x80 | ((cp >> 6) & 0x3F) as u8);
                out.push(0x80 | (cp & 0x3F) as u8);
            }
            _ => {
                // Surrogate pair, each half as a 3-byte sequence.
                let v = cp - 0x10000;
                let high = 0xD800 + (v >> 10);
                let low = 0xDC00 + (v & 0x3FF);
                for surrogate in [high, low] {
                    out.push(0xE0 | (surrogate >> 12) as u8);
                    out.push(0x80 | ((surrogate >> 6) & 0x3F) as u8);
                    out.push(0x80 | (surrogate & 0x3F) as u8);
                }
            }
        }
    }
    out
}

/// Decodes Modified UTF-8 bytes into a string. Malformed sequences decode to
/// U+FFFD rather than failing, matching lenient Java readers.
pub fn decode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < 0x80 {
            out.push(b as char);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let Some(&b2) = bytes.get(i + 1) else {
                out.push(REPLACEMENT);
                i += 1;
                continue;
            };
            if b2 & 0xC0 != 0x80 {
                out.push(REPLACEMENT);
                i += 1;
                continue;
            }
            if b == 0xC0 && b2 == 0x80 {
                out.push('\0');
            } else {
                let cp = ((b as u32 & 0x1F) << 6) | (b2 as u32 & 0x3F);
                out.push(char::from_u32(cp).unwrap_or(REPLACEMENT));
            }
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            if i + 2 >= bytes.len() {
                out.push(REPLACEMENT);
                i += 1;
                continue;
            }
            let (b2, b3) = (bytes[i + 1], bytes[i + 2]);
            if b2 & 0xC0 != 0x80 || b3 & 0xC0 != 0x80 {
                out.push(REPLACEMENT);
                i += 1;
                continue;
            }
            let unit = ((b as u32 & 0x0F) << 12) | ((b2 as u32 & 0x3F) << 6) | (b3 as u32 & 0x3F);
            if (0xD800..=0xDBFF).contains(&unit) {
                // High surrogate; expect a second 3-byte sequence for the low half.
                match decode_low_surrogate(&bytes[i + 3..]) {
                    Some(low) => {
                        let cp = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                        out.push(char::from_u32(cp).unwrap_or(REPLACEMENT));
                        i += 6;
                    }
                    None => {
                        out.push(REPLACEMENT);
                        i += 3;
                    }
                }
            } else if (0xDC00..=0xDFFF).contains(&unit) {
                // Unpaired low surrogate.
                out.push(REPLACEMENT);
                i += 3;
            } else {
                out.push(char::from_u32(unit).unwrap_or(REPLACEMENT));
                i += 3;
            }
        } else {
            out.push(REPLACEMENT);
            i += 1;
        }
    }
    out
}

fn decode_low_surrogate(bytes: &[u8]) -> Option<u32> {
    if bytes.len() < 3 {
        return None;
    }
    let (b1, b2, b3) = (bytes[0], bytes[1], bytes[2]);
    if b1 & 0xF0 != 0xE0 || b2 & 0xC0 != 0x80 || b3 & 0xC0 != 0x80 {
        return None;
    }
    let unit = ((b1 as u32 & 0x0F) << 12) | ((b2 as u32 & 0x3F) << 6) | (b3 as u32 & 0x3F);
    (0xDC00..=0xDFFF).contains(&unit).then_some(unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(encode("hello"), b"hello");
        assert_eq!(decode(b"hello"), "hello");
    }

    #[test]
    fn null_encodes_as_c0_80() {
        let encoded = encode("a\0b");
        assert_eq!(encoded, vec![b'a', 0xC0, 0x80, b'b']);
        assert_eq!(decode(&encoded), "a\0b");
    }

    #[test]
    fn bmp_uses_standard_utf8() {
        let s = "héllo ☃";
        assert_eq!(decode(&encode(s)), s);
        // Snowman is a standard 3-byte sequence.
        assert_eq!(encode("☃"), "☃".as_bytes());
    }

    #[test]
    fn supplementary_uses_six_byte_surrogates() {
        let s = "\u{1F600}"; // emoji above the BMP
        let encoded = encode(s);
        assert_eq!(encoded.len(), 6);
        assert_ne!(encoded, s.as_bytes()); // not standard 4-byte UTF-8
        assert_eq!(decode(&encoded), s);
    }

    #[test]
    fn round_trips_mixed_content() {
        let s = "plain \0 null é \u{10348} and \u{1F984} tail";
        assert_eq!(decode(&encode(s)), s);
    }

    #[test]
    fn lone_surrogate_decodes_to_replacement() {
        // A high surrogate with no low half following.
        let bytes = [0xED, 0xA0, 0x80];
        assert_eq!(decode(&bytes), "\u{FFFD}");
    }
}

//! Byte/character offset conversion.
//!
//! Regex matches and string slicing work in UTF-8 byte offsets. Serialized
//! records (and the external recognizer boundary) speak character offsets,
//! which is what downstream tools count. Notes are mostly ASCII, so the
//! fast path returns the input unchanged.

/// Convert a byte offset into a character offset within `text`.
///
/// Offsets past the end clamp to the character count. An offset inside a
/// multi-byte character resolves to that character's index.
pub fn byte_to_char(text: &str, byte: usize) -> usize {
    if text.is_ascii() {
        return byte.min(text.len());
    }
    if byte >= text.len() {
        return text.chars().count();
    }
    text.char_indices().take_while(|(b, _)| *b < byte).count()
        - usize::from(!text.is_char_boundary(byte))
}

/// Convert a character offset into a byte offset within `text`.
///
/// Returns `None` when `char_idx` is past the end of the text.
pub fn char_to_byte(text: &str, char_idx: usize) -> Option<usize> {
    if text.is_ascii() {
        return (char_idx <= text.len()).then_some(char_idx);
    }
    text.char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .nth(char_idx)
}

/// Convert a byte span to a character span.
pub fn byte_span_to_chars(text: &str, start: usize, end: usize) -> (usize, usize) {
    (byte_to_char(text, start), byte_to_char(text, end))
}

/// Convert a character span to a byte span, rejecting inverted or
/// out-of-range spans.
pub fn char_span_to_bytes(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    if start > end {
        return None;
    }
    Some((char_to_byte(text, start)?, char_to_byte(text, end)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_offsets_are_identity() {
        let text = "no vomiting";
        assert_eq!(byte_to_char(text, 3), 3);
        assert_eq!(char_to_byte(text, 3), Some(3));
        assert_eq!(char_to_byte(text, 11), Some(11));
        assert_eq!(char_to_byte(text, 12), None);
    }

    #[test]
    fn multibyte_offsets_convert() {
        // "é" is two bytes
        let text = "fièvre absente";
        let byte = text.find("absente").unwrap();
        assert_eq!(byte, 8);
        assert_eq!(byte_to_char(text, byte), 7);
        assert_eq!(char_to_byte(text, 7), Some(8));
    }

    #[test]
    fn byte_inside_char_maps_to_that_char() {
        let text = "aé";
        // byte 2 is the second byte of "é"
        assert_eq!(byte_to_char(text, 2), 1);
    }

    #[test]
    fn end_of_text_round_trips() {
        let text = "°c";
        assert_eq!(byte_to_char(text, text.len()), 2);
        assert_eq!(char_to_byte(text, 2), Some(text.len()));
    }

    #[test]
    fn inverted_char_span_rejected() {
        assert_eq!(char_span_to_bytes("headache", 5, 2), None);
        assert_eq!(char_span_to_bytes("headache", 0, 8), Some((0, 8)));
        assert_eq!(char_span_to_bytes("headache", 0, 9), None);
    }
}

//! Best-effort content type detection from leading bytes.

use crate::constants::SNIFF_LENGTH;

const OCTET_STREAM: &str = "application/octet-stream";
const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Magic prefixes checked in order
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"PK\x03\x04", "application/zip"),
    (b"BZh", "application/x-bzip2"),
    (b"\xFD7zXZ\x00", "application/x-xz"),
    (b"%PDF-", "application/pdf"),
    (b"\x89PNG\r\n\x1A\n", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
];

/// Guess the MIME type of `data` from at most its first 512 bytes.
///
/// Always returns a value: unknown binary data is
/// `application/octet-stream`, and data without control bytes (including
/// empty data) is plain text.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let head = &data[..data.len().min(SNIFF_LENGTH)];

    if let Some((_, mime)) = SIGNATURES.iter().find(|(magic, _)| head.starts_with(magic)) {
        return mime;
    }

    if head.iter().any(|&b| is_binary_byte(b)) {
        OCTET_STREAM
    } else {
        PLAIN_TEXT
    }
}

// Control bytes that never appear in text; tab, newlines, form feed and escape are allowed
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gzip() {
        assert_eq!(detect_content_type(b"\x1F\x8B\x08\x00\x00\x00"), "application/x-gzip");
    }

    #[test]
    fn test_known_signatures() {
        assert_eq!(detect_content_type(b"PK\x03\x04rest"), "application/zip");
        assert_eq!(detect_content_type(b"%PDF-1.7"), "application/pdf");
        assert_eq!(detect_content_type(b"\x89PNG\r\n\x1A\n\x00"), "image/png");
        assert_eq!(detect_content_type(b"GIF89a...."), "image/gif");
        assert_eq!(detect_content_type(b"BZh91AY&SY"), "application/x-bzip2");
    }

    #[test]
    fn test_text_and_empty() {
        assert_eq!(detect_content_type(b"Jan 1 00:00:00 host sshd[1]: ok\n"), PLAIN_TEXT);
        assert_eq!(detect_content_type(b"tab\tseparated\r\n"), PLAIN_TEXT);
        assert_eq!(detect_content_type(b""), PLAIN_TEXT);
    }

    #[test]
    fn test_binary_fallback() {
        assert_eq!(detect_content_type(b"\x00\x01\x02\x03"), OCTET_STREAM);
    }

    #[test]
    fn test_only_leading_bytes_are_inspected() {
        let mut data = vec![b'a'; SNIFF_LENGTH];
        data.push(0x00);
        assert_eq!(detect_content_type(&data), PLAIN_TEXT);
    }
}

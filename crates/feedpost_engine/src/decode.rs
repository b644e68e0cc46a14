use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use engine_logging::engine_warn;

use crate::FetchOutput;

/// Decodes a fetched page into UTF-8 text.
///
/// Priority: byte-order mark, `charset=` in the Content-Type header, then a
/// chardetng guess over the whole body. Malformed sequences become U+FFFD so
/// a stray byte never costs the rest of the page.
pub fn decode_page(output: &FetchOutput) -> String {
    let bytes = output.bytes.as_slice();
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| {
            output
                .metadata
                .content_type
                .as_deref()
                .and_then(header_charset)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        engine_warn!(
            "Page {} is not valid {}; replaced malformed bytes",
            output.metadata.final_url,
            encoding.name()
        );
    }
    text.into_owned()
}

fn header_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(&['"', '\''][..]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchMetadata;

    fn output(bytes: &[u8], content_type: Option<&str>) -> FetchOutput {
        FetchOutput {
            bytes: bytes.to_vec(),
            metadata: FetchMetadata {
                original_url: "https://example.com".to_string(),
                final_url: "https://example.com".to_string(),
                redirect_count: 0,
                content_type: content_type.map(str::to_string),
                byte_len: bytes.len() as u64,
            },
        }
    }

    #[test]
    fn header_charset_is_honoured() {
        let page = output(b"caf\xe9", Some("text/html; Charset=\"ISO-8859-1\""));
        assert_eq!(decode_page(&page), "café");
    }

    #[test]
    fn bom_wins_over_header() {
        let page = output(b"\xEF\xBB\xBFhello", Some("text/html; charset=iso-8859-1"));
        assert_eq!(decode_page(&page), "hello");
    }

    #[test]
    fn utf8_without_hints_is_detected() {
        let page = output("città".as_bytes(), None);
        assert_eq!(decode_page(&page), "città");
    }

    #[test]
    fn malformed_bytes_are_replaced_not_fatal() {
        let page = output(b"<p>caf\xE0 ok</p>", Some("text/html; charset=utf-8"));
        assert_eq!(decode_page(&page), "<p>caf\u{FFFD} ok</p>");
    }
}

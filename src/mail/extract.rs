//! Plain-text body extraction from a MIME part tree.
//!
//! Depth-first, leftmost match: the first `text/plain` leaf with a
//! non-empty decoded payload wins. HTML-only messages yield an empty body.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::warn;

use crate::mail::types::MessagePart;

/// Parts nested deeper than this are not visited.
pub const MAX_PART_DEPTH: usize = 32;

/// Gmail emits URL-safe base64, sometimes padded and sometimes not.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, thiserror::Error)]
pub enum BodyDecodeError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Decode a URL-safe base64 payload into UTF-8 text.
pub fn decode_body_data(data: &str) -> Result<String, BodyDecodeError> {
    let bytes = URL_SAFE_LENIENT.decode(data.trim())?;
    Ok(String::from_utf8(bytes)?)
}

/// Find the plain-text body of a part tree. Empty when there is none.
pub fn extract(part: &MessagePart) -> String {
    extract_at(part, 0)
}

fn extract_at(part: &MessagePart, depth: usize) -> String {
    if depth > MAX_PART_DEPTH {
        warn!(depth, "MIME tree too deep, skipping remaining parts");
        return String::new();
    }

    if part.mime_type == "text/plain" {
        let Some(data) = part.data() else {
            return String::new();
        };
        return match decode_body_data(data) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to decode text/plain part");
                String::new()
            }
        };
    }

    if let Some(children) = &part.parts {
        for child in children {
            let body = extract_at(child, depth + 1);
            if !body.is_empty() {
                return body;
            }
        }
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::types::PartBody;

    fn encode(text: &str) -> String {
        base64::engine::general_purpose::URL_SAFE.encode(text)
    }

    fn leaf(mime: &str, text: Option<&str>) -> MessagePart {
        MessagePart {
            mime_type: mime.to_string(),
            body: Some(PartBody {
                data: text.map(encode),
                size: text.map(|t| t.len() as u64).unwrap_or(0),
            }),
            ..Default::default()
        }
    }

    fn multipart(mime: &str, parts: Vec<MessagePart>) -> MessagePart {
        MessagePart {
            mime_type: mime.to_string(),
            parts: Some(parts),
            ..Default::default()
        }
    }

    #[test]
    fn plain_leaf_is_decoded() {
        let part = leaf("text/plain", Some("Bonjour, l’imprimante est en panne"));
        assert_eq!(extract(&part), "Bonjour, l’imprimante est en panne");
    }

    #[test]
    fn plain_leaf_without_payload_is_empty() {
        let part = leaf("text/plain", None);
        assert_eq!(extract(&part), "");
    }

    #[test]
    fn first_plain_leaf_in_depth_first_order_wins() {
        let tree = multipart(
            "multipart/mixed",
            vec![
                multipart(
                    "multipart/alternative",
                    vec![
                        leaf("text/html", Some("<p>html</p>")),
                        leaf("text/plain", Some("nested first")),
                    ],
                ),
                leaf("text/plain", Some("top-level second")),
            ],
        );
        assert_eq!(extract(&tree), "nested first");
    }

    #[test]
    fn empty_plain_leaf_is_skipped_for_next_sibling() {
        let tree = multipart(
            "multipart/alternative",
            vec![leaf("text/plain", None), leaf("text/plain", Some("second"))],
        );
        assert_eq!(extract(&tree), "second");
    }

    #[test]
    fn html_only_message_yields_empty() {
        let tree = multipart(
            "multipart/alternative",
            vec![leaf("text/html", Some("<p>only html</p>"))],
        );
        assert_eq!(extract(&tree), "");
    }

    #[test]
    fn undecodable_leaf_falls_through() {
        let mut bad = leaf("text/plain", None);
        bad.body = Some(PartBody {
            data: Some("!!!not base64!!!".into()),
            size: 16,
        });
        let tree = multipart(
            "multipart/mixed",
            vec![bad, leaf("text/plain", Some("fallback"))],
        );
        assert_eq!(extract(&tree), "fallback");
    }

    #[test]
    fn unpadded_payload_decodes() {
        let data = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode("ab");
        assert_eq!(decode_body_data(&data).unwrap(), "ab");
    }

    #[test]
    fn runaway_depth_is_bounded() {
        let mut tree = leaf("text/plain", Some("too deep"));
        for _ in 0..(MAX_PART_DEPTH + 5) {
            tree = multipart("multipart/mixed", vec![tree]);
        }
        assert_eq!(extract(&tree), "");
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let data = base64::engine::general_purpose::URL_SAFE.encode([0xff, 0xfe]);
        assert!(matches!(
            decode_body_data(&data),
            Err(BodyDecodeError::Utf8(_))
        ));
    }
}

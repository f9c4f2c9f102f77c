//! Searchable text built from an intercepted request.
//!
//! A request is searched through two independent channels: its header block,
//! and its URL query concatenated with the decoded body. Whatever channel
//! matched is also the evidence stored for the leak.

use lw_core::domain::query_of;
use lw_core::models::{HttpHeader, RequestBody};

/// Which part of a request a haystack was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Headers,
    QueryAndBody,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Headers => "headers",
            Self::QueryAndBody => "query+body",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `name: value` lines for every header, newline-joined.
pub fn header_haystack(headers: &[HttpHeader]) -> String {
    headers
        .iter()
        .map(|h| format!("{}: {}", h.name, h.value.as_deref().unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// URL query string followed by the decoded request body.
pub fn query_and_body_haystack(url: &str, body: Option<&RequestBody>) -> String {
    let mut haystack = query_of(url);
    if let Some(body) = body {
        haystack.push_str(&decode_body(body));
    }
    haystack
}

/// Render a captured body as text.
///
/// Form fields become `key=v1,v2&key2=v3`. Otherwise the first raw chunk is
/// decoded as UTF-8, replacing invalid sequences. Anything else is empty.
pub fn decode_body(body: &RequestBody) -> String {
    if let Some(form) = &body.form_data {
        return form
            .iter()
            .map(|(key, values)| format!("{key}={}", values.join(",")))
            .collect::<Vec<_>>()
            .join("&");
    }

    body.raw
        .as_ref()
        .and_then(|chunks| chunks.first())
        .and_then(|chunk| chunk.bytes.as_deref())
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use lw_core::models::UploadChunk;

    use super::*;

    #[test]
    fn headers_are_rendered_one_per_line() {
        let headers = vec![
            HttpHeader::new("Accept", "*/*"),
            HttpHeader::new("X-Data", "uid=123.xyz987"),
        ];
        assert_eq!(header_haystack(&headers), "Accept: */*\nX-Data: uid=123.xyz987");
    }

    #[test]
    fn header_without_value_renders_empty() {
        let headers = vec![HttpHeader {
            name: "X-Bin".to_string(),
            value: None,
        }];
        assert_eq!(header_haystack(&headers), "X-Bin: ");
        assert_eq!(header_haystack(&[]), "");
    }

    #[test]
    fn form_data_is_flattened() {
        let mut form = BTreeMap::new();
        form.insert("fbp".to_string(), vec!["fb.1.2.3".to_string()]);
        form.insert("ids".to_string(), vec!["a".to_string(), "b".to_string()]);
        let body = RequestBody {
            form_data: Some(form),
            ..Default::default()
        };
        assert_eq!(decode_body(&body), "fbp=fb.1.2.3&ids=a,b");
    }

    #[test]
    fn form_data_wins_over_raw() {
        let mut form = BTreeMap::new();
        form.insert("k".to_string(), vec!["v".to_string()]);
        let body = RequestBody {
            form_data: Some(form),
            raw: Some(vec![UploadChunk {
                bytes: Some(b"ignored".to_vec()),
                file: None,
            }]),
            error: None,
        };
        assert_eq!(decode_body(&body), "k=v");
    }

    #[test]
    fn only_first_raw_chunk_is_decoded() {
        let body = RequestBody {
            raw: Some(vec![
                UploadChunk {
                    bytes: Some(br#"{"cid":"123.456"}"#.to_vec()),
                    file: None,
                },
                UploadChunk {
                    bytes: Some(b"second".to_vec()),
                    file: None,
                },
            ]),
            ..Default::default()
        };
        assert_eq!(decode_body(&body), r#"{"cid":"123.456"}"#);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let body = RequestBody {
            raw: Some(vec![UploadChunk {
                bytes: Some(vec![0xff, b'1', b'.', b'2']),
                file: None,
            }]),
            ..Default::default()
        };
        assert_eq!(decode_body(&body), "\u{fffd}1.2");
    }

    #[test]
    fn file_chunks_and_empty_bodies_decode_to_nothing() {
        let file_only = RequestBody {
            raw: Some(vec![UploadChunk {
                bytes: None,
                file: Some("/tmp/a".to_string()),
            }]),
            ..Default::default()
        };
        assert_eq!(decode_body(&file_only), "");
        assert_eq!(decode_body(&RequestBody::default()), "");
    }

    #[test]
    fn query_precedes_body() {
        let body = RequestBody {
            raw: Some(vec![UploadChunk {
                bytes: Some(b"cid=1.2".to_vec()),
                file: None,
            }]),
            ..Default::default()
        };
        assert_eq!(
            query_and_body_haystack("https://t.example.net/c?v=2", Some(&body)),
            "?v=2cid=1.2"
        );
        assert_eq!(query_and_body_haystack("https://t.example.net/c", None), "");
    }
}

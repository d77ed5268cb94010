//! Streaming response decoding
//!
//! Ollama answers `/api/generate` with newline-delimited JSON, one partial
//! response per line. This module turns the raw body into [`Fragment`]s and
//! reduces them to the final reply text.
//!
//! Decoding is deliberately lenient: a line that is not JSON is kept as
//! verbatim text instead of failing the whole exchange.

use async_stream::stream;
use bytes::Bytes;
use futures::{pin_mut, Stream, StreamExt};
use serde_json::Value;

use super::ProviderError;

/// One decoded line of a streamed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A JSON record carrying a `response` field
    StructuredText { text: String, is_final: bool },

    /// A JSON record without a `response` field
    StructuredOther,

    /// A line that could not be parsed, kept verbatim
    RawLine { text: String },
}

impl Fragment {
    /// Text this fragment contributes to the reply, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Fragment::StructuredText { text, .. } | Fragment::RawLine { text } => Some(text.as_str()),
            Fragment::StructuredOther => None,
        }
    }
}

/// Decode a single line.
///
/// Returns `None` for an empty line. Never fails: anything that does not
/// parse as JSON comes back as [`Fragment::RawLine`].
pub fn decode_line(line: &str) -> Option<Fragment> {
    decode_record(line).map(|(fragment, _)| fragment)
}

/// Decode a line and report whether the server flagged it as the last one.
///
/// The flag is tracked separately from the fragment so that a bare
/// `{"done": true}` record still ends the stream.
fn decode_record(line: &str) -> Option<(Fragment, bool)> {
    if line.is_empty() {
        return None;
    }

    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Keeping non-JSON line verbatim: {}", e);
            return Some((
                Fragment::RawLine {
                    text: line.to_string(),
                },
                false,
            ));
        }
    };

    let Some(object) = value.as_object() else {
        return Some((Fragment::StructuredOther, false));
    };

    let done = object.get("done").is_some_and(is_truthy);

    let fragment = match object.get("response") {
        Some(value) => Fragment::StructuredText {
            text: response_text(value),
            is_final: done,
        },
        None => Fragment::StructuredOther,
    };

    Some((fragment, done))
}

/// Loose truthiness for fields some servers send with the wrong type.
///
/// `null`, `false`, zero and empty strings, arrays or objects are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Text of a `response` value: strings as-is, falsy values empty, anything
/// else as its JSON text
fn response_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other if !is_truthy(other) => String::new(),
        other => other.to_string(),
    }
}

/// Split a response body into lines.
///
/// Lines are terminated by `\n` (a trailing `\r` is dropped). An unterminated
/// last line is flushed when the transport ends. Transport errors are passed
/// through and end the stream.
pub fn split_lines<S, E>(body: S) -> impl Stream<Item = Result<String, ProviderError>>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<ProviderError>,
{
    stream! {
        pin_mut!(body);
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            };
            buffer.extend_from_slice(&chunk);

            while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                yield Ok(line_to_string(&line[..newline]));
            }
        }

        if !buffer.is_empty() {
            yield Ok(line_to_string(&buffer));
        }
    }
}

fn line_to_string(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Lazily decode a line stream into fragments.
///
/// Yields exactly one fragment per non-empty line in arrival order. Stops
/// pulling lines right after yielding a record whose `done` flag is set.
pub fn decode_fragments<S>(lines: S) -> impl Stream<Item = Result<Fragment, ProviderError>>
where
    S: Stream<Item = Result<String, ProviderError>>,
{
    stream! {
        pin_mut!(lines);

        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            if let Some((fragment, done)) = decode_record(&line) {
                yield Ok(fragment);
                if done {
                    tracing::trace!("Final fragment received, stopping decoder");
                    return;
                }
            }
        }
    }
}

/// Result of assembling a streamed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    /// Final reply text
    pub text: String,

    /// Every fragment received, in order
    pub fragments: Vec<Fragment>,
}

/// Reduces fragments to the final reply text
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    text: String,
    fragments: Vec<Fragment>,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: Fragment) {
        if let Some(text) = fragment.text() {
            self.text.push_str(text);
        }
        self.fragments.push(fragment);
    }

    /// Merged text so far, trimmed, without the raw body fallback
    pub fn merged_text(&self) -> &str {
        self.text.trim()
    }

    /// Finish assembly.
    ///
    /// When the merged text is empty the raw body is returned instead, which
    /// covers servers that answer with a single non-streamed document.
    pub fn finish(self, raw_body: &str) -> Assembled {
        let merged = self.text.trim();
        let text = if merged.is_empty() {
            raw_body.to_string()
        } else {
            merged.to_string()
        };

        Assembled {
            text,
            fragments: self.fragments,
        }
    }
}

/// Assemble a complete fragment sequence
pub fn assemble(fragments: impl IntoIterator<Item = Fragment>, raw_body: &str) -> Assembled {
    let mut assembler = ResponseAssembler::new();
    for fragment in fragments {
        assembler.push(fragment);
    }
    assembler.finish(raw_body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn decode_all(lines: &[&str]) -> Vec<Fragment> {
        let lines = stream::iter(lines.iter().map(|l| Ok(l.to_string())));
        decode_fragments(lines)
            .map(|f| f.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_streamed_pieces_are_joined() {
        let fragments =
            decode_all(&[r#"{"response":"Hel"}"#, r#"{"response":"lo"}"#, r#"{"done":true}"#])
                .await;

        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[2], Fragment::StructuredOther);
        assert_eq!(assemble(fragments, "").text, "Hello");
    }

    #[tokio::test]
    async fn test_non_json_lines_are_kept() {
        let fragments = decode_all(&["not json", r#"{"response":" world"}"#]).await;

        assert_eq!(
            fragments[0],
            Fragment::RawLine {
                text: "not json".to_string()
            }
        );
        assert_eq!(assemble(fragments, "").text, "not json world");
    }

    #[tokio::test]
    async fn test_one_fragment_per_non_empty_line() {
        let lines = ["", "a", "", r#"{"x":1}"#, " ", r#"{"response":""}"#, "[1,2]", ""];
        let fragments = decode_all(&lines).await;

        let non_empty = lines.iter().filter(|l| !l.is_empty()).count();
        assert_eq!(fragments.len(), non_empty);
        assert_eq!(
            fragments[2],
            Fragment::RawLine {
                text: " ".to_string()
            }
        );
        assert_eq!(fragments[4], Fragment::StructuredOther);
    }

    #[tokio::test]
    async fn test_decoder_stops_after_done() {
        let fragments = decode_all(&[
            r#"{"response":"Hi","done":false}"#,
            r#"{"response":"!","done":true}"#,
            r#"{"response":"ignored"}"#,
        ])
        .await;

        assert_eq!(fragments.len(), 2);
        assert_eq!(
            fragments[1],
            Fragment::StructuredText {
                text: "!".to_string(),
                is_final: true
            }
        );
        assert_eq!(assemble(fragments, "").text, "Hi!");
    }

    #[tokio::test]
    async fn test_bare_done_record_stops_decoder() {
        let fragments = decode_all(&[r#"{"done":true}"#, "trailing"]).await;
        assert_eq!(fragments, vec![Fragment::StructuredOther]);
    }

    #[test]
    fn test_decode_line_variants() {
        assert_eq!(decode_line(""), None);
        assert_eq!(
            decode_line(r#"{"response":null}"#),
            Some(Fragment::StructuredText {
                text: String::new(),
                is_final: false
            })
        );
        assert_eq!(
            decode_line(r#"{"response":42}"#),
            Some(Fragment::StructuredText {
                text: "42".to_string(),
                is_final: false
            })
        );
        assert_eq!(decode_line("\"just a string\""), Some(Fragment::StructuredOther));
        assert_eq!(
            decode_line(r#"{"response":true,"done":"yes"}"#),
            Some(Fragment::StructuredText {
                text: "true".to_string(),
                is_final: true
            })
        );
        assert_eq!(
            decode_line("{broken"),
            Some(Fragment::RawLine {
                text: "{broken".to_string()
            })
        );
    }

    #[test]
    fn test_falsy_response_values_contribute_nothing() {
        for line in [
            r#"{"response":false}"#,
            r#"{"response":0}"#,
            r#"{"response":[]}"#,
            r#"{"response":{}}"#,
        ] {
            assert_eq!(
                decode_line(line),
                Some(Fragment::StructuredText {
                    text: String::new(),
                    is_final: false
                }),
                "{line}"
            );
        }
    }

    #[tokio::test]
    async fn test_non_boolean_done_values() {
        let fragments = decode_all(&[
            r#"{"response":"a","done":0}"#,
            r#"{"response":"b","done":1}"#,
            "after",
        ])
        .await;
        assert_eq!(fragments.len(), 2);
        assert_eq!(assemble(fragments, "").text, "ab");

        let fragments =
            decode_all(&[r#"{"response":"a","done":null}"#, r#"{"done":""}"#, "kept"]).await;
        assert_eq!(fragments.len(), 3);
    }

    #[test]
    fn test_whitespace_trimmed_only_at_the_ends() {
        let fragments = vec![
            decode_line(r#"{"response":"  Hello "}"#).unwrap(),
            decode_line(r#"{"response":" there  "}"#).unwrap(),
        ];
        assert_eq!(assemble(fragments, "").text, "Hello  there");
    }

    #[test]
    fn test_empty_input_falls_back_to_raw_body() {
        let mut assembler = ResponseAssembler::new();
        assert_eq!(assembler.merged_text(), "");
        assert_eq!(assemble(Vec::new(), "").text, "");

        assembler.push(Fragment::StructuredOther);
        let assembled = assembler.finish("{\"model\":\"m\"}\n");
        assert_eq!(assembled.text, "{\"model\":\"m\"}\n");
        assert_eq!(assembled.fragments.len(), 1);
    }

    #[tokio::test]
    async fn test_split_lines_handles_chunk_boundaries() {
        let chunks = vec![
            Ok::<_, ProviderError>(Bytes::from_static(b"{\"response\":\"a\"}\r\n{\"resp")),
            Ok(Bytes::from_static(b"onse\":\"b\"}\n\n")),
            Ok(Bytes::from_static("caf\u{e9}".as_bytes())),
        ];

        let lines: Vec<String> = split_lines(stream::iter(chunks))
            .map(|l| l.unwrap())
            .collect()
            .await;

        assert_eq!(
            lines,
            vec![
                r#"{"response":"a"}"#.to_string(),
                r#"{"response":"b"}"#.to_string(),
                String::new(),
                "caf\u{e9}".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let chunks = vec![
            Ok(Bytes::from_static(b"{\"response\":\"a\"}\n")),
            Err(ProviderError::InvalidResponse("connection reset".to_string())),
            Ok(Bytes::from_static(b"{\"response\":\"b\"}\n")),
        ];

        let results: Vec<_> = decode_fragments(split_lines(stream::iter(chunks)))
            .collect()
            .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ProviderError::InvalidResponse(_))));
    }
}

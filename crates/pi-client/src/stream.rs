//! Decoder for the `GET /stream` body.
//!
//! The device writes one event per line, `data: {"cm": 12.3}`. Chunks from
//! the HTTP body do not respect line boundaries, so [`LineDecoder`] buffers
//! partial lines until the newline arrives.
//!
//! A device that fails a ranging reports `NaN` (or `Infinity`), which is not
//! valid JSON; those bare tokens are accepted as non-finite distances.

use std::borrow::Cow;

use bytes::{Buf, BytesMut};
use serde::{de, Deserialize, Deserializer};

use crate::error::{ClientError, Result};

/// Longest line held back while waiting for a newline.
pub const MAX_LINE_BYTES: usize = 4096;

/// Bare tokens a Python `json.dumps` writes for non-finite floats.
const NON_FINITE: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// One distance sample.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SensorReading {
    /// Distance in centimetres (NaN when the sensor got no echo)
    #[serde(deserialize_with = "distance_cm")]
    pub cm: f64,
}

impl SensorReading {
    /// Console line for this sample.
    #[must_use]
    pub fn log_line(&self) -> String {
        if self.cm.is_nan() {
            "[sensor] nan cm".to_string()
        } else {
            format!("[sensor] {:.1} cm", self.cm)
        }
    }
}

/// Parse one line of the event stream.
///
/// Returns `Ok(None)` for lines that carry no sample: blank separators, SSE
/// comments and fields other than `data`.
pub fn parse_line(line: &str) -> Result<Option<SensorReading>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let Some(payload) = line.strip_prefix("data:") else {
        if !line.trim().is_empty() && !line.starts_with(':') {
            tracing::trace!(line, "Ignoring non-data stream line");
        }
        return Ok(None);
    };

    serde_json::from_str::<SensorReading>(&quote_non_finite(payload.trim()))
        .map(Some)
        .map_err(|e| ClientError::Decode(format!("bad stream event {payload:?}: {e}")))
}

/// Quote bare `NaN` / `Infinity` tokens outside strings so serde_json can
/// read them.
fn quote_non_finite(payload: &str) -> Cow<'_, str> {
    if !NON_FINITE.iter().any(|token| payload.contains(token)) {
        return Cow::Borrowed(payload);
    }

    let mut out = String::with_capacity(payload.len() + 4);
    let mut rest = payload;
    let mut in_string = false;
    let mut escaped = false;
    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE.iter().find(|token| rest.starts_with(**token)) {
            out.push('"');
            out.push_str(token);
            out.push('"');
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    Cow::Owned(out)
}

fn distance_cm<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Token(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(cm) => Ok(cm),
        Raw::Token(token) => match token.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => Err(de::Error::custom(format!("cm is not a number: {other:?}"))),
        },
    }
}

/// Incremental line splitter over body chunks.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: BytesMut,
}

impl LineDecoder {
    /// Empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a body chunk.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Next sample from the complete lines buffered so far.
    ///
    /// Returns `None` once only a partial line (or nothing) is left. A partial
    /// line longer than [`MAX_LINE_BYTES`] is discarded and reported as a
    /// protocol error.
    pub fn next_reading(&mut self) -> Option<Result<SensorReading>> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.split_to(pos);
            self.buffer.advance(1);

            let parsed = std::str::from_utf8(&line)
                .map_err(|e| ClientError::Decode(format!("stream line is not UTF-8: {e}")))
                .and_then(parse_line);
            match parsed {
                Ok(Some(reading)) => return Some(Ok(reading)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }

        if self.buffer.len() > MAX_LINE_BYTES {
            let held = self.buffer.len();
            self.buffer.clear();
            return Some(Err(ClientError::Decode(format!(
                "stream line exceeds {MAX_LINE_BYTES} bytes without a newline ({held} buffered)"
            ))));
        }
        None
    }

    /// Bytes held back waiting for a newline.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_line_rounds_to_one_decimal() {
        let reading = parse_line(r#"data: {"cm": 12.34}"#).unwrap().unwrap();
        assert_eq!(reading.log_line(), "[sensor] 12.3 cm");

        let reading = parse_line(r#"data:{"cm":7}"#).unwrap().unwrap();
        assert_eq!(reading.log_line(), "[sensor] 7.0 cm");
    }

    #[test]
    fn test_non_data_lines_are_ignored() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("\r").unwrap(), None);
        assert_eq!(parse_line(": keep-alive").unwrap(), None);
        assert_eq!(parse_line("event: distance").unwrap(), None);
        assert_eq!(parse_line("id: 4").unwrap(), None);
    }

    #[test]
    fn test_bad_payloads_are_protocol_errors() {
        for line in [
            "data: not json",
            r#"data: {"distance": 3}"#,
            r#"data: {"cm": "far"}"#,
        ] {
            let err = parse_line(line).unwrap_err();
            assert!(err.is_protocol(), "{line}: {err}");
        }
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let reading = parse_line(r#"data: {"cm": 3.25, "ts": 99}"#).unwrap().unwrap();
        assert_eq!(reading.cm, 3.25);
    }

    #[test]
    fn test_lines_split_across_chunks() {
        let mut decoder = LineDecoder::new();
        decoder.feed(b"data: {\"cm\"");
        assert!(decoder.next_reading().is_none());
        assert!(decoder.pending() > 0);

        decoder.feed(b": 1.0}\r\n\ndata: {\"cm\": 2.0}\ndata: {\"cm\"");
        assert_eq!(decoder.next_reading().unwrap().unwrap().cm, 1.0);
        assert_eq!(decoder.next_reading().unwrap().unwrap().cm, 2.0);
        assert!(decoder.next_reading().is_none());

        decoder.feed(b": 3.0}\n");
        assert_eq!(decoder.next_reading().unwrap().unwrap().cm, 3.0);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_non_finite_distances_are_samples() {
        let reading = parse_line(r#"data: {"cm": NaN}"#).unwrap().unwrap();
        assert!(reading.cm.is_nan());
        assert_eq!(reading.log_line(), "[sensor] nan cm");

        let reading = parse_line(r#"data: {"cm": Infinity}"#).unwrap().unwrap();
        assert_eq!(reading.log_line(), "[sensor] inf cm");

        let reading = parse_line(r#"data: {"cm": -Infinity, "note": "NaN"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(reading.cm, f64::NEG_INFINITY);
    }

    #[test]
    fn test_runaway_line_is_protocol_error() {
        let mut decoder = LineDecoder::new();
        decoder.feed(b"data: {\"cm\": ");
        decoder.feed(&vec![b'1'; MAX_LINE_BYTES]);

        let err = decoder.next_reading().unwrap().unwrap_err();
        assert!(err.is_protocol(), "{err}");
        assert_eq!(decoder.pending(), 0);

        decoder.feed(b"data: {\"cm\": 5}\n");
        assert_eq!(decoder.next_reading().unwrap().unwrap().cm, 5.0);
    }

    #[test]
    fn test_invalid_utf8_is_protocol_error() {
        let mut decoder = LineDecoder::new();
        decoder.feed(b"data: \xff\xfe\n");
        assert!(decoder.next_reading().unwrap().unwrap_err().is_protocol());
    }
}

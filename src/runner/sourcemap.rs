//! Inline source map extraction and decoding.
//!
//! Only the parts needed to line up generated and original lines are
//! decoded: the source list, the embedded source contents and, for every
//! mapping segment, its generated line and original line.
//!
//! The payload itself is decoded with the `base64` crate. The digit table
//! below only serves VLQ decoding of the `mappings` field, where each
//! character is a 6-bit group rather than part of a byte stream.

use crate::runner::error::SourceMapError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static INLINE_MAP_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^//# sourceMappingURL=data:application/json(?:;charset=[\w-]+)?;base64,([A-Za-z0-9+/=]+)\s*$",
    )
    .unwrap()
});

// VLQ digit alphabet.
const BASE64_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const BASE64_VALUES: [i8; 256] = get_base64_map();

const fn get_base64_map() -> [i8; 256] {
    let mut res = [-1i8; 256];
    let mut idx = 0;
    while idx < 64 {
        res[BASE64_CHARS[idx] as usize] = idx as i8;
        idx += 1;
    }
    res
}

/// One decoded mapping segment. Both lines are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMapping {
    pub generated_line: u32,
    pub original_line: u32,
    pub source: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
    #[serde(default)]
    sources: Vec<Option<String>>,
    #[serde(default)]
    sources_content: Vec<Option<String>>,
    #[serde(default)]
    mappings: String,
}

#[derive(Debug, Clone)]
pub struct InlineSourceMap {
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    mappings: Vec<LineMapping>,
}

impl InlineSourceMap {
    /// Returns the base64 payload of the last inline source map comment in
    /// `generated`, if any.
    pub fn find_payload(generated: &str) -> Option<&str> {
        INLINE_MAP_COMMENT
            .captures_iter(generated)
            .last()
            .and_then(|captures| captures.get(1))
            .map(|payload| payload.as_str())
    }

    /// Locates and decodes the inline source map carried by `generated`.
    /// `Ok(None)` means there is no such comment.
    pub fn extract(generated: &str) -> Result<Option<Self>, SourceMapError> {
        Self::find_payload(generated)
            .map(Self::from_payload)
            .transpose()
    }

    pub fn from_payload(payload: &str) -> Result<Self, SourceMapError> {
        let bytes = STANDARD.decode(payload)?;
        let json = String::from_utf8(bytes)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, SourceMapError> {
        let raw: RawSourceMap = serde_json::from_str(json)?;

        Ok(Self {
            sources: raw
                .sources
                .into_iter()
                .map(|source| source.unwrap_or_default())
                .collect(),
            sources_content: raw.sources_content,
            mappings: decode_mappings(&raw.mappings)?,
        })
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn mappings(&self) -> &[LineMapping] {
        &self.mappings
    }

    /// Full text of the first listed original file.
    pub fn first_source_content(&self) -> Result<&str, SourceMapError> {
        let name = self.sources.first().ok_or(SourceMapError::NoSources)?;
        self.sources_content
            .first()
            .and_then(|content| content.as_deref())
            .ok_or_else(|| SourceMapError::MissingSourceContent(name.clone()))
    }
}

/// Walks the `mappings` string, keeping the running source and original line
/// state. Segments with a single field carry no original position and are
/// skipped.
pub fn decode_mappings(mappings: &str) -> Result<Vec<LineMapping>, SourceMapError> {
    let mut decoder = VlqDecoder::new();
    let mut decoded = Vec::new();
    let mut source = 0i64;
    let mut original_line = 0i64;

    for (line_idx, line) in mappings.split(';').enumerate() {
        for segment in line.split(',').filter(|segment| !segment.is_empty()) {
            let fields = decoder.decode(segment)?;
            if fields.len() < 4 {
                continue;
            }

            let malformed = || SourceMapError::MappingMalformed(segment.to_owned());
            source = source.checked_add(fields[1]).ok_or_else(malformed)?;
            original_line = original_line.checked_add(fields[2]).ok_or_else(malformed)?;

            decoded.push(LineMapping {
                generated_line: one_based(line_idx as i64).ok_or_else(malformed)?,
                original_line: one_based(original_line).ok_or_else(malformed)?,
                source: u32::try_from(source).map_err(|_| malformed())?,
            });
        }
    }

    Ok(decoded)
}

fn one_based(zero_based: i64) -> Option<u32> {
    u32::try_from(zero_based).ok()?.checked_add(1)
}

#[derive(Debug)]
struct VlqDecoder {
    buf: [i64; 5],
}

impl VlqDecoder {
    fn new() -> Self {
        Self { buf: [0; 5] }
    }

    fn decode(&mut self, segment: &str) -> Result<&[i64], SourceMapError> {
        let malformed = || SourceMapError::MappingMalformed(segment.to_owned());
        let mut len = 0;
        let mut cur_value = 0i64;
        let mut shift = 0u32;

        for byte in segment.bytes() {
            let value = BASE64_VALUES[byte as usize];
            if value < 0 {
                return Err(malformed());
            }
            let value = value as i64;

            if shift > 55 {
                return Err(malformed());
            }
            cur_value += (value & 0b11111) << shift;
            shift += 5;

            if value & 0b100000 == 0 {
                if len > 4 {
                    return Err(malformed());
                }

                let is_negative = (cur_value & 1) == 1;
                cur_value >>= 1;
                if is_negative {
                    cur_value = -cur_value;
                }
                self.buf[len] = cur_value;
                len += 1;
                cur_value = 0;
                shift = 0;
            }
        }

        if shift != 0 || !matches!(len, 1 | 4 | 5) {
            Err(malformed())
        } else {
            Ok(&self.buf[..len])
        }
    }
}

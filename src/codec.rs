// Log line codec. One record per line: base64(zlib(wincode(LogRecord))).
// No header and no version byte; every line stands alone.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::Write;

use crate::models::LogRecord;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("empty line")]
    Empty,
    #[error("base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("zlib: {0}")]
    Deflate(#[from] std::io::Error),
    #[error("zlib: {0}")]
    Inflate(#[from] flate2::DecompressError),
    #[error("zlib: stream ends before end of record")]
    Truncated,
    #[error("zlib: {0} bytes after end of record")]
    TrailingData(usize),
    #[error("wincode encode: {0}")]
    Encode(String),
    #[error("wincode decode: {0}")]
    Decode(String),
}

/// Encode a record as one printable line (no trailing newline).
pub fn encode_line(record: &LogRecord) -> Result<String, CodecError> {
    let payload = wincode::serialize(record).map_err(|e| CodecError::Encode(e.to_string()))?;
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(payload.len() / 2 + 16),
        Compression::default(),
    );
    encoder.write_all(&payload)?;
    let compressed = encoder.finish()?;
    Ok(BASE64_ENGINE.encode(compressed))
}

/// Decode one log line. Trailing `\r`/`\n` are ignored; anything else malformed is an error.
pub fn decode_line(line: &str) -> Result<LogRecord, CodecError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Err(CodecError::Empty);
    }
    let compressed = BASE64_ENGINE.decode(line)?;
    let payload = inflate(&compressed)?;
    wincode::deserialize(&payload).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Inflate exactly one complete zlib stream. A stream cut short, or input left over after
/// the stream ends, is an error.
fn inflate(compressed: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(4).max(64));
    loop {
        let consumed = inflater.total_in() as usize;
        let status = inflater.decompress_vec(
            &compressed[consumed..],
            &mut out,
            FlushDecompress::Finish,
        )?;
        match status {
            Status::StreamEnd => {
                let rest = compressed.len() - inflater.total_in() as usize;
                if rest > 0 {
                    return Err(CodecError::TrailingData(rest));
                }
                return Ok(out);
            }
            Status::Ok | Status::BufError if out.len() == out.capacity() => {
                out.reserve(out.capacity());
            }
            Status::Ok | Status::BufError => return Err(CodecError::Truncated),
        }
    }
}

// Dump the most recent profiler log records as JSON (decodes base64/zlib/wincode lines).
//
// Usage: cargo run --example dump_log -- [LOG_PATH] [LIMIT]
//   LOG_PATH  default: ./logs/sql.log
//   LIMIT     default: 5

use anyhow::Context;
use sqlprof::codec;
use std::env;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = args.get(1).map(String::as_str).unwrap_or("./logs/sql.log");
    let limit: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(5);

    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path))?;
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(limit);

    let mut records = Vec::with_capacity(lines.len() - start);
    for (idx, line) in lines.iter().enumerate().skip(start) {
        let record = codec::decode_line(line).with_context(|| format!("{}:{}", path, idx + 1))?;
        records.push(record);
    }

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

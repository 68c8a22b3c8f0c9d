// Call-site capture for sampled statements.
// Frames are ordered outermost first. The profiler's own frames (and the runtime glue
// between them and the caller) are trimmed from the innermost end, so the last frame is
// the application line that issued the statement.

use backtrace::Backtrace;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::models::StackFrame;

/// Modules of this crate that sit between the caller and the stack capture.
const SHIM_MODULES: &[&str] = &[
    concat!(env!("CARGO_CRATE_NAME"), "::profiler::"),
    concat!(env!("CARGO_CRATE_NAME"), "::cursor::"),
    concat!(env!("CARGO_CRATE_NAME"), "::db::"),
];

/// Unwinding and std/core glue (catch_unwind, closure shims, future polling).
const RUNTIME_PREFIXES: &[&str] = &[
    "backtrace::",
    "std::",
    "core::",
    "alloc::",
    "<std::",
    "<core::",
    "<alloc::",
    "__rust_try",
];

/// Capture the current call stack, trimmed to end at the application call site.
pub fn capture_stack(sources: &SourceCache) -> Vec<StackFrame> {
    let backtrace = Backtrace::new();
    let mut frames = Vec::new();
    // Backtrace frames (and inlined symbols within a frame) come innermost first.
    for frame in backtrace.frames().iter().rev() {
        for symbol in frame.symbols().iter().rev() {
            frames.push(StackFrame {
                file: symbol
                    .filename()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                line: symbol.lineno().unwrap_or(0),
                function: symbol
                    .name()
                    .map(|n| format!("{:#}", n))
                    .unwrap_or_default(),
                source: String::new(),
            });
        }
    }

    trim_shim_frames(&mut frames);
    if frames.is_empty() {
        frames.push(StackFrame::unknown());
        return frames;
    }
    for frame in &mut frames {
        if let Some(text) = sources.line(Path::new(&frame.file), frame.line) {
            frame.source = text;
        }
    }
    frames
}

/// Drop innermost frames while they belong to the profiler or runtime glue.
pub(crate) fn trim_shim_frames(frames: &mut Vec<StackFrame>) {
    while frames.last().is_some_and(|f| is_shim_frame(&f.function)) {
        frames.pop();
    }
}

fn is_shim_frame(function: &str) -> bool {
    function.is_empty()
        || RUNTIME_PREFIXES.iter().any(|p| function.starts_with(p))
        || SHIM_MODULES.iter().any(|m| function.contains(m))
}

/// Source lines by file, read once per file. Unreadable files are remembered as missing.
#[derive(Debug, Default)]
pub struct SourceCache {
    files: Mutex<HashMap<PathBuf, Option<Arc<Vec<String>>>>>,
}

impl SourceCache {
    /// Trimmed text of 1-based `lineno` in `path`, if the file can be read.
    pub fn line(&self, path: &Path, lineno: u32) -> Option<String> {
        if lineno == 0 || path.as_os_str().is_empty() {
            return None;
        }
        let lines = {
            let mut files = self.files.lock().unwrap_or_else(|p| p.into_inner());
            files
                .entry(path.to_path_buf())
                .or_insert_with(|| {
                    std::fs::read_to_string(path)
                        .ok()
                        .map(|text| Arc::new(text.lines().map(str::to_owned).collect()))
                })
                .clone()
        }?;
        lines
            .get(lineno as usize - 1)
            .map(|l| l.trim().to_string())
    }
}

use anyhow::Result;
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use zstd::stream::read::Decoder;

use crate::util::open_with_backoff;

#[inline]
pub fn is_zst(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).map_or(false, |e| e.eq_ignore_ascii_case("zst"))
}

#[inline]
pub fn is_jsonl(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("jsonl" | "ndjson")
    )
}

fn warn_decode_skip(path: &Path, e: &anyhow::Error) {
    let abs = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    tracing::warn!(
        path = %abs.display(),
        error = %e,
        "skipping snapshot file after read/decode error; the file is likely truncated or corrupt"
    );
}

/// Stream a `.jsonl` or `.zst`-compressed JSONL file line by line, calling `on_line`
/// with each non-empty line. A file that fails to open or decode is logged and
/// skipped; errors returned by `on_line` propagate.
pub fn for_each_line(
    path: &Path,
    read_buf_bytes: usize,
    mut on_line: impl FnMut(&str) -> Result<()>,
) -> Result<()> {
    let mut callback_err: Option<anyhow::Error> = None;
    let res = for_each_line_attempt(path, read_buf_bytes, &mut |line| {
        on_line(line).map_err(|e| {
            callback_err = Some(e);
            anyhow::anyhow!("callback failed")
        })
    });
    if let Some(e) = callback_err {
        return Err(e);
    }
    if let Err(e) = res {
        warn_decode_skip(path, &e);
    }
    Ok(())
}

fn for_each_line_attempt(
    path: &Path,
    read_buf_bytes: usize,
    on_line: &mut dyn FnMut(&str) -> Result<()>,
) -> Result<()> {
    let file = open_with_backoff(path, 16, 50)?;
    let inner: Box<dyn Read> = if is_zst(path) {
        let mut decoder = Decoder::new(file)?;
        // Large frames otherwise fail with "Frame requires too much memory".
        decoder.window_log_max(31)?;
        Box::new(decoder)
    } else {
        Box::new(file)
    };
    let mut reader = BufReader::with_capacity(read_buf_bytes.max(8 * 1024), inner);

    let mut buf = String::with_capacity(16 * 1024);
    loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            break;
        }
        let line = buf.trim_end_matches(|c: char| c == '\n' || c == '\r');
        if line.trim().is_empty() {
            continue;
        }
        on_line(line)?;
    }
    Ok(())
}

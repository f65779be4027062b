//! Record persistence. Writers stage into `<out>.inprogress` and promote atomically on
//! `finish`, so a crashed run never leaves a truncated output behind.

use crate::record::CandidateRecord;
use crate::util::{create_with_backoff, replace_file_atomic_backoff};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const WRITE_BUF_BYTES: usize = 256 * 1024;

/// Receives accepted records in dataset order.
pub trait RecordSink {
    fn write_record(&mut self, record: &CandidateRecord) -> Result<()>;
}

fn staging_path(out: &Path) -> PathBuf {
    let mut name = out.file_name().map(|s| s.to_os_string()).unwrap_or_default();
    name.push(".inprogress");
    out.with_file_name(name)
}

fn open_staging(out: &Path) -> Result<(PathBuf, BufWriter<File>)> {
    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let tmp = staging_path(out);
    let f = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
    Ok((tmp, BufWriter::with_capacity(WRITE_BUF_BYTES, f)))
}

/// One JSON object per line.
pub struct JsonlRecordWriter {
    out: PathBuf,
    tmp: PathBuf,
    w: BufWriter<File>,
    written: u64,
}

impl JsonlRecordWriter {
    pub fn create(out: &Path) -> Result<Self> {
        let (tmp, w) = open_staging(out)?;
        Ok(Self { out: out.to_path_buf(), tmp, w, written: 0 })
    }

    /// Flush and promote to the final path. Returns the number of records written.
    pub fn finish(mut self) -> Result<u64> {
        self.w.flush().with_context(|| format!("flush {}", self.tmp.display()))?;
        drop(self.w);
        replace_file_atomic_backoff(&self.tmp, &self.out)?;
        Ok(self.written)
    }
}

impl RecordSink for JsonlRecordWriter {
    fn write_record(&mut self, record: &CandidateRecord) -> Result<()> {
        serde_json::to_writer(&mut self.w, record)?;
        self.w.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }
}

/// A single JSON array, optionally pretty-printed.
pub struct JsonArrayRecordWriter {
    out: PathBuf,
    tmp: PathBuf,
    w: BufWriter<File>,
    pretty: bool,
    written: u64,
}

impl JsonArrayRecordWriter {
    pub fn create(out: &Path, pretty: bool) -> Result<Self> {
        let (tmp, mut w) = open_staging(out)?;
        let open: &[u8] = if pretty { b"[\n" } else { b"[" };
        w.write_all(open)?;
        Ok(Self { out: out.to_path_buf(), tmp, w, pretty, written: 0 })
    }

    pub fn finish(mut self) -> Result<u64> {
        let close: &[u8] = match (self.pretty, self.written) {
            (true, 0) => b"]",
            (true, _) => b"\n]",
            (false, _) => b"]",
        };
        self.w.write_all(close)?;
        self.w.flush().with_context(|| format!("flush {}", self.tmp.display()))?;
        drop(self.w);
        replace_file_atomic_backoff(&self.tmp, &self.out)?;
        Ok(self.written)
    }
}

impl RecordSink for JsonArrayRecordWriter {
    fn write_record(&mut self, record: &CandidateRecord) -> Result<()> {
        if self.written > 0 {
            let sep: &[u8] = if self.pretty { b",\n" } else { b"," };
            self.w.write_all(sep)?;
        }
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.w, record)?;
        } else {
            serde_json::to_writer(&mut self.w, record)?;
        }
        self.written += 1;
        Ok(())
    }
}

/// In-memory sink, mostly for tests and embedding.
impl RecordSink for Vec<CandidateRecord> {
    fn write_record(&mut self, record: &CandidateRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

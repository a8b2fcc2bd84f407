use std::collections::HashMap;
use std::io::{BufRead, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use vitals_api::{
    Page, PageToken, StoreError, StoreFuture, TelemetryRecord, TelemetryStore, page_of,
    validate_record,
};

// ════════════════════════════════════════════════════════════════
//  FileStore
// ════════════════════════════════════════════════════════════════

/// JSON-lines table: one record per line, `{data_dir}/{table}.jsonl`.
///
/// `put` appends (or rewrites the last line when it carries the same
/// key). On read the latest line for a key wins and rows keep the
/// position of their first appearance.
#[derive(Clone)]
pub struct FileStore {
    path: PathBuf,
    page_size: usize,
}

impl FileStore {
    pub fn new(data_dir: impl AsRef<Path>, table: &str, page_size: usize) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{table}.jsonl")),
            page_size: page_size.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Read ──

    /// Materialize the table, latest line per key.
    fn load_rows(&self) -> Result<Vec<TelemetryRecord>, StoreError> {
        let f = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(format!("open {}: {e}", self.path.display()))),
        };
        let reader = std::io::BufReader::new(f);

        let mut rows: Vec<TelemetryRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.map_err(io_err("read line"))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: TelemetryRecord = serde_json::from_str(&line).map_err(|e| {
                StoreError::format_err(format!("{}:{}: {e}", self.path.display(), lineno + 1))
            })?;
            match index.get(&record.key) {
                Some(&i) => rows[i] = record,
                None => {
                    index.insert(record.key.clone(), rows.len());
                    rows.push(record);
                }
            }
        }
        Ok(rows)
    }

    // ── Write ──

    fn do_put(&self, record: &TelemetryRecord) -> Result<(), StoreError> {
        validate_record(record)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err("mkdir"))?;
        }
        let new_line = serde_json::to_string(record)?;

        if !self.path.exists() {
            let mut f = std::fs::File::create(&self.path)
                .map_err(|e| StoreError::io(format!("create {}: {e}", self.path.display())))?;
            writeln!(f, "{new_line}").map_err(io_err("write"))?;
            return Ok(());
        }

        let mut f = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(format!("open {}: {e}", self.path.display())))?;

        if let Some((last_line, last_pos)) = read_last_line(&mut f)? {
            if parse_key_only(&last_line).as_deref() == Some(record.key.as_str()) {
                f.seek(SeekFrom::Start(last_pos))
                    .map_err(io_err("seek"))?;
                f.set_len(last_pos)
                    .map_err(io_err("truncate"))?;
                writeln!(f, "{new_line}").map_err(io_err("write"))?;
                return Ok(());
            }
        }

        f.seek(SeekFrom::End(0))
            .map_err(io_err("seek end"))?;
        ensure_trailing_newline(&mut f)?;
        writeln!(f, "{new_line}").map_err(io_err("write"))
    }

    /// Rewrite the file so each key appears on exactly one line.
    /// Returns the number of superseded lines dropped.
    pub fn compact(&self) -> Result<usize, StoreError> {
        let rows = self.load_rows()?;
        let before = count_lines(&self.path)?;
        if before == 0 {
            return Ok(0);
        }

        let tmp = self.path.with_extension("jsonl.tmp");
        {
            let mut f = std::fs::File::create(&tmp)
                .map_err(|e| StoreError::io(format!("create {}: {e}", tmp.display())))?;
            for row in &rows {
                let line = serde_json::to_string(row)?;
                writeln!(f, "{line}").map_err(io_err("write"))?;
            }
            f.sync_all().map_err(io_err("sync"))?;
        }
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::io(format!("rename {}: {e}", tmp.display())))?;

        let dropped = before - rows.len();
        tracing::info!(path = %self.path.display(), kept = rows.len(), dropped, "compacted table");
        Ok(dropped)
    }
}

// ════════════════════════════════════════════════════════════════
//  TelemetryStore impl
// ════════════════════════════════════════════════════════════════

impl TelemetryStore for FileStore {
    fn init(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if let Some(dir) = self.path.parent() {
                std::fs::create_dir_all(dir).map_err(io_err("mkdir"))?;
            }
            Ok(())
        })
    }

    fn enumerate(&self, token: Option<PageToken>) -> StoreFuture<'_, Page> {
        Box::pin(async move {
            let rows = self.load_rows()?;
            page_of(&rows, token.as_ref(), self.page_size)
        })
    }

    fn get(&self, key: &str) -> StoreFuture<'_, Option<TelemetryRecord>> {
        let key = key.to_string();
        Box::pin(async move {
            let rows = self.load_rows()?;
            Ok(rows.into_iter().find(|r| r.key == key))
        })
    }

    fn put(&self, record: TelemetryRecord) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.do_put(&record) })
    }
}

// ════════════════════════════════════════════════════════════════
//  Helpers
// ════════════════════════════════════════════════════════════════

fn io_err(op: &'static str) -> impl Fn(std::io::Error) -> StoreError {
    move |e| StoreError::io(format!("{op}: {e}"))
}

/// Bytes read per step when walking back from the end of the file.
const TAIL_CHUNK: u64 = 4096;

/// Last non-blank line of the file and the offset where it starts.
///
/// Reads backwards in chunks until a newline precedes the line, so the
/// cost is bounded by the line length rather than the file size.
fn read_last_line(f: &mut std::fs::File) -> Result<Option<(String, u64)>, StoreError> {
    let mut start = f.seek(SeekFrom::End(0)).map_err(io_err("seek"))?;
    let mut tail: Vec<u8> = Vec::new();

    loop {
        let end = tail.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(0, |i| i + 1);
        let line_at = match tail[..end].iter().rposition(|&b| b == b'\n') {
            Some(nl) => Some(nl + 1),
            None if start == 0 => Some(0),
            None => None,
        };
        if let Some(at) = line_at {
            if at == end {
                return Ok(None);
            }
            let line = String::from_utf8_lossy(&tail[at..end]).into_owned();
            return Ok(Some((line, start + at as u64)));
        }

        let step = TAIL_CHUNK.min(start);
        start -= step;
        let mut chunk = vec![0u8; step as usize];
        f.seek(SeekFrom::Start(start)).map_err(io_err("seek"))?;
        f.read_exact(&mut chunk).map_err(io_err("read"))?;
        chunk.extend_from_slice(&tail);
        tail = chunk;
    }
}

/// Pull only the key out of a stored line.
fn parse_key_only(line: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct KeyOnly {
        #[serde(rename = "dateTime", alias = "key")]
        key: String,
    }
    serde_json::from_str::<KeyOnly>(line).ok().map(|k| k.key)
}

/// Hand-edited files may lack the final newline.
fn ensure_trailing_newline(f: &mut std::fs::File) -> Result<(), StoreError> {
    let len = f.seek(SeekFrom::End(0)).map_err(io_err("seek"))?;
    if len == 0 {
        return Ok(());
    }
    f.seek(SeekFrom::Start(len - 1)).map_err(io_err("seek"))?;
    let mut buf = [0u8; 1];
    f.read_exact(&mut buf).map_err(io_err("read"))?;
    if buf[0] != b'\n' {
        f.write_all(b"\n").map_err(io_err("write"))?;
    }
    Ok(())
}

fn count_lines(path: &Path) -> Result<usize, StoreError> {
    let f = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(StoreError::io(format!("open {}: {e}", path.display()))),
    };
    let mut n = 0;
    for line in std::io::BufReader::new(f).lines() {
        let line = line.map_err(io_err("read line"))?;
        if !line.trim().is_empty() {
            n += 1;
        }
    }
    Ok(n)
}

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::Context;

use crate::model::RawGameRecord;

/// Decoded games plus the number of lines that were not valid game JSON.
#[derive(Debug, Default)]
pub struct Batch {
    pub records: Vec<RawGameRecord>,
    pub malformed: usize,
}

impl Batch {
    pub fn extend(&mut self, other: Batch) {
        self.records.extend(other.records);
        self.malformed += other.malformed;
    }
}

/// Read one game per line. Blank lines are ignored; undecodable lines are
/// counted and dropped so a single bad line does not lose the export.
pub fn read_records<R: BufRead>(reader: R) -> io::Result<Batch> {
    let mut batch = Batch::default();
    for (lineno, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawGameRecord>(line) {
            Ok(r) => batch.records.push(r),
            Err(e) => {
                vprintln!("ndjson: line {} skipped: {}", lineno + 1, e);
                batch.malformed += 1;
            }
        }
    }
    Ok(batch)
}

/// Open an export file; `.zst` files are decompressed on the fly.
pub fn open(path: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    if path.extension().is_some_and(|e| e == "zst") {
        let decoder = zstd::stream::Decoder::new(file)
            .with_context(|| format!("zstd decoder for {}", path.display()))?;
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub fn read_path(path: &Path) -> anyhow::Result<Batch> {
    let reader = open(path)?;
    read_records(reader).with_context(|| format!("reading {}", path.display()))
}

pub fn read_stdin() -> anyhow::Result<Batch> {
    let stdin = io::stdin();
    read_records(stdin.lock()).context("reading stdin")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;
    use std::io::{Cursor, Write};

    const EXPORT: &str = r#"{"id":"a1","players":{"white":{"user":{"name":"Alice"}},"black":{"user":{"name":"Bob"}}},"winner":"white","opening":{"name":"Sicilian Defense"}}

{"id":"a2","players":{"white":{"user":{"name":"Bob"}},"black":{"user":{"name":"Alice"},"provisional":true}}}
not json at all
{"id":"a3","players":"oops"}
"#;

    #[test]
    fn test_reads_lines_and_counts_malformed() {
        let batch = read_records(Cursor::new(EXPORT)).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.malformed, 2);
        assert_eq!(batch.records[0].player_name(Color::White), Some("Alice"));
        assert!(batch.records[1].is_provisional(Color::Black));
    }

    #[test]
    fn test_empty_input() {
        let batch = read_records(Cursor::new("")).unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.malformed, 0);
    }

    #[test]
    fn test_extend_merges_batches() {
        let mut a = read_records(Cursor::new(EXPORT)).unwrap();
        let b = read_records(Cursor::new(EXPORT)).unwrap();
        a.extend(b);
        assert_eq!(a.records.len(), 4);
        assert_eq!(a.malformed, 4);
    }

    #[test]
    fn test_reads_zstd_file() {
        let dir = std::env::temp_dir().join(format!("openingstats-ndjson-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("games.ndjson.zst");
        let compressed = zstd::stream::encode_all(Cursor::new(EXPORT), 3).unwrap();
        File::create(&path).unwrap().write_all(&compressed).unwrap();

        let batch = read_path(&path).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.malformed, 2);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = read_path(Path::new("/definitely/not/here.ndjson")).unwrap_err();
        assert!(err.to_string().contains("opening"));
    }
}

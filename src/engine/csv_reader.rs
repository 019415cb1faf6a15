use std::fs::File;
use std::io;
use std::path::Path;

use log::debug;
use memchr::{memchr, memchr_iter};
use memmap2::Mmap;

use crate::engine::{EngineError, Result};

const QUOTE: char = '"';

/// Header plus raw data rows, all still text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Line-oriented, quote-aware CSV reader
///
/// Blank lines are skipped. Lines without a quote are split directly on
/// the separator; lines with a quote go through a small scanner where `""`
/// inside a quoted span is one literal quote and separators inside the span
/// are text.
///
/// # Example
/// ```rust
/// # use reelframe::CsvReader;
/// let table = CsvReader::new().parse_str("id,title\n1,\"Heat, the movie\"\n");
/// assert_eq!(table.rows[0][1], "Heat, the movie");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CsvReader {
    separator: char,
}

impl CsvReader {
    pub fn new() -> Self {
        Self::with_separator(',')
    }

    pub fn with_separator(separator: char) -> Self {
        CsvReader { separator }
    }

    /// Reads a whole file using memory mapping
    ///
    /// # Errors
    /// - [`EngineError::FileNotFound`] if the path cannot be opened
    /// - [`EngineError::Utf8`] if the file is not UTF-8
    pub fn read(&self, path: &Path) -> Result<CsvTable> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                EngineError::FileNotFound(path.to_path_buf())
            }
            _ => EngineError::Io(e),
        })?;

        // zero-length files cannot be mapped everywhere
        if file.metadata()?.len() == 0 {
            return Ok(CsvTable::default());
        }

        let mmap = unsafe { Mmap::map(&file)? };
        let text = std::str::from_utf8(&mmap[..])?;
        let table = self.parse_str(text);
        debug!(
            "read {} data rows, {} columns from {}",
            table.rows.len(),
            table.header.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parses CSV text already in memory
    pub fn parse_str(&self, text: &str) -> CsvTable {
        let bytes = text.as_bytes();
        let mut lines = Vec::new();

        let mut start = 0;
        for newline_pos in memchr_iter(b'\n', bytes) {
            lines.push(&text[start..newline_pos]);
            start = newline_pos + 1;
        }
        if start < text.len() {
            lines.push(&text[start..]);
        }

        let mut rows = lines
            .into_iter()
            .map(|line| line.trim_end_matches(['\r', '\n']))
            .filter(|line| !line.trim().is_empty())
            .map(|line| self.split_line(line));

        let header = rows.next().unwrap_or_default();
        CsvTable {
            header,
            rows: rows.collect(),
        }
    }

    /// Splits one line (without its terminator) into fields
    pub fn split_line(&self, line: &str) -> Vec<String> {
        if memchr(b'"', line.as_bytes()).is_none() {
            return line.split(self.separator).map(str::to_string).collect();
        }
        self.split_quoted(line)
    }

    fn split_quoted(&self, line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut buf = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch == QUOTE {
                if in_quotes && chars.peek() == Some(&QUOTE) {
                    buf.push(QUOTE);
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            } else if ch == self.separator && !in_quotes {
                fields.push(std::mem::take(&mut buf));
            } else {
                buf.push(ch);
            }
        }

        fields.push(buf);
        fields
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_skips_blank_lines() {
        let table = CsvReader::new().parse_str("a,b\r\n\r\n1,2\n   \n3,4");
        assert_eq!(table.header, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_quoted_fields() {
        let reader = CsvReader::new();
        assert_eq!(
            reader.split_line(r#"1,"Toy Story (1995)",Adventure|Animation"#),
            vec!["1", "Toy Story (1995)", "Adventure|Animation"]
        );
        assert_eq!(
            reader.split_line(r#"7,"Say ""Hi"", Bob",x"#),
            vec!["7", r#"Say "Hi", Bob"#, "x"]
        );
        assert_eq!(reader.split_line(r#""",b"#), vec!["", "b"]);
    }

    #[test]
    fn test_custom_separator() {
        let reader = CsvReader::with_separator(';');
        assert_eq!(reader.split_line("a;b,c;d"), vec!["a", "b,c", "d"]);
        assert_eq!(reader.split_line(r#"a;"b;c""#), vec!["a", "b;c"]);
    }

    #[test]
    fn test_read_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "movieId,title\n1,\"Heat (1995)\"\n\n2,Jumanji (1995)\n").unwrap();

        let table = CsvReader::new().read(tmp.path()).unwrap();
        assert_eq!(table.header, vec!["movieId", "title"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "Heat (1995)");
    }

    #[test]
    fn test_missing_file() {
        let err = CsvReader::new()
            .read(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn test_empty_file() {
        let tmp = NamedTempFile::new().unwrap();
        let table = CsvReader::new().read(tmp.path()).unwrap();
        assert!(table.header.is_empty());
        assert!(table.rows.is_empty());
    }
}

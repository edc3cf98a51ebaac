//! Bounded reads from the start or end of a log file.
//!
//! Counters files grow for the whole life of a run and can reach hundreds of
//! megabytes, so the current sample is read by seeking to the end and walking
//! backwards instead of scanning the file.

use std::io::{self, BufRead, Read, Seek, SeekFrom};

/// Block size used when walking backwards through a file.
pub const BLOCK_SIZE: usize = 1024;

/// Lazy iterator over the first `n` lines of a reader.
///
/// Lines are yielded without their terminator. The iterator consumes the
/// reader, so starting over means opening the source again.
pub struct Head<R> {
    reader: R,
    remaining: usize,
}

impl<R: BufRead> Iterator for Head<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => {
                self.remaining = 0;
                None
            }
            Ok(_) => {
                self.remaining -= 1;
                let trimmed = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(trimmed);
                Some(Ok(line))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}

/// Read up to `n` lines from the start of `reader`.
pub fn head<R: BufRead>(reader: R, n: usize) -> Head<R> {
    Head {
        reader,
        remaining: n,
    }
}

/// Read the last `n` lines of `source` without scanning the whole file.
///
/// Blocks of [`BLOCK_SIZE`] bytes are read backwards from the end until `n`
/// line breaks have been seen (not counting a final trailing newline) or the
/// start of the file is reached. The result matches
/// `content.lines().rev().take(n).rev()` on the full content.
pub fn tail<R: Read + Seek>(source: &mut R, n: usize) -> io::Result<Vec<String>> {
    if n == 0 {
        return Ok(Vec::new());
    }

    let len = source.seek(SeekFrom::End(0))?;
    let mut pos = len;
    let mut buf: Vec<u8> = Vec::new();
    let mut block = [0u8; BLOCK_SIZE];

    while pos > 0 {
        let step = (BLOCK_SIZE as u64).min(pos);
        pos -= step;
        source.seek(SeekFrom::Start(pos))?;
        let chunk = &mut block[..step as usize];
        source.read_exact(chunk)?;

        let mut joined = chunk.to_vec();
        joined.extend_from_slice(&buf);
        buf = joined;

        if line_breaks(&buf) >= n {
            break;
        }
    }

    let text = String::from_utf8_lossy(&buf);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].iter().map(|l| l.to_string()).collect())
}

/// Count newlines, ignoring one that terminates the buffer.
fn line_breaks(buf: &[u8]) -> usize {
    let body = buf.strip_suffix(b"\n").unwrap_or(buf);
    body.iter().filter(|&&b| b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn naive_tail(content: &str, n: usize) -> Vec<String> {
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].iter().map(|l| l.to_string()).collect()
    }

    fn numbered(count: usize) -> String {
        (0..count)
            .map(|i| format!("{:6} {:.6e} {:.6e}\n", i, i as f64 * 0.5, 1.0 / (i + 1) as f64))
            .collect()
    }

    #[test]
    fn test_tail_matches_full_read() {
        let small = numbered(4);
        let large = numbered(500);
        assert!(small.len() < BLOCK_SIZE);
        assert!(large.len() > 4 * BLOCK_SIZE);

        for content in [&small, &large] {
            for n in [0, 1, 5] {
                let got = tail(&mut Cursor::new(content.as_bytes()), n).unwrap();
                assert_eq!(got, naive_tail(content, n), "n = {n}");
            }
        }
    }

    #[test]
    fn test_tail_zero_is_empty() {
        let mut cur = Cursor::new(b"a\nb\n".to_vec());
        assert!(tail(&mut cur, 0).unwrap().is_empty());
    }

    #[test]
    fn test_tail_without_trailing_newline() {
        let content = "one\ntwo\nthree";
        let got = tail(&mut Cursor::new(content.as_bytes()), 2).unwrap();
        assert_eq!(got, vec!["two", "three"]);
    }

    #[test]
    fn test_tail_line_on_block_boundary() {
        // Last line is exactly one block long, preceded by a newline.
        let mut content = String::from("first\n");
        content.push_str(&"x".repeat(BLOCK_SIZE - 1));
        content.push('\n');
        let got = tail(&mut Cursor::new(content.as_bytes()), 1).unwrap();
        assert_eq!(got, naive_tail(&content, 1));
        let got = tail(&mut Cursor::new(content.as_bytes()), 2).unwrap();
        assert_eq!(got, naive_tail(&content, 2));
    }

    #[test]
    fn test_tail_empty_source() {
        let got = tail(&mut Cursor::new(Vec::<u8>::new()), 3).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn test_tail_real_file() {
        use std::io::Write;
        let mut file = tempfile::tempfile().unwrap();
        let content = numbered(300);
        file.write_all(content.as_bytes()).unwrap();
        let got = tail(&mut file, 5).unwrap();
        assert_eq!(got, naive_tail(&content, 5));
    }

    #[test]
    fn test_head() {
        let content = "h1\r\nh2\nrow\nrow2\n";
        let lines: Vec<String> = head(Cursor::new(content), 3)
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines, vec!["h1", "h2", "row"]);
    }

    #[test]
    fn test_head_stops_early() {
        let lines: Vec<String> = head(Cursor::new("only\n"), 3)
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines, vec!["only"]);

        assert_eq!(head(Cursor::new(""), 3).count(), 0);
        assert_eq!(head(Cursor::new("a\nb\n"), 0).count(), 0);
    }
}

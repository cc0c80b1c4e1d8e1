//! Streaming binary-to-array-literal encoder.
//!
//! Turns an arbitrary byte stream into lines of comma-separated hex
//! literals with a human-readable comment, the exact text the generated
//! `#include`-able asset files contain. Generated declarations depend on
//! the byte-for-byte layout of this output, so the rendering is a fixed
//! contract: up to [`BYTES_PER_LINE`] bytes per line as `0x%02x,`, then
//! ` // |`, one ASCII char per byte (`.` for anything non-graphic), then
//! `|\n`.
//!
//! Input is consumed in [`PAGE_SIZE`] pages carried across `write` calls,
//! so the line layout depends only on the byte stream, never on how the
//! compressor happened to chunk its writes. A full page is not a multiple
//! of the line width, so each page ends in one shorter line; the final
//! partial page renders its remainder on `close`.

use std::io::{self, Write};

/// Input page size; also the output-buffer flush threshold.
pub const PAGE_SIZE: usize = 4096;

/// One line of 72 ASCII characters can represent up to 11 input bytes.
pub const BYTES_PER_LINE: usize = 11;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Encoder from raw bytes to array-literal text, writing into `W`.
pub struct ArrayWriter<W: Write> {
    page: Vec<u8>,
    out: Vec<u8>,
    sink: W,
}

impl<W: Write> ArrayWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            page: Vec::with_capacity(PAGE_SIZE),
            out: Vec::with_capacity(2 * PAGE_SIZE),
            sink,
        }
    }

    /// Render the remaining partial page, flush everything to the sink,
    /// and hand the sink back. The encoder may not be used after this.
    pub fn close(mut self) -> io::Result<W> {
        if !self.page.is_empty() {
            self.render_page()?;
        }
        self.flush_out()?;
        Ok(self.sink)
    }

    /// Render the buffered page as lines and clear it.
    fn render_page(&mut self) -> io::Result<()> {
        let mut page = std::mem::take(&mut self.page);
        for line in page.chunks(BYTES_PER_LINE) {
            self.render_line(line);
            if self.out.len() >= PAGE_SIZE {
                self.flush_out()?;
            }
        }
        page.clear();
        self.page = page;
        Ok(())
    }

    fn render_line(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.out.push(b'0');
            self.out.push(b'x');
            self.out.push(HEX[(b >> 4) as usize]);
            self.out.push(HEX[(b & 0x0f) as usize]);
            self.out.push(b',');
        }

        self.out.extend_from_slice(b" // |");
        for &b in bytes {
            self.out.push(if b.is_ascii_graphic() { b } else { b'.' });
        }
        self.out.extend_from_slice(b"|\n");
    }

    fn flush_out(&mut self) -> io::Result<()> {
        self.sink.write_all(&self.out)?;
        self.out.clear();
        Ok(())
    }
}

impl<W: Write> Write for ArrayWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while !rest.is_empty() {
            let room = PAGE_SIZE - self.page.len();
            let take = room.min(rest.len());
            self.page.extend_from_slice(&rest[..take]);
            rest = &rest[take..];

            if self.page.len() == PAGE_SIZE {
                self.render_page()?;
            }
        }
        Ok(buf.len())
    }

    /// Flush rendered output to the sink. Buffered input shorter than a
    /// page stays buffered until more input arrives or `close` renders it.
    fn flush(&mut self) -> io::Result<()> {
        self.flush_out()?;
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(input: &[u8]) -> String {
        let mut aw = ArrayWriter::new(Vec::new());
        aw.write_all(input).unwrap();
        String::from_utf8(aw.close().unwrap()).unwrap()
    }

    /// Strip comments and parse the hex literals back into bytes.
    fn decode(text: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for line in text.lines() {
            let data = line.split(" //").next().unwrap();
            for lit in data.split(',') {
                let lit = lit.trim();
                if lit.is_empty() {
                    continue;
                }
                let hex = lit.strip_prefix("0x").unwrap();
                out.push(u8::from_str_radix(hex, 16).unwrap());
            }
        }
        out
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        assert_eq!(encode(b""), "");
    }

    #[test]
    fn test_hello_renders_one_line() {
        assert_eq!(encode(b"hello"), "0x68,0x65,0x6c,0x6c,0x6f, // |hello|\n");
    }

    #[test]
    fn test_nonprintable_and_space_render_as_dots() {
        assert_eq!(
            encode(b"a b\x00\xff"),
            "0x61,0x20,0x62,0x00,0xff, // |a.b..|\n"
        );
    }

    #[test]
    fn test_eighty_bytes_renders_eight_lines() {
        let input: Vec<u8> = (0u8..80).map(|i| b'a' + (i % 26)).collect();
        let text = encode(&input);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        for line in &lines[..7] {
            assert_eq!(line.matches("0x").count(), 11);
        }
        assert_eq!(lines[7].matches("0x").count(), 3);
    }

    #[test]
    fn test_full_page_ends_with_short_line() {
        // 4096 = 372 * 11 + 4, so a full page ends in a 4-byte line.
        let input = vec![0u8; PAGE_SIZE];
        let text = encode(&input);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 373);
        assert_eq!(lines[372], "0x00,0x00,0x00,0x00, // |....|");
    }

    #[test]
    fn test_chunked_writes_match_single_write() {
        let input: Vec<u8> = (0..1000u32).map(|i| (i * 7 % 256) as u8).collect();
        let whole = encode(&input);

        let mut aw = ArrayWriter::new(Vec::new());
        for chunk in input.chunks(13) {
            aw.write_all(chunk).unwrap();
        }
        let chunked = String::from_utf8(aw.close().unwrap()).unwrap();

        assert_eq!(chunked, whole);
    }

    #[test]
    fn test_decode_reconstructs_input() {
        let input: Vec<u8> = (0..u8::MAX).collect();
        assert_eq!(decode(&encode(&input)), input);

        let input = vec![0x41u8; PAGE_SIZE + 123];
        assert_eq!(decode(&encode(&input)), input);
    }

    #[test]
    fn test_flush_leaves_partial_page_buffered() {
        let mut aw = ArrayWriter::new(Vec::new());
        aw.write_all(b"abc").unwrap();
        aw.flush().unwrap();

        // Nothing rendered yet; the partial page waits for close.
        assert!(aw.sink.is_empty());
        let rendered = String::from_utf8(aw.close().unwrap()).unwrap();
        assert_eq!(rendered, "0x61,0x62,0x63, // |abc|\n");
    }
}

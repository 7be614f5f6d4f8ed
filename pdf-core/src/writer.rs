use std::io::{self, Write};

use crate::objects::{ObjId, PdfObject};

/// Low-level PDF binary writer. Serializes objects to any `Write`
/// target while tracking byte offsets for the cross-reference table.
pub struct PdfWriter<W: Write> {
    writer: W,
    offset: usize,
    /// Byte offset per object number; `None` marks a free slot.
    xref: Vec<Option<usize>>,
}

impl<W: Write> PdfWriter<W> {
    pub fn new(writer: W) -> Self {
        PdfWriter {
            writer,
            offset: 0,
            xref: vec![None],
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.offset += data.len();
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Write the PDF 1.7 header followed by the binary marker comment.
    pub fn write_header(&mut self) -> io::Result<()> {
        self.write_str("%PDF-1.7\n")?;
        self.write_bytes(b"%\xe2\xe3\xcf\xd3\n")
    }

    /// Write an indirect object and record its offset.
    pub fn write_object(&mut self, id: ObjId, obj: &PdfObject) -> io::Result<()> {
        let slot = id.0 as usize;
        if self.xref.len() <= slot {
            self.xref.resize(slot + 1, None);
        }
        self.xref[slot] = Some(self.offset);
        self.write_str(&format!("{} {} obj\n", id.0, id.1))?;
        self.write_value(obj)?;
        self.write_str("\nendobj\n")
    }

    fn write_value(&mut self, obj: &PdfObject) -> io::Result<()> {
        match obj {
            PdfObject::Integer(n) => self.write_str(&n.to_string()),
            PdfObject::Real(f) => self.write_str(&format_real(*f)),
            PdfObject::Name(name) => {
                self.write_str("/")?;
                self.write_str(name)
            }
            PdfObject::LiteralString(s) => self.write_bytes(&encode_literal(s)),
            PdfObject::Array(items) => {
                self.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write_str(" ")?;
                    }
                    self.write_value(item)?;
                }
                self.write_str("]")
            }
            PdfObject::Dictionary(entries) => {
                self.write_str("<<")?;
                self.write_entries(entries)?;
                self.write_str(" >>")
            }
            PdfObject::Stream { dict, data } => {
                self.write_str("<<")?;
                self.write_entries(dict)?;
                self.write_str(&format!(" /Length {} >>\nstream\n", data.len()))?;
                self.write_bytes(data)?;
                self.write_str("\nendstream")
            }
            PdfObject::Reference(id) => self.write_str(&format!("{} {} R", id.0, id.1)),
        }
    }

    fn write_entries(&mut self, entries: &[(String, PdfObject)]) -> io::Result<()> {
        for (key, val) in entries {
            self.write_str(" /")?;
            self.write_str(key)?;
            self.write_str(" ")?;
            self.write_value(val)?;
        }
        Ok(())
    }

    /// Write the xref table, trailer, startxref and `%%EOF`.
    pub fn write_xref_and_trailer(&mut self, root: ObjId, info: Option<ObjId>) -> io::Result<()> {
        let xref_offset = self.offset;
        let size = self.xref.len();

        let mut table = format!("xref\n0 {}\n", size);
        // Object 0 heads the free list. Every entry is exactly 20 bytes.
        table.push_str("0000000000 65535 f\r\n");
        for entry in &self.xref[1..] {
            match entry {
                Some(off) => table.push_str(&format!("{:010} 00000 n\r\n", off)),
                None => table.push_str("0000000000 00000 f\r\n"),
            }
        }
        self.write_str(&table)?;

        let mut trailer = format!("trailer\n<< /Size {} /Root {} {} R", size, root.0, root.1);
        if let Some(info) = info {
            trailer.push_str(&format!(" /Info {} {} R", info.0, info.1));
        }
        trailer.push_str(&format!(" >>\nstartxref\n{}\n%%EOF\n", xref_offset));
        self.write_str(&trailer)
    }

    /// Flush and return the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Encode text as a PDF literal string `( ... )` in WinAnsi bytes.
///
/// Parens and backslashes are escaped. Latin-1 characters map to
/// their single byte; anything else becomes `?`.
pub fn encode_literal(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() + 2);
    out.push(b'(');
    for c in s.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            ' '..='~' => out.push(c as u8),
            '\u{a0}'..='\u{ff}' => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out.push(b')');
    out
}

/// Format a float for PDF output: no scientific notation and no
/// trailing zeros beyond one decimal place.
pub(crate) fn format_real(f: f64) -> String {
    if f == f.floor() && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        let s = format!("{:.6}", f);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(obj: &PdfObject) -> String {
        let mut w = PdfWriter::new(Vec::new());
        w.write_object(ObjId(1, 0), obj).unwrap();
        String::from_utf8_lossy(&w.finish().unwrap()).into_owned()
    }

    #[test]
    fn header_has_binary_marker() {
        let mut w = PdfWriter::new(Vec::new());
        w.write_header().unwrap();
        let buf = w.finish().unwrap();
        assert!(buf.starts_with(b"%PDF-1.7\n%"));
        assert!(buf[10..14].iter().all(|&b| b >= 128));
    }

    #[test]
    fn dictionary_serialization() {
        let out = render(&PdfObject::dict(vec![
            ("Type", PdfObject::name("Catalog")),
            ("Pages", PdfObject::Reference(ObjId(2, 0))),
        ]));
        assert!(out.contains("1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj"));
    }

    #[test]
    fn stream_gets_length() {
        let out = render(&PdfObject::stream(vec![], b"0 0 m".to_vec()));
        assert!(out.contains("<< /Length 5 >>\nstream\n0 0 m\nendstream"));
    }

    #[test]
    fn gaps_become_free_entries() {
        let mut w = PdfWriter::new(Vec::new());
        w.write_header().unwrap();
        w.write_object(ObjId(1, 0), &PdfObject::Integer(1)).unwrap();
        w.write_object(ObjId(3, 0), &PdfObject::Integer(3)).unwrap();
        w.write_xref_and_trailer(ObjId(1, 0), None).unwrap();
        let out = String::from_utf8_lossy(&w.finish().unwrap()).into_owned();
        assert!(out.contains("xref\n0 4\n"));
        assert!(out.contains("/Size 4 /Root 1 0 R >>"));
        let xref = &out[out.find("xref\n0 4\n").unwrap() + 9..];
        let entries: Vec<&str> = xref.split("\r\n").take(4).collect();
        assert_eq!(entries[0], "0000000000 65535 f");
        assert!(entries[1].ends_with(" 00000 n"));
        assert_eq!(entries[2], "0000000000 00000 f");
        assert!(entries[3].ends_with(" 00000 n"));
        assert!(out.ends_with("%%EOF\n"));
    }

    #[test]
    fn literal_escapes_and_transcodes() {
        assert_eq!(encode_literal("a(b)c\\d"), b"(a\\(b\\)c\\\\d)".to_vec());
        assert_eq!(encode_literal("café"), b"(caf\xe9)".to_vec());
        assert_eq!(encode_literal("🍪"), b"(?)".to_vec());
    }

    #[test]
    fn real_formatting() {
        assert_eq!(format_real(612.0), "612.0");
        assert_eq!(format_real(12.5), "12.5");
        assert_eq!(format_real(0.333333333), "0.333333");
    }
}

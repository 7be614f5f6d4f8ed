use std::fmt::Write as _;
use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::{debug, warn};

use crate::fonts::BuiltinFont;
use crate::graphics::{Color, DashPattern};
use crate::images::{ImageData, ImageFormat, ImageId};
use crate::objects::{ObjId, PdfObject};
use crate::writer::{encode_literal, PdfWriter};

const CATALOG_OBJ: ObjId = ObjId(1, 0);
const PAGES_OBJ: ObjId = ObjId(2, 0);
const FIRST_FONT_OBJ_NUM: u32 = 3;

/// Builds a PDF document incrementally.
///
/// Generic over `Write`; the invoice renderer uses an in-memory
/// `Vec<u8>` so nothing reaches the caller until `end_document`.
/// Coordinates use PDF's bottom-left origin.
pub struct PdfDocument<W: Write> {
    writer: PdfWriter<W>,
    info: Vec<(String, String)>,
    font_objs: Vec<(BuiltinFont, ObjId)>,
    image_objs: Vec<ObjId>,
    page_objs: Vec<ObjId>,
    current_page: Option<PageBuilder>,
    next_obj_num: u32,
    compress: bool,
}

struct PageBuilder {
    width: f64,
    height: f64,
    content: String,
}

impl<W: Write> PdfDocument<W> {
    /// Start a document on `writer`. The header and the builtin font
    /// dictionaries are written immediately.
    pub fn new(writer: W) -> io::Result<Self> {
        let mut writer = PdfWriter::new(writer);
        writer.write_header()?;

        let mut font_objs = Vec::with_capacity(BuiltinFont::ALL.len());
        let mut next_obj_num = FIRST_FONT_OBJ_NUM;
        for font in BuiltinFont::ALL {
            let id = ObjId(next_obj_num, 0);
            next_obj_num += 1;
            let dict = PdfObject::dict(vec![
                ("Type", PdfObject::name("Font")),
                ("Subtype", PdfObject::name("Type1")),
                ("BaseFont", PdfObject::name(font.pdf_base_name())),
                ("Encoding", PdfObject::name("WinAnsiEncoding")),
            ]);
            writer.write_object(id, &dict)?;
            font_objs.push((font, id));
        }

        Ok(PdfDocument {
            writer,
            info: Vec::new(),
            font_objs,
            image_objs: Vec::new(),
            page_objs: Vec::new(),
            current_page: None,
            next_obj_num,
            compress: false,
        })
    }

    fn alloc(&mut self) -> ObjId {
        let id = ObjId(self.next_obj_num, 0);
        self.next_obj_num += 1;
        id
    }

    /// Set a document info entry (e.g. "Title", "Creator").
    pub fn set_info(&mut self, key: &str, value: &str) -> &mut Self {
        self.info.push((key.to_string(), value.to_string()));
        self
    }

    /// Flate-compress page content streams.
    pub fn set_compression(&mut self, enabled: bool) -> &mut Self {
        self.compress = enabled;
        self
    }

    /// Write an image XObject and return a handle for `draw_image`.
    /// The image can be drawn on any number of pages.
    pub fn add_image(&mut self, image: &ImageData) -> io::Result<ImageId> {
        let smask_id = match &image.smask {
            Some(alpha) => {
                let id = self.alloc();
                let obj = PdfObject::stream(
                    vec![
                        ("Type", PdfObject::name("XObject")),
                        ("Subtype", PdfObject::name("Image")),
                        ("Width", PdfObject::Integer(image.width as i64)),
                        ("Height", PdfObject::Integer(image.height as i64)),
                        ("ColorSpace", PdfObject::name("DeviceGray")),
                        ("BitsPerComponent", PdfObject::Integer(8)),
                        ("Filter", PdfObject::name("FlateDecode")),
                    ],
                    deflate(alpha)?,
                );
                self.writer.write_object(id, &obj)?;
                Some(id)
            }
            None => None,
        };

        let (filter, data) = match image.format {
            ImageFormat::Jpeg => ("DCTDecode", image.data.clone()),
            ImageFormat::Png => ("FlateDecode", deflate(&image.data)?),
        };
        let mut dict = vec![
            ("Type", PdfObject::name("XObject")),
            ("Subtype", PdfObject::name("Image")),
            ("Width", PdfObject::Integer(image.width as i64)),
            ("Height", PdfObject::Integer(image.height as i64)),
            ("ColorSpace", PdfObject::name(image.color_space.pdf_name())),
            ("BitsPerComponent", PdfObject::Integer(8)),
            ("Filter", PdfObject::name(filter)),
        ];
        if let Some(smask) = smask_id {
            dict.push(("SMask", PdfObject::Reference(smask)));
        }

        let id = self.alloc();
        self.writer.write_object(id, &PdfObject::stream(dict, data))?;
        self.image_objs.push(id);
        debug!(
            "embedded {:?} image {}x{} as object {}",
            image.format, image.width, image.height, id.0
        );
        Ok(ImageId(self.image_objs.len() - 1))
    }

    /// Begin a page of the given size in points. An open page is
    /// closed first.
    pub fn begin_page(&mut self, width: f64, height: f64) -> io::Result<&mut Self> {
        if self.current_page.is_some() {
            self.end_page()?;
        }
        self.current_page = Some(PageBuilder {
            width,
            height,
            content: String::new(),
        });
        Ok(self)
    }

    fn emit(&mut self, ops: std::fmt::Arguments<'_>) -> &mut Self {
        match self.current_page.as_mut() {
            Some(page) => {
                let _ = page.content.write_fmt(ops);
            }
            None => warn!("drawing operation issued with no open page; dropped"),
        }
        self
    }

    pub fn save_state(&mut self) -> &mut Self {
        self.emit(format_args!("q\n"))
    }

    pub fn restore_state(&mut self) -> &mut Self {
        self.emit(format_args!("Q\n"))
    }

    pub fn set_fill_color(&mut self, c: Color) -> &mut Self {
        self.emit(format_args!("{} {} {} rg\n", coord(c.r), coord(c.g), coord(c.b)))
    }

    pub fn set_stroke_color(&mut self, c: Color) -> &mut Self {
        self.emit(format_args!("{} {} {} RG\n", coord(c.r), coord(c.g), coord(c.b)))
    }

    pub fn set_line_width(&mut self, width: f64) -> &mut Self {
        self.emit(format_args!("{} w\n", coord(width)))
    }

    /// Set the dash pattern; `None` restores solid strokes.
    pub fn set_dash(&mut self, dash: Option<DashPattern>) -> &mut Self {
        match dash {
            Some(d) => self.emit(format_args!("[{} {}] 0 d\n", coord(d.dash), coord(d.gap))),
            None => self.emit(format_args!("[] 0 d\n")),
        }
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.emit(format_args!("{} {} m\n", coord(x), coord(y)))
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.emit(format_args!("{} {} l\n", coord(x), coord(y)))
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.emit(format_args!(
            "{} {} {} {} re\n",
            coord(x),
            coord(y),
            coord(width),
            coord(height)
        ))
    }

    pub fn fill(&mut self) -> &mut Self {
        self.emit(format_args!("f\n"))
    }

    pub fn stroke(&mut self) -> &mut Self {
        self.emit(format_args!("S\n"))
    }

    /// Place a single line of text with its baseline at (x, y).
    pub fn place_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        font: BuiltinFont,
        size: f64,
    ) -> &mut Self {
        let literal = encode_literal(text);
        // WinAnsi bytes above 0x7F are not valid UTF-8; write them as octal escapes.
        let mut escaped = String::with_capacity(literal.len());
        for &b in &literal {
            if b.is_ascii() {
                escaped.push(b as char);
            } else {
                let _ = write!(escaped, "\\{:03o}", b);
            }
        }
        self.emit(format_args!(
            "BT\n/{} {} Tf\n{} {} Td\n{} Tj\nET\n",
            font.pdf_name(),
            coord(size),
            coord(x),
            coord(y),
            escaped
        ))
    }

    /// Draw a registered image with its lower-left corner at (x, y).
    pub fn draw_image(
        &mut self,
        image: ImageId,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> &mut Self {
        self.emit(format_args!(
            "q\n{} 0 0 {} {} {} cm\n/Im{} Do\nQ\n",
            coord(width),
            coord(height),
            coord(x),
            coord(y),
            image.0
        ))
    }

    /// Close the current page, writing its content stream and page
    /// dictionary.
    pub fn end_page(&mut self) -> io::Result<()> {
        let page = self.current_page.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "end_page called with no open page")
        })?;

        let content_id = self.alloc();
        let content = if self.compress {
            PdfObject::stream(
                vec![("Filter", PdfObject::name("FlateDecode"))],
                deflate(page.content.as_bytes())?,
            )
        } else {
            PdfObject::stream(vec![], page.content.into_bytes())
        };
        self.writer.write_object(content_id, &content)?;

        let fonts = self
            .font_objs
            .iter()
            .map(|(font, id)| (font.pdf_name(), PdfObject::Reference(*id)))
            .collect();
        let image_names: Vec<String> = (0..self.image_objs.len())
            .map(|i| format!("Im{}", i))
            .collect();
        let xobjects = image_names
            .iter()
            .zip(&self.image_objs)
            .map(|(name, id)| (name.as_str(), PdfObject::Reference(*id)))
            .collect();

        let page_id = self.alloc();
        let page_dict = PdfObject::dict(vec![
            ("Type", PdfObject::name("Page")),
            ("Parent", PdfObject::Reference(PAGES_OBJ)),
            ("MediaBox", PdfObject::rect(0.0, 0.0, page.width, page.height)),
            ("Contents", PdfObject::Reference(content_id)),
            (
                "Resources",
                PdfObject::dict(vec![
                    ("Font", PdfObject::dict(fonts)),
                    ("XObject", PdfObject::dict(xobjects)),
                ]),
            ),
        ]);
        self.writer.write_object(page_id, &page_dict)?;
        self.page_objs.push(page_id);
        Ok(())
    }

    /// Finish the document: info dictionary, page tree, catalog,
    /// xref and trailer. Consumes the document and returns the
    /// underlying writer.
    pub fn end_document(mut self) -> io::Result<W> {
        if self.current_page.is_some() {
            self.end_page()?;
        }

        let info_id = if self.info.is_empty() {
            None
        } else {
            let id = self.alloc();
            let entries = self
                .info
                .iter()
                .map(|(k, v)| (k.as_str(), PdfObject::literal_string(v)))
                .collect();
            self.writer.write_object(id, &PdfObject::dict(entries))?;
            Some(id)
        };

        let kids = self.page_objs.iter().map(|id| PdfObject::Reference(*id)).collect();
        let pages = PdfObject::dict(vec![
            ("Type", PdfObject::name("Pages")),
            ("Kids", PdfObject::Array(kids)),
            ("Count", PdfObject::Integer(self.page_objs.len() as i64)),
        ]);
        self.writer.write_object(PAGES_OBJ, &pages)?;

        let catalog = PdfObject::dict(vec![
            ("Type", PdfObject::name("Catalog")),
            ("Pages", PdfObject::Reference(PAGES_OBJ)),
        ]);
        self.writer.write_object(CATALOG_OBJ, &catalog)?;
        self.writer.write_xref_and_trailer(CATALOG_OBJ, info_id)?;
        debug!("finished document with {} page(s)", self.page_objs.len());
        self.writer.finish()
    }
}

fn deflate(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Format a number for content streams: integers without a decimal
/// point, everything else with at most four decimals.
pub(crate) fn coord(v: f64) -> String {
    if v == v.floor() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{:.4}", v);
        let s = s.trim_end_matches('0').trim_end_matches('.');
        if s == "-0" {
            "0".to_string()
        } else {
            s.to_string()
        }
    }
}

//! Executes a `PageLayout` against `pdf_core` and returns the
//! finished document bytes.

use log::{debug, warn};
use pdf_core::{FontMetrics, ImageData, ImageId, PdfDocument};

use crate::error::RenderError;
use crate::layout::{
    Align, DrawOp, PageLayout, Placement, Point, TextRun, PAGE_HEIGHT, PAGE_WIDTH,
};

/// Space kept below the lowest instruction when the page grows.
const BOTTOM_MARGIN: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub compress: bool,
    pub title: String,
}

/// Draws layouts onto a single page. The whole document is built in
/// memory; the caller gets bytes only once writing has succeeded.
pub struct DocumentWriter<'a> {
    logo: &'a ImageData,
    options: &'a WriterOptions,
}

impl<'a> DocumentWriter<'a> {
    pub fn new(logo: &'a ImageData, options: &'a WriterOptions) -> Self {
        DocumentWriter { logo, options }
    }

    /// Page height for a layout: Letter, or taller when the rows run
    /// past the bottom.
    pub fn page_height(layout: &PageLayout) -> f64 {
        PAGE_HEIGHT.max(layout.bottom + BOTTOM_MARGIN)
    }

    pub fn write(&self, layout: &PageLayout) -> Result<Vec<u8>, RenderError> {
        let height = Self::page_height(layout);
        let mut doc = PdfDocument::new(Vec::new())?;
        doc.set_compression(self.options.compress);
        doc.set_info("Title", &self.options.title);
        doc.set_info("Creator", "invoice-core");

        let logo = doc.add_image(self.logo)?;
        doc.begin_page(PAGE_WIDTH, height)?;

        let mut page = Page {
            doc: &mut doc,
            logo,
            logo_data: self.logo,
            height,
            cursor: None,
        };
        for op in &layout.ops {
            page.draw(op);
        }

        let bytes = doc.end_document()?;
        debug!("wrote {} byte document, page height {}", bytes.len(), height);
        Ok(bytes)
    }
}

/// Drawing state for the page being written.
struct Page<'d> {
    doc: &'d mut PdfDocument<Vec<u8>>,
    logo: ImageId,
    logo_data: &'d ImageData,
    height: f64,
    /// End of the last `continued` run: (x, top).
    cursor: Option<(f64, f64)>,
}

impl Page<'_> {
    /// Convert a top-left y to PDF's bottom-left origin.
    fn flip(&self, y: f64) -> f64 {
        self.height - y
    }

    fn draw(&mut self, op: &DrawOp) {
        match op {
            DrawOp::Image { x, y, width, height } => self.image(*x, *y, *width, *height),
            DrawOp::Text(run) => self.text(run),
            DrawOp::Rect { x, y, width, height, fill } => {
                let bottom = self.flip(y + height);
                self.doc
                    .save_state()
                    .set_fill_color(*fill)
                    .rect(*x, bottom, *width, *height)
                    .fill()
                    .restore_state();
            }
            DrawOp::Line { from, to, color, width, dash } => {
                let (Point { x: x0, y: y0 }, Point { x: x1, y: y1 }) = (*from, *to);
                let (y0, y1) = (self.flip(y0), self.flip(y1));
                self.doc
                    .save_state()
                    .set_stroke_color(*color)
                    .set_line_width(*width)
                    .set_dash(*dash)
                    .move_to(x0, y0)
                    .line_to(x1, y1)
                    .stroke()
                    .restore_state();
            }
        }
    }

    fn image(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let (w, h) = self.logo_data.fit(width, height);
        let bottom = self.flip(y + h);
        self.doc.draw_image(self.logo, x, bottom, w, h);
    }

    fn text(&mut self, run: &TextRun) {
        let (x, top) = match run.placement {
            Placement::At(p) => (p.x, p.y),
            Placement::Inline => match self.cursor {
                Some(pos) => pos,
                None => {
                    warn!("inline text {:?} has no preceding continued run; skipped", run.text);
                    return;
                }
            },
        };

        let text_width = FontMetrics::measure_text(&run.text, run.font, run.size);
        let x = match (run.width, run.align) {
            (Some(w), Align::Right) => x + w - text_width,
            _ => x,
        };
        self.cursor = run.continued.then_some((x + text_width, top));

        if run.text.is_empty() {
            return;
        }
        let baseline = self.flip(top + FontMetrics::ascent(run.font, run.size));
        self.doc
            .save_state()
            .set_fill_color(run.color)
            .place_text(&run.text, x, baseline, run.font, run.size)
            .restore_state();
    }
}

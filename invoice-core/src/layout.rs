//! Invoice page layout.
//!
//! Produces an ordered list of immutable drawing instructions in a
//! top-left origin coordinate space (points, y grows downward). The
//! writer converts them to PDF coordinates. Nothing here touches a
//! PDF document, so layouts can be inspected directly in tests.

use chrono::NaiveDate;
use pdf_core::{BuiltinFont, Color, DashPattern};

use crate::calculator::{InvoiceTotals, RenderedRow};
use crate::config::CompanyProfile;

pub const PAGE_WIDTH: f64 = 612.0;
pub const PAGE_HEIGHT: f64 = 792.0;
/// Vertical advance per item row.
pub const ROW_HEIGHT: f64 = 20.0;

const LEFT: f64 = 60.0;
const RIGHT: f64 = 552.0;

const LOGO_X: f64 = 60.0;
const LOGO_Y: f64 = 50.0;
const LOGO_SIZE: f64 = 120.0;

const COMPANY_X: f64 = 200.0;
const COMPANY_NAME_Y: f64 = 100.0;
const COMPANY_LINES_Y: f64 = 124.0;
const LINE_STEP: f64 = 16.0;

const TITLE_Y: f64 = 180.0;
const TITLE_COLOR: &str = "#FF8C00";

const BILL_TO_Y: f64 = 215.0;
const BILL_TO_LINES_Y: f64 = 237.0;

const META_X: f64 = 400.0;
const META_Y: [f64; 3] = [225.0, 245.0, 265.0];

const RULE_Y: f64 = 300.0;
/// Top of the column-header bar; item rows are offset from here.
pub const TABLE_Y: f64 = 310.0;
const HEADER_BAR_COLOR: &str = "#EEEEEE";
const CELL_INSET: f64 = 6.0;
const TOTAL_OFFSET: f64 = 10.0;

/// Table columns: (x, width).
const QTY_COL: (f64, f64) = (65.0, 55.0);
const ITEM_COL: (f64, f64) = (125.0, 265.0);
const RATE_COL: (f64, f64) = (395.0, 70.0);
const AMOUNT_COL: (f64, f64) = (470.0, 77.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Where a text run starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Top-left corner of the line box.
    At(Point),
    /// Same line, right after the previous run that was `continued`.
    Inline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub font: BuiltinFont,
    pub size: f64,
    pub color: Color,
    pub placement: Placement,
    /// Fixed box width the text is aligned within.
    pub width: Option<f64>,
    pub align: Align,
    /// The next `Inline` run continues after this one.
    pub continued: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Logo, fitted into the box with its aspect ratio kept.
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Text(TextRun),
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Color,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f64,
        dash: Option<DashPattern>,
    },
}

/// Finished layout for one invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
    /// Lowest y any instruction reaches.
    pub bottom: f64,
}

/// Customer block under "Bill To". Absent fields print blank.
#[derive(Debug, Clone, Copy, Default)]
pub struct BillTo<'a> {
    pub customer_name: &'a str,
    pub business_name: &'a str,
    pub delivery_address: &'a str,
}

#[derive(Debug, Clone)]
pub struct InvoiceMeta {
    pub number: String,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
}

pub struct LayoutInput<'a> {
    pub company: &'a CompanyProfile,
    pub bill_to: BillTo<'a>,
    pub meta: &'a InvoiceMeta,
    pub rows: &'a [RenderedRow],
    pub totals: &'a InvoiceTotals,
}

/// Invoice dates print as `dd/mm/yy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%y").to_string()
}

/// y of the top of item row `index` (1-based).
pub fn row_y(index: usize) -> f64 {
    TABLE_Y + index as f64 * ROW_HEIGHT
}

/// y of the dashed divider below `row_count` rows.
pub fn divider_y(row_count: usize) -> f64 {
    row_y(row_count + 1)
}

pub fn layout_invoice(input: &LayoutInput<'_>) -> PageLayout {
    let mut page = PageBuilder::default();
    page.header(input.company);
    page.bill_to(&input.bill_to);
    page.meta(input.meta);
    page.table_header();

    let mut index = 0;
    for row in input.rows {
        index += 1;
        page.item_row(index, row);
    }
    page.total(input.rows.len(), input.totals);

    PageLayout {
        ops: page.ops,
        bottom: page.bottom,
    }
}

/// A left-aligned black run with its top-left corner at (x, y).
fn text_run(text: impl Into<String>, x: f64, y: f64, font: BuiltinFont, size: f64) -> TextRun {
    TextRun {
        text: text.into(),
        font,
        size,
        color: Color::BLACK,
        placement: Placement::At(Point { x, y }),
        width: None,
        align: Align::Left,
        continued: false,
    }
}

/// A run boxed to a table column.
fn cell_run(
    text: impl Into<String>,
    col: (f64, f64),
    y: f64,
    font: BuiltinFont,
    size: f64,
) -> TextRun {
    TextRun {
        width: Some(col.1),
        ..text_run(text, col.0, y, font, size)
    }
}

#[derive(Default)]
struct PageBuilder {
    ops: Vec<DrawOp>,
    bottom: f64,
}

impl PageBuilder {
    fn reach(&mut self, y: f64) {
        self.bottom = self.bottom.max(y);
    }

    fn push_text(&mut self, run: TextRun) {
        if let Placement::At(p) = run.placement {
            self.reach(p.y + run.size);
        }
        self.ops.push(DrawOp::Text(run));
    }

    fn text(&mut self, text: impl Into<String>, x: f64, y: f64, font: BuiltinFont, size: f64) {
        self.push_text(text_run(text, x, y, font, size));
    }

    fn cell(
        &mut self,
        text: impl Into<String>,
        col: (f64, f64),
        y: f64,
        font: BuiltinFont,
        size: f64,
    ) {
        self.push_text(cell_run(text, col, y, font, size));
    }

    fn right_cell(
        &mut self,
        text: impl Into<String>,
        col: (f64, f64),
        y: f64,
        font: BuiltinFont,
        size: f64,
    ) {
        self.push_text(TextRun {
            align: Align::Right,
            ..cell_run(text, col, y, font, size)
        });
    }

    fn line(&mut self, y: f64, color: Color, width: f64, dash: Option<DashPattern>) {
        self.reach(y);
        self.ops.push(DrawOp::Line {
            from: Point { x: LEFT, y },
            to: Point { x: RIGHT, y },
            color,
            width,
            dash,
        });
    }

    fn header(&mut self, company: &CompanyProfile) {
        self.reach(LOGO_Y + LOGO_SIZE);
        self.ops.push(DrawOp::Image {
            x: LOGO_X,
            y: LOGO_Y,
            width: LOGO_SIZE,
            height: LOGO_SIZE,
        });

        let bold = BuiltinFont::HelveticaBold;
        self.text(&company.name, COMPANY_X, COMPANY_NAME_Y, bold, 18.0);
        let lines = company.address_lines.iter().chain(std::iter::once(&company.email));
        for (i, line) in lines.enumerate() {
            let y = COMPANY_LINES_Y + i as f64 * LINE_STEP;
            self.text(line, COMPANY_X, y, BuiltinFont::Helvetica, 12.0);
        }

        self.push_text(TextRun {
            color: Color::from_hex(TITLE_COLOR).unwrap_or(Color::BLACK),
            ..text_run("INVOICE", LEFT, TITLE_Y, bold, 26.0)
        });
    }

    fn bill_to(&mut self, bill_to: &BillTo<'_>) {
        self.text("Bill To", LEFT, BILL_TO_Y, BuiltinFont::HelveticaBold, 18.0);
        let lines = [bill_to.customer_name, bill_to.business_name, bill_to.delivery_address];
        for (i, line) in lines.into_iter().enumerate() {
            let y = BILL_TO_LINES_Y + i as f64 * LINE_STEP;
            self.text(line, LEFT, y, BuiltinFont::Helvetica, 12.0);
        }
    }

    fn meta(&mut self, meta: &InvoiceMeta) {
        let entries = [
            ("INVOICE # ", meta.number.clone()),
            ("DATE # ", format_date(meta.date)),
            ("DUE DATE # ", format_date(meta.due_date)),
        ];
        for ((label, value), y) in entries.into_iter().zip(META_Y) {
            self.push_text(TextRun {
                continued: true,
                ..text_run(label, META_X, y, BuiltinFont::HelveticaBold, 14.0)
            });
            self.push_text(TextRun {
                placement: Placement::Inline,
                ..text_run(value, META_X, y, BuiltinFont::Helvetica, 12.0)
            });
        }
    }

    fn table_header(&mut self) {
        self.line(RULE_Y, Color::BLACK, 1.0, None);
        self.reach(TABLE_Y + ROW_HEIGHT);
        self.ops.push(DrawOp::Rect {
            x: LEFT,
            y: TABLE_Y,
            width: RIGHT - LEFT,
            height: ROW_HEIGHT,
            fill: Color::from_hex(HEADER_BAR_COLOR).unwrap_or(Color::WHITE),
        });

        let y = TABLE_Y + CELL_INSET;
        let bold = BuiltinFont::HelveticaBold;
        self.cell("QTY", QTY_COL, y, bold, 10.0);
        self.cell("ITEM", ITEM_COL, y, bold, 10.0);
        self.cell("RATE", RATE_COL, y, bold, 10.0);
        self.right_cell("AMOUNT", AMOUNT_COL, y, bold, 10.0);
    }

    fn item_row(&mut self, index: usize, row: &RenderedRow) {
        let y = row_y(index) + CELL_INSET;
        let regular = BuiltinFont::Helvetica;
        let qty = row.quantity_label.clone().unwrap_or_default();
        self.cell(qty, QTY_COL, y, regular, 10.0);
        self.cell(row.description.clone(), ITEM_COL, y, regular, 10.0);
        // RATE stays blank.
        self.cell("", RATE_COL, y, regular, 10.0);
        self.right_cell(row.amount_label(), AMOUNT_COL, y, regular, 10.0);
    }

    fn total(&mut self, row_count: usize, totals: &InvoiceTotals) {
        let divider = divider_y(row_count);
        self.line(divider, Color::gray(0.4), 1.0, Some(DashPattern::new(3.0, 3.0)));

        let y = divider + TOTAL_OFFSET;
        let bold = BuiltinFont::HelveticaBold;
        self.cell("TOTAL", RATE_COL, y, bold, 12.0);
        self.right_cell(totals.display(), AMOUNT_COL, y, bold, 12.0);
    }
}

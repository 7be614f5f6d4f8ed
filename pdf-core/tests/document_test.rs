use std::io::Read;

use flate2::read::ZlibDecoder;
use pdf_core::{BuiltinFont, Color, DashPattern, ImageData, PdfDocument};

fn output(doc: PdfDocument<Vec<u8>>) -> String {
    String::from_utf8_lossy(&doc.end_document().unwrap()).into_owned()
}

fn rgba_png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer
            .write_image_data(&vec![128u8; (width * height * 4) as usize])
            .unwrap();
    }
    out
}

// -------------------------------------------------------
// Structure
// -------------------------------------------------------

#[test]
fn empty_page_document() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(612.0, 792.0).unwrap();
    let pdf = output(doc);
    assert!(pdf.starts_with("%PDF-1.7"));
    assert!(pdf.contains("/Type /Catalog"));
    assert!(pdf.contains("/Count 1"));
    assert!(pdf.contains("/MediaBox [0.0 0.0 612.0 792.0]"));
    assert!(pdf.ends_with("%%EOF\n"));
}

#[test]
fn builtin_fonts_use_winansi() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(612.0, 792.0).unwrap();
    let pdf = output(doc);
    assert!(pdf.contains("/BaseFont /Helvetica "));
    assert!(pdf.contains("/BaseFont /Helvetica-Bold"));
    assert!(pdf.contains("/Encoding /WinAnsiEncoding"));
}

#[test]
fn only_regular_and_bold_faces_are_declared() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(612.0, 792.0).unwrap();
    let pdf = output(doc);
    assert_eq!(pdf.matches("/Type /Font").count(), 2);
    assert!(pdf.contains("/Font << /F1 3 0 R /F2 4 0 R >>"));
    assert!(!pdf.contains("Oblique"));
}

#[test]
fn info_entries_are_written() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.set_info("Title", "Invoice 12").set_info("Creator", "tests");
    doc.begin_page(612.0, 792.0).unwrap();
    let pdf = output(doc);
    assert!(pdf.contains("/Title (Invoice 12)"));
    assert!(pdf.contains("/Info "));
}

#[test]
fn tall_page_keeps_its_height() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(612.0, 1202.0).unwrap();
    assert!(output(doc).contains("/MediaBox [0.0 0.0 612.0 1202.0]"));
}

// -------------------------------------------------------
// Content
// -------------------------------------------------------

#[test]
fn text_is_placed_at_baseline() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(612.0, 792.0)
        .unwrap()
        .place_text("TOTAL", 395.0, 400.5, BuiltinFont::HelveticaBold, 12.0);
    let pdf = output(doc);
    assert!(pdf.contains("/F2 12 Tf\n395 400.5 Td\n(TOTAL) Tj"));
}

#[test]
fn latin1_text_is_escaped_as_octal() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(612.0, 792.0)
        .unwrap()
        .place_text("Café (x)", 10.0, 10.0, BuiltinFont::Helvetica, 10.0);
    let pdf = output(doc);
    assert!(pdf.contains("(Caf\\351 \\(x\\)) Tj"));
}

#[test]
fn dashed_gray_line() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(612.0, 792.0)
        .unwrap()
        .save_state()
        .set_stroke_color(Color::gray(0.4))
        .set_dash(Some(DashPattern::new(3.0, 3.0)))
        .move_to(60.0, 100.0)
        .line_to(552.0, 100.0)
        .stroke()
        .restore_state();
    let pdf = output(doc);
    assert!(pdf.contains("0.4 0.4 0.4 RG\n[3 3] 0 d\n60 100 m\n552 100 l\nS\nQ"));
}

#[test]
fn filled_rect() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.begin_page(612.0, 792.0)
        .unwrap()
        .set_fill_color(Color::from_hex("#EEEEEE").unwrap())
        .rect(60.0, 462.0, 492.0, 20.0)
        .fill();
    let pdf = output(doc);
    assert!(pdf.contains("0.9333 0.9333 0.9333 rg\n60 462 492 20 re\nf"));
}

#[test]
fn drawing_without_a_page_is_dropped() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.place_text("lost", 0.0, 0.0, BuiltinFont::Helvetica, 12.0);
    doc.begin_page(612.0, 792.0).unwrap();
    assert!(!output(doc).contains("(lost)"));
}

#[test]
fn compressed_content_inflates() {
    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    doc.set_compression(true);
    doc.begin_page(612.0, 792.0)
        .unwrap()
        .place_text("Hidden", 10.0, 10.0, BuiltinFont::Helvetica, 12.0);
    let bytes = doc.end_document().unwrap();
    let pdf = String::from_utf8_lossy(&bytes);
    assert!(pdf.contains("/Filter /FlateDecode"));
    assert!(!pdf.contains("(Hidden) Tj"));

    let start = find(&bytes, b"stream\n").unwrap() + 7;
    let len = find(&bytes[start..], b"\nendstream").unwrap();
    let mut inflated = String::new();
    ZlibDecoder::new(&bytes[start..start + len])
        .read_to_string(&mut inflated)
        .unwrap();
    assert!(inflated.contains("(Hidden) Tj"));
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// -------------------------------------------------------
// Images
// -------------------------------------------------------

#[test]
fn png_with_alpha_gets_smask() {
    let image = ImageData::from_bytes(rgba_png(4, 2)).unwrap();
    assert_eq!((image.width, image.height), (4, 2));
    assert!(image.smask.is_some());

    let mut doc = PdfDocument::new(Vec::<u8>::new()).unwrap();
    let id = doc.add_image(&image).unwrap();
    doc.begin_page(612.0, 792.0)
        .unwrap()
        .draw_image(id, 60.0, 682.0, 120.0, 60.0);
    let pdf = output(doc);
    assert!(pdf.contains("/SMask "));
    assert!(pdf.contains("/ColorSpace /DeviceGray"));
    assert!(pdf.contains("120 0 0 60 60 682 cm\n/Im0 Do"));
    assert!(pdf.contains("/XObject <<"));
}

#[test]
fn image_fit_keeps_aspect_ratio() {
    let image = ImageData::from_bytes(rgba_png(4, 2)).unwrap();
    assert_eq!(image.fit(120.0, 120.0), (120.0, 60.0));
}

#[test]
fn unknown_image_bytes_are_rejected() {
    assert!(ImageData::from_bytes(b"GIF89a......".to_vec()).is_err());
    assert!(ImageData::from_bytes(vec![0xFF]).is_err());
}

use std::io::Read;

use chrono::NaiveDate;
use flate2::read::ZlibDecoder;
use invoice_core::{
    InvoiceRequest, LineItem, LogoSource, RenderError, RenderInputError, Renderer, RendererConfig,
};
use rust_decimal::Decimal;

fn logo_png() -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, 4, 2);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[200u8; 4 * 2 * 4]).unwrap();
    }
    out
}

fn renderer(compress: bool) -> Renderer {
    let _ = env_logger::builder().is_test(true).try_init();
    Renderer::new(RendererConfig {
        logo: LogoSource::Bytes(logo_png()),
        compress,
        ..RendererConfig::default()
    })
    .unwrap()
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 9, 28).unwrap()
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

const WIDGET_ORDER: &[u8] = br#"{
    "customerName": "Gourav",
    "items": [{
        "name": "Widget",
        "primaryQuantity": 1,
        "secondaryQuantity": 0,
        "primaryUnitPrice": 9.99
    }]
}"#;

// -------------------------------------------------------
// End to end
// -------------------------------------------------------

#[test]
fn widget_order_renders_row_and_total() {
    let invoice = renderer(false).render_json(WIDGET_ORDER, date()).unwrap();
    assert_eq!(invoice.totals.display(), "$9.99");
    assert_eq!(invoice.rows[0].quantity_label.as_deref(), Some("1"));
    assert_eq!(invoice.rows[0].description, "Case - Widget");

    let pdf = text(&invoice.body);
    assert!(pdf.starts_with("%PDF-1.7"));
    assert!(pdf.contains("(Case - Widget) Tj"));
    assert!(pdf.contains("(1) Tj"));
    assert!(pdf.contains("(Gourav) Tj"));
    assert!(pdf.contains("(28/09/23) Tj"));
    // Row amount right-aligned in the AMOUNT column.
    assert!(pdf.contains("521.98 448.82 Td\n($9.99) Tj"));
    assert!(pdf.ends_with("%%EOF\n"));
}

#[test]
fn empty_order_renders_zero_total() {
    let invoice = renderer(false).render_json(br#"{"items": []}"#, date()).unwrap();
    let pdf = text(&invoice.body);
    assert!(pdf.contains("(Bill To) Tj"));
    assert!(pdf.contains("(Umami Food Services) Tj"));
    assert!(pdf.contains("(TOTAL) Tj"));
    assert!(pdf.contains("($0.00) Tj"));
    assert!(invoice.rows.is_empty());
}

#[test]
fn zero_quantity_item_does_not_fail() {
    let request = InvoiceRequest {
        items: vec![LineItem::named("Ghost")],
        ..InvoiceRequest::default()
    };
    let invoice = renderer(false).render_on(&request, date()).unwrap();
    assert_eq!(invoice.rows[0].quantity_label, None);
    assert!(text(&invoice.body).contains("(Case / Unit - Ghost) Tj"));
}

#[test]
fn rendering_is_deterministic_for_a_fixed_date() {
    let r = renderer(true);
    let a = r.render_json(WIDGET_ORDER, date()).unwrap();
    let b = r.render_json(WIDGET_ORDER, date()).unwrap();
    assert_eq!(a.body, b.body);
}

#[test]
fn due_date_follows_configuration() {
    let r = Renderer::new(RendererConfig {
        logo: LogoSource::Bytes(logo_png()),
        compress: false,
        due_in_days: 30,
        ..RendererConfig::default()
    })
    .unwrap();
    let pdf = text(&r.render_json(br#"{"invoiceNumber": "A-7"}"#, date()).unwrap().body);
    assert!(pdf.contains("(A-7) Tj"));
    assert!(pdf.contains("(28/10/23) Tj"));
    assert!(pdf.contains("/Title (Invoice A-7)"));
}

// -------------------------------------------------------
// Page size
// -------------------------------------------------------

#[test]
fn short_order_fits_letter_page() {
    let pdf = text(&renderer(false).render_json(WIDGET_ORDER, date()).unwrap().body);
    assert!(pdf.contains("/MediaBox [0.0 0.0 612.0 792.0]"));
}

#[test]
fn long_order_extends_the_page() {
    let request = InvoiceRequest {
        items: (0..40)
            .map(|i| LineItem::named(format!("Item {}", i)).with_secondary(1))
            .collect(),
        ..InvoiceRequest::default()
    };
    let invoice = renderer(false).render_on(&request, date()).unwrap();
    let pdf = text(&invoice.body);
    assert!(pdf.contains("/MediaBox [0.0 0.0 612.0 1202.0]"));
    assert!(pdf.contains("(Unit - Item 39) Tj"));
    assert_eq!(invoice.totals.display(), "$40.00");
}

// -------------------------------------------------------
// Output stream
// -------------------------------------------------------

#[test]
fn compressed_content_inflates_to_drawing_ops() {
    let invoice = renderer(true).render_json(WIDGET_ORDER, date()).unwrap();
    let body = &invoice.body;
    assert!(text(body).contains("/Filter /FlateDecode"));
    assert!(!text(body).contains("(Case - Widget) Tj"));

    let mut found = false;
    let mut rest = &body[..];
    while let Some(start) = find(rest, b"stream\n") {
        let data = &rest[start + 7..];
        let end = find(data, b"\nendstream").unwrap();
        let mut inflated = String::new();
        if ZlibDecoder::new(&data[..end]).read_to_string(&mut inflated).is_ok()
            && inflated.contains("(Case - Widget) Tj")
        {
            found = true;
        }
        rest = &data[end + b"\nendstream".len()..];
    }
    assert!(found, "no content stream carried the row text");
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[test]
fn headers_precede_body_in_http_response() {
    let invoice = renderer(true).render_json(WIDGET_ORDER, date()).unwrap();
    let mut out = Vec::new();
    invoice.write_http(&mut out).unwrap();

    let head_end = find(&out, b"\r\n\r\n").unwrap();
    let head = text(&out[..head_end]);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains("Content-Type: application/pdf"));
    assert!(head.contains("Content-Disposition: inline; filename=\"invoice.pdf\""));
    assert!(head.contains(&format!("Content-Length: {}", invoice.body.len())));
    assert_eq!(&out[head_end + 4..], &invoice.body[..]);
}

// -------------------------------------------------------
// Failures
// -------------------------------------------------------

#[test]
fn malformed_payload_is_an_input_error() {
    let err = renderer(true).render_json(b"{\"items\": [", date()).unwrap_err();
    assert!(matches!(err, RenderError::Input(RenderInputError::Json(_))));
    assert_eq!(err.client_message(), "PDF error; please try again;");

    let err = renderer(true)
        .render_json(br#"{"items": {"name": "x"}}"#, date())
        .unwrap_err();
    assert!(matches!(err, RenderError::Input(RenderInputError::ItemsNotArray)));
}

#[test]
fn oversized_amount_is_rejected_without_panicking() {
    let payload = br#"{"items": [
        {"name": "ok", "primaryQuantity": 1},
        {"name": "x", "primaryQuantity": 1e28, "primaryUnitPrice": 10}
    ]}"#;
    let err = renderer(false).render_json(payload, date()).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Input(RenderInputError::AmountOutOfRange { index: 1 })
    ));
    assert_eq!(err.client_message(), "PDF error; please try again;");
}

#[test]
fn oversized_total_is_rejected() {
    let big = || LineItem::named("x").with_primary(Decimal::MAX);
    let request = InvoiceRequest {
        items: vec![big(), big()],
        ..InvoiceRequest::default()
    };
    let err = renderer(false).render_on(&request, date()).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Input(RenderInputError::TotalOutOfRange)
    ));
}

#[test]
fn large_total_without_minor_units_still_renders() {
    let payload = br#"{"items": [{"name": "bulk", "primaryQuantity": "1e27"}]}"#;
    let invoice = renderer(false).render_json(payload, date()).unwrap();
    assert_eq!(invoice.totals.minor_units(), None);
    assert!(text(&invoice.body).contains("($1000000000000000000000000000.00) Tj"));
}

use std::fs;
use std::io::{self, Write};

use chrono::{Days, Local, NaiveDate};
use log::{debug, error, info};
use pdf_core::ImageData;

use crate::calculator::{checked_amount, InvoiceTotals, RenderedRow};
use crate::config::{LogoSource, RendererConfig};
use crate::error::{RenderError, RenderInputError};
use crate::layout::{layout_invoice, BillTo, InvoiceMeta, LayoutInput};
use crate::request::InvoiceRequest;
use crate::writer::{DocumentWriter, WriterOptions};

pub const CONTENT_TYPE: &str = "application/pdf";

/// Response metadata for a rendered invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseHeaders {
    pub content_type: &'static str,
    pub content_disposition: String,
    pub content_length: usize,
}

impl ResponseHeaders {
    fn inline(filename: &str, content_length: usize) -> Self {
        ResponseHeaders {
            content_type: CONTENT_TYPE,
            content_disposition: format!("inline; filename=\"{}\"", filename.replace('"', "")),
            content_length,
        }
    }

    /// Header name/value pairs in emission order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Content-Type", self.content_type.to_string()),
            ("Content-Disposition", self.content_disposition.clone()),
            ("Content-Length", self.content_length.to_string()),
        ]
    }
}

/// A finished invoice: headers, the complete body and the numbers
/// that went into it.
#[derive(Debug, Clone)]
pub struct RenderedInvoice {
    pub headers: ResponseHeaders,
    pub body: Vec<u8>,
    pub rows: Vec<RenderedRow>,
    pub totals: InvoiceTotals,
}

impl RenderedInvoice {
    /// Write a complete HTTP/1.1 response. Headers always precede the
    /// body.
    pub fn write_http<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "HTTP/1.1 200 OK\r\n")?;
        for (name, value) in self.headers.pairs() {
            write!(out, "{}: {}\r\n", name, value)?;
        }
        write!(out, "\r\n")?;
        out.write_all(&self.body)?;
        out.flush()
    }
}

/// Write the generic error response for a failed render.
pub fn write_http_error<W: Write>(err: &RenderError, mut out: W) -> io::Result<()> {
    let body = serde_json::json!({ "errorMessage": err.client_message() }).to_string();
    write!(
        out,
        "HTTP/1.1 {} Internal Server Error\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\r\n{}",
        err.status_code(),
        body.len(),
        body
    )?;
    out.flush()
}

/// Renders invoice requests. Holds only immutable state, so one
/// instance can be shared across concurrent requests.
pub struct Renderer {
    config: RendererConfig,
    logo: ImageData,
}

impl Renderer {
    /// Load and decode the configured logo. A missing or broken logo
    /// fails here, before any request is served.
    pub fn new(config: RendererConfig) -> Result<Self, RenderError> {
        let bytes = match &config.logo {
            LogoSource::Path(path) => fs::read(path).map_err(|source| RenderError::Asset {
                path: path.clone(),
                source,
            })?,
            LogoSource::Bytes(bytes) => bytes.clone(),
        };
        let logo = ImageData::from_bytes(bytes)?;
        info!("renderer ready, logo {}x{}", logo.width, logo.height);
        Ok(Self::with_logo(config, logo))
    }

    /// Use an already decoded logo.
    pub fn with_logo(config: RendererConfig, logo: ImageData) -> Self {
        Renderer { config, logo }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Render dated today (local time).
    pub fn render(&self, request: &InvoiceRequest) -> Result<RenderedInvoice, RenderError> {
        self.render_on(request, Local::now().date_naive())
    }

    /// Parse a JSON payload and render it.
    pub fn render_json(
        &self,
        payload: &[u8],
        date: NaiveDate,
    ) -> Result<RenderedInvoice, RenderError> {
        let request = InvoiceRequest::from_json(payload).map_err(|err| {
            error!("rejecting invoice payload: {}", err);
            RenderError::from(err)
        })?;
        self.render_on(&request, date)
    }

    /// Render with an explicit invoice date. The same request and date
    /// always produce the same bytes.
    pub fn render_on(
        &self,
        request: &InvoiceRequest,
        date: NaiveDate,
    ) -> Result<RenderedInvoice, RenderError> {
        let overflowing = request.items.iter().position(|item| checked_amount(item).is_none());
        if let Some(index) = overflowing {
            error!("item {} amount overflows", index);
            return Err(RenderInputError::AmountOutOfRange { index }.into());
        }
        let rows: Vec<RenderedRow> = request.items.iter().map(RenderedRow::from_item).collect();
        let totals = InvoiceTotals::checked_from_rows(&rows).ok_or_else(|| {
            error!("order total overflows");
            RenderInputError::TotalOutOfRange
        })?;
        debug!("{} row(s), total {}", rows.len(), totals.formatted());

        let due_in_days = self.config.due_in_days;
        let due_date = date
            .checked_add_days(Days::new(due_in_days as u64))
            .ok_or_else(|| {
                RenderError::Config(format!("due date overflows {} + {} days", date, due_in_days))
            })?;
        let meta = InvoiceMeta {
            number: request.invoice_number.clone().unwrap_or_default(),
            date,
            due_date,
        };
        let layout = layout_invoice(&LayoutInput {
            company: &self.config.company,
            bill_to: BillTo {
                customer_name: request.customer_name.as_deref().unwrap_or_default(),
                business_name: request.business_name.as_deref().unwrap_or_default(),
                delivery_address: request.delivery_address.as_deref().unwrap_or_default(),
            },
            meta: &meta,
            rows: &rows,
            totals: &totals,
        });

        let options = WriterOptions {
            compress: self.config.compress,
            title: match &request.invoice_number {
                Some(number) => format!("Invoice {}", number),
                None => "Invoice".to_string(),
            },
        };
        let body = DocumentWriter::new(&self.logo, &options).write(&layout)?;

        Ok(RenderedInvoice {
            headers: ResponseHeaders::inline(&self.config.filename, body.len()),
            body,
            rows,
            totals,
        })
    }
}

//! Invoice document rendering.
//!
//! A request flows through three stages: the calculator turns line
//! items into rows and a total, the layout engine turns those into
//! drawing instructions, and the writer executes the instructions
//! against `pdf_core`. [`Renderer`] runs all three.

pub mod calculator;
pub mod config;
pub mod error;
pub mod layout;
pub mod render;
pub mod request;
pub mod writer;

pub use calculator::{InvoiceTotals, Quantity, RenderedRow};
pub use self::config::{CompanyProfile, LogoSource, RendererConfig};
pub use error::{RenderError, RenderInputError};
pub use render::{RenderedInvoice, Renderer, ResponseHeaders};
pub use request::{InvoiceRequest, LineItem};

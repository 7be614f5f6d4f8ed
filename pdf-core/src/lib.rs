//! Minimal PDF drawing surface: builtin fonts, colors, paths,
//! image XObjects and a single-pass writer with an xref table.

pub mod document;
pub mod fonts;
pub mod graphics;
pub mod images;
pub mod objects;
pub mod writer;

pub use document::PdfDocument;
pub use fonts::{BuiltinFont, FontMetrics};
pub use graphics::{Color, DashPattern};
pub use images::{ImageData, ImageError, ImageFormat, ImageId};

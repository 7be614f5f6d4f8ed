/// Standard Type1 fonts the document registers on every page.
/// These are guaranteed available in all PDF viewers without
/// embedding, so no font program is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
}

impl BuiltinFont {
    /// Every font the document declares in its page resources.
    pub const ALL: [BuiltinFont; 2] = [BuiltinFont::Helvetica, BuiltinFont::HelveticaBold];

    /// Resource name used in content streams (e.g. "F1").
    pub fn pdf_name(&self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "F1",
            BuiltinFont::HelveticaBold => "F2",
        }
    }

    /// PDF BaseFont name.
    pub fn pdf_base_name(&self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
        }
    }
}

/// Helvetica widths for ASCII 32..=126, 1/1000 em (Adobe AFM).
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold widths for ASCII 32..=126, 1/1000 em (Adobe AFM).
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Width used for characters outside the mapped range.
const DEFAULT_WIDTH: u16 = 278;

/// Helvetica family ascender, 1/1000 em.
const HELVETICA_ASCENT: u16 = 718;

/// Font metrics for the builtin fonts.
pub struct FontMetrics;

impl FontMetrics {
    /// Width of a character in 1/1000 em units.
    pub fn char_width(font: BuiltinFont, ch: char) -> u16 {
        let code = ch as u32;
        if !(32..=126).contains(&code) {
            return DEFAULT_WIDTH;
        }
        let index = (code - 32) as usize;
        match font {
            BuiltinFont::Helvetica => HELVETICA_WIDTHS[index],
            BuiltinFont::HelveticaBold => HELVETICA_BOLD_WIDTHS[index],
        }
    }

    /// Width of a text string in points.
    pub fn measure_text(text: &str, font: BuiltinFont, font_size: f64) -> f64 {
        let total: u32 = text
            .chars()
            .map(|ch| Self::char_width(font, ch) as u32)
            .sum();
        total as f64 * font_size / 1000.0
    }

    /// Distance from the top of a line to its baseline, in points.
    pub fn ascent(_font: BuiltinFont, font_size: f64) -> f64 {
        HELVETICA_ASCENT as f64 * font_size / 1000.0
    }
}

use thiserror::Error;

/// Errors raised while loading an image for embedding.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("image data too short to detect format")]
    TooShort,

    #[error("unsupported image format (expected JPEG or PNG)")]
    UnsupportedFormat,

    #[error("JPEG data has no usable SOF marker")]
    MissingSof,

    #[error("unsupported JPEG component count: {0} (expected 1 or 3)")]
    JpegComponents(u8),

    #[error("PNG decode error: {0}")]
    Png(#[from] png::DecodingError),

    #[error("unsupported PNG color type: {0:?}")]
    PngColorType(png::ColorType),
}

/// Handle to an image registered with a `PdfDocument`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// PDF color space for image samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceRGB,
    DeviceGray,
}

impl ColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceGray => "DeviceGray",
        }
    }
}

/// Decoded image ready to be written as an image XObject.
///
/// JPEG bytes are kept as-is (DCTDecode). PNG data is decoded to
/// 8-bit samples with any alpha split into `smask`.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub color_space: ColorSpace,
    pub data: Vec<u8>,
    pub smask: Option<Vec<u8>>,
}

impl ImageData {
    /// Decode image bytes, sniffing the format from magic bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ImageError> {
        match detect_format(&data)? {
            ImageFormat::Jpeg => parse_jpeg(data),
            ImageFormat::Png => parse_png(&data),
        }
    }

    /// Size of the image scaled to fit a `max_w` × `max_h` box with
    /// its aspect ratio preserved.
    pub fn fit(&self, max_w: f64, max_h: f64) -> (f64, f64) {
        let (iw, ih) = (self.width as f64, self.height as f64);
        if iw == 0.0 || ih == 0.0 {
            return (0.0, 0.0);
        }
        let scale = (max_w / iw).min(max_h / ih);
        (iw * scale, ih * scale)
    }
}

pub fn detect_format(data: &[u8]) -> Result<ImageFormat, ImageError> {
    match data {
        [0xFF, 0xD8, _, _, ..] => Ok(ImageFormat::Jpeg),
        [0x89, b'P', b'N', b'G', ..] => Ok(ImageFormat::Png),
        _ if data.len() < 4 => Err(ImageError::TooShort),
        _ => Err(ImageError::UnsupportedFormat),
    }
}

fn parse_jpeg(data: Vec<u8>) -> Result<ImageData, ImageError> {
    let (width, height, components) = jpeg_dimensions(&data)?;
    let color_space = match components {
        1 => ColorSpace::DeviceGray,
        3 => ColorSpace::DeviceRGB,
        n => return Err(ImageError::JpegComponents(n)),
    };
    Ok(ImageData {
        width,
        height,
        format: ImageFormat::Jpeg,
        color_space,
        data,
        smask: None,
    })
}

/// Walk JPEG segments until a SOF0..SOF3 marker yields the frame size.
fn jpeg_dimensions(data: &[u8]) -> Result<(u32, u32, u8), ImageError> {
    let mut i = 2;
    while i + 3 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = data[i + 1];
        match marker {
            0xC0..=0xC3 => {
                if i + 9 >= data.len() {
                    break;
                }
                let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
                let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
                return Ok((width, height, data[i + 9]));
            }
            0xFF | 0x00 => i += 1,
            0xD8 | 0xD9 | 0xD0..=0xD7 => i += 2,
            _ => {
                let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
                i += 2 + seg_len;
            }
        }
    }
    Err(ImageError::MissingSof)
}

fn parse_png(data: &[u8]) -> Result<ImageData, ImageError> {
    let mut decoder = png::Decoder::new(data);
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    buf.truncate(info.buffer_size());

    let (color_space, channels, has_alpha) = match info.color_type {
        png::ColorType::Rgb => (ColorSpace::DeviceRGB, 3, false),
        png::ColorType::Rgba => (ColorSpace::DeviceRGB, 4, true),
        png::ColorType::Grayscale => (ColorSpace::DeviceGray, 1, false),
        png::ColorType::GrayscaleAlpha => (ColorSpace::DeviceGray, 2, true),
        other => return Err(ImageError::PngColorType(other)),
    };

    let (data, smask) = if has_alpha {
        let color_channels = channels - 1;
        let pixels = buf.len() / channels;
        let mut color = Vec::with_capacity(pixels * color_channels);
        let mut alpha = Vec::with_capacity(pixels);
        for px in buf.chunks_exact(channels) {
            color.extend_from_slice(&px[..color_channels]);
            alpha.push(px[color_channels]);
        }
        (color, Some(alpha))
    } else {
        (buf, None)
    };

    Ok(ImageData {
        width: info.width,
        height: info.height,
        format: ImageFormat::Png,
        color_space,
        data,
        smask,
    })
}

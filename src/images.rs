use std::borrow::Cow;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation as ExifOrientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};

use crate::error::Error;

/// Raster decoding/encoding capability the renderer relies on. The renderer
/// never touches pixels itself.
pub trait ImageCodec {
    /// Pixel dimensions of an encoded image as displayed, after any EXIF
    /// rotation.
    fn decode_dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), Error>;

    /// Downsample so the longer edge is at most `max_long_edge` pixels, upright.
    /// Opaque images become JPEG at `quality` (1-100); images with an alpha
    /// channel stay lossless so their transparency survives.
    fn reencode(&self, bytes: &[u8], max_long_edge: u32, quality: u8) -> Result<Vec<u8>, Error>;
}

/// Codec backed by the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct RasterCodec;

impl ImageCodec for RasterCodec {
    fn decode_dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), Error> {
        let mut decoder = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_decoder()?;
        let (w, h) = decoder.dimensions();
        let orientation = decoder.orientation().unwrap_or(ExifOrientation::NoTransforms);
        Ok(if swaps_axes(orientation) { (h, w) } else { (w, h) })
    }

    fn reencode(&self, bytes: &[u8], max_long_edge: u32, quality: u8) -> Result<Vec<u8>, Error> {
        let decoded = decode_upright(bytes)?;
        let (tw, th) = scaled_dimensions(decoded.width(), decoded.height(), max_long_edge);
        let resized = if (tw, th) == (decoded.width(), decoded.height()) {
            decoded
        } else {
            decoded.resize_exact(tw, th, FilterType::Triangle)
        };
        let mut out = Vec::new();
        if resized.color().has_alpha() {
            resized.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
        } else {
            let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
            encoder.encode_image(&resized.to_rgb8())?;
        }
        Ok(out)
    }
}

fn swaps_axes(orientation: ExifOrientation) -> bool {
    matches!(
        orientation,
        ExifOrientation::Rotate90
            | ExifOrientation::Rotate270
            | ExifOrientation::Rotate90FlipH
            | ExifOrientation::Rotate270FlipH
    )
}

/// EXIF orientation of an encoded image; identity when absent or unreadable.
pub(crate) fn exif_orientation(bytes: &[u8]) -> ExifOrientation {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .and_then(|reader| reader.into_decoder().ok())
        .and_then(|mut decoder| decoder.orientation().ok())
        .unwrap_or(ExifOrientation::NoTransforms)
}

/// Decode with the EXIF orientation applied.
pub(crate) fn decode_upright(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(ExifOrientation::NoTransforms);
    let mut decoded = DynamicImage::from_decoder(decoder)?;
    decoded.apply_orientation(orientation);
    Ok(decoded)
}

/// Target size for a downsample bounded by `max_long_edge`; never upscales and
/// never returns a zero dimension.
pub(crate) fn scaled_dimensions(width: u32, height: u32, max_long_edge: u32) -> (u32, u32) {
    let long = width.max(height);
    if long == 0 || long <= max_long_edge {
        return (width.max(1), height.max(1));
    }
    let scale = max_long_edge as f64 / long as f64;
    let tw = ((width as f64 * scale).round() as u32).max(1);
    let th = ((height as f64 * scale).round() as u32).max(1);
    (tw, th)
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Limits {
    pub(crate) max_long_edge: u32,
    pub(crate) quality: u8,
}

pub(crate) struct Prepared<'a> {
    pub(crate) bytes: Cow<'a, [u8]>,
    /// Pixel dimensions when the codec could read them.
    pub(crate) dimensions: Option<(u32, u32)>,
}

/// Bound an image's pixel size before embedding. Images within the limit are
/// kept byte-for-byte; codec failures keep the original bytes.
pub(crate) fn preprocess<'a>(
    codec: &dyn ImageCodec,
    bytes: Cow<'a, [u8]>,
    limits: Limits,
) -> Prepared<'a> {
    let dimensions = match codec.decode_dimensions(&bytes) {
        Ok(dims) => dims,
        Err(e) => {
            log::warn!("preprocess: cannot read dimensions ({e}); embedding as-is");
            return Prepared {
                bytes,
                dimensions: None,
            };
        }
    };

    if dimensions.0.max(dimensions.1) <= limits.max_long_edge {
        return Prepared {
            bytes,
            dimensions: Some(dimensions),
        };
    }

    match codec.reencode(&bytes, limits.max_long_edge, limits.quality) {
        Ok(out) => {
            log::debug!(
                "preprocess: {}x{} {} bytes -> {} bytes",
                dimensions.0,
                dimensions.1,
                bytes.len(),
                out.len()
            );
            let dims = codec
                .decode_dimensions(&out)
                .unwrap_or_else(|_| scaled_dimensions(dimensions.0, dimensions.1, limits.max_long_edge));
            Prepared {
                bytes: Cow::Owned(out),
                dimensions: Some(dims),
            }
        }
        Err(e) => {
            log::warn!("preprocess: re-encode failed ({e}); embedding original");
            Prepared {
                bytes,
                dimensions: Some(dimensions),
            }
        }
    }
}

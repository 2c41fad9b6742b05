use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::metadata::Orientation as ExifOrientation;
use image::{ColorType, ImageDecoder};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::error::Error;
use crate::fonts::{self, FontEntry, Weight, register_font, to_winansi_bytes};
use crate::images;
use crate::theme::{MM_PER_PT, PageSize, Rgb};

/// Control-point distance for a quarter circle drawn as one cubic Bézier.
const KAPPA: f32 = 0.552_284_8;

fn pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

fn unit_rgb(c: Rgb) -> (f32, f32, f32) {
    (c[0] as f32 / 255.0, c[1] as f32 / 255.0, c[2] as f32 / 255.0)
}

/// Axis-aligned box in millimetres, measured from the page's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Bounds {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True when `self` lies inside `outer`, allowing `eps` mm of float slack.
    pub fn fits_within(&self, outer: &Bounds, eps: f32) -> bool {
        self.x >= outer.x - eps
            && self.y >= outer.y - eps
            && self.right() <= outer.right() + eps
            && self.bottom() <= outer.bottom() + eps
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Paint {
    Fill,
    Stroke,
    FillStroke,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ColorRole {
    Fill,
    Stroke,
    Text,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct TextStyle {
    pub(crate) size: f32,
    pub(crate) weight: Weight,
    pub(crate) align: Align,
}

impl TextStyle {
    pub(crate) fn regular(size: f32) -> Self {
        TextStyle {
            size,
            weight: Weight::Regular,
            align: Align::Left,
        }
    }

    pub(crate) fn bold(size: f32) -> Self {
        TextStyle {
            size,
            weight: Weight::Bold,
            align: Align::Left,
        }
    }

    pub(crate) fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub(crate) fn right(mut self) -> Self {
        self.align = Align::Right;
        self
    }
}

/// An image that made it onto the page.
#[derive(Clone, Debug, PartialEq)]
pub struct Placed {
    pub bounds: Bounds,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// An image that was left out; the slot stays blank.
#[derive(Clone, Debug, PartialEq)]
pub struct Skipped {
    pub reason: String,
}

impl Skipped {
    fn new(reason: impl Into<String>) -> Self {
        Skipped {
            reason: reason.into(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct RoundedRectUnavailable;

#[derive(Clone)]
struct EmbeddedImage {
    pdf_name: String,
    pixel_width: u32,
    pixel_height: u32,
}

struct PageState {
    size: PageSize,
    content: Content,
}

/// Vector drawing surface over a PDF document. Coordinates are millimetres
/// from the top-left of the current page; the y-flip to PDF space happens
/// here and nowhere else.
pub(crate) struct Surface {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    fonts: Vec<FontEntry>,
    finished_pages: Vec<PageState>,
    current: PageState,
    image_xobjects: Vec<(String, Ref)>,
    image_cache: HashMap<u64, Result<EmbeddedImage, Skipped>>,
    fill: Rgb,
    stroke: Rgb,
    text_color: Rgb,
    line_width: f32,
}

fn check_page(size: PageSize) -> Result<(), Error> {
    if size.width.is_finite() && size.height.is_finite() && size.width > 0.0 && size.height > 0.0
    {
        Ok(())
    } else {
        Err(Error::InvalidPage {
            width: size.width,
            height: size.height,
        })
    }
}

impl Surface {
    /// Create a document with one empty page of `size`.
    pub(crate) fn new(size: PageSize) -> Result<Self, Error> {
        check_page(size)?;
        let mut pdf = Pdf::new();
        let catalog_id = Ref::new(1);
        let pages_id = Ref::new(2);
        let regular_ref = Ref::new(3);
        let bold_ref = Ref::new(4);
        let fonts = vec![
            register_font(&mut pdf, Weight::Regular, regular_ref),
            register_font(&mut pdf, Weight::Bold, bold_ref),
        ];
        Ok(Surface {
            pdf,
            next_id: 5,
            catalog_id,
            pages_id,
            fonts,
            finished_pages: Vec::new(),
            current: PageState {
                size,
                content: Content::new(),
            },
            image_xobjects: Vec::new(),
            image_cache: HashMap::new(),
            fill: [0, 0, 0],
            stroke: [0, 0, 0],
            text_color: [0, 0, 0],
            line_width: 0.2,
        })
    }

    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_id);
        self.next_id += 1;
        r
    }

    pub(crate) fn new_page(&mut self, size: PageSize) -> Result<(), Error> {
        check_page(size)?;
        let finished = std::mem::replace(
            &mut self.current,
            PageState {
                size,
                content: Content::new(),
            },
        );
        self.finished_pages.push(finished);
        Ok(())
    }

    pub(crate) fn page_count(&self) -> usize {
        self.finished_pages.len() + 1
    }

    fn flip_y(&self, y_mm: f32) -> f32 {
        pt(self.current.size.height - y_mm)
    }

    pub(crate) fn set_color(&mut self, role: ColorRole, rgb: Rgb) {
        match role {
            ColorRole::Fill => self.fill = rgb,
            ColorRole::Stroke => self.stroke = rgb,
            ColorRole::Text => self.text_color = rgb,
        }
    }

    pub(crate) fn set_line_width(&mut self, mm: f32) {
        self.line_width = mm;
    }

    fn begin_paint(&mut self, paint: Paint) {
        let (fr, fg, fb) = unit_rgb(self.fill);
        let (sr, sg, sb) = unit_rgb(self.stroke);
        let line_width = pt(self.line_width);
        let content = &mut self.current.content;
        content.save_state();
        if paint != Paint::Stroke {
            content.set_fill_rgb(fr, fg, fb);
        }
        if paint != Paint::Fill {
            content.set_stroke_rgb(sr, sg, sb);
            content.set_line_width(line_width);
        }
    }

    fn end_paint(&mut self, paint: Paint) {
        let content = &mut self.current.content;
        match paint {
            Paint::Fill => content.fill_nonzero(),
            Paint::Stroke => content.stroke(),
            Paint::FillStroke => content.fill_nonzero_and_stroke(),
        };
        content.restore_state();
    }

    pub(crate) fn rect(&mut self, b: Bounds, paint: Paint) {
        let y = self.flip_y(b.bottom());
        self.begin_paint(paint);
        self.current
            .content
            .rect(pt(b.x), y, pt(b.width), pt(b.height));
        self.end_paint(paint);
    }

    /// Rectangle with circular corners. Unavailable when the radius is not a
    /// positive finite value that fits inside half of each side.
    pub(crate) fn rounded_rect(
        &mut self,
        b: Bounds,
        radius: f32,
        paint: Paint,
    ) -> Result<(), RoundedRectUnavailable> {
        if !radius.is_finite()
            || radius <= 0.0
            || radius * 2.0 > b.width
            || radius * 2.0 > b.height
        {
            return Err(RoundedRectUnavailable);
        }
        let (x0, y0) = (pt(b.x), self.flip_y(b.bottom()));
        let (w, h, r) = (pt(b.width), pt(b.height), pt(radius));
        let k = r * KAPPA;

        self.begin_paint(paint);
        let c = &mut self.current.content;
        c.move_to(x0 + r, y0);
        c.line_to(x0 + w - r, y0);
        c.cubic_to(x0 + w - r + k, y0, x0 + w, y0 + r - k, x0 + w, y0 + r);
        c.line_to(x0 + w, y0 + h - r);
        c.cubic_to(x0 + w, y0 + h - r + k, x0 + w - r + k, y0 + h, x0 + w - r, y0 + h);
        c.line_to(x0 + r, y0 + h);
        c.cubic_to(x0 + r - k, y0 + h, x0, y0 + h - r + k, x0, y0 + h - r);
        c.line_to(x0, y0 + r);
        c.cubic_to(x0, y0 + r - k, x0 + r - k, y0, x0 + r, y0);
        c.close_path();
        self.end_paint(paint);
        Ok(())
    }

    /// Rounded rectangle, or a plain one when the rounded primitive is unavailable.
    pub(crate) fn rounded_or_plain(&mut self, b: Bounds, radius: f32, paint: Paint) {
        if self.rounded_rect(b, radius, paint).is_err() {
            log::debug!("rounded rect r={radius:.2} unavailable for {b:?}; drawing plain rect");
            self.rect(b, paint);
        }
    }

    pub(crate) fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let (ya, yb) = (self.flip_y(y1), self.flip_y(y2));
        self.begin_paint(Paint::Stroke);
        let c = &mut self.current.content;
        c.move_to(pt(x1), ya);
        c.line_to(pt(x2), yb);
        self.end_paint(Paint::Stroke);
    }

    /// Width of `text` in mm.
    pub(crate) fn measure_text(&self, text: &str, size: f32, weight: Weight) -> f32 {
        fonts::text_width(text, size, weight)
    }

    pub(crate) fn wrap_text(&self, text: &str, max_width: f32, size: f32, weight: Weight) -> Vec<String> {
        fonts::wrap_text(text, max_width, size, weight)
    }

    /// Draw `text` with its baseline at `y`. `x` is the left edge, centre or
    /// right edge depending on the style's alignment.
    pub(crate) fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
        let bytes = to_winansi_bytes(text);
        if bytes.is_empty() {
            return;
        }
        let width = self.measure_text(text, style.size, style.weight);
        let left = match style.align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };
        let baseline = self.flip_y(y);
        let (r, g, b) = unit_rgb(self.text_color);
        let c = &mut self.current.content;
        c.save_state();
        c.set_fill_rgb(r, g, b);
        c.begin_text();
        c.set_font(Name(style.weight.pdf_name().as_bytes()), style.size);
        c.next_line(pt(left), baseline);
        c.show(Str(&bytes));
        c.end_text();
        c.restore_state();
    }

    /// Draw an encoded raster stretched to `target`. Identical bytes are
    /// embedded once per document. Undecodable input is reported, not fatal.
    pub(crate) fn image(&mut self, bytes: &[u8], target: Bounds) -> Result<Placed, Skipped> {
        let valid_box = [target.x, target.y, target.width, target.height]
            .iter()
            .all(|v| v.is_finite())
            && target.width > 0.0
            && target.height > 0.0;
        if !valid_box {
            return Err(Skipped::new("empty placement box"));
        }
        let embedded = self.embed(bytes)?;
        let y = self.flip_y(target.bottom());
        let c = &mut self.current.content;
        c.save_state();
        c.transform([pt(target.width), 0.0, 0.0, pt(target.height), pt(target.x), y]);
        c.x_object(Name(embedded.pdf_name.as_bytes()));
        c.restore_state();
        Ok(Placed {
            bounds: target,
            pixel_width: embedded.pixel_width,
            pixel_height: embedded.pixel_height,
        })
    }

    fn embed(&mut self, bytes: &[u8]) -> Result<EmbeddedImage, Skipped> {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        let key = hasher.finish();
        if let Some(cached) = self.image_cache.get(&key) {
            return cached.clone();
        }
        let result = self.write_image_xobject(bytes);
        if let Err(ref skipped) = result {
            log::warn!("image skipped: {}", skipped.reason);
        }
        self.image_cache.insert(key, result.clone());
        result
    }

    fn write_image_xobject(&mut self, bytes: &[u8]) -> Result<EmbeddedImage, Skipped> {
        if bytes.is_empty() {
            return Err(Skipped::new("no image data"));
        }
        let format =
            image::guess_format(bytes).map_err(|e| Skipped::new(format!("unknown format: {e}")))?;

        if format == image::ImageFormat::Jpeg
            && let Some(embedded) = self.write_jpeg_passthrough(bytes)
        {
            return Ok(embedded);
        }

        let decoded =
            images::decode_upright(bytes).map_err(|e| Skipped::new(format!("decode failed: {e}")))?;
        let rgba: image::RgbaImage = decoded.to_rgba8();
        let (w, h) = (rgba.width(), rgba.height());
        let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

        let rgb_data: Vec<u8> = rgba
            .pixels()
            .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
            .collect();
        let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

        let smask_ref = if has_alpha {
            let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
            let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
            let mask_ref = self.alloc();
            let mut mask = self.pdf.image_xobject(mask_ref, &compressed_alpha);
            mask.filter(Filter::FlateDecode);
            mask.width(w as i32);
            mask.height(h as i32);
            mask.color_space().device_gray();
            mask.bits_per_component(8);
            Some(mask_ref)
        } else {
            None
        };

        let xobj_ref = self.alloc();
        let mut xobj = self.pdf.image_xobject(xobj_ref, &compressed_rgb);
        xobj.filter(Filter::FlateDecode);
        xobj.width(w as i32);
        xobj.height(h as i32);
        xobj.color_space().device_rgb();
        xobj.bits_per_component(8);
        if let Some(mask_ref) = smask_ref {
            xobj.s_mask(mask_ref);
        }
        drop(xobj);

        Ok(self.register_xobject(xobj_ref, w, h))
    }

    /// Embed JPEG bytes unchanged with DCTDecode. Returns `None` for colour
    /// types PDF cannot take directly, and for EXIF-rotated photos, so the
    /// caller transcodes instead.
    fn write_jpeg_passthrough(&mut self, bytes: &[u8]) -> Option<EmbeddedImage> {
        if images::exif_orientation(bytes) != ExifOrientation::NoTransforms {
            return None;
        }
        let decoder = JpegDecoder::new(Cursor::new(bytes)).ok()?;
        let (w, h) = decoder.dimensions();
        let gray = match decoder.color_type() {
            ColorType::L8 => true,
            ColorType::Rgb8 => false,
            _ => return None,
        };
        let xobj_ref = self.alloc();
        let mut xobj = self.pdf.image_xobject(xobj_ref, bytes);
        xobj.filter(Filter::DctDecode);
        xobj.width(w as i32);
        xobj.height(h as i32);
        if gray {
            xobj.color_space().device_gray();
        } else {
            xobj.color_space().device_rgb();
        }
        xobj.bits_per_component(8);
        drop(xobj);
        Some(self.register_xobject(xobj_ref, w, h))
    }

    fn register_xobject(&mut self, xobj_ref: Ref, w: u32, h: u32) -> EmbeddedImage {
        let pdf_name = format!("Im{}", self.image_xobjects.len() + 1);
        self.image_xobjects.push((pdf_name.clone(), xobj_ref));
        EmbeddedImage {
            pdf_name,
            pixel_width: w,
            pixel_height: h,
        }
    }

    /// Close the current page and serialize the whole document.
    pub(crate) fn finish(mut self, title: &str) -> Vec<u8> {
        let mut pages = std::mem::take(&mut self.finished_pages);
        pages.push(self.current);

        let n = pages.len();
        let mut next_id = self.next_id;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };
        let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let info_id = alloc();

        let mut pdf = self.pdf;
        let mut sizes = Vec::with_capacity(n);
        for (i, page) in pages.into_iter().enumerate() {
            let raw = page.content.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed)
                .filter(Filter::FlateDecode);
            sizes.push(page.size);
        }

        pdf.catalog(self.catalog_id).pages(self.pages_id);
        pdf.pages(self.pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        for i in 0..n {
            let size = sizes[i];
            let mut page = pdf.page(page_ids[i]);
            page.media_box(Rect::new(0.0, 0.0, pt(size.width), pt(size.height)))
                .parent(self.pages_id)
                .contents(content_ids[i]);
            let mut resources = page.resources();
            {
                let mut fonts = resources.fonts();
                for entry in &self.fonts {
                    fonts.pair(Name(entry.weight.pdf_name().as_bytes()), entry.font_ref);
                }
            }
            if !self.image_xobjects.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, xobj_ref) in &self.image_xobjects {
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }

        pdf.document_info(info_id)
            .title(TextStr(title))
            .producer(TextStr("certpdf"));

        pdf.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(8, 4, image::Rgba([200, 30, 30, 128]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn pages_are_counted_and_serialized() {
        let mut s = Surface::new(PageSize::A4).unwrap();
        s.text("Hola", 15.0, 20.0, TextStyle::bold(10.0));
        s.new_page(PageSize::A4).unwrap();
        assert_eq!(s.page_count(), 2);
        let bytes = s.finish("t");
        assert!(bytes.starts_with(b"%PDF-"));
        let pages = count(&bytes, b"/Type /Page") - count(&bytes, b"/Type /Pages");
        assert_eq!(pages, 2);
    }

    #[test]
    fn invalid_page_size_is_fatal() {
        let r = Surface::new(PageSize {
            width: 0.0,
            height: 297.0,
        });
        assert!(matches!(r, Err(Error::InvalidPage { .. })));
    }

    #[test]
    fn rounded_rect_rejects_oversized_radius() {
        let mut s = Surface::new(PageSize::A4).unwrap();
        let b = Bounds::new(10.0, 10.0, 20.0, 4.0);
        assert!(s.rounded_rect(b, 2.5, Paint::Fill).is_err());
        assert!(s.rounded_rect(b, 0.0, Paint::Fill).is_err());
        assert!(s.rounded_rect(b, 1.5, Paint::FillStroke).is_ok());
    }

    #[test]
    fn repeated_image_is_embedded_once() {
        let mut s = Surface::new(PageSize::A4).unwrap();
        let png = png_bytes();
        let first = s.image(&png, Bounds::new(10.0, 10.0, 20.0, 10.0)).unwrap();
        s.new_page(PageSize::A4).unwrap();
        let second = s.image(&png, Bounds::new(10.0, 10.0, 20.0, 10.0)).unwrap();
        assert_eq!(first.pixel_width, 8);
        assert_eq!(second.pixel_height, 4);
        assert_eq!(s.image_xobjects.len(), 1);
    }

    #[test]
    fn rotated_jpeg_is_drawn_upright() {
        let mut s = Surface::new(PageSize::A4).unwrap();
        let jpeg = crate::images::tests::oriented_jpeg(160, 120, 6);
        let placed = s.image(&jpeg, Bounds::new(10.0, 10.0, 30.0, 40.0)).unwrap();
        assert_eq!((placed.pixel_width, placed.pixel_height), (120, 160));
        let bytes = s.finish("t");
        assert_eq!(count(&bytes, b"/DCTDecode"), 0);
    }

    #[test]
    fn undecodable_image_is_skipped() {
        let mut s = Surface::new(PageSize::A4).unwrap();
        let r = s.image(b"not an image", Bounds::new(0.0, 0.0, 10.0, 10.0));
        assert!(r.is_err());
        let r = s.image(&png_bytes(), Bounds::new(0.0, 0.0, 0.0, 10.0));
        assert_eq!(r, Err(Skipped::new("empty placement box")));
    }
}

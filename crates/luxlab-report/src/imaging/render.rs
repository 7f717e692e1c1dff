//! Pixel work for product images. Everything here is synchronous and pure.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use luxlab_core::ImageBox;

use crate::error::ImageError;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const PLACEHOLDER_BG: Rgb<u8> = Rgb([248, 249, 249]);
const PLACEHOLDER_INK: Rgb<u8> = Rgb([44, 62, 80]);

const SHARPNESS: f32 = 1.2;
const SATURATION: f32 = 1.1;

/// Bordered frame drawn inside the canvas edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub color: Rgb<u8>,
    /// Number of coloured rings, separated by white rings of equal width.
    pub rings: u32,
    pub ring_width: u32,
}

impl Frame {
    /// Thin double gold frame.
    #[must_use]
    pub const fn gold() -> Self {
        Self {
            color: Rgb([201, 169, 110]),
            rings: 2,
            ring_width: 2,
        }
    }
}

/// Decodes `bytes`, fits the image into `image_box`, enhances it and encodes
/// it as JPEG at `quality`.
///
/// # Errors
///
/// [`ImageError::Decode`] for unreadable input, [`ImageError::Encode`] if
/// JPEG encoding fails.
pub fn render(
    bytes: &[u8],
    quality: u8,
    image_box: ImageBox,
    frame: Option<Frame>,
) -> Result<Vec<u8>, ImageError> {
    let decoded = image::load_from_memory(bytes).map_err(ImageError::Decode)?;
    let flat = flatten_on_white(&decoded.to_rgba8());
    let mut canvas = fit_on_canvas(&flat, image_box);
    autocontrast(&mut canvas);
    let mut canvas = sharpen(&canvas, SHARPNESS);
    saturate(&mut canvas, SATURATION);
    if let Some(frame) = frame {
        draw_frame(&mut canvas, frame);
    }
    encode_jpeg(&canvas, quality)
}

/// Deterministic stand-in used whenever a real image cannot be produced.
/// Identical inputs always give identical bytes.
///
/// # Errors
///
/// [`ImageError::Encode`] if JPEG encoding fails.
pub fn placeholder(image_box: ImageBox, quality: u8) -> Result<Vec<u8>, ImageError> {
    let (w, h) = dims(image_box);
    let mut canvas = RgbImage::from_pixel(w, h, PLACEHOLDER_BG);

    let border = (w.min(h) / 100).max(1);
    stroke_rect(&mut canvas, 0, 0, w, h, border, PLACEHOLDER_INK);

    // Centered mark: an outlined square holding a filled one.
    let side = (w.min(h) / 4).max(4);
    let x = (w - side) / 2;
    let y = (h - side) / 2;
    stroke_rect(&mut canvas, x, y, side, side, (side / 16).max(1), PLACEHOLDER_INK);
    let inner = side / 3;
    fill_rect(&mut canvas, x + (side - inner) / 2, y + (side - inner) / 2, inner, inner, PLACEHOLDER_INK);

    encode_jpeg(&canvas, quality)
}

fn dims(image_box: ImageBox) -> (u32, u32) {
    (image_box.width.max(16), image_box.height.max(16))
}

/// Composites RGBA onto white, dropping the alpha channel.
fn flatten_on_white(rgba: &image::RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = f32::from(a) / 255.0;
        let blend = |c: u8| to_u8(f32::from(c) * alpha + 255.0 * (1.0 - alpha));
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Scales `img` to fit inside the box minus a 5% margin on each side (never
/// enlarging) and centres it on a white canvas of exactly the box size.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn fit_on_canvas(img: &RgbImage, image_box: ImageBox) -> RgbImage {
    let (w, h) = dims(image_box);
    let inner_w = w - 2 * (w / 20);
    let inner_h = h - 2 * (h / 20);

    let scale = (f64::from(inner_w) / f64::from(img.width().max(1)))
        .min(f64::from(inner_h) / f64::from(img.height().max(1)))
        .min(1.0);
    let nw = ((f64::from(img.width()) * scale).round() as u32).clamp(1, inner_w);
    let nh = ((f64::from(img.height()) * scale).round() as u32).clamp(1, inner_h);

    let resized = if (nw, nh) == img.dimensions() {
        img.clone()
    } else {
        imageops::resize(img, nw, nh, FilterType::Lanczos3)
    };

    let mut canvas = RgbImage::from_pixel(w, h, WHITE);
    imageops::overlay(
        &mut canvas,
        &resized,
        i64::from((w - nw) / 2),
        i64::from((h - nh) / 2),
    );
    canvas
}

/// Stretches each channel so its darkest value maps to 0 and its brightest
/// to 255.
fn autocontrast(img: &mut RgbImage) {
    let mut lo = [u8::MAX; 3];
    let mut hi = [u8::MIN; 3];
    for px in img.pixels() {
        for c in 0..3 {
            lo[c] = lo[c].min(px.0[c]);
            hi[c] = hi[c].max(px.0[c]);
        }
    }
    for px in img.pixels_mut() {
        for c in 0..3 {
            if hi[c] > lo[c] {
                let span = f32::from(hi[c] - lo[c]);
                px.0[c] = to_u8(f32::from(px.0[c] - lo[c]) * 255.0 / span);
            }
        }
    }
}

/// Blends away from a smoothed copy; `factor` 1.0 is the identity.
fn sharpen(img: &RgbImage, factor: f32) -> RgbImage {
    let smooth: RgbImage = imageops::filter3x3(img, &[1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0]);
    let mut out = img.clone();
    for (o, s) in out.pixels_mut().zip(smooth.pixels()) {
        for c in 0..3 {
            let base = f32::from(s.0[c]);
            o.0[c] = to_u8(base + factor * (f32::from(o.0[c]) - base));
        }
    }
    out
}

/// Blends away from the greyscale value; `factor` 1.0 is the identity.
fn saturate(img: &mut RgbImage, factor: f32) {
    for px in img.pixels_mut() {
        let [r, g, b] = px.0.map(f32::from);
        let grey = 0.299 * r + 0.587 * g + 0.114 * b;
        px.0 = [r, g, b].map(|c| to_u8(grey + factor * (c - grey)));
    }
}

fn draw_frame(img: &mut RgbImage, frame: Frame) {
    let (w, h) = img.dimensions();
    let width = frame.ring_width.max(1);
    for ring in 0..frame.rings {
        let inset = ring * width * 2;
        if inset * 2 + width * 2 >= w.min(h) {
            break;
        }
        stroke_rect(img, inset, inset, w - 2 * inset, h - 2 * inset, width, frame.color);
    }
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

fn stroke_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, t: u32, color: Rgb<u8>) {
    let t = t.min(w / 2).min(h / 2).max(1);
    fill_rect(img, x, y, w, t, color);
    fill_rect(img, x, y + h - t, w, t, color);
    fill_rect(img, x, y, t, h, color);
    fill_rect(img, x + w - t, y, t, h, color);
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .encode_image(img)
        .map_err(ImageError::Encode)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    fn png(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn placeholder_is_deterministic() {
        let a = placeholder(ImageBox::square(400), 85).unwrap();
        let b = placeholder(ImageBox::square(400), 85).unwrap();
        assert_eq!(a, b);
        let decoded = image::load_from_memory(&a).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 400));
    }

    #[test]
    fn render_fills_exactly_the_box() {
        let src = RgbaImage::from_pixel(1200, 600, Rgba([180, 40, 40, 255]));
        let out = render(&png(&src), 90, ImageBox::square(800), None).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 800));
    }

    #[test]
    fn transparency_is_flattened_onto_white() {
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        let flat = flatten_on_white(&src);
        assert!(flat.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn small_images_are_centred_not_enlarged() {
        let src = RgbImage::from_pixel(100, 50, Rgb([10, 10, 10]));
        let canvas = fit_on_canvas(&src, ImageBox::square(400));
        assert_eq!(canvas.dimensions(), (400, 400));
        assert_eq!(*canvas.get_pixel(200, 200), Rgb([10, 10, 10]));
        assert_eq!(*canvas.get_pixel(200, 170), WHITE);
        assert_eq!(*canvas.get_pixel(140, 200), WHITE);
    }

    #[test]
    fn autocontrast_stretches_range() {
        let mut img = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([50, 50, 50]) } else { Rgb([150, 150, 150]) });
        autocontrast(&mut img);
        assert_eq!(*img.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(1, 0), Rgb([255, 255, 255]));
    }

    #[test]
    fn saturation_leaves_greys_alone() {
        let mut img = RgbImage::from_pixel(1, 1, Rgb([120, 120, 120]));
        saturate(&mut img, SATURATION);
        assert_eq!(*img.get_pixel(0, 0), Rgb([120, 120, 120]));
    }

    #[test]
    fn frame_paints_the_outer_ring() {
        let mut img = RgbImage::from_pixel(50, 50, WHITE);
        draw_frame(&mut img, Frame::gold());
        assert_eq!(*img.get_pixel(0, 0), Frame::gold().color);
        assert_eq!(*img.get_pixel(2, 25), WHITE);
        assert_eq!(*img.get_pixel(4, 25), Frame::gold().color);
        assert_eq!(*img.get_pixel(25, 25), WHITE);
    }

    #[test]
    fn undecodable_bytes_are_an_error() {
        let err = render(b"not an image", 80, ImageBox::square(100), None).unwrap_err();
        assert!(matches!(err, ImageError::Decode(_)));
    }
}

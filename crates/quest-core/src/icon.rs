use crate::errors::{QuestError, Result};
use crate::platform::IconBitmap;
use crate::types::RawImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::io::Reader as ImageReader;
use image::{ColorType, GenericImageView};
use log::debug;
use std::path::Path;

/// Encode a platform icon as JPEG. Alpha is premultiplied onto black, the
/// same result the platform's own JPEG compression of an ARGB bitmap gives.
pub fn encode_icon_jpeg(bitmap: &IconBitmap, quality: u8) -> Result<Vec<u8>> {
    let (w, h) = (bitmap.width, bitmap.height);
    let expected = w as usize * h as usize * 4;
    if w == 0 || h == 0 || bitmap.rgba.len() != expected {
        return Err(QuestError::Msg(format!(
            "icon bitmap {w}x{h} has {} bytes, expected {expected}",
            bitmap.rgba.len()
        )));
    }

    let mut rgb = Vec::with_capacity(w as usize * h as usize * 3);
    for px in bitmap.rgba.chunks_exact(4) {
        let a = u16::from(px[3]);
        rgb.extend(px[..3].iter().map(|&c| ((u16::from(c) * a + 127) / 255) as u8));
    }

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode(
        &rgb,
        w,
        h,
        ColorType::Rgb8,
    )?;
    Ok(out)
}

/// Target size that keeps the aspect ratio and fits in `max_pixels`.
/// `None` when no scaling is needed (or `max_pixels` is 0, meaning unlimited).
pub fn fit_within(width: u32, height: u32, max_pixels: u64) -> Option<(u32, u32)> {
    if max_pixels == 0 || u64::from(width) * u64::from(height) <= max_pixels {
        return None;
    }
    let scale = (max_pixels as f64 / (f64::from(width) * f64::from(height))).sqrt();
    let mut w = ((f64::from(width) * scale).floor() as u32).max(1);
    let mut h = ((f64::from(height) * scale).floor() as u32).max(1);

    // very thin images: the short side got clamped up to 1
    let cap = u32::try_from(max_pixels).unwrap_or(u32::MAX);
    if h == 1 {
        w = w.min(cap);
    }
    if w == 1 {
        h = h.min(cap);
    }
    Some((w, h))
}

/// Decode an image file to RGBA8, downscaling so it holds at most `max_pixels`.
pub fn load_raw_image(path: &Path, max_pixels: u64) -> Result<RawImage> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let (w, h) = img.dimensions();

    let img = match fit_within(w, h, max_pixels) {
        Some((nw, nh)) => {
            debug!("{}: {w}x{h} scaled to {nw}x{nh}", path.display());
            img.resize_exact(nw, nh, FilterType::Triangle)
        }
        None => img,
    };

    let rgba = img.to_rgba8();
    Ok(RawImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

use image::{
    imageops::{self, FilterType},
    DynamicImage, GenericImageView, Pixel, Rgba, RgbaImage,
};

use crate::{
    data_loaders::settings::Settings,
    mode::{ModeFlag, Plan, Resolution},
};

const OPAQUE_BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Decoded inputs for one composition. Absent layers are left blank.
#[derive(Debug, Default, Clone, Copy)]
pub struct Layers<'a> {
    pub capture: Option<&'a DynamicImage>,
    pub wallpaper: Option<&'a DynamicImage>,
    pub overlay: Option<&'a DynamicImage>,
}

/// Renders background, color tint and overlay into a screen-sized image.
///
/// Returns `None` when the resolution does not call for compositing (empty
/// mode or a direct file copy). Cover compositions keep an alpha channel so
/// they can be laid over the host's view; everything else is opaque RGB.
pub fn compose(
    resolution: &Resolution,
    layers: &Layers<'_>,
    screen: (u32, u32),
    settings: &Settings,
) -> Option<DynamicImage> {
    if resolution.plan() != Plan::Compose {
        return None;
    }

    let (width, height) = screen;
    if width == 0 || height == 0 {
        return None;
    }

    let mut canvas = if resolution.cover {
        RgbaImage::new(width, height)
    } else {
        RgbaImage::from_pixel(width, height, OPAQUE_BLACK)
    };

    let background = if resolution.mode.contains(ModeFlag::Book) {
        layers.capture
    } else if resolution.mode.contains(ModeFlag::Wallpaper) {
        layers.wallpaper
    } else {
        None
    };
    if let Some(background) = background {
        paint_filled(&mut canvas, background);
    }

    if let Some(fill) = resolution.tint(settings).fill() {
        for pixel in canvas.pixels_mut() {
            pixel.blend(&fill);
        }
    }

    if resolution.mode.contains(ModeFlag::Overlay) {
        if let Some(overlay) = layers.overlay {
            paint_filled(&mut canvas, overlay);
        }
    }

    let canvas = DynamicImage::ImageRgba8(canvas);
    if resolution.cover {
        Some(canvas)
    } else {
        Some(DynamicImage::ImageRgb8(canvas.to_rgb8()))
    }
}

/// Size that covers `target` while keeping the aspect ratio of `source`.
pub fn fill_size(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = (u64::from(source.0), u64::from(source.1));
    let (tw, th) = (u64::from(target.0), u64::from(target.1));
    if sw == 0 || sh == 0 {
        return target;
    }

    let scaled_width = th * sw / sh;
    let (w, h) = if scaled_width >= tw {
        (scaled_width, th)
    } else {
        (tw, tw * sh / sw)
    };
    (w.clamp(1, u64::from(u32::MAX)) as u32, h.clamp(1, u64::from(u32::MAX)) as u32)
}

/// Part of a `source`-sized image that stays visible once it is scaled to
/// cover `target` and anchored at the top-left corner.
pub fn visible_source(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (scaled_w, scaled_h) = fill_size(source, target);
    let visible = |src: u32, tgt: u32, scaled: u32| -> u32 {
        let span = (u64::from(tgt) * u64::from(src)).div_ceil(u64::from(scaled));
        span.clamp(1, u64::from(src)) as u32
    };
    (
        visible(source.0, target.0, scaled_w),
        visible(source.1, target.1, scaled_h),
    )
}

/// Draws `layer` at the top-left corner, nearest-neighbour scaled to cover
/// the canvas when the sizes differ. Only the visible part is resampled.
fn paint_filled(canvas: &mut RgbaImage, layer: &DynamicImage) {
    if layer.width() == 0 || layer.height() == 0 {
        return;
    }

    let target = canvas.dimensions();
    if layer.dimensions() == target {
        imageops::overlay(canvas, &layer.to_rgba8(), 0, 0);
        return;
    }

    let (w, h) = visible_source(layer.dimensions(), target);
    let visible = imageops::crop_imm(layer, 0, 0, w, h).to_image();
    let scaled = imageops::resize(&visible, target.0, target.1, FilterType::Nearest);
    imageops::overlay(canvas, &scaled, 0, 0);
}

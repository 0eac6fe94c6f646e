//! Pixel-level drawing on RGB rasters

use image::{Rgb, RgbImage};

/// Line of the given width in pixels, stamped as a disc at every Bresenham
/// step. Pixels outside the image are clipped.
pub fn draw_thick_line(
    img: &mut RgbImage,
    from: (f64, f64),
    to: (f64, f64),
    width: f64,
    color: Rgb<u8>,
) {
    let radius = (width / 2.0).max(0.5);
    let r = radius.ceil() as i32;
    let r2 = radius * radius;
    let (x0, y0) = (from.0.round() as i32, from.1.round() as i32);
    let (x1, y1) = (to.0.round() as i32, to.1.round() as i32);
    plot_line(x0, y0, x1, y1, |cx, cy| {
        for dy in -r..=r {
            for dx in -r..=r {
                if ((dx * dx + dy * dy) as f64) <= r2 {
                    put(img, cx + dx, cy + dy, color);
                }
            }
        }
    });
}

/// Closed polygon through `points`, drawn with [`draw_thick_line`].
pub fn draw_closed_path(img: &mut RgbImage, points: &[(f64, f64)], width: f64, color: Rgb<u8>) {
    for (i, &p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        draw_thick_line(img, p, q, width, color);
    }
}

fn plot_line(x0: i32, y0: i32, x1: i32, y1: i32, mut plot: impl FnMut(i32, i32)) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        plot(x0, y0);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn put(img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

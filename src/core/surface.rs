//=========================================================================
// Surface
//
// Owned CPU raster: width x height RGBA pixels, row-major, 4 bytes per
// pixel. Surfaces are the only image representation in the engine; the
// asset layer hands them to drawable constructors and the presenter packs
// them into the window framebuffer.
//
// Responsibilities:
// - Pixel storage and per-pixel access (color, alpha probe for masks)
// - Alpha-blended blitting with an extra whole-surface opacity factor
// - Unblended rectangular copies for dirty-rectangle background restore
// - Derived-image resampling: rotation + uniform scale in one pass
//
//=========================================================================

use crate::core::geometry::{Point, Rect, Size};

//=== Rgba ================================================================

/// A non-premultiplied RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

//=== Surface =============================================================

/// A heap-allocated RGBA pixel grid.
///
/// Zero-width or zero-height surfaces are valid: they blit nothing and
/// every alpha probe on them reports transparent.
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    //--- Construction -----------------------------------------------------

    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Surface filled with a single color.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let mut surface = Self::new(width, height);
        surface.fill(color);
        surface
    }

    /// Wraps an existing RGBA byte buffer.
    ///
    /// # Panics
    ///
    /// Panics if `pixels.len() != width * height * 4`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert!(
            pixels.len() == (width as usize) * (height as usize) * 4,
            "pixel buffer must be width * height * 4 bytes, got {}",
            pixels.len()
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    //--- Accessors --------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Color at (x, y).
    ///
    /// # Panics
    ///
    /// Panics when the coordinate is out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let i = self.index(x, y);
        Rgba::new(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        )
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let i = self.index(x, y);
        self.pixels[i] = color.r;
        self.pixels[i + 1] = color.g;
        self.pixels[i + 2] = color.b;
        self.pixels[i + 3] = color.a;
    }

    /// Alpha channel at a signed coordinate; anything outside the surface
    /// is transparent. This is the mask probe used by hit testing.
    pub fn alpha_at(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0;
        }
        self.pixels[self.index(x as u32, y as u32) + 3]
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + x as usize) * 4
    }

    //--- Whole-Surface Operations -----------------------------------------

    pub fn fill(&mut self, color: Rgba) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk[0] = color.r;
            chunk[1] = color.g;
            chunk[2] = color.b;
            chunk[3] = color.a;
        }
    }

    //--- Blitting ---------------------------------------------------------

    /// Alpha-blends `src` onto this surface with its top-left corner at
    /// `pos`. `opacity` scales every source pixel's alpha; it is saturated
    /// into 0..=255 here, at the blit boundary.
    ///
    /// Source pixels falling outside this surface are clipped.
    pub fn blit(&mut self, src: &Surface, pos: Point, opacity: i32) {
        let op = opacity.clamp(0, 255) as u32;
        if op == 0 {
            return;
        }
        for sy in 0..src.height as i32 {
            let dy = pos.y + sy;
            if dy < 0 || dy >= self.height as i32 {
                continue;
            }
            for sx in 0..src.width as i32 {
                let dx = pos.x + sx;
                if dx < 0 || dx >= self.width as i32 {
                    continue;
                }

                let si = src.index(sx as u32, sy as u32);
                let a = (src.pixels[si + 3] as u32) * op / 255;
                if a == 0 {
                    continue;
                }

                let r = src.pixels[si] as u32;
                let g = src.pixels[si + 1] as u32;
                let b = src.pixels[si + 2] as u32;
                let di = self.index(dx as u32, dy as u32);

                if a >= 255 {
                    self.pixels[di] = r as u8;
                    self.pixels[di + 1] = g as u8;
                    self.pixels[di + 2] = b as u8;
                    self.pixels[di + 3] = 255;
                } else {
                    let inv = 255 - a;
                    let dr = self.pixels[di] as u32;
                    let dg = self.pixels[di + 1] as u32;
                    let db = self.pixels[di + 2] as u32;
                    let da = self.pixels[di + 3] as u32;
                    self.pixels[di] = ((r * a + dr * inv) / 255) as u8;
                    self.pixels[di + 1] = ((g * a + dg * inv) / 255) as u8;
                    self.pixels[di + 2] = ((b * a + db * inv) / 255) as u8;
                    self.pixels[di + 3] = (a + da * inv / 255) as u8;
                }
            }
        }
    }

    /// Copies the pixels of `src` inside `rect` straight into the same
    /// coordinates here, no blending. Used to restore the background under
    /// a drawable's previous position. The rect is clipped to both
    /// surfaces.
    pub fn copy_rect(&mut self, src: &Surface, rect: Rect) {
        let bounds = Rect::new(
            0,
            0,
            self.width.min(src.width),
            self.height.min(src.height),
        );
        let Some(clip) = rect.intersection(&bounds) else {
            return;
        };
        let row_bytes = clip.w as usize * 4;
        for row in 0..clip.h {
            let y = (clip.y as u32) + row;
            let di = self.index(clip.x as u32, y);
            let si = src.index(clip.x as u32, y);
            self.pixels[di..di + row_bytes].copy_from_slice(&src.pixels[si..si + row_bytes]);
        }
    }

    //--- Resampling -------------------------------------------------------

    /// Derives a new surface rotated by `angle` degrees (positive =
    /// counter-clockwise on screen) and uniformly scaled by `scale`, with
    /// the output sized to the rotated bounding box. Sampling is
    /// inverse-mapped nearest-neighbor; uncovered output pixels stay
    /// transparent.
    ///
    /// Non-positive scales produce an empty surface.
    pub fn rotozoom(&self, angle: f32, scale: f32) -> Surface {
        if scale <= 0.0 || self.size().is_empty() {
            return Surface::new(0, 0);
        }

        let rad = angle.to_radians();
        let (sin, cos) = rad.sin_cos();
        // Snap trig residue so exact quarter turns keep exact dimensions.
        let sin = snap_unit(sin);
        let cos = snap_unit(cos);
        let sw = self.width as f32 * scale;
        let sh = self.height as f32 * scale;
        let out_w = (sw * cos.abs() + sh * sin.abs()).ceil() as u32;
        let out_h = (sw * sin.abs() + sh * cos.abs()).ceil() as u32;

        let mut out = Surface::new(out_w, out_h);
        let half_ow = out_w as f32 / 2.0;
        let half_oh = out_h as f32 / 2.0;
        let half_sw = self.width as f32 / 2.0;
        let half_sh = self.height as f32 / 2.0;

        for dy in 0..out_h {
            let cy = dy as f32 + 0.5 - half_oh;
            for dx in 0..out_w {
                let cx = dx as f32 + 0.5 - half_ow;
                // Inverse rotation, then inverse scale, back to source space.
                let sx = ((cx * cos - cy * sin) / scale + half_sw).floor() as i32;
                let sy = ((cx * sin + cy * cos) / scale + half_sh).floor() as i32;
                if sx < 0 || sy < 0 || sx >= self.width as i32 || sy >= self.height as i32 {
                    continue;
                }
                let si = self.index(sx as u32, sy as u32);
                let di = out.index(dx, dy);
                out.pixels[di..di + 4].copy_from_slice(&self.pixels[si..si + 4]);
            }
        }
        out
    }

    /// Uniform scaling without rotation.
    pub fn scaled(&self, scale: f32) -> Surface {
        self.rotozoom(0.0, scale)
    }

    //--- Presentation -----------------------------------------------------

    /// Packs the surface into 0xAARRGGBB words for the window framebuffer.
    /// The alpha byte is forced opaque; the screen has nothing behind it.
    pub fn to_argb(&self) -> Vec<u32> {
        self.pixels
            .chunks_exact(4)
            .map(|p| {
                0xFF00_0000 | ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32
            })
            .collect()
    }
}

//=== Helpers =============================================================

/// Rounds values within 1e-6 of 0, 1, or -1 to the exact constant.
fn snap_unit(v: f32) -> f32 {
    if v.abs() < 1e-6 {
        0.0
    } else if (v.abs() - 1.0).abs() < 1e-6 {
        v.signum()
    } else {
        v
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

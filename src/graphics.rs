use crate::config::SimConfig;
use crate::mass::{mass_color, Mass};
use crate::math::deg_to_rad;

/// Canvas background
pub const BACKGROUND: Rgb = Rgb::from_hex(0xf4f4f4);
pub const SHAFT_COLOR: Rgb = Rgb::from_hex(0x555555);
pub const SUPPORT_COLOR: Rgb = Rgb::from_hex(0x888888);
pub const DISK_COLOR: Rgb = Rgb::from_hex(0x000000);

const SHAFT_WIDTH: f64 = 10.0;
const SUPPORT_WIDTH: f64 = 40.0;
const SUPPORT_HEIGHT: f64 = 60.0;
const BLOCK_WIDTH: f64 = 20.0;
const BLOCK_HEIGHT: f64 = 60.0;
const DISK_RADIUS: f64 = 15.0;

/// 24-bit colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Builds a colour from `0xRRGGBB`
    pub const fn from_hex(hex: u32) -> Self {
        Rgb {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }
}

impl From<Rgb> for crossterm::style::Color {
    fn from(color: Rgb) -> Self {
        crossterm::style::Color::Rgb {
            r: color.r,
            g: color.g,
            b: color.b,
        }
    }
}

/// Raster drawing surface.
///
/// Shapes are given in logical pixels and scaled onto a device raster that
/// may be smaller (one device pixel per half terminal cell). Anything outside
/// the raster is clipped.
pub struct Canvas {
    logical_width: f64,
    logical_height: f64,
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl Canvas {
    pub fn new(logical_width: f64, logical_height: f64, width: usize, height: usize) -> Self {
        Canvas {
            logical_width,
            logical_height,
            width,
            height,
            pixels: vec![BACKGROUND; width * height],
        }
    }

    pub fn logical_size(&self) -> (f64, f64) {
        (self.logical_width, self.logical_height)
    }

    /// Device raster size
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Changes the device raster size and clears it
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![BACKGROUND; width * height];
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(BACKGROUND);
    }

    fn scale(&self) -> (f64, f64) {
        (
            self.width as f64 / self.logical_width,
            self.height as f64 / self.logical_height,
        )
    }

    fn put(&mut self, x: isize, y: isize, color: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.pixels[y as usize * self.width + x as usize] = color;
        }
    }

    /// Fills every device pixel whose centre lies inside the rectangle
    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        if !(x.is_finite() && y.is_finite() && w.is_finite() && h.is_finite()) {
            return;
        }
        let (sx, sy) = self.scale();
        let (x0, x1) = pixel_span(x * sx, (x + w) * sx, self.width);
        let (y0, y1) = pixel_span(y * sy, (y + h) * sy, self.height);
        for py in y0..y1 {
            for px in x0..x1 {
                self.pixels[py * self.width + px] = color;
            }
        }
    }

    /// Fills a disk. The logical circle becomes an ellipse when the device
    /// raster is scaled unevenly.
    pub fn fill_disk(&mut self, cx: f64, cy: f64, radius: f64, color: Rgb) {
        if !(cx.is_finite() && cy.is_finite() && radius.is_finite()) || radius <= 0.0 {
            return;
        }
        let (sx, sy) = self.scale();
        let (dcx, dcy) = (cx * sx, cy * sy);
        let (rx, ry) = (radius * sx, radius * sy);
        let (x0, x1) = pixel_span(dcx - rx, dcx + rx, self.width);
        let (y0, y1) = pixel_span(dcy - ry, dcy + ry, self.height);
        for py in y0..y1 {
            for px in x0..x1 {
                let dx = (px as f64 + 0.5 - dcx) / rx;
                let dy = (py as f64 + 0.5 - dcy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    self.pixels[py * self.width + px] = color;
                }
            }
        }
        // Keep tiny disks visible at low resolution
        if x1 > x0 && y1 > y0 {
            self.put(dcx.floor() as isize, dcy.floor() as isize, color);
        }
    }

    /// Draws a line of the given logical width using Bresenham's algorithm
    /// with a square brush. The segment is clipped to the raster first, so
    /// endpoints far off the canvas cost nothing.
    pub fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64, color: Rgb) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let (sx, sy) = self.scale();
        let (x0, y0, x1, y1) = (x0 * sx, y0 * sy, x1 * sx, y1 * sy);
        if ![x0, y0, x1, y1, width].iter().all(|v| v.is_finite()) {
            return;
        }
        let half_x = ((width * sx) / 2.0).floor().clamp(0.0, self.width as f64);
        let half_y = ((width * sy) / 2.0).floor().clamp(0.0, self.height as f64);

        // Brush centres outside this box cannot touch the raster
        let x_max = self.width as f64 - 1.0 + half_x;
        let y_max = self.height as f64 - 1.0 + half_y;
        let Some((x0, y0, x1, y1)) = clip_axis(x0, y0, x1, y1, -half_x, x_max) else {
            return;
        };
        let Some((y0, x0, y1, x1)) = clip_axis(y0, x0, y1, x1, -half_y, y_max) else {
            return;
        };
        let device = |v: f64, min: f64, max: f64| v.clamp(min, max).floor() as isize;
        let (mut x0, mut y0, x1, y1) = (
            device(x0, -half_x, x_max),
            device(y0, -half_y, y_max),
            device(x1, -half_x, x_max),
            device(y1, -half_y, y_max),
        );
        let (half_x, half_y) = (half_x as isize, half_y as isize);

        let dx = x0.abs_diff(x1) as isize;
        let dy = -(y0.abs_diff(y1) as isize);
        let step_x = if x0 < x1 { 1 } else { -1 };
        let step_y = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            for by in -half_y..=half_y {
                for bx in -half_x..=half_x {
                    self.put(x0 + bx, y0 + by, color);
                }
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += step_x;
            }
            if e2 <= dx {
                err += dx;
                y0 += step_y;
            }
        }
    }
}

/// Clips a segment to `min..=max` along its first coordinate `a`, moving the
/// second coordinate `b` along the segment. Each cut is measured from the
/// opposite endpoint so that a far-away endpoint does not swamp the result.
fn clip_axis(
    a0: f64,
    b0: f64,
    a1: f64,
    b1: f64,
    min: f64,
    max: f64,
) -> Option<(f64, f64, f64, f64)> {
    if (a0 < min && a1 < min) || (a0 > max && a1 > max) {
        return None;
    }
    let slope = (b1 - b0) / (a1 - a0);
    let cut = |a: f64, b: f64, anchor_a: f64, anchor_b: f64| {
        let edge = if a < min {
            min
        } else if a > max {
            max
        } else {
            return (a, b);
        };
        let b = if slope == 0.0 {
            anchor_b
        } else {
            anchor_b + (edge - anchor_a) * slope
        };
        (edge, b)
    };
    let (c0, d0) = cut(a0, b0, a1, b1);
    let (c1, d1) = cut(a1, b1, a0, b0);
    [d0, d1]
        .iter()
        .all(|v| v.is_finite())
        .then_some((c0, d0, c1, d1))
}

/// Index range of device pixels whose centres fall in `[start, end)`
fn pixel_span(start: f64, end: f64, limit: usize) -> (usize, usize) {
    let first = (start - 0.5).ceil().max(0.0);
    let last = (end - 0.5).ceil().max(0.0);
    let first = (first as usize).min(limit);
    let last = (last as usize).min(limit);
    (first, last.max(first))
}

/// Where the shaft and the masses sit on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaftLayout {
    pub x_start: f64,
    pub length_px: f64,
    pub center_y: f64,
    pub radial_scale: f64,
    pub max_axial_position: f64,
}

impl ShaftLayout {
    pub fn from_config(config: &SimConfig) -> Self {
        ShaftLayout {
            x_start: config.shaft_x_start,
            length_px: config.shaft_pixels(),
            center_y: config.canvas_height / 2.0,
            radial_scale: config.radial_scale,
            max_axial_position: config.max_axial_position,
        }
    }

    pub fn x_end(&self) -> f64 {
        self.x_start + self.length_px
    }

    /// Canvas position of a mass seen end-on: its axial position maps along
    /// the shaft span, its radius swings vertically with the phase.
    pub fn mass_center(&self, mass: &Mass, phase_deg: f64) -> (f64, f64) {
        let x = self.x_start + (mass.axial_position / self.max_axial_position) * self.length_px;
        let swing = deg_to_rad(mass.angle + phase_deg).sin();
        let y = self.center_y + mass.radius * self.radial_scale * swing;
        (x, y)
    }
}

/// Clears the canvas and draws the shaft with its two supports
pub fn draw_shaft(canvas: &mut Canvas, layout: &ShaftLayout) {
    canvas.clear();
    canvas.draw_line(
        layout.x_start,
        layout.center_y,
        layout.x_end(),
        layout.center_y,
        SHAFT_WIDTH,
        SHAFT_COLOR,
    );
    for x in [layout.x_start, layout.x_end()] {
        canvas.fill_rect(
            x - SUPPORT_WIDTH / 2.0,
            layout.center_y - SUPPORT_HEIGHT / 2.0,
            SUPPORT_WIDTH,
            SUPPORT_HEIGHT,
            SUPPORT_COLOR,
        );
    }
}

/// Draws each mass as a coloured block with a black disk on top
pub fn draw_masses(canvas: &mut Canvas, layout: &ShaftLayout, masses: &[Mass], phase_deg: f64) {
    for (index, mass) in masses.iter().enumerate() {
        let (x, y) = layout.mass_center(mass, phase_deg);
        canvas.fill_rect(
            x - BLOCK_WIDTH / 2.0,
            y - BLOCK_HEIGHT / 2.0,
            BLOCK_WIDTH,
            BLOCK_HEIGHT,
            mass_color(index),
        );
        canvas.fill_disk(x, y, DISK_RADIUS, DISK_COLOR);
    }
}

/// Redraws the whole scene for one frame
pub fn render(canvas: &mut Canvas, layout: &ShaftLayout, masses: &[Mass], phase_deg: f64) {
    draw_shaft(canvas, layout);
    draw_masses(canvas, layout, masses, phase_deg);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_size_canvas() -> Canvas {
        Canvas::new(800.0, 400.0, 800, 400)
    }

    #[test]
    fn hex_colours() {
        assert_eq!(Rgb::from_hex(0xe74c3c), Rgb::new(0xe7, 0x4c, 0x3c));
    }

    #[test]
    fn shaft_and_supports_are_drawn() {
        let layout = ShaftLayout::from_config(&SimConfig::default());
        let mut canvas = full_size_canvas();
        draw_shaft(&mut canvas, &layout);

        assert_eq!(canvas.pixel(250, 200), Some(SHAFT_COLOR));
        assert_eq!(canvas.pixel(100, 180), Some(SUPPORT_COLOR));
        assert_eq!(canvas.pixel(400, 225), Some(SUPPORT_COLOR));
        assert_eq!(canvas.pixel(250, 150), Some(BACKGROUND));
        assert_eq!(canvas.pixel(600, 200), Some(BACKGROUND));
    }

    #[test]
    fn mass_moves_with_phase() {
        let layout = ShaftLayout::from_config(&SimConfig::default());
        let mass = Mass::new(1.0, 0.2, 0.0, 1.0);
        let (x, y) = layout.mass_center(&mass, 0.0);
        assert_eq!(x, 250.0);
        assert!((y - 200.0).abs() < 1e-9);

        let (_, y) = layout.mass_center(&mass, 90.0);
        assert!((y - 220.0).abs() < 1e-9);
    }

    #[test]
    fn render_draws_block_and_disk() {
        let layout = ShaftLayout::from_config(&SimConfig::default());
        let mut canvas = full_size_canvas();
        let masses = [Mass::new(1.0, 0.5, 90.0, 2.0)];
        render(&mut canvas, &layout, &masses, 0.0);

        // Mass centre at (400, 250)
        assert_eq!(canvas.pixel(400, 250), Some(DISK_COLOR));
        assert_eq!(canvas.pixel(392, 276), Some(mass_color(0)));
    }

    #[test]
    fn render_clears_previous_frame() {
        let layout = ShaftLayout::from_config(&SimConfig::default());
        let mut canvas = full_size_canvas();
        let masses = [Mass::new(1.0, 1.5, 270.0, 0.0)];
        render(&mut canvas, &layout, &masses, 0.0);
        assert_eq!(canvas.pixel(100, 50), Some(DISK_COLOR));

        render(&mut canvas, &layout, &[], 0.0);
        assert_eq!(canvas.pixel(100, 50), Some(BACKGROUND));
    }

    #[test]
    fn nan_mass_draws_nothing() {
        let layout = ShaftLayout::from_config(&SimConfig::default());
        let mut reference = full_size_canvas();
        draw_shaft(&mut reference, &layout);

        let mut canvas = full_size_canvas();
        render(&mut canvas, &layout, &[Mass::new(1.0, f64::NAN, 0.0, 0.5)], 0.0);
        assert!(canvas.pixels == reference.pixels);
    }

    #[test]
    fn shapes_off_canvas_are_clipped() {
        let mut canvas = Canvas::new(800.0, 400.0, 80, 20);
        canvas.fill_rect(-100.0, -100.0, 2000.0, 150.0, SHAFT_COLOR);
        canvas.fill_disk(900.0, 500.0, 300.0, DISK_COLOR);
        canvas.draw_line(-50.0, 390.0, 1000.0, 390.0, 30.0, SUPPORT_COLOR);
        assert_eq!(canvas.pixel(0, 0), Some(SHAFT_COLOR));
        assert_eq!(canvas.pixel(80, 0), None);
    }

    #[test]
    fn far_off_line_endpoint_is_clipped() {
        let mut canvas = Canvas::new(800.0, 400.0, 80, 40);
        canvas.draw_line(-1e30, 200.0, 400.0, 200.0, 10.0, SHAFT_COLOR);
        for x in 0..=40 {
            assert_eq!(canvas.pixel(x, 20), Some(SHAFT_COLOR), "x {x}");
        }
        assert_eq!(canvas.pixel(41, 20), Some(BACKGROUND));
        assert_eq!(canvas.pixel(10, 19), Some(BACKGROUND));
    }

    #[test]
    fn clipped_diagonal_keeps_its_slope() {
        let mut canvas = Canvas::new(800.0, 400.0, 80, 40);
        // y = x, starting well above and left of the raster
        canvas.draw_line(-5000.0, -5000.0, 300.0, 300.0, 0.0, SHAFT_COLOR);
        for i in 0..=30 {
            assert_eq!(canvas.pixel(i, i), Some(SHAFT_COLOR), "i {i}");
        }
        assert_eq!(canvas.pixel(31, 31), Some(BACKGROUND));
        assert_eq!(canvas.pixel(5, 0), Some(BACKGROUND));
    }

    #[test]
    fn line_missing_the_raster_draws_nothing() {
        let mut canvas = Canvas::new(800.0, 400.0, 80, 40);
        canvas.draw_line(-1e300, -50.0, 1e300, -50.0, 10.0, SHAFT_COLOR);
        canvas.draw_line(f64::MAX, 100.0, f64::MAX, 300.0, 10.0, SHAFT_COLOR);
        assert!(canvas.pixels.iter().all(|&p| p == BACKGROUND));
    }

    #[test]
    fn huge_shaft_layout_draws_without_overflow() {
        let config = SimConfig {
            shaft_x_start: -1e20,
            pixels_per_meter: 1e21,
            ..SimConfig::default()
        };
        let layout = ShaftLayout::from_config(&config);
        let mut canvas = full_size_canvas();
        draw_shaft(&mut canvas, &layout);
        assert_eq!(canvas.pixel(0, 200), Some(SHAFT_COLOR));
        assert_eq!(canvas.pixel(799, 200), Some(SHAFT_COLOR));
        assert_eq!(canvas.pixel(400, 150), Some(BACKGROUND));
    }

    #[test]
    fn downscaled_canvas_keeps_shapes() {
        let layout = ShaftLayout::from_config(&SimConfig::default());
        let mut canvas = Canvas::new(800.0, 400.0, 80, 40);
        render(&mut canvas, &layout, &[Mass::new(1.0, 0.0, 0.0, 1.0)], 0.0);
        assert_eq!(canvas.pixel(25, 20), Some(DISK_COLOR));
    }
}

//! Scene renderer.
//!
//! The scene is rasterised on an offscreen [`Surface`]. A visible
//! [`Viewer`] only copies that surface into a window, so hidden and visible
//! rendering produce the same pixels.
mod window;
use crate::{CartPoleError, CartPoleState};
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{
        draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut,
    },
    point::Point,
    rect::Rect,
};
use log::info;
use serde::{Deserialize, Serialize};
pub use window::CartPoleWindow;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const CART_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const POLE_COLOR: Rgb<u8> = Rgb([204, 153, 102]);
const AXLE_COLOR: Rgb<u8> = Rgb([127, 127, 204]);
const TRACK_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

// Sizes in pixels on the reference canvas width.
const REFERENCE_WIDTH: f64 = 600.0;
const CART_WIDTH: f64 = 50.0;
const CART_HEIGHT: f64 = 30.0;
const POLE_WIDTH: f64 = 10.0;

/// What [`CartPoleEnv::render`](crate::CartPoleEnv::render) returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Shows the frame for human inspection and returns nothing.
    Human,

    /// Returns the frame as a pixel array.
    RgbArray,
}

/// Configuration of the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Canvas width in pixels.
    pub width: u32,

    /// Canvas height in pixels.
    pub height: u32,

    /// If `true`, frames are also shown in a window.
    ///
    /// [`CartPoleEnv::render`](crate::CartPoleEnv::render) sets it on every call.
    pub visible: bool,

    /// Luma at or above which a pixel is white in binary observations.
    pub binary_threshold: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
            visible: false,
            binary_threshold: 128,
        }
    }
}

impl RenderConfig {
    /// Sets the canvas size.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Shows frames in a window if `true`.
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Sets the threshold of binary observations.
    pub fn binary_threshold(mut self, v: u8) -> Self {
        self.binary_threshold = v;
        self
    }

    /// Checks the canvas size.
    pub fn validate(&self) -> Result<(), CartPoleError> {
        if self.width == 0 || self.height == 0 {
            return Err(CartPoleError::InvalidConfiguration(format!(
                "canvas size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Offscreen drawing surface.
#[derive(Debug, Clone)]
pub struct Surface {
    image: RgbImage,
}

impl Surface {
    /// Creates a blank surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, BACKGROUND),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The pixels of the surface.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    fn clear(&mut self) {
        for p in self.image.pixels_mut() {
            *p = BACKGROUND;
        }
    }
}

/// Projection of the physical system onto the canvas.
///
/// The track `[-x_threshold, x_threshold]` spans the canvas width. Vertical
/// positions are measured upwards from the bottom edge and flipped when
/// drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    width: f64,
    height: f64,
    scale: f64,
    cart_y: f64,
    cart_width: f64,
    cart_height: f64,
    pole_width: f64,
    pole_len: f64,
    axle_offset: f64,
}

impl Scene {
    /// Builds the projection for a canvas and the physical sizes of the system.
    pub fn new(config: &RenderConfig, x_threshold: f64, pole_half_length: f64) -> Self {
        let width = config.width as f64;
        let height = config.height as f64;
        let unit = width / REFERENCE_WIDTH;
        let scale = width / (2.0 * x_threshold);
        let cart_height = CART_HEIGHT * unit;

        Self {
            width,
            height,
            scale,
            cart_y: height / 4.0,
            cart_width: CART_WIDTH * unit,
            cart_height,
            pole_width: POLE_WIDTH * unit,
            pole_len: scale * 2.0 * pole_half_length,
            axle_offset: cart_height / 4.0,
        }
    }

    /// Pixels per meter.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Horizontal pixel coordinate of the cart centre.
    pub fn cart_x(&self, x: f64) -> f64 {
        x * self.scale + self.width / 2.0
    }

    /// Pixel coordinates of the pole pivot in image space.
    pub fn pivot(&self, x: f64) -> (f64, f64) {
        self.to_image(self.cart_x(x), self.cart_y + self.axle_offset)
    }

    /// Pixel coordinates of the pole tip in image space.
    pub fn pole_tip(&self, state: &CartPoleState) -> (f64, f64) {
        let len = self.pole_len - self.pole_width / 2.0;
        let (sin, cos) = state.theta.sin_cos();
        self.to_image(
            self.cart_x(state.x) + len * sin,
            self.cart_y + self.axle_offset + len * cos,
        )
    }

    fn to_image(&self, x: f64, y: f64) -> (f64, f64) {
        (x, self.height - y)
    }

    fn point(&self, x: f64, y: f64) -> Point<i32> {
        let (u, v) = self.to_image(x, y);
        Point::new(self.pixel(u, self.width), self.pixel(v, self.height))
    }

    // Keeps coordinates within a band around the canvas so that the drawing
    // routines never see saturated values.
    fn pixel(&self, v: f64, extent: f64) -> i32 {
        v.max(-extent).min(2.0 * extent).round() as i32
    }

    /// Returns `true` if any part of the cart or pole can appear on the canvas.
    pub fn is_visible(&self, state: &CartPoleState) -> bool {
        let cart_x = self.cart_x(state.x);
        let reach = self.pole_len + self.cart_width;
        cart_x.is_finite()
            && state.theta.is_finite()
            && cart_x + reach >= 0.0
            && cart_x - reach <= self.width
    }

    /// Draws cart, pole, axle and track for `state`, replacing the previous frame.
    ///
    /// Only the track is drawn when the cart and pole are entirely off the
    /// canvas, or when the state is not finite.
    pub fn draw(&self, surface: &mut Surface, state: &CartPoleState) {
        surface.clear();
        if self.is_visible(state) {
            self.draw_system(&mut surface.image, state);
        }

        // Track
        let (_, track_y) = self.to_image(0.0, self.cart_y);
        let track_y = track_y as f32;
        draw_line_segment_mut(
            &mut surface.image,
            (0.0, track_y),
            ((self.width - 1.0) as f32, track_y),
            TRACK_COLOR,
        );
    }

    fn draw_system(&self, image: &mut RgbImage, state: &CartPoleState) {
        let cart_x = self.cart_x(state.x);

        // Cart
        let (left, top) = self.to_image(
            cart_x - self.cart_width / 2.0,
            self.cart_y + self.cart_height / 2.0,
        );
        let rect = Rect::at(self.pixel(left, self.width), self.pixel(top, self.height)).of_size(
            self.cart_width.round().max(1.0) as u32,
            self.cart_height.round().max(1.0) as u32,
        );
        draw_filled_rect_mut(image, rect, CART_COLOR);

        // Pole, a rectangle rotated about the pivot
        let (px, py) = (cart_x, self.cart_y + self.axle_offset);
        let (l, r) = (-self.pole_width / 2.0, self.pole_width / 2.0);
        let (t, b) = (self.pole_len - self.pole_width / 2.0, -self.pole_width / 2.0);
        let (sin, cos) = (-state.theta).sin_cos();
        let corners: Vec<Point<i32>> = [(l, b), (l, t), (r, t), (r, b)]
            .iter()
            .map(|(u, v)| self.point(px + u * cos - v * sin, py + u * sin + v * cos))
            .collect();
        if corners.first() != corners.last() {
            draw_polygon_mut(image, &corners, POLE_COLOR);
        }

        // Axle
        let (ax, ay) = self.to_image(px, py);
        let radius = (self.pole_width / 2.0).round().max(1.0) as i32;
        draw_filled_circle_mut(
            image,
            (self.pixel(ax, self.width), self.pixel(ay, self.height)),
            radius,
            AXLE_COLOR,
        );
    }
}

/// Drawing surface of an environment, with an optional window.
///
/// Created on the first render call and released by
/// [`CartPoleEnv::close`](crate::CartPoleEnv::close).
pub struct Viewer {
    surface: Surface,
    window: Option<CartPoleWindow>,
}

impl Viewer {
    /// Acquires the surface, and a window if `config.visible` is `true`.
    ///
    /// A hidden viewer never creates a window.
    pub fn new(config: &RenderConfig) -> Result<Self, CartPoleError> {
        config.validate()?;
        let window = if config.visible {
            Some(CartPoleWindow::new(config.width, config.height)?)
        } else {
            None
        };
        info!(
            "Open {} viewer ({}x{})",
            if config.visible { "visible" } else { "hidden" },
            config.width,
            config.height
        );

        Ok(Self {
            surface: Surface::new(config.width, config.height),
            window,
        })
    }

    /// Returns `true` if frames are shown in a window.
    pub fn is_visible(&self) -> bool {
        self.window.is_some()
    }

    /// Draws `state` on the surface.
    pub fn draw(&mut self, scene: &Scene, state: &CartPoleState) {
        scene.draw(&mut self.surface, state);
    }

    /// Shows the current surface in the window, if any.
    pub fn show(&mut self) -> Result<(), CartPoleError> {
        match self.window.as_mut() {
            Some(window) => window.show(self.surface.image()),
            None => Ok(()),
        }
    }

    /// The drawing surface.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene::new(&RenderConfig::default(), 2.4, 0.5)
    }

    fn draw(state: &CartPoleState) -> Surface {
        let mut surface = Surface::new(600, 400);
        scene().draw(&mut surface, state);
        surface
    }

    #[test]
    fn test_projection() {
        let scene = scene();
        assert_eq!(scene.scale(), 125.0);
        assert_eq!(scene.cart_x(0.0), 300.0);
        assert_eq!(scene.cart_x(-2.4), 0.0);
        assert_eq!(scene.cart_x(2.4), 600.0);
        assert_eq!(scene.pivot(0.0), (300.0, 292.5));
    }

    #[test]
    fn test_upright_frame() {
        let surface = draw(&CartPoleState::default());
        let image = surface.image();

        assert_eq!(*image.get_pixel(5, 5), BACKGROUND);
        assert_eq!(*image.get_pixel(10, 300), TRACK_COLOR);
        assert_eq!(*image.get_pixel(290, 310), CART_COLOR);
        assert_eq!(*image.get_pixel(300, 200), POLE_COLOR);
        assert_eq!(*image.get_pixel(300, 292), AXLE_COLOR);
        assert_eq!(*image.get_pixel(330, 200), BACKGROUND);
    }

    #[test]
    fn test_pole_leans_with_theta() {
        let theta = 30f64.to_radians();
        let state = CartPoleState::new(0.0, 0.0, theta, 0.0);
        let surface = draw(&state);
        let scene = scene();

        // A point on the pole axis, half way to the tip
        let (px, py) = scene.pivot(0.0);
        let (tx, ty) = scene.pole_tip(&state);
        assert!(tx > px);
        let mid = (((px + tx) / 2.0) as u32, ((py + ty) / 2.0) as u32);
        assert_eq!(*surface.image().get_pixel(mid.0, mid.1), POLE_COLOR);
        assert_eq!(*surface.image().get_pixel(300, 200), BACKGROUND);
    }

    #[test]
    fn test_cart_follows_position() {
        let surface = draw(&CartPoleState::new(1.0, 0.0, 0.0, 0.0));
        assert_eq!(*surface.image().get_pixel(425, 310), CART_COLOR);
        assert_eq!(*surface.image().get_pixel(290, 310), BACKGROUND);
    }

    #[test]
    fn test_redraw_clears_previous_frame() {
        let mut surface = Surface::new(600, 400);
        scene().draw(&mut surface, &CartPoleState::new(1.0, 0.0, 0.0, 0.0));
        scene().draw(&mut surface, &CartPoleState::default());

        let fresh = draw(&CartPoleState::default());
        assert_eq!(surface.image(), fresh.image());
    }

    #[test]
    fn test_off_canvas_cart() {
        // Far beyond the track, nothing but the track is drawn.
        let surface = draw(&CartPoleState::new(10.0, 0.0, 0.0, 0.0));
        assert!(surface
            .image()
            .pixels()
            .all(|p| *p == BACKGROUND || *p == TRACK_COLOR));
    }

    #[test]
    fn test_far_away_cart() {
        // Positions reached after very large forces
        for x in [3.9e8, -3.9e8, 1e300, f64::MAX, f64::INFINITY] {
            let state = CartPoleState::new(x, 0.0, 0.0, 0.0);
            assert!(!scene().is_visible(&state));
            let surface = draw(&state);
            assert_eq!(*surface.image().get_pixel(10, 300), TRACK_COLOR);
            assert!(surface
                .image()
                .pixels()
                .all(|p| *p == BACKGROUND || *p == TRACK_COLOR));
        }
    }

    #[test]
    fn test_non_finite_state() {
        for state in [
            CartPoleState::new(f64::NAN, 0.0, 0.0, 0.0),
            CartPoleState::new(0.0, 0.0, f64::NAN, 0.0),
            CartPoleState::new(0.0, f64::INFINITY, f64::NEG_INFINITY, f64::NAN),
        ] {
            let surface = draw(&state);
            assert_eq!(*surface.image().get_pixel(10, 300), TRACK_COLOR);
        }
    }

    #[test]
    fn test_partly_visible_cart() {
        // Cart centre just beyond the right edge, its left half on the canvas
        let state = CartPoleState::new(2.5, 0.0, 0.0, 0.0);
        assert!(scene().is_visible(&state));
        let surface = draw(&state);
        assert_eq!(*surface.image().get_pixel(590, 310), CART_COLOR);
    }

    #[test]
    fn test_hidden_viewer() {
        let config = RenderConfig::default().size(120, 80);
        let mut viewer = Viewer::new(&config).unwrap();
        assert!(!viewer.is_visible());

        let scene = Scene::new(&config, 2.4, 0.5);
        viewer.draw(&scene, &CartPoleState::default());
        viewer.show().unwrap();
        assert_eq!(viewer.surface().width(), 120);
        assert_eq!(viewer.surface().height(), 80);
    }

    #[test]
    fn test_zero_sized_canvas() {
        let config = RenderConfig::default().size(0, 80);
        assert!(matches!(
            Viewer::new(&config),
            Err(CartPoleError::InvalidConfiguration(_))
        ));
    }
}

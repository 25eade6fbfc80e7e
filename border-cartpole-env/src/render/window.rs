//! Window showing rendered frames.
//!
//! Available with the `window` feature. Without it, creating a window fails
//! with [`CartPoleError::RenderResourceError`] and only hidden rendering works.
use crate::CartPoleError;
use image::RgbImage;

#[cfg(feature = "window")]
mod imp {
    use super::*;
    use log::{debug, info};
    use minifb::{Window, WindowOptions};

    /// A window backed by `minifb`. Closed when dropped.
    pub struct CartPoleWindow {
        window: Window,
        buffer: Vec<u32>,
        width: usize,
        height: usize,
    }

    impl CartPoleWindow {
        /// Opens a window of the given size.
        pub fn new(width: u32, height: u32) -> Result<Self, CartPoleError> {
            let (width, height) = (width as usize, height as usize);
            let window = Window::new("Cart-pole", width, height, WindowOptions::default())
                .map_err(|e| CartPoleError::RenderResourceError(e.to_string()))?;
            info!("Open window ({}x{})", width, height);

            Ok(Self {
                window,
                buffer: vec![0; width * height],
                width,
                height,
            })
        }

        /// Copies `image` to the window.
        pub fn show(&mut self, image: &RgbImage) -> Result<(), CartPoleError> {
            if !self.window.is_open() {
                return Err(CartPoleError::RenderResourceError(
                    "the window has been closed".to_string(),
                ));
            }
            for (dst, p) in self.buffer.iter_mut().zip(image.pixels()) {
                let [r, g, b] = p.0;
                *dst = (255u32 << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32);
            }
            self.window
                .update_with_buffer(&self.buffer, self.width, self.height)
                .map_err(|e| CartPoleError::RenderResourceError(e.to_string()))
        }
    }

    impl Drop for CartPoleWindow {
        fn drop(&mut self) {
            debug!("Close window");
        }
    }
}

#[cfg(not(feature = "window"))]
mod imp {
    use super::*;

    /// Placeholder when the crate is built without the `window` feature.
    pub struct CartPoleWindow {
        _private: (),
    }

    impl CartPoleWindow {
        /// Always fails; the crate was built without window support.
        pub fn new(_width: u32, _height: u32) -> Result<Self, CartPoleError> {
            Err(CartPoleError::RenderResourceError(
                "built without the `window` feature".to_string(),
            ))
        }

        /// Does nothing.
        pub fn show(&mut self, _image: &RgbImage) -> Result<(), CartPoleError> {
            Ok(())
        }
    }
}

pub use imp::CartPoleWindow;

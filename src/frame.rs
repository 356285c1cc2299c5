use bitvec::prelude::*;

#[cfg(feature = "embedded-graphics")]
use embedded_graphics::{image::ImageRaw, pixelcolor::BinaryColor};

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;
pub(crate) const MEM_LENGTH: usize = WIDTH * HEIGHT / 8;

/// The 64x32 monochrome pixel buffer.
///
/// Rows are packed top to bottom, 8 bytes per row, the most significant
/// bit of each byte being the leftmost pixel. Only the draw and
/// clear-screen instructions mutate it; everyone else observes it
/// through a [`FrameView`].
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Frame([u8; MEM_LENGTH]);

impl Frame {
    pub(crate) fn new() -> Self {
        Self([0; MEM_LENGTH])
    }

    /// Get a shared view over the frame
    pub fn view(&self) -> FrameView<'_> {
        FrameView(&self.0)
    }

    pub(crate) fn clear(&mut self) {
        self.0 = [0; MEM_LENGTH];
    }

    /// XOR a single pixel on, wrapping coordinates at the screen edges.
    ///
    /// Returns `true` when a lit pixel got turned off, which is exactly
    /// the collision condition `DXYN` reports through `VF`.
    pub(crate) fn flip(&mut self, x: usize, y: usize) -> bool {
        let (x, y) = (x % WIDTH, y % HEIGHT);
        let mut collision = false;
        if let Some(row) = self.iter_rows_as_bitslices_mut().nth(y) {
            if let Some(mut bit) = row.get_mut(x) {
                collision = *bit;
                *bit ^= true;
            }
        }
        collision
    }

    fn iter_rows_as_bitslices_mut(&mut self) -> impl Iterator<Item = &mut BitSlice<Msb0, u8>> {
        self.0
            .chunks_mut(WIDTH / 8)
            .map(|row| row.view_bits_mut::<Msb0>())
    }
}

/// A shared view over a [`Frame`], handed to [`Context::on_frame`]
/// whenever a cycle changed the picture.
///
/// [`Context::on_frame`]: crate::context::Context::on_frame
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FrameView<'a>(&'a [u8; MEM_LENGTH]);

impl<'a> FrameView<'a> {
    /// View the raw packed memory of the frame
    pub fn as_raw(&self) -> &[u8] {
        self.0
    }

    /// Access a single pixel; `None` outside the 64x32 grid
    pub fn get_bit(&self, x: usize, y: usize) -> Option<&bool> {
        self.iter_rows_as_bitslices()
            .nth(y)
            .map(|row| row.get(x))
            .flatten()
    }

    /// Get an iterator over rows in a form of `BitSlice`s
    pub fn iter_rows_as_bitslices(&self) -> impl Iterator<Item = &'a BitSlice<Msb0, u8>> {
        self.0.chunks(WIDTH / 8).map(|row| row.view_bits::<Msb0>())
    }

    /// Get an `ImageRaw` over the frame's data
    #[cfg(feature = "embedded-graphics")]
    pub fn as_raw_image(&self) -> ImageRaw<'_, BinaryColor> {
        ImageRaw::new(self.as_raw(), WIDTH as u32, HEIGHT as u32)
    }
}

#[cfg(test)]
impl Frame {
    pub(crate) fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

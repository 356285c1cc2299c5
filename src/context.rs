//! Capability interface between the interpreter core and its front-end.
//!
//! The core never owns a screen, a speaker, a keyboard or an entropy
//! source; a front-end (terminal, graphical, embedded, or a headless
//! test harness) supplies all four by implementing [`Context`] and
//! injecting it at construction.

use crate::frame::FrameView;

/// Trait aggregating platform functionalities
pub trait Context {
    /// Accept the current picture
    ///
    /// Called by `tick_chip` after any cycle that changed the pixel
    /// buffer. The view is only valid for the duration of the call.
    fn on_frame(&mut self, frame: FrameView<'_>);
    /// Turn sound on
    ///
    /// Called by `tick_timers` while the sound timer is running
    fn sound_on(&mut self);
    /// Turn sound off
    ///
    /// Called by `tick_timers` when the sound timer expires
    fn sound_off(&mut self);
    /// Get the state of each key of the 4x4 keypad
    ///
    /// Polled by `tick_chip`; `true` means pressed
    fn get_keys(&mut self) -> &[bool; 16];
    /// Generate a uniformly distributed random byte
    ///
    /// Consumed by the `CXNN` instruction
    fn gen_random(&mut self) -> u8;
}

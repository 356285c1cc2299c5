#![no_std]
pub mod builder;
pub mod context;
pub mod error;
pub mod font;
pub mod frame;
pub mod opcode;
pub mod quince;
pub mod timer;

pub use builder::Builder;
pub use context::Context;
pub use error::Error;
pub use frame::{Frame, FrameView, HEIGHT, WIDTH};
pub use opcode::OpCode;
pub use quince::{Policy, Quince8};

#[cfg(feature = "embedded-graphics")]
pub use embedded_graphics;

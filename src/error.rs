//! Fatal interpreter faults.
//!
//! Only conditions that indicate a malformed program or a broken machine
//! state end up here. Ordinary ISA behaviours like 8-bit wraparound,
//! timers saturating at zero or sprites wrapping at the screen edges are
//! not errors.

use core::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// 2NNN nested deeper than the 16 slots of the call stack
    StackOverflow { addr: u16 },
    /// 00EE executed with no return address on the stack
    StackUnderflow { addr: u16 },
    /// Fetched word matches no instruction form (with `Policy::Fatal`)
    UnknownOpCode { opcode: u16, addr: u16 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::StackOverflow { addr } => {
                write!(f, "call stack overflow at {:#05X}", addr)
            }
            Error::StackUnderflow { addr } => {
                write!(f, "return with empty call stack at {:#05X}", addr)
            }
            Error::UnknownOpCode { opcode, addr } => {
                write!(f, "unknown opcode {:#06X} at {:#05X}", opcode, addr)
            }
        }
    }
}

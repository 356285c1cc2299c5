use core::convert::TryFrom;

use heapless::Vec;
use log::{trace, warn};

use crate::context::Context;
use crate::error::Error;
use crate::font::{FONT_SET, GLYPH_LEN};
use crate::frame::Frame;
use crate::opcode::OpCode;
use crate::timer::{Timer, TimerState};

/// Programs load and start executing at this address; everything below
/// belongs to the interpreter (the font sprite table).
pub const START_ADDR: u16 = 0x200;

const MEM_LENGTH: usize = 4096;
const ADDR_MASK: u16 = 0x0FFF;

/// What to do when the fetched word decodes to no known instruction.
///
/// ROMs in the wild disagree on how strict an interpreter should be, so
/// the choice belongs to the caller instead of being baked in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Halt with [`Error::UnknownOpCode`]
    Fatal,
    /// Log a warning and step over the word
    Skip,
}

/// Execution sub-state of the machine.
///
/// `FX0A` must stop fetching until a key arrives, but the driving loop
/// still needs to service timers and rendering, so the wait is a state
/// the driver observes rather than a loop inside the executor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Mode {
    Running,
    AwaitingKey { x: u8 },
}

/// The whole machine: memory image, register file, call stack, timers,
/// pixel buffer and the injected platform context.
///
/// The caller drives it through two independent, non-blocking clocks:
/// [`tick_chip`] once per instruction at whatever rate it chooses, and
/// [`tick_timers`] at a fixed 60 Hz. Interleaving them in the same order
/// with the same key snapshots always reproduces the same machine state.
///
/// [`tick_chip`]: Quince8::tick_chip
/// [`tick_timers`]: Quince8::tick_timers
pub struct Quince8<C: Context> {
    pub ctx: C,
    v: [u8; 16],
    i: u16,
    pc: u16,
    frame: Frame,
    redraw: bool,
    memory: [u8; MEM_LENGTH],
    stack: Vec<u16, 16>,
    delay_timer: Timer,
    sound_timer: Timer,
    mode: Mode,
    policy: Policy,
}

impl<C: Context> Quince8<C> {
    pub fn new(ctx: C) -> Self {
        let mut memory = [0; MEM_LENGTH];
        memory[..FONT_SET.len()].copy_from_slice(&FONT_SET);
        Self {
            ctx,
            v: [0; 16],
            i: 0,
            pc: START_ADDR,
            frame: Frame::new(),
            redraw: false,
            memory,
            stack: Vec::new(),
            delay_timer: Timer::new(),
            sound_timer: Timer::new(),
            mode: Mode::Running,
            policy: Policy::Fatal,
        }
    }

    /// Create a machine with `prog` loaded at the start address.
    ///
    /// Bytes past the end of memory are dropped.
    pub fn load(ctx: C, prog: &[u8]) -> Self {
        let mut chip = Self::new(ctx);
        chip.load_program(prog);
        chip
    }

    /// Choose how unknown opcodes are treated (default: [`Policy::Fatal`])
    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    /// Restore the power-on state, keeping the context and the policy
    pub fn reset(&mut self) {
        self.v = [0; 16];
        self.i = 0;
        self.pc = START_ADDR;
        self.frame.clear();
        self.redraw = false;
        self.memory = [0; MEM_LENGTH];
        self.memory[..FONT_SET.len()].copy_from_slice(&FONT_SET);
        self.stack.clear();
        self.delay_timer = Timer::new();
        self.sound_timer = Timer::new();
        self.mode = Mode::Running;
    }

    pub(crate) fn load_program(&mut self, prog: &[u8]) {
        self.memory[START_ADDR as usize..]
            .iter_mut()
            .zip(prog)
            .for_each(|(mem, &byte)| *mem = byte);
    }

    /// Run one fetch-decode-execute cycle.
    ///
    /// Returns `WouldBlock` while the machine sits in the `FX0A` key
    /// wait; fatal faults come back as `nb::Error::Other`. The machine
    /// state is consistent whenever this returns, so the caller may stop
    /// driving it at any instruction boundary.
    pub fn tick_chip(&mut self) -> nb::Result<(), Error> {
        match self.mode {
            Mode::AwaitingKey { x } => self.poll_key(x),
            Mode::Running => {
                let raw = self.fetch();
                trace!("{:#05X}: {:#06X}", self.pc, raw);
                match OpCode::try_from(raw) {
                    Ok(opcode) => self.execute(opcode).map_err(nb::Error::Other)?,
                    Err(opcode) => self.on_unknown(opcode).map_err(nb::Error::Other)?,
                }
                if self.redraw {
                    self.ctx.on_frame(self.frame.view());
                    self.redraw = false;
                }
                Ok(())
            }
        }
    }

    /// Decrement both timers towards zero.
    ///
    /// Must be called at 60 Hz regardless of the instruction rate, and
    /// keeps running while the machine awaits a key. Drives the sound
    /// capability from the sound timer's edges.
    pub fn tick_timers(&mut self) {
        self.delay_timer.decrement();
        match self.sound_timer.decrement() {
            TimerState::On => self.ctx.sound_on(),
            TimerState::Finished => self.ctx.sound_off(),
            TimerState::Off => (),
        }
    }

    fn fetch(&self) -> u16 {
        let hi = self.memory[(self.pc & ADDR_MASK) as usize];
        let lo = self.memory[(self.pc.wrapping_add(1) & ADDR_MASK) as usize];
        u16::from(hi) << 8 | u16::from(lo)
    }

    fn pc_increment(&mut self) {
        self.pc = self.pc.wrapping_add(2) & ADDR_MASK;
    }

    fn poll_key(&mut self, x: u8) -> nb::Result<(), Error> {
        let pressed = self.ctx.get_keys().iter().position(|&key| key);
        match pressed {
            Some(key) => {
                self.v[x as usize] = key as u8;
                self.mode = Mode::Running;
                self.pc_increment();
                Ok(())
            }
            None => Err(nb::Error::WouldBlock),
        }
    }

    fn on_unknown(&mut self, opcode: u16) -> Result<(), Error> {
        match self.policy {
            Policy::Fatal => Err(Error::UnknownOpCode {
                opcode,
                addr: self.pc,
            }),
            Policy::Skip => {
                warn!(
                    "stepping over unknown opcode {:#06X} at {:#05X}",
                    opcode, self.pc
                );
                self.pc_increment();
                Ok(())
            }
        }
    }
}

// OpCodes impls
impl<C: Context> Quince8<C> {
    #[rustfmt::skip]
    fn execute(&mut self, opcode: OpCode) -> Result<(), Error> {
        match opcode {
            OpCode::_00E0             => self.clear_screen(),
            OpCode::_00EE             => self.subroutine_return(),
            OpCode::_1NNN { nnn }     => return self.jump_to(nnn),
            OpCode::_2NNN { nnn }     => return self.exec_subroutine_at(nnn),
            OpCode::_3XNN { x, nn }   => self.skip_if_vx_eq_nn(x, nn),
            OpCode::_4XNN { x, nn }   => self.skip_if_vx_ne_nn(x, nn),
            OpCode::_5XY0 { x, y }    => self.skip_if_vx_eq_vy(x, y),
            OpCode::_6XNN { x, nn }   => self.assign_vx_nn(x, nn),
            OpCode::_7XNN { x, nn }   => self.assign_add_vx_nn(x, nn),
            OpCode::_8XY0 { x, y }    => self.assign_vx_vy(x, y),
            OpCode::_8XY1 { x, y }    => self.assign_or_vx_vy(x, y),
            OpCode::_8XY2 { x, y }    => self.assign_and_vx_vy(x, y),
            OpCode::_8XY3 { x, y }    => self.assign_xor_vx_vy(x, y),
            OpCode::_8XY4 { x, y }    => self.assign_add_vx_vy(x, y),
            OpCode::_8XY5 { x, y }    => self.assign_sub_vx_vy(x, y),
            OpCode::_8XY6 { x, .. }   => self.assign_vx_shifted_r(x),
            OpCode::_8XY7 { x, y }    => self.assign_vx_vy_sub_vx(x, y),
            OpCode::_8XYE { x, .. }   => self.assign_vx_shifted_l(x),
            OpCode::_9XY0 { x, y }    => self.skip_if_vx_ne_vy(x, y),
            OpCode::_ANNN { nnn }     => self.assign_i_nnn(nnn),
            OpCode::_BNNN { nnn }     => return self.jump_to_nnn_add_v0(nnn),
            OpCode::_CXNN { x, nn }   => self.assign_vx_random_and_nn(x, nn),
            OpCode::_DXYN { x, y, n } => self.draw_n_at_vx_vy(x, y, n),
            OpCode::_EX9E { x }       => self.skip_if_vx_in_keys(x),
            OpCode::_EXA1 { x }       => self.skip_if_vx_not_in_keys(x),
            OpCode::_FX07 { x }       => self.assign_vx_delay_t(x),
            OpCode::_FX0A { x }       => return self.await_key(x),
            OpCode::_FX15 { x }       => self.assign_delay_t_vx(x),
            OpCode::_FX18 { x }       => self.assign_sound_t_vx(x),
            OpCode::_FX1E { x }       => self.assign_add_i_vx(x),
            OpCode::_FX29 { x }       => self.assign_i_addr_of_sprite_vx(x),
            OpCode::_FX33 { x }       => self.assign_mem_at_i_bcd_of_vx(x),
            OpCode::_FX55 { x }       => self.assign_mem_at_i_v0_to_vx(x),
            OpCode::_FX65 { x }       => self.assign_v0_to_vx_mem_at_i(x),
        }?;
        self.pc_increment();
        Ok(())
    }

    /// Clear the screen
    /// 00E0
    fn clear_screen(&mut self) -> Result<(), Error> {
        self.frame.clear();
        self.redraw = true;
        Ok(())
    }

    /// Return from a subroutine, resuming after the matching call
    /// 00EE
    fn subroutine_return(&mut self) -> Result<(), Error> {
        self.stack
            .pop()
            .ok_or(Error::StackUnderflow { addr: self.pc })
            .map(|addr| self.pc = addr)
    }

    /// Jump to address NNN
    /// 1NNN { nnn: u16 }
    fn jump_to(&mut self, nnn: u16) -> Result<(), Error> {
        self.pc = nnn;
        Ok(())
    }

    /// Push the current address and enter the subroutine at NNN
    /// 2NNN { nnn: u16 }
    fn exec_subroutine_at(&mut self, nnn: u16) -> Result<(), Error> {
        self.stack
            .push(self.pc)
            .map_err(|_| Error::StackOverflow { addr: self.pc })?;
        self.pc = nnn;
        Ok(())
    }

    /// Skip the following instruction if VX equals NN
    /// 3XNN { x: u8, nn: u8 }
    fn skip_if_vx_eq_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        if self.v[x as usize] == nn {
            self.pc_increment();
        }
        Ok(())
    }

    /// Skip the following instruction if VX is not equal to NN
    /// 4XNN { x: u8, nn: u8 }
    fn skip_if_vx_ne_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        if self.v[x as usize] != nn {
            self.pc_increment();
        }
        Ok(())
    }

    /// Skip the following instruction if VX equals VY
    /// 5XY0 { x: u8, y: u8 }
    fn skip_if_vx_eq_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        if self.v[x as usize] == self.v[y as usize] {
            self.pc_increment();
        }
        Ok(())
    }

    /// Store NN in VX
    /// 6XNN { x: u8, nn: u8 }
    fn assign_vx_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = nn;
        Ok(())
    }

    /// Add NN to VX, wrapping, without touching VF
    /// 7XNN { x: u8, nn: u8 }
    fn assign_add_vx_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = self.v[x as usize].wrapping_add(nn);
        Ok(())
    }

    /// Store VY in VX
    /// 8XY0 { x: u8, y: u8 }
    fn assign_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] = self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX OR VY
    /// 8XY1 { x: u8, y: u8 }
    fn assign_or_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] |= self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX AND VY
    /// 8XY2 { x: u8, y: u8 }
    fn assign_and_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] &= self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX XOR VY
    /// 8XY3 { x: u8, y: u8 }
    fn assign_xor_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] ^= self.v[y as usize];
        Ok(())
    }

    /// Add VY to VX, VF := 1 on unsigned overflow else 0
    /// 8XY4 { x: u8, y: u8 }
    fn assign_add_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        let (value, overflow) = self.v[x as usize].overflowing_add(self.v[y as usize]);
        self.v[x as usize] = value;
        self.v[0xF] = overflow as u8;
        Ok(())
    }

    /// Subtract VY from VX, VF := 1 if no borrow (VX >= VY) else 0
    /// 8XY5 { x: u8, y: u8 }
    fn assign_sub_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        let (value, borrow) = self.v[x as usize].overflowing_sub(self.v[y as usize]);
        self.v[x as usize] = value;
        self.v[0xF] = !borrow as u8;
        Ok(())
    }

    /// Shift VX right by one, VF := the bit shifted out
    /// 8XY6 { x: u8 }
    fn assign_vx_shifted_r(&mut self, x: u8) -> Result<(), Error> {
        let lsb = self.v[x as usize] & 1;
        self.v[x as usize] >>= 1;
        self.v[0xF] = lsb;
        Ok(())
    }

    /// Set VX to VY minus VX, VF := 1 if no borrow (VY >= VX) else 0
    /// 8XY7 { x: u8, y: u8 }
    fn assign_vx_vy_sub_vx(&mut self, x: u8, y: u8) -> Result<(), Error> {
        let (value, borrow) = self.v[y as usize].overflowing_sub(self.v[x as usize]);
        self.v[x as usize] = value;
        self.v[0xF] = !borrow as u8;
        Ok(())
    }

    /// Shift VX left by one, VF := the bit shifted out
    /// 8XYE { x: u8 }
    fn assign_vx_shifted_l(&mut self, x: u8) -> Result<(), Error> {
        let msb = self.v[x as usize] >> 7;
        self.v[x as usize] <<= 1;
        self.v[0xF] = msb;
        Ok(())
    }

    /// Skip the following instruction if VX is not equal to VY
    /// 9XY0 { x: u8, y: u8 }
    fn skip_if_vx_ne_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        if self.v[x as usize] != self.v[y as usize] {
            self.pc_increment();
        }
        Ok(())
    }

    /// Store address NNN in I
    /// ANNN { nnn: u16 }
    fn assign_i_nnn(&mut self, nnn: u16) -> Result<(), Error> {
        self.i = nnn;
        Ok(())
    }

    /// Jump to address NNN + V0, masked to the address space
    /// BNNN { nnn: u16 }
    fn jump_to_nnn_add_v0(&mut self, nnn: u16) -> Result<(), Error> {
        self.pc = nnn.wrapping_add(u16::from(self.v[0])) & ADDR_MASK;
        Ok(())
    }

    /// Set VX to a random byte masked with NN
    /// CXNN { x: u8, nn: u8 }
    fn assign_vx_random_and_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = self.ctx.gen_random() & nn;
        Ok(())
    }

    /// XOR-draw N sprite rows from address I at (VX, VY), wrapping at
    /// the screen edges, VF := 1 if any pixel flipped off
    /// DXYN { x: u8, y: u8, n: u8 }
    fn draw_n_at_vx_vy(&mut self, x: u8, y: u8, n: u8) -> Result<(), Error> {
        let vx = self.v[x as usize] as usize;
        let vy = self.v[y as usize] as usize;
        let mut collision = false;
        for row in 0..n as usize {
            let byte = self.memory[(self.i as usize + row) & ADDR_MASK as usize];
            for col in 0..8 {
                if byte >> (7 - col) & 1 == 1 {
                    collision |= self.frame.flip(vx + col, vy + row);
                }
            }
        }
        self.v[0xF] = collision as u8;
        self.redraw = true;
        Ok(())
    }

    /// Skip the following instruction if the key named by VX is pressed
    /// EX9E { x: u8 }
    fn skip_if_vx_in_keys(&mut self, x: u8) -> Result<(), Error> {
        let key = self.v[x as usize] & 0xF;
        if self.ctx.get_keys()[key as usize] {
            self.pc_increment();
        }
        Ok(())
    }

    /// Skip the following instruction if the key named by VX is not pressed
    /// EXA1 { x: u8 }
    fn skip_if_vx_not_in_keys(&mut self, x: u8) -> Result<(), Error> {
        let key = self.v[x as usize] & 0xF;
        if !self.ctx.get_keys()[key as usize] {
            self.pc_increment();
        }
        Ok(())
    }

    /// Store the current delay timer value in VX
    /// FX07 { x: u8 }
    fn assign_vx_delay_t(&mut self, x: u8) -> Result<(), Error> {
        self.v[x as usize] = self.delay_timer.load();
        Ok(())
    }

    /// Suspend until a key press is observed, then store it in VX.
    ///
    /// The program counter stays on this instruction; `tick_chip` polls
    /// the keypad on subsequent calls and only then moves on.
    /// FX0A { x: u8 }
    fn await_key(&mut self, x: u8) -> Result<(), Error> {
        self.mode = Mode::AwaitingKey { x };
        Ok(())
    }

    /// Set the delay timer to VX
    /// FX15 { x: u8 }
    fn assign_delay_t_vx(&mut self, x: u8) -> Result<(), Error> {
        self.delay_timer.store(self.v[x as usize]);
        Ok(())
    }

    /// Set the sound timer to VX
    /// FX18 { x: u8 }
    fn assign_sound_t_vx(&mut self, x: u8) -> Result<(), Error> {
        self.sound_timer.store(self.v[x as usize]);
        Ok(())
    }

    /// Add VX to I, masked to the address space
    /// FX1E { x: u8 }
    fn assign_add_i_vx(&mut self, x: u8) -> Result<(), Error> {
        self.i = self.i.wrapping_add(u16::from(self.v[x as usize])) & ADDR_MASK;
        Ok(())
    }

    /// Point I at the font sprite for the low nibble of VX
    /// FX29 { x: u8 }
    fn assign_i_addr_of_sprite_vx(&mut self, x: u8) -> Result<(), Error> {
        let digit = self.v[x as usize] & 0xF;
        self.i = u16::from(digit) * GLYPH_LEN as u16;
        Ok(())
    }

    /// Store the decimal digits of VX at I, I+1, I+2
    /// FX33 { x: u8 }
    fn assign_mem_at_i_bcd_of_vx(&mut self, x: u8) -> Result<(), Error> {
        let value = self.v[x as usize];
        let i = self.i as usize;
        self.memory[i & ADDR_MASK as usize] = value / 100;
        self.memory[(i + 1) & ADDR_MASK as usize] = value / 10 % 10;
        self.memory[(i + 2) & ADDR_MASK as usize] = value % 10;
        Ok(())
    }

    /// Copy V0..=VX to memory starting at I; I itself is left alone
    /// FX55 { x: u8 }
    fn assign_mem_at_i_v0_to_vx(&mut self, x: u8) -> Result<(), Error> {
        for idx in 0..=x as usize {
            self.memory[(self.i as usize + idx) & ADDR_MASK as usize] = self.v[idx];
        }
        Ok(())
    }

    /// Fill V0..=VX from memory starting at I; I itself is left alone
    /// FX65 { x: u8 }
    fn assign_v0_to_vx_mem_at_i(&mut self, x: u8) -> Result<(), Error> {
        for idx in 0..=x as usize {
            self.v[idx] = self.memory[(self.i as usize + idx) & ADDR_MASK as usize];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::TestingContext;

    #[test]
    fn starts_at_0x200_with_font_embedded() {
        let chip = Quince8::new(TestingContext::new(0));
        assert_eq!(chip.pc, START_ADDR);
        assert_eq!(&chip.memory[..80], &FONT_SET[..]);
        assert!(chip.memory[80..].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn load_copies_rom_to_start_addr() {
        let chip = Quince8::load(TestingContext::new(0), &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(&chip.memory[0x200..0x204], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn load_drops_bytes_past_end_of_memory() {
        let long_rom = [0xAA; 5000];
        let chip = Quince8::load(TestingContext::new(0), &long_rom);
        assert_eq!(chip.memory[0xFFF], 0xAA);
    }

    #[test]
    fn pc_increment_wraps_address_space() {
        let mut chip = Quince8::new(TestingContext::new(0));
        chip.pc_increment();
        assert_eq!(chip.pc, 0x202);
        chip.pc = 0x0FFE;
        chip.pc_increment();
        assert_eq!(chip.pc, 0x000);
    }

    #[test]
    fn fetch_is_big_endian() {
        let mut chip = Quince8::load(TestingContext::new(0), &[0x12, 0x34]);
        assert_eq!(chip.fetch(), 0x1234);
        chip.pc = 0x0FFF;
        // second byte wraps to address 0x000, the first font byte
        chip.memory[0x0FFF] = 0xAB;
        assert_eq!(chip.fetch(), 0xAB00 | u16::from(FONT_SET[0]));
    }

    #[test]
    fn reset_restores_power_on_state() {
        let mut chip = Quince8::load(TestingContext::new(0), &[0x60, 0xFF]);
        chip.tick_chip().unwrap();
        chip.execute(OpCode::_DXYN { x: 1, y: 2, n: 5 }).unwrap();
        chip.execute(OpCode::_FX15 { x: 0 }).unwrap();
        chip.execute(OpCode::_2NNN { nnn: 0x400 }).unwrap();

        chip.reset();
        assert_eq!(chip.pc, START_ADDR);
        assert_eq!(chip.v, [0; 16]);
        assert_eq!(chip.i, 0);
        assert!(chip.stack.is_empty());
        assert_eq!(chip.delay_timer.load(), 0);
        assert_eq!(chip.mode, Mode::Running);
        assert_eq!(&chip.memory[..80], &FONT_SET[..]);
        // program memory is wiped too
        assert_eq!(chip.memory[0x200], 0);
        assert!(chip
            .frame
            .view()
            .iter_rows_as_bitslices()
            .all(|row| row.not_any()));
    }

    #[test]
    fn unknown_opcode_is_fatal_by_default() {
        let mut chip = Quince8::load(TestingContext::new(0), &[0x01, 0x23]);
        assert_eq!(
            chip.tick_chip(),
            Err(nb::Error::Other(Error::UnknownOpCode {
                opcode: 0x0123,
                addr: 0x200,
            })),
        );
        assert_eq!(chip.pc, 0x200);
    }

    #[test]
    fn unknown_opcode_can_be_stepped_over() {
        let mut chip = Quince8::load(TestingContext::new(0), &[0x01, 0x23, 0x60, 0x05]);
        chip.set_policy(Policy::Skip);
        chip.tick_chip().unwrap();
        assert_eq!(chip.pc, 0x202);
        chip.tick_chip().unwrap();
        assert_eq!(chip.v[0], 0x05);
    }

    #[test]
    fn frame_reaches_context_only_after_draw() {
        // V0 := 0, draw the glyph at I=0, then spin
        let rom = [0x60, 0x00, 0xD0, 0x05, 0x12, 0x04];
        let mut chip = Quince8::load(TestingContext::new(0), &rom);
        chip.tick_chip().unwrap();
        assert!(chip.ctx.last_frame().is_none());
        chip.tick_chip().unwrap();
        assert_eq!(chip.ctx.last_frame(), Some(&chip.frame));
    }

    #[test]
    fn delay_timer_floors_at_zero() {
        let mut chip = Quince8::new(TestingContext::new(0));
        chip.assign_vx_nn(0, 5).unwrap();
        chip.assign_delay_t_vx(0).unwrap();
        for _ in 0..5 {
            chip.tick_timers();
        }
        assert_eq!(chip.delay_timer.load(), 0);
        chip.tick_timers();
        assert_eq!(chip.delay_timer.load(), 0);
    }

    #[test]
    fn sound_timer_drives_sound_capability() {
        let mut chip = Quince8::new(TestingContext::new(0));
        chip.assign_vx_nn(0, 3).unwrap();
        chip.assign_sound_t_vx(0).unwrap();

        chip.tick_timers(); // 3 -> 2
        assert!(chip.ctx.is_sound_on());
        chip.tick_timers(); // 2 -> 1
        assert!(chip.ctx.is_sound_on());
        chip.tick_timers(); // 1 -> 0
        assert!(!chip.ctx.is_sound_on());
        chip.tick_timers(); // stays off
        assert!(!chip.ctx.is_sound_on());
    }

    #[test]
    fn timers_keep_running_while_awaiting_key() {
        let mut chip = Quince8::load(TestingContext::new(0), &[0xF0, 0x0A]);
        chip.assign_vx_nn(1, 2).unwrap();
        chip.assign_delay_t_vx(1).unwrap();
        chip.tick_chip().unwrap();
        assert_eq!(chip.tick_chip(), Err(nb::Error::WouldBlock));
        chip.tick_timers();
        chip.tick_timers();
        assert_eq!(chip.delay_timer.load(), 0);
    }

    /// The machine trace for a fixed ROM and key sequence is the same
    /// every run, whatever the interleaving of timer ticks.
    #[test]
    fn interleaved_ticks_are_deterministic() {
        let rom = [
            0xC0, 0x0F, // V0 := rand & 0x0F
            0xF0, 0x29, // I := sprite(V0)
            0xD1, 0x25, // draw at (V1, V2) = (0, 0)
            0x12, 0x00, // start over
        ];
        let mut a = Quince8::load(TestingContext::new(99), &rom);
        let mut b = Quince8::load(TestingContext::new(99), &rom);

        for step in 0..100 {
            a.tick_chip().unwrap();
            b.tick_chip().unwrap();
            if step % 8 == 0 {
                a.tick_timers();
                b.tick_timers();
            }
        }
        assert_eq!(a.pc, b.pc);
        assert_eq!(a.v, b.v);
        assert_eq!(a.frame, b.frame);
    }

    /// End to end: V0 := 5, V0 += 3, then an idle jump loop.
    #[test]
    fn two_cycles_of_a_three_instruction_rom() {
        let rom = [0x60, 0x05, 0x70, 0x03, 0x12, 0x00];
        let mut chip = Quince8::load(TestingContext::new(0), &rom);
        chip.tick_chip().unwrap();
        chip.tick_chip().unwrap();
        assert_eq!(chip.v[0], 8);
        assert_eq!(chip.pc, 0x204);
        assert!(chip.ctx.last_frame().is_none());
        assert_eq!(chip.delay_timer.load(), 0);
        assert_eq!(chip.sound_timer.load(), 0);
    }
}

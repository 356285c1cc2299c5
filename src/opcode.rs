use core::convert::TryFrom;

/// One decoded Chip-8 instruction with its operand fields.
///
/// Instructions are classified by the top nibble of the fetched word;
/// the ambiguous families (`0x0`, `0x8`, `0xE`, `0xF`) are told apart by
/// the low byte or low nibble. A word matching no form is surfaced as a
/// decode failure, never ignored:
///
/// ```
/// use core::convert::TryFrom;
/// use quince8::opcode::OpCode;
///
/// assert_eq!(
///     OpCode::try_from(0x1ABC),
///     Ok(OpCode::_1NNN { nnn: 0x0ABC }),
/// );
/// assert_eq!(OpCode::try_from(0x8AB9), Err(0x8AB9));
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OpCode {
    /// Clear the screen
    _00E0,
    /// Return from a subroutine
    _00EE,
    /// Jump to address NNN
    _1NNN { nnn: u16 },
    /// Call subroutine at address NNN
    _2NNN { nnn: u16 },
    /// Skip the next instruction if VX equals NN
    _3XNN { x: u8, nn: u8 },
    /// Skip the next instruction if VX differs from NN
    _4XNN { x: u8, nn: u8 },
    /// Skip the next instruction if VX equals VY
    _5XY0 { x: u8, y: u8 },
    /// VX := NN
    _6XNN { x: u8, nn: u8 },
    /// VX := VX + NN, wrapping, flags untouched
    _7XNN { x: u8, nn: u8 },
    /// VX := VY
    _8XY0 { x: u8, y: u8 },
    /// VX := VX OR VY
    _8XY1 { x: u8, y: u8 },
    /// VX := VX AND VY
    _8XY2 { x: u8, y: u8 },
    /// VX := VX XOR VY
    _8XY3 { x: u8, y: u8 },
    /// VX := VX + VY, VF := 1 on carry else 0
    _8XY4 { x: u8, y: u8 },
    /// VX := VX - VY, VF := 0 on borrow else 1
    _8XY5 { x: u8, y: u8 },
    /// VX := VX >> 1, VF := the bit shifted out
    _8XY6 { x: u8, y: u8 },
    /// VX := VY - VX, VF := 0 on borrow else 1
    _8XY7 { x: u8, y: u8 },
    /// VX := VX << 1, VF := the bit shifted out
    _8XYE { x: u8, y: u8 },
    /// Skip the next instruction if VX differs from VY
    _9XY0 { x: u8, y: u8 },
    /// I := NNN
    _ANNN { nnn: u16 },
    /// Jump to address NNN + V0
    _BNNN { nnn: u16 },
    /// VX := random byte AND NN
    _CXNN { x: u8, nn: u8 },
    /// XOR-draw the N-row sprite at address I to position (VX, VY),
    /// VF := 1 if any pixel flipped off
    _DXYN { x: u8, y: u8, n: u8 },
    /// Skip the next instruction if key VX is pressed
    _EX9E { x: u8 },
    /// Skip the next instruction if key VX is not pressed
    _EXA1 { x: u8 },
    /// VX := delay timer
    _FX07 { x: u8 },
    /// Suspend until a key is pressed, then VX := that key
    _FX0A { x: u8 },
    /// Delay timer := VX
    _FX15 { x: u8 },
    /// Sound timer := VX
    _FX18 { x: u8 },
    /// I := I + VX, masked to 12 bits
    _FX1E { x: u8 },
    /// I := address of the font sprite for the low nibble of VX
    _FX29 { x: u8 },
    /// Store the three decimal digits of VX at I, I+1, I+2
    _FX33 { x: u8 },
    /// Copy V0..=VX to memory starting at I
    _FX55 { x: u8 },
    /// Fill V0..=VX from memory starting at I
    _FX65 { x: u8 },
}

impl OpCode {
    fn read_first(raw: u16) -> u8 {
        (raw >> 12 & 0x000Fu16) as u8
    }

    fn read_last(raw: u16) -> u8 {
        (raw & 0x000Fu16) as u8
    }

    fn read_x(raw: u16) -> u8 {
        (raw >> 8 & 0x000Fu16) as u8
    }

    fn read_y(raw: u16) -> u8 {
        (raw >> 4 & 0x000Fu16) as u8
    }

    fn read_nn(raw: u16) -> u8 {
        (raw & 0x00FFu16) as u8
    }

    fn read_nnn(raw: u16) -> u16 {
        raw & 0x0FFFu16
    }
}

impl TryFrom<u16> for OpCode {
    /// The raw word that failed to decode
    type Error = u16;

    fn try_from(raw: u16) -> Result<Self, u16> {
        let opcode = match Self::read_first(raw) {
            // 0NNN machine language subroutines are not part of the
            // interpreted instruction set, so everything in the 0x0
            // family except 00E0/00EE decodes as unknown.
            0x0u8 => match Self::read_nnn(raw) {
                0x0E0u16 => OpCode::_00E0,
                0x0EEu16 => OpCode::_00EE,
                _ => return Err(raw),
            },
            0x1u8 => OpCode::_1NNN {
                nnn: Self::read_nnn(raw),
            },
            0x2u8 => OpCode::_2NNN {
                nnn: Self::read_nnn(raw),
            },
            0x3u8 => OpCode::_3XNN {
                x: Self::read_x(raw),
                nn: Self::read_nn(raw),
            },
            0x4u8 => OpCode::_4XNN {
                x: Self::read_x(raw),
                nn: Self::read_nn(raw),
            },
            0x5u8 => OpCode::_5XY0 {
                x: Self::read_x(raw),
                y: Self::read_y(raw),
            },
            0x6u8 => OpCode::_6XNN {
                x: Self::read_x(raw),
                nn: Self::read_nn(raw),
            },
            0x7u8 => OpCode::_7XNN {
                x: Self::read_x(raw),
                nn: Self::read_nn(raw),
            },
            0x8u8 => {
                let x = Self::read_x(raw);
                let y = Self::read_y(raw);
                match Self::read_last(raw) {
                    0x0u8 => OpCode::_8XY0 { x, y },
                    0x1u8 => OpCode::_8XY1 { x, y },
                    0x2u8 => OpCode::_8XY2 { x, y },
                    0x3u8 => OpCode::_8XY3 { x, y },
                    0x4u8 => OpCode::_8XY4 { x, y },
                    0x5u8 => OpCode::_8XY5 { x, y },
                    0x6u8 => OpCode::_8XY6 { x, y },
                    0x7u8 => OpCode::_8XY7 { x, y },
                    0xEu8 => OpCode::_8XYE { x, y },
                    _ => return Err(raw),
                }
            }
            0x9u8 => OpCode::_9XY0 {
                x: Self::read_x(raw),
                y: Self::read_y(raw),
            },
            0xAu8 => OpCode::_ANNN {
                nnn: Self::read_nnn(raw),
            },
            0xBu8 => OpCode::_BNNN {
                nnn: Self::read_nnn(raw),
            },
            0xCu8 => OpCode::_CXNN {
                x: Self::read_x(raw),
                nn: Self::read_nn(raw),
            },
            0xDu8 => OpCode::_DXYN {
                x: Self::read_x(raw),
                y: Self::read_y(raw),
                n: Self::read_last(raw),
            },
            0xEu8 => {
                let x = Self::read_x(raw);
                match Self::read_nn(raw) {
                    0x9Eu8 => OpCode::_EX9E { x },
                    0xA1u8 => OpCode::_EXA1 { x },
                    _ => return Err(raw),
                }
            }
            0xFu8 => {
                let x = Self::read_x(raw);
                match Self::read_nn(raw) {
                    0x07u8 => OpCode::_FX07 { x },
                    0x0Au8 => OpCode::_FX0A { x },
                    0x15u8 => OpCode::_FX15 { x },
                    0x18u8 => OpCode::_FX18 { x },
                    0x1Eu8 => OpCode::_FX1E { x },
                    0x29u8 => OpCode::_FX29 { x },
                    0x33u8 => OpCode::_FX33 { x },
                    0x55u8 => OpCode::_FX55 { x },
                    0x65u8 => OpCode::_FX65 { x },
                    _ => return Err(raw),
                }
            }
            _ => unreachable!(),
        };
        Ok(opcode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_read_first() {
        assert_eq!(0xCu8, OpCode::read_first(0xCAFEu16));
    }

    #[test]
    fn should_read_last() {
        assert_eq!(0xEu8, OpCode::read_last(0xCAFEu16));
    }

    #[test]
    fn should_read_x() {
        assert_eq!(0xAu8, OpCode::read_x(0xCAFEu16));
    }

    #[test]
    fn should_read_y() {
        assert_eq!(0xFu8, OpCode::read_y(0xCAFEu16));
    }

    #[test]
    fn should_read_nn() {
        assert_eq!(0xFEu8, OpCode::read_nn(0xCAFEu16));
    }

    #[test]
    fn should_read_nnn() {
        assert_eq!(0xAFEu16, OpCode::read_nnn(0xCAFEu16));
    }

    #[test]
    #[rustfmt::skip]
    fn should_decode_every_instruction_form() {
        use super::OpCode::*;
        let instructions = [
            (0x00E0u16, _00E0),
            (0x00EEu16, _00EE),
            (0x1123u16, _1NNN { nnn: 0x123u16 }),
            (0x2FEDu16, _2NNN { nnn: 0xFEDu16 }),
            (0x3456u16, _3XNN { x: 0x4u8, nn: 0x56u8 }),
            (0x4456u16, _4XNN { x: 0x4u8, nn: 0x56u8 }),
            (0x5120u16, _5XY0 { x: 0x1u8, y: 0x2u8 }),
            (0x6789u16, _6XNN { x: 0x7u8, nn: 0x89u8 }),
            (0x7789u16, _7XNN { x: 0x7u8, nn: 0x89u8 }),
            (0x8120u16, _8XY0 { x: 0x1u8, y: 0x2u8 }),
            (0x8121u16, _8XY1 { x: 0x1u8, y: 0x2u8 }),
            (0x8122u16, _8XY2 { x: 0x1u8, y: 0x2u8 }),
            (0x8123u16, _8XY3 { x: 0x1u8, y: 0x2u8 }),
            (0x8124u16, _8XY4 { x: 0x1u8, y: 0x2u8 }),
            (0x8125u16, _8XY5 { x: 0x1u8, y: 0x2u8 }),
            (0x8126u16, _8XY6 { x: 0x1u8, y: 0x2u8 }),
            (0x8127u16, _8XY7 { x: 0x1u8, y: 0x2u8 }),
            (0x812Eu16, _8XYE { x: 0x1u8, y: 0x2u8 }),
            (0x9120u16, _9XY0 { x: 0x1u8, y: 0x2u8 }),
            (0xA123u16, _ANNN { nnn: 0x123u16 }),
            (0xB123u16, _BNNN { nnn: 0x123u16 }),
            (0xC456u16, _CXNN { x: 0x4u8, nn: 0x56u8 }),
            (0xD12Fu16, _DXYN { x: 0x1u8, y: 0x2u8, n: 0xFu8 }),
            (0xE49Eu16, _EX9E { x: 0x4u8 }),
            (0xE4A1u16, _EXA1 { x: 0x4u8 }),
            (0xF407u16, _FX07 { x: 0x4u8 }),
            (0xF40Au16, _FX0A { x: 0x4u8 }),
            (0xF415u16, _FX15 { x: 0x4u8 }),
            (0xF418u16, _FX18 { x: 0x4u8 }),
            (0xF41Eu16, _FX1E { x: 0x4u8 }),
            (0xF429u16, _FX29 { x: 0x4u8 }),
            (0xF433u16, _FX33 { x: 0x4u8 }),
            (0xF455u16, _FX55 { x: 0x4u8 }),
            (0xF465u16, _FX65 { x: 0x4u8 }),
        ];

        for &(raw, expected) in &instructions {
            assert_eq!(Ok(expected), OpCode::try_from(raw));
        }
    }

    #[test]
    fn should_signal_unknown_words() {
        // 0NNN machine language calls and unused sub-family slots
        let unknowns = [0x0123u16, 0x0000u16, 0x8AB8u16, 0x8ABFu16, 0xE4FFu16, 0xF4FFu16, 0xF400u16];
        for &raw in &unknowns {
            assert_eq!(Err(raw), OpCode::try_from(raw));
        }
    }
}

use crate::memory::TiaWriteAddress;

// The playfield is 20 bits wide, drawn four pixels per bit across the left
// half of the scanline and then repeated (or mirrored) across the right
// half. The three registers contribute their bits in different orders:
// PF0 supplies bits 0-3 from its high nybble low-bit-first, PF1 supplies
// bits 4-11 high-bit-first, and PF2 supplies bits 12-19 low-bit-first.
const PF_BITS: u8 = 40;
const HALF_BITS: u8 = 20;

// The serializer latches each register a pixel ahead of the first column
// that uses it, once per half of the line. Mid-line writes therefore only
// take effect from the next latch column on, never mid-group.
const PF0_FETCH_COLUMNS: [u16; 2] = [67, 147];
const PF1_FETCH_COLUMNS: [u16; 2] = [83, 163];
const PF2_FETCH_COLUMNS: [u16; 2] = [99, 179];

pub(crate) struct Playfield {
    pf0: u8,
    pf1: u8,
    pf2: u8,
}

impl Playfield {
    pub fn new() -> Self {
        Self {
            pf0: 0,
            pf1: 0,
            pf2: 0,
        }
    }

    /// Called once per pixel clock with the current beam column; picks up
    /// freshly written register values at the fetch columns.
    pub fn fetch(&mut self, horizontal_clock: u16, regs: &[u8; 64]) {
        if PF0_FETCH_COLUMNS.contains(&horizontal_clock) {
            self.pf0 = regs[TiaWriteAddress::PF0 as usize];
        } else if PF1_FETCH_COLUMNS.contains(&horizontal_clock) {
            self.pf1 = regs[TiaWriteAddress::PF1 as usize];
        } else if PF2_FETCH_COLUMNS.contains(&horizontal_clock) {
            self.pf2 = regs[TiaWriteAddress::PF2 as usize];
        }
    }

    /// Whether the playfield is on at visible column `x` (0-159).
    /// `mirror` is CTRLPF bit 0.
    pub fn pixel_on(&self, x: u8, mirror: bool) -> bool {
        let mut bit = x / 4;

        if bit >= HALF_BITS {
            bit = if mirror {
                PF_BITS - 1 - bit
            } else {
                bit - HALF_BITS
            };
        }

        let on = match bit {
            0..=3 => self.pf0 >> (4 + bit),
            4..=11 => self.pf1 >> (11 - bit),
            _ => self.pf2 >> (bit - 12),
        };

        on & 1 != 0
    }

    /// True in the left half of the visible line; score mode uses this to
    /// pick between the two player colors.
    pub fn left_half(x: u8) -> bool {
        x < 80
    }
}

use std::fmt;

// https://problemkaputt.de/2k6specs.htm#memorymirrors
//
// The 6507 brings out 13 address lines. Chip select is done on three of
// them: A12 picks the cartridge, and A7/A9 split the rest between the TIA
// and the RIOT's RAM and I/O pages.
#[derive(Debug)]
pub(crate) enum Region {
    Cartridge(usize),
    Ram(usize),
    TiaRead(TiaReadAddress),
    TiaWrite(TiaWriteAddress),
    Riot(RiotAddress),
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Operation {
    Read,
    Write,
}

/// An address with no register behind it. Reads of these default to 0 and
/// writes are dropped; the bus decides how loudly to report it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InvalidAddress(pub u16);

impl fmt::Display for InvalidAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid address: {:04X}", self.0)
    }
}

impl Region {
    pub fn decode(address: u16, op: Operation) -> Result<Self, InvalidAddress> {
        const A12: u16 = 0b0001_0000_0000_0000; // 0x1000
        const A9: u16 = 0b0000_0010_0000_0000; // 0x0200
        const A7: u16 = 0b0000_0000_1000_0000; // 0x0080

        match address {
            // Cartridge memory is selected by A12=1
            a if a & A12 != 0 => Ok(Self::Cartridge(address as usize & 0xfff)),

            // RIOT I/O is selected by A12=0, A9=1, A7=1
            a if a & (A9 | A7) == A9 | A7 => Ok(Self::Riot((address & 0x1f).try_into()?)),

            // RIOT RAM is selected by A12=0, A9=0, A7=1
            a if a & A7 == A7 => Ok(Self::Ram((address & 0x7f) as usize)),

            // The TIA is addressed by A12=0, A7=0. The read and write
            // decoders see different slices of the address bus.
            _ => match op {
                Operation::Read => Ok(Self::TiaRead((address & 0x0f).try_into()?)),
                Operation::Write => Ok(Self::TiaWrite((address & 0x3f).try_into()?)),
            },
        }
    }
}

// TIA read registers. The read decoder only sees A0-A3, so the index here
// is the address masked with 0x0f.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy)]
pub(crate) enum TiaReadAddress {
    CXM0P = 0x00,  // 11...... Read collision M0-P1, M0-P0 (bit 7, 6)
    CXM1P = 0x01,  // 11...... Read collision M1-P0, M1-P1
    CXP0FB = 0x02, // 11...... Read collision P0-PF, P0-BL
    CXP1FB = 0x03, // 11...... Read collision P1-PF, P1-BL
    CXM0FB = 0x04, // 11...... Read collision M0-PF, M0-BL
    CXM1FB = 0x05, // 11...... Read collision M1-PF, M1-BL
    CXBLPF = 0x06, // 1....... Read collision BL-PF, unused
    CXPPMM = 0x07, // 11...... Read collision P0-P1, M0-M1
    INPT0 = 0x08,  // 1....... Read pot port
    INPT1 = 0x09,  // 1....... Read pot port
    INPT2 = 0x0A,  // 1....... Read pot port
    INPT3 = 0x0B,  // 1....... Read pot port
    INPT4 = 0x0C,  // 1....... Read input
    INPT5 = 0x0D,  // 1....... Read input
}

impl TryFrom<u16> for TiaReadAddress {
    type Error = InvalidAddress;
    fn try_from(address: u16) -> Result<Self, Self::Error> {
        match address {
            0x00 => Ok(Self::CXM0P),
            0x01 => Ok(Self::CXM1P),
            0x02 => Ok(Self::CXP0FB),
            0x03 => Ok(Self::CXP1FB),
            0x04 => Ok(Self::CXM0FB),
            0x05 => Ok(Self::CXM1FB),
            0x06 => Ok(Self::CXBLPF),
            0x07 => Ok(Self::CXPPMM),
            0x08 => Ok(Self::INPT0),
            0x09 => Ok(Self::INPT1),
            0x0A => Ok(Self::INPT2),
            0x0B => Ok(Self::INPT3),
            0x0C => Ok(Self::INPT4),
            0x0D => Ok(Self::INPT5),
            // 0x0E and 0x0F have nothing behind them
            _ => Err(InvalidAddress(address)),
        }
    }
}

// TIA write registers. The enum discriminant doubles as the index into the
// TIA's 64-byte latch array.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy)]
pub(crate) enum TiaWriteAddress {
    VSYNC = 0x00,  // ......1. Vertical sync set-clear
    VBLANK = 0x01, // 11....1. Vertical blank set-clear
    WSYNC = 0x02,  // <strobe> Wait for leading edge of horizontal blank
    RSYNC = 0x03,  // <strobe> Reset horizontal sync counter
    NUSIZ0 = 0x04, // ..11.111 Number-size player-missile 0
    NUSIZ1 = 0x05, // ..11.111 Number-size player-missile 1
    COLUP0 = 0x06, // 1111111. Color-lum player 0 and missile 0
    COLUP1 = 0x07, // 1111111. Color-lum player 1 and missile 1
    COLUPF = 0x08, // 1111111. Color-lum playfield and ball
    COLUBK = 0x09, // 1111111. Color-lum background
    CTRLPF = 0x0A, // ..11.111 Control playfield ball size & collisions
    REFP0 = 0x0B,  // ....1... Reflect player 0
    REFP1 = 0x0C,  // ....1... Reflect player 1
    PF0 = 0x0D,    // 1111.... Playfield register byte 0
    PF1 = 0x0E,    // 11111111 Playfield register byte 1
    PF2 = 0x0F,    // 11111111 Playfield register byte 2
    RESP0 = 0x10,  // <strobe> Reset player 0
    RESP1 = 0x11,  // <strobe> Reset player 1
    RESM0 = 0x12,  // <strobe> Reset missile 0
    RESM1 = 0x13,  // <strobe> Reset missile 1
    RESBL = 0x14,  // <strobe> Reset ball
    AUDC0 = 0x15,  // ....1111 Audio control 0
    AUDC1 = 0x16,  // ....1111 Audio control 1
    AUDF0 = 0x17,  // ...11111 Audio frequency 0
    AUDF1 = 0x18,  // ...11111 Audio frequency 1
    AUDV0 = 0x19,  // ....1111 Audio volume 0
    AUDV1 = 0x1A,  // ....1111 Audio volume 1
    GRP0 = 0x1B,   // 11111111 Graphics player 0
    GRP1 = 0x1C,   // 11111111 Graphics player 1
    ENAM0 = 0x1D,  // ......1. Graphics (enable) missile 0
    ENAM1 = 0x1E,  // ......1. Graphics (enable) missile 1
    ENABL = 0x1F,  // ......1. Graphics (enable) ball
    HMP0 = 0x20,   // 1111.... Horizontal motion player 0
    HMP1 = 0x21,   // 1111.... Horizontal motion player 1
    HMM0 = 0x22,   // 1111.... Horizontal motion missile 0
    HMM1 = 0x23,   // 1111.... Horizontal motion missile 1
    HMBL = 0x24,   // 1111.... Horizontal motion ball
    VDELP0 = 0x25, // .......1 Vertical delay player 0
    VDELP1 = 0x26, // .......1 Vertical delay player 1
    VDELBL = 0x27, // .......1 Vertical delay ball
    RESMP0 = 0x28, // ......1. Reset missile 0 to player 0
    RESMP1 = 0x29, // ......1. Reset missile 1 to player 1
    HMOVE = 0x2A,  // <strobe> Apply horizontal motion
    HMCLR = 0x2B,  // <strobe> Clear horizontal motion registers
    CXCLR = 0x2C,  // <strobe> Clear collision latches
}

impl TryFrom<u16> for TiaWriteAddress {
    type Error = InvalidAddress;
    fn try_from(address: u16) -> Result<Self, Self::Error> {
        match address {
            0x00 => Ok(Self::VSYNC),
            0x01 => Ok(Self::VBLANK),
            0x02 => Ok(Self::WSYNC),
            0x03 => Ok(Self::RSYNC),
            0x04 => Ok(Self::NUSIZ0),
            0x05 => Ok(Self::NUSIZ1),
            0x06 => Ok(Self::COLUP0),
            0x07 => Ok(Self::COLUP1),
            0x08 => Ok(Self::COLUPF),
            0x09 => Ok(Self::COLUBK),
            0x0A => Ok(Self::CTRLPF),
            0x0B => Ok(Self::REFP0),
            0x0C => Ok(Self::REFP1),
            0x0D => Ok(Self::PF0),
            0x0E => Ok(Self::PF1),
            0x0F => Ok(Self::PF2),
            0x10 => Ok(Self::RESP0),
            0x11 => Ok(Self::RESP1),
            0x12 => Ok(Self::RESM0),
            0x13 => Ok(Self::RESM1),
            0x14 => Ok(Self::RESBL),
            0x15 => Ok(Self::AUDC0),
            0x16 => Ok(Self::AUDC1),
            0x17 => Ok(Self::AUDF0),
            0x18 => Ok(Self::AUDF1),
            0x19 => Ok(Self::AUDV0),
            0x1A => Ok(Self::AUDV1),
            0x1B => Ok(Self::GRP0),
            0x1C => Ok(Self::GRP1),
            0x1D => Ok(Self::ENAM0),
            0x1E => Ok(Self::ENAM1),
            0x1F => Ok(Self::ENABL),
            0x20 => Ok(Self::HMP0),
            0x21 => Ok(Self::HMP1),
            0x22 => Ok(Self::HMM0),
            0x23 => Ok(Self::HMM1),
            0x24 => Ok(Self::HMBL),
            0x25 => Ok(Self::VDELP0),
            0x26 => Ok(Self::VDELP1),
            0x27 => Ok(Self::VDELBL),
            0x28 => Ok(Self::RESMP0),
            0x29 => Ok(Self::RESMP1),
            0x2A => Ok(Self::HMOVE),
            0x2B => Ok(Self::HMCLR),
            0x2C => Ok(Self::CXCLR),
            // 0x2D-0x3F are reserved; writes there are dropped
            _ => Err(InvalidAddress(address)),
        }
    }
}

// RIOT I/O and timer registers, indexed by the address masked with 0x1f.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy)]
pub(crate) enum RiotAddress {
    SWCHA = 0x00,  // Port A; joystick directions (read), data ignored (write)
    SWACNT = 0x01, // Port A DDR; stored and otherwise ignored
    SWCHB = 0x02,  // Port B; console switches (read only)
    SWBCNT = 0x03, // Port B DDR; stored and otherwise ignored
    INTIM = 0x04,  // Timer output (read only)
    INSTAT = 0x05, // Timer status (read only, undocumented)
    TIM1T = 0x14,  // Set 1 clock interval
    TIM8T = 0x15,  // Set 8 clock interval
    TIM64T = 0x16, // Set 64 clock interval
    T1024T = 0x17, // Set 1024 clock interval
}

impl TryFrom<u16> for RiotAddress {
    type Error = InvalidAddress;
    fn try_from(address: u16) -> Result<Self, Self::Error> {
        match address {
            0x00 => Ok(Self::SWCHA),
            0x01 => Ok(Self::SWACNT),
            0x02 => Ok(Self::SWCHB),
            0x03 => Ok(Self::SWBCNT),
            0x04 => Ok(Self::INTIM),
            0x05 => Ok(Self::INSTAT),
            0x14 => Ok(Self::TIM1T),
            0x15 => Ok(Self::TIM8T),
            0x16 => Ok(Self::TIM64T),
            0x17 => Ok(Self::T1024T),
            _ => Err(InvalidAddress(address)),
        }
    }
}

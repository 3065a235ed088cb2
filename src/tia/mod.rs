mod audio;
mod ball;
mod counter;
mod missile;
pub mod palette;
mod player;
mod playfield;

use crate::memory::{TiaReadAddress, TiaWriteAddress};
use audio::Audio;
use counter::{ObjectCounter, BALL_RESET_DELAY, MISSILE_RESET_DELAY, PLAYER_RESET_DELAY};
use log::debug;
use playfield::Playfield;

/// 68 blanked + 160 visible color clocks per scanline.
pub const FRAME_WIDTH: usize = 228;
/// 3 vsync + 37 vblank + 192 visible + 30 overscan scanlines per frame.
pub const FRAME_HEIGHT: usize = 262;

/// One reconstructed field: a palette byte per color clock. The platform
/// maps it through the palette at blit time.
pub type Frame = [[u8; FRAME_WIDTH]; FRAME_HEIGHT];

const CLOCKS_PER_SCANLINE: u16 = FRAME_WIDTH as u16;
const SCANLINES_PER_FRAME: u16 = FRAME_HEIGHT as u16;
const HBLANK_CLOCKS: u16 = 68;
// HMOVE stretches the blanked interval by eight pixels
const LATE_HBLANK_CLOCKS: u16 = 76;

/// The fifteen pairwise collision latches, packed into their eight read
/// registers. Sticky until CXCLR.
#[derive(Default)]
struct Collisions {
    cxm0p: u8,
    cxm1p: u8,
    cxp0fb: u8,
    cxp1fb: u8,
    cxm0fb: u8,
    cxm1fb: u8,
    cxblpf: u8,
    cxppmm: u8,
}

impl Collisions {
    fn update(&mut self, p0: bool, p1: bool, m0: bool, m1: bool, bl: bool, pf: bool) {
        const BIT_6: u8 = 0x40;
        const BIT_7: u8 = 0x80;

        macro_rules! latch {
            ($register:ident, $a:expr, $b:expr, $c:expr) => {
                if $a && $b {
                    self.$register |= BIT_6;
                }
                if $a && $c {
                    self.$register |= BIT_7;
                }
            };
        }

        latch!(cxm0p, m0, p0, p1);
        latch!(cxm1p, m1, p1, p0);
        latch!(cxp0fb, p0, bl, pf);
        latch!(cxp1fb, p1, bl, pf);
        latch!(cxm0fb, m0, bl, pf);
        latch!(cxm1fb, m1, bl, pf);

        // bit 6 of CXBLPF is unused
        if bl && pf {
            self.cxblpf |= BIT_7;
        }

        if m0 && m1 {
            self.cxppmm |= BIT_6;
        }
        if p0 && p1 {
            self.cxppmm |= BIT_7;
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The Television Interface Adaptor. It has no framebuffer of its own on
/// real hardware; here the pump reconstructs one palette byte per color
/// clock into `framebuffer` as the beam sweeps. All register state lives in
/// the 64-byte latch array except the strobes and the vertical-delay
/// shadows, which are modelled explicitly.
#[allow(clippy::upper_case_acronyms)]
pub(crate) struct TIA {
    // Pixel clock, monotone; the scheduler catches this up to the system
    // clock after every CPU instruction
    clk: u64,

    // Beam position
    horizontal_clock: u16,
    scanline: u16,

    // Last written value of every write register
    regs: [u8; 64],

    // Frame gate
    in_vsync: bool,
    frame_ready: bool,

    // WSYNC halts the CPU until the line wraps
    wsync: bool,

    // HMOVE comb state
    hmove_latched: bool,
    hmove_counter: u8,
    late_reset_hblank: bool,

    // Vertical-delay shadows, latched by writes to the *other* object's
    // graphics register
    grp0_old: u8,
    grp1_old: u8,
    enabl_old: u8,

    // Position counters for the five movable objects
    p0: ObjectCounter,
    p1: ObjectCounter,
    m0: ObjectCounter,
    m1: ObjectCounter,
    bl: ObjectCounter,

    pf: Playfield,
    collisions: Collisions,

    // Fire button ports. These two ports have latches that are enabled by
    // writing a "1" to D6 of VBLANK; when enabled, the latch goes LOW when
    // its port does and stays there until re-armed.
    inpt4_port: bool,
    inpt4_latch: bool,
    inpt5_port: bool,
    inpt5_latch: bool,

    audio: Audio,

    framebuffer: Box<Frame>,
}

impl Default for TIA {
    fn default() -> Self {
        Self {
            clk: 0,

            horizontal_clock: 0,
            scanline: 0,

            regs: [0; 64],

            in_vsync: false,
            frame_ready: false,

            wsync: false,

            hmove_latched: false,
            hmove_counter: 0,
            late_reset_hblank: false,

            grp0_old: 0,
            grp1_old: 0,
            enabl_old: 0,

            p0: ObjectCounter::new(PLAYER_RESET_DELAY),
            p1: ObjectCounter::new(PLAYER_RESET_DELAY),
            m0: ObjectCounter::new(MISSILE_RESET_DELAY),
            m1: ObjectCounter::new(MISSILE_RESET_DELAY),
            bl: ObjectCounter::new(BALL_RESET_DELAY),

            pf: Playfield::new(),
            collisions: Collisions::default(),

            inpt4_port: true,
            inpt4_latch: true,
            inpt5_port: true,
            inpt5_latch: true,

            audio: Audio::new(),

            framebuffer: Box::new([[0; FRAME_WIDTH]; FRAME_HEIGHT]),
        }
    }
}

impl TIA {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clk(&self) -> u64 {
        self.clk
    }

    pub fn horizontal_clock(&self) -> u16 {
        self.horizontal_clock
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    pub fn cpu_halt(&self) -> bool {
        self.wsync
    }

    pub fn framebuffer(&self) -> &Frame {
        &self.framebuffer
    }

    /// True once per VSYNC falling edge; reading it clears it.
    pub fn take_frame_ready(&mut self) -> bool {
        std::mem::take(&mut self.frame_ready)
    }

    pub fn set_audio_sampling_rate(&mut self, rate: u32) {
        self.audio.set_sampling_rate(rate);
    }

    pub fn drain_audio_samples(&mut self) -> Vec<u8> {
        self.audio.drain_samples()
    }

    pub fn joystick0_fire(&mut self, pressed: bool) {
        self.inpt4_port = !pressed;
        if pressed {
            // Once the port goes LOW the latch stays LOW until re-armed by
            // VBLANK bit 6
            self.inpt4_latch = false;
        }
    }

    pub fn joystick1_fire(&mut self, pressed: bool) {
        self.inpt5_port = !pressed;
        if pressed {
            self.inpt5_latch = false;
        }
    }

    fn reg(&self, r: TiaWriteAddress) -> u8 {
        self.regs[r as usize]
    }

    fn within_hblank(&self) -> bool {
        let end = if self.late_reset_hblank {
            LATE_HBLANK_CLOCKS
        } else {
            HBLANK_CLOCKS
        };
        self.horizontal_clock < end
    }

    fn vblank_enabled(&self) -> bool {
        self.reg(TiaWriteAddress::VBLANK) & 0x02 != 0
    }

    /// One color clock: wind the object counters, step the audio
    /// sub-clock, emit one palette byte, and advance the beam.
    pub fn clock(&mut self) {
        let within_hblank = self.within_hblank();

        // Counters move before the pixel is evaluated
        let (latched, comb) = (self.hmove_latched, self.hmove_counter);
        self.p0.tick(within_hblank, latched, comb);
        self.p1.tick(within_hblank, latched, comb);
        self.m0.tick(within_hblank, latched, comb);
        self.m1.tick(within_hblank, latched, comb);
        self.bl.tick(within_hblank, latched, comb);

        self.audio.clock(self.clk, &self.regs);

        self.pf.fetch(self.horizontal_clock, &self.regs);
        let color = self.pixel_color(within_hblank);
        self.framebuffer[self.scanline as usize][self.horizontal_clock as usize] = color;

        // The comb evaluates sixteen slots, 15 down to 0, then expires
        if self.hmove_latched {
            if self.hmove_counter > 0 {
                self.hmove_counter -= 1;
            } else {
                self.hmove_latched = false;
            }
        }

        self.clk += 1;
        self.horizontal_clock += 1;
        if self.horizontal_clock == CLOCKS_PER_SCANLINE {
            self.horizontal_clock = 0;
            self.wsync = false;
            self.hmove_latched = false;
            self.late_reset_hblank = false;

            self.scanline += 1;
            if self.scanline == SCANLINES_PER_FRAME {
                self.scanline = 0;
            }
        }
    }

    /// Resolve the palette byte for the current beam position, updating the
    /// collision latches along the way.
    fn pixel_color(&mut self, within_hblank: bool) -> u8 {
        use TiaWriteAddress::*;

        if within_hblank {
            return 0;
        }

        let x = (self.horizontal_clock - HBLANK_CLOCKS) as u8;
        let ctrlpf = self.reg(CTRLPF);

        // Vertical delay swaps in the shadow copy of the graphics
        let grp0 = if self.reg(VDELP0) & 0x01 != 0 {
            self.grp0_old
        } else {
            self.reg(GRP0)
        };
        let grp1 = if self.reg(VDELP1) & 0x01 != 0 {
            self.grp1_old
        } else {
            self.reg(GRP1)
        };
        let enabl = if self.reg(VDELBL) & 0x01 != 0 {
            self.enabl_old
        } else {
            self.reg(ENABL)
        };

        let p0 = player::pixel_on(
            self.p0.value(),
            self.reg(NUSIZ0),
            self.reg(REFP0) & 0x08 != 0,
            grp0,
        );
        let p1 = player::pixel_on(
            self.p1.value(),
            self.reg(NUSIZ1),
            self.reg(REFP1) & 0x08 != 0,
            grp1,
        );
        let m0 = missile::pixel_on(
            self.m0.value(),
            self.reg(NUSIZ0),
            self.reg(ENAM0) & 0x02 != 0,
            self.reg(RESMP0) & 0x02 != 0,
        );
        let m1 = missile::pixel_on(
            self.m1.value(),
            self.reg(NUSIZ1),
            self.reg(ENAM1) & 0x02 != 0,
            self.reg(RESMP1) & 0x02 != 0,
        );
        let bl = ball::pixel_on(self.bl.value(), ctrlpf, enabl & 0x02 != 0);
        let pf = self.pf.pixel_on(x, ctrlpf & 0x01 != 0);

        self.collisions.update(p0, p1, m0, m1, bl, pf);

        if self.vblank_enabled() {
            return 0;
        }

        let colup0 = self.reg(COLUP0) & 0xfe;
        let colup1 = self.reg(COLUP1) & 0xfe;
        let colupf = self.reg(COLUPF) & 0xfe;
        let colubk = self.reg(COLUBK) & 0xfe;

        // In score mode the playfield borrows the player colors, left half
        // from player 0, right half from player 1. The priority bit wins
        // over the score bit.
        let priority = ctrlpf & 0x04 != 0;
        let score_mode = ctrlpf & 0x02 != 0 && !priority;
        let pf_color = if score_mode {
            if Playfield::left_half(x) {
                colup0
            } else {
                colup1
            }
        } else {
            colupf
        };

        // When pixels of two or more objects overlap, the object with
        // topmost priority is drawn:
        //
        //  normal              CTRLPF.2 set
        //  1  P0, M0           1  PF, BL
        //  2  P1, M1           2  P0, M0
        //  3  BL, PF           3  P1, M1
        //  4  BK               4  BK
        if priority {
            if pf {
                pf_color
            } else if bl {
                colupf
            } else if p0 || m0 {
                colup0
            } else if p1 || m1 {
                colup1
            } else {
                colubk
            }
        } else if p0 || m0 {
            colup0
        } else if p1 || m1 {
            colup1
        } else if bl {
            colupf
        } else if pf {
            pf_color
        } else {
            colubk
        }
    }
}

impl TIA {
    pub fn read(&self, address: TiaReadAddress) -> u8 {
        use TiaReadAddress::*;
        match address {
            CXM0P => self.collisions.cxm0p,
            CXM1P => self.collisions.cxm1p,
            CXP0FB => self.collisions.cxp0fb,
            CXP1FB => self.collisions.cxp1fb,
            CXM0FB => self.collisions.cxm0fb,
            CXM1FB => self.collisions.cxm1fb,
            CXBLPF => self.collisions.cxblpf,
            CXPPMM => self.collisions.cxppmm,
            // Paddle resistance timing is not implemented
            INPT0 | INPT1 | INPT2 | INPT3 => 0,
            INPT4 => self.input_port(self.inpt4_port, self.inpt4_latch),
            INPT5 => self.input_port(self.inpt5_port, self.inpt5_latch),
        }
    }

    fn input_port(&self, port: bool, latch: bool) -> u8 {
        let mut level = port;

        // With D6 of VBLANK set the processor reads the latch as well
        if self.reg(TiaWriteAddress::VBLANK) & 0x40 != 0 {
            level = level && latch;
        }

        if level {
            0x80
        } else {
            0x00
        }
    }

    pub fn write(&mut self, address: TiaWriteAddress, val: u8) {
        use TiaWriteAddress::*;

        // Every write lands in the latch array; strobes and the handful of
        // registers with side effects dispatch below.
        self.regs[address as usize] = val;

        // RESx latency depends on where the beam is at the strobe
        let within_hblank = self.within_hblank();

        match address {
            VSYNC => {
                let was = self.in_vsync;
                self.in_vsync = val & 0x02 != 0;

                // The falling edge restarts scanout and delivers the frame
                if was && !self.in_vsync {
                    self.scanline = 0;
                    self.frame_ready = true;
                }
            }

            VBLANK => {
                if val & 0x40 != 0 {
                    debug!("INPT4/5 latches armed");
                    self.inpt4_latch = true;
                    self.inpt5_latch = true;
                }
            }

            // Halt the CPU until the leading edge of horizontal blank
            WSYNC => self.wsync = true,

            // Test register; games don't need it
            RSYNC => (),

            RESP0 => self.p0.strobe_reset(within_hblank),
            RESP1 => self.p1.strobe_reset(within_hblank),
            RESM0 => self.m0.strobe_reset(within_hblank),
            RESM1 => self.m1.strobe_reset(within_hblank),
            RESBL => self.bl.strobe_reset(within_hblank),

            RESMP0 => {
                if val & 0x02 != 0 {
                    self.m0.reset_to(&self.p0);
                }
            }
            RESMP1 => {
                if val & 0x02 != 0 {
                    self.m1.reset_to(&self.p1);
                }
            }

            HMP0 => self.p0.set_motion(val),
            HMP1 => self.p1.set_motion(val),
            HMM0 => self.m0.set_motion(val),
            HMM1 => self.m1.set_motion(val),
            HMBL => self.bl.set_motion(val),

            HMOVE => {
                self.late_reset_hblank = true;
                self.hmove_latched = true;
                self.hmove_counter = if self.vblank_enabled() { 12 } else { 15 };
            }

            HMCLR => {
                for hm in [HMP0, HMP1, HMM0, HMM1, HMBL] {
                    self.regs[hm as usize] = 0;
                }
                self.p0.clear_motion();
                self.p1.clear_motion();
                self.m0.clear_motion();
                self.m1.clear_motion();
                self.bl.clear_motion();
            }

            CXCLR => self.collisions.clear(),

            // Writing one player's graphics latches the other's shadow,
            // which is what makes single-buffer-free vertical delay work
            GRP0 => self.grp1_old = self.reg(GRP1),
            GRP1 => {
                self.grp0_old = self.reg(GRP0);
                self.enabl_old = self.reg(ENABL);
            }

            _ => {}
        }
    }
}

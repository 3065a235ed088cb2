mod bus;
mod clock;
mod cpu6507;
#[allow(clippy::upper_case_acronyms)]
pub(crate) mod memory;
mod opcode;
mod riot;
mod tia;

use crate::{bus::AtariBus, clock::Clock, cpu6507::CPU6507, riot::RIOT, tia::TIA};
use log::{info, warn};
use std::{cell::RefCell, error::Error, fs::File, io::Read, rc::Rc};

pub use crate::tia::palette::NTSC_PALETTE;
pub use crate::tia::{Frame, FRAME_HEIGHT, FRAME_WIDTH};

type SharedRIOT = Rc<RefCell<RIOT>>;
type SharedTIA = Rc<RefCell<TIA>>;

/// The assembled console: CPU, TIA and RIOT on one bus, driven by the
/// pixel clock. `run_frame` emulates up to the next VSYNC falling edge and
/// leaves the finished 228x262 field in `frame`.
pub struct Console {
    cpu: CPU6507,
    tia: SharedTIA,
    riot: SharedRIOT,
    clock: Clock,
    frame: Box<Frame>,
}

/// Load a cartridge image and build a console around it. Only linear 2 KiB
/// and 4 KiB ROMs are supported; anything else is a configuration error.
pub fn init_console<P: AsRef<str>>(rom_path: P) -> Result<Console, Box<dyn Error>> {
    let mut fh = File::open(rom_path.as_ref())?;

    let mut rom = vec![];
    let bytes = fh.read_to_end(&mut rom)?;
    info!("ROM: {} ({} bytes)", rom_path.as_ref(), bytes);

    Console::with_rom(rom)
}

impl Console {
    pub fn with_rom(rom: Vec<u8>) -> Result<Self, Box<dyn Error>> {
        if rom.len() != 0x800 && rom.len() != 0x1000 {
            return Err(format!("unsupported ROM size: {} bytes", rom.len()).into());
        }

        info!("RIOT: init");
        let riot = Rc::new(RefCell::new(RIOT::new()));

        info!("TIA: init");
        let tia = Rc::new(RefCell::new(TIA::new()));

        let bus = AtariBus::new(tia.clone(), riot.clone(), rom);

        info!("CPU: init");
        let mut cpu = CPU6507::new(Box::new(bus));
        cpu.reset();

        Ok(Self {
            cpu,
            tia,
            riot,
            clock: Clock::new(),
            frame: Box::new([[0; FRAME_WIDTH]; FRAME_HEIGHT]),
        })
    }

    /// The most recently completed field, palette bytes per color clock.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn set_audio_sample_rate(&mut self, rate: u32) {
        self.tia.borrow_mut().set_audio_sampling_rate(rate);
    }

    /// Take the stereo U8 samples buffered since the last call.
    pub fn drain_audio(&mut self) -> Vec<u8> {
        self.tia.borrow_mut().drain_audio_samples()
    }

    /// Emulate until the guest finishes a frame (VSYNC falling edge), then
    /// copy the framebuffer out for the platform. A guest that never
    /// strobes VSYNC is cut off after a few frames' worth of clocks so the
    /// frontend stays responsive.
    pub fn run_frame(&mut self) -> &Frame {
        const BAILOUT: u64 = 4 * (FRAME_WIDTH * FRAME_HEIGHT) as u64;
        let start = self.clock.now();

        loop {
            self.step_instruction();

            if self.tia.borrow_mut().take_frame_ready() {
                break;
            }

            if self.clock.now() - start > BAILOUT {
                warn!("no VSYNC after {} pixel clocks, delivering as-is", BAILOUT);
                break;
            }
        }

        *self.frame = *self.tia.borrow().framebuffer();
        &self.frame
    }

    /// One CPU instruction, then catch the pipeline up: three pixel clocks
    /// per CPU cycle, plus the rest of the scanline if the instruction hit
    /// WSYNC.
    fn step_instruction(&mut self) {
        let cycles = self.cpu.step();
        self.clock.add_cpu_cycles(cycles);
        self.catch_up();

        if self.tia.borrow().cpu_halt() {
            let remaining = FRAME_WIDTH as u64 - self.tia.borrow().horizontal_clock() as u64;
            self.clock.add_pixel_clocks(remaining);
            self.catch_up();
        }
    }

    /// Advance the RIOT and the TIA pump one pixel at a time until the
    /// pipeline reaches the system clock.
    fn catch_up(&mut self) {
        let target = self.clock.now();
        let mut tia = self.tia.borrow_mut();
        let mut riot = self.riot.borrow_mut();

        while tia.clk() < target {
            riot.tick();
            tia.clock();
        }
    }
}

/// Input events from the platform layer. Directions and buttons are edge
/// reported (pressed/released); the console switches marked as toggles
/// flip on each call.
pub trait KeyEvent {
    fn up(&mut self, pressed: bool);
    fn down(&mut self, pressed: bool);
    fn left(&mut self, pressed: bool);
    fn right(&mut self, pressed: bool);
    fn joystick_fire(&mut self, pressed: bool);

    fn joy1_up(&mut self, pressed: bool);
    fn joy1_down(&mut self, pressed: bool);
    fn joy1_left(&mut self, pressed: bool);
    fn joy1_right(&mut self, pressed: bool);
    fn joy1_fire(&mut self, pressed: bool);

    fn select(&mut self, pressed: bool);
    fn reset(&mut self, pressed: bool);
    fn tv_type(&mut self);
    fn p0_difficulty(&mut self);
    fn p1_difficulty(&mut self);
}

impl KeyEvent for Console {
    fn up(&mut self, pressed: bool) {
        self.riot.borrow_mut().up(pressed);
    }

    fn down(&mut self, pressed: bool) {
        self.riot.borrow_mut().down(pressed);
    }

    fn left(&mut self, pressed: bool) {
        self.riot.borrow_mut().left(pressed);
    }

    fn right(&mut self, pressed: bool) {
        self.riot.borrow_mut().right(pressed);
    }

    fn joystick_fire(&mut self, pressed: bool) {
        self.tia.borrow_mut().joystick0_fire(pressed);
    }

    fn joy1_up(&mut self, pressed: bool) {
        self.riot.borrow_mut().joy1_up(pressed);
    }

    fn joy1_down(&mut self, pressed: bool) {
        self.riot.borrow_mut().joy1_down(pressed);
    }

    fn joy1_left(&mut self, pressed: bool) {
        self.riot.borrow_mut().joy1_left(pressed);
    }

    fn joy1_right(&mut self, pressed: bool) {
        self.riot.borrow_mut().joy1_right(pressed);
    }

    fn joy1_fire(&mut self, pressed: bool) {
        self.tia.borrow_mut().joystick1_fire(pressed);
    }

    fn select(&mut self, pressed: bool) {
        self.riot.borrow_mut().select(pressed);
    }

    fn reset(&mut self, pressed: bool) {
        self.riot.borrow_mut().reset(pressed);
    }

    fn tv_type(&mut self) {
        self.riot.borrow_mut().tv_type();
    }

    fn p0_difficulty(&mut self) {
        self.riot.borrow_mut().p0_difficulty();
    }

    fn p1_difficulty(&mut self) {
        self.riot.borrow_mut().p1_difficulty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 4 KiB image with `program` at 0xF000 and the reset vector
    /// pointing at it.
    fn rom_with(program: &[u8]) -> Vec<u8> {
        let mut rom = vec![0u8; 0x1000];
        rom[..program.len()].copy_from_slice(program);
        rom[0xffc] = 0x00;
        rom[0xffd] = 0xf0;
        rom
    }

    #[test]
    fn rejects_odd_rom_sizes() {
        assert!(Console::with_rom(vec![0; 1024]).is_err());
        assert!(Console::with_rom(vec![0; 3000]).is_err());
        assert!(Console::with_rom(vec![0; 2048]).is_ok());
        assert!(Console::with_rom(vec![0; 4096]).is_ok());
    }

    #[test]
    fn vsync_pulse_delivers_one_frame() {
        #[rustfmt::skip]
        let program = [
            0xa9, 0x02,       // LDA #$02
            0x85, 0x00,       // STA VSYNC
            0x85, 0x02,       // STA WSYNC
            0x85, 0x02,       // STA WSYNC
            0x85, 0x02,       // STA WSYNC
            0xa9, 0x00,       // LDA #$00
            0x85, 0x00,       // STA VSYNC
            0x4c, 0x0e, 0xf0, // spin: JMP $F00E
        ];
        let mut console = Console::with_rom(rom_with(&program)).unwrap();

        console.run_frame();

        // The falling edge restarted scanout at the top of the screen
        assert_eq!(console.tia.borrow().scanline(), 0);
    }

    #[test]
    fn background_color_fills_the_picture() {
        // Paint the background and run a steady frame loop: VSYNC pulse,
        // then 242 WSYNC lines
        #[rustfmt::skip]
        let program = [
            0xa9, 0x1c,       // LDA #$1C
            0x85, 0x09,       // STA COLUBK
            // frame:
            0xa9, 0x02,       // LDA #$02
            0x85, 0x00,       // STA VSYNC
            0x85, 0x02,       // STA WSYNC
            0x85, 0x02,       // STA WSYNC
            0x85, 0x02,       // STA WSYNC
            0xa9, 0x00,       // LDA #$00
            0x85, 0x00,       // STA VSYNC
            0xa2, 0x00,       // LDX #$00
            // line:
            0x85, 0x02,       // STA WSYNC
            0xe8,             // INX
            0xe0, 0xf2,       // CPX #242
            0xd0, 0xf9,       // BNE line
            0x4c, 0x04, 0xf0, // JMP frame
        ];
        let mut console = Console::with_rom(rom_with(&program)).unwrap();

        // First frame is partial (nothing ran before the first VSYNC);
        // the second is fully painted
        console.run_frame();
        let frame = console.run_frame();

        let row = &frame[100];
        assert!(row[..68].iter().all(|&c| c == 0));
        assert!(row[68..].iter().all(|&c| c == 0x1c));
    }

    #[test]
    fn wsync_advances_whole_scanlines() {
        // Two WSYNCs from reset leave the beam at the start of line 2
        #[rustfmt::skip]
        let program = [
            0x85, 0x02,       // STA WSYNC
            0x85, 0x02,       // STA WSYNC
            0x4c, 0x04, 0xf0, // spin
        ];
        let mut console = Console::with_rom(rom_with(&program)).unwrap();

        console.step_instruction();
        assert_eq!(console.tia.borrow().horizontal_clock(), 0);
        assert_eq!(console.tia.borrow().scanline(), 1);

        console.step_instruction();
        assert_eq!(console.tia.borrow().horizontal_clock(), 0);
        assert_eq!(console.tia.borrow().scanline(), 2);
    }

    #[test]
    fn misbehaving_rom_still_returns() {
        // Spins forever without ever strobing VSYNC
        let program = [0x4c, 0x00, 0xf0];
        let mut console = Console::with_rom(rom_with(&program)).unwrap();

        // Hits the bail-out rather than hanging
        console.run_frame();
    }

    #[test]
    fn timer_round_trip_through_the_guest() {
        // TIM64T = 3, then spin
        #[rustfmt::skip]
        let program = [
            0xa9, 0x03,       // LDA #$03
            0x8d, 0x96, 0x02, // STA TIM64T
            0x4c, 0x05, 0xf0, // spin: JMP $F005
        ];
        let mut console = Console::with_rom(rom_with(&program)).unwrap();

        // Right after the store the timer reads back what was written
        console.step_instruction();
        console.step_instruction();
        assert_eq!(
            console.riot.borrow_mut().read(crate::memory::RiotAddress::INTIM),
            3
        );

        // Spin past 64*(3+1) CPU cycles: the timer has underflowed and the
        // status flag is up
        for _ in 0..100 {
            console.step_instruction();
        }
        assert_eq!(
            console.riot.borrow_mut().read(crate::memory::RiotAddress::INSTAT) & 0x80,
            0x80
        );
    }

    #[test]
    fn audio_accumulates_across_a_frame() {
        let program = [0x4c, 0x00, 0xf0];
        let mut console = Console::with_rom(rom_with(&program)).unwrap();

        console.run_frame();
        let samples = console.drain_audio();
        assert!(!samples.is_empty());
        // Silent ROM: everything on the midline
        assert!(samples.iter().all(|&s| s == 128));
    }

    #[test]
    fn key_events_reach_the_ports() {
        let program = [0x4c, 0x00, 0xf0];
        let mut console = Console::with_rom(rom_with(&program)).unwrap();

        console.up(true);
        console.joystick_fire(true);
        console.reset(true);

        assert_eq!(
            console.riot.borrow_mut().read(crate::memory::RiotAddress::SWCHA) & 0x10,
            0
        );
        assert_eq!(
            console.tia.borrow().read(crate::memory::TiaReadAddress::INPT4),
            0
        );
        assert_eq!(
            console.riot.borrow_mut().read(crate::memory::RiotAddress::SWCHB) & 0x01,
            0
        );
    }
}

use crate::memory::RiotAddress;
use log::debug;

// Joystick lines on port A, asserted low.
const JOY0_UP: u8 = 0x10;
const JOY0_DOWN: u8 = 0x20;
const JOY0_LEFT: u8 = 0x40;
const JOY0_RIGHT: u8 = 0x80;
const JOY1_UP: u8 = 0x01;
const JOY1_DOWN: u8 = 0x02;
const JOY1_LEFT: u8 = 0x04;
const JOY1_RIGHT: u8 = 0x08;

// Console switches on port B. RESET and SELECT are asserted low; the
// difficulty and TV-type switches are level toggles.
const RESET_SWITCH: u8 = 0x01;
const SELECT_SWITCH: u8 = 0x02;
const TVTYPE_SWITCH: u8 = 0x08;
const P0_DIFFICULTY_SWITCH: u8 = 0x40;
const P1_DIFFICULTY_SWITCH: u8 = 0x80;

/// The RIOT (RAM/IO/Timer) chip, a MOS 6532. 128 bytes of RAM, two input
/// ports wired to the joysticks and console switches, and an interval
/// timer with 1/8/64/1024-cycle prescalers.
#[allow(clippy::upper_case_acronyms)]
pub(crate) struct RIOT {
    ram: [u8; 128],

    // Port DDRs are stored and otherwise ignored; the ports themselves
    // always read the platform state
    swacnt: u8,
    swbcnt: u8,

    port_a: u8,
    port_b: u8,

    // Interval timer. The chip runs on the CPU clock; `subcounter` divides
    // the three pixel clocks per CPU cycle back down.
    subcounter: u8,
    prescaler: u16,
    sub_prescale: u16,
    value: u8,
    interrupt: bool,
}

impl Default for RIOT {
    fn default() -> Self {
        Self {
            ram: [0; 128],

            swacnt: 0,
            swbcnt: 0,

            // All joystick lines released
            port_a: 0xff,
            // Difficulty switches on amateur, color TV, RESET/SELECT
            // released
            port_b: RESET_SWITCH | SELECT_SWITCH | TVTYPE_SWITCH,

            subcounter: 2,
            prescaler: 1024,
            sub_prescale: 0,
            value: 0,
            interrupt: false,
        }
    }
}

impl RIOT {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ram_read(&self, index: usize) -> u8 {
        self.ram[index & 0x7f]
    }

    pub fn ram_write(&mut self, index: usize, val: u8) {
        self.ram[index & 0x7f] = val;
    }

    //
    // Console switches
    //

    pub fn tv_type(&mut self) {
        self.port_b ^= TVTYPE_SWITCH;
    }

    pub fn p0_difficulty(&mut self) {
        self.port_b ^= P0_DIFFICULTY_SWITCH;
    }

    pub fn p1_difficulty(&mut self) {
        self.port_b ^= P1_DIFFICULTY_SWITCH;
    }

    pub fn reset(&mut self, pressed: bool) {
        self.set_port_b(RESET_SWITCH, pressed);
    }

    pub fn select(&mut self, pressed: bool) {
        self.set_port_b(SELECT_SWITCH, pressed);
    }

    fn set_port_b(&mut self, line: u8, pressed: bool) {
        if pressed {
            self.port_b &= !line;
        } else {
            self.port_b |= line;
        }
    }

    //
    // Joystick directions, asserted low
    //

    pub fn up(&mut self, pressed: bool) {
        self.set_port_a(JOY0_UP, pressed);
    }

    pub fn down(&mut self, pressed: bool) {
        self.set_port_a(JOY0_DOWN, pressed);
    }

    pub fn left(&mut self, pressed: bool) {
        self.set_port_a(JOY0_LEFT, pressed);
    }

    pub fn right(&mut self, pressed: bool) {
        self.set_port_a(JOY0_RIGHT, pressed);
    }

    pub fn joy1_up(&mut self, pressed: bool) {
        self.set_port_a(JOY1_UP, pressed);
    }

    pub fn joy1_down(&mut self, pressed: bool) {
        self.set_port_a(JOY1_DOWN, pressed);
    }

    pub fn joy1_left(&mut self, pressed: bool) {
        self.set_port_a(JOY1_LEFT, pressed);
    }

    pub fn joy1_right(&mut self, pressed: bool) {
        self.set_port_a(JOY1_RIGHT, pressed);
    }

    fn set_port_a(&mut self, line: u8, pressed: bool) {
        if pressed {
            self.port_a &= !line;
        } else {
            self.port_a |= line;
        }
    }

    //
    // Interval timer
    //

    /// One pixel clock. Three of these make a CPU cycle, which is the
    /// timer's real tick.
    pub fn tick(&mut self) {
        if self.subcounter > 0 {
            self.subcounter -= 1;
            return;
        }
        self.subcounter = 2;
        self.tick_cpu_cycle();
    }

    fn tick_cpu_cycle(&mut self) {
        self.sub_prescale += 1;
        if self.sub_prescale < self.prescaler {
            return;
        }
        self.sub_prescale = 0;
        self.decrement();
    }

    fn decrement(&mut self) {
        if self.value == 0 {
            // Underflow: flag it, restart at FFh, and from here on the
            // timer decrements once per CPU cycle regardless of the
            // selected interval
            self.interrupt = true;
            self.value = 0xff;
            self.prescaler = 1;
        } else {
            self.value -= 1;
        }
    }

    /// TIMxT write: select the interval and load the counter. A value of
    /// zero underflows immediately.
    fn init_timer(&mut self, val: u8, prescaler: u16) {
        self.prescaler = prescaler;
        self.sub_prescale = 0;
        self.subcounter = 2;
        self.interrupt = false;
        self.value = val;
        if val == 0 {
            self.decrement();
        }
    }

    pub fn read(&mut self, address: RiotAddress) -> u8 {
        use RiotAddress::*;
        match address {
            SWCHA => self.port_a,
            SWACNT => self.swacnt,
            SWCHB => self.port_b,
            SWBCNT => self.swbcnt,
            INTIM => {
                self.interrupt = false;
                self.value
            }
            INSTAT => {
                let status = (self.interrupt as u8) << 7;
                self.interrupt = false;
                status
            }
            _ => {
                debug!("RIOT: read of write-only register {:?}", address);
                0
            }
        }
    }

    pub fn write(&mut self, address: RiotAddress, val: u8) {
        use RiotAddress::*;
        match address {
            SWACNT => self.swacnt = val,
            SWBCNT => self.swbcnt = val,
            TIM1T => self.init_timer(val, 1),
            TIM8T => self.init_timer(val, 8),
            TIM64T => self.init_timer(val, 64),
            T1024T => self.init_timer(val, 1024),
            // Port data writes are accepted and dropped
            _ => debug!("RIOT: write {:02X} to {:?} ignored", val, address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_cycles(riot: &mut RIOT, n: usize) {
        for _ in 0..n * 3 {
            riot.tick();
        }
    }

    #[test]
    fn ram_round_trip() {
        let mut riot = RIOT::new();
        riot.ram_write(0x10, 0xab);
        assert_eq!(riot.ram_read(0x10), 0xab);
        // RAM repeats through its mirrors
        assert_eq!(riot.ram_read(0x90), 0xab);
    }

    #[test]
    fn timer_reads_back_the_written_value() {
        let mut riot = RIOT::new();
        riot.write(RiotAddress::TIM64T, 10);
        assert_eq!(riot.read(RiotAddress::INTIM), 10);
    }

    #[test]
    fn tim64t_counts_down_and_underflows() {
        let mut riot = RIOT::new();
        riot.write(RiotAddress::TIM64T, 10);

        // One interval in: one decrement
        cpu_cycles(&mut riot, 64);
        assert_eq!(riot.read(RiotAddress::INTIM), 9);

        // At 64 * 10 cycles the counter reads zero and holds through the
        // final interval
        cpu_cycles(&mut riot, 64 * 9);
        assert_eq!(riot.read(RiotAddress::INTIM), 0);
        cpu_cycles(&mut riot, 63);
        assert_eq!(riot.read(RiotAddress::INTIM), 0);
        assert_eq!(riot.read(RiotAddress::INSTAT), 0);

        // The (N+1)-th interval underflows: status set, counter restarted
        // at FFh
        cpu_cycles(&mut riot, 1);
        assert_eq!(riot.read(RiotAddress::INSTAT) & 0x80, 0x80);
        // INSTAT reads clear the flag
        assert_eq!(riot.read(RiotAddress::INSTAT), 0);

        // After underflow the timer runs at one decrement per cycle
        assert_eq!(riot.read(RiotAddress::INTIM), 0xff);
        cpu_cycles(&mut riot, 5);
        assert_eq!(riot.read(RiotAddress::INTIM), 0xfa);
    }

    #[test]
    fn tim8t_cadence() {
        let mut riot = RIOT::new();
        riot.write(RiotAddress::TIM8T, 3);

        cpu_cycles(&mut riot, 7);
        assert_eq!(riot.read(RiotAddress::INTIM), 3);
        cpu_cycles(&mut riot, 1);
        assert_eq!(riot.read(RiotAddress::INTIM), 2);
        cpu_cycles(&mut riot, 16);
        assert_eq!(riot.read(RiotAddress::INTIM), 0);
    }

    #[test]
    fn writing_zero_underflows_immediately() {
        let mut riot = RIOT::new();
        riot.write(RiotAddress::TIM64T, 0);
        assert_eq!(riot.read(RiotAddress::INSTAT) & 0x80, 0x80);
        assert_eq!(riot.read(RiotAddress::INTIM), 0xff);
    }

    #[test]
    fn intim_read_clears_the_interrupt() {
        let mut riot = RIOT::new();
        riot.write(RiotAddress::TIM1T, 1);
        cpu_cycles(&mut riot, 2);
        // Underflowed by now
        assert_eq!(riot.read(RiotAddress::INTIM), 0xff);
        assert_eq!(riot.read(RiotAddress::INSTAT), 0);
    }

    #[test]
    fn restarting_the_timer_clears_the_interrupt() {
        let mut riot = RIOT::new();
        riot.write(RiotAddress::TIM1T, 1);
        cpu_cycles(&mut riot, 2);
        riot.write(RiotAddress::TIM64T, 5);
        assert_eq!(riot.read(RiotAddress::INSTAT), 0);
        assert_eq!(riot.read(RiotAddress::INTIM), 5);
    }

    #[test]
    fn joystick_lines_assert_low() {
        let mut riot = RIOT::new();
        assert_eq!(riot.read(RiotAddress::SWCHA), 0xff);

        riot.up(true);
        assert_eq!(riot.read(RiotAddress::SWCHA), 0xff & !0x10);

        riot.up(false);
        riot.joy1_left(true);
        assert_eq!(riot.read(RiotAddress::SWCHA), 0xff & !0x04);
    }

    #[test]
    fn console_switches() {
        let mut riot = RIOT::new();
        let idle = riot.read(RiotAddress::SWCHB);
        assert_eq!(idle & 0x03, 0x03);

        riot.reset(true);
        assert_eq!(riot.read(RiotAddress::SWCHB) & 0x01, 0);
        riot.reset(false);

        riot.select(true);
        assert_eq!(riot.read(RiotAddress::SWCHB) & 0x02, 0);
        riot.select(false);

        riot.tv_type();
        assert_eq!(riot.read(RiotAddress::SWCHB) & 0x08, 0);
        riot.tv_type();

        riot.p0_difficulty();
        assert_eq!(riot.read(RiotAddress::SWCHB) & 0x40, 0x40);

        riot.p1_difficulty();
        assert_eq!(riot.read(RiotAddress::SWCHB) & 0x80, 0x80);
    }

    #[test]
    fn port_writes_are_ignored() {
        let mut riot = RIOT::new();
        riot.write(RiotAddress::SWCHA, 0x00);
        assert_eq!(riot.read(RiotAddress::SWCHA), 0xff);
    }
}

/// One scanline of visible pixels, and therefore the period of every object
/// counter.
pub(crate) const PERIOD: u8 = 160;

/// Strobing RESPx takes effect a few pixels after the write; the latency
/// differs between object kinds and between blanked and visible beam
/// positions.
pub(crate) const PLAYER_RESET_DELAY: (u8, u8) = (3, 5); // (hblank, visible)
pub(crate) const MISSILE_RESET_DELAY: (u8, u8) = (2, 4);
pub(crate) const BALL_RESET_DELAY: (u8, u8) = (2, 4);

/// Position counter for one movable object (player, missile or ball).
///
/// Horizontal position is implicit: the counter wraps modulo 160 and the
/// object draws whenever the count passes through its graphic window. The
/// counter normally steps once per visible pixel and freezes during HBLANK;
/// HMOVE stuffs extra steps in during HBLANK ("combing"), which is how
/// horizontal motion is implemented.
/// See: http://www.atarihq.com/danb/files/TIA_HW_Notes.txt
pub(crate) struct ObjectCounter {
    value: u8,
    /// Signed step bias decoded from the object's HMxx register.
    motion: i8,
    reset_pending: bool,
    reset_timer: u8,
    reset_delay: (u8, u8),
}

impl ObjectCounter {
    pub fn new(reset_delay: (u8, u8)) -> Self {
        Self {
            value: 0,
            motion: 0,
            reset_pending: false,
            reset_timer: 0,
            reset_delay,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn motion(&self) -> i8 {
        self.motion
    }

    /// Decode the high nybble of an HMxx write. A nybble of 0x7 ends up
    /// displacing the object 7 pixels to the right, 0x8 eight pixels to the
    /// left.
    pub fn set_motion(&mut self, hm: u8) {
        let nybble = (hm >> 4) as i8;
        let signed = if nybble > 7 { nybble - 16 } else { nybble };
        self.motion = -signed;
    }

    pub fn clear_motion(&mut self) {
        self.motion = 0;
    }

    /// RESxx strobe: arm a reset that lands after the object's latency.
    pub fn strobe_reset(&mut self, within_hblank: bool) {
        self.reset_pending = true;
        self.reset_timer = if within_hblank {
            self.reset_delay.0
        } else {
            self.reset_delay.1
        };
    }

    /// RESMPx: lock a missile counter onto its player's position.
    pub fn reset_to(&mut self, other: &ObjectCounter) {
        self.value = other.value;
        self.reset_pending = false;
        self.reset_timer = 0;
    }

    /// One pixel clock. The counter steps on every visible pixel; during
    /// HBLANK it only steps when the HMOVE comb is latched and the comb
    /// value is still above this object's cut-off. A pending reset consumes
    /// the step instead of incrementing.
    pub fn tick(&mut self, within_hblank: bool, hmove_latched: bool, hmove_counter: u8) {
        let comb_hit =
            hmove_latched && (hmove_counter as i16) > (7 - self.motion as i16);

        if !within_hblank || comb_hit {
            if self.reset_pending && self.reset_timer == 0 {
                self.value = 0;
                self.reset_pending = false;
            } else {
                self.value = (self.value + 1) % PERIOD;
            }
        }

        if self.reset_timer > 0 {
            self.reset_timer -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> ObjectCounter {
        ObjectCounter::new(PLAYER_RESET_DELAY)
    }

    #[test]
    fn steps_on_visible_pixels_only() {
        let mut ctr = player();

        for _ in 0..68 {
            ctr.tick(true, false, 0);
        }
        assert_eq!(ctr.value(), 0);

        for _ in 0..160 {
            ctr.tick(false, false, 0);
        }
        // A full line of visible pixels brings the counter back around
        assert_eq!(ctr.value(), 0);

        ctr.tick(false, false, 0);
        assert_eq!(ctr.value(), 1);
    }

    #[test]
    fn motion_decoding() {
        let mut ctr = player();

        ctr.set_motion(0x70);
        assert_eq!(ctr.motion(), -7);

        ctr.set_motion(0x80);
        assert_eq!(ctr.motion(), 8);

        ctr.set_motion(0xf0);
        assert_eq!(ctr.motion(), 1);

        ctr.set_motion(0x00);
        assert_eq!(ctr.motion(), 0);

        ctr.clear_motion();
        assert_eq!(ctr.motion(), 0);
    }

    // Walk the comb exactly the way the pump does: sixteen HBLANK pixels
    // with the counter latched, the comb value decrementing from 15 to 0.
    fn comb_steps(motion_nybble: u8) -> u8 {
        let mut ctr = player();
        ctr.set_motion(motion_nybble);

        let before = ctr.value();
        let mut comb = 15u8;
        loop {
            ctr.tick(true, true, comb);
            if comb == 0 {
                break;
            }
            comb -= 1;
        }
        ((ctr.value() as u16 + PERIOD as u16 - before as u16) % PERIOD as u16) as u8
    }

    #[test]
    fn comb_adds_eight_plus_motion_steps() {
        // motion 0 gains the eight steps that the late-HBLANK extension
        // takes away, for a net displacement of zero
        assert_eq!(comb_steps(0x00), 8);
        // motion -7 (nybble 0x7): a single extra step
        assert_eq!(comb_steps(0x70), 1);
        // motion +8 (nybble 0x8): every comb slot fires
        assert_eq!(comb_steps(0x80), 16);
        // motion +1 (nybble 0xf)
        assert_eq!(comb_steps(0xf0), 9);
    }

    #[test]
    fn reset_latency_outside_hblank() {
        let mut ctr = player();

        for _ in 0..40 {
            ctr.tick(false, false, 0);
        }
        assert_eq!(ctr.value(), 40);

        ctr.strobe_reset(false);

        // Five pixels of latency, then the next step zeroes the counter
        for _ in 0..5 {
            ctr.tick(false, false, 0);
        }
        assert_eq!(ctr.value(), 45);

        ctr.tick(false, false, 0);
        assert_eq!(ctr.value(), 0);

        ctr.tick(false, false, 0);
        assert_eq!(ctr.value(), 1);
    }

    #[test]
    fn reset_in_hblank_waits_for_first_visible_step() {
        let mut ctr = player();

        for _ in 0..10 {
            ctr.tick(false, false, 0);
        }
        ctr.strobe_reset(true);

        // The latency expires while the beam is still blanked; the counter
        // holds until the first visible step applies the reset.
        for _ in 0..20 {
            ctr.tick(true, false, 0);
        }
        assert_eq!(ctr.value(), 10);

        ctr.tick(false, false, 0);
        assert_eq!(ctr.value(), 0);
    }

    #[test]
    fn missile_uses_shorter_latency() {
        let mut ctr = ObjectCounter::new(MISSILE_RESET_DELAY);

        for _ in 0..40 {
            ctr.tick(false, false, 0);
        }
        ctr.strobe_reset(false);

        for _ in 0..4 {
            ctr.tick(false, false, 0);
        }
        assert_eq!(ctr.value(), 44);

        ctr.tick(false, false, 0);
        assert_eq!(ctr.value(), 0);
    }

    #[test]
    fn reset_to_copies_position() {
        let mut p = player();
        let mut m = ObjectCounter::new(MISSILE_RESET_DELAY);

        for _ in 0..25 {
            p.tick(false, false, 0);
        }
        m.reset_to(&p);
        assert_eq!(m.value(), 25);
    }
}

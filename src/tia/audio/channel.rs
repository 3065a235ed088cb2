// One TIA audio circuit. A programmable divider (AUDF) clocks a waveform
// generator picked by AUDC: polynomial noise from 4/5/9-bit LFSRs, square
// waves from divide-by-2/6/31 counters, or combinations where one generator
// gates another. The 4-bit volume scales the resulting bit into an unsigned
// 8-bit sample around the 128 midline.
pub(crate) struct Channel {
    count: u8,
    sound_bit: bool,

    poly4: u8,
    poly5: u8,
    poly9: u16,

    div6: u8,
    div31: u8,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            count: 0,
            sound_bit: false,

            // LFSRs start all-ones; the all-zero state is a lockup
            poly4: 0x0f,
            poly5: 0x1f,
            poly9: 0x1ff,

            div6: 0,
            div31: 0,
        }
    }
}

impl Channel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sound_bit(&self) -> bool {
        self.sound_bit
    }

    /// One channel clock (every 114 color clocks). Counts the divider down;
    /// on wrap, reloads it from AUDF and advances the waveform selected by
    /// AUDC.
    pub fn advance(&mut self, control: u8, freq: u8) {
        if self.count == 0 {
            self.count = freq & 0x1f;
            self.advance_waveform(control & 0x0f);
        } else {
            self.count -= 1;
        }
    }

    /// Scale the current waveform bit by the 4-bit volume into an unsigned
    /// sample. Volume zero always lands exactly on the 128 midline.
    pub fn output(&self, volume: u8) -> u8 {
        let vol = (volume & 0x0f) as i32;
        let level: i32 = if self.sound_bit { -128 } else { 127 };
        (128 + level * vol / 128) as u8
    }

    fn advance_waveform(&mut self, control: u8) {
        match control {
            // Constant output
            0x0 | 0xb => self.sound_bit = true,

            // 4-bit polynomial noise
            0x1 => self.sound_bit = self.clock_poly4(),

            // poly4 clocked through the 31-step counter
            0x2 => {
                if self.clock_div31() {
                    self.clock_poly4();
                }
                self.sound_bit = self.poly4 & 1 != 0;
            }

            // poly4 gated by poly5 output
            0x3 => {
                if self.clock_poly5() {
                    self.clock_poly4();
                }
                self.sound_bit = self.poly4 & 1 != 0;
            }

            // Divide-by-2 pure tone
            0x4 | 0x5 => self.sound_bit = !self.sound_bit,

            // 31-step square (13 high, 18 low)
            0x6 | 0xa => {
                self.clock_div31();
                self.sound_bit = self.div31_out();
            }

            // 5-bit polynomial noise
            0x7 | 0x9 => self.sound_bit = self.clock_poly5(),

            // 9-bit polynomial noise
            0x8 => self.sound_bit = self.clock_poly9(),

            // Divide-by-6 pure tone
            0xc | 0xd => {
                self.clock_div6();
                self.sound_bit = self.div6_out();
            }

            // div-6 clocked through the 31-step counter
            0xe => {
                if self.clock_div31() {
                    self.clock_div6();
                }
                self.sound_bit = self.div6_out();
            }

            // div-6 gated by poly5 output
            _ => {
                if self.clock_poly5() {
                    self.clock_div6();
                }
                self.sound_bit = self.div6_out();
            }
        }
    }

    // x^4 + x^3 + 1, period 15
    fn clock_poly4(&mut self) -> bool {
        let feedback = ((self.poly4 >> 3) ^ (self.poly4 >> 2)) & 1;
        self.poly4 = ((self.poly4 << 1) | feedback) & 0x0f;
        self.poly4 & 1 != 0
    }

    // x^5 + x^3 + 1, period 31
    fn clock_poly5(&mut self) -> bool {
        let feedback = ((self.poly5 >> 4) ^ (self.poly5 >> 2)) & 1;
        self.poly5 = ((self.poly5 << 1) | feedback) & 0x1f;
        self.poly5 & 1 != 0
    }

    // x^9 + x^5 + 1, period 511
    fn clock_poly9(&mut self) -> bool {
        let feedback = ((self.poly9 >> 8) ^ (self.poly9 >> 4)) & 1;
        self.poly9 = ((self.poly9 << 1) | feedback) & 0x1ff;
        self.poly9 & 1 != 0
    }

    /// Steps the 31-counter; true on wrap, which is the gate event for the
    /// "31-counter gate" modes.
    fn clock_div31(&mut self) -> bool {
        self.div31 = (self.div31 + 1) % 31;
        self.div31 == 0
    }

    fn div31_out(&self) -> bool {
        self.div31 >= 18
    }

    fn clock_div6(&mut self) {
        self.div6 = (self.div6 + 1) % 6;
    }

    fn div6_out(&self) -> bool {
        self.div6 < 3
    }
}

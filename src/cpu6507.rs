use crate::bus::Bus;
use crate::opcode::{AddressingMode, Instruction, Opcode, OPCODES};
use log::{debug, info};
use std::env;

const STACK_INIT: u8 = 0xff;

lazy_static::lazy_static! {
    static ref CPU_TRACE: bool = match env::var("CPU6507_TRACE") {
        Ok(val) => !val.is_empty() && val != "0",
        Err(_) => false,
    };
}

fn pages_differ(addr_a: u16, addr_b: u16) -> bool {
    (addr_a & 0xff00) != (addr_b & 0xff00)
}

#[allow(dead_code)]
mod status {
    use modular_bitfield::bitfield;
    #[bitfield(bits = 8)]
    pub(crate) struct StatusRegisterFlags {
        pub c: bool, // Carry
        pub z: bool, // Zero
        pub i: bool, // Interrupt disable
        pub d: bool, // Decimal mode
        pub b: bool, // Software interrupt (BRK)
        pub u: bool, // Unused
        pub v: bool, // Overflow
        pub s: bool, // Sign
    }
}
use status::StatusRegisterFlags;

/// The 6507: a 6502 with 13 address lines and no interrupt pins. Runs one
/// whole instruction per `step` and reports the cycles it burned; the
/// scheduler turns those into pixel clocks.
#[allow(clippy::upper_case_acronyms)]
pub(crate) struct CPU6507 {
    bus: Box<dyn Bus>,

    // Main registers
    pub a: u8,
    pub x: u8,
    pub y: u8,

    flags: StatusRegisterFlags,

    pub pc: u16,
    sp: u8,

    // Total cycles executed since reset
    cycles: u64,
}

impl Bus for CPU6507 {
    fn read(&mut self, addr: u16) -> u8 {
        // Only 13 address lines are brought out of the package
        self.bus.read(addr & 0x1fff)
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.bus.write(addr & 0x1fff, val);
    }
}

impl CPU6507 {
    pub fn new(bus: Box<dyn Bus>) -> Self {
        Self {
            bus,

            a: 0,
            x: 0,
            y: 0,

            flags: StatusRegisterFlags::new(),

            pc: 0x0000,
            sp: STACK_INIT,

            cycles: 0,
        }
    }

    pub fn reset(&mut self) {
        let lo = self.read(0xFFFC) as u16;
        let hi = self.read(0xFFFD) as u16;
        self.pc = (hi << 8) | lo;
        info!("PC: 0x{:04X}", self.pc);

        self.set_flags(0x24);

        self.sp = STACK_INIT;
        self.a = 0;
        self.x = 0;
        self.y = 0;

        self.cycles = 0;
    }

    /// Execute one complete instruction and return the cycles it took,
    /// including page-cross and taken-branch penalties.
    pub fn step(&mut self) -> u64 {
        let start = self.cycles;

        let opcode = self.read(self.pc);
        let Opcode(inst, addr_mode, cycles, extra_cycles) = OPCODES[opcode as usize];

        let (addr, page_crossed) = self.operand_address(addr_mode);
        self.pc = self.pc.wrapping_add(addr_mode.n_bytes());

        self.cycles += cycles + if page_crossed { extra_cycles } else { 0 };

        if *CPU_TRACE {
            debug!(
                "{:04X}  {:02X} {:?} a={:02X} x={:02X} y={:02X} sp={:02X}",
                self.pc, opcode, inst, self.a, self.x, self.y, self.sp
            );
        }

        self.execute(inst, addr, addr_mode, opcode);

        self.cycles - start
    }

    fn calculate_absolute_address(&mut self, pc: u16) -> u16 {
        let lo = self.read(pc.wrapping_add(1)) as u16;
        let hi = self.read(pc.wrapping_add(2)) as u16;
        (hi << 8) | lo
    }

    fn calculate_indirect_address(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        // The indirect fetch never carries into the high byte
        let hi = if addr & 0xff == 0xff {
            self.read(addr & 0xff00) as u16
        } else {
            self.read(addr + 1) as u16
        };
        (hi << 8) | lo
    }

    fn operand_address(&mut self, addr_mode: AddressingMode) -> (u16, bool) {
        let pc = self.pc;
        let next_pc = self.pc.wrapping_add(addr_mode.n_bytes());

        match addr_mode {
            AddressingMode::Implied | AddressingMode::Accumulator => (0, false),
            AddressingMode::Immediate => (pc.wrapping_add(1), false),
            AddressingMode::Absolute => (self.calculate_absolute_address(pc), false),
            AddressingMode::ZeroPage => (self.read(pc.wrapping_add(1)) as u16, false),
            AddressingMode::ZeroPageX => {
                (self.read(pc.wrapping_add(1)).wrapping_add(self.x) as u16, false)
            }
            AddressingMode::ZeroPageY => {
                (self.read(pc.wrapping_add(1)).wrapping_add(self.y) as u16, false)
            }
            AddressingMode::Relative => {
                let offset = self.read(pc.wrapping_add(1)) as i8;
                // Branch targets are relative to the already advanced
                // program counter
                ((next_pc as i16).wrapping_add(offset as i16) as u16, false)
            }
            AddressingMode::AbsoluteX => {
                let addr = self.calculate_absolute_address(pc);
                let n_addr = addr.wrapping_add(self.x as u16);
                (n_addr, pages_differ(addr, n_addr))
            }
            AddressingMode::AbsoluteY => {
                let addr = self.calculate_absolute_address(pc);
                let n_addr = addr.wrapping_add(self.y as u16);
                (n_addr, pages_differ(addr, n_addr))
            }
            AddressingMode::Indirect => {
                let addr = self.calculate_absolute_address(pc);
                (self.calculate_indirect_address(addr), false)
            }
            AddressingMode::IndexedIndirect => {
                let addr = self.read(pc.wrapping_add(1)).wrapping_add(self.x) as u16;
                (self.calculate_indirect_address(addr), false)
            }
            AddressingMode::IndirectIndexed => {
                let addr = self.read(pc.wrapping_add(1)) as u16;
                let addr = self.calculate_indirect_address(addr);
                let n_addr = addr.wrapping_add(self.y as u16);
                (n_addr, pages_differ(addr, n_addr))
            }
        }
    }

    fn execute(&mut self, inst: Instruction, addr: u16, addr_mode: AddressingMode, opcode: u8) {
        match inst {
            Instruction::ADC => self.adc(addr),
            Instruction::AND => self.and(addr),
            Instruction::ASL => self.asl(addr, addr_mode),
            Instruction::BCC => self.bcc(addr),
            Instruction::BCS => self.bcs(addr),
            Instruction::BEQ => self.beq(addr),
            Instruction::BIT => self.bit(addr),
            Instruction::BMI => self.bmi(addr),
            Instruction::BNE => self.bne(addr),
            Instruction::BPL => self.bpl(addr),
            Instruction::BRK => self.brk(),
            Instruction::BVC => self.bvc(addr),
            Instruction::BVS => self.bvs(addr),
            Instruction::CLC => self.flags.set_c(false),
            Instruction::CLD => self.flags.set_d(false),
            Instruction::CLI => self.flags.set_i(false),
            Instruction::CLV => self.flags.set_v(false),
            Instruction::CMP => self.compare(self.a, addr),
            Instruction::CPX => self.compare(self.x, addr),
            Instruction::CPY => self.compare(self.y, addr),
            Instruction::DEC => self.dec(addr),
            Instruction::DEX => self.dex(),
            Instruction::DEY => self.dey(),
            Instruction::EOR => self.eor(addr),
            Instruction::INC => self.inc(addr),
            Instruction::INX => self.inx(),
            Instruction::INY => self.iny(),
            Instruction::JMP => self.pc = addr,
            Instruction::JSR => self.jsr(addr),
            Instruction::LDA => self.lda(addr),
            Instruction::LDX => self.ldx(addr),
            Instruction::LDY => self.ldy(addr),
            Instruction::LSR => self.lsr(addr, addr_mode),
            Instruction::NOP => {}
            Instruction::ORA => self.ora(addr),
            Instruction::PHA => self.stack_push8(self.a),
            Instruction::PHP => self.php(),
            Instruction::PLA => self.pla(),
            Instruction::PLP => self.plp(),
            Instruction::ROL => self.rol(addr, addr_mode),
            Instruction::ROR => self.ror(addr, addr_mode),
            Instruction::RTI => self.rti(),
            Instruction::RTS => self.rts(),
            Instruction::SBC => self.sbc(addr),
            Instruction::SEC => self.flags.set_c(true),
            Instruction::SED => self.flags.set_d(true),
            Instruction::SEI => self.flags.set_i(true),
            Instruction::STA => self.write(addr, self.a),
            Instruction::STX => self.write(addr, self.x),
            Instruction::STY => self.write(addr, self.y),
            Instruction::TAX => self.tax(),
            Instruction::TAY => self.tay(),
            Instruction::TSX => self.tsx(),
            Instruction::TXA => self.txa(),
            Instruction::TXS => self.sp = self.x,
            Instruction::TYA => self.tya(),
            Instruction::ILL => {
                debug!("undocumented opcode {:02X} executed as NOP", opcode);
            }
        }
    }

    fn flags(&self) -> u8 {
        (self.flags.c() as u8)
            | ((self.flags.z() as u8) << 1)
            | ((self.flags.i() as u8) << 2)
            | ((self.flags.d() as u8) << 3)
            | ((self.flags.b() as u8) << 4)
            | ((self.flags.u() as u8) << 5)
            | ((self.flags.v() as u8) << 6)
            | ((self.flags.s() as u8) << 7)
    }

    fn set_flags(&mut self, val: u8) {
        self.flags.set_c(val & 0x01 != 0);
        self.flags.set_z(val >> 1 & 0x01 != 0);
        self.flags.set_i(val >> 2 & 0x01 != 0);
        self.flags.set_d(val >> 3 & 0x01 != 0);
        self.flags.set_b(val >> 4 & 0x01 != 0);
        self.flags.set_u(val >> 5 & 0x01 != 0);
        self.flags.set_v(val >> 6 & 0x01 != 0);
        self.flags.set_s(val >> 7 & 0x01 != 0);
    }

    fn stack_push8(&mut self, val: u8) {
        // With only RAM behind the stack page, the pointer alone addresses
        // the byte
        let addr = self.sp as u16;
        self.write(addr, val);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn stack_pop8(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        let addr = self.sp as u16;
        self.read(addr)
    }

    fn stack_push16(&mut self, val: u16) {
        self.stack_push8((val >> 8) as u8);
        self.stack_push8((val & 0x00ff) as u8);
    }

    fn stack_pop16(&mut self) -> u16 {
        let lo = self.stack_pop8() as u16;
        let hi = self.stack_pop8() as u16;
        (hi << 8) | lo
    }

    fn update_sz(&mut self, val: u8) {
        self.flags.set_s(val & 0x80 != 0);
        self.flags.set_z(val == 0);
    }

    fn branch_if(&mut self, condition: bool, addr: u16) {
        if condition {
            // A taken branch costs a cycle, two if it crosses a page
            self.cycles += 1;
            if pages_differ(self.pc, addr) {
                self.cycles += 1;
            }
            self.pc = addr;
        }
    }

    //
    // Instructions
    //

    fn adc(&mut self, addr: u16) {
        let val = self.read(addr);

        if self.flags.d() {
            self.adc_bcd(val);
        } else {
            let n = (self.a as u16) + (val as u16) + (self.flags.c() as u16);
            let a = (n & 0x00ff) as u8;

            self.update_sz(a);
            self.flags.set_c(n > 0xff);

            // Overflow: both operands share a sign that the result lost
            self.flags
                .set_v((self.a ^ val) & 0x80 == 0 && (self.a ^ a) & 0x80 != 0);

            self.a = a;
        }
    }

    fn adc_bcd(&mut self, val: u8) {
        let carry_in = self.flags.c() as u16;
        let a = self.a as u16;
        let v = val as u16;

        // The NMOS part derives Z from the binary sum
        let binary = a + v + carry_in;
        self.flags.set_z(binary as u8 == 0);

        let mut lo = (a & 0x0f) + (v & 0x0f) + carry_in;
        let mut hi = (a & 0xf0) + (v & 0xf0);
        if lo > 0x09 {
            hi += 0x10;
            lo += 0x06;
        }

        self.flags.set_s(hi & 0x80 != 0);
        self.flags
            .set_v((a ^ v) & 0x80 == 0 && (a ^ hi) & 0x80 != 0);

        if hi > 0x90 {
            hi += 0x60;
        }
        self.flags.set_c(hi & 0xff00 != 0);

        self.a = ((lo & 0x0f) | (hi & 0xf0)) as u8;
    }

    fn and(&mut self, addr: u16) {
        let val = self.read(addr);
        self.a &= val;
        let a = self.a;
        self.update_sz(a);
    }

    fn asl(&mut self, addr: u16, addr_mode: AddressingMode) {
        let val = match addr_mode {
            AddressingMode::Accumulator => self.a,
            _ => self.read(addr),
        };

        self.flags.set_c(val & 0x80 != 0);
        let n = val << 1;

        match addr_mode {
            AddressingMode::Accumulator => self.a = n,
            _ => self.write(addr, n),
        };

        self.update_sz(n);
    }

    fn bcc(&mut self, addr: u16) {
        self.branch_if(!self.flags.c(), addr);
    }

    fn bcs(&mut self, addr: u16) {
        self.branch_if(self.flags.c(), addr);
    }

    fn beq(&mut self, addr: u16) {
        self.branch_if(self.flags.z(), addr);
    }

    fn bit(&mut self, addr: u16) {
        let val = self.read(addr);
        self.flags.set_s(val & 0x80 != 0);
        self.flags.set_v(val & 0x40 != 0);
        let f = self.a & val;
        self.flags.set_z(f == 0);
    }

    fn bmi(&mut self, addr: u16) {
        self.branch_if(self.flags.s(), addr);
    }

    fn bne(&mut self, addr: u16) {
        self.branch_if(!self.flags.z(), addr);
    }

    fn bpl(&mut self, addr: u16) {
        self.branch_if(!self.flags.s(), addr);
    }

    fn brk(&mut self) {
        let pc = self.pc + 1;
        self.stack_push16(pc);

        self.flags.set_b(true);
        let flags = self.flags() | 0x10;
        self.stack_push8(flags);

        self.flags.set_i(true);

        let lo = self.read(0xFFFE) as u16;
        let hi = self.read(0xFFFF) as u16;
        self.pc = (hi << 8) | lo;
    }

    fn bvc(&mut self, addr: u16) {
        self.branch_if(!self.flags.v(), addr);
    }

    fn bvs(&mut self, addr: u16) {
        self.branch_if(self.flags.v(), addr);
    }

    fn compare(&mut self, reg: u8, addr: u16) {
        let val = self.read(addr);
        let n = reg.wrapping_sub(val);
        self.flags.set_c(reg >= val);
        self.update_sz(n);
    }

    fn dec(&mut self, addr: u16) {
        let val = self.read(addr).wrapping_sub(1);
        self.write(addr, val);
        self.update_sz(val);
    }

    fn dex(&mut self) {
        self.x = self.x.wrapping_sub(1);
        let x = self.x;
        self.update_sz(x);
    }

    fn dey(&mut self) {
        self.y = self.y.wrapping_sub(1);
        let y = self.y;
        self.update_sz(y);
    }

    fn eor(&mut self, addr: u16) {
        let val = self.read(addr);
        self.a ^= val;
        let a = self.a;
        self.update_sz(a);
    }

    fn inc(&mut self, addr: u16) {
        let val = self.read(addr).wrapping_add(1);
        self.write(addr, val);
        self.update_sz(val);
    }

    fn inx(&mut self) {
        self.x = self.x.wrapping_add(1);
        let x = self.x;
        self.update_sz(x);
    }

    fn iny(&mut self) {
        self.y = self.y.wrapping_add(1);
        let y = self.y;
        self.update_sz(y);
    }

    fn jsr(&mut self, addr: u16) {
        // Return address is the last byte of this instruction
        let pc = self.pc.wrapping_sub(1);
        self.stack_push16(pc);
        self.pc = addr;
    }

    fn lda(&mut self, addr: u16) {
        self.a = self.read(addr);
        let a = self.a;
        self.update_sz(a);
    }

    fn ldx(&mut self, addr: u16) {
        self.x = self.read(addr);
        let x = self.x;
        self.update_sz(x);
    }

    fn ldy(&mut self, addr: u16) {
        self.y = self.read(addr);
        let y = self.y;
        self.update_sz(y);
    }

    fn lsr(&mut self, addr: u16, addr_mode: AddressingMode) {
        let val = match addr_mode {
            AddressingMode::Accumulator => self.a,
            _ => self.read(addr),
        };

        self.flags.set_c(val & 0x01 != 0);
        let n = val >> 1;

        match addr_mode {
            AddressingMode::Accumulator => self.a = n,
            _ => self.write(addr, n),
        };

        self.update_sz(n);
    }

    fn ora(&mut self, addr: u16) {
        let val = self.read(addr);
        self.a |= val;
        let a = self.a;
        self.update_sz(a);
    }

    fn php(&mut self) {
        // PHP pushes with B and the unused bit set
        let flags = self.flags() | 0x30;
        self.stack_push8(flags);
    }

    fn pla(&mut self) {
        self.a = self.stack_pop8();
        let a = self.a;
        self.update_sz(a);
    }

    fn plp(&mut self) {
        let val = self.stack_pop8();
        self.set_flags(val);
    }

    fn rol(&mut self, addr: u16, addr_mode: AddressingMode) {
        let val = match addr_mode {
            AddressingMode::Accumulator => self.a,
            _ => self.read(addr),
        };

        let carry_in = self.flags.c() as u8;
        self.flags.set_c(val & 0x80 != 0);
        let n = (val << 1) | carry_in;

        match addr_mode {
            AddressingMode::Accumulator => self.a = n,
            _ => self.write(addr, n),
        };

        self.update_sz(n);
    }

    fn ror(&mut self, addr: u16, addr_mode: AddressingMode) {
        let val = match addr_mode {
            AddressingMode::Accumulator => self.a,
            _ => self.read(addr),
        };

        let carry_in = (self.flags.c() as u8) << 7;
        self.flags.set_c(val & 0x01 != 0);
        let n = (val >> 1) | carry_in;

        match addr_mode {
            AddressingMode::Accumulator => self.a = n,
            _ => self.write(addr, n),
        };

        self.update_sz(n);
    }

    fn rti(&mut self) {
        let flags = self.stack_pop8();
        self.set_flags(flags);
        self.pc = self.stack_pop16();
    }

    fn rts(&mut self) {
        self.pc = self.stack_pop16().wrapping_add(1);
    }

    fn sbc(&mut self, addr: u16) {
        let val = self.read(addr);

        if self.flags.d() {
            self.sbc_bcd(val);
        } else {
            let n = (self.a as i16) - (val as i16) - (1 - self.flags.c() as i16);
            let a = n as u8;

            self.update_sz(a);
            self.flags.set_c(n >= 0);
            self.flags
                .set_v((self.a ^ val) & 0x80 != 0 && (self.a ^ a) & 0x80 != 0);

            self.a = a;
        }
    }

    fn sbc_bcd(&mut self, val: u8) {
        let borrow = 1 - self.flags.c() as i16;
        let a = self.a as i16;
        let v = val as i16;

        // Flags follow the binary difference
        let diff = a - v - borrow;
        self.update_sz(diff as u8);
        self.flags.set_c(diff >= 0);
        self.flags
            .set_v((self.a ^ val) & 0x80 != 0 && (self.a ^ diff as u8) & 0x80 != 0);

        let mut lo = (a & 0x0f) - (v & 0x0f) - borrow;
        let mut hi = (a >> 4) - (v >> 4);
        if lo < 0 {
            lo += 10;
            hi -= 1;
        }
        if hi < 0 {
            hi += 10;
        }

        self.a = (((hi << 4) | (lo & 0x0f)) & 0xff) as u8;
    }

    fn tax(&mut self) {
        self.x = self.a;
        let x = self.x;
        self.update_sz(x);
    }

    fn tay(&mut self) {
        self.y = self.a;
        let y = self.y;
        self.update_sz(y);
    }

    fn tsx(&mut self) {
        self.x = self.sp;
        let x = self.x;
        self.update_sz(x);
    }

    fn txa(&mut self) {
        self.a = self.x;
        let a = self.a;
        self.update_sz(a);
    }

    fn tya(&mut self) {
        self.a = self.y;
        let a = self.a;
        self.update_sz(a);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatBus {
        mem: Vec<u8>,
    }

    impl FlatBus {
        fn new() -> Self {
            Self {
                mem: vec![0; 0x2000],
            }
        }
    }

    impl Bus for FlatBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.mem[addr as usize & 0x1fff]
        }

        fn write(&mut self, addr: u16, val: u8) {
            self.mem[addr as usize & 0x1fff] = val;
        }
    }

    /// Build a CPU with `program` at the reset target 0xF000.
    fn cpu_with_program(program: &[u8]) -> CPU6507 {
        let mut bus = FlatBus::new();
        bus.mem[0x1000..0x1000 + program.len()].copy_from_slice(program);
        bus.mem[0x1ffc] = 0x00;
        bus.mem[0x1ffd] = 0xf0;

        let mut cpu = CPU6507::new(Box::new(bus));
        cpu.reset();
        cpu
    }

    #[test]
    fn lda_immediate_sets_flags() {
        let mut cpu = cpu_with_program(&[0xa9, 0x42, 0xa9, 0x00, 0xa9, 0x80]);

        assert_eq!(cpu.step(), 2);
        assert_eq!(cpu.a, 0x42);
        assert!(!cpu.flags.z());
        assert!(!cpu.flags.s());

        cpu.step();
        assert!(cpu.flags.z());

        cpu.step();
        assert!(cpu.flags.s());
    }

    #[test]
    fn sta_zero_page_writes_ram() {
        let mut cpu = cpu_with_program(&[0xa9, 0x55, 0x85, 0x80]);
        cpu.step();
        assert_eq!(cpu.step(), 3);
        assert_eq!(cpu.read(0x0080), 0x55);
    }

    #[test]
    fn taken_branches_cost_extra() {
        // LDA #0; BEQ +2 (taken); NOP; NOP
        let mut cpu = cpu_with_program(&[0xa9, 0x00, 0xf0, 0x02, 0xea, 0xea]);
        cpu.step();
        assert_eq!(cpu.step(), 3);
        assert_eq!(cpu.pc, 0xf006);

        // LDA #1; BEQ (not taken)
        let mut cpu = cpu_with_program(&[0xa9, 0x01, 0xf0, 0x02]);
        cpu.step();
        assert_eq!(cpu.step(), 2);
        assert_eq!(cpu.pc, 0xf004);
    }

    #[test]
    fn page_cross_costs_extra() {
        // LDX #1; LDA $10FF,X
        let mut cpu = cpu_with_program(&[0xa2, 0x01, 0xbd, 0xff, 0x10]);
        cpu.step();
        assert_eq!(cpu.step(), 5);

        // LDX #0; LDA $10F0,X stays in page
        let mut cpu = cpu_with_program(&[0xa2, 0x00, 0xbd, 0xf0, 0x10]);
        cpu.step();
        assert_eq!(cpu.step(), 4);
    }

    #[test]
    fn jsr_rts_round_trip() {
        // JSR $F005; NOP; NOP; (at F005) RTS
        let mut cpu = cpu_with_program(&[0x20, 0x05, 0xf0, 0xea, 0xea, 0x60]);

        assert_eq!(cpu.step(), 6);
        assert_eq!(cpu.pc, 0xf005);

        assert_eq!(cpu.step(), 6);
        assert_eq!(cpu.pc, 0xf003);
    }

    #[test]
    fn adc_sets_carry_and_overflow() {
        // LDA #$7F; ADC #$01
        let mut cpu = cpu_with_program(&[0xa9, 0x7f, 0x69, 0x01]);
        cpu.step();
        cpu.step();
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.flags.v());
        assert!(cpu.flags.s());
        assert!(!cpu.flags.c());

        // LDA #$FF; ADC #$01 carries
        let mut cpu = cpu_with_program(&[0xa9, 0xff, 0x69, 0x01]);
        cpu.step();
        cpu.step();
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.flags.c());
        assert!(cpu.flags.z());
    }

    #[test]
    fn sbc_borrows() {
        // SEC; LDA #$10; SBC #$01
        let mut cpu = cpu_with_program(&[0x38, 0xa9, 0x10, 0xe9, 0x01]);
        cpu.step();
        cpu.step();
        cpu.step();
        assert_eq!(cpu.a, 0x0f);
        assert!(cpu.flags.c());
    }

    #[test]
    fn decimal_mode_adc_and_sbc() {
        // SED; LDA #$15; ADC #$27 -> $42 in BCD
        let mut cpu = cpu_with_program(&[0xf8, 0xa9, 0x15, 0x69, 0x27]);
        cpu.step();
        cpu.step();
        cpu.step();
        assert_eq!(cpu.a, 0x42);
        assert!(!cpu.flags.c());

        // SED; SEC; LDA #$42; SBC #$27 -> $15 in BCD
        let mut cpu = cpu_with_program(&[0xf8, 0x38, 0xa9, 0x42, 0xe9, 0x27]);
        for _ in 0..4 {
            cpu.step();
        }
        assert_eq!(cpu.a, 0x15);
        assert!(cpu.flags.c());
    }

    #[test]
    fn indirect_jmp_wraps_within_the_page() {
        // JMP ($11FF): low byte from $11FF, high byte from $1100
        let mut cpu = cpu_with_program(&[0x6c, 0xff, 0x11]);
        {
            let bus = &mut cpu.bus;
            bus.write(0x11ff, 0x34);
            bus.write(0x1100, 0x12);
        }
        cpu.step();
        assert_eq!(cpu.pc, 0x1234);
    }

    #[test]
    fn undocumented_opcodes_are_inert() {
        // ILL $80 (zero page shape); LDA #$01
        let mut cpu = cpu_with_program(&[0x07, 0x80, 0xa9, 0x01]);
        assert_eq!(cpu.step(), 5);
        assert_eq!(cpu.pc, 0xf002);
        assert_eq!(cpu.read(0x0080), 0);

        cpu.step();
        assert_eq!(cpu.a, 0x01);
    }

    #[test]
    fn stack_push_pop() {
        // LDA #$AA; PHA; LDA #$00; PLA
        let mut cpu = cpu_with_program(&[0xa9, 0xaa, 0x48, 0xa9, 0x00, 0x68]);
        for _ in 0..4 {
            cpu.step();
        }
        assert_eq!(cpu.a, 0xaa);
        assert!(!cpu.flags.z());
    }
}

use crate::memory::{Operation, Region};
use crate::{SharedRIOT, SharedTIA};
use log::{debug, error};

/// What the CPU sees. The 6507 calls this for every memory access; the
/// implementation dispatches to ROM, RAM, TIA or RIOT. Accesses that
/// decode to nothing read 0 and drop writes.
pub trait Bus {
    fn read(&mut self, _address: u16) -> u8 {
        0
    }
    fn write(&mut self, _address: u16, _val: u8) {}
}

pub(crate) struct AtariBus {
    rom: Vec<u8>,
    rom_mask: usize,
    tia: SharedTIA,
    riot: SharedRIOT,
}

impl AtariBus {
    /// `rom` must already be validated to 2 KiB or 4 KiB; the mask makes
    /// the smaller image repeat through the 4 KiB cartridge window.
    pub fn new(tia: SharedTIA, riot: SharedRIOT, rom: Vec<u8>) -> Self {
        let rom_mask = rom.len() - 1;
        Self {
            rom,
            rom_mask,
            tia,
            riot,
        }
    }
}

impl Bus for AtariBus {
    fn read(&mut self, address: u16) -> u8 {
        match Region::decode(address, Operation::Read) {
            Ok(Region::Cartridge(offset)) => self.rom[offset & self.rom_mask],
            Ok(Region::Ram(index)) => self.riot.borrow().ram_read(index),
            Ok(Region::Riot(register)) => self.riot.borrow_mut().read(register),
            Ok(Region::TiaRead(register)) => self.tia.borrow().read(register),
            Ok(_) => unreachable!("write region from a read decode"),
            Err(e) => {
                error!("read: {}", e);
                0
            }
        }
    }

    fn write(&mut self, address: u16, val: u8) {
        match Region::decode(address, Operation::Write) {
            // The cartridge is not writable; stores there are dropped
            Ok(Region::Cartridge(_)) => debug!("ROM write {:02X} to {:04X} ignored", val, address),
            Ok(Region::Ram(index)) => self.riot.borrow_mut().ram_write(index, val),
            Ok(Region::Riot(register)) => self.riot.borrow_mut().write(register, val),
            Ok(Region::TiaWrite(register)) => self.tia.borrow_mut().write(register, val),
            Ok(_) => unreachable!("read region from a write decode"),
            // Covers the reserved TIA indices 0x2D-0x3F, which guests do
            // poke; dropping them is documented behavior, not a fault
            Err(e) => debug!("write: {}", e),
        }
    }
}

// Player graphic serializer. A player is an 8-bit graphic drawn wherever
// its position counter passes through a replica window. NUSIZ bits 0-2
// select one of eight replication patterns: up to three copies at fixed
// offsets, or a single copy stretched to double or quadruple width.

/// Replica start offsets for the NUSIZ copy patterns. Patterns 5 and 7 are
/// the stretched single-copy modes and are handled separately.
pub(crate) fn replica_offsets(pattern: u8) -> &'static [u8] {
    match pattern & 0x07 {
        0b001 => &[0, 16],
        0b010 => &[0, 32],
        0b011 => &[0, 16, 32],
        0b100 => &[0, 64],
        0b110 => &[0, 32, 64],
        _ => &[0],
    }
}

/// The bit index (0 = leftmost pixel) the counter position selects, if the
/// player is being scanned at all.
fn graphic_index(count: u8, nusiz: u8) -> Option<u8> {
    match nusiz & 0x07 {
        // Double-width: sixteen pixels, two per graphic bit
        0b101 => (count < 16).then(|| count >> 1),
        // Quad-width: thirty-two pixels, four per graphic bit
        0b111 => (count < 32).then(|| count >> 2),
        pattern => replica_offsets(pattern)
            .iter()
            .find(|&&offset| count >= offset && count < offset + 8)
            .map(|&offset| count - offset),
    }
}

/// Whether the player is emitting a lit pixel at the given counter
/// position. `reflect` is REFPx bit 3: normally the graphic's MSB is the
/// leftmost pixel, reflected it is the LSB.
pub(crate) fn pixel_on(count: u8, nusiz: u8, reflect: bool, graphic: u8) -> bool {
    match graphic_index(count, nusiz) {
        Some(i) => {
            let bit = if reflect {
                graphic >> i
            } else {
                graphic >> (7 - i)
            };
            bit & 1 != 0
        }
        None => false,
    }
}

use crate::tia::player::replica_offsets;

// Missile serializer. A missile is a 1/2/4/8 pixel wide bar that follows
// the same replication pattern as its player; NUSIZ bits 4-5 select the
// width, bits 0-2 the copies. While RESMPx bit 1 is set the missile is
// parked on its player and hidden.

/// Whether the missile is emitting a lit pixel at the given counter
/// position. `enabled` is ENAMx bit 1, `locked` is RESMPx bit 1.
pub(crate) fn pixel_on(count: u8, nusiz: u8, enabled: bool, locked: bool) -> bool {
    if !enabled || locked {
        return false;
    }

    let width = 1 << ((nusiz >> 4) & 0x03);

    replica_offsets(nusiz)
        .iter()
        .any(|&offset| count >= offset && count < offset + width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_or_locked_draws_nothing() {
        assert!(!pixel_on(0, 0x00, false, false));
        assert!(!pixel_on(0, 0x00, true, true));
        assert!(pixel_on(0, 0x00, true, false));
    }

    #[test]
    fn widths_from_nusiz_bits_4_and_5() {
        // 1 pixel
        assert!(pixel_on(0, 0x00, true, false));
        assert!(!pixel_on(1, 0x00, true, false));

        // 2 pixels
        assert!(pixel_on(1, 0x10, true, false));
        assert!(!pixel_on(2, 0x10, true, false));

        // 4 pixels
        assert!(pixel_on(3, 0x20, true, false));
        assert!(!pixel_on(4, 0x20, true, false));

        // 8 pixels
        assert!(pixel_on(7, 0x30, true, false));
        assert!(!pixel_on(8, 0x30, true, false));
    }

    #[test]
    fn copies_follow_the_player_pattern() {
        // Two copies close, 2 pixels wide
        assert!(pixel_on(16, 0x11, true, false));
        assert!(pixel_on(17, 0x11, true, false));
        assert!(!pixel_on(18, 0x11, true, false));

        // Three copies medium
        assert!(pixel_on(64, 0x06, true, false));
        assert!(!pixel_on(16, 0x06, true, false));
    }
}

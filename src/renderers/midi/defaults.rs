//! Default values for MIDI export

/// Default tempo in beats per minute
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Default MIDI velocity (1-127, where 64 is "normal")
pub const DEFAULT_VELOCITY: u8 = 64;

/// Violin in General MIDI (0-based program number)
pub const DEFAULT_PROGRAM: u8 = 40;

/// Melody channel (0-based)
pub const DEFAULT_CHANNEL: u8 = 0;

/// Default ticks per quarter note. 480 holds every grid the pipeline
/// accepts (sixteenths, triplets, down to 64ths) as whole ticks.
pub const DEFAULT_TPQ: u16 = 480;

/// Microseconds per quarter note for a tempo
pub fn tempo_microseconds(bpm: f64) -> u32 {
    (60_000_000.0 / bpm) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(DEFAULT_TEMPO_BPM, 120.0);
        assert_eq!(DEFAULT_VELOCITY, 64);
        assert_eq!(DEFAULT_PROGRAM, 40);
        assert_eq!(DEFAULT_TPQ % 48, 0);
    }

    #[test]
    fn test_tempo_microseconds() {
        assert_eq!(tempo_microseconds(120.0), 500_000);
        assert_eq!(tempo_microseconds(60.0), 1_000_000);
    }
}

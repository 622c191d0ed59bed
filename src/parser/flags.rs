//! The optional-field bitmap of PAMGuard data records
use bitflags::bitflags;

bitflags! {
    /// Flags describing which optional fields follow the fixed part of a
    /// data record
    ///
    /// The bitmap was introduced with file format version 3. Version 2
    /// files always carry the nanosecond time and channel map and nothing
    /// else, earlier versions only the fixed fields, see
    /// [`Flags::for_version`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u16 {
        /// Millisecond time (always present, kept for completeness)
        const TIME_MILLIS = 0x0001;
        /// Nanosecond time
        const TIME_NANOS = 0x0002;
        /// Channel bitmap
        const CHANNEL_MAP = 0x0004;
        /// Unique identifier
        const UID = 0x0008;
        /// Start sample
        const START_SAMPLE = 0x0010;
        /// Duration in samples
        const SAMPLE_DURATION = 0x0020;
        /// Low and high frequency limits
        const FREQUENCY_LIMITS = 0x0040;
        /// Duration in milliseconds
        const MILLIS_DURATION = 0x0080;
        /// Array of time delays in seconds
        const TIME_DELAY_SECS = 0x0100;
        /// An annotation block follows the module payload
        const HAS_BINARY_ANNOTATIONS = 0x0200;
        /// Sequence map
        const HAS_SEQUENCE_MAP = 0x0400;
        /// Noise level
        const HAS_NOISE = 0x0800;
        /// Signal level
        const HAS_SIGNAL = 0x1000;
        /// Signal excess
        const HAS_SIGNAL_EXCESS = 0x2000;

        // Bits written by newer versions must survive decoding.
        const _ = !0;
    }
}

impl Flags {
    /// The bitmap in effect for a record of the given file version
    ///
    /// `raw` is the bitmap read from the record, which only exists from
    /// version 3 on.
    pub fn for_version(file_version: i32, raw: Option<u16>) -> Flags {
        match raw {
            Some(bits) if file_version >= 3 => Flags::from_bits_retain(bits),
            _ if file_version == 2 => Flags::TIME_NANOS | Flags::CHANNEL_MAP,
            _ => Flags::empty(),
        }
    }

    /// Whether any of the bits in `bit` are set
    pub fn test(self, bit: Flags) -> bool {
        self.bits() & bit.bits() != 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tests_named_bits() {
        let flags = Flags::from_bits_retain(0x008d);
        assert!(flags.test(Flags::TIME_MILLIS));
        assert!(!flags.test(Flags::TIME_NANOS));
        assert!(flags.test(Flags::CHANNEL_MAP));
        assert!(flags.test(Flags::UID));
        assert!(flags.test(Flags::MILLIS_DURATION));
        assert!(!flags.test(Flags::HAS_BINARY_ANNOTATIONS));
    }

    #[test]
    fn test_is_pure() {
        for bits in [0u16, 0x0200, 0x3fff, 0xffff] {
            let flags = Flags::from_bits_retain(bits);
            for bit in Flags::all().iter() {
                assert_eq!(flags.test(bit), flags.test(bit));
            }
            assert_eq!(flags.bits(), bits);
        }
    }

    #[test]
    fn version_two_implies_nanos_and_channel_map() {
        let flags = Flags::for_version(2, None);
        assert!(flags.test(Flags::TIME_NANOS));
        assert!(flags.test(Flags::CHANNEL_MAP));
        assert!(!flags.test(Flags::UID));

        let flags = Flags::for_version(3, Some(Flags::UID.bits()));
        assert_eq!(flags, Flags::UID);
    }

    #[test]
    fn versions_before_two_have_no_optional_fields() {
        assert_eq!(Flags::for_version(1, None), Flags::empty());
        assert_eq!(Flags::for_version(0, None), Flags::empty());
    }
}

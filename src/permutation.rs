use zeroize::{Zeroize, ZeroizeOnDrop};

/// The number of words in our permutation state.
pub const STATE_SIZE_U64: usize = 5;
/// The number of bytes in our permutation state.
pub const STATE_SIZE_U8: usize = STATE_SIZE_U64 * 8;
/// The number of rounds in a full application of the permutation.
pub const MAX_ROUNDS: usize = 12;

/// The round constant for a given round index.
///
/// Indices count from the start of a full 12 round permutation, so a
/// shortened call shares its constants with the tail of a full one.
#[inline(always)]
pub(crate) fn round_constant(round: usize) -> u64 {
    let round = round as u64;
    ((0x0F - round) << 4) | round
}

/// The linear diffusion layer: each word is mixed with two rotations of itself.
#[inline(always)]
pub(crate) fn diffuse(x: &mut [u64; STATE_SIZE_U64]) {
    x[0] ^= x[0].rotate_right(19) ^ x[0].rotate_right(28);
    x[1] ^= x[1].rotate_right(61) ^ x[1].rotate_right(39);
    x[2] ^= x[2].rotate_right(1) ^ x[2].rotate_right(6);
    x[3] ^= x[3].rotate_right(10) ^ x[3].rotate_right(17);
    x[4] ^= x[4].rotate_right(7) ^ x[4].rotate_right(41);
}

/// One round of the ASCON permutation.
#[inline(always)]
fn round(x: &mut [u64; STATE_SIZE_U64], round: usize) {
    x[2] ^= round_constant(round);

    // Bit-sliced S-box, evaluated over all 64 lanes at once.
    x[0] ^= x[4];
    x[4] ^= x[3];
    x[2] ^= x[1];
    let t0 = !x[0] & x[1];
    let t1 = !x[1] & x[2];
    let t2 = !x[2] & x[3];
    let t3 = !x[3] & x[4];
    let t4 = !x[4] & x[0];
    x[0] ^= t1;
    x[1] ^= t2;
    x[2] ^= t3;
    x[3] ^= t4;
    x[4] ^= t0;
    x[1] ^= x[0];
    x[0] ^= x[4];
    x[3] ^= x[2];
    x[2] = !x[2];

    diffuse(x);
}

/// Check that a round count is one we can apply, returning the first round index.
#[inline]
pub(crate) fn first_round(rounds: usize) -> usize {
    assert!(
        (1..=MAX_ROUNDS).contains(&rounds),
        "Cannot apply {} rounds of the permutation.",
        rounds
    );
    MAX_ROUNDS - rounds
}

/// The ASCON permutation state.
///
/// This holds five 64 bit words. Byte `i` of the state, as seen through the
/// access methods, is byte `i % 8` of word `i / 8` in big endian order, no
/// matter what the native word layout is.
///
/// The state is erased when dropped, since it holds key material for its
/// whole lifetime.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct State {
    pub(crate) words: [u64; STATE_SIZE_U64],
}

impl State {
    /// Create a new state, with every word set to zero.
    pub fn new() -> Self {
        Self {
            words: [0u64; STATE_SIZE_U64],
        }
    }

    /// Apply the last `rounds` rounds of the permutation.
    ///
    /// Panics unless `1 <= rounds <= 12`.
    pub fn permute(&mut self, rounds: usize) {
        let first = first_round(rounds);
        for r in first..MAX_ROUNDS {
            round(&mut self.words, r);
        }
    }

    /// The full 12 round permutation, used for initialization and finalization.
    pub fn permute12(&mut self) {
        self.permute(12);
    }

    /// The 8 round permutation, used by ASCON-128a and the "A" hash variants.
    pub fn permute8(&mut self) {
        self.permute(8);
    }

    /// The 6 round permutation, used by ASCON-128 and ASCON-80pq.
    pub fn permute6(&mut self) {
        self.permute(6);
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    const INPUT: [u8; STATE_SIZE_U8] = hex!(
        "0001020304050607 08090a0b0c0d0e0f 1011121314151617 18191a1b1c1d1e1f 2021222324252627"
    );
    const OUTPUT_12: [u8; STATE_SIZE_U8] = hex!(
        "060587e2d489dd43 1cc2b17b0e3c1764 957342531844a674 96b17175b4cb6863 29b512d627d906e5"
    );
    const OUTPUT_8: [u8; STATE_SIZE_U8] = hex!(
        "830d260d335f3bed da0bba917bcfcad7 dd0d88e7dcb5ecd0 892a02151f95946e 3a69cb3cf982f6f7"
    );

    #[test]
    fn test_new_is_zero() {
        assert_eq!(State::new().words, [0u64; STATE_SIZE_U64]);
    }

    #[test]
    fn test_permute_changes_state() {
        let data0 = State::new();
        let mut data1 = data0.clone();
        data1.permute12();
        assert_ne!(data0, data1);
    }

    #[test]
    fn test_permute_12_vector() {
        let mut state = State::from_bytes(&INPUT);
        state.permute12();
        assert_eq!(state.to_bytes(), OUTPUT_12);
    }

    #[test]
    fn test_permute_8_vector() {
        let mut state = State::from_bytes(&INPUT);
        state.permute8();
        assert_eq!(state.to_bytes(), OUTPUT_8);
    }

    #[test]
    fn test_round_counts_compose() {
        // 12 rounds are the first 4 rounds followed by the standard 8.
        let mut full = State::from_bytes(&INPUT);
        full.permute12();

        let mut split = State::from_bytes(&INPUT);
        for r in 0..4 {
            round(&mut split.words, r);
        }
        split.permute8();
        assert_eq!(full, split);
    }

    #[test]
    fn test_round_constants() {
        assert_eq!(round_constant(0), 0xf0);
        assert_eq!(round_constant(4), 0xb4);
        assert_eq!(round_constant(6), 0x96);
        assert_eq!(round_constant(11), 0x4b);
    }

    #[test]
    fn test_zeroize_clears_words() {
        let mut state = State::from_bytes(&INPUT);
        state.zeroize();
        assert_eq!(state.words, [0u64; STATE_SIZE_U64]);
    }

    #[test]
    #[should_panic]
    fn test_zero_rounds_rejected() {
        State::new().permute(0);
    }

    #[test]
    #[should_panic]
    fn test_too_many_rounds_rejected() {
        State::new().permute(13);
    }
}

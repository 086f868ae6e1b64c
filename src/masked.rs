//! A masked version of the permutation state.
//!
//! Every word is split into `SHARES` random shares whose XOR is the real value
//! of the word. Linear operations act on each share separately. The AND gates
//! of the S-box are evaluated with the Ishai-Sahai-Wagner multiplication,
//! which mixes shares only through fresh random words, so no intermediate
//! value ever holds an unmasked bit of the state.
//!
//! Randomness comes from a caller supplied cryptographic RNG on every call
//! that needs it.
use core::ops::Range;

use rand_core::{CryptoRng, RngCore};
use tracing::trace;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::access::{check_bounds, lane_shift};
use crate::permutation::{
    diffuse, first_round, round_constant, State, MAX_ROUNDS, STATE_SIZE_U64,
};

/// The smallest number of shares a masked state can use.
pub const MIN_SHARES: usize = 2;
/// The largest number of shares a masked state can use.
pub const MAX_SHARES: usize = 4;

/// Split `value` into shares, with fresh randomness in the bits selected by `lanes`.
///
/// Bits outside of `lanes` are zero in every share, so the result can be
/// XORed into a word without disturbing its other bytes.
fn split<R: RngCore + CryptoRng, const N: usize>(value: u64, lanes: u64, rng: &mut R) -> [u64; N] {
    let mut out = [0u64; N];
    for i in 1..N {
        let r = rng.next_u64() & lanes;
        out[0] ^= r;
        out[i] = r;
    }
    out[0] ^= value & lanes;
    out
}

/// Re-randomize the shares of a word, without changing its value.
fn refresh<R: RngCore + CryptoRng, const N: usize>(shares: &mut [u64; N], rng: &mut R) {
    for i in 1..N {
        let r = rng.next_u64();
        shares[0] ^= r;
        shares[i] ^= r;
    }
}

/// Recombine the shares of a word.
fn combine<const N: usize>(shares: &[u64; N]) -> u64 {
    shares.iter().fold(0, |acc, &s| acc ^ s)
}

/// Compute the shares of `!a & b`.
///
/// Each pair of shares gets its own random word, and the cross terms are
/// folded in after that word, never directly against one another.
fn and_not<R: RngCore + CryptoRng, const N: usize>(
    a: &[u64; N],
    b: &[u64; N],
    rng: &mut R,
) -> [u64; N] {
    let mut na = *a;
    na[0] = !na[0];
    let mut c = [0u64; N];
    for i in 0..N {
        c[i] = na[i] & b[i];
    }
    for i in 0..N {
        for j in (i + 1)..N {
            let r = rng.next_u64();
            c[i] ^= r;
            c[j] ^= (r ^ (na[i] & b[j])) ^ (na[j] & b[i]);
        }
    }
    na.zeroize();
    c
}

/// The indices of the words touched by `len` bytes at `offset`.
fn touched_words(offset: usize, len: usize) -> Range<usize> {
    if len == 0 {
        return 0..0;
    }
    offset / 8..(offset + len - 1) / 8 + 1
}

/// The bits of word `word` covered by `len` bytes at `offset`.
fn lanes(offset: usize, len: usize, word: usize) -> u64 {
    (offset..offset + len)
        .filter(|pos| pos / 8 == word)
        .fold(0, |acc, pos| acc | (0xFFu64 << lane_shift(pos)))
}

/// Place the bytes of `data` that fall in word `word` at their position in that word.
fn pack(data: &[u8], offset: usize, word: usize) -> u64 {
    data.iter()
        .enumerate()
        .map(|(i, &b)| (offset + i, b))
        .filter(|(pos, _)| pos / 8 == word)
        .fold(0, |acc, (pos, b)| acc | (u64::from(b) << lane_shift(pos)))
}

/// An ASCON state split into `SHARES` shares per word.
///
/// `SHARES` must be between [`MIN_SHARES`] and [`MAX_SHARES`]. The number of
/// shares is fixed for the lifetime of the state.
///
/// Byte offsets have the same meaning as for [`State`]. Data passed in
/// through the byte methods is masked with fresh randomness before it
/// touches the state, and data passed out is recombined from the shares.
#[derive(Clone)]
pub struct MaskedState<const SHARES: usize> {
    words: [[u64; SHARES]; STATE_SIZE_U64],
}

impl<const SHARES: usize> MaskedState<SHARES> {
    fn empty() -> Self {
        assert!(
            (MIN_SHARES..=MAX_SHARES).contains(&SHARES),
            "A masked state needs between {} and {} shares, not {}.",
            MIN_SHARES,
            MAX_SHARES,
            SHARES
        );
        trace!(shares = SHARES, "masked state created");
        Self {
            words: [[0u64; SHARES]; STATE_SIZE_U64],
        }
    }

    /// Create a masked state holding all zeroes, with random shares.
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut out = Self::empty();
        out.randomize(rng);
        out
    }

    /// Mask an unmasked state.
    pub fn mask<R: RngCore + CryptoRng>(state: &State, rng: &mut R) -> Self {
        let mut out = Self::empty();
        for (shares, &word) in out.words.iter_mut().zip(state.words.iter()) {
            *shares = split(word, !0, rng);
        }
        out
    }

    /// Recombine the shares into an unmasked state.
    pub fn unmask(&self) -> State {
        let mut out = State::new();
        for (word, shares) in out.words.iter_mut().zip(self.words.iter()) {
            *word = combine(shares);
        }
        out
    }

    /// The number of shares each word is split into.
    pub fn shares(&self) -> usize {
        SHARES
    }

    /// Refresh every share with new randomness, leaving the value unchanged.
    pub fn randomize<R: RngCore + CryptoRng>(&mut self, rng: &mut R) {
        for shares in self.words.iter_mut() {
            refresh(shares, rng);
        }
    }

    /// Apply the last `rounds` rounds of the permutation, in masked form.
    ///
    /// Panics unless `1 <= rounds <= 12`.
    pub fn permute<R: RngCore + CryptoRng>(&mut self, rounds: usize, rng: &mut R) {
        let first = first_round(rounds);
        self.randomize(rng);
        for r in first..MAX_ROUNDS {
            self.round(r, rng);
        }
    }

    fn round<R: RngCore + CryptoRng>(&mut self, round: usize, rng: &mut R) {
        let x = &mut self.words;
        x[2][0] ^= round_constant(round);

        for s in 0..SHARES {
            x[0][s] ^= x[4][s];
            x[4][s] ^= x[3][s];
            x[2][s] ^= x[1][s];
        }
        let mut t = [[0u64; SHARES]; STATE_SIZE_U64];
        for i in 0..STATE_SIZE_U64 {
            t[i] = and_not(&x[i], &x[(i + 1) % STATE_SIZE_U64], rng);
        }
        for i in 0..STATE_SIZE_U64 {
            for s in 0..SHARES {
                x[i][s] ^= t[(i + 1) % STATE_SIZE_U64][s];
            }
        }
        t.zeroize();
        for s in 0..SHARES {
            x[1][s] ^= x[0][s];
            x[0][s] ^= x[4][s];
            x[3][s] ^= x[2][s];
        }
        x[2][0] = !x[2][0];

        for s in 0..SHARES {
            let mut share = [x[0][s], x[1][s], x[2][s], x[3][s], x[4][s]];
            diffuse(&mut share);
            for (word, &value) in x.iter_mut().zip(share.iter()) {
                word[s] = value;
            }
            share.zeroize();
        }
    }

    /// Mask `data` and XOR it into the bytes at `offset`.
    pub fn add_bytes<R: RngCore + CryptoRng>(&mut self, data: &[u8], offset: usize, rng: &mut R) {
        check_bounds(offset, data.len());
        for w in touched_words(offset, data.len()) {
            let mut masked: [u64; SHARES] =
                split(pack(data, offset, w), lanes(offset, data.len(), w), rng);
            for (share, m) in self.words[w].iter_mut().zip(masked.iter()) {
                *share ^= m;
            }
            masked.zeroize();
        }
    }

    /// Mask `data` and use it to replace the bytes at `offset`.
    pub fn overwrite_bytes<R: RngCore + CryptoRng>(
        &mut self,
        data: &[u8],
        offset: usize,
        rng: &mut R,
    ) {
        self.overwrite_with_zeroes(offset, data.len());
        self.add_bytes(data, offset, rng);
    }

    /// Set `len` bytes at `offset` to zero, in every share.
    pub fn overwrite_with_zeroes(&mut self, offset: usize, len: usize) {
        check_bounds(offset, len);
        for w in touched_words(offset, len) {
            let keep = !lanes(offset, len, w);
            for share in self.words[w].iter_mut() {
                *share &= keep;
            }
        }
    }

    /// XOR bytes that are already split into shares into the bytes at `offset`.
    ///
    /// Share `s` of the data goes into share `s` of the state, so the data is
    /// never recombined.
    pub fn add_shares(&mut self, shares: [&[u8]; SHARES], offset: usize) {
        let len = shares[0].len();
        for share in shares.iter() {
            assert_eq!(share.len(), len, "Shares differ in length.");
        }
        check_bounds(offset, len);
        for (s, share) in shares.iter().enumerate() {
            for (i, &b) in share.iter().enumerate() {
                let pos = offset + i;
                self.words[pos / 8][s] ^= u64::from(b) << lane_shift(pos);
            }
        }
    }

    /// Replace the bytes at `offset` with bytes that are already split into shares.
    pub fn overwrite_shares(&mut self, shares: [&[u8]; SHARES], offset: usize) {
        self.overwrite_with_zeroes(offset, shares[0].len());
        self.add_shares(shares, offset);
    }

    #[inline(always)]
    fn byte(&self, pos: usize) -> u8 {
        let shift = lane_shift(pos);
        self.words[pos / 8]
            .iter()
            .fold(0u8, |acc, &s| acc ^ (s >> shift) as u8)
    }

    /// Recombine the bytes at `offset` into `out`.
    pub fn extract_bytes(&self, out: &mut [u8], offset: usize) {
        check_bounds(offset, out.len());
        for (i, b) in out.iter_mut().enumerate() {
            *b = self.byte(offset + i);
        }
    }

    /// Recombine the bytes at `offset`, XOR them with `input`, and write the result into `output`.
    pub fn extract_and_add_bytes(&self, input: &[u8], output: &mut [u8], offset: usize) {
        assert_eq!(
            input.len(),
            output.len(),
            "Input and output buffers differ in length."
        );
        check_bounds(offset, input.len());
        for (i, (o, &x)) in output.iter_mut().zip(input).enumerate() {
            *o = self.byte(offset + i) ^ x;
        }
    }
}

impl<const SHARES: usize> Zeroize for MaskedState<SHARES> {
    fn zeroize(&mut self) {
        self.words.zeroize();
    }
}

impl<const SHARES: usize> Drop for MaskedState<SHARES> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl<const SHARES: usize> ZeroizeOnDrop for MaskedState<SHARES> {}

//! Byte level access to the permutation state.
//!
//! The constructions never touch the words of the state directly. Instead,
//! they read and write bytes at some offset in the 40 byte big endian view
//! of the state, and then decide for themselves when to permute.
use crate::permutation::{State, STATE_SIZE_U64, STATE_SIZE_U8};

/// Panic unless `len` bytes starting at `offset` fit inside the state.
#[inline]
pub(crate) fn check_bounds(offset: usize, len: usize) {
    let fits = offset
        .checked_add(len)
        .map_or(false, |end| end <= STATE_SIZE_U8);
    assert!(
        fits,
        "Cannot access {} bytes at offset {} of a {} byte state.",
        len, offset, STATE_SIZE_U8
    );
}

/// The shift placing a byte at `offset` in its word.
#[inline(always)]
pub(crate) fn lane_shift(offset: usize) -> u32 {
    (56 - 8 * (offset % 8)) as u32
}

#[inline(always)]
pub(crate) fn get_byte(words: &[u64; STATE_SIZE_U64], offset: usize) -> u8 {
    (words[offset / 8] >> lane_shift(offset)) as u8
}

#[inline(always)]
pub(crate) fn xor_byte(words: &mut [u64; STATE_SIZE_U64], offset: usize, b: u8) {
    words[offset / 8] ^= u64::from(b) << lane_shift(offset);
}

#[inline(always)]
pub(crate) fn set_byte(words: &mut [u64; STATE_SIZE_U64], offset: usize, b: u8) {
    let shift = lane_shift(offset);
    let word = &mut words[offset / 8];
    *word = (*word & !(0xFFu64 << shift)) | (u64::from(b) << shift);
}

impl State {
    /// Create a state from its 40 byte big endian representation.
    pub fn from_bytes(bytes: &[u8; STATE_SIZE_U8]) -> Self {
        let mut out = Self::new();
        out.overwrite_bytes(bytes, 0);
        out
    }

    /// The 40 byte big endian representation of this state.
    ///
    /// The caller is responsible for erasing the returned copy.
    pub fn to_bytes(&self) -> [u8; STATE_SIZE_U8] {
        let mut out = [0u8; STATE_SIZE_U8];
        self.extract_bytes(&mut out, 0);
        out
    }

    /// Replace the bytes at `offset` with `data`.
    pub fn overwrite_bytes(&mut self, data: &[u8], offset: usize) {
        check_bounds(offset, data.len());
        for (i, &b) in data.iter().enumerate() {
            set_byte(&mut self.words, offset + i, b);
        }
    }

    /// XOR `data` into the bytes at `offset`.
    pub fn add_bytes(&mut self, data: &[u8], offset: usize) {
        check_bounds(offset, data.len());
        for (i, &b) in data.iter().enumerate() {
            xor_byte(&mut self.words, offset + i, b);
        }
    }

    /// Copy the bytes at `offset` into `out`.
    pub fn extract_bytes(&self, out: &mut [u8], offset: usize) {
        check_bounds(offset, out.len());
        for (i, b) in out.iter_mut().enumerate() {
            *b = get_byte(&self.words, offset + i);
        }
    }

    /// Write the bytes at `offset`, XORed with `input`, into `output`.
    ///
    /// The state itself is left untouched.
    pub fn extract_and_add_bytes(&self, input: &[u8], output: &mut [u8], offset: usize) {
        assert_eq!(
            input.len(),
            output.len(),
            "Input and output buffers differ in length."
        );
        check_bounds(offset, input.len());
        for (i, (o, &x)) in output.iter_mut().zip(input).enumerate() {
            *o = get_byte(&self.words, offset + i) ^ x;
        }
    }

    /// Write the bytes at `offset`, XORed with `input`, into `output`, and
    /// then replace those bytes of the state with `input`.
    ///
    /// This is one step of duplex decryption: `input` is ciphertext, `output`
    /// receives the plaintext, and the state ends up holding the ciphertext
    /// just as it did on the encrypting side.
    pub fn extract_and_overwrite_bytes(&mut self, input: &[u8], output: &mut [u8], offset: usize) {
        assert_eq!(
            input.len(),
            output.len(),
            "Input and output buffers differ in length."
        );
        check_bounds(offset, input.len());
        for (i, (o, &x)) in output.iter_mut().zip(input).enumerate() {
            let pos = offset + i;
            *o = get_byte(&self.words, pos) ^ x;
            set_byte(&mut self.words, pos, x);
        }
    }

    /// Same as [`State::extract_and_overwrite_bytes`], with a single buffer
    /// holding the input on entry and the output on return.
    pub fn extract_and_overwrite_in_place(&mut self, data: &mut [u8], offset: usize) {
        check_bounds(offset, data.len());
        for (i, b) in data.iter_mut().enumerate() {
            let pos = offset + i;
            let x = *b;
            *b = get_byte(&self.words, pos) ^ x;
            set_byte(&mut self.words, pos, x);
        }
    }

    /// XOR `data` into the bytes at `offset`, and then copy the result back out.
    ///
    /// This is one step of duplex encryption, done in place.
    pub fn add_and_extract_in_place(&mut self, data: &mut [u8], offset: usize) {
        check_bounds(offset, data.len());
        for (i, b) in data.iter_mut().enumerate() {
            let pos = offset + i;
            xor_byte(&mut self.words, pos, *b);
            *b = get_byte(&self.words, pos);
        }
    }

    /// Set `len` bytes at `offset` to zero.
    pub fn overwrite_with_zeroes(&mut self, offset: usize, len: usize) {
        check_bounds(offset, len);
        for pos in offset..offset + len {
            set_byte(&mut self.words, pos, 0);
        }
    }
}

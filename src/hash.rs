//! ASCON-HASH, ASCON-HASHA, ASCON-XOF and ASCON-XOFA.
//!
//! All four are the same sponge, with an 8 byte rate, differing only in the
//! IV absorbed at initialization and in the number of rounds used between
//! blocks.
use core::marker::PhantomData;

use tracing::trace;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::permutation::State;

/// The number of bytes absorbed or squeezed per permutation call.
pub const XOF_RATE: usize = 8;
/// The size of a digest produced by [`Hash`].
pub const HASH_SIZE: usize = 32;
/// The padding byte placed right after the last absorbed byte.
const PAD: u8 = 0x80;
/// Requested output lengths at or above this many bytes can't be encoded in the IV.
pub(crate) const MAX_FIXED_OUTPUT: usize = 1 << 29;

/// The parameters distinguishing one hash variant from another.
pub trait HashVariant {
    /// The IV, without the output length in its low 32 bits.
    const IV: u64;
    /// The number of rounds applied between blocks.
    const ROUNDS: usize;
}

/// The standard variant, with 12 rounds everywhere.
#[derive(Clone, Copy, Debug)]
pub struct Ascon;

impl HashVariant for Ascon {
    const IV: u64 = 0x00400c0000000000;
    const ROUNDS: usize = 12;
}

/// The "A" variant, with 8 rounds between blocks.
#[derive(Clone, Copy, Debug)]
pub struct AsconA;

impl HashVariant for AsconA {
    const IV: u64 = 0x00400c0400000000;
    const ROUNDS: usize = 8;
}

/// An extendable output function over the ASCON sponge.
///
/// Input can be absorbed in pieces of any size, and output squeezed in pieces
/// of any size. Absorbing again after squeezing starts a new absorb phase.
pub struct Xof<V: HashVariant> {
    state: State,
    iv: u64,
    /// The number of bytes already used in the current block.
    count: usize,
    squeezing: bool,
    _variant: PhantomData<V>,
}

impl<V: HashVariant> Xof<V> {
    fn with_iv(iv: u64) -> Self {
        let mut state = State::new();
        state.overwrite_bytes(&iv.to_be_bytes(), 0);
        state.permute12();
        Self {
            state,
            iv,
            count: 0,
            squeezing: false,
            _variant: PhantomData,
        }
    }

    /// Create an XOF producing output of arbitrary length.
    pub fn new() -> Self {
        Self::with_iv(V::IV)
    }

    /// Create an XOF committed to producing `len` bytes of output.
    ///
    /// The length is bound into the IV, so different lengths give unrelated
    /// outputs. A length of 32 gives the matching 32 byte hash. Lengths too
    /// large for the IV fall back to arbitrary length output.
    pub fn with_output_len(len: usize) -> Self {
        let bits = if len >= MAX_FIXED_OUTPUT {
            0
        } else {
            (len * 8) as u64
        };
        Self::with_iv(V::IV | bits)
    }

    /// Absorb some data into the sponge.
    pub fn absorb(&mut self, mut data: &[u8]) {
        if self.squeezing {
            trace!("xof: squeezing to absorbing");
            self.squeezing = false;
            self.count = 0;
            self.state.permute12();
        }
        while !data.is_empty() {
            let take = (XOF_RATE - self.count).min(data.len());
            self.state.add_bytes(&data[..take], self.count);
            self.count += take;
            data = &data[take..];
            if self.count == XOF_RATE {
                self.state.permute(V::ROUNDS);
                self.count = 0;
            }
        }
    }

    /// Squeeze output out of the sponge, filling `out`.
    ///
    /// Successive calls continue the same output stream.
    pub fn squeeze(&mut self, mut out: &mut [u8]) {
        if !self.squeezing {
            self.state.add_bytes(&[PAD], self.count);
            self.state.permute12();
            self.squeezing = true;
            self.count = 0;
        }
        while !out.is_empty() {
            let take = (XOF_RATE - self.count).min(out.len());
            let (head, tail) = core::mem::take(&mut out).split_at_mut(take);
            self.state.extract_bytes(head, self.count);
            self.count += take;
            out = tail;
            // A used up block is permuted right away, not on the next call.
            if self.count == XOF_RATE {
                self.state.permute(V::ROUNDS);
                self.count = 0;
            }
        }
    }

    /// Advance to the start of a fresh block.
    ///
    /// While absorbing, this permutes away a partial block without padding it.
    /// While squeezing, this goes back to absorbing.
    pub fn pad(&mut self) {
        if self.squeezing {
            self.absorb(&[]);
        } else if self.count != 0 {
            self.state.permute(V::ROUNDS);
            self.count = 0;
        }
    }

    /// Erase everything absorbed so far, going back to the initial state.
    pub fn reinit(&mut self) {
        self.state.zeroize();
        *self = Self::with_iv(self.iv);
    }
}

impl<V: HashVariant> Default for Xof<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: HashVariant> Clone for Xof<V> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            iv: self.iv,
            count: self.count,
            squeezing: self.squeezing,
            _variant: PhantomData,
        }
    }
}

impl<V: HashVariant> Zeroize for Xof<V> {
    fn zeroize(&mut self) {
        self.state.zeroize();
        self.count = 0;
        self.squeezing = false;
    }
}

// The state erases itself when dropped.
impl<V: HashVariant> ZeroizeOnDrop for Xof<V> {}

/// A hash function with a 32 byte digest.
pub struct Hash<V: HashVariant> {
    xof: Xof<V>,
    finalized: bool,
}

impl<V: HashVariant> Hash<V> {
    /// Create a hash with nothing absorbed yet.
    pub fn new() -> Self {
        Self {
            xof: Xof::with_output_len(HASH_SIZE),
            finalized: false,
        }
    }

    /// Hash `data` in one go.
    pub fn digest(data: &[u8]) -> [u8; HASH_SIZE] {
        let mut hash = Self::new();
        hash.update(data);
        hash.finalize()
    }

    /// Absorb more data.
    ///
    /// Panics if the hash has already been finalized.
    pub fn update(&mut self, data: &[u8]) {
        assert!(!self.finalized, "Cannot update a finalized hash.");
        self.xof.absorb(data);
    }

    /// Produce the digest of everything absorbed so far.
    ///
    /// Afterwards, the hash can't be used again until [`Hash::reinit`] is called.
    pub fn finalize(&mut self) -> [u8; HASH_SIZE] {
        assert!(!self.finalized, "Cannot finalize a hash twice.");
        self.finalized = true;
        let mut out = [0u8; HASH_SIZE];
        self.xof.squeeze(&mut out);
        out
    }

    /// Erase the current state, and start hashing a new message.
    pub fn reinit(&mut self) {
        self.xof.reinit();
        self.finalized = false;
    }
}

impl<V: HashVariant> Default for Hash<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: HashVariant> Clone for Hash<V> {
    fn clone(&self) -> Self {
        Self {
            xof: self.xof.clone(),
            finalized: self.finalized,
        }
    }
}

impl<V: HashVariant> ZeroizeOnDrop for Hash<V> {}

/// ASCON-HASH.
pub type AsconHash = Hash<Ascon>;
/// ASCON-HASHA.
pub type AsconHashA = Hash<AsconA>;
/// ASCON-XOF.
pub type AsconXof = Xof<Ascon>;
/// ASCON-XOFA.
pub type AsconXofA = Xof<AsconA>;

//! ASCON-128, ASCON-128a and ASCON-80pq authenticated encryption.
//!
//! The mode is written once, over [`KeyedDuplex`], so that the same code
//! drives both the plain state and the masked one.
use aead::consts::{U16, U20};
use aead::generic_array::ArrayLength;
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::MacError;
use crate::permutation::{State, STATE_SIZE_U8};

/// The size of a nonce, in bytes.
pub const NONCE_SIZE: usize = 16;
/// The size of an authentication tag, in bytes.
pub const TAG_SIZE: usize = 16;

pub type Nonce = [u8; NONCE_SIZE];
pub type Tag = [u8; TAG_SIZE];

/// The nonce fills the last 16 bytes of the state at initialization.
pub(crate) const NONCE_OFFSET: usize = STATE_SIZE_U8 - NONCE_SIZE;
/// The tag is read from the last 16 bytes of the state.
pub(crate) const TAG_OFFSET: usize = STATE_SIZE_U8 - TAG_SIZE;
/// Padding placed right after the last byte of a block.
pub(crate) const PAD: u8 = 0x80;
/// Flipped in the last byte of the state between associated data and message.
pub(crate) const SEPARATOR: u8 = 0x01;

/// The parameters of one ASCON AEAD variant.
pub trait AeadVariant {
    /// The key, as a fixed size array of [`Self::KEY_SIZE`] bytes.
    type Key: AsRef<[u8]> + AsMut<[u8]> + Clone + Default + Zeroize;
    /// [`Self::KEY_SIZE`] as a type level number.
    type KeySize: ArrayLength<u8>;
    const KEY_SIZE: usize;
    /// The number of bytes processed between permutations.
    const RATE: usize;
    /// The number of rounds applied between blocks.
    const ROUNDS: usize;
    /// The IV, placed at the start of the state, followed by the key.
    const IV: &'static [u8];
}

/// The primary variant: a 16 byte rate with 8 rounds between blocks.
#[derive(Clone, Copy, Debug)]
pub struct Ascon128a;

impl AeadVariant for Ascon128a {
    type Key = [u8; 16];
    type KeySize = U16;
    const KEY_SIZE: usize = 16;
    const RATE: usize = 16;
    const ROUNDS: usize = 8;
    const IV: &'static [u8] = &[0x80, 0x80, 0x0c, 0x08, 0x00, 0x00, 0x00, 0x00];
}

/// An 8 byte rate with 6 rounds between blocks.
#[derive(Clone, Copy, Debug)]
pub struct Ascon128;

impl AeadVariant for Ascon128 {
    type Key = [u8; 16];
    type KeySize = U16;
    const KEY_SIZE: usize = 16;
    const RATE: usize = 8;
    const ROUNDS: usize = 6;
    const IV: &'static [u8] = &[0x80, 0x40, 0x0c, 0x06, 0x00, 0x00, 0x00, 0x00];
}

/// ASCON-128 with a 20 byte key.
#[derive(Clone, Copy, Debug)]
pub struct Ascon80pq;

impl AeadVariant for Ascon80pq {
    type Key = [u8; 20];
    type KeySize = U20;
    const KEY_SIZE: usize = 20;
    const RATE: usize = 8;
    const ROUNDS: usize = 6;
    const IV: &'static [u8] = &[0xa0, 0x40, 0x0c, 0x06];
}

/// A state together with the key it was started with.
///
/// This is everything the AEAD mode needs to do its work. Offsets are the
/// same byte offsets as in [`State`].
pub(crate) trait KeyedDuplex {
    /// Replace the whole state with `iv || key || nonce`.
    fn start(&mut self, iv: &[u8], nonce: &Nonce);
    fn permute(&mut self, rounds: usize);
    /// XOR the whole key in at `offset`.
    fn add_key(&mut self, offset: usize);
    /// XOR the last 16 bytes of the key in at `offset`.
    fn add_key_tail(&mut self, offset: usize);
    /// XOR public data in at `offset`.
    fn add_bytes(&mut self, data: &[u8], offset: usize);
    /// XOR plaintext in at `offset`, replacing it with the resulting ciphertext.
    fn encrypt_in_place(&mut self, data: &mut [u8], offset: usize);
    /// Replace ciphertext with plaintext, leaving the ciphertext in the state.
    fn decrypt_in_place(&mut self, data: &mut [u8], offset: usize);
    fn extract_bytes(&self, out: &mut [u8], offset: usize);
}

fn initialize<V: AeadVariant, D: KeyedDuplex>(duplex: &mut D, nonce: &Nonce) {
    debug_assert_eq!(V::IV.len() + V::KEY_SIZE, NONCE_OFFSET);
    duplex.start(V::IV, nonce);
    duplex.permute(12);
    duplex.add_key(STATE_SIZE_U8 - V::KEY_SIZE);
}

pub(crate) fn absorb_associated_data<V: AeadVariant, D: KeyedDuplex>(duplex: &mut D, ad: &[u8]) {
    if !ad.is_empty() {
        let mut blocks = ad.chunks_exact(V::RATE);
        for block in &mut blocks {
            duplex.add_bytes(block, 0);
            duplex.permute(V::ROUNDS);
        }
        let rest = blocks.remainder();
        duplex.add_bytes(rest, 0);
        duplex.add_bytes(&[PAD], rest.len());
        duplex.permute(V::ROUNDS);
    }
    duplex.add_bytes(&[SEPARATOR], STATE_SIZE_U8 - 1);
}

pub(crate) fn finalize<V: AeadVariant, D: KeyedDuplex>(duplex: &mut D) -> Tag {
    duplex.add_key(V::RATE);
    duplex.permute(12);
    duplex.add_key_tail(TAG_OFFSET);
    let mut tag = [0u8; TAG_SIZE];
    duplex.extract_bytes(&mut tag, TAG_OFFSET);
    tag
}

/// Run the whole encryption over a started duplex, returning the tag.
pub(crate) fn encrypt_detached<V: AeadVariant, D: KeyedDuplex>(
    duplex: &mut D,
    nonce: &Nonce,
    ad: &[u8],
    buffer: &mut [u8],
) -> Tag {
    initialize::<V, D>(duplex, nonce);
    absorb_associated_data::<V, D>(duplex, ad);

    let mut blocks = buffer.chunks_exact_mut(V::RATE);
    for block in &mut blocks {
        duplex.encrypt_in_place(block, 0);
        duplex.permute(V::ROUNDS);
    }
    let rest = blocks.into_remainder();
    duplex.encrypt_in_place(rest, 0);
    duplex.add_bytes(&[PAD], rest.len());

    finalize::<V, D>(duplex)
}

/// Run the whole decryption over a started duplex.
///
/// On failure, `buffer` is erased before returning.
pub(crate) fn decrypt_detached<V: AeadVariant, D: KeyedDuplex>(
    duplex: &mut D,
    nonce: &Nonce,
    ad: &[u8],
    buffer: &mut [u8],
    tag: &Tag,
) -> Result<(), MacError> {
    initialize::<V, D>(duplex, nonce);
    absorb_associated_data::<V, D>(duplex, ad);

    let mut blocks = buffer.chunks_exact_mut(V::RATE);
    for block in &mut blocks {
        duplex.decrypt_in_place(block, 0);
        duplex.permute(V::ROUNDS);
    }
    let rest = blocks.into_remainder();
    let rest_len = rest.len();
    duplex.decrypt_in_place(rest, 0);
    duplex.add_bytes(&[PAD], rest_len);

    let mut expected = finalize::<V, D>(duplex);
    let ok = expected[..].ct_eq(&tag[..]);
    expected.zeroize();
    if bool::from(ok) {
        Ok(())
    } else {
        debug!("aead: tag mismatch, discarding {} bytes", buffer.len());
        buffer.zeroize();
        Err(MacError)
    }
}

/// The unmasked duplex, borrowing the key it was started with.
pub(crate) struct PlainDuplex<'a> {
    state: State,
    key: &'a [u8],
}

impl<'a> PlainDuplex<'a> {
    pub(crate) fn new(key: &'a [u8]) -> Self {
        Self {
            state: State::new(),
            key,
        }
    }
}

impl KeyedDuplex for PlainDuplex<'_> {
    fn start(&mut self, iv: &[u8], nonce: &Nonce) {
        self.state.overwrite_bytes(iv, 0);
        self.state.overwrite_bytes(self.key, iv.len());
        self.state.overwrite_bytes(nonce, NONCE_OFFSET);
    }

    fn permute(&mut self, rounds: usize) {
        self.state.permute(rounds);
    }

    fn add_key(&mut self, offset: usize) {
        self.state.add_bytes(self.key, offset);
    }

    fn add_key_tail(&mut self, offset: usize) {
        self.state.add_bytes(&self.key[self.key.len() - 16..], offset);
    }

    fn add_bytes(&mut self, data: &[u8], offset: usize) {
        self.state.add_bytes(data, offset);
    }

    fn encrypt_in_place(&mut self, data: &mut [u8], offset: usize) {
        self.state.add_and_extract_in_place(data, offset);
    }

    fn decrypt_in_place(&mut self, data: &mut [u8], offset: usize) {
        self.state.extract_and_overwrite_in_place(data, offset);
    }

    fn extract_bytes(&self, out: &mut [u8], offset: usize) {
        self.state.extract_bytes(out, offset);
    }
}

/// An ASCON AEAD cipher holding its key.
///
/// The key is erased when this is dropped.
pub struct Aead<V: AeadVariant> {
    key: V::Key,
}

impl<V: AeadVariant> Aead<V> {
    /// Create a cipher holding a copy of `key`.
    pub fn new(key: &V::Key) -> Self {
        Self { key: key.clone() }
    }

    fn duplex(&self) -> PlainDuplex<'_> {
        PlainDuplex::new(self.key.as_ref())
    }

    /// Encrypt `buffer` in place, returning the tag.
    ///
    /// The nonce must never be reused with the same key.
    pub fn encrypt_in_place_detached(&self, nonce: &Nonce, ad: &[u8], buffer: &mut [u8]) -> Tag {
        encrypt_detached::<V, _>(&mut self.duplex(), nonce, ad, buffer)
    }

    /// Decrypt `buffer` in place, checking it against `tag`.
    ///
    /// If the tag doesn't match, `buffer` is erased, and an error is returned.
    pub fn decrypt_in_place_detached(
        &self,
        nonce: &Nonce,
        ad: &[u8],
        buffer: &mut [u8],
        tag: &Tag,
    ) -> Result<(), MacError> {
        decrypt_detached::<V, _>(&mut self.duplex(), nonce, ad, buffer, tag)
    }
}

impl<V: AeadVariant> Clone for Aead<V> {
    fn clone(&self) -> Self {
        Self::new(&self.key)
    }
}

impl<V: AeadVariant> Drop for Aead<V> {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl<V: AeadVariant> ZeroizeOnDrop for Aead<V> {}

/// Set a nonce to the counter value `n`.
///
/// The first half is zeroed, and the second half holds `n` in big endian order.
pub fn set_counter(nonce: &mut Nonce, n: u64) {
    nonce[..8].fill(0);
    nonce[8..].copy_from_slice(&n.to_be_bytes());
}

/// Increment a nonce, treated as a 128 bit big endian integer.
///
/// The all ones nonce wraps around to zero.
pub fn increment_nonce(nonce: &mut Nonce) {
    let mut carry = 1u16;
    for b in nonce.iter_mut().rev() {
        carry += u16::from(*b);
        *b = carry as u8;
        carry >>= 8;
    }
}

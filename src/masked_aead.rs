//! The ASCON AEAD modes, run over a masked state with a masked key.
//!
//! The output is bit for bit the same as [`crate::Aead`]. The key is split
//! into shares when the cipher is created, and from then on it only ever
//! enters the state share by share.
use core::ops::Range;

use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::aead::{decrypt_detached, encrypt_detached, AeadVariant, KeyedDuplex, Nonce, Tag};
use crate::error::MacError;
use crate::masked::{MaskedState, MAX_SHARES, MIN_SHARES};
use crate::permutation::STATE_SIZE_U8;

/// A key split into `SHARES` byte shares, whose XOR is the real key.
pub struct MaskedKey<V: AeadVariant, const SHARES: usize> {
    shares: [V::Key; SHARES],
}

fn xor_into(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

impl<V: AeadVariant, const SHARES: usize> MaskedKey<V, SHARES> {
    /// Split a key into shares.
    pub fn new<R: RngCore + CryptoRng>(key: &V::Key, rng: &mut R) -> Self {
        assert!(
            (MIN_SHARES..=MAX_SHARES).contains(&SHARES),
            "A masked key needs between {} and {} shares, not {}.",
            MIN_SHARES,
            MAX_SHARES,
            SHARES
        );
        let mut shares: [V::Key; SHARES] = core::array::from_fn(|_| V::Key::default());
        for share in shares.iter_mut().skip(1) {
            rng.fill_bytes(share.as_mut());
        }
        let (first, rest) = shares.split_at_mut(1);
        for share in rest.iter() {
            xor_into(first[0].as_mut(), share.as_ref());
        }
        xor_into(first[0].as_mut(), key.as_ref());
        Self { shares }
    }

    /// Refresh the shares with new randomness, leaving the key unchanged.
    pub fn randomize<R: RngCore + CryptoRng>(&mut self, rng: &mut R) {
        let mut fresh = V::Key::default();
        for s in 1..SHARES {
            rng.fill_bytes(fresh.as_mut());
            xor_into(self.shares[0].as_mut(), fresh.as_ref());
            xor_into(self.shares[s].as_mut(), fresh.as_ref());
        }
        fresh.zeroize();
    }

    fn shares_in(&self, range: Range<usize>) -> [&[u8]; SHARES] {
        core::array::from_fn(|s| &self.shares[s].as_ref()[range.clone()])
    }
}

impl<V: AeadVariant, const SHARES: usize> Drop for MaskedKey<V, SHARES> {
    fn drop(&mut self) {
        for share in self.shares.iter_mut() {
            share.zeroize();
        }
    }
}

impl<V: AeadVariant, const SHARES: usize> ZeroizeOnDrop for MaskedKey<V, SHARES> {}

struct MaskedDuplex<'a, V: AeadVariant, R, const SHARES: usize> {
    state: MaskedState<SHARES>,
    key: &'a MaskedKey<V, SHARES>,
    rng: &'a mut R,
}

impl<V: AeadVariant, R: RngCore + CryptoRng, const SHARES: usize> KeyedDuplex
    for MaskedDuplex<'_, V, R, SHARES>
{
    fn start(&mut self, iv: &[u8], nonce: &Nonce) {
        self.state.overwrite_bytes(iv, 0, self.rng);
        self.state
            .overwrite_shares(self.key.shares_in(0..V::KEY_SIZE), iv.len());
        self.state
            .overwrite_bytes(nonce, STATE_SIZE_U8 - nonce.len(), self.rng);
    }

    fn permute(&mut self, rounds: usize) {
        self.state.permute(rounds, self.rng);
    }

    fn add_key(&mut self, offset: usize) {
        self.state
            .add_shares(self.key.shares_in(0..V::KEY_SIZE), offset);
    }

    fn add_key_tail(&mut self, offset: usize) {
        self.state
            .add_shares(self.key.shares_in(V::KEY_SIZE - 16..V::KEY_SIZE), offset);
    }

    fn add_bytes(&mut self, data: &[u8], offset: usize) {
        self.state.add_bytes(data, offset, self.rng);
    }

    fn encrypt_in_place(&mut self, data: &mut [u8], offset: usize) {
        self.state.add_bytes(data, offset, self.rng);
        self.state.extract_bytes(data, offset);
    }

    fn decrypt_in_place(&mut self, data: &mut [u8], offset: usize) {
        let len = data.len();
        let mut ciphertext = [0u8; STATE_SIZE_U8];
        ciphertext[..len].copy_from_slice(data);
        self.state
            .extract_and_add_bytes(&ciphertext[..len], data, offset);
        self.state
            .overwrite_bytes(&ciphertext[..len], offset, self.rng);
    }

    fn extract_bytes(&self, out: &mut [u8], offset: usize) {
        self.state.extract_bytes(out, offset);
    }
}

/// An ASCON AEAD cipher working over a masked state.
///
/// The key shares are refreshed before every message.
pub struct MaskedAead<V: AeadVariant, const SHARES: usize> {
    key: MaskedKey<V, SHARES>,
}

impl<V: AeadVariant, const SHARES: usize> MaskedAead<V, SHARES> {
    /// Create a cipher from an unmasked key, splitting it into shares.
    pub fn new<R: RngCore + CryptoRng>(key: &V::Key, rng: &mut R) -> Self {
        Self {
            key: MaskedKey::new(key, rng),
        }
    }

    /// Create a cipher from a key that is already masked.
    pub fn from_masked_key(key: MaskedKey<V, SHARES>) -> Self {
        Self { key }
    }

    /// Encrypt `buffer` in place, returning the tag.
    pub fn encrypt_in_place_detached<R: RngCore + CryptoRng>(
        &mut self,
        nonce: &Nonce,
        ad: &[u8],
        buffer: &mut [u8],
        rng: &mut R,
    ) -> Tag {
        self.key.randomize(rng);
        let mut duplex = MaskedDuplex {
            state: MaskedState::new(rng),
            key: &self.key,
            rng,
        };
        encrypt_detached::<V, _>(&mut duplex, nonce, ad, buffer)
    }

    /// Decrypt `buffer` in place, checking it against `tag`.
    ///
    /// If the tag doesn't match, `buffer` is erased, and an error is returned.
    pub fn decrypt_in_place_detached<R: RngCore + CryptoRng>(
        &mut self,
        nonce: &Nonce,
        ad: &[u8],
        buffer: &mut [u8],
        tag: &Tag,
        rng: &mut R,
    ) -> Result<(), MacError> {
        self.key.randomize(rng);
        let mut duplex = MaskedDuplex {
            state: MaskedState::new(rng),
            key: &self.key,
            rng,
        };
        decrypt_detached::<V, _>(&mut duplex, nonce, ad, buffer, tag)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aead::{Aead, Ascon128, Ascon128a, Ascon80pq};
    use hex_literal::hex;
    use rand::{rngs::StdRng, SeedableRng};

    const KEY: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");
    const NONCE: Nonce = hex!("000102030405060708090a0b0c0d0e0f");

    #[test]
    fn test_ascon128a_empty_vector() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut cipher = MaskedAead::<Ascon128a, 2>::new(&KEY, &mut rng);
        let tag = cipher.encrypt_in_place_detached(&NONCE, b"", &mut [], &mut rng);
        assert_eq!(tag, hex!("7a834e6f09210957067b10fd831f0078"));
    }

    fn check_matches_plain<V: AeadVariant, const SHARES: usize>(key: &V::Key) {
        let mut rng = StdRng::seed_from_u64(SHARES as u64);
        let plain = Aead::<V>::new(key);
        let mut masked = MaskedAead::<V, SHARES>::new(key, &mut rng);
        for len in [0usize, 1, 7, 8, 15, 16, 17, 33] {
            let message: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            let ad: Vec<u8> = (0..len / 2).map(|i| (i * 3) as u8).collect();

            let mut expected = message.clone();
            let expected_tag = plain.encrypt_in_place_detached(&NONCE, &ad, &mut expected);

            let mut buffer = message.clone();
            let tag = masked.encrypt_in_place_detached(&NONCE, &ad, &mut buffer, &mut rng);
            assert_eq!(buffer, expected);
            assert_eq!(tag, expected_tag);

            masked
                .decrypt_in_place_detached(&NONCE, &ad, &mut buffer, &tag, &mut rng)
                .unwrap();
            assert_eq!(buffer, message);
        }
    }

    #[test]
    fn test_matches_plain_every_variant_and_share_count() {
        check_matches_plain::<Ascon128, 2>(&KEY);
        check_matches_plain::<Ascon128, 3>(&KEY);
        check_matches_plain::<Ascon128, 4>(&KEY);
        check_matches_plain::<Ascon128a, 2>(&KEY);
        check_matches_plain::<Ascon128a, 3>(&KEY);
        check_matches_plain::<Ascon128a, 4>(&KEY);
        check_matches_plain::<Ascon80pq, 2>(&[0x5C; 20]);
        check_matches_plain::<Ascon80pq, 4>(&[0x5C; 20]);
    }

    #[test]
    fn test_bad_tag_erases_plaintext() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut cipher = MaskedAead::<Ascon128a, 3>::new(&KEY, &mut rng);
        let mut buffer = *b"masked message";
        let mut tag = cipher.encrypt_in_place_detached(&NONCE, b"", &mut buffer, &mut rng);
        tag[15] ^= 0x80;
        let result = cipher.decrypt_in_place_detached(&NONCE, b"", &mut buffer, &tag, &mut rng);
        assert_eq!(result, Err(MacError));
        assert_eq!(buffer, [0u8; 14]);
    }

    #[test]
    fn test_key_randomize_keeps_key() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut key = MaskedKey::<Ascon128, 3>::new(&KEY, &mut rng);
        let before = key.shares;
        key.randomize(&mut rng);
        assert_ne!(before, key.shares);

        let mut combined = [0u8; 16];
        for share in key.shares.iter() {
            xor_into(&mut combined, share);
        }
        assert_eq!(combined, KEY);
    }
}

//! ASCON-128-SIV and ASCON-128a-SIV.
//!
//! These run the AEAD modes twice: once to authenticate the plaintext,
//! producing the tag, and once more to encrypt with a keystream started from
//! that tag. Reusing a nonce only reveals whether two messages were equal.
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::aead::{
    absorb_associated_data, finalize, AeadVariant, Ascon128, Ascon128a, KeyedDuplex, Nonce,
    PlainDuplex, Tag, PAD,
};
use crate::error::MacError;
use crate::permutation::STATE_SIZE_U8;

/// An AEAD variant which also has a SIV mode.
pub trait SivVariant: AeadVariant {
    /// The IV used while computing the tag.
    const AUTH_IV: [u8; 8];
    /// The IV used while generating the keystream.
    const ENC_IV: [u8; 8];
}

impl SivVariant for Ascon128 {
    const AUTH_IV: [u8; 8] = [0x81, 0x40, 0x0c, 0x06, 0x00, 0x00, 0x00, 0x00];
    const ENC_IV: [u8; 8] = [0x82, 0x40, 0x0c, 0x06, 0x00, 0x00, 0x00, 0x00];
}

impl SivVariant for Ascon128a {
    const AUTH_IV: [u8; 8] = [0x81, 0x80, 0x0c, 0x08, 0x00, 0x00, 0x00, 0x00];
    const ENC_IV: [u8; 8] = [0x82, 0x80, 0x0c, 0x08, 0x00, 0x00, 0x00, 0x00];
}

fn start<V: SivVariant, D: KeyedDuplex>(duplex: &mut D, iv: &[u8], nonce: &Nonce) {
    duplex.start(iv, nonce);
    duplex.permute(12);
    duplex.add_key(STATE_SIZE_U8 - V::KEY_SIZE);
}

fn authenticate<V: SivVariant, D: KeyedDuplex>(
    duplex: &mut D,
    nonce: &Nonce,
    ad: &[u8],
    plaintext: &[u8],
) -> Tag {
    start::<V, D>(duplex, &V::AUTH_IV, nonce);
    absorb_associated_data::<V, D>(duplex, ad);

    let mut blocks = plaintext.chunks_exact(V::RATE);
    for block in &mut blocks {
        duplex.add_bytes(block, 0);
        duplex.permute(V::ROUNDS);
    }
    let rest = blocks.remainder();
    duplex.add_bytes(rest, 0);
    duplex.add_bytes(&[PAD], rest.len());

    finalize::<V, D>(duplex)
}

/// XOR the keystream started from `tag` into `buffer`.
fn apply_keystream<V: SivVariant, D: KeyedDuplex>(duplex: &mut D, tag: &Tag, buffer: &mut [u8]) {
    start::<V, D>(duplex, &V::ENC_IV, tag);
    let mut stream = [0u8; STATE_SIZE_U8];
    for chunk in buffer.chunks_mut(V::RATE) {
        duplex.permute(V::ROUNDS);
        let stream = &mut stream[..chunk.len()];
        duplex.extract_bytes(stream, 0);
        for (c, s) in chunk.iter_mut().zip(stream.iter()) {
            *c ^= s;
        }
    }
    stream.zeroize();
}

/// An ASCON SIV cipher holding its key.
pub struct Siv<V: SivVariant> {
    key: V::Key,
}

impl<V: SivVariant> Siv<V> {
    /// Create a cipher holding a copy of `key`.
    pub fn new(key: &V::Key) -> Self {
        Self { key: key.clone() }
    }

    /// Encrypt `buffer` in place, returning the tag.
    pub fn encrypt_in_place_detached(&self, nonce: &Nonce, ad: &[u8], buffer: &mut [u8]) -> Tag {
        let mut duplex = PlainDuplex::new(self.key.as_ref());
        let tag = authenticate::<V, _>(&mut duplex, nonce, ad, buffer);
        apply_keystream::<V, _>(&mut duplex, &tag, buffer);
        tag
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
        let mut duplex = PlainDuplex::new(self.key.as_ref());
        apply_keystream::<V, _>(&mut duplex, tag, buffer);
        let mut expected = authenticate::<V, _>(&mut duplex, nonce, ad, buffer);
        let ok = expected[..].ct_eq(&tag[..]);
        expected.zeroize();
        if bool::from(ok) {
            Ok(())
        } else {
            debug!("siv: tag mismatch, discarding {} bytes", buffer.len());
            buffer.zeroize();
            Err(MacError)
        }
    }
}

impl<V: SivVariant> Clone for Siv<V> {
    fn clone(&self) -> Self {
        Self::new(&self.key)
    }
}

impl<V: SivVariant> Drop for Siv<V> {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl<V: SivVariant> ZeroizeOnDrop for Siv<V> {}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    const KEY: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");
    const NONCE: Nonce = hex!("000102030405060708090a0b0c0d0e0f");

    fn encrypt_vector<V: SivVariant<Key = [u8; 16]>>(ad: &[u8], message: &[u8]) -> (Vec<u8>, Tag) {
        let mut buffer = message.to_vec();
        let tag = Siv::<V>::new(&KEY).encrypt_in_place_detached(&NONCE, ad, &mut buffer);
        (buffer, tag)
    }

    #[test]
    fn test_siv128_empty_vector() {
        let (ciphertext, tag) = encrypt_vector::<Ascon128>(b"", b"");
        assert!(ciphertext.is_empty());
        assert_eq!(tag, hex!("8f98931a55a264aa7c3dac81f17664b5"));
    }

    #[test]
    fn test_siv128a_empty_vector() {
        let (_, tag) = encrypt_vector::<Ascon128a>(b"", b"");
        assert_eq!(tag, hex!("185a76e303df71293802bed946b8763e"));
    }

    #[test]
    fn test_siv128_vector() {
        let ad: Vec<u8> = (0..5).collect();
        let message: Vec<u8> = (0..21).collect();
        let (ciphertext, tag) = encrypt_vector::<Ascon128>(&ad, &message);
        assert_eq!(ciphertext, hex!("eed0a55b45bba6be5ccfb1475efe90dae19d49184f"));
        assert_eq!(tag, hex!("c2b29fb5a6cc954198f612835e709c69"));
    }

    #[test]
    fn test_siv128a_vector() {
        let ad: Vec<u8> = (0..5).collect();
        let message: Vec<u8> = (0..21).collect();
        let (ciphertext, tag) = encrypt_vector::<Ascon128a>(&ad, &message);
        assert_eq!(ciphertext, hex!("aacb36546054428e0740816f6b0781f59c7c08c2d0"));
        assert_eq!(tag, hex!("cf0a43fbd816a7a846010dd43c0e43f0"));
    }

    fn check_round_trip<V: SivVariant<Key = [u8; 16]>>() {
        let cipher = Siv::<V>::new(&KEY);
        for len in 0..40 {
            let message: Vec<u8> = (0..len as u8).map(|x| x.wrapping_mul(13)).collect();
            let ad: Vec<u8> = (0..(len as u8 / 2)).collect();
            let mut buffer = message.clone();
            let tag = cipher.encrypt_in_place_detached(&NONCE, &ad, &mut buffer);
            cipher
                .decrypt_in_place_detached(&NONCE, &ad, &mut buffer, &tag)
                .unwrap();
            assert_eq!(buffer, message);
        }
    }

    #[test]
    fn test_round_trip() {
        check_round_trip::<Ascon128>();
        check_round_trip::<Ascon128a>();
    }

    #[test]
    fn test_modified_ciphertext_erases_plaintext() {
        let cipher = Siv::<Ascon128a>::new(&KEY);
        let mut buffer = *b"the eagle has landed";
        let tag = cipher.encrypt_in_place_detached(&NONCE, b"", &mut buffer);
        buffer[3] ^= 0x10;
        let result = cipher.decrypt_in_place_detached(&NONCE, b"", &mut buffer, &tag);
        assert_eq!(result, Err(MacError));
        assert_eq!(buffer, [0u8; 20]);
    }

    #[test]
    fn test_nonce_reuse_only_reveals_equality() {
        let cipher = Siv::<Ascon128>::new(&KEY);
        let mut a = *b"message one";
        let mut b = *b"message two";
        let mut c = *b"message one";
        let tag_a = cipher.encrypt_in_place_detached(&NONCE, b"", &mut a);
        let tag_b = cipher.encrypt_in_place_detached(&NONCE, b"", &mut b);
        let tag_c = cipher.encrypt_in_place_detached(&NONCE, b"", &mut c);
        assert_ne!(tag_a, tag_b);
        // Unlike the plain modes, the keystream depends on the message through the tag.
        assert_ne!(a[..8], b[..8]);
        assert_eq!((a, tag_a), (c, tag_c));
    }
}

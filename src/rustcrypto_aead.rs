//! The `aead` crate's traits, for [`Aead`] and [`Siv`].
use aead::consts::{U0, U16};
use aead::{AeadCore, AeadInPlace, Key, KeyInit, KeySizeUser};
use zeroize::Zeroize;

use crate::aead::{Aead, AeadVariant, Nonce, Tag};
use crate::error::MacError;
use crate::siv::{Siv, SivVariant};

impl From<MacError> for aead::Error {
    fn from(_: MacError) -> Self {
        aead::Error
    }
}

fn convert_key<V: AeadVariant>(key: &[u8]) -> V::Key {
    let mut out = V::Key::default();
    out.as_mut().copy_from_slice(key);
    out
}

fn convert_nonce(nonce: &[u8]) -> aead::Result<&Nonce> {
    nonce.try_into().map_err(|_| aead::Error)
}

fn convert_tag(tag: &[u8]) -> aead::Result<&Tag> {
    tag.try_into().map_err(|_| aead::Error)
}

impl<V: AeadVariant> KeySizeUser for Aead<V> {
    type KeySize = V::KeySize;
}

impl<V: AeadVariant> KeyInit for Aead<V> {
    fn new(key: &Key<Self>) -> Self {
        let mut key = convert_key::<V>(key);
        let cipher = Aead::<V>::new(&key);
        key.zeroize();
        cipher
    }
}

impl<V: AeadVariant> AeadCore for Aead<V> {
    type NonceSize = U16;
    type TagSize = U16;
    type CiphertextOverhead = U0;
}

impl<V: AeadVariant> AeadInPlace for Aead<V> {
    fn encrypt_in_place_detached(
        &self,
        nonce: &aead::Nonce<Self>,
        associated_data: &[u8],
        buffer: &mut [u8],
    ) -> aead::Result<aead::Tag<Self>> {
        let nonce = convert_nonce(nonce)?;
        let tag = Aead::<V>::encrypt_in_place_detached(self, nonce, associated_data, buffer);
        Ok(tag.into())
    }

    fn decrypt_in_place_detached(
        &self,
        nonce: &aead::Nonce<Self>,
        associated_data: &[u8],
        buffer: &mut [u8],
        tag: &aead::Tag<Self>,
    ) -> aead::Result<()> {
        let nonce = convert_nonce(nonce)?;
        let tag = convert_tag(tag)?;
        Aead::<V>::decrypt_in_place_detached(self, nonce, associated_data, buffer, tag)?;
        Ok(())
    }
}

impl<V: SivVariant> KeySizeUser for Siv<V> {
    type KeySize = V::KeySize;
}

impl<V: SivVariant> KeyInit for Siv<V> {
    fn new(key: &Key<Self>) -> Self {
        let mut key = convert_key::<V>(key);
        let cipher = Siv::<V>::new(&key);
        key.zeroize();
        cipher
    }
}

impl<V: SivVariant> AeadCore for Siv<V> {
    type NonceSize = U16;
    type TagSize = U16;
    type CiphertextOverhead = U0;
}

impl<V: SivVariant> AeadInPlace for Siv<V> {
    fn encrypt_in_place_detached(
        &self,
        nonce: &aead::Nonce<Self>,
        associated_data: &[u8],
        buffer: &mut [u8],
    ) -> aead::Result<aead::Tag<Self>> {
        let nonce = convert_nonce(nonce)?;
        let tag = Siv::<V>::encrypt_in_place_detached(self, nonce, associated_data, buffer);
        Ok(tag.into())
    }

    fn decrypt_in_place_detached(
        &self,
        nonce: &aead::Nonce<Self>,
        associated_data: &[u8],
        buffer: &mut [u8],
        tag: &aead::Tag<Self>,
    ) -> aead::Result<()> {
        let nonce = convert_nonce(nonce)?;
        let tag = convert_tag(tag)?;
        Siv::<V>::decrypt_in_place_detached(self, nonce, associated_data, buffer, tag)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aead::{Ascon128, Ascon128a, Ascon80pq};
    use aead::Aead as _;
    use hex_literal::hex;

    const KEY: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");
    const NONCE: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");

    #[test]
    fn test_trait_matches_inherent() {
        let ad: Vec<u8> = (0..5).collect();
        let message: Vec<u8> = (0..21).collect();

        let cipher = <Aead<Ascon128> as KeyInit>::new(&KEY.into());
        let mut buffer = message.clone();
        let tag = AeadInPlace::encrypt_in_place_detached(&cipher, &NONCE.into(), &ad, &mut buffer)
            .unwrap();
        assert_eq!(buffer, hex!("0e6a8b0ca517f53d3d72e1d8d734511c32ca4415fd"));
        assert_eq!(tag[..], hex!("7c242a7053d1d6b1753342465ab814e6"));

        AeadInPlace::decrypt_in_place_detached(&cipher, &NONCE.into(), &ad, &mut buffer, &tag)
            .unwrap();
        assert_eq!(buffer, message);
    }

    #[test]
    fn test_new_from_slice_checks_length() {
        assert!(<Aead<Ascon80pq> as KeyInit>::new_from_slice(&[0u8; 20]).is_ok());
        assert!(<Aead<Ascon80pq> as KeyInit>::new_from_slice(&[0u8; 16]).is_err());
        assert!(<Siv<Ascon128a> as KeyInit>::new_from_slice(&[0u8; 20]).is_err());
    }

    #[test]
    fn test_attached_tag_round_trip() {
        let cipher = <Aead<Ascon128a> as KeyInit>::new(&KEY.into());
        let sealed = cipher.encrypt(&NONCE.into(), &b"attached"[..]).unwrap();
        assert_eq!(sealed.len(), 8 + 16);
        let opened = cipher.decrypt(&NONCE.into(), sealed.as_slice()).unwrap();
        assert_eq!(opened, b"attached");

        let mut tampered = sealed.clone();
        tampered[0] ^= 1;
        assert_eq!(
            cipher.decrypt(&NONCE.into(), tampered.as_slice()),
            Err(aead::Error)
        );
    }

    #[test]
    fn test_siv_through_traits() {
        let cipher = <Siv<Ascon128> as KeyInit>::new(&KEY.into());
        let ad: Vec<u8> = (0..5).collect();
        let message: Vec<u8> = (0..21).collect();
        let mut buffer = message.clone();
        let tag = AeadInPlace::encrypt_in_place_detached(&cipher, &NONCE.into(), &ad, &mut buffer)
            .unwrap();
        assert_eq!(buffer, hex!("eed0a55b45bba6be5ccfb1475efe90dae19d49184f"));
        assert_eq!(tag[..], hex!("c2b29fb5a6cc954198f612835e709c69"));
    }

    #[test]
    fn test_mac_error_converts() {
        assert_eq!(aead::Error::from(MacError), aead::Error);
    }
}

#![cfg_attr(not(test), no_std)]
//! The ASCON permutation, along with the hash, XOF, PRF, and AEAD modes built on top of it.
//!
//! A masked version of the state is also provided, for implementations which
//! need to resist side channel attacks.
mod access;
mod aead;
mod error;
mod hash;
mod masked;
mod masked_aead;
mod permutation;
mod prf;
mod rustcrypto_aead;
mod rustcrypto_hash;
mod siv;

pub use crate::aead::{
    increment_nonce, set_counter, Aead, AeadVariant, Ascon128, Ascon128a, Ascon80pq, Nonce, Tag,
    NONCE_SIZE, TAG_SIZE,
};
pub use crate::error::{MacError, PrfShortError};
pub use crate::hash::{
    Ascon, AsconA, AsconHash, AsconHashA, AsconXof, AsconXofA, Hash, HashVariant, Xof, HASH_SIZE,
    XOF_RATE,
};
pub use crate::masked::{MaskedState, MAX_SHARES, MIN_SHARES};
pub use crate::masked_aead::{MaskedAead, MaskedKey};
pub use crate::permutation::{State, MAX_ROUNDS, STATE_SIZE_U64, STATE_SIZE_U8};
pub use crate::prf::{
    mac, prf, prf_fixed, prf_short, verify_mac, MacTag, Prf, PrfKey, MAC_TAG_SIZE, PRF_KEY_SIZE,
    PRF_SHORT_MAX_INPUT, PRF_SHORT_MAX_OUTPUT,
};
pub use crate::rustcrypto_hash::XofOutput;
pub use crate::siv::{Siv, SivVariant};
pub use ::aead::{AeadCore, AeadInPlace, KeyInit};
pub use digest;

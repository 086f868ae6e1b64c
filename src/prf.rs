//! ASCON-Prf, ASCON-Mac and ASCON-PrfShort.
//!
//! The PRF absorbs 32 bytes and squeezes 16 bytes per permutation call, with
//! the key only entering the state at initialization.
use subtle::ConstantTimeEq;
use tracing::{debug, trace};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::aead::{PAD, SEPARATOR};
use crate::error::{MacError, PrfShortError};
use crate::hash::MAX_FIXED_OUTPUT;
use crate::permutation::{State, STATE_SIZE_U8};

/// The size of a PRF or MAC key, in bytes.
pub const PRF_KEY_SIZE: usize = 16;
/// The size of a tag produced by [`mac`].
pub const MAC_TAG_SIZE: usize = 16;
/// The longest input [`prf_short`] accepts.
pub const PRF_SHORT_MAX_INPUT: usize = 16;
/// The longest output [`prf_short`] produces.
pub const PRF_SHORT_MAX_OUTPUT: usize = 16;

pub type PrfKey = [u8; PRF_KEY_SIZE];
pub type MacTag = [u8; MAC_TAG_SIZE];

const RATE_IN: usize = 32;
const RATE_OUT: usize = 16;
/// The first half of the IV, the second half holds the output length in bits.
const IV: [u8; 4] = [0x80, 0x80, 0x8c, 0x00];
const KEY_OFFSET: usize = 8;
/// PrfShort reads its input from, and writes its output to, the last 16 bytes.
const SHORT_OFFSET: usize = STATE_SIZE_U8 - 16;

/// An incremental keyed PRF.
///
/// Like [`crate::Xof`], input and output can come in pieces of any size,
/// and absorbing again after squeezing starts a new absorb phase.
pub struct Prf {
    state: State,
    count: usize,
    squeezing: bool,
}

impl Prf {
    /// Create a PRF producing output of arbitrary length.
    pub fn new(key: &PrfKey) -> Self {
        Self::with_output_len(key, 0)
    }

    /// Create a PRF committed to producing `len` bytes of output.
    ///
    /// A length of 0, or one too large to encode, gives arbitrary length output.
    pub fn with_output_len(key: &PrfKey, len: usize) -> Self {
        let bits = if len >= MAX_FIXED_OUTPUT {
            0
        } else {
            (len * 8) as u32
        };
        let mut state = State::new();
        state.overwrite_bytes(&IV, 0);
        state.overwrite_bytes(&bits.to_be_bytes(), IV.len());
        state.overwrite_bytes(key, KEY_OFFSET);
        state.permute12();
        Self {
            state,
            count: 0,
            squeezing: false,
        }
    }

    /// Absorb some data into the PRF.
    pub fn absorb(&mut self, mut data: &[u8]) {
        if self.squeezing {
            trace!("prf: squeezing to absorbing");
            self.squeezing = false;
            self.count = 0;
            self.state.permute12();
        }
        while !data.is_empty() {
            let take = (RATE_IN - self.count).min(data.len());
            self.state.add_bytes(&data[..take], self.count);
            self.count += take;
            data = &data[take..];
            if self.count == RATE_IN {
                self.state.permute12();
                self.count = 0;
            }
        }
    }

    /// Squeeze output out of the PRF, continuing the same output stream.
    pub fn squeeze(&mut self, mut out: &mut [u8]) {
        if !self.squeezing {
            self.state.add_bytes(&[PAD], self.count);
            self.state.add_bytes(&[SEPARATOR], STATE_SIZE_U8 - 1);
            self.squeezing = true;
            self.count = 0;
        }
        while !out.is_empty() {
            if self.count == 0 {
                self.state.permute12();
            }
            let take = (RATE_OUT - self.count).min(out.len());
            let (head, tail) = core::mem::take(&mut out).split_at_mut(take);
            self.state.extract_bytes(head, self.count);
            self.count = (self.count + take) % RATE_OUT;
            out = tail;
        }
    }
}

impl Clone for Prf {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            count: self.count,
            squeezing: self.squeezing,
        }
    }
}

// The state erases itself when dropped.
impl ZeroizeOnDrop for Prf {}

/// Fill `out` with the arbitrary length PRF of `input`.
pub fn prf(key: &PrfKey, input: &[u8], out: &mut [u8]) {
    let mut prf = Prf::new(key);
    prf.absorb(input);
    prf.squeeze(out);
}

/// Fill `out` with the PRF of `input`, with the length of `out` bound in.
pub fn prf_fixed(key: &PrfKey, input: &[u8], out: &mut [u8]) {
    let mut prf = Prf::with_output_len(key, out.len());
    prf.absorb(input);
    prf.squeeze(out);
}

/// Compute the 16 byte ASCON-Mac tag of `input`.
pub fn mac(key: &PrfKey, input: &[u8]) -> MacTag {
    let mut tag = [0u8; MAC_TAG_SIZE];
    prf_fixed(key, input, &mut tag);
    tag
}

/// Check a tag produced by [`mac`], in constant time.
pub fn verify_mac(key: &PrfKey, input: &[u8], tag: &MacTag) -> Result<(), MacError> {
    let mut expected = mac(key, input);
    let ok = expected[..].ct_eq(&tag[..]);
    expected.zeroize();
    if bool::from(ok) {
        Ok(())
    } else {
        debug!("mac: tag mismatch");
        Err(MacError)
    }
}

/// ASCON-PrfShort: a single permutation call, for at most 16 bytes in and out.
pub fn prf_short(key: &PrfKey, input: &[u8], out: &mut [u8]) -> Result<(), PrfShortError> {
    if input.len() > PRF_SHORT_MAX_INPUT {
        return Err(PrfShortError::InputTooLong(input.len()));
    }
    if out.len() > PRF_SHORT_MAX_OUTPUT {
        return Err(PrfShortError::OutputTooLong(out.len()));
    }
    let iv = [0x80, (input.len() * 8) as u8, 0x4c, 0x80, 0x00, 0x00, 0x00, 0x00];
    let mut state = State::new();
    state.overwrite_bytes(&iv, 0);
    state.overwrite_bytes(key, KEY_OFFSET);
    state.overwrite_bytes(input, SHORT_OFFSET);
    state.permute12();
    state.add_bytes(key, SHORT_OFFSET);
    state.extract_bytes(out, SHORT_OFFSET);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    const KEY: PrfKey = hex!("000102030405060708090a0b0c0d0e0f");

    #[test]
    fn test_prf_empty_vector() {
        let mut out = [0u8; 32];
        prf(&KEY, b"", &mut out);
        assert_eq!(
            out,
            hex!("2a766fe9a4894073bc811b19d54ac33da3781e8fa3f548bf5cd8d8555559e6b7")
        );
    }

    #[test]
    fn test_prf_vector() {
        let input: Vec<u8> = (0..33).collect();
        let mut out = [0u8; 40];
        prf(&KEY, &input, &mut out);
        assert_eq!(
            out,
            hex!(
                "b3d6281e1353b364439fd02040bed3413286e08fca3945d748b954b9e025f04d"
                "c5490484d207e6b8"
            )
        );
    }

    #[test]
    fn test_mac_vectors() {
        assert_eq!(mac(&KEY, b""), hex!("eb1af688825d66bf2d53e135f9323315"));
        let input: Vec<u8> = (0..41).collect();
        assert_eq!(mac(&KEY, &input), hex!("b764e0e390c1a0dcd4dbe769fee90298"));
    }

    #[test]
    fn test_prf_short_vectors() {
        let mut out = [0u8; 16];
        prf_short(&KEY, b"", &mut out).unwrap();
        assert_eq!(out, hex!("5006eb1808193809f981151b19e59299"));

        let input: Vec<u8> = (0..16).collect();
        prf_short(&KEY, &input, &mut out).unwrap();
        assert_eq!(out, hex!("bd03ea334bebefc4d7ddaef4b1df1485"));

        let input: Vec<u8> = (0..5).collect();
        let mut short = [0u8; 8];
        prf_short(&KEY, &input, &mut short).unwrap();
        assert_eq!(short, hex!("f6cfd0dee1e68865"));
    }

    #[test]
    fn test_prf_short_rejects_long_buffers() {
        let mut out = [0u8; 17];
        assert_eq!(
            prf_short(&KEY, &[0u8; 17], &mut out[..16]),
            Err(PrfShortError::InputTooLong(17))
        );
        assert_eq!(
            prf_short(&KEY, b"", &mut out),
            Err(PrfShortError::OutputTooLong(17))
        );
    }

    #[test]
    fn test_verify_mac() {
        let mut tag = mac(&KEY, b"some message");
        assert_eq!(verify_mac(&KEY, b"some message", &tag), Ok(()));
        assert_eq!(verify_mac(&KEY, b"some messagf", &tag), Err(MacError));
        tag[7] ^= 4;
        assert_eq!(verify_mac(&KEY, b"some message", &tag), Err(MacError));
    }

    #[test]
    fn test_pieces_match_one_shot() {
        let input: Vec<u8> = (0..100).collect();
        let mut whole = [0u8; 50];
        prf(&KEY, &input, &mut whole);

        let mut prf = Prf::new(&KEY);
        prf.absorb(&input[..31]);
        prf.absorb(&input[31..64]);
        prf.absorb(&input[64..]);
        let mut pieces = [0u8; 50];
        prf.squeeze(&mut pieces[..15]);
        prf.squeeze(&mut pieces[15..16]);
        prf.squeeze(&mut pieces[16..]);
        assert_eq!(whole, pieces);
    }

    #[test]
    fn test_fixed_length_is_bound() {
        let mut fixed = [0u8; 16];
        let mut free = [0u8; 16];
        prf_fixed(&KEY, b"abc", &mut fixed);
        prf(&KEY, b"abc", &mut free);
        assert_ne!(fixed, free);
        assert_eq!(fixed, mac(&KEY, b"abc"));
    }

    #[test]
    fn test_absorb_after_squeeze_changes_output() {
        let mut prf = Prf::new(&KEY);
        prf.absorb(b"abc");
        let mut first = [0u8; 16];
        prf.squeeze(&mut first);
        prf.absorb(b"def");
        let mut second = [0u8; 16];
        prf.squeeze(&mut second);
        assert_ne!(first, second);
    }
}

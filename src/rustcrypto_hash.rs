//! The `digest` crate's traits, for [`Hash`] and [`Xof`].
use digest::consts::U32;
use digest::{
    ExtendableOutput, ExtendableOutputReset, FixedOutput, FixedOutputReset, HashMarker, Output,
    OutputSizeUser, Reset, Update, XofReader,
};

use crate::hash::{Hash, HashVariant, Xof};

impl<V: HashVariant> HashMarker for Hash<V> {}

impl<V: HashVariant> OutputSizeUser for Hash<V> {
    type OutputSize = U32;
}

impl<V: HashVariant> Update for Hash<V> {
    fn update(&mut self, data: &[u8]) {
        Hash::<V>::update(self, data);
    }
}

impl<V: HashVariant> FixedOutput for Hash<V> {
    fn finalize_into(mut self, out: &mut Output<Self>) {
        out.copy_from_slice(&Hash::<V>::finalize(&mut self));
    }
}

impl<V: HashVariant> Reset for Hash<V> {
    fn reset(&mut self) {
        self.reinit();
    }
}

impl<V: HashVariant> FixedOutputReset for Hash<V> {
    fn finalize_into_reset(&mut self, out: &mut Output<Self>) {
        out.copy_from_slice(&Hash::<V>::finalize(self));
        self.reinit();
    }
}

/// The output side of an [`Xof`], returned by [`ExtendableOutput::finalize_xof`].
pub struct XofOutput<V: HashVariant> {
    xof: Xof<V>,
}

impl<V: HashVariant> Clone for XofOutput<V> {
    fn clone(&self) -> Self {
        Self {
            xof: self.xof.clone(),
        }
    }
}

impl<V: HashVariant> XofReader for XofOutput<V> {
    fn read(&mut self, buffer: &mut [u8]) {
        self.xof.squeeze(buffer);
    }
}

impl<V: HashVariant> HashMarker for Xof<V> {}

impl<V: HashVariant> Update for Xof<V> {
    fn update(&mut self, data: &[u8]) {
        self.absorb(data);
    }
}

impl<V: HashVariant> Reset for Xof<V> {
    fn reset(&mut self) {
        self.reinit();
    }
}

impl<V: HashVariant> ExtendableOutput for Xof<V> {
    type Reader = XofOutput<V>;

    fn finalize_xof(self) -> Self::Reader {
        XofOutput { xof: self }
    }
}

impl<V: HashVariant> ExtendableOutputReset for Xof<V> {
    fn finalize_xof_reset(&mut self) -> Self::Reader {
        let reader = XofOutput { xof: self.clone() };
        self.reinit();
        reader
    }
}

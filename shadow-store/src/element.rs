//! Fixed-size little-endian element codec.
//!
//! The cache file stores raw source bytes; views decode them with this trait.

use std::fmt;

/// A plain value with a fixed little-endian byte representation.
pub trait Element: Copy + Send + Sync + PartialEq + fmt::Debug + 'static {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Decodes one value from the first `SIZE` bytes of `bytes`.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encodes the value into the first `SIZE` bytes of `out`.
    fn write_le(self, out: &mut [u8]);
}

macro_rules! impl_element {
    ($($t:ty),* $(,)?) => {
        $(
            impl Element for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    <$t>::from_le_bytes(raw)
                }

                fn write_le(self, out: &mut [u8]) {
                    out[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_element!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Decodes every complete element in `bytes`.
pub fn decode_all<E: Element>(bytes: &[u8]) -> Vec<E> {
    bytes.chunks_exact(E::SIZE).map(E::read_le).collect()
}

/// Encodes `values` back to back.
pub fn encode_all<E: Element>(values: &[E]) -> Vec<u8> {
    let mut out = vec![0u8; values.len() * E::SIZE];
    for (value, chunk) in values.iter().zip(out.chunks_exact_mut(E::SIZE)) {
        value.write_le(chunk);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(<u8 as Element>::SIZE, 1);
        assert_eq!(<i16 as Element>::SIZE, 2);
        assert_eq!(<f32 as Element>::SIZE, 4);
        assert_eq!(<f64 as Element>::SIZE, 8);
    }

    #[test]
    fn test_f32_layout_is_little_endian() {
        let bytes = encode_all(&[1.0f32]);
        assert_eq!(bytes, 1.0f32.to_le_bytes().to_vec());
    }

    #[test]
    fn test_decode_ignores_trailing_partial() {
        let mut bytes = encode_all(&[7i32, -3]);
        bytes.push(0xff);
        assert_eq!(decode_all::<i32>(&bytes), vec![7, -3]);
    }
}

//! Byte encoding of node payloads.
//!
//! Payloads live in the arena as flat little-endian bytes with a fixed
//! per-type stride. [`Payload`] is the codec a Rust type implements to be
//! stored there; the store never reinterprets memory in place.

use strand_core::{NodeId, Status, TypeTag};

/// A fixed-size value that can be stored as a node payload element.
///
/// # Examples
///
/// ```
/// use strand_arena::Payload;
///
/// #[derive(Debug, PartialEq)]
/// struct Weight {
///     value: f32,
///     enabled: bool,
/// }
///
/// impl Payload for Weight {
///     const SIZE: usize = 5;
///
///     fn encode(&self, out: &mut [u8]) {
///         self.value.encode(&mut out[0..4]);
///         self.enabled.encode(&mut out[4..5]);
///     }
///
///     fn decode(bytes: &[u8]) -> Self {
///         Self {
///             value: f32::decode(&bytes[0..4]),
///             enabled: bool::decode(&bytes[4..5]),
///         }
///     }
/// }
///
/// let mut buf = [0u8; Weight::SIZE];
/// Weight { value: 0.5, enabled: true }.encode(&mut buf);
/// assert_eq!(Weight::decode(&buf), Weight { value: 0.5, enabled: true });
/// ```
pub trait Payload: Sized {
    /// Encoded size of one element in bytes.
    const SIZE: usize;

    /// Write `self` into the first [`SIZE`](Self::SIZE) bytes of `out`.
    fn encode(&self, out: &mut [u8]);

    /// Read a value from the first [`SIZE`](Self::SIZE) bytes of `bytes`.
    fn decode(bytes: &[u8]) -> Self;
}

macro_rules! impl_le_payload {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Payload for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn encode(&self, out: &mut [u8]) {
                    out[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn decode(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(&bytes[..Self::SIZE]);
                    <$ty>::from_le_bytes(buf)
                }
            }
        )*
    };
}

impl_le_payload!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl Payload for () {
    const SIZE: usize = 0;

    fn encode(&self, _out: &mut [u8]) {}

    fn decode(_bytes: &[u8]) -> Self {}
}

impl Payload for bool {
    const SIZE: usize = 1;

    fn encode(&self, out: &mut [u8]) {
        out[0] = u8::from(*self);
    }

    fn decode(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

impl Payload for NodeId {
    const SIZE: usize = 4;

    fn encode(&self, out: &mut [u8]) {
        self.0.encode(out);
    }

    fn decode(bytes: &[u8]) -> Self {
        NodeId(i32::decode(bytes))
    }
}

impl Payload for TypeTag {
    const SIZE: usize = 2;

    fn encode(&self, out: &mut [u8]) {
        self.0.encode(out);
    }

    fn decode(bytes: &[u8]) -> Self {
        TypeTag(u16::decode(bytes))
    }
}

impl Payload for Status {
    const SIZE: usize = 1;

    fn encode(&self, out: &mut [u8]) {
        out[0] = match self {
            Status::Success => 0,
            Status::Failure => 1,
            Status::Running => 2,
        };
    }

    fn decode(bytes: &[u8]) -> Self {
        match bytes[0] {
            0 => Status::Success,
            1 => Status::Failure,
            _ => Status::Running,
        }
    }
}

impl<T: Payload, const N: usize> Payload for [T; N] {
    const SIZE: usize = T::SIZE * N;

    fn encode(&self, out: &mut [u8]) {
        for (i, item) in self.iter().enumerate() {
            item.encode(&mut out[i * T::SIZE..]);
        }
    }

    fn decode(bytes: &[u8]) -> Self {
        std::array::from_fn(|i| T::decode(&bytes[i * T::SIZE..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: Payload>(value: &T) -> T {
        let mut buf = vec![0u8; T::SIZE];
        value.encode(&mut buf);
        T::decode(&buf)
    }

    #[test]
    fn primitives_are_little_endian() {
        let mut buf = [0u8; 4];
        0x0102_0304u32.encode(&mut buf);
        assert_eq!(buf, [4, 3, 2, 1]);
    }

    #[test]
    fn node_id_and_status() {
        assert_eq!(round_trip(&NodeId(42)), NodeId(42));
        assert_eq!(round_trip(&NodeId::INVALID), NodeId::INVALID);
        assert_eq!(round_trip(&Status::Running), Status::Running);
    }

    #[test]
    fn arrays_use_element_stride() {
        assert_eq!(<[f32; 3]>::SIZE, 12);
        assert_eq!(round_trip(&[1.5f32, -2.0, 3.25]), [1.5, -2.0, 3.25]);
    }

    #[test]
    fn unit_is_zero_sized() {
        assert_eq!(<()>::SIZE, 0);
        round_trip(&());
    }
}

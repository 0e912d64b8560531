//! Little-endian field readers.
//!
//! ACPI tables are little-endian and make no alignment promises, so every
//! read goes through a bounds-checked byte copy rather than a pointer cast.

/// A value that can be read from a little-endian byte slice.
pub trait FromBytes: Sized {
    /// Encoded size of the value in bytes.
    const SIZE: usize;

    /// Reads a value from the start of `data`.
    ///
    /// Returns `None` if `data` is shorter than [`Self::SIZE`].
    fn read_from(data: &[u8]) -> Option<Self>;

    /// Reads a value at `offset` within `data`.
    ///
    /// Returns `None` if the value would extend past the end of `data`.
    fn read_at(data: &[u8], offset: usize) -> Option<Self> {
        Self::read_from(data.get(offset..)?)
    }
}

macro_rules! impl_from_bytes {
    ($($ty:ty),*) => {
        $(
            impl FromBytes for $ty {
                const SIZE: usize = core::mem::size_of::<$ty>();

                fn read_from(data: &[u8]) -> Option<Self> {
                    let raw = data.get(..Self::SIZE)?;
                    let mut buf = [0u8; core::mem::size_of::<$ty>()];
                    buf.copy_from_slice(raw);
                    Some(<$ty>::from_le_bytes(buf))
                }
            }
        )*
    };
}

impl_from_bytes!(u8, u16, u32, u64);

impl<const N: usize> FromBytes for [u8; N] {
    const SIZE: usize = N;

    fn read_from(data: &[u8]) -> Option<Self> {
        data.get(..N)?.try_into().ok()
    }
}

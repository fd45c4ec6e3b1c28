use core::hash::{Hash, Hasher};

mod sealed {
    pub trait Sealed {}
}

/// Payloads that may live in an overlapped [`RawRegion`](crate::RawRegion).
///
/// Implemented for the primitive scalars and for arrays of them: fixed size,
/// no drop glue, every bit pattern written by `new` is read back unchanged.
/// Sealed, because the region relies on these properties for soundness.
///
/// Equality and hashing go through this trait rather than `PartialEq`/`Hash`
/// so that floats behave like values: `NaN` equals `NaN`, and `-0.0` hashes
/// like `0.0` (they compare equal).
pub trait Trivial: Copy + Send + Sync + 'static + sealed::Sealed {
    /// Value equality, reflexive even for `NaN`.
    fn trivial_eq(&self, other: &Self) -> bool;

    /// Hash consistent with [`Trivial::trivial_eq`].
    fn trivial_hash<H: Hasher>(&self, state: &mut H);
}

macro_rules! impl_trivial_exact {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Trivial for $ty {
                #[inline]
                fn trivial_eq(&self, other: &Self) -> bool {
                    self == other
                }

                #[inline]
                fn trivial_hash<H: Hasher>(&self, state: &mut H) {
                    Hash::hash(self, state)
                }
            }
        )*
    };
}

impl_trivial_exact!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char
);

macro_rules! impl_trivial_float {
    ($($ty:ty => $bits:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Trivial for $ty {
                #[inline]
                fn trivial_eq(&self, other: &Self) -> bool {
                    self == other || (self.is_nan() && other.is_nan())
                }

                #[inline]
                fn trivial_hash<H: Hasher>(&self, state: &mut H) {
                    let bits: $bits = if self.is_nan() {
                        <$ty>::NAN.to_bits()
                    } else if *self == 0.0 {
                        0
                    } else {
                        self.to_bits()
                    };
                    Hash::hash(&bits, state)
                }
            }
        )*
    };
}

impl_trivial_float!(f32 => u32, f64 => u64);

impl<T: Trivial, const N: usize> sealed::Sealed for [T; N] {}

impl<T: Trivial, const N: usize> Trivial for [T; N] {
    fn trivial_eq(&self, other: &Self) -> bool {
        self.iter().zip(other).all(|(a, b)| a.trivial_eq(b))
    }

    fn trivial_hash<H: Hasher>(&self, state: &mut H) {
        for item in self {
            item.trivial_hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::{BuildHasher, RandomState};
    use unionize_testhelpers::test;

    fn same_hash<T: Trivial>(a: T, b: T) -> bool {
        let s = RandomState::new();
        let mut ha = s.build_hasher();
        let mut hb = s.build_hasher();
        a.trivial_hash(&mut ha);
        b.trivial_hash(&mut hb);
        ha.finish() == hb.finish()
    }

    #[test]
    fn nan_is_reflexive() {
        assert!(f64::NAN.trivial_eq(&f64::NAN));
        assert!(f32::NAN.trivial_eq(&f32::NAN));
        assert!(!1.0f64.trivial_eq(&f64::NAN));
        assert!(same_hash(f64::NAN, -f64::NAN));
    }

    #[test]
    fn signed_zero_hashes_equally() {
        assert!(0.0f64.trivial_eq(&-0.0));
        assert!(same_hash(0.0f64, -0.0));
        assert!(same_hash(0.0f32, -0.0));
    }

    #[test]
    fn arrays() {
        assert!([1u8, 2, 3].trivial_eq(&[1, 2, 3]));
        assert!(![1u8, 2, 3].trivial_eq(&[1, 2, 4]));
        assert!([f64::NAN; 2].trivial_eq(&[f64::NAN; 2]));
        assert!(same_hash([0.0f32, 1.0], [-0.0, 1.0]));
    }
}

use core::fmt;
use core::mem::{MaybeUninit, align_of, size_of};

use crate::Trivial;

/// Storage shared by all trivially-copyable payloads of a union.
///
/// `W` is a layout witness: a `#[repr(C)]` union with one field per member
/// type, so `RawRegion<W>` is exactly as large and as aligned as the largest
/// member. The region does not know which member it holds; the union's
/// discriminant does, and generated code only reads a member while the
/// discriminant says it was the last one written.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct RawRegion<W: Copy> {
    bytes: MaybeUninit<W>,
}

impl<W: Copy> RawRegion<W> {
    /// A region holding nothing.
    #[inline]
    pub const fn uninit() -> Self {
        RawRegion {
            bytes: MaybeUninit::uninit(),
        }
    }

    /// A region holding `value`.
    ///
    /// Fails to compile if `T` does not fit in `W`.
    #[inline]
    pub fn new<T: Trivial>(value: T) -> Self {
        const {
            assert!(size_of::<T>() <= size_of::<W>(), "member larger than region");
            assert!(align_of::<T>() <= align_of::<W>(), "member more aligned than region");
        }
        let mut bytes = MaybeUninit::<W>::uninit();
        // SAFETY: `T` fits in `W` in size and alignment (checked above), and
        // writing a `Trivial` value has no drop obligations.
        unsafe { bytes.as_mut_ptr().cast::<T>().write(value) };
        RawRegion { bytes }
    }

    /// Reinterpret the region as a `T`.
    ///
    /// # Safety
    ///
    /// The region must have been created by `RawRegion::new::<T>` (or copied
    /// from one that was). Reading any other member type is undefined
    /// behavior: the bytes may be uninitialized.
    #[inline]
    pub unsafe fn read<T: Trivial>(&self) -> T {
        const {
            assert!(size_of::<T>() <= size_of::<W>(), "member larger than region");
            assert!(align_of::<T>() <= align_of::<W>(), "member more aligned than region");
        }
        // SAFETY: the caller guarantees a `T` was written here; size and
        // alignment are checked above.
        unsafe { self.bytes.as_ptr().cast::<T>().read() }
    }
}

impl<W: Copy> fmt::Debug for RawRegion<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawRegion<{} bytes>", size_of::<W>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unionize_testhelpers::test;

    #[derive(Clone, Copy)]
    #[repr(C)]
    #[allow(dead_code)]
    union Witness {
        a: i32,
        b: f64,
        c: [u8; 12],
    }

    #[test]
    fn sized_by_largest_member() {
        assert_eq!(size_of::<RawRegion<Witness>>(), 16);
        assert_eq!(align_of::<RawRegion<Witness>>(), align_of::<f64>());
    }

    #[test]
    fn read_back_is_bit_exact() {
        let r = RawRegion::<Witness>::new(-7i32);
        assert_eq!(unsafe { r.read::<i32>() }, -7);

        let weird_nan = f64::from_bits(0x7ff8_dead_beef_0001);
        let r = RawRegion::<Witness>::new(weird_nan);
        assert_eq!(unsafe { r.read::<f64>() }.to_bits(), 0x7ff8_dead_beef_0001);

        let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let r = RawRegion::<Witness>::new(bytes);
        let copy = r;
        assert_eq!(unsafe { copy.read::<[u8; 12]>() }, bytes);
    }
}

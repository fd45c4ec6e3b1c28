use core::any::{Any, type_name};
use core::fmt;

/// Storage shared by all reference payloads of a union: one owned,
/// type-erased heap handle, downcast on read.
pub struct RefSlot {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl RefSlot {
    /// Store `value`.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        RefSlot {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Borrow the payload if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Take the payload back if it is a `T`.
    pub fn into_inner<T: Any>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        match self.value.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(value) => Err(RefSlot { value, type_name }),
        }
    }

    /// Clone the payload into a fresh slot, assuming it is a `T`.
    pub fn clone_as<T: Any + Send + Sync + Clone>(&self) -> Option<Self> {
        self.downcast_ref::<T>().map(|v| RefSlot::new(v.clone()))
    }

    /// Name of the stored type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for RefSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefSlot")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unionize_testhelpers::test;

    #[test]
    fn downcasts_to_the_stored_type_only() {
        let slot = RefSlot::new(String::from("hi"));
        assert_eq!(slot.downcast_ref::<String>().map(String::as_str), Some("hi"));
        assert!(slot.downcast_ref::<Vec<u8>>().is_none());
        assert_eq!(slot.type_name(), type_name::<String>());
    }

    #[test]
    fn clone_and_take() {
        let slot = RefSlot::new(vec![1u8, 2, 3]);
        let copy = slot.clone_as::<Vec<u8>>().unwrap();
        assert!(slot.clone_as::<String>().is_none());
        let slot = slot.into_inner::<String>().unwrap_err();
        assert_eq!(slot.into_inner::<Vec<u8>>().unwrap(), [1, 2, 3]);
        assert_eq!(copy.downcast_ref::<Vec<u8>>().unwrap(), &[1, 2, 3]);
    }
}

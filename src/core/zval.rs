//! Value holders
//!
//! A [`Zval`] is the box every variable slot, array entry and argument
//! lives in. The aliasing mode is carried on the handle itself:
//!
//! - [`Alias::Owned`]: the holder is the only name for its storage
//! - [`Alias::Shared`]: the holder is a PHP reference (`&$a`); every shared
//!   handle to the same slot observes writes made through the others
//!
//! Reference: $PHP_SRC_PATH/Zend/zend_types.h - zval / zend_reference

use crate::core::convert::precision_of;
use crate::core::value::{Val, ValType};
use crate::runtime::error::EngineError;
use crate::runtime::global::Config;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alias {
    #[default]
    Owned,
    Shared,
}

#[derive(Debug)]
pub struct Zval {
    slot: Rc<RefCell<Val>>,
    alias: Alias,
}

impl Zval {
    pub fn new(value: Val) -> Self {
        Self {
            slot: Rc::new(RefCell::new(value)),
            alias: Alias::Owned,
        }
    }

    pub fn null() -> Self {
        Self::new(Val::Null)
    }

    pub fn value(&self) -> Val {
        self.slot.borrow().clone()
    }

    pub fn get_type(&self) -> ValType {
        self.slot.borrow().get_type()
    }

    /// Write through the slot. Visible to every handle sharing it.
    pub fn set(&self, value: Val) {
        *self.slot.borrow_mut() = value;
    }

    pub fn alias(&self) -> Alias {
        self.alias
    }

    pub fn is_ref(&self) -> bool {
        self.alias == Alias::Shared
    }

    /// By-reference handle onto the same storage.
    pub fn share(&self) -> Zval {
        Zval {
            slot: Rc::clone(&self.slot),
            alias: Alias::Shared,
        }
    }

    /// Owned holder with independent storage.
    pub fn duplicate(&self) -> Zval {
        Zval::new(self.slot.borrow().duplicate())
    }

    /// The stored holder itself, tag unchanged. Only for handing out the
    /// entry a container or scope already owns.
    pub(crate) fn binding(&self) -> Zval {
        Zval {
            slot: Rc::clone(&self.slot),
            alias: self.alias,
        }
    }

    pub fn ptr_eq(&self, other: &Zval) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }

    pub fn to_bool(&self) -> bool {
        self.slot.borrow().to_bool()
    }

    /// Convert into a fresh holder of type `target`.
    pub fn as_type(&self, target: ValType, config: &Config) -> Result<Zval, EngineError> {
        let converted = self.slot.borrow().as_type(target, precision_of(config))?;
        Ok(Zval::new(converted))
    }
}

/// A clone is a second name for the same slot, so it is tagged `Shared`.
impl Clone for Zval {
    fn clone(&self) -> Self {
        self.share()
    }
}

impl Default for Zval {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Val> for Zval {
    fn from(value: Val) -> Self {
        Zval::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_observes_writes() {
        let a = Zval::new(Val::Int(1));
        let b = a.share();
        b.set(Val::Int(2));
        assert_eq!(a.value(), Val::Int(2));
        assert!(b.is_ref());
        assert!(!a.is_ref());
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_duplicate_is_independent() {
        let a = Zval::new(Val::Int(1));
        let b = a.share();
        let c = a.duplicate();
        c.set(Val::Int(9));
        assert_eq!(a.value(), Val::Int(1));
        assert_eq!(b.value(), Val::Int(1));
        assert_eq!(c.alias(), Alias::Owned);
    }

    #[test]
    fn test_clone_is_tagged_shared() {
        let a = Zval::new(Val::Int(1));
        let b = a.clone();
        assert_eq!(b.alias(), Alias::Shared);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.binding().alias(), Alias::Owned);
    }
}

//! Ordered associative container
//!
//! Backs both language-level arrays and scope symbol tables.
//!
//! - Insertion order is preserved for iteration
//! - `next_free` tracks the next automatic integer key
//! - [`PhpArray`] is a handle: `duplicate` gives independent storage,
//!   `share` gives a handle onto the same storage
//!
//! Reference: $PHP_SRC_PATH/Zend/zend_hash.c

use crate::core::value::Val;
use crate::core::zval::{Alias, Zval};
use crate::runtime::error::EngineError;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum ArrayKey {
    Int(i64),
    Str(Rc<Vec<u8>>),
}

impl ArrayKey {
    /// Canonical decimal strings become integer keys, as with `$a["5"]`.
    /// Reference: $PHP_SRC_PATH/Zend/zend_hash.h - ZEND_HANDLE_NUMERIC_STR
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match canonical_int(bytes) {
            Some(i) => ArrayKey::Int(i),
            None => ArrayKey::Str(Rc::new(bytes.to_vec())),
        }
    }

    pub fn to_val(&self) -> Val {
        match self {
            ArrayKey::Int(i) => Val::Int(*i),
            ArrayKey::Str(s) => Val::String(Rc::clone(s)),
        }
    }
}

fn canonical_int(bytes: &[u8]) -> Option<i64> {
    let digits = bytes.strip_prefix(b"-").unwrap_or(bytes);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    // no leading zeros, and "-0" stays a string
    if digits.len() > 1 && digits[0] == b'0' {
        return None;
    }
    if digits == b"0" && bytes.len() != digits.len() {
        return None;
    }
    std::str::from_utf8(bytes).ok()?.parse::<i64>().ok()
}

impl From<i64> for ArrayKey {
    fn from(i: i64) -> Self {
        ArrayKey::Int(i)
    }
}

impl From<&str> for ArrayKey {
    fn from(s: &str) -> Self {
        ArrayKey::from_bytes(s.as_bytes())
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{}", i),
            ArrayKey::Str(s) => write!(f, "{}", String::from_utf8_lossy(s)),
        }
    }
}

/// Array storage with cached metadata
/// Reference: $PHP_SRC_PATH/Zend/zend_hash.h - HashTable::nNextFreeElement
#[derive(Debug, Default)]
pub struct ArrayData {
    map: IndexMap<ArrayKey, Zval>,
    next_free: i64,
}

impl ArrayData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace, keeping `next_free` ahead of every integer key
    /// Reference: $PHP_SRC_PATH/Zend/zend_hash.c - _zend_hash_index_add_or_update_i
    pub fn insert(&mut self, key: ArrayKey, value: Zval) -> Option<Zval> {
        if let ArrayKey::Int(i) = key
            && i >= self.next_free
        {
            self.next_free = i.saturating_add(1);
        }
        self.map.insert(key, value)
    }

    /// Append at the next automatic index
    /// Reference: $PHP_SRC_PATH/Zend/zend_hash.c - zend_hash_next_index_insert
    pub fn push(&mut self, value: Zval) -> Result<ArrayKey, EngineError> {
        let key = ArrayKey::Int(self.next_free);
        if self.map.contains_key(&key) {
            return Err(EngineError::NextElementOccupied);
        }
        self.insert(key.clone(), value);
        Ok(key)
    }

    pub fn get(&self, key: &ArrayKey) -> Option<&Zval> {
        self.map.get(key)
    }

    pub fn contains_key(&self, key: &ArrayKey) -> bool {
        self.map.contains_key(key)
    }

    /// Remove preserving the order of the remaining entries.
    /// `next_free` is never rewound.
    pub fn remove(&mut self, key: &ArrayKey) -> Option<Zval> {
        self.map.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn next_index(&self) -> i64 {
        self.next_free
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Zval)> {
        self.map.iter()
    }

    /// Deep copy. Entries that are references stay aliased, like PHP does
    /// for `&` slots inside a copied array.
    pub fn duplicate(&self) -> ArrayData {
        let map = self
            .map
            .iter()
            .map(|(k, v)| {
                let entry = if v.is_ref() { v.share() } else { v.duplicate() };
                (k.clone(), entry)
            })
            .collect();
        ArrayData {
            map,
            next_free: self.next_free,
        }
    }
}

/// Handle to container storage.
#[derive(Debug)]
pub struct PhpArray {
    data: Rc<RefCell<ArrayData>>,
    alias: Alias,
}

/// A clone names the same storage, so it is tagged `Shared`.
/// Use [`PhpArray::duplicate`] for an independent container.
impl Clone for PhpArray {
    fn clone(&self) -> Self {
        self.share()
    }
}

impl PhpArray {
    pub fn new() -> Self {
        Self::from_data(ArrayData::new())
    }

    pub fn from_data(data: ArrayData) -> Self {
        Self {
            data: Rc::new(RefCell::new(data)),
            alias: Alias::Owned,
        }
    }

    /// Build a list (keys 0..n) from values
    pub fn from_values<I: IntoIterator<Item = Val>>(values: I) -> Self {
        let mut data = ArrayData::new();
        for (i, v) in values.into_iter().enumerate() {
            data.insert(ArrayKey::Int(i as i64), Zval::new(v));
        }
        Self::from_data(data)
    }

    pub fn exists(&self, key: &ArrayKey) -> bool {
        self.data.borrow().contains_key(key)
    }

    /// Entry holder, or a fresh null holder when the key is absent.
    pub fn get(&self, key: &ArrayKey) -> Zval {
        self.lookup(key).unwrap_or_default()
    }

    pub fn lookup(&self, key: &ArrayKey) -> Option<Zval> {
        self.data.borrow().get(key).map(Zval::binding)
    }

    /// `$a[$key] = v`, or `$a[] = v` when `key` is `None`
    pub fn set(&self, key: Option<ArrayKey>, value: Zval) -> Result<(), EngineError> {
        let mut data = self.data.borrow_mut();
        match key {
            Some(k) => {
                data.insert(k, value);
            }
            None => {
                data.push(value)?;
            }
        }
        Ok(())
    }

    pub fn push(&self, value: Zval) -> Result<ArrayKey, EngineError> {
        self.data.borrow_mut().push(value)
    }

    pub fn unset(&self, key: &ArrayKey) {
        self.data.borrow_mut().remove(key);
    }

    pub fn count(&self) -> i64 {
        self.data.borrow().len() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    pub fn next_index(&self) -> i64 {
        self.data.borrow().next_index()
    }

    /// Single-pass iterator over the entries as they are right now.
    pub fn new_iterator(&self) -> ArrayIter {
        let entries: Vec<(ArrayKey, Zval)> = self
            .data
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.binding()))
            .collect();
        ArrayIter {
            inner: entries.into_iter(),
        }
    }

    pub fn keys(&self) -> Vec<ArrayKey> {
        self.data.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    /// Handle onto the same backing storage.
    pub fn share(&self) -> PhpArray {
        PhpArray {
            data: Rc::clone(&self.data),
            alias: Alias::Shared,
        }
    }

    /// Independent copy of the storage.
    pub fn duplicate(&self) -> PhpArray {
        PhpArray::from_data(self.data.borrow().duplicate())
    }

    pub fn alias(&self) -> Alias {
        self.alias
    }

    pub fn is_shared(&self) -> bool {
        self.alias == Alias::Shared
    }

    pub fn ptr_eq(&self, other: &PhpArray) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl Default for PhpArray {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PhpArray {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let a = self.data.borrow();
        let b = other.data.borrow();
        a.len() == b.len()
            && a.iter()
                .all(|(k, v)| b.get(k).is_some_and(|w| v.value() == w.value()))
    }
}

/// Snapshot iterator; later writes to the container are not observed.
#[derive(Debug)]
pub struct ArrayIter {
    inner: std::vec::IntoIter<(ArrayKey, Zval)>,
}

impl Iterator for ArrayIter {
    type Item = (ArrayKey, Zval);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ArrayIter {}

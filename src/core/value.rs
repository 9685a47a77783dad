use crate::core::array::PhpArray;
use crate::core::zval::Zval;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Type tag of a runtime value.
/// Reference: $PHP_SRC_PATH/Zend/zend_types.h - IS_NULL .. IS_RESOURCE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValType {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
    Resource,
}

impl fmt::Display for ValType {
    /// Names as reported by `gettype()`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValType::Null => "NULL",
            ValType::Bool => "boolean",
            ValType::Int => "integer",
            ValType::Float => "double",
            ValType::String => "string",
            ValType::Array => "array",
            ValType::Object => "object",
            ValType::Resource => "resource",
        };
        f.write_str(name)
    }
}

/// Opaque receiver handle supplied by the class runtime.
#[derive(Clone)]
pub struct ObjectRef(Rc<dyn Any>);

impl ObjectRef {
    pub fn new<T: Any>(inner: T) -> Self {
        Self(Rc::new(inner))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Opaque resource handle (streams, connections, ...), identified by id.
#[derive(Clone)]
pub struct ResourceRef {
    id: i64,
    inner: Rc<dyn Any>,
}

impl ResourceRef {
    pub fn new<T: Any>(id: i64, inner: T) -> Self {
        Self {
            id,
            inner: Rc::new(inner),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource id #{}", self.id)
    }
}

#[derive(Debug, Clone)]
pub enum Val {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Rc<Vec<u8>>), // PHP strings are byte arrays
    Array(PhpArray),
    Object(ObjectRef),
    Resource(ResourceRef),
}

impl PartialEq for Val {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Val::Null, Val::Null) => true,
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Int(a), Val::Int(b)) => a == b,
            (Val::Float(a), Val::Float(b)) => a == b,
            (Val::String(a), Val::String(b)) => a == b,
            (Val::Array(a), Val::Array(b)) => a == b,
            (Val::Object(a), Val::Object(b)) => a.ptr_eq(b),
            (Val::Resource(a), Val::Resource(b)) => Rc::ptr_eq(&a.inner, &b.inner),
            _ => false,
        }
    }
}

impl Val {
    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Val::String(Rc::new(bytes.into()))
    }

    pub fn get_type(&self) -> ValType {
        match self {
            Val::Null => ValType::Null,
            Val::Bool(_) => ValType::Bool,
            Val::Int(_) => ValType::Int,
            Val::Float(_) => ValType::Float,
            Val::String(_) => ValType::String,
            Val::Array(_) => ValType::Array,
            Val::Object(_) => ValType::Object,
            Val::Resource(_) => ValType::Resource,
        }
    }

    /// Short names used in diagnostics (`get_debug_type()` style)
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Null => "null",
            Val::Bool(_) => "bool",
            Val::Int(_) => "int",
            Val::Float(_) => "float",
            Val::String(_) => "string",
            Val::Array(_) => "array",
            Val::Object(_) => "object",
            Val::Resource(_) => "resource",
        }
    }

    /// Wrap into a fresh, owned holder.
    pub fn into_zval(self) -> Zval {
        Zval::new(self)
    }

    /// Copy-on-assign: arrays get independent storage, everything else is
    /// already immutable and just cloned.
    pub fn duplicate(&self) -> Val {
        match self {
            Val::Array(arr) => Val::Array(arr.duplicate()),
            other => other.clone(),
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Val::String(s) => Some(s.as_slice()),
            _ => None,
        }
    }
}

impl From<bool> for Val {
    fn from(b: bool) -> Self {
        Val::Bool(b)
    }
}

impl From<i64> for Val {
    fn from(i: i64) -> Self {
        Val::Int(i)
    }
}

impl From<f64> for Val {
    fn from(f: f64) -> Self {
        Val::Float(f)
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Self {
        Val::string(s.as_bytes())
    }
}

impl From<String> for Val {
    fn from(s: String) -> Self {
        Val::string(s.into_bytes())
    }
}

impl From<PhpArray> for Val {
    fn from(arr: PhpArray) -> Self {
        Val::Array(arr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gettype_names() {
        assert_eq!(ValType::Null.to_string(), "NULL");
        assert_eq!(ValType::Bool.to_string(), "boolean");
        assert_eq!(ValType::Float.to_string(), "double");
        assert_eq!(Val::Int(3).get_type(), ValType::Int);
    }

    #[test]
    fn test_duplicate_breaks_array_sharing() {
        let arr = PhpArray::new();
        arr.push(Val::Int(1).into_zval()).unwrap();
        let original = Val::Array(arr.clone());
        let copy = original.duplicate();

        arr.push(Val::Int(2).into_zval()).unwrap();

        match copy {
            Val::Array(c) => assert_eq!(c.count(), 1),
            other => panic!("Expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_object_identity() {
        let a = ObjectRef::new(5u8);
        let b = a.clone();
        assert_eq!(Val::Object(a), Val::Object(b));
        assert_ne!(Val::Object(ObjectRef::new(5u8)), Val::Object(ObjectRef::new(5u8)));
    }
}

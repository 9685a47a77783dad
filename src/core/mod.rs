pub mod array;
pub mod convert;
pub mod value;
pub mod zval;

//! PHP type juggling
//!
//! The coercion matrix between the dynamic types. Every conversion is pure
//! except float-to-string, which reads the `precision` setting.
//!
//! ### To Boolean
//! - Falsy: false, 0, 0.0, "", "0", null, empty arrays
//! - Truthy: everything else
//!
//! ### To Integer
//! - Floats truncated toward zero; NaN and infinities give 0, out-of-range
//!   values wrap modulo 2^64
//! - Strings use their leading numeric prefix ("12abc" → 12)
//!
//! ### To String
//! - true → "1", false → "", null → ""
//! - Floats use `%.{precision}G` with PHP spelling (`1.0E+25`)
//! - Arrays → "Array"
//!
//! Object and resource targets are owned by the class runtime and are
//! rejected with [`EngineError::ConversionUnsupported`].
//!
//! Reference: $PHP_SRC_PATH/Zend/zend_operators.c

use crate::core::array::PhpArray;
use crate::core::value::{Val, ValType};
use crate::runtime::error::EngineError;
use crate::runtime::global::Config;

pub const DEFAULT_PRECISION: i64 = 14;

/// Significant digits used when `precision` is -1 (shortest round trip).
const SHORTEST_THRESHOLD: usize = 17;
const MAX_PRECISION: usize = 320;

/// Effective float precision from configuration
pub fn precision_of(config: &Config) -> i64 {
    config
        .get_config("precision", Val::Int(DEFAULT_PRECISION))
        .to_int()
}

impl Val {
    /// Convert to `target` following the loose-typing rules.
    pub fn as_type(&self, target: ValType, precision: i64) -> Result<Val, EngineError> {
        let unsupported = || EngineError::ConversionUnsupported {
            from: self.get_type(),
            to: target,
        };

        match target {
            ValType::Null => Ok(Val::Null),
            ValType::Bool => Ok(Val::Bool(self.to_bool())),
            ValType::Int => match self {
                Val::Object(_) => Err(unsupported()),
                _ => Ok(Val::Int(self.to_int())),
            },
            ValType::Float => match self {
                Val::Object(_) => Err(unsupported()),
                _ => Ok(Val::Float(self.to_float())),
            },
            ValType::String => match self {
                Val::Object(_) => Err(unsupported()),
                _ => Ok(Val::string(self.to_php_string_bytes(precision))),
            },
            ValType::Array => match self {
                Val::Null => Ok(Val::Array(PhpArray::new())),
                Val::Array(arr) => Ok(Val::Array(arr.duplicate())),
                Val::Object(_) => Err(unsupported()),
                scalar => Ok(Val::Array(PhpArray::from_values([scalar.clone()]))),
            },
            ValType::Object | ValType::Resource => Err(unsupported()),
        }
    }

    /// Convenience wrapper reading precision from `config`
    pub fn convert(&self, target: ValType, config: &Config) -> Result<Val, EngineError> {
        self.as_type(target, precision_of(config))
    }

    /// Truthiness; the single source of truth for control flow.
    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zend_is_true
    pub fn to_bool(&self) -> bool {
        match self {
            Val::Null => false,
            Val::Bool(b) => *b,
            Val::Int(i) => *i != 0,
            Val::Float(f) => *f != 0.0,
            Val::String(s) => !(s.is_empty() || s.as_slice() == b"0"),
            Val::Array(arr) => !arr.is_empty(),
            Val::Object(_) | Val::Resource(_) => true,
        }
    }

    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zval_get_long
    pub fn to_int(&self) -> i64 {
        match self {
            Val::Null => 0,
            Val::Bool(b) => *b as i64,
            Val::Int(i) => *i,
            Val::Float(f) => float_to_int(*f),
            Val::String(s) => match parse_numeric_prefix(s) {
                Some(Numeric::Int(i)) => i,
                Some(Numeric::Float(f)) => float_to_int(f),
                Some(Numeric::Overflow(f)) => {
                    if f < 0.0 {
                        i64::MIN
                    } else {
                        i64::MAX
                    }
                }
                None => 0,
            },
            Val::Array(arr) => !arr.is_empty() as i64,
            Val::Object(_) => 1,
            Val::Resource(r) => r.id(),
        }
    }

    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zval_get_double
    pub fn to_float(&self) -> f64 {
        match self {
            Val::Null => 0.0,
            Val::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Val::Int(i) => *i as f64,
            Val::Float(f) => *f,
            Val::String(s) => match parse_numeric_prefix(s) {
                Some(Numeric::Int(i)) => i as f64,
                Some(Numeric::Float(f)) | Some(Numeric::Overflow(f)) => f,
                None => 0.0,
            },
            Val::Array(arr) => {
                if arr.is_empty() {
                    0.0
                } else {
                    1.0
                }
            }
            Val::Object(_) => 1.0,
            Val::Resource(r) => r.id() as f64,
        }
    }

    /// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - zend_make_printable_zval
    pub fn to_php_string_bytes(&self, precision: i64) -> Vec<u8> {
        match self {
            Val::Null => Vec::new(),
            Val::Bool(true) => b"1".to_vec(),
            Val::Bool(false) => Vec::new(),
            Val::Int(i) => i.to_string().into_bytes(),
            Val::Float(f) => format_float(*f, precision).into_bytes(),
            Val::String(s) => s.to_vec(),
            Val::Array(_) => b"Array".to_vec(),
            Val::Object(_) => b"Object".to_vec(),
            Val::Resource(r) => format!("Resource id #{}", r.id()).into_bytes(),
        }
    }
}

/// Result of scanning a string for a leading number
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Numeric {
    Int(i64),
    Float(f64),
    /// Integer-looking text that does not fit in i64
    Overflow(f64),
}

/// Reference: $PHP_SRC_PATH/Zend/zend_operators.c - _is_numeric_string_ex
pub(crate) fn parse_numeric_prefix(s: &[u8]) -> Option<Numeric> {
    let mut i = 0;
    while i < s.len() && matches!(s[i], b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c) {
        i += 1;
    }
    let start = i;
    if i < s.len() && (s[i] == b'+' || s[i] == b'-') {
        i += 1;
    }

    let int_start = i;
    while i < s.len() && s[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;

    let mut is_float = false;
    if i < s.len() && s[i] == b'.' {
        let mut j = i + 1;
        while j < s.len() && s[j].is_ascii_digit() {
            j += 1;
        }
        let frac_digits = j - i - 1;
        if int_digits > 0 || frac_digits > 0 {
            is_float = true;
            i = j;
        }
    }
    if int_digits == 0 && !is_float {
        return None;
    }

    if i < s.len() && (s[i] == b'e' || s[i] == b'E') {
        let mut j = i + 1;
        if j < s.len() && (s[j] == b'+' || s[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < s.len() && s[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            is_float = true;
            i = j;
        }
    }

    let text = std::str::from_utf8(&s[start..i]).ok()?;
    if is_float {
        return text.parse::<f64>().ok().map(Numeric::Float);
    }
    match text.parse::<i64>() {
        Ok(n) => Some(Numeric::Int(n)),
        Err(_) => text.parse::<f64>().ok().map(Numeric::Overflow),
    }
}

/// Truncate toward zero; non-finite gives 0 and out-of-range wraps.
/// Reference: $PHP_SRC_PATH/Zend/zend_operators.h - zend_dval_to_lval
pub(crate) fn float_to_int(f: f64) -> i64 {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

    if !f.is_finite() {
        return 0;
    }
    if (-TWO_POW_63..TWO_POW_63).contains(&f) {
        return f as i64;
    }

    let mut dmod = f.trunc() % TWO_POW_64;
    if dmod < 0.0 {
        if dmod == -TWO_POW_63 {
            return i64::MIN;
        }
        dmod += TWO_POW_64;
    }
    if dmod >= TWO_POW_63 {
        dmod -= TWO_POW_64;
    }
    dmod as i64
}

/// `%.{precision}G` as PHP prints it: trailing zeros dropped, scientific
/// form when the exponent is below -4 or reaches the precision.
/// Reference: $PHP_SRC_PATH/main/snprintf.c - php_gcvt
pub fn format_float(f: f64, precision: i64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let (scientific, ndigit) = if precision < 0 {
        (format!("{:e}", f.abs()), SHORTEST_THRESHOLD)
    } else {
        let ndigit = (precision.max(1) as usize).min(MAX_PRECISION);
        (format!("{:.*e}", ndigit - 1, f.abs()), ndigit)
    };
    let (digits, exponent) = split_scientific(&scientific);

    let mut out = String::with_capacity(digits.len() + 8);
    if f < 0.0 {
        out.push('-');
    }

    let decpt = exponent + 1;
    if decpt < -3 || decpt > ndigit as i32 {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        out.push('.');
        out.push_str(if rest.is_empty() { "0" } else { rest });
        out.push('E');
        out.push(if exponent < 0 { '-' } else { '+' });
        out.push_str(&exponent.unsigned_abs().to_string());
    } else if decpt <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', decpt.unsigned_abs() as usize));
        out.push_str(&digits);
    } else {
        let decpt = decpt as usize;
        if digits.len() <= decpt {
            out.push_str(&digits);
            out.extend(std::iter::repeat_n('0', decpt - digits.len()));
        } else {
            out.push_str(&digits[..decpt]);
            out.push('.');
            out.push_str(&digits[decpt..]);
        }
    }
    out
}

/// "3.3330e-1" → ("3333", -1)
fn split_scientific(s: &str) -> (String, i32) {
    let (mantissa, exponent) = s.split_once('e').unwrap_or((s, "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let trimmed = digits.trim_end_matches('0');
    let digits = if trimmed.is_empty() { "0" } else { trimmed };
    (digits.to_string(), exponent.parse().unwrap_or(0))
}

use std::fmt;

use bstr::BStr;

/// A single field handed to an encoder.
///
/// Anything that converts into a `Value` can be written: strings, byte
/// strings, integers, floats, booleans and `Option`s of those. Each variant
/// is rendered to text when a record is written:
///
/// * `Text` and `Bytes` are written as is (with quoting as needed).
/// * Integers are written in decimal.
/// * Floats are written in their shortest round-tripping form. NaN and the
///   infinities have no representation and are reported as an error.
/// * `true` is written as `1`. `false` and `Null` are written as an empty
///   field.
#[derive(Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// An absent value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A floating point number.
    Float(f64),
    /// UTF-8 text.
    Text(&'a str),
    /// Arbitrary bytes.
    Bytes(&'a [u8]),
}

impl<'a> fmt::Debug for Value<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({:?})", b),
            Value::Int(n) => write!(f, "Int({:?})", n),
            Value::UInt(n) => write!(f, "UInt({:?})", n),
            Value::Float(n) => write!(f, "Float({:?})", n),
            Value::Text(s) => write!(f, "Text({:?})", s),
            Value::Bytes(b) => write!(f, "Bytes({:?})", BStr::new(b)),
        }
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Value<'a> {
        Value::Text(s)
    }
}

impl<'a, 'b> From<&'b &'a str> for Value<'a> {
    fn from(s: &'b &'a str) -> Value<'a> {
        Value::Text(s)
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(s: &'a String) -> Value<'a> {
        Value::Text(s)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(b: &'a [u8]) -> Value<'a> {
        Value::Bytes(b)
    }
}

impl<'a> From<&'a Vec<u8>> for Value<'a> {
    fn from(b: &'a Vec<u8>) -> Value<'a> {
        Value::Bytes(b)
    }
}

impl<'a> From<bool> for Value<'a> {
    fn from(b: bool) -> Value<'a> {
        Value::Bool(b)
    }
}

impl<'a> From<f64> for Value<'a> {
    fn from(n: f64) -> Value<'a> {
        Value::Float(n)
    }
}

impl<'a> From<f32> for Value<'a> {
    fn from(n: f32) -> Value<'a> {
        Value::Float(f64::from(n))
    }
}

impl<'a, 'b> From<&'b Value<'a>> for Value<'a> {
    fn from(v: &'b Value<'a>) -> Value<'a> {
        *v
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(v: Option<T>) -> Value<'a> {
        match v {
            None => Value::Null,
            Some(v) => v.into(),
        }
    }
}

macro_rules! from_int {
    ($variant:ident, $wide:ty, $($ty:ty),*) => {
        $(
            impl<'a> From<$ty> for Value<'a> {
                fn from(n: $ty) -> Value<'a> {
                    Value::$variant(n as $wide)
                }
            }
        )*
    };
}

from_int!(Int, i64, i8, i16, i32, i64, isize);
from_int!(UInt, u64, u8, u16, u32, u64, usize);

/// Renders a value's text into `buf`, returning the bytes to write.
///
/// Returns `None` for non-finite floats.
pub(crate) fn render<'v>(
    value: &Value<'v>,
    buf: &'v mut Buffers,
) -> Option<&'v [u8]> {
    match *value {
        Value::Null | Value::Bool(false) => Some(&b""[..]),
        Value::Bool(true) => Some(&b"1"[..]),
        Value::Int(n) => Some(buf.int.format(n).as_bytes()),
        Value::UInt(n) => Some(buf.int.format(n).as_bytes()),
        Value::Float(n) if n.is_finite() => {
            Some(buf.float.format_finite(n).as_bytes())
        }
        Value::Float(_) => None,
        Value::Text(s) => Some(s.as_bytes()),
        Value::Bytes(b) => Some(b),
    }
}

/// Scratch space for rendering numbers.
#[derive(Default)]
pub(crate) struct Buffers {
    int: itoa::Buffer,
    float: ryu::Buffer,
}

impl fmt::Debug for Buffers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Buffers").finish()
    }
}

use std::str;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::assoc::AssocRecord;
use crate::byte_record::ByteRecord;
use crate::string_record::StringRecord;

/// A field that serializes as a string when it is valid UTF-8, and as bytes
/// otherwise.
struct Field<'a>(&'a [u8]);

impl<'a> Serialize for Field<'a> {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        match str::from_utf8(self.0) {
            Ok(s) => ser.serialize_str(s),
            Err(_) => ser.serialize_bytes(self.0),
        }
    }
}

/// Serializes as a sequence of fields.
impl Serialize for ByteRecord {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let mut seq = ser.serialize_seq(Some(self.len()))?;
        for field in self {
            seq.serialize_element(&Field(field))?;
        }
        seq.end()
    }
}

/// Serializes as a sequence of strings.
impl Serialize for StringRecord {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let mut seq = ser.serialize_seq(Some(self.len()))?;
        for field in self {
            seq.serialize_element(field)?;
        }
        seq.end()
    }
}

/// Serializes as a map from column names to values, in column order.
impl Serialize for AssocRecord {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let mut map = ser.serialize_map(Some(self.len()))?;
        for (name, value) in self {
            map.serialize_entry(&Field(name), &Field(value))?;
        }
        map.end()
    }
}

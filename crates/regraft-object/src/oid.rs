use std::fmt;
use std::str::FromStr;

use crate::ObjectError;

/// An object identifier — the SHA-1 hash of an object's serialized form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    /// The null id (all zeros).
    pub const NULL: Self = Self([0u8; 20]);

    /// Create an id from exactly 20 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ObjectError> {
        if bytes.len() != 20 {
            return Err(ObjectError::InvalidId(format!(
                "expected 20 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Create an id from a 40-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, ObjectError> {
        if hex.len() != 40 {
            return Err(ObjectError::InvalidId(format!(
                "expected 40 hex chars, got {}",
                hex.len()
            )));
        }
        let mut bytes = [0u8; 20];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let hi = hex_val(chunk[0])?;
            let lo = hex_val(chunk[1])?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the null (all-zeros) id.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(40);
        for &b in &self.0 {
            s.push(HEX_CHARS[(b >> 4) as usize] as char);
            s.push(HEX_CHARS[(b & 0xf) as usize] as char);
        }
        s
    }

    /// The loose object path component: `"xx/xxxx..."`.
    pub fn loose_path(&self) -> String {
        let hex = self.to_hex();
        format!("{}/{}", &hex[..2], &hex[2..])
    }
}

const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

fn hex_val(c: u8) -> Result<u8, ObjectError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(ObjectError::InvalidId(format!(
            "invalid hex character: {:?}",
            c as char
        ))),
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..8])
    }
}

impl FromStr for ObjectId {
    type Err = ObjectError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn hex_roundtrip() {
        let oid = ObjectId::from_hex(SAMPLE).unwrap();
        assert_eq!(oid.to_hex(), SAMPLE);
        let parsed: ObjectId = SAMPLE.parse().unwrap();
        assert_eq!(parsed, oid);
    }

    #[test]
    fn hex_is_case_insensitive() {
        let lower = ObjectId::from_hex(SAMPLE).unwrap();
        let upper = ObjectId::from_hex(&SAMPLE.to_uppercase()).unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn invalid_hex_rejected() {
        assert!(ObjectId::from_hex("abcd").is_err());
        assert!(ObjectId::from_hex("zz39a3ee5e6b4b0d3255bfef95601890afd80709").is_err());
    }

    #[test]
    fn from_bytes_length_checked() {
        let oid = ObjectId::from_hex(SAMPLE).unwrap();
        assert_eq!(ObjectId::from_bytes(oid.as_bytes()).unwrap(), oid);
        assert!(ObjectId::from_bytes(&[0; 10]).is_err());
    }

    #[test]
    fn null_id() {
        assert!(ObjectId::NULL.is_null());
        assert!(!ObjectId::from_hex(SAMPLE).unwrap().is_null());
    }

    #[test]
    fn debug_shows_short_hash() {
        let oid = ObjectId::from_hex(SAMPLE).unwrap();
        assert_eq!(format!("{:?}", oid), "ObjectId(da39a3ee)");
    }

    #[test]
    fn usable_as_map_key() {
        let oid = ObjectId::from_hex(SAMPLE).unwrap();
        let mut map = HashMap::new();
        map.insert(oid, 1);
        assert_eq!(map.get(&oid), Some(&1));
    }

    #[test]
    fn loose_path_fanout() {
        let oid = ObjectId::from_hex(SAMPLE).unwrap();
        assert_eq!(oid.loose_path(), format!("da/{}", &SAMPLE[2..]));
    }

    #[test]
    fn ordering_is_bytewise() {
        let a = ObjectId::from_hex("0000000000000000000000000000000000000001").unwrap();
        let b = ObjectId::from_hex("0000000000000000000000000000000000000002").unwrap();
        assert!(a < b);
    }
}

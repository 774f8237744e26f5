//! Primitive decoders for the level stream
//!
//! Every read consumes bytes from the front of the stream; there is no
//! seeking. Malformed data is reported as `io::ErrorKind::InvalidData`, a
//! short stream as `io::ErrorKind::UnexpectedEof`.

use crate::savegame::types::{TreeValue, Version};
use std::collections::BTreeMap;
use std::io::{self, Read};

/// Marker byte announcing a full-width "optimized" integer
const OPTIM_SENTINEL: u8 = 0xFF;

/// Real settings trees are a few levels deep
const MAX_TREE_DEPTH: usize = 256;

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// Forward-only cursor over a level stream
pub struct SaveReader<R> {
    inner: R,
}

impl<R: Read> SaveReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn read_array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_bool(&mut self) -> io::Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> io::Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> io::Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> io::Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> io::Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        let got = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        if got != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, stream ended after {}", len, got),
            ));
        }
        Ok(buf)
    }

    /// Discard `len` bytes
    pub fn skip(&mut self, len: usize) -> io::Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    fn read_utf8(&mut self, len: usize) -> io::Result<String> {
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|e| invalid_data(format!("invalid UTF-8 text: {}", e)))
    }

    /// Four little-endian u16: major, minor, build, revision
    pub fn read_full_version(&mut self) -> io::Result<Version> {
        let major = self.read_u16()?;
        let minor = self.read_u16()?;
        let build = self.read_u16()?;
        let revision = self.read_u16()?;
        Ok(Version::new(major, minor, build, revision))
    }

    /// Three optimized u16: major, minor, build (revision is 0)
    pub fn read_short_version(&mut self) -> io::Result<Version> {
        let major = self.read_optim_u16()?;
        let minor = self.read_optim_u16()?;
        let build = self.read_optim_u16()?;
        Ok(Version::new(major, minor, build, 0))
    }

    /// Text with a one-byte length prefix
    pub fn read_string_u8_len(&mut self) -> io::Result<String> {
        let len = self.read_u8()? as usize;
        self.read_utf8(len)
    }

    /// Text with a four-byte length prefix
    pub fn read_string_u32_len(&mut self) -> io::Result<String> {
        let len = self.read_u32()? as usize;
        self.read_utf8(len)
    }

    pub fn read_optim_u16(&mut self) -> io::Result<u16> {
        match self.read_u8()? {
            OPTIM_SENTINEL => self.read_u16(),
            b => Ok(b as u16),
        }
    }

    pub fn read_optim_u32(&mut self) -> io::Result<u32> {
        match self.read_u8()? {
            OPTIM_SENTINEL => self.read_u32(),
            b => Ok(b as u32),
        }
    }

    /// Optional text; a zero presence byte means the value follows
    ///
    /// Absent values come back as an empty string.
    pub fn read_immutable_string(&mut self) -> io::Result<String> {
        if self.read_u8()? != 0 {
            return Ok(String::new());
        }
        let len = self.read_optim_u32()? as usize;
        let text = self.read_utf8(len)?;
        self.skip(1)?;
        Ok(text)
    }

    /// Recursive tagged settings value
    ///
    /// Nesting deeper than `MAX_TREE_DEPTH` is rejected as invalid data.
    pub fn read_tree_value(&mut self) -> io::Result<TreeValue> {
        self.read_tree_value_at(0)
    }

    fn read_tree_value_at(&mut self, depth: usize) -> io::Result<TreeValue> {
        if depth > MAX_TREE_DEPTH {
            return Err(invalid_data("settings tree nested too deeply".to_string()));
        }
        let tag = self.read_u8()?;
        let _any_type_flag = self.read_u8()?;
        match tag {
            0 => Ok(TreeValue::Null),
            1 => Ok(TreeValue::Bool(self.read_bool()?)),
            2 => Ok(TreeValue::Int(self.read_i32()?)),
            3 => Ok(TreeValue::Text(self.read_immutable_string()?)),
            4 => {
                let count = self.read_optim_u32()?;
                let mut items = Vec::new();
                for _ in 0..count {
                    // List entries carry a key slot that is always discarded
                    self.read_immutable_string()?;
                    items.push(self.read_tree_value_at(depth + 1)?);
                }
                Ok(TreeValue::List(items))
            }
            5 => {
                let count = self.read_optim_u32()?;
                let mut map = BTreeMap::new();
                for _ in 0..count {
                    let key = self.read_immutable_string()?;
                    let value = self.read_tree_value_at(depth + 1)?;
                    map.insert(key, value);
                }
                Ok(TreeValue::Map(map))
            }
            other => Err(invalid_data(format!("invalid node type {}", other))),
        }
    }

    /// Consume bytes until `count` consecutive zero bytes have been read
    pub fn skip_until_zero_run(&mut self, count: usize) -> io::Result<()> {
        let mut run = 0;
        while run < count {
            if self.read_u8()? == 0 {
                run += 1;
            } else {
                run = 0;
            }
        }
        Ok(())
    }
}

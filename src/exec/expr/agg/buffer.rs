// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use super::error::{AggError, AggResult};

/// Upper bound for one length-prefixed field. A longer prefix in the input is
/// treated as corruption rather than an allocation request.
const MAX_LEN_PREFIXED: u64 = 1 << 30;

/// Sequential byte writer used by state serialization. Fixed-width primitives
/// are little-endian; variable-length fields carry a u64 length prefix.
pub trait ByteSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> AggResult<()>;

    fn write_u8(&mut self, v: u8) -> AggResult<()> {
        self.write_bytes(&[v])
    }

    fn write_u64_le(&mut self, v: u64) -> AggResult<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    fn write_i64_le(&mut self, v: i64) -> AggResult<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    fn write_f64_le(&mut self, v: f64) -> AggResult<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    fn write_len_prefixed(&mut self, bytes: &[u8]) -> AggResult<()> {
        self.write_u64_le(bytes.len() as u64)?;
        self.write_bytes(bytes)
    }
}

impl ByteSink for Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) -> AggResult<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Sequential byte reader used by state deserialization. No seeking; a short
/// read surfaces as `CorruptState`.
pub trait ByteSource {
    fn read_exact(&mut self, buf: &mut [u8]) -> AggResult<()>;

    /// Returns `None` at end of input.
    fn read_byte(&mut self) -> AggResult<Option<u8>>;

    fn read_u8(&mut self) -> AggResult<u8> {
        self.read_byte()?
            .ok_or_else(|| AggError::corrupt("unexpected end of input"))
    }

    fn read_u64_le(&mut self) -> AggResult<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn read_i64_le(&mut self) -> AggResult<i64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }

    fn read_f64_le(&mut self) -> AggResult<f64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    fn read_len_prefixed(&mut self) -> AggResult<Vec<u8>> {
        let len = self.read_u64_le()?;
        if len > MAX_LEN_PREFIXED {
            return Err(AggError::corrupt(format!(
                "length prefix {len} exceeds limit"
            )));
        }
        let mut buf = vec![0u8; len as usize];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// In-memory byte source over a borrowed slice.
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl ByteSource for SliceReader<'_> {
    fn read_exact(&mut self, buf: &mut [u8]) -> AggResult<()> {
        if self.remaining() < buf.len() {
            return Err(AggError::corrupt(format!(
                "unexpected end of input: need {} bytes, have {}",
                buf.len(),
                self.remaining()
            )));
        }
        buf.copy_from_slice(&self.data[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(())
    }

    fn read_byte(&mut self) -> AggResult<Option<u8>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(Some(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_round_trip() {
        let mut buf = Vec::new();
        buf.write_u8(7).unwrap();
        buf.write_i64_le(-42).unwrap();
        buf.write_f64_le(1.5).unwrap();
        buf.write_len_prefixed(b"abc").unwrap();

        let mut reader = SliceReader::new(&buf);
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert_eq!(reader.read_i64_le().unwrap(), -42);
        assert_eq!(reader.read_f64_le().unwrap(), 1.5);
        assert_eq!(reader.read_len_prefixed().unwrap(), b"abc".to_vec());
        assert_eq!(reader.remaining(), 0);
        assert!(reader.read_byte().unwrap().is_none());
    }

    #[test]
    fn test_truncated_input_is_corrupt() {
        let mut buf = Vec::new();
        buf.write_i64_le(1).unwrap();
        let mut reader = SliceReader::new(&buf[..4]);
        let err = reader.read_i64_le().unwrap_err();
        assert!(matches!(err, AggError::CorruptState(_)));
    }

    #[test]
    fn test_oversized_length_prefix_is_corrupt() {
        let mut buf = Vec::new();
        buf.write_u64_le(u64::MAX).unwrap();
        let mut reader = SliceReader::new(&buf);
        let err = reader.read_len_prefixed().unwrap_err();
        assert!(matches!(err, AggError::CorruptState(_)));
    }
}

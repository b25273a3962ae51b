/***************************************************************************************************
 * Copyright (c) 2020-2022 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all copies or
 * substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * CBOR Writer
 *
 * An append-only mirror of the reader: every `write_*` call appends the canonical-minimal encoding
 * of its argument to an internal buffer. The writer does not validate overall grammar - callers who
 * open a container are trusted to close it - it simply guarantees that what it appends is legal
 * CBOR for the datum given.
 **************************************************************************************************/
#[cfg(feature = "float")]
use half::f16;

use num_bigint::{BigInt, Sign};

use crate::constants::*;
use crate::initial_byte::{self, MajorType};

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// An append-only CBOR encoder.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    bytes: Vec<u8>,
    /// `true` for each currently-open array/map that was opened indefinite-length, so the
    /// matching `write_end_*` knows whether to emit a break code.
    open_indefinite: Vec<bool>,
}

impl Writer {
    pub fn new() -> Writer {
        Writer {
            bytes: Vec::new(),
            open_indefinite: Vec::new(),
        }
    }

    /// The bytes written so far.
    #[inline]
    pub fn encode(&self) -> &[u8] {
        &self.bytes
    }

    /// The bytes written so far, hex-encoded.
    #[inline]
    pub fn encode_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    #[cfg_attr(feature = "trace", trace)]
    pub fn write_uint(&mut self, value: u64) -> &mut Self {
        write_head(&mut self.bytes, MajorType::Uint, value);
        self
    }

    #[cfg_attr(feature = "trace", trace)]
    pub fn write_int(&mut self, value: i64) -> &mut Self {
        if value >= 0 {
            write_head(&mut self.bytes, MajorType::Uint, value as u64);
        } else {
            let magnitude = (-1i128 - value as i128) as u64;
            write_head(&mut self.bytes, MajorType::NInt, magnitude);
        }
        self
    }

    #[cfg_attr(feature = "trace", trace)]
    pub fn write_bignum(&mut self, value: &BigInt) -> &mut Self {
        if value.sign() == Sign::Minus {
            write_head(&mut self.bytes, MajorType::Tag, TAG_BIGNUM_NEGATIVE);
            let magnitude = (-value) - BigInt::from(1u8);
            let (_, bytes) = magnitude.to_bytes_be();
            write_head(&mut self.bytes, MajorType::Bytes, bytes.len() as u64);
            self.bytes.extend_from_slice(&bytes);
        } else {
            write_head(&mut self.bytes, MajorType::Tag, TAG_BIGNUM_UNSIGNED);
            let (_, bytes) = value.to_bytes_be();
            write_head(&mut self.bytes, MajorType::Bytes, bytes.len() as u64);
            self.bytes.extend_from_slice(&bytes);
        }
        self
    }

    #[cfg_attr(feature = "trace", trace)]
    pub fn write_bytestring(&mut self, bytes: &[u8]) -> &mut Self {
        write_head(&mut self.bytes, MajorType::Bytes, bytes.len() as u64);
        self.bytes.extend_from_slice(bytes);
        self
    }

    #[cfg_attr(feature = "trace", trace)]
    pub fn write_textstring(&mut self, text: &str) -> &mut Self {
        let bytes = text.as_bytes();
        write_head(&mut self.bytes, MajorType::Text, bytes.len() as u64);
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Begin an array. `len = None` writes an indefinite-length header; the matching
    /// [`Writer::write_end_array`] then emits a break code.
    #[cfg_attr(feature = "trace", trace)]
    pub fn write_start_array(&mut self, len: Option<u64>) -> &mut Self {
        match len {
            Some(n) => write_head(&mut self.bytes, MajorType::Array, n),
            None => self
                .bytes
                .push(initial_byte::pack(MajorType::Array, PAYLOAD_INDEFINITE)),
        }
        self.open_indefinite.push(len.is_none());
        self
    }

    #[cfg_attr(feature = "trace", trace)]
    pub fn write_end_array(&mut self) -> &mut Self {
        if let Some(true) = self.open_indefinite.pop() {
            self.bytes.push(BREAK);
        }
        self
    }

    /// Begin a map. `len` is the number of key/value *pairs*, not the doubled item count the
    /// reader's frame stack tracks internally. `len = None` writes an indefinite-length header.
    #[cfg_attr(feature = "trace", trace)]
    pub fn write_start_map(&mut self, len: Option<u64>) -> &mut Self {
        match len {
            Some(n) => write_head(&mut self.bytes, MajorType::Map, n),
            None => self
                .bytes
                .push(initial_byte::pack(MajorType::Map, PAYLOAD_INDEFINITE)),
        }
        self.open_indefinite.push(len.is_none());
        self
    }

    #[cfg_attr(feature = "trace", trace)]
    pub fn write_end_map(&mut self) -> &mut Self {
        if let Some(true) = self.open_indefinite.pop() {
            self.bytes.push(BREAK);
        }
        self
    }

    #[cfg_attr(feature = "trace", trace)]
    pub fn write_tag(&mut self, tag: u64) -> &mut Self {
        write_head(&mut self.bytes, MajorType::Tag, tag);
        self
    }

    #[cfg_attr(feature = "trace", trace)]
    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        let info = if value { SIMPLE_TRUE } else { SIMPLE_FALSE };
        self.bytes.push(initial_byte::pack(MajorType::Simple, info));
        self
    }

    #[cfg_attr(feature = "trace", trace)]
    pub fn write_null(&mut self) -> &mut Self {
        self.bytes
            .push(initial_byte::pack(MajorType::Simple, SIMPLE_NULL));
        self
    }

    #[cfg_attr(feature = "trace", trace)]
    pub fn write_undefined(&mut self) -> &mut Self {
        self.bytes
            .push(initial_byte::pack(MajorType::Simple, SIMPLE_UNDEFINED));
        self
    }

    #[cfg(feature = "float")]
    #[cfg_attr(feature = "trace", trace)]
    pub fn write_half_float(&mut self, value: f32) -> &mut Self {
        self.bytes
            .push(initial_byte::pack(MajorType::Simple, SIMPLE_HALF_FLOAT));
        self.bytes
            .extend_from_slice(&f16::from_f32(value).to_bits().to_be_bytes());
        self
    }

    #[cfg(feature = "float")]
    #[cfg_attr(feature = "trace", trace)]
    pub fn write_single_float(&mut self, value: f32) -> &mut Self {
        self.bytes
            .push(initial_byte::pack(MajorType::Simple, SIMPLE_SINGLE_FLOAT));
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    #[cfg(feature = "float")]
    #[cfg_attr(feature = "trace", trace)]
    pub fn write_double_float(&mut self, value: f64) -> &mut Self {
        self.bytes
            .push(initial_byte::pack(MajorType::Simple, SIMPLE_DOUBLE_FLOAT));
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Write a raw simple value (additional-info < 24 inline, 24..=255 as a trailing byte).
    #[cfg_attr(feature = "trace", trace)]
    pub fn write_simple_value(&mut self, value: u8) -> &mut Self {
        if value < PAYLOAD_ONE_BYTE {
            self.bytes.push(initial_byte::pack(MajorType::Simple, value));
        } else {
            self.bytes
                .push(initial_byte::pack(MajorType::Simple, PAYLOAD_ONE_BYTE));
            self.bytes.push(value);
        }
        self
    }
}

/// Append the canonical-minimal initial byte (and any trailing argument bytes) for `major`/`value`.
fn write_head(buf: &mut Vec<u8>, major: MajorType, value: u64) {
    if value <= PAYLOAD_AI_BITS as u64 {
        buf.push(initial_byte::pack(major, value as u8));
    } else if value <= u8::MAX as u64 {
        buf.push(initial_byte::pack(major, PAYLOAD_ONE_BYTE));
        buf.push(value as u8);
    } else if value <= u16::MAX as u64 {
        buf.push(initial_byte::pack(major, PAYLOAD_TWO_BYTES));
        buf.extend_from_slice(&(value as u16).to_be_bytes());
    } else if value <= u32::MAX as u64 {
        buf.push(initial_byte::pack(major, PAYLOAD_FOUR_BYTES));
        buf.extend_from_slice(&(value as u32).to_be_bytes());
    } else {
        buf.push(initial_byte::pack(major, PAYLOAD_EIGHT_BYTES));
        buf.extend_from_slice(&value.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;

    #[test]
    fn writes_definite_array_of_one_uint() {
        let mut w = Writer::new();
        w.write_start_array(Some(1)).write_uint(42).write_end_array();
        assert_eq!(w.encode_hex(), "81182a");
    }

    #[test]
    fn writes_indefinite_array() {
        let mut w = Writer::new();
        w.write_start_array(None);
        for i in 1..=3u64 {
            w.write_uint(i);
        }
        w.write_end_array();
        assert_eq!(w.encode_hex(), "9f010203ff");
    }

    #[test]
    fn round_trips_through_reader() {
        let mut w = Writer::new();
        w.write_start_map(Some(2));
        w.write_textstring("a");
        w.write_int(-1);
        w.write_textstring("b");
        w.write_bignum(&BigInt::from(18446744073709551616u128));
        w.write_end_map();

        let mut r = Reader::new(w.encode()).unwrap();
        assert_eq!(r.read_start_map().unwrap(), 2);
        assert_eq!(String::from_utf8(r.read_textstring().unwrap()).unwrap(), "a");
        assert_eq!(r.read_int().unwrap(), -1);
        assert_eq!(String::from_utf8(r.read_textstring().unwrap()).unwrap(), "b");
        assert_eq!(
            r.read_bignum().unwrap(),
            BigInt::from(18446744073709551616u128)
        );
        r.read_end_map().unwrap();
    }

    #[test]
    fn negative_int_round_trips_at_i64_min() {
        let mut w = Writer::new();
        w.write_int(i64::MIN);
        let mut r = Reader::new(w.encode()).unwrap();
        assert_eq!(r.read_int().unwrap(), i64::MIN);
    }
}

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
 * CBOR Reader
 *
 * A pull-based, streaming decoder (RFC 8949) over an owned, immutable byte buffer. The reader is
 * the sole consumer of the buffer; every domain-level decoder in the surrounding library is built
 * by composing calls to the typed reads below, driven by `peek_state`.
 **************************************************************************************************/
use std::cell::Cell;
use std::convert::TryInto;

#[cfg(feature = "float")]
use half::f16;

use num_bigint::{BigInt, Sign};

use crate::constants::*;
use crate::error::{CborError, Result};
use crate::frame::FrameStack;
use crate::initial_byte::{self, MajorType};
use crate::state::State;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// A streaming CBOR reader over an owned byte buffer.
///
/// `Reader` is cheap to `clone`: the clone owns an independent copy of the buffer and frame stack,
/// so draining one clone never affects the other.
#[derive(Debug, Clone)]
pub struct Reader {
    buffer: Vec<u8>,
    offset: usize,
    frames: FrameStack,
    peek_cache: Cell<Option<State>>,
}

impl Reader {
    /// Construct a reader over `bytes`. Fails if `bytes` is empty - there is no such thing as a
    /// CBOR reader with nothing to read.
    #[cfg_attr(feature = "trace", trace)]
    pub fn new(bytes: &[u8]) -> Result<Reader> {
        if bytes.is_empty() {
            return Err(CborError::InvalidArgument("buffer must not be empty"));
        }
        Ok(Reader {
            buffer: bytes.to_vec(),
            offset: 0,
            frames: FrameStack::new(),
            peek_cache: Cell::new(None),
        })
    }

    /// Construct a reader over the bytes encoded by a hex string.
    #[cfg_attr(feature = "trace", trace)]
    pub fn from_hex(hex_str: &str) -> Result<Reader> {
        let bytes =
            hex::decode(hex_str).map_err(|_| CborError::InvalidArgument("invalid hex string"))?;
        Reader::new(&bytes)
    }

    /// Number of bytes not yet consumed.
    #[inline]
    pub fn get_bytes_remaining(&self) -> usize {
        self.buffer.len() - self.offset
    }

    /// The unconsumed tail of the buffer.
    #[inline]
    pub fn get_remainder_bytes(&self) -> &[u8] {
        &self.buffer[self.offset..]
    }

    #[inline]
    fn invalidate_peek_cache(&self) {
        self.peek_cache.set(None);
    }

    /// Peek the initial byte at the cursor without consuming it. Fails if the current position is
    /// not reachable: past the declared length of a definite-length container, or past the end of
    /// the buffer. Every typed read funnels through here, so this is the one place that check has
    /// to be made.
    #[inline]
    fn peek_initial(&self) -> Result<(MajorType, u8)> {
        if self.frames.current().is_exhausted() {
            return Err(CborError::decoding(
                "attempted to read past the declared length of the current container",
            ));
        }
        if self.offset >= self.buffer.len() {
            return Err(CborError::OutOfBoundsMemoryRead);
        }
        Ok(initial_byte::unpack(self.buffer[self.offset]))
    }

    #[inline]
    fn type_mismatch(&self, expected: MajorType, found: MajorType) -> CborError {
        CborError::UnexpectedType {
            expected: expected.name(),
            found: found.name(),
        }
    }

    /// Advance the cursor by `total_bytes` (the full span of a scalar datum, header included),
    /// mark one item consumed in the current frame, and invalidate the peek cache.
    #[inline]
    fn advance_scalar(&mut self, total_bytes: usize) {
        self.offset += total_bytes;
        self.frames.advance_item();
        self.invalidate_peek_cache();
    }

    /***********************************************************************************************
     * State peeker (§4.4)
     **********************************************************************************************/

    /// Compute, without consuming input, the state the next read would observe. Idempotent: the
    /// answer is cached until the next cursor advance.
    #[cfg_attr(feature = "trace", trace)]
    pub fn peek_state(&self) -> Result<State> {
        if let Some(cached) = self.peek_cache.get() {
            return Ok(cached);
        }
        let state = self.compute_peek_state()?;
        self.peek_cache.set(Some(state));
        Ok(state)
    }

    fn compute_peek_state(&self) -> Result<State> {
        let current = *self.frames.current();

        // Step 1: a definite-length frame that has read everything it declared.
        if current.is_exhausted() {
            return match current.major {
                MajorType::Undefined => Ok(State::Finished),
                MajorType::Array => Ok(State::EndArray),
                MajorType::Map => Ok(State::EndMap),
                _ => Err(CborError::decoding(
                    "grammar violation: unexpected exhausted container",
                )),
            };
        }

        // Step 2: end of buffer.
        if self.offset >= self.buffer.len() {
            if current.major == MajorType::Undefined && current.is_indefinite() && self.offset > 0
            {
                return Ok(State::Finished);
            }
            return Err(CborError::decoding("unexpected end of buffer"));
        }

        let byte = self.buffer[self.offset];

        // Step 3: break code.
        if byte == BREAK {
            if self.frames.in_tag_context() {
                return Err(CborError::decoding("tag not followed by a value"));
            }
            if !current.is_indefinite() {
                return Err(CborError::decoding("unexpected break code"));
            }
            return match current.major {
                MajorType::Bytes => Ok(State::EndIndefBytes),
                MajorType::Text => Ok(State::EndIndefText),
                MajorType::Array => Ok(State::EndArray),
                MajorType::Map => {
                    if current.items_read % 2 == 0 {
                        Ok(State::EndMap)
                    } else {
                        Err(CborError::decoding("map key is missing its value"))
                    }
                }
                MajorType::Undefined => {
                    Err(CborError::decoding("unexpected break code at the root"))
                }
                _ => Err(CborError::decoding("unexpected break code")),
            };
        }

        let (major, info) = initial_byte::unpack(byte);

        // Step 4: inside an indefinite bytes/text run, every chunk must be definite-length and of
        // the same major type.
        if current.is_indefinite()
            && (current.major == MajorType::Bytes || current.major == MajorType::Text)
            && (major != current.major || info == PAYLOAD_INDEFINITE)
        {
            return Err(CborError::decoding(
                "indefinite string chunk must be definite-length and of the same major type",
            ));
        }

        // Step 5.
        Ok(match major {
            MajorType::Uint => State::UnsignedInteger,
            MajorType::NInt => State::NegativeInteger,
            MajorType::Bytes => {
                if info == PAYLOAD_INDEFINITE {
                    State::StartIndefBytes
                } else {
                    State::ByteString
                }
            }
            MajorType::Text => {
                if info == PAYLOAD_INDEFINITE {
                    State::StartIndefText
                } else {
                    State::TextString
                }
            }
            MajorType::Array => State::StartArray,
            MajorType::Map => State::StartMap,
            MajorType::Tag => State::Tag,
            MajorType::Simple => match info {
                SIMPLE_FALSE | SIMPLE_TRUE => State::Boolean,
                SIMPLE_NULL => State::Null,
                SIMPLE_UNDEFINED => State::Undefined,
                SIMPLE_HALF_FLOAT => State::HalfFloat,
                SIMPLE_SINGLE_FLOAT => State::SingleFloat,
                SIMPLE_DOUBLE_FLOAT => State::DoubleFloat,
                _ => State::SimpleValue,
            },
            MajorType::Undefined => {
                unreachable!("a buffer byte never unpacks to the root sentinel major type")
            }
        })
    }

    /***********************************************************************************************
     * Integers (§4.5 read_unsigned / read_int)
     **********************************************************************************************/

    /// Read an unsigned integer. Fails if the next item is a negative integer or any other type.
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_unsigned(&mut self) -> Result<u64> {
        let (major, _) = self.peek_initial()?;
        match major {
            MajorType::Uint => {
                let (value, consumed) = decode_uint_arg(&self.buffer, self.offset)?;
                self.advance_scalar(consumed);
                Ok(value)
            }
            MajorType::NInt => Err(CborError::decoding(
                "integer overflow: value is negative, not unsigned",
            )),
            other => Err(self.type_mismatch(MajorType::Uint, other)),
        }
    }

    /// Read a signed integer of either sign.
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_int(&mut self) -> Result<i64> {
        let (major, _) = self.peek_initial()?;
        match major {
            MajorType::Uint => {
                let (value, consumed) = decode_uint_arg(&self.buffer, self.offset)?;
                if value > i64::MAX as u64 {
                    return Err(CborError::decoding("unsigned integer overflows i64"));
                }
                self.advance_scalar(consumed);
                Ok(value as i64)
            }
            MajorType::NInt => {
                let (value, consumed) = decode_uint_arg(&self.buffer, self.offset)?;
                let as_i128 = -1i128 - value as i128;
                if as_i128 < i64::MIN as i128 {
                    return Err(CborError::decoding("negative integer overflows i64"));
                }
                self.advance_scalar(consumed);
                Ok(as_i128 as i64)
            }
            other => Err(self.type_mismatch(MajorType::Uint, other)),
        }
    }

    /***********************************************************************************************
     * Bignum (tags 2 / 3, §4.5 read_bignum)
     **********************************************************************************************/

    /// Read a CBOR bignum: a tag 2 (unsigned) or tag 3 (negative) followed by its byte-string
    /// magnitude.
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_bignum(&mut self) -> Result<BigInt> {
        let tag = self.read_tag()?;
        if tag != TAG_BIGNUM_UNSIGNED && tag != TAG_BIGNUM_NEGATIVE {
            return Err(CborError::decoding("tag is not a bignum tag (2 or 3)"));
        }
        let magnitude_bytes = self.read_bytestring()?;
        let magnitude = BigInt::from_bytes_be(Sign::Plus, &magnitude_bytes);
        Ok(if tag == TAG_BIGNUM_NEGATIVE {
            -(magnitude + BigInt::from(1u8))
        } else {
            magnitude
        })
    }

    /***********************************************************************************************
     * Floats (§4.5 read_half_float / read_single_float / read_double_float / read_double)
     **********************************************************************************************/

    #[cfg(feature = "float")]
    fn read_simple_payload(&mut self, expected_info: u8, payload_len: usize) -> Result<&[u8]> {
        let (major, info) = self.peek_initial()?;
        if major != MajorType::Simple || info != expected_info {
            return Err(self.type_mismatch(MajorType::Simple, major));
        }
        let start = self.offset + 1;
        let end = start
            .checked_add(payload_len)
            .ok_or(CborError::OutOfBoundsMemoryRead)?;
        if end > self.buffer.len() {
            return Err(CborError::OutOfBoundsMemoryRead);
        }
        Ok(&self.buffer[start..end])
    }

    /// Read a IEEE-754 binary16 float, widened to `f64`.
    #[cfg(feature = "float")]
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_half_float(&mut self) -> Result<f64> {
        let payload = self.read_simple_payload(SIMPLE_HALF_FLOAT, 2)?;
        let bits = u16::from_be_bytes(payload.try_into().expect("checked length"));
        let value = f16::from_bits(bits).to_f64();
        self.advance_scalar(3);
        Ok(value)
    }

    /// Read a IEEE-754 binary32 float, widened to `f64`.
    #[cfg(feature = "float")]
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_single_float(&mut self) -> Result<f64> {
        let payload = self.read_simple_payload(SIMPLE_SINGLE_FLOAT, 4)?;
        let bits = u32::from_be_bytes(payload.try_into().expect("checked length"));
        let value = f32::from_bits(bits) as f64;
        self.advance_scalar(5);
        Ok(value)
    }

    /// Read a IEEE-754 binary64 float.
    #[cfg(feature = "float")]
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_double_float(&mut self) -> Result<f64> {
        let payload = self.read_simple_payload(SIMPLE_DOUBLE_FLOAT, 8)?;
        let bits = u64::from_be_bytes(payload.try_into().expect("checked length"));
        let value = f64::from_bits(bits);
        self.advance_scalar(9);
        Ok(value)
    }

    /// Read any of the three float encodings, dispatching on the additional-info value.
    #[cfg(feature = "float")]
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_double(&mut self) -> Result<f64> {
        let (major, info) = self.peek_initial()?;
        if major != MajorType::Simple {
            return Err(self.type_mismatch(MajorType::Simple, major));
        }
        match info {
            SIMPLE_HALF_FLOAT => self.read_half_float(),
            SIMPLE_SINGLE_FLOAT => self.read_single_float(),
            SIMPLE_DOUBLE_FLOAT => self.read_double_float(),
            _ => Err(CborError::decoding("not a float encoding")),
        }
    }

    /***********************************************************************************************
     * Booleans, null, undefined, simple values (§4.5 read_bool / read_null / read_simple_value)
     **********************************************************************************************/

    /// Read a boolean simple value (`false`/`true`, additional-info 20/21).
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_bool(&mut self) -> Result<bool> {
        let (major, info) = self.peek_initial()?;
        if major != MajorType::Simple || (info != SIMPLE_FALSE && info != SIMPLE_TRUE) {
            return Err(self.type_mismatch(MajorType::Simple, major));
        }
        self.advance_scalar(1);
        Ok(info == SIMPLE_TRUE)
    }

    /// Read the `null` simple value (additional-info 22).
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_null(&mut self) -> Result<()> {
        let (major, info) = self.peek_initial()?;
        if major != MajorType::Simple || info != SIMPLE_NULL {
            return Err(self.type_mismatch(MajorType::Simple, major));
        }
        self.advance_scalar(1);
        Ok(())
    }

    /// Read the `undefined` simple value (additional-info 23).
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_undefined(&mut self) -> Result<()> {
        let (major, info) = self.peek_initial()?;
        if major != MajorType::Simple || info != SIMPLE_UNDEFINED {
            return Err(self.type_mismatch(MajorType::Simple, major));
        }
        self.advance_scalar(1);
        Ok(())
    }

    /// Read a raw simple value (major type 7, any additional-info encoding a 1- or 2-byte simple
    /// value datum).
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_simple_value(&mut self) -> Result<u8> {
        let (major, info) = self.peek_initial()?;
        if major != MajorType::Simple {
            return Err(self.type_mismatch(MajorType::Simple, major));
        }
        if info < PAYLOAD_ONE_BYTE {
            self.advance_scalar(1);
            Ok(info)
        } else if info == PAYLOAD_ONE_BYTE {
            if self.offset + 1 >= self.buffer.len() {
                return Err(CborError::OutOfBoundsMemoryRead);
            }
            let value = self.buffer[self.offset + 1];
            self.advance_scalar(2);
            Ok(value)
        } else {
            Err(CborError::decoding(
                "additional-info value is not a legal simple-value encoding",
            ))
        }
    }

    /***********************************************************************************************
     * Byte strings and text strings (§4.5 read_bytestring / read_textstring)
     **********************************************************************************************/

    fn read_string_payload(&mut self, major: MajorType) -> Result<Vec<u8>> {
        let (actual, info) = self.peek_initial()?;
        if actual != major {
            return Err(self.type_mismatch(major, actual));
        }
        if info == PAYLOAD_INDEFINITE {
            self.read_indefinite_concatenated(major)
        } else {
            let (len, consumed) = decode_uint_arg(&self.buffer, self.offset)?;
            let start = self.offset + consumed;
            let end = start
                .checked_add(len as usize)
                .ok_or(CborError::OutOfBoundsMemoryRead)?;
            if end > self.buffer.len() {
                return Err(CborError::OutOfBoundsMemoryRead);
            }
            let payload = self.buffer[start..end].to_vec();
            self.offset = end;
            self.frames.advance_item();
            self.invalidate_peek_cache();
            Ok(payload)
        }
    }

    /// Consume an indefinite-length bytes/text run in one call, concatenating its chunks.
    fn read_indefinite_concatenated(&mut self, major: MajorType) -> Result<Vec<u8>> {
        self.offset += 1; // the indefinite-length marker byte itself
        self.invalidate_peek_cache();
        let mut out = Vec::new();
        loop {
            if self.offset >= self.buffer.len() {
                return Err(CborError::OutOfBoundsMemoryRead);
            }
            if self.buffer[self.offset] == BREAK {
                self.offset += 1;
                break;
            }
            let (chunk_major, chunk_info) = initial_byte::unpack(self.buffer[self.offset]);
            if chunk_major != major || chunk_info == PAYLOAD_INDEFINITE {
                return Err(CborError::decoding(
                    "indefinite string chunk must be definite-length and of the same major type",
                ));
            }
            let (len, consumed) = decode_uint_arg(&self.buffer, self.offset)?;
            let start = self.offset + consumed;
            let end = start
                .checked_add(len as usize)
                .ok_or(CborError::OutOfBoundsMemoryRead)?;
            if end > self.buffer.len() {
                return Err(CborError::OutOfBoundsMemoryRead);
            }
            out.extend_from_slice(&self.buffer[start..end]);
            self.offset = end;
        }
        self.frames.advance_item();
        self.invalidate_peek_cache();
        Ok(out)
    }

    /// Read a byte string, definite or indefinite. Indefinite strings are concatenated and
    /// returned as a single owned buffer; the empty trailing chunk before a break contributes
    /// nothing.
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_bytestring(&mut self) -> Result<Vec<u8>> {
        self.read_string_payload(MajorType::Bytes)
    }

    /// Read a text string, definite or indefinite. UTF-8 validity is **not** checked at this
    /// layer - the raw bytes are handed back as-is; callers that need a `str` validate it
    /// themselves.
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_textstring(&mut self) -> Result<Vec<u8>> {
        self.read_string_payload(MajorType::Text)
    }

    /***********************************************************************************************
     * Low-level chunked walk over an indefinite bytes/text run (used by `skip_value`, and
     * available to memory-constrained callers who would rather not allocate a concatenation
     * buffer up front).
     **********************************************************************************************/

    fn read_start_indef_string(&mut self, major: MajorType) -> Result<()> {
        let (actual, info) = self.peek_initial()?;
        if actual != major || info != PAYLOAD_INDEFINITE {
            return Err(self.type_mismatch(major, actual));
        }
        let start = self.offset;
        self.offset += 1;
        self.frames.push(major, start, INDEFINITE_LENGTH);
        self.invalidate_peek_cache();
        Ok(())
    }

    fn read_end_indef_string(&mut self, major: MajorType) -> Result<()> {
        if self.offset >= self.buffer.len() || self.buffer[self.offset] != BREAK {
            return Err(CborError::decoding(
                "expected break code to end indefinite-length string",
            ));
        }
        self.offset += 1;
        self.frames.pop(major)?;
        self.frames.advance_item();
        self.invalidate_peek_cache();
        Ok(())
    }

    /// Push a frame for an indefinite byte-string run; subsequent definite byte-string chunks are
    /// read with [`Reader::read_bytestring`] until [`Reader::read_end_indef_bytes`] closes it.
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_start_indef_bytes(&mut self) -> Result<()> {
        self.read_start_indef_string(MajorType::Bytes)
    }

    /// Close an indefinite byte-string run opened with [`Reader::read_start_indef_bytes`].
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_end_indef_bytes(&mut self) -> Result<()> {
        self.read_end_indef_string(MajorType::Bytes)
    }

    /// Push a frame for an indefinite text-string run; subsequent definite text-string chunks are
    /// read with [`Reader::read_textstring`] until [`Reader::read_end_indef_text`] closes it.
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_start_indef_text(&mut self) -> Result<()> {
        self.read_start_indef_string(MajorType::Text)
    }

    /// Close an indefinite text-string run opened with [`Reader::read_start_indef_text`].
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_end_indef_text(&mut self) -> Result<()> {
        self.read_end_indef_string(MajorType::Text)
    }

    /***********************************************************************************************
     * Arrays (§4.5 read_start_array / read_end_array)
     **********************************************************************************************/

    /// Begin an array, pushing a frame. Returns the declared length, or `-1` if indefinite.
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_start_array(&mut self) -> Result<i64> {
        let (major, info) = self.peek_initial()?;
        if major != MajorType::Array {
            return Err(self.type_mismatch(MajorType::Array, major));
        }
        let start = self.offset;
        if info == PAYLOAD_INDEFINITE {
            self.offset += 1;
            self.frames.push(MajorType::Array, start, INDEFINITE_LENGTH);
            self.invalidate_peek_cache();
            Ok(-1)
        } else {
            let (len, consumed) = decode_uint_arg(&self.buffer, self.offset)?;
            if len > i64::MAX as u64 {
                return Err(CborError::decoding(
                    "array declares a length too large to represent as a definite frame",
                ));
            }
            self.offset += consumed;
            self.frames.push(MajorType::Array, start, len as i64);
            self.invalidate_peek_cache();
            Ok(len as i64)
        }
    }

    /// Close an array opened with [`Reader::read_start_array`].
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_end_array(&mut self) -> Result<()> {
        if self.frames.current().is_indefinite() {
            if self.offset >= self.buffer.len() || self.buffer[self.offset] != BREAK {
                return Err(CborError::decoding(
                    "expected break code to end indefinite array",
                ));
            }
            self.offset += 1;
        }
        self.frames.pop(MajorType::Array)?;
        self.frames.advance_item();
        self.invalidate_peek_cache();
        Ok(())
    }

    /***********************************************************************************************
     * Maps (§4.5 read_start_map / read_end_map)
     **********************************************************************************************/

    /// Begin a map, pushing a frame. Returns the declared pair count, or `-1` if indefinite.
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_start_map(&mut self) -> Result<i64> {
        let (major, info) = self.peek_initial()?;
        if major != MajorType::Map {
            return Err(self.type_mismatch(MajorType::Map, major));
        }
        let start = self.offset;
        if info == PAYLOAD_INDEFINITE {
            self.offset += 1;
            self.frames.push(MajorType::Map, start, INDEFINITE_LENGTH);
            self.invalidate_peek_cache();
            Ok(-1)
        } else {
            let (len, consumed) = decode_uint_arg(&self.buffer, self.offset)?;
            // Reject before doubling: a `len` this large would overflow `2 * len` in `u64`, or
            // land on `i64::MAX`/wrap into the indefinite-length sentinel once cast to `i64`.
            if len > i64::MAX as u64 / 2 {
                return Err(CborError::decoding(
                    "map declares a pair count too large to represent as a definite frame",
                ));
            }
            let remaining = (self.buffer.len() - (self.offset + consumed)) as u64;
            if 2 * len > remaining {
                return Err(CborError::decoding(
                    "map declares more key/value items than the remaining bytes could hold",
                ));
            }
            self.offset += consumed;
            self.frames.push(MajorType::Map, start, (2 * len) as i64);
            self.frames.set_current_key_offset(self.offset);
            self.invalidate_peek_cache();
            Ok(len as i64)
        }
    }

    /// Close a map opened with [`Reader::read_start_map`].
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_end_map(&mut self) -> Result<()> {
        if self.frames.current().is_indefinite() {
            if self.frames.current().items_read % 2 != 0 {
                return Err(CborError::decoding("map key is missing its value"));
            }
            if self.offset >= self.buffer.len() || self.buffer[self.offset] != BREAK {
                return Err(CborError::decoding(
                    "expected break code to end indefinite map",
                ));
            }
            self.offset += 1;
        }
        self.frames.pop(MajorType::Map)?;
        self.frames.advance_item();
        self.invalidate_peek_cache();
        Ok(())
    }

    /***********************************************************************************************
     * Tags (§4.5 read_tag / peek_tag)
     **********************************************************************************************/

    /// Read a tag number. Does **not** advance the item counter - the tagged value that must
    /// follow does that when it is read. Leaves the reader `in_tag_context` until then.
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_tag(&mut self) -> Result<u64> {
        let (major, _) = self.peek_initial()?;
        if major != MajorType::Tag {
            return Err(self.type_mismatch(MajorType::Tag, major));
        }
        let (tag, consumed) = decode_uint_arg(&self.buffer, self.offset)?;
        self.offset += consumed;
        self.frames.enter_tag_context();
        self.invalidate_peek_cache();
        Ok(tag)
    }

    /// Peek a tag number without consuming it or entering tag context.
    #[cfg_attr(feature = "trace", trace)]
    pub fn peek_tag(&self) -> Result<u64> {
        let (major, _) = self.peek_initial()?;
        if major != MajorType::Tag {
            return Err(self.type_mismatch(MajorType::Tag, major));
        }
        let (tag, _) = decode_uint_arg(&self.buffer, self.offset)?;
        Ok(tag)
    }

    /***********************************************************************************************
     * Skip / read-encoded-value (§4.5 skip_value / read_encoded_value)
     **********************************************************************************************/

    /// Skip exactly one complete data item - including any number of leading tags and nested
    /// containers of arbitrary depth - without interpreting its contents.
    #[cfg_attr(feature = "trace", trace)]
    pub fn skip_value(&mut self) -> Result<()> {
        self.walk_one_value()?;
        Ok(())
    }

    /// Like [`Reader::skip_value`], but returns the exact encoded bytes of the sub-tree that was
    /// skipped, byte-identical to the source.
    #[cfg_attr(feature = "trace", trace)]
    pub fn read_encoded_value(&mut self) -> Result<Vec<u8>> {
        let start = self.offset;
        self.walk_one_value()?;
        Ok(self.buffer[start..self.offset].to_vec())
    }

    /// Consume exactly one complete data item, recursing into containers and through tags.
    fn walk_one_value(&mut self) -> Result<()> {
        match self.peek_state()? {
            State::Tag => {
                self.read_tag()?;
                self.walk_one_value()?;
            }
            State::UnsignedInteger => {
                self.read_unsigned()?;
            }
            State::NegativeInteger => {
                self.read_int()?;
            }
            State::ByteString => {
                self.read_bytestring()?;
            }
            State::TextString => {
                self.read_textstring()?;
            }
            State::Boolean => {
                self.read_bool()?;
            }
            State::Null => {
                self.read_null()?;
            }
            State::Undefined => {
                self.read_undefined()?;
            }
            State::SimpleValue => {
                self.read_simple_value()?;
            }
            #[cfg(feature = "float")]
            State::HalfFloat => {
                self.read_half_float()?;
            }
            #[cfg(feature = "float")]
            State::SingleFloat => {
                self.read_single_float()?;
            }
            #[cfg(feature = "float")]
            State::DoubleFloat => {
                self.read_double_float()?;
            }
            State::StartArray => {
                let len = self.read_start_array()?;
                if len >= 0 {
                    for _ in 0..len {
                        self.walk_one_value()?;
                    }
                } else {
                    while self.peek_state()? != State::EndArray {
                        self.walk_one_value()?;
                    }
                }
                self.read_end_array()?;
            }
            State::StartMap => {
                let len = self.read_start_map()?;
                if len >= 0 {
                    for _ in 0..2 * len {
                        self.walk_one_value()?;
                    }
                } else {
                    while self.peek_state()? != State::EndMap {
                        self.walk_one_value()?;
                    }
                }
                self.read_end_map()?;
            }
            State::StartIndefBytes => {
                self.read_start_indef_bytes()?;
                while self.peek_state()? != State::EndIndefBytes {
                    self.read_bytestring()?;
                }
                self.read_end_indef_bytes()?;
            }
            State::StartIndefText => {
                self.read_start_indef_text()?;
                while self.peek_state()? != State::EndIndefText {
                    self.read_textstring()?;
                }
                self.read_end_indef_text()?;
            }
            _ => return Err(CborError::decoding("unexpected state while skipping a value")),
        }
        Ok(())
    }
}

/***************************************************************************************************
 * Unsigned-argument decoder (§4.2)
 **************************************************************************************************/

/// Decode the length/value argument following an initial byte at `at` in `buf`. Returns the
/// decoded value and the total number of bytes consumed, *including* the initial byte itself.
pub(crate) fn decode_uint_arg(buf: &[u8], at: usize) -> Result<(u64, usize)> {
    if at >= buf.len() {
        return Err(CborError::OutOfBoundsMemoryRead);
    }
    let info = buf[at] & AI_MASK;
    match info {
        0..=23 => Ok((info as u64, 1)),
        24 => {
            let bytes = read_extent(buf, at + 1, 1)?;
            Ok((bytes[0] as u64, 2))
        }
        25 => {
            let bytes = read_extent(buf, at + 1, 2)?;
            Ok((
                u16::from_be_bytes(bytes.try_into().expect("checked length")) as u64,
                3,
            ))
        }
        26 => {
            let bytes = read_extent(buf, at + 1, 4)?;
            Ok((
                u32::from_be_bytes(bytes.try_into().expect("checked length")) as u64,
                5,
            ))
        }
        27 => {
            let bytes = read_extent(buf, at + 1, 8)?;
            Ok((u64::from_be_bytes(bytes.try_into().expect("checked length")), 9))
        }
        _ => Err(CborError::decoding(
            "reserved or indefinite additional-info value where a sized argument was expected",
        )),
    }
}

fn read_extent(buf: &[u8], start: usize, len: usize) -> Result<&[u8]> {
    let end = start.checked_add(len).ok_or(CborError::OutOfBoundsMemoryRead)?;
    if end > buf.len() {
        return Err(CborError::OutOfBoundsMemoryRead);
    }
    Ok(&buf[start..end])
}

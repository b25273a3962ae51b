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
 * CBOR initial-byte codec
 *
 * Every CBOR data item begins with a single "initial byte" whose high 3 bits select the major
 * type and whose low 5 bits (the "additional information") select the argument encoding. This
 * module is pure bit manipulation - it has no failure modes of its own.
 **************************************************************************************************/
use crate::constants::*;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// The eight CBOR major types, plus `Undefined`, used only as the sentinel occupying the bottom
/// of the frame stack (the root context has no enclosing container).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MajorType {
    Uint,
    NInt,
    Bytes,
    Text,
    Array,
    Map,
    Tag,
    Simple,
    Undefined,
}

impl MajorType {
    /// Classify the high 3 bits of an initial byte.
    #[cfg_attr(feature = "trace", trace)]
    #[inline]
    fn from_bits(bits: u8) -> MajorType {
        match bits {
            0 => MajorType::Uint,
            1 => MajorType::NInt,
            2 => MajorType::Bytes,
            3 => MajorType::Text,
            4 => MajorType::Array,
            5 => MajorType::Map,
            6 => MajorType::Tag,
            7 => MajorType::Simple,
            _ => unreachable!("major type is 3 bits, always in 0..=7"),
        }
    }

    /// The 3-bit encoding of this major type, shifted into initial-byte position.
    #[inline]
    fn to_high_bits(self) -> u8 {
        match self {
            MajorType::Uint => MT_UINT,
            MajorType::NInt => MT_NINT,
            MajorType::Bytes => MT_BSTR,
            MajorType::Text => MT_TSTR,
            MajorType::Array => MT_ARRAY,
            MajorType::Map => MT_MAP,
            MajorType::Tag => MT_TAG,
            MajorType::Simple | MajorType::Undefined => MT_SIMPLE,
        }
    }

    /// A short, stable name used in error messages (`CborError::UnexpectedType`).
    pub fn name(self) -> &'static str {
        match self {
            MajorType::Uint => "uint",
            MajorType::NInt => "nint",
            MajorType::Bytes => "bytes",
            MajorType::Text => "text",
            MajorType::Array => "array",
            MajorType::Map => "map",
            MajorType::Tag => "tag",
            MajorType::Simple => "simple",
            MajorType::Undefined => "undefined",
        }
    }
}

/// Split an initial byte into `(major_type, additional_info)`.
#[cfg_attr(feature = "trace", trace)]
#[inline]
pub fn unpack(byte: u8) -> (MajorType, u8) {
    (MajorType::from_bits(byte >> 5), byte & AI_MASK)
}

/// Pack a major type and additional-info value into a single initial byte. `info` is masked to
/// its low 5 bits; callers are expected to have already range-checked it.
#[cfg_attr(feature = "trace", trace)]
#[inline]
pub fn pack(major: MajorType, info: u8) -> u8 {
    major.to_high_bits() | (info & AI_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_major_type() {
        for (major, bits) in [
            (MajorType::Uint, 0u8),
            (MajorType::NInt, 1),
            (MajorType::Bytes, 2),
            (MajorType::Text, 3),
            (MajorType::Array, 4),
            (MajorType::Map, 5),
            (MajorType::Tag, 6),
            (MajorType::Simple, 7),
        ] {
            let byte = pack(major, 0x1b);
            let (got_major, got_info) = unpack(byte);
            assert_eq!(got_major, major);
            assert_eq!(got_info, 0x1b);
            assert_eq!(byte >> 5, bits);
        }
    }

    #[test]
    fn unpack_masks_additional_info_to_five_bits() {
        let (_, info) = unpack(0xFF);
        assert_eq!(info, 0x1F);
    }
}

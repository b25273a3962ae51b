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
 * Owned CBOR value tree
 *
 * `Value` is a convenience on top of the typed readers: a fully-materialized, borrow-free tree for
 * callers (and this crate's own tests) who want "give me the whole thing" rather than driving the
 * state machine by hand. It is not how domain decoders in the surrounding library are expected to
 * work - those drive `Reader` directly - but it is a useful sanity-check harness over arbitrary
 * CBOR.
 **************************************************************************************************/
use crate::error::{CborError, Result};
use crate::reader::Reader;
use crate::state::State;

/// A fully-decoded CBOR data item, owning all of its bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unsigned(u64),
    Negative(i64),
    ByteString(Vec<u8>),
    TextString(Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Tag(u64, Box<Value>),
    Simple(u8),
    Bool(bool),
    Null,
    Undefined,
    #[cfg(feature = "float")]
    HalfFloat(f64),
    #[cfg(feature = "float")]
    SingleFloat(f64),
    #[cfg(feature = "float")]
    DoubleFloat(f64),
}

/// Decode exactly one complete [`Value`] from `reader`, recursing into nested containers.
pub fn read_value(reader: &mut Reader) -> Result<Value> {
    match reader.peek_state()? {
        State::UnsignedInteger => Ok(Value::Unsigned(reader.read_unsigned()?)),
        State::NegativeInteger => Ok(Value::Negative(reader.read_int()?)),
        State::ByteString | State::StartIndefBytes => {
            Ok(Value::ByteString(reader.read_bytestring()?))
        }
        State::TextString | State::StartIndefText => {
            Ok(Value::TextString(reader.read_textstring()?))
        }
        State::StartArray => {
            let len = reader.read_start_array()?;
            let mut items = Vec::new();
            if len >= 0 {
                for _ in 0..len {
                    items.push(read_value(reader)?);
                }
            } else {
                while reader.peek_state()? != State::EndArray {
                    items.push(read_value(reader)?);
                }
            }
            reader.read_end_array()?;
            Ok(Value::Array(items))
        }
        State::StartMap => {
            let len = reader.read_start_map()?;
            let mut pairs = Vec::new();
            if len >= 0 {
                for _ in 0..len {
                    let key = read_value(reader)?;
                    let value = read_value(reader)?;
                    pairs.push((key, value));
                }
            } else {
                while reader.peek_state()? != State::EndMap {
                    let key = read_value(reader)?;
                    let value = read_value(reader)?;
                    pairs.push((key, value));
                }
            }
            reader.read_end_map()?;
            Ok(Value::Map(pairs))
        }
        State::Tag => {
            let tag = reader.read_tag()?;
            let inner = read_value(reader)?;
            Ok(Value::Tag(tag, Box::new(inner)))
        }
        State::Boolean => Ok(Value::Bool(reader.read_bool()?)),
        State::Null => {
            reader.read_null()?;
            Ok(Value::Null)
        }
        State::Undefined => {
            reader.read_undefined()?;
            Ok(Value::Undefined)
        }
        State::SimpleValue => Ok(Value::Simple(reader.read_simple_value()?)),
        #[cfg(feature = "float")]
        State::HalfFloat => Ok(Value::HalfFloat(reader.read_half_float()?)),
        #[cfg(feature = "float")]
        State::SingleFloat => Ok(Value::SingleFloat(reader.read_single_float()?)),
        #[cfg(feature = "float")]
        State::DoubleFloat => Ok(Value::DoubleFloat(reader.read_double_float()?)),
        _ => Err(CborError::decoding("unexpected state while decoding a value tree")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_nested_structure() {
        let mut r = Reader::from_hex("83656c6f72656d65697073756d65646f6c6f72").unwrap();
        let value = read_value(&mut r).unwrap();
        match value {
            Value::Array(items) => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[2], Value::TextString(b"dolor".to_vec()));
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn decodes_tagged_value() {
        let mut r = Reader::from_hex("c074323031332d30332d32315432303a30343a30305a").unwrap();
        let value = read_value(&mut r).unwrap();
        match value {
            Value::Tag(0, inner) => {
                assert_eq!(*inner, Value::TextString(b"2013-03-21T20:04:00Z".to_vec()));
            }
            other => panic!("unexpected value: {:?}", other),
        }
    }
}

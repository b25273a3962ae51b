/***************************************************************************************************
 * Copyright (c) 2020-2022 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice (including the next
 * paragraph) shall be included in all copies or substantial portions of the
 * Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * Test cases for cardano_cbor: bugfixes and adversarial cases
 **************************************************************************************************/
extern crate cardano_cbor;

use cardano_cbor::{CborError, Reader};

#[test]
fn empty_buffer_is_rejected_at_construction() {
    println!("<=================== empty_buffer_is_rejected ===================>");
    assert!(matches!(
        Reader::new(&[]).unwrap_err(),
        CborError::InvalidArgument(_)
    ));
}

#[test]
fn truncated_length_argument_is_an_out_of_bounds_read() {
    println!("<=================== truncated_length_argument ===================>");
    // 0x1a declares a 4-byte argument, but only one byte follows.
    let mut r = Reader::new(&[0x1a, 0x00]).unwrap();
    assert!(matches!(
        r.read_unsigned().unwrap_err(),
        CborError::OutOfBoundsMemoryRead
    ));
}

#[test]
fn truncated_string_payload_is_an_out_of_bounds_read() {
    println!("<=================== truncated_string_payload ===================>");
    // Declares a 4-byte byte string but only supplies 2.
    let mut r = Reader::new(&[0x44, 0x01, 0x02]).unwrap();
    assert!(matches!(
        r.read_bytestring().unwrap_err(),
        CborError::OutOfBoundsMemoryRead
    ));
}

#[test]
fn wrong_type_request_reports_both_type_names() {
    println!("<=================== wrong_type_request ===================>");
    let mut r = Reader::from_hex("6161").unwrap(); // text string "a"
    match r.read_unsigned().unwrap_err() {
        CborError::UnexpectedType { expected, found } => {
            assert_eq!(expected, "uint");
            assert_eq!(found, "text");
        }
        other => panic!("wrong error variant: {:?}", other),
    }
}

#[test]
fn reading_unsigned_from_a_negative_integer_is_rejected_not_silently_negated() {
    println!("<=================== negative_integer_via_read_unsigned ===================>");
    let mut r = Reader::from_hex("20").unwrap(); // -1
    assert!(matches!(r.read_unsigned().unwrap_err(), CborError::Decoding(_)));
}

#[test]
fn indefinite_map_with_a_lone_key_before_break_is_rejected() {
    println!("<=================== indefinite_map_lone_key ===================>");
    // {_ "a": "A", "b" } - a break right after an unpaired key.
    let mut r = Reader::from_hex("bf6161614161626162ff").unwrap();
    assert_eq!(r.read_start_map().unwrap(), -1);
    r.read_textstring().unwrap(); // "a"
    r.read_textstring().unwrap(); // "A"
    r.read_textstring().unwrap(); // "b" - lone key
    assert!(matches!(r.peek_state().unwrap_err(), CborError::Decoding(_)));
}

#[test]
fn indefinite_string_chunk_of_a_different_major_type_is_rejected() {
    println!("<=================== indefinite_string_chunk_wrong_major ===================>");
    // A byte-string chunk run where the second chunk is a text string instead of bytes.
    let mut r = Reader::from_hex("5f41ab6141ff").unwrap();
    assert!(matches!(r.read_bytestring().unwrap_err(), CborError::Decoding(_)));
}

#[test]
fn nested_indefinite_string_chunk_is_rejected() {
    println!("<=================== nested_indefinite_string_chunk ===================>");
    // An indefinite byte-string whose "chunk" is itself indefinite-length - illegal per RFC 8949.
    let mut r = Reader::from_hex("5f5f41ab40ffff").unwrap();
    assert!(matches!(r.read_bytestring().unwrap_err(), CborError::Decoding(_)));
}

#[test]
fn tag_not_followed_by_a_value_is_rejected_on_container_close() {
    println!("<=================== tag_not_followed_by_value ===================>");
    // [ 0(  - an array holding a single dangling tag with nothing after it.
    let mut r = Reader::from_hex("81c0").unwrap();
    assert_eq!(r.read_start_array().unwrap(), 1);
    r.read_tag().unwrap();
    assert!(matches!(r.read_end_array().unwrap_err(), CborError::Decoding(_)));
}

#[test]
fn closing_an_array_before_all_declared_items_are_read_is_rejected() {
    println!("<=================== premature_array_close ===================>");
    let mut r = Reader::from_hex("83010203").unwrap();
    assert_eq!(r.read_start_array().unwrap(), 3);
    r.read_unsigned().unwrap();
    assert!(matches!(r.read_end_array().unwrap_err(), CborError::Decoding(_)));
}

#[test]
fn closing_the_wrong_container_type_is_rejected() {
    println!("<=================== wrong_container_type_close ===================>");
    let mut r = Reader::from_hex("80").unwrap(); // empty array
    r.read_start_array().unwrap();
    assert!(matches!(r.read_end_map().unwrap_err(), CborError::Decoding(_)));
}

#[test]
fn map_declaring_more_pairs_than_the_buffer_could_hold_is_rejected_eagerly() {
    println!("<=================== map_size_overflow_guard ===================>");
    // Declares 0x19ffff (65535) pairs but the buffer has only one byte left.
    let mut r = Reader::new(&[0xb9, 0xff, 0xff, 0x01]).unwrap();
    assert!(matches!(r.read_start_map().unwrap_err(), CborError::Decoding(_)));
}

#[test]
fn map_declaring_u64_max_pairs_is_rejected_without_overflowing() {
    println!("<=================== map_size_u64_max_no_overflow ===================>");
    // Major type 5 (map), additional-info 27: an 8-byte argument of u64::MAX pairs. Doubling that
    // before the bounds check would overflow `u64` and panic in a debug/overflow-checked build.
    let mut r = Reader::new(&[0xbb, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap();
    assert!(matches!(r.read_start_map().unwrap_err(), CborError::Decoding(_)));
}

#[test]
fn map_declaring_exactly_i64_max_over_two_pairs_is_rejected() {
    println!("<=================== map_size_i64_max_boundary ===================>");
    // A pair count just over i64::MAX / 2 - too large for a definite frame even before checking
    // whether the buffer could actually hold that many items.
    let huge = (i64::MAX as u64 / 2) + 1;
    let mut bytes = vec![0xbb];
    bytes.extend_from_slice(&huge.to_be_bytes());
    let mut r = Reader::new(&bytes).unwrap();
    assert!(matches!(r.read_start_map().unwrap_err(), CborError::Decoding(_)));
}

#[test]
fn array_declaring_u64_max_length_is_rejected_not_reinterpreted_as_indefinite() {
    println!("<=================== array_len_u64_max_sentinel_collision ===================>");
    // Major type 4 (array), additional-info 27: an 8-byte argument of u64::MAX items. Cast naively
    // to i64 this is bit-for-bit -1, the INDEFINITE_LENGTH sentinel - must be rejected instead.
    let mut r = Reader::new(&[0x9b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap();
    assert!(matches!(r.read_start_array().unwrap_err(), CborError::Decoding(_)));
}

#[test]
fn reading_past_a_definite_arrays_declared_length_is_rejected() {
    println!("<=================== read_past_exhausted_array ===================>");
    // [1], 2 - a one-element array followed by a sibling value. Reading a second item out of the
    // array without closing it first must not silently decode the sibling.
    let mut r = Reader::new(&[0x81, 0x01, 0x02]).unwrap();
    assert_eq!(r.read_start_array().unwrap(), 1);
    assert_eq!(r.read_unsigned().unwrap(), 1);
    assert!(matches!(r.read_unsigned().unwrap_err(), CborError::Decoding(_)));
}

#[test]
fn skip_value_steps_cleanly_over_a_deeply_nested_tagged_structure() {
    println!("<=================== skip_value_deeply_nested ===================>");
    // [ 0("2013-03-21T20:04:00Z"), [1, 2, [3, 4]] ]
    let hex = "82c074323031332d30332d32315432303a30343a30305a830102820304";
    let mut r = Reader::from_hex(hex).unwrap();
    assert_eq!(r.read_start_array().unwrap(), 2);
    r.skip_value().unwrap();
    r.skip_value().unwrap();
    r.read_end_array().unwrap();
}

#[test]
fn read_encoded_value_round_trips_an_entire_indefinite_structure() {
    println!("<=================== read_encoded_value_indefinite ===================>");
    let hex = "9f018202039f0405ffff";
    let mut r = Reader::from_hex(hex).unwrap();
    let captured = r.read_encoded_value().unwrap();
    assert_eq!(hex::encode(&captured), hex);
}

#[test]
fn clone_lets_a_caller_speculatively_try_a_branch_and_roll_back() {
    println!("<=================== clone_speculative_rollback ===================>");
    let checkpoint = Reader::from_hex("83010203").unwrap();
    let mut attempt = checkpoint.clone();
    assert_eq!(attempt.read_start_array().unwrap(), 3);
    attempt.read_unsigned().unwrap();

    // Roll back to the checkpoint and take a different path.
    let mut retry = checkpoint.clone();
    assert_eq!(retry.get_bytes_remaining(), 4);
    retry.skip_value().unwrap();
    assert_eq!(retry.peek_state().unwrap(), cardano_cbor::State::Finished);
}

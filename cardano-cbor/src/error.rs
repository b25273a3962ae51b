/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved.
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
 * cardano-cbor Error API
 *
 * The reader and writer are total: every operation returns success or one of the variants below.
 * Errors are never recovered internally - they are handed back to the caller, which may retry
 * from a `clone()`d reader taken before the failed branch was attempted.
 **************************************************************************************************/
use std::result;

use thiserror::Error;

/// An alias for `Result<T, CborError>` used throughout this crate.
pub type Result<T> = result::Result<T, CborError>;

/// `CborError` enumerates every way a `Reader` or `Writer` operation can fail.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CborError {
    /// A caller-side precondition was violated (e.g. constructing a `Reader` over an empty
    /// buffer).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// Any CBOR grammar violation: bad additional-info value, wrong major type for the requested
    /// read, a break code in the wrong position, an integer overflow past the target range, an
    /// unterminated indefinite container, a tag without a following value on `pop`, a map with an
    /// odd item count on close, or a break byte found mid key/value pair.
    #[error("CBOR decoding error: {0}")]
    Decoding(&'static str),
    /// An internal allocation (e.g. growing the concatenation buffer for an indefinite-length
    /// string) failed.
    #[error("memory allocation failed")]
    MemoryAllocationFailed,
    /// An advance would read past the end of the buffer.
    #[error("attempted read past end of buffer")]
    OutOfBoundsMemoryRead,
    /// The observed CBOR state did not match what the caller demanded.
    #[error("unexpected CBOR type: expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
}

impl CborError {
    /// Convenience constructor mirroring `Decoding`, for call sites that want to attach a reason
    /// string at the point of failure rather than threading one down from the caller.
    pub(crate) fn decoding(reason: &'static str) -> CborError {
        CborError::Decoding(reason)
    }
}

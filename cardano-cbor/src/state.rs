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
 * CBOR reader observable state
 **************************************************************************************************/

/// The observable classification of "what the reader would read next", as returned by
/// `Reader::peek_state`. Computing a `State` never consumes input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    Undefined,
    UnsignedInteger,
    NegativeInteger,
    ByteString,
    StartIndefBytes,
    EndIndefBytes,
    TextString,
    StartIndefText,
    EndIndefText,
    StartArray,
    EndArray,
    StartMap,
    EndMap,
    Tag,
    SimpleValue,
    Boolean,
    Null,
    HalfFloat,
    SingleFloat,
    DoubleFloat,
    /// Reached only at the root context when the cursor is at end-of-buffer and no container is
    /// open.
    Finished,
}

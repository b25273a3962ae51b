/***************************************************************************************************
 * Copyright (c) 2020-2022, Qualcomm Innovation Center, Inc. All rights reserved.
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
 * cardano-cbor module definition
 *
 * A streaming CBOR (RFC 8949) reader and writer core, built for the byte-exact round-tripping a
 * blockchain data-handling library needs from its wire-format layer.
 **************************************************************************************************/
#![warn(missing_docs)]

//! # cardano-cbor
//!
//! `cardano-cbor` is a pull-based CBOR ([RFC 8949](https://www.rfc-editor.org/rfc/rfc8949)) reader
//! and writer. It decodes one data item at a time under caller control, rather than building a
//! whole-document AST up front, which keeps it suitable for the large, deeply-nested structures
//! found in Cardano ledger data (transaction bodies, certificates, multi-asset values) without
//! forcing every consumer to pay for a tree it may only partially need.
//!
//! The reader never re-encodes what it reads: lengths, integer widths and float widths are
//! preserved exactly as they appeared in the source bytes, because this library sits underneath
//! code that must reproduce the hashes and signatures of the chain it is parsing.
//!
//! ## What this crate is not
//!
//! This crate has no notion of certificates, governance actions, addresses, hashes, BIP32 key
//! derivation or Plutus data - it is the grammar layer those decoders are built on top of, not
//! those decoders themselves. It does not pretty-print, does not translate to/from JSON, and does
//! not offer concurrent readers over a shared buffer: each [`Reader`] owns its buffer outright.
//!
//! ## Example
//!
//! ```
//! use cardano_cbor::Reader;
//!
//! let mut reader = Reader::from_hex("81182a").unwrap(); // [42]
//! let len = reader.read_start_array().unwrap();
//! assert_eq!(len, 1);
//! assert_eq!(reader.read_unsigned().unwrap(), 42);
//! reader.read_end_array().unwrap();
//! ```

pub(crate) mod constants;
/// Error types returned by every fallible operation in this crate.
pub mod error;
pub(crate) mod frame;
pub(crate) mod initial_byte;
mod reader;
/// Reader observable state, as returned by [`Reader::peek_state`].
pub mod state;
/// An owned, recursively-decoded value tree built on top of the typed readers.
pub mod value;
mod writer;

pub use error::{CborError, Result};
pub use initial_byte::MajorType;
pub use reader::Reader;
pub use state::State;
pub use value::Value;
pub use writer::Writer;

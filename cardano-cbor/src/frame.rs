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
 * CBOR container frame stack
 *
 * A `Frame` records one level of container nesting (array, map, or an indefinite-length
 * bytes/text run). `FrameStack` is the LIFO of frames the `Reader` descends into and climbs back
 * out of as it walks the byte buffer; it owns the "current" frame as a dedicated field for fast
 * access, with everything below it kept in an ordinary `Vec`. There are no back-pointers and no
 * shared mutable aliasing between frames - descending pushes a plain copy of the old current
 * frame onto the stack.
 **************************************************************************************************/
use crate::constants::INDEFINITE_LENGTH;
use crate::error::{CborError, Result};
use crate::initial_byte::MajorType;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// One level of container nesting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// The container's major type. `Undefined` only ever occurs for the root sentinel frame.
    pub major: MajorType,
    /// Byte offset at which this container's header began.
    pub start_offset: usize,
    /// Expected item count, or `INDEFINITE_LENGTH` (-1) for an indefinite-length container. For
    /// maps this is `2 * pair_count` - each key and each value counts as one item.
    pub definite_length: i64,
    /// Items consumed inside this container so far.
    pub items_read: u64,
    /// For map frames only: byte offset of the current key, for canonical-ordering helpers built
    /// on top of the reader. `-1` when unset (not currently between a key and its value).
    pub current_key_offset: i64,
}

impl Frame {
    fn root() -> Frame {
        Frame {
            major: MajorType::Undefined,
            start_offset: 0,
            definite_length: INDEFINITE_LENGTH,
            items_read: 0,
            current_key_offset: -1,
        }
    }

    fn new(major: MajorType, start_offset: usize, definite_length: i64) -> Frame {
        Frame {
            major,
            start_offset,
            definite_length,
            items_read: 0,
            current_key_offset: -1,
        }
    }

    /// `true` if this frame has no declared length (introduced by additional-info 31).
    #[inline]
    pub fn is_indefinite(&self) -> bool {
        self.definite_length == INDEFINITE_LENGTH
    }

    /// `true` if a definite-length frame has consumed exactly as many items as it declared.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        !self.is_indefinite() && self.items_read as i64 == self.definite_length
    }
}

/// The reader's container nesting state: the current frame, everything enclosing it, and whether
/// the last datum read was a tag awaiting its value.
#[derive(Debug, Clone)]
pub struct FrameStack {
    current: Frame,
    stack: Vec<Frame>,
    in_tag_context: bool,
}

impl FrameStack {
    /// A fresh stack positioned at the root (no enclosing container).
    pub fn new() -> FrameStack {
        FrameStack {
            current: Frame::root(),
            stack: Vec::new(),
            in_tag_context: false,
        }
    }

    #[inline]
    pub fn current(&self) -> &Frame {
        &self.current
    }

    #[inline]
    pub fn in_tag_context(&self) -> bool {
        self.in_tag_context
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Record that the datum just read was a tag: the value it annotates has not yet been read.
    #[cfg_attr(feature = "trace", trace)]
    pub fn enter_tag_context(&mut self) {
        self.in_tag_context = true;
    }

    /// Record the byte offset of the key half of a map pair, for canonical-order helpers.
    #[cfg_attr(feature = "trace", trace)]
    pub fn set_current_key_offset(&mut self, offset: usize) {
        self.current.current_key_offset = offset as i64;
    }

    /// Descend into a new container. Saves the current frame on the stack and installs a fresh
    /// current frame of `major` type starting at `start_offset` with the given declared length
    /// (`INDEFINITE_LENGTH` if the container was introduced with additional-info 31).
    #[cfg_attr(feature = "trace", trace)]
    pub fn push(&mut self, major: MajorType, start_offset: usize, definite_length: i64) {
        self.stack.push(self.current);
        self.current = Frame::new(major, start_offset, definite_length);
        self.in_tag_context = false;
    }

    /// Close the current container, which must be of `expected` type.
    ///
    /// Fails when: there is nothing to pop (root); the current frame is not of `expected` type;
    /// a definite-length frame has not consumed all of its declared items; or a tag was read but
    /// never followed by its value.
    #[cfg_attr(feature = "trace", trace)]
    pub fn pop(&mut self, expected: MajorType) -> Result<()> {
        if self.current.major == MajorType::Undefined {
            return Err(CborError::decoding("no open container to end"));
        }
        if self.current.major != expected {
            return Err(CborError::decoding("container type mismatch on close"));
        }
        if !self.current.is_indefinite() && self.current.items_read as i64 != self.current.definite_length {
            return Err(CborError::decoding("container closed before all items were read"));
        }
        if self.in_tag_context {
            return Err(CborError::decoding("tag not followed by a value"));
        }
        // The stack always has at least the root sentinel once we have pushed, and `current`
        // being non-Undefined above guarantees at least one entry is present here.
        self.current = self
            .stack
            .pop()
            .expect("frame stack non-empty when current frame is not the root sentinel");
        Ok(())
    }

    /// Record that one data item (not a tag) was just consumed inside the current frame.
    #[cfg_attr(feature = "trace", trace)]
    pub fn advance_item(&mut self) {
        self.current.items_read += 1;
        self.in_tag_context = false;
    }
}

impl Default for FrameStack {
    fn default() -> Self {
        FrameStack::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_frame_is_undefined_and_indefinite() {
        let fs = FrameStack::new();
        assert_eq!(fs.current().major, MajorType::Undefined);
        assert!(fs.current().is_indefinite());
        assert_eq!(fs.depth(), 0);
    }

    #[test]
    fn push_then_pop_restores_parent() {
        let mut fs = FrameStack::new();
        fs.push(MajorType::Array, 1, 2);
        assert_eq!(fs.current().major, MajorType::Array);
        fs.advance_item();
        fs.advance_item();
        assert!(fs.pop(MajorType::Array).is_ok());
        assert_eq!(fs.current().major, MajorType::Undefined);
    }

    #[test]
    fn pop_rejects_unfinished_definite_container() {
        let mut fs = FrameStack::new();
        fs.push(MajorType::Array, 1, 2);
        fs.advance_item();
        assert!(fs.pop(MajorType::Array).is_err());
    }

    #[test]
    fn pop_rejects_dangling_tag_context() {
        let mut fs = FrameStack::new();
        fs.push(MajorType::Array, 1, -1);
        fs.enter_tag_context();
        assert!(fs.pop(MajorType::Array).is_err());
    }

    #[test]
    fn pop_rejects_type_mismatch() {
        let mut fs = FrameStack::new();
        fs.push(MajorType::Array, 1, -1);
        assert!(fs.pop(MajorType::Map).is_err());
    }

    #[test]
    fn pop_at_root_fails() {
        let mut fs = FrameStack::new();
        assert!(fs.pop(MajorType::Array).is_err());
    }
}

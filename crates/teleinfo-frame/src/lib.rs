//! TeleInfo frame validation and tag extraction.
//!
//! Every frame on the wire carries exactly one tag/value pair:
//! - a start byte (LF, `0x0A`)
//! - the tag, then one or more values, each preceded by a field separator (HT, `0x09`)
//! - a field separator, a one-byte checksum, and an end byte (CR, `0x0D`)
//!
//! Frames are short-lived: read, validated, split into a [`TagValue`], and
//! dropped.

pub mod checksum;
pub mod codec;
pub mod error;
pub mod reader;
pub mod tag;

pub use checksum::{check, compute_checksum};
pub use codec::{encode_frame, Frame, FrameConfig, DEFAULT_MAX_LINE_LEN, END, SEP, START};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use tag::{canonical_tag, parse, TagValue, TAG_ALIASES};

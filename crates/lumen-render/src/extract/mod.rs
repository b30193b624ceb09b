//! Block extractors.
//!
//! Each pass replaces the construct it recognizes with placeholders and
//! stores the payloads in the shared [`ComponentMap`](crate::ComponentMap).
//! Passes must run in order: tables, code fences, math, blockquotes.

mod blockquote;
mod code;
mod math;
mod table;

pub(crate) use blockquote::extract_blockquotes;
pub(crate) use code::extract_code_blocks;
pub(crate) use math::extract_math;
pub(crate) use table::extract_tables;

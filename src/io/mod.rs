//! I/O layer: byte-order aware reads/writes and random-access byte sources.

mod byte_order;
mod source;

pub use byte_order::{
    check_remaining, read_u16_be, read_u16_le, read_u32_be, read_u32_le, read_u64_be, read_u64_le,
    ByteOrder,
};
pub use source::ByteSource;

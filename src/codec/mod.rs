pub mod tree_codec;
pub mod wire;

pub use tree_codec::{decode, decode_payload, encode, encode_payload};
pub use wire::{StoredTask, TaskNodeWire, TaskPayload};

pub mod buffer;

pub use buffer::{
    flush_buffer, BufferStore, Get, KVBuffer, MemStore, OrderedGet, SimpleStore, Store, StoreKV,
};

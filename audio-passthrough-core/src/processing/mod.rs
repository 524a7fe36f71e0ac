pub mod convert;
pub mod ring_buffer;
pub mod stream_queue;

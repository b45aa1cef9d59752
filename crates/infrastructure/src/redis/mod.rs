//! Redis 适配器

mod door_channel;

pub use door_channel::RedisDoorChannel;

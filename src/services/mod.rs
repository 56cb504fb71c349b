pub mod gateway;
pub mod notifier;
pub mod reply_buffer;

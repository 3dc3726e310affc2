pub mod channel_bus;

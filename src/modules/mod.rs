pub mod comms;
pub mod gateway;
pub mod webhook;

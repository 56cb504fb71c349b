pub mod reconciler;
pub mod session_key;
pub mod source;

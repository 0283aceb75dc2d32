pub mod _constants;
pub mod _pending_write;

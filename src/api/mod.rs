pub mod payload;

pub use payload::{json_body, parse_todo_payload, PayloadMode};

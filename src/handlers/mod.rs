// handlers/mod.rs - HTTP handlers
//
// Public: service info, health, token issuance.
// Protected (bearer token): the todo resource.

pub mod health;
pub mod todos;
pub mod token;

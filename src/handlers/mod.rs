//! Component E: one module per request kind, each owning the business rules
//! from its handler's contract.

pub mod authenticate;
pub mod create_room;
pub mod join_room;
pub mod list_room;
pub mod random_match;
pub mod update_room_status;

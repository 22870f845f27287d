pub mod ai;
pub mod bookings;
pub mod conversation;
pub mod dialogue;
pub mod intent;
pub mod matcher;
pub mod render;
pub mod validation;

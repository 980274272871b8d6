pub mod federation;
pub mod health;

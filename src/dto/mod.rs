pub mod health;
pub mod question;
pub mod ws;

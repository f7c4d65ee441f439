pub mod attendance;
pub mod chatbot;
pub mod health;

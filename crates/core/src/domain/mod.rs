pub mod conversation;
pub mod moderation;

pub mod embeddings;
pub mod health;
pub mod notify;
pub mod score;
pub mod search;

pub mod core;
pub mod image;
pub mod llm;
pub mod medical;
pub mod rag;
pub mod server;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;

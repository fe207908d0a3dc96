pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod persona;
pub mod render;
pub mod state;
pub mod surface;
pub mod wire;

// Re-export main types for convenience
pub use client::{CompletionTransport, ResponseBody, WorkerClient, WorkerResponse};
pub use config::Config;
pub use controller::{ChatTurnController, TurnOutcome};
pub use error::ChatError;
pub use render::{add_message, escape_markup, RenderedEntry};
pub use state::{ChatMessage, ChatRole};
pub use surface::{ChatSurface, EntryHandle, MessageLog};
pub use wire::{ChatRequest, Envelope};

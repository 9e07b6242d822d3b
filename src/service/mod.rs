//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by rival-radar:
//! - Chat services (e.g., Slack)
//! - LLM services (e.g., OpenAI)
//! - Web fetching, search providers and news
//!
//! The chat and LLM modules define both generic traits and concrete
//! implementations, allowing for extensibility and easy testing.

pub mod chat;
pub mod llm;
pub mod news;
pub mod search;
pub mod web;

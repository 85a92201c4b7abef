//! Typed HaloITSM API client crate used by the automation plugin.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod retry;

pub use auth::{AccessToken, TokenManager};
pub use client::{HaloClient, RequestOptions};
pub use config::{ClientCredentials, HaloConfig};
pub use error::{HaloError, Result};
pub use models::{FieldRef, NoteCreate, TicketCreate, TicketSearch, TicketUpdate};
pub use retry::RetryPolicy;

pub use reqwest::{Method, StatusCode};

#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage API ergonomics.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # Cadastro
//!
//! Business administration screens built on [`vform`]: customers
//! (entities), items and pre-estimate work orders, each with a paged list
//! and a detail form backed by a REST API.
//!
//! Cadastro provides:
//! - [`PersistenceService`] with [`RestService`] and [`MemoryService`]
//! - [`DetailPage`] / [`DetailController`]: load, validate, save or
//!   save-and-close, delete with confirmation
//! - [`ListController`]: paging and filtering
//! - [`AuthSession`] and [`LoginForm`] for the authentication gate
//! - [`Navigator`] and [`Dialogs`] seams for routing and alerts
//! - [`Config`] loaded from TOML and the environment
//!
//! ## Example
//!
//! ```rust,ignore
//! use cadastro::{DetailPage, Entities, History, MemoryService, Scripted, SubmitOutcome};
//!
//! let mut page = DetailPage::new(Entities, MemoryService::new(), History::new(), Scripted::answering(true));
//! page.open("nova").await?;
//! page.fields().nome.input("Acme".into());
//! if let SubmitOutcome::Invalid(errors) = page.save().await {
//!     for (path, message) in errors.error_map() {
//!         eprintln!("{path}: {message}");
//!     }
//! }
//! ```

pub mod auth;
pub mod config;
pub mod detail;
pub mod dialogs;
pub mod error;
pub mod list;
pub mod logging;
pub mod navigation;
pub mod pages;
pub mod records;
pub mod services;

pub use auth::{AuthService, AuthSession, LoginError, LoginForm, RestAuthService};
pub use config::{ApiConfig, Config, LogConfig};
pub use detail::{DeleteOutcome, DetailController, DetailPage, RecordId, SubmitOutcome};
pub use dialogs::{Dialogs, Scripted, TerminalDialogs};
pub use error::{ConfigError, Result, ServiceError};
pub use list::ListController;
pub use navigation::{DrawerOption, History, NEW_RECORD, Navigator, Routes, drawer_options};
pub use pages::{Entities, EntityKind, Items, WorkOrders};
pub use records::{Categoria, Entity, Item, TransactionSummary, WorkOrder};
pub use services::{MemoryService, Page, PersistenceService, Record, RestClient, RestService};

//! # Portico Tasks
//!
//! A task CRUD service built on the Portico web toolkit. Serves as both a
//! usable service and the reference consumer of the toolkit: a domain
//! model, an in-memory store behind a trait, and handlers wired through
//! the error-mapper machinery.

#![doc(html_root_url = "https://docs.rs/portico-tasks/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod controller;
mod domain;
mod store;

pub use controller::{
    register_routes, task_error_handler, CreateTask, DeleteTask, GetTask, ListTasks,
    TaskController, UpdateTask,
};
pub use domain::{Task, TaskError, TaskPriority, TaskStatus, ValidationError};
pub use store::{MemoryStore, NewTask, TaskFilters, TaskPatch, TaskStore};

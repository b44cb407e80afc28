//! Live canvas runtime: evaluates compiled projects and mounts them.
//!
//! ```text
//! CompiledProject → Loader (lazy, once per scope) → Interpreter → render → Document
//!                                                      ↑
//!                                              ShimTable (react, icons, …)
//! ```
//!
//! An [`ExecutionStrategy`] owns one render: [`IsolatedStrategy`] gets a
//! fresh global scope and document every time, [`SharedStrategy`] mounts
//! into a [`HostPage`] and keeps the result inert. [`RenderSession`] sits
//! on top and makes sure only the latest input is ever shown.

pub mod builtins;
pub mod dom;
pub mod env;
pub mod error;
mod evaluator;
mod hooks;
pub mod loader;
mod render;
pub mod session;
mod shims;
pub mod strategy;
pub mod value;

pub use builtins::{Timers, MAX_ARRAY_LENGTH, MAX_STRING_LENGTH};
pub use dom::{Document, DomSnapshot, NodeId, NodeKind};
pub use env::Env;
pub use error::{EvalError, EvalResult, Location};
pub use evaluator::{ConsoleEntry, ConsoleLevel, Interpreter, MAX_CALL_DEPTH};
pub use loader::Loader;
pub use render::MAX_RENDER_PASSES;
pub use session::{render, RenderInput, RenderRequest, RenderSession, RequestError, RunStatus, Ticket};
pub use shims::ShimTable;
pub use strategy::{
    strategy_for, Event, ExecutionStrategy, HostPage, IsolatedStrategy, Mode, MountedTree, OutcomeReport, PropBag,
    RenderOutcome, SharedStrategy, INERT_ATTRIBUTE, STYLE_ATTRIBUTE,
};
pub use value::Value;

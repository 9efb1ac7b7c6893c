//! Data types exchanged between a workflow node and a human-in-the-loop
//! reviewer.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

/// What kind of decision an [`Interrupt`] is asking a human to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InterruptKind {
    Approval,
    Input,
    Review,
    Breakpoint,
    Error,
}

/// Lifecycle status of an [`Interrupt`]. `Pending` is the only non-terminal
/// value; the other four are each reachable exactly once (see
/// [`InterruptManager`][super::manager::InterruptManager]'s single-assignment
/// guarantee).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InterruptStatus {
    Pending,
    Resolved,
    Rejected,
    Timeout,
    Canceled,
}

impl InterruptStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, InterruptStatus::Pending)
    }
}

/// One selectable choice offered alongside an [`Interrupt`] (e.g. a
/// multiple-choice approval with more options than plain yes/no).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptOption {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl InterruptOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
        }
    }
}

/// A request for an out-of-band human decision, raised mid-workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interrupt {
    pub id: String,
    pub workflow_id: String,
    pub node_id: String,
    pub kind: InterruptKind,
    pub status: InterruptStatus,
    pub title: String,
    pub description: String,
    /// Free-form payload the reviewer's UI renders alongside `title`/`description`.
    pub data: Value,
    pub options: Vec<InterruptOption>,
    /// JSON Schema describing the shape of an expected `input` response, if any.
    pub input_schema: Option<Value>,
    pub response: Option<Response>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub timeout: Duration,
    pub metadata: HashMap<String, Value>,
}

/// The human's answer to an [`Interrupt`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub option_id: Option<String>,
    pub input: Option<Value>,
    pub comment: Option<String>,
    pub approved: bool,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<String>,
    pub metadata: HashMap<String, Value>,
}

impl Response {
    /// The common case: a plain approve/reject with no option or input payload.
    pub fn approval(approved: bool) -> Self {
        Self {
            option_id: None,
            input: None,
            comment: None,
            approved,
            timestamp: Utc::now(),
            user_id: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_option(mut self, option_id: impl Into<String>) -> Self {
        self.option_id = Some(option_id.into());
        self
    }

    pub fn with_input(mut self, input: impl Into<Value>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Inputs to [`InterruptManager::create_interrupt`][super::manager::InterruptManager::create_interrupt].
///
/// `timeout` of [`Duration::ZERO`] is normalized to 24 hours, matching the
/// spec's documented default for an unset timeout.
#[derive(Debug, Clone)]
pub struct CreateInterruptOptions {
    pub workflow_id: String,
    pub node_id: String,
    pub kind: InterruptKind,
    pub title: String,
    pub description: String,
    pub data: Value,
    pub options: Vec<InterruptOption>,
    pub input_schema: Option<Value>,
    pub timeout: Duration,
    pub metadata: HashMap<String, Value>,
}

impl CreateInterruptOptions {
    pub fn new(workflow_id: impl Into<String>, node_id: impl Into<String>, kind: InterruptKind) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            node_id: node_id.into(),
            kind,
            title: String::new(),
            description: String::new(),
            data: Value::Null,
            options: Vec::new(),
            input_schema: None,
            timeout: Duration::ZERO,
            metadata: HashMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = data.into();
        self
    }

    pub fn with_options(mut self, options: Vec<InterruptOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// 24 hours, the default applied when [`CreateInterruptOptions::timeout`] is left at zero.
pub const DEFAULT_INTERRUPT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

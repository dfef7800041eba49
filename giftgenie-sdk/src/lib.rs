//! Progress events and logging macros shared by giftgenie pipelines.
//!
//! A pipeline run emits structured [`WorkflowLog`] events on stderr (one
//! JSON line per event, prefixed with `__GG_EVENT__:`) so a supervising
//! process can follow stage progress without parsing human-readable
//! output. The `log_*!` macros are the only intended way to emit events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structured progress events emitted by a running pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkflowLog {
    /// Stage started
    StageStarted {
        stage: usize,
        name: String,
        total_stages: usize,
    },
    /// Stage completed with a generated (non-fallback) result
    StageCompleted {
        stage: usize,
        name: String,
    },
    /// Stage completed on fixed fallback data
    StageFallback {
        stage: usize,
        name: String,
        reason: String,
    },
    /// Stage failed (run-terminating; backend unreachable)
    StageFailed {
        stage: usize,
        name: String,
        error: String,
    },
    /// Agent call started within a stage
    AgentStarted {
        agent_name: String,
        description: String,
    },
    /// Streaming or interim agent text
    AgentMessage {
        agent_name: String,
        message: String,
    },
    /// Agent call completed
    AgentCompleted {
        agent_name: String,
        result: Option<String>,
    },
    /// Agent call failed
    AgentFailed {
        agent_name: String,
        error: String,
    },
    /// Intermediate artifact written to disk (run log, trace dump)
    StateFileCreated {
        stage: usize,
        file_path: String,
        description: String,
    },
}

impl WorkflowLog {
    /// Emit this event to stderr for supervisor parsing.
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            use std::io::Write;
            eprintln!("__GG_EVENT__:{}", json);
            // Force flush stderr in async/concurrent contexts
            let _ = std::io::stderr().flush();
        }
    }
}

#[macro_export]
macro_rules! log_stage_start {
    ($stage:expr, $name:expr, $total:expr) => {
        $crate::WorkflowLog::StageStarted {
            stage: $stage,
            name: $name.to_string(),
            total_stages: $total,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr, $name:expr) => {
        $crate::WorkflowLog::StageCompleted {
            stage: $stage,
            name: $name.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_fallback {
    ($stage:expr, $name:expr, $reason:expr) => {
        $crate::WorkflowLog::StageFallback {
            stage: $stage,
            name: $name.to_string(),
            reason: $reason.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_failed {
    ($stage:expr, $name:expr, $error:expr) => {
        $crate::WorkflowLog::StageFailed {
            stage: $stage,
            name: $name.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_start {
    ($agent:expr, $desc:expr) => {
        $crate::WorkflowLog::AgentStarted {
            agent_name: $agent.to_string(),
            description: $desc.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_message {
    ($agent:expr, $msg:expr) => {
        $crate::WorkflowLog::AgentMessage {
            agent_name: $agent.to_string(),
            message: $msg.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_complete {
    ($agent:expr) => {
        $crate::WorkflowLog::AgentCompleted {
            agent_name: $agent.to_string(),
            result: None,
        }
        .emit();
    };
    ($agent:expr, $result:expr) => {
        $crate::WorkflowLog::AgentCompleted {
            agent_name: $agent.to_string(),
            result: Some($result.to_string()),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_agent_failed {
    ($agent:expr, $error:expr) => {
        $crate::WorkflowLog::AgentFailed {
            agent_name: $agent.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_state_file {
    ($stage:expr, $path:expr, $desc:expr) => {
        $crate::WorkflowLog::StateFileCreated {
            stage: $stage,
            file_path: $path.to_string(),
            description: $desc.to_string(),
        }
        .emit();
    };
}

/// Handle identifying one pipeline execution.
#[derive(Debug, Clone)]
pub struct RunHandle {
    pub id: Uuid,
    pub started_at: chrono::DateTime<chrono::Local>,
}

impl RunHandle {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: chrono::Local::now(),
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }
}

impl Default for RunHandle {
    fn default() -> Self {
        Self::new()
    }
}

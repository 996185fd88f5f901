//! The single record threaded through one report workflow run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use super::judgment::JudgeAnalysis;
use super::result_set::StructuredResultSet;

/// Who produced a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    DataRequester,
    SqlAgent,
    Synthesizer,
    Judge,
    System,
    Error,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::DataRequester => "data_requester",
            Self::SqlAgent => "sql_agent",
            Self::Synthesizer => "synthesizer",
            Self::Judge => "judge",
            Self::System => "system",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the append-only conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-iteration summary appended after every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    pub quality_score: f64,
    pub top_issues: Vec<String>,
    pub improvements_noted: Vec<String>,
}

/// Phases of the iteration state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    Seeding,
    Synthesizing,
    Judging,
    Deciding,
    Finalizing,
    Done,
}

impl LoopPhase {
    /// Whether `next` is a legal successor of this phase.
    pub fn can_transition_to(self, next: LoopPhase) -> bool {
        matches!(
            (self, next),
            (Self::Seeding, Self::Synthesizing)
                | (Self::Synthesizing, Self::Judging)
                | (Self::Synthesizing, Self::Deciding)
                | (Self::Judging, Self::Deciding)
                | (Self::Deciding, Self::Synthesizing)
                | (Self::Deciding, Self::Finalizing)
                | (Self::Finalizing, Self::Done)
        )
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxIterations,
    QualityThreshold,
    Stagnation,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MaxIterations => "iteration budget exhausted",
            Self::QualityThreshold => "quality threshold reached",
            Self::Stagnation => "improvement stagnated",
        };
        f.write_str(s)
    }
}

/// Outcome of the decision step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Finalize(StopReason),
}

/// Mutable state of one workflow run. A new run always starts from [`WorkflowState::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub run_id: Uuid,
    pub conversation: Vec<ConversationMessage>,
    pub report_artifact_path: Option<PathBuf>,
    pub report_text: String,
    pub judge_analysis: Option<JudgeAnalysis>,
    pub iteration_count: u32,
    /// Feedback from the latest judgment; `None` only before the first one.
    pub feedback: Option<String>,
    /// Iteration whose judgment produced `feedback`.
    #[serde(default)]
    pub feedback_iteration: Option<u32>,
    pub improvement_history: Vec<IterationRecord>,
    pub final_quality_score: f64,
    pub phase: LoopPhase,
    /// Aggregated data, gathered once per run.
    pub source_data: Option<StructuredResultSet>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            conversation: Vec::new(),
            report_artifact_path: None,
            report_text: String::new(),
            judge_analysis: None,
            iteration_count: 0,
            feedback: None,
            feedback_iteration: None,
            improvement_history: Vec::new(),
            final_quality_score: 0.0,
            phase: LoopPhase::Seeding,
            source_data: None,
        }
    }

    pub fn push_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.conversation.push(ConversationMessage {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn last_message(&self) -> Option<&ConversationMessage> {
        self.conversation.last()
    }

    /// Quality scores of every recorded iteration, oldest first.
    pub fn score_trajectory(&self) -> Vec<f64> {
        self.improvement_history
            .iter()
            .map(|r| r.quality_score)
            .collect()
    }

    /// Move to `next`, logging illegal transitions instead of failing.
    pub fn advance(&mut self, next: LoopPhase) {
        if !self.phase.can_transition_to(next) {
            tracing::warn!(from = ?self.phase, to = ?next, "unexpected loop phase transition");
        }
        self.phase = next;
    }

    pub fn is_done(&self) -> bool {
        self.phase == LoopPhase::Done
    }
}

//! Tabs, status areas and error modeling for the dashboard controller.

use std::fmt;

use client_core::ClientError;
use shared::error::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Tab {
    #[default]
    Inbox,
    Library,
    Daily,
    Asr,
    Source,
}

impl Tab {
    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Inbox => "inbox",
            Tab::Library => "library",
            Tab::Daily => "daily",
            Tab::Asr => "asr",
            Tab::Source => "source",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text panes the controller writes results and errors into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusArea {
    InboxLog,
    LibraryLog,
    LibraryDetail,
    DailyNeeds,
    DailyResult,
    DailyReport,
    HealthResult,
    AsrResult,
    SourceLog,
    SourceContent,
}

impl StatusArea {
    pub fn tab(self) -> Tab {
        match self {
            StatusArea::InboxLog => Tab::Inbox,
            StatusArea::LibraryLog | StatusArea::LibraryDetail => Tab::Library,
            StatusArea::DailyNeeds | StatusArea::DailyResult | StatusArea::DailyReport => {
                Tab::Daily
            }
            StatusArea::HealthResult | StatusArea::AsrResult => Tab::Asr,
            StatusArea::SourceLog | StatusArea::SourceContent => Tab::Source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    NotFound,
    Rejected,
    Server,
    Malformed,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    Startup,
    Mappings,
    Upload,
    Scan,
    Inbox,
    Relabel,
    Library,
    Takes,
    TeacherParse,
    DailyBuild,
    Report,
    OpenFolder,
    Seed,
    Health,
    AsrTest,
    Source,
    Audio,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    /// Classifies a client failure. The message is the error's display text,
    /// unmodified, so collaborator bodies reach the status area as sent.
    pub fn from_client(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err {
            ClientError::Transport(_) | ClientError::InvalidUrl(_) => UiErrorCategory::Transport,
            ClientError::Collaborator { code, .. } => match code {
                ErrorCode::NotFound => UiErrorCategory::NotFound,
                ErrorCode::BadRequest | ErrorCode::Forbidden | ErrorCode::Validation => {
                    UiErrorCategory::Rejected
                }
                ErrorCode::Internal => UiErrorCategory::Server,
                ErrorCode::Unknown => UiErrorCategory::Unknown,
            },
            ClientError::Decode { .. } => UiErrorCategory::Malformed,
            ClientError::Validation(_) | ClientError::Io { .. } => UiErrorCategory::Validation,
        };

        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn validation(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Validation,
            context,
            message: message.into(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for UiError {}

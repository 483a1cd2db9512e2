//! User-facing success/error notices built from service results.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Success notice with `success_message`, or an error notice carrying
    /// the error text.
    pub fn from_result<T, E: Display>(
        result: &Result<T, E>,
        title: &str,
        success_message: &str,
    ) -> Self {
        match result {
            Ok(_) => Self::success(title, success_message),
            Err(err) => Self::error(format!("Erro: {title}"), err.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

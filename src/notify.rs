use std::collections::VecDeque;

use crate::error::PortalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

/// A toast the view shows once and then discards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

impl From<&PortalError> for Notification {
    fn from(err: &PortalError) -> Self {
        Notification::error(err.user_message())
    }
}

#[derive(Debug, Default, Clone)]
pub struct Notices {
    queue: VecDeque<Notification>,
}

impl Notices {
    pub fn push(&mut self, notification: Notification) {
        self.queue.push_back(notification);
    }

    pub fn last(&self) -> Option<&Notification> {
        self.queue.back()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        self.queue.drain(..).collect()
    }
}

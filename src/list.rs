use std::collections::{BTreeSet, HashSet};

use tracing::{info, warn};

use crate::client::PortalClient;
use crate::error::PortalError;
use crate::models::Lecture;
use crate::notify::{Notices, Notification};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClassFilter {
    #[default]
    All,
    Class(String),
}

impl ClassFilter {
    pub fn matches(&self, lecture: &Lecture) -> bool {
        match self {
            ClassFilter::All => true,
            ClassFilter::Class(name) => lecture.fields.class_name == *name,
        }
    }
}

/// Case-insensitive substring match on topic, resource person and class,
/// intersected with the class selector.
pub fn filter_lectures<'a>(
    lectures: &'a [Lecture],
    query: &str,
    class: &ClassFilter,
) -> Vec<&'a Lecture> {
    let needle = query.to_lowercase();
    lectures
        .iter()
        .filter(|lecture| class.matches(lecture))
        .filter(|lecture| {
            needle.is_empty()
                || [
                    &lecture.fields.topic,
                    &lecture.fields.resource_person,
                    &lecture.fields.class_name,
                ]
                .iter()
                .any(|value| value.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Distinct non-blank classes, preceded by the "all" option. Names are kept
/// as stored so each option matches its lectures exactly.
pub fn class_options(lectures: &[Lecture]) -> Vec<ClassFilter> {
    let classes: BTreeSet<&str> = lectures
        .iter()
        .map(|lecture| lecture.fields.class_name.as_str())
        .filter(|name| !name.trim().is_empty())
        .collect();
    std::iter::once(ClassFilter::All)
        .chain(classes.into_iter().map(|name| ClassFilter::Class(name.to_string())))
        .collect()
}

/// Fetched lecture collection behind the dashboard, list and report views.
#[derive(Debug, Default)]
pub struct LectureList {
    state: LoadState,
    lectures: Vec<Lecture>,
    deleting: HashSet<String>,
    confirm_pending: Option<String>,
    query: String,
    class_filter: ClassFilter,
    notices: Notices,
}

impl LectureList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    /// The cached collection; empty while a fetch is in flight.
    pub fn lectures(&self) -> &[Lecture] {
        match self.state {
            LoadState::Loading => &[],
            _ => &self.lectures[..],
        }
    }

    pub fn find(&self, id: &str) -> Option<&Lecture> {
        self.lectures().iter().find(|lecture| lecture.id == id)
    }

    pub fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }

    pub async fn refresh(&mut self, client: &PortalClient) -> Result<(), PortalError> {
        self.state = LoadState::Loading;
        match client.list_lectures().await {
            Ok(lectures) => {
                info!(count = lectures.len(), "lectures loaded");
                self.lectures = lectures;
                self.deleting.clear();
                self.confirm_pending = None;
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch lectures");
                self.state = LoadState::Failed;
                self.notices.push(Notification::from(&err));
                Err(err)
            }
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_class_filter(&mut self, filter: ClassFilter) {
        self.class_filter = filter;
    }

    pub fn class_filter(&self) -> &ClassFilter {
        &self.class_filter
    }

    pub fn filtered(&self) -> Vec<&Lecture> {
        filter_lectures(self.lectures(), &self.query, &self.class_filter)
    }

    pub fn class_options(&self) -> Vec<ClassFilter> {
        class_options(self.lectures())
    }

    pub fn is_deleting(&self, id: &str) -> bool {
        self.deleting.contains(id)
    }

    pub fn pending_confirmation(&self) -> Option<&str> {
        self.confirm_pending.as_deref()
    }

    /// First step of a delete: asks the view to show a confirm-or-cancel
    /// prompt for `id`.
    pub fn request_delete(&mut self, id: &str) -> Result<(), PortalError> {
        if self.find(id).is_none() {
            return Err(PortalError::NotFound(format!("Lecture {id} is not in the list")));
        }
        if self.is_deleting(id) {
            return Err(PortalError::Validation("Lecture is already being deleted".into()));
        }
        self.confirm_pending = Some(id.to_string());
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_pending = None;
    }

    pub async fn confirm_delete(&mut self, client: &PortalClient) -> Result<(), PortalError> {
        let Some(id) = self.confirm_pending.take() else {
            return Err(PortalError::Validation("No delete awaiting confirmation".into()));
        };
        self.begin_delete(&id)?;
        let result = client.remove_lecture(&id).await;
        self.finish_delete(&id, result)
    }

    /// Marks `id` as deleting. A second call before the first finishes is
    /// rejected.
    pub fn begin_delete(&mut self, id: &str) -> Result<(), PortalError> {
        if !self.deleting.insert(id.to_string()) {
            return Err(PortalError::Validation("Lecture is already being deleted".into()));
        }
        Ok(())
    }

    pub fn finish_delete(
        &mut self,
        id: &str,
        result: Result<(), PortalError>,
    ) -> Result<(), PortalError> {
        self.deleting.remove(id);
        match result {
            Ok(()) => {
                self.lectures.retain(|lecture| lecture.id != id);
                self.notices
                    .push(Notification::success("Lecture deleted successfully"));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, %id, "failed to delete lecture");
                self.notices.push(Notification::from(&err));
                Err(err)
            }
        }
    }
}

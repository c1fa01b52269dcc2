use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::client::PortalClient;
use crate::error::PortalError;
use crate::models::{AttendanceBatch, ClassInfo, Lecture};
use crate::notify::{Notices, Notification};
use crate::validation::validate_attendance;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AttendanceState {
    #[default]
    NoLectureSelected,
    LoadingClasses {
        lecture_id: String,
    },
    Ready {
        lecture_id: String,
        classes: Vec<ClassInfo>,
        selection: BTreeMap<String, bool>,
    },
}

impl AttendanceState {
    pub fn lecture_id(&self) -> Option<&str> {
        match self {
            AttendanceState::NoLectureSelected => None,
            AttendanceState::LoadingClasses { lecture_id }
            | AttendanceState::Ready { lecture_id, .. } => Some(lecture_id),
        }
    }
}

/// Marks which classes attended a lecture, one lecture at a time.
#[derive(Debug, Default)]
pub struct AttendanceController {
    state: AttendanceState,
    lectures: Vec<Lecture>,
    refetch_after_submit: bool,
    notices: Notices,
}

impl AttendanceController {
    pub fn new(refetch_after_submit: bool) -> Self {
        Self {
            refetch_after_submit,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &AttendanceState {
        &self.state
    }

    pub fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }

    /// Loads the lectures offered in the picker.
    pub async fn load_lectures(&mut self, client: &PortalClient) -> Result<(), PortalError> {
        match client.list_lectures().await {
            Ok(lectures) => {
                self.lectures = lectures;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch lectures for attendance");
                self.notices.push(Notification::from(&err));
                Err(err)
            }
        }
    }

    pub fn lecture_options(&self) -> Vec<(&str, String)> {
        self.lectures
            .iter()
            .map(|lecture| (lecture.id.as_str(), lecture.label()))
            .collect()
    }

    pub fn classes(&self) -> &[ClassInfo] {
        match &self.state {
            AttendanceState::Ready { classes, .. } => classes.as_slice(),
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, AttendanceState::LoadingClasses { .. })
    }

    pub fn can_submit(&self) -> bool {
        !self.is_loading() && !self.classes().is_empty()
    }

    /// Selects a lecture and fetches its eligible classes. An empty id
    /// clears the selection.
    pub async fn select_lecture(
        &mut self,
        client: &PortalClient,
        lecture_id: &str,
    ) -> Result<(), PortalError> {
        if !self.begin_loading(lecture_id) {
            return Ok(());
        }
        let result = client.eligible_classes(lecture_id).await;
        self.finish_loading(lecture_id, result)
    }

    /// Discards any previous class list and selection. Returns whether a
    /// fetch is needed.
    pub fn begin_loading(&mut self, lecture_id: &str) -> bool {
        if lecture_id.is_empty() {
            self.state = AttendanceState::NoLectureSelected;
            return false;
        }
        self.state = AttendanceState::LoadingClasses {
            lecture_id: lecture_id.to_string(),
        };
        true
    }

    /// Applies a class fetch result. Results for a lecture that is no longer
    /// selected are dropped.
    pub fn finish_loading(
        &mut self,
        lecture_id: &str,
        result: Result<Vec<ClassInfo>, PortalError>,
    ) -> Result<(), PortalError> {
        let current = matches!(
            &self.state,
            AttendanceState::LoadingClasses { lecture_id: selected } if selected == lecture_id
        );
        if !current {
            debug!(%lecture_id, "dropping stale class list");
            return Ok(());
        }

        match result {
            Ok(classes) => {
                self.state = AttendanceState::Ready {
                    lecture_id: lecture_id.to_string(),
                    classes,
                    selection: BTreeMap::new(),
                };
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, %lecture_id, "failed to fetch classes");
                self.state = AttendanceState::NoLectureSelected;
                self.notices.push(Notification::from(&err));
                Err(err)
            }
        }
    }

    pub fn toggle(&mut self, class_id: &str) {
        if let AttendanceState::Ready {
            classes, selection, ..
        } = &mut self.state
            && classes.iter().any(|class| class.id == class_id)
        {
            let flag = selection.entry(class_id.to_string()).or_insert(false);
            *flag = !*flag;
        }
    }

    pub fn is_selected(&self, class_id: &str) -> bool {
        match &self.state {
            AttendanceState::Ready { selection, .. } => {
                selection.get(class_id).copied().unwrap_or(false)
            }
            _ => false,
        }
    }

    /// Ids flagged present, in class list order.
    pub fn selected_ids(&self) -> Vec<String> {
        match &self.state {
            AttendanceState::Ready {
                classes, selection, ..
            } => classes
                .iter()
                .filter(|class| selection.get(&class.id).copied().unwrap_or(false))
                .map(|class| class.id.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The batch a submit would post, or the validation failure that blocks it.
    pub fn pending_batch(&self) -> Result<AttendanceBatch, PortalError> {
        if self.is_loading() {
            return Err(PortalError::Validation(
                "Classes are still loading, please wait.".into(),
            ));
        }
        let attended_classes = self.selected_ids();
        let lecture_id = match &self.state {
            AttendanceState::Ready { lecture_id, .. } => Some(lecture_id.as_str()),
            _ => None,
        };
        validate_attendance(lecture_id, attended_classes.len())?;
        Ok(AttendanceBatch {
            lecture_id: lecture_id.unwrap_or_default().to_string(),
            attended_classes,
            date: Utc::now(),
        })
    }

    pub async fn submit(&mut self, client: &PortalClient) -> Result<(), PortalError> {
        let batch = match self.pending_batch() {
            Ok(batch) => batch,
            Err(err) => {
                self.notices.push(Notification::from(&err));
                return Err(err);
            }
        };

        if let Err(err) = client.mark_attendance(&batch).await {
            warn!(error = %err, lecture_id = %batch.lecture_id, "failed to submit attendance");
            self.notices.push(Notification::from(&err));
            return Err(err);
        }

        info!(
            lecture_id = %batch.lecture_id,
            classes = batch.attended_classes.len(),
            "attendance submitted"
        );
        self.notices
            .push(Notification::success("Attendance marked successfully!"));

        if self.refetch_after_submit {
            return self.select_lecture(client, &batch.lecture_id).await;
        }
        self.apply_submitted(&batch.attended_classes);
        Ok(())
    }

    fn apply_submitted(&mut self, submitted: &[String]) {
        if let AttendanceState::Ready {
            classes, selection, ..
        } = &mut self.state
        {
            classes.retain(|class| !submitted.contains(&class.id));
            selection.clear();
        }
    }
}

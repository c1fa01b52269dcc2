use tracing::{info, warn};

use crate::client::PortalClient;
use crate::error::{ErrorKind, PortalError};
use crate::models::{Decision, LectureRequest, NewLectureRequest, RequestKind};
use crate::notify::{Notices, Notification};
use crate::session::{AdminSession, StudentSession};
use crate::validation::validate_request;

/// Student-side form for proposing a new lecture or a change to one.
#[derive(Debug, Default)]
pub struct RequestForm {
    pub kind: RequestKind,
    pub lecture_title: String,
    pub lecture_date: String,
    pub description: String,
    submitting: bool,
    notices: Notices,
}

impl RequestForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }

    fn to_request(&self, roll_number: &str) -> NewLectureRequest {
        NewLectureRequest {
            student_roll_number: roll_number.to_string(),
            kind: self.kind,
            lecture_title: self.lecture_title.clone(),
            lecture_date: self.lecture_date.clone(),
            description: self.description.clone(),
        }
    }

    fn reset(&mut self) {
        self.kind = RequestKind::Add;
        self.lecture_title.clear();
        self.lecture_date.clear();
        self.description.clear();
    }

    pub async fn submit(
        &mut self,
        client: &PortalClient,
        session: Option<&StudentSession>,
    ) -> Result<LectureRequest, PortalError> {
        let roll_number = session
            .map(|s| s.student.roll_number.as_str())
            .unwrap_or_default();
        let request = self.to_request(roll_number);

        let checked = validate_request(&request).and_then(|()| {
            if roll_number.is_empty() {
                Err(PortalError::Authorization("Student not logged in!".into()))
            } else {
                Ok(())
            }
        });
        if let Err(err) = checked {
            let message = match &err {
                PortalError::Authorization(msg) => msg.clone(),
                other => other.user_message(),
            };
            self.notices.push(Notification::error(message));
            return Err(err);
        }

        self.submitting = true;
        let result = client.submit_request(&request).await;
        self.submitting = false;

        match result {
            Ok(created) => {
                self.reset();
                self.notices.push(Notification::success(
                    "Request submitted successfully! Waiting for admin approval.",
                ));
                Ok(created)
            }
            Err(err) => {
                warn!(error = %err, "failed to submit lecture request");
                self.notices.push(Notification::error(
                    "Error submitting request. Please try again.",
                ));
                Err(err)
            }
        }
    }
}

/// Progress of an admin decision on one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DecisionStep {
    #[default]
    Idle,
    /// Waiting for the admin to confirm the action.
    ConfirmPending { id: String, decision: Decision },
    /// Confirmed; waiting for an optional comment before dispatch.
    CommentPending { id: String, decision: Decision },
}

/// Admin view of all lecture requests.
#[derive(Debug, Default)]
pub struct RequestBoard {
    requests: Vec<LectureRequest>,
    loading: bool,
    step: DecisionStep,
    notices: Notices,
}

impl RequestBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> &[LectureRequest] {
        &self.requests
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn step(&self) -> &DecisionStep {
        &self.step
    }

    pub fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }

    pub fn find(&self, id: &str) -> Option<&LectureRequest> {
        self.requests.iter().find(|request| request.id == id)
    }

    /// Decisions offered for a request; none once it has been decided.
    pub fn available_actions(request: &LectureRequest) -> &'static [Decision] {
        if request.is_pending() {
            &[Decision::Approve, Decision::Reject]
        } else {
            &[]
        }
    }

    pub async fn refresh(
        &mut self,
        client: &PortalClient,
        session: &AdminSession,
    ) -> Result<(), PortalError> {
        self.loading = true;
        let result = client.list_requests(session).await;
        self.loading = false;

        match result {
            Ok(requests) => {
                info!(count = requests.len(), "lecture requests loaded");
                self.requests = requests;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch lecture requests");
                let notice = if err.kind() == ErrorKind::Authorization {
                    Notification::from(&err)
                } else {
                    Notification::error("Failed to fetch requests.")
                };
                self.notices.push(notice);
                Err(err)
            }
        }
    }

    pub fn begin_decision(&mut self, id: &str, decision: Decision) -> Result<(), PortalError> {
        let request = self
            .find(id)
            .ok_or_else(|| PortalError::NotFound(format!("Request {id} is not in the list")))?;
        if !Self::available_actions(request).contains(&decision) {
            return Err(PortalError::Validation(
                "Request has already been decided".into(),
            ));
        }
        self.step = DecisionStep::ConfirmPending {
            id: id.to_string(),
            decision,
        };
        Ok(())
    }

    pub fn confirm_decision(&mut self) -> Result<(), PortalError> {
        match std::mem::take(&mut self.step) {
            DecisionStep::ConfirmPending { id, decision } => {
                self.step = DecisionStep::CommentPending { id, decision };
                Ok(())
            }
            other => {
                self.step = other;
                Err(PortalError::Validation("No decision awaiting confirmation".into()))
            }
        }
    }

    pub fn cancel_decision(&mut self) {
        self.step = DecisionStep::Idle;
    }

    /// Dispatches the confirmed decision with an optional comment, then
    /// reloads the whole list so statuses match the server.
    pub async fn submit_decision(
        &mut self,
        client: &PortalClient,
        session: &AdminSession,
        comment: Option<&str>,
    ) -> Result<(), PortalError> {
        let (id, decision) = match std::mem::take(&mut self.step) {
            DecisionStep::CommentPending { id, decision } => (id, decision),
            other => {
                self.step = other;
                return Err(PortalError::Validation(
                    "Decision has not been confirmed".into(),
                ));
            }
        };

        let comment = comment.map(str::trim).unwrap_or_default();
        if let Err(err) = client
            .decide_request(session, &id, decision, comment)
            .await
        {
            warn!(error = %err, %id, %decision, "failed to update request status");
            let notice = if err.kind() == ErrorKind::Authorization {
                Notification::from(&err)
            } else {
                Notification::error("Failed to update request status.")
            };
            self.notices.push(notice);
            return Err(err);
        }

        let message = match decision {
            Decision::Approve => "Request approved",
            Decision::Reject => "Request rejected",
        };
        self.notices.push(Notification::success(message));
        self.refresh(client, session).await
    }
}

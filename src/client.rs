use std::sync::Arc;

use reqwest::Response;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::PortalError;
use crate::models::{
    Attachments, AttendanceBatch, ClassInfo, Decision, Lecture, LectureFields, LectureRequest,
    NewLectureRequest, Student,
};
use crate::session::{AdminSession, StudentSession};
use crate::settings::Settings;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdminLoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct StudentLoginResponse {
    student: Student,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DecisionBody<'a> {
    admin_comments: &'a str,
}

/// HTTP client for the lecture portal backend. Every call is dispatched
/// once; failures are returned to the caller without retrying.
#[derive(Clone, Debug)]
pub struct PortalClient {
    client: reqwest::Client,
    base_url: Arc<Url>,
    uploads_path: Arc<str>,
}

impl PortalClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: Arc::new(base_url),
            uploads_path: Arc::from("uploads"),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut client = Self::new(settings.api_base_url.clone());
        client.uploads_path = Arc::from(settings.uploads_path.as_str());
        client
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, PortalError> {
        let mut url = (*self.base_url).clone();
        url.path_segments_mut()
            .map_err(|_| PortalError::Network(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Display URL of a stored banner or image.
    pub fn media_url(&self, file_name: &str) -> Result<Url, PortalError> {
        let mut segments: Vec<&str> = self
            .uploads_path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        segments.push(file_name);
        self.endpoint(&segments)
    }

    async fn ensure_success(response: Response, what: &str) -> Result<Response, PortalError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message);
        Err(PortalError::from_status(status, what, message))
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
        what: &str,
    ) -> Result<T, PortalError> {
        let response = Self::ensure_success(response, what).await?;
        Ok(response.json::<T>().await?)
    }

    fn lecture_form(fields: &LectureFields, attachments: &Attachments) -> Result<Form, PortalError> {
        let mut form = Form::new();
        for (key, value) in fields.form_pairs() {
            form = form.text(key, value);
        }
        // A slot without a new file is left out of the payload entirely.
        for (slot, file) in attachments.iter() {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)?;
            form = form.part(slot.key(), part);
        }
        Ok(form)
    }

    pub async fn list_lectures(&self) -> Result<Vec<Lecture>, PortalError> {
        let url = self.endpoint(&["api", "lectures"])?;
        debug!(%url, "fetching lectures");
        let response = self.client.get(url).send().await?;
        Self::read_json(response, "Fetch lectures").await
    }

    pub async fn get_lecture(&self, id: &str) -> Result<Lecture, PortalError> {
        let url = self.endpoint(&["api", "lectures", id])?;
        debug!(%url, "fetching lecture");
        let response = self.client.get(url).send().await?;
        Self::read_json(response, "Fetch lecture").await
    }

    pub async fn create_lecture(
        &self,
        fields: &LectureFields,
        attachments: &Attachments,
    ) -> Result<Lecture, PortalError> {
        let url = self.endpoint(&["api", "lectures"])?;
        let form = Self::lecture_form(fields, attachments)?;
        debug!(%url, topic = %fields.topic, "creating lecture");
        let response = self.client.post(url).multipart(form).send().await?;
        let lecture: Lecture = Self::read_json(response, "Add lecture").await?;
        info!(id = %lecture.id, "lecture created");
        Ok(lecture)
    }

    /// Replaces the stored record with `fields`; the caller must send every
    /// field, not only the edited ones.
    pub async fn update_lecture(
        &self,
        id: &str,
        fields: &LectureFields,
        attachments: &Attachments,
    ) -> Result<Lecture, PortalError> {
        let url = self.endpoint(&["api", "lectures", id])?;
        let form = Self::lecture_form(fields, attachments)?;
        debug!(%url, "updating lecture");
        let response = self.client.put(url).multipart(form).send().await?;
        let lecture: Lecture = Self::read_json(response, "Update lecture").await?;
        info!(id = %lecture.id, "lecture updated");
        Ok(lecture)
    }

    pub async fn remove_lecture(&self, id: &str) -> Result<(), PortalError> {
        let url = self.endpoint(&["api", "lectures", id])?;
        debug!(%url, "deleting lecture");
        let response = self.client.delete(url).send().await?;
        Self::ensure_success(response, "Delete lecture").await?;
        info!(%id, "lecture deleted");
        Ok(())
    }

    /// Classes that have not yet been marked as attending `lecture_id`.
    pub async fn eligible_classes(&self, lecture_id: &str) -> Result<Vec<ClassInfo>, PortalError> {
        let mut url = self.endpoint(&["api", "classes"])?;
        url.query_pairs_mut()
            .append_pair("excludeAttendedForLecture", lecture_id);
        debug!(%url, "fetching eligible classes");
        let response = self.client.get(url).send().await?;
        Self::read_json(response, "Fetch classes").await
    }

    pub async fn mark_attendance(&self, batch: &AttendanceBatch) -> Result<(), PortalError> {
        let url = self.endpoint(&["api", "class-attendance", "mark"])?;
        debug!(
            %url,
            lecture_id = %batch.lecture_id,
            classes = batch.attended_classes.len(),
            "marking attendance"
        );
        let response = self.client.post(url).json(batch).send().await?;
        Self::ensure_success(response, "Mark attendance").await?;
        info!(lecture_id = %batch.lecture_id, "attendance marked");
        Ok(())
    }

    pub async fn list_requests(
        &self,
        session: &AdminSession,
    ) -> Result<Vec<LectureRequest>, PortalError> {
        let token = session.bearer()?;
        let url = self.endpoint(&["api", "lecture-requests"])?;
        debug!(%url, "fetching lecture requests");
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await?;
        Self::read_json(response, "Fetch requests").await
    }

    pub async fn submit_request(
        &self,
        request: &NewLectureRequest,
    ) -> Result<LectureRequest, PortalError> {
        let url = self.endpoint(&["api", "lecture-requests"])?;
        debug!(%url, roll_number = %request.student_roll_number, "submitting lecture request");
        let response = self.client.post(url).json(request).send().await?;
        let created: LectureRequest = Self::read_json(response, "Submit request").await?;
        info!(id = %created.id, "lecture request submitted");
        Ok(created)
    }

    pub async fn decide_request(
        &self,
        session: &AdminSession,
        id: &str,
        decision: Decision,
        admin_comments: &str,
    ) -> Result<(), PortalError> {
        let token = session.bearer()?;
        let url = self.endpoint(&["api", "lecture-requests", id, decision.path_segment()])?;
        debug!(%url, "deciding lecture request");
        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .json(&DecisionBody { admin_comments })
            .send()
            .await?;
        Self::ensure_success(response, "Update request status").await?;
        info!(%id, %decision, "lecture request decided");
        Ok(())
    }

    pub async fn admin_login(&self, email: &str, password: &str) -> Result<AdminSession, PortalError> {
        let url = self.endpoint(&["api", "admin", "login"])?;
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: AdminLoginResponse = Self::read_json(response, "Login").await?;
        info!("admin signed in");
        Ok(AdminSession::new(body.token))
    }

    pub async fn student_login(
        &self,
        roll_number: &str,
        name: &str,
    ) -> Result<StudentSession, PortalError> {
        let url = self.endpoint(&["api", "student", "login"])?;
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "rollNumber": roll_number, "name": name }))
            .send()
            .await?;
        let body: StudentLoginResponse = Self::read_json(response, "Login").await?;
        info!(roll_number = %body.student.roll_number, "student signed in");
        Ok(StudentSession {
            student: body.student,
        })
    }
}

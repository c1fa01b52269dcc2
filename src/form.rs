use tracing::warn;
use url::Url;

use crate::client::PortalClient;
use crate::error::PortalError;
use crate::models::{Attachments, Lecture, LectureField, LectureFields, MediaSlot, PendingFile};
use crate::notify::{Notices, Notification};
use crate::validation::validate_lecture_fields;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit { id: String },
}

/// What a view renders in a media slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// A file chosen locally and not uploaded yet.
    Local { file_name: String },
    /// The reference already stored for the lecture.
    Remote(Url),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The draft has been reset for the next entry.
    Created(Lecture),
    /// The draft stays populated; the view navigates away.
    Updated(Lecture),
}

/// Working draft for the Add and Edit lecture views.
#[derive(Debug, Clone)]
pub struct LectureForm {
    mode: FormMode,
    draft: LectureFields,
    attachments: Attachments,
    stored_banner: Option<String>,
    stored_images: Option<String>,
    loading: bool,
    submitting: bool,
    notices: Notices,
}

impl LectureForm {
    pub fn add() -> Self {
        Self::with_mode(FormMode::Add)
    }

    /// An edit form stays in the loading state until [`LectureForm::load`]
    /// succeeds or fails.
    pub fn edit(id: impl Into<String>) -> Self {
        let mut form = Self::with_mode(FormMode::Edit { id: id.into() });
        form.loading = true;
        form
    }

    fn with_mode(mode: FormMode) -> Self {
        Self {
            mode,
            draft: LectureFields::default(),
            attachments: Attachments::default(),
            stored_banner: None,
            stored_images: None,
            loading: false,
            submitting: false,
            notices: Notices::default(),
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &LectureFields {
        &self.draft
    }

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }

    pub async fn load(&mut self, client: &PortalClient) -> Result<(), PortalError> {
        let FormMode::Edit { id } = &self.mode else {
            return Ok(());
        };
        self.loading = true;
        let result = client.get_lecture(id).await;
        self.loading = false;

        match result {
            Ok(lecture) => {
                self.populate(lecture);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load lecture for editing");
                self.notices.push(Notification::from(&err));
                Err(err)
            }
        }
    }

    fn populate(&mut self, lecture: Lecture) {
        self.draft = lecture.fields;
        self.stored_banner = lecture.banner.filter(|name| !name.is_empty());
        self.stored_images = lecture.images.filter(|name| !name.is_empty());
        self.attachments = Attachments::default();
    }

    pub fn set_field(&mut self, field: LectureField, value: impl Into<String>) {
        self.draft.set(field, value);
    }

    /// Same as [`LectureForm::set_field`] but keyed by the wire name, as
    /// form inputs report it.
    pub fn set_field_by_key(&mut self, key: &str, value: impl Into<String>) -> Result<(), PortalError> {
        let field: LectureField = key.parse()?;
        self.set_field(field, value);
        Ok(())
    }

    /// Replaces any file already chosen for `slot`. There is no way to clear
    /// a slot, only to replace it.
    pub fn select_file(&mut self, slot: MediaSlot, file: PendingFile) {
        self.attachments.set(slot, file);
    }

    pub fn preview(&self, client: &PortalClient, slot: MediaSlot) -> Option<Preview> {
        if let Some(file) = self.attachments.get(slot) {
            return Some(Preview::Local {
                file_name: file.file_name.clone(),
            });
        }
        let stored = match slot {
            MediaSlot::Banner => self.stored_banner.as_deref(),
            MediaSlot::Images => self.stored_images.as_deref(),
        }?;
        client
            .media_url(stored)
            .map_err(|err| warn!(error = %err, "failed to build media URL"))
            .ok()
            .map(Preview::Remote)
    }

    pub async fn submit(&mut self, client: &PortalClient) -> Result<SubmitOutcome, PortalError> {
        if let Err(err) = validate_lecture_fields(&self.draft) {
            self.notices.push(Notification::from(&err));
            return Err(err);
        }

        self.submitting = true;
        let result = match &self.mode {
            FormMode::Add => client
                .create_lecture(&self.draft, &self.attachments)
                .await
                .map(SubmitOutcome::Created),
            FormMode::Edit { id } => client
                .update_lecture(id, &self.draft, &self.attachments)
                .await
                .map(SubmitOutcome::Updated),
        };
        self.submitting = false;

        match result {
            Ok(SubmitOutcome::Created(lecture)) => {
                self.draft = LectureFields::default();
                self.attachments = Attachments::default();
                self.notices
                    .push(Notification::success("Lecture added successfully!"));
                Ok(SubmitOutcome::Created(lecture))
            }
            Ok(SubmitOutcome::Updated(lecture)) => {
                // Newly uploaded files now live on the server.
                if let Some(banner) = lecture.media(MediaSlot::Banner) {
                    self.stored_banner = Some(banner.to_string());
                }
                if let Some(images) = lecture.media(MediaSlot::Images) {
                    self.stored_images = Some(images.to_string());
                }
                self.attachments = Attachments::default();
                self.notices
                    .push(Notification::success("Lecture updated successfully!"));
                Ok(SubmitOutcome::Updated(lecture))
            }
            Err(err) => {
                warn!(error = %err, "lecture submission failed");
                self.notices.push(Notification::from(&err));
                Err(err)
            }
        }
    }
}

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PortalError;

/// Editable descriptive fields of a lecture. Absent values are empty strings,
/// the same way the form widgets hold them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct LectureFields {
    pub teacher: String,
    pub venue: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub time: String,
    pub date: String,
    #[serde(deserialize_with = "integer_like")]
    pub strength: String,
    pub resource_person: String,
    pub company: String,
    pub location: String,
    pub designation: String,
    pub topic: String,
}

impl LectureFields {
    pub fn get(&self, field: LectureField) -> &str {
        match field {
            LectureField::Teacher => &self.teacher,
            LectureField::Venue => &self.venue,
            LectureField::Class => &self.class_name,
            LectureField::Time => &self.time,
            LectureField::Date => &self.date,
            LectureField::Strength => &self.strength,
            LectureField::ResourcePerson => &self.resource_person,
            LectureField::Company => &self.company,
            LectureField::Location => &self.location,
            LectureField::Designation => &self.designation,
            LectureField::Topic => &self.topic,
        }
    }

    pub fn set(&mut self, field: LectureField, value: impl Into<String>) {
        let slot = match field {
            LectureField::Teacher => &mut self.teacher,
            LectureField::Venue => &mut self.venue,
            LectureField::Class => &mut self.class_name,
            LectureField::Time => &mut self.time,
            LectureField::Date => &mut self.date,
            LectureField::Strength => &mut self.strength,
            LectureField::ResourcePerson => &mut self.resource_person,
            LectureField::Company => &mut self.company,
            LectureField::Location => &mut self.location,
            LectureField::Designation => &mut self.designation,
            LectureField::Topic => &mut self.topic,
        };
        *slot = value.into();
    }

    /// Every field as a wire key/value pair. Updates replace the whole
    /// record, so unchanged fields are always included.
    pub fn form_pairs(&self) -> Vec<(&'static str, String)> {
        LectureField::ALL
            .iter()
            .map(|field| (field.key(), self.get(*field).to_string()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LectureField {
    Teacher,
    Venue,
    Class,
    Time,
    Date,
    Strength,
    ResourcePerson,
    Company,
    Location,
    Designation,
    Topic,
}

impl LectureField {
    pub const ALL: [LectureField; 11] = [
        LectureField::Teacher,
        LectureField::Venue,
        LectureField::Class,
        LectureField::Time,
        LectureField::Date,
        LectureField::Strength,
        LectureField::ResourcePerson,
        LectureField::Company,
        LectureField::Location,
        LectureField::Designation,
        LectureField::Topic,
    ];

    pub fn key(self) -> &'static str {
        match self {
            LectureField::Teacher => "teacher",
            LectureField::Venue => "venue",
            LectureField::Class => "class",
            LectureField::Time => "time",
            LectureField::Date => "date",
            LectureField::Strength => "strength",
            LectureField::ResourcePerson => "resourcePerson",
            LectureField::Company => "company",
            LectureField::Location => "location",
            LectureField::Designation => "designation",
            LectureField::Topic => "topic",
        }
    }
}

impl FromStr for LectureField {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LectureField::ALL
            .iter()
            .copied()
            .find(|field| field.key() == s)
            .ok_or_else(|| PortalError::Validation(format!("Unknown lecture field: {s}")))
    }
}

/// A persisted lecture as returned by the lecture store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: LectureFields,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub images: Option<String>,
}

impl Lecture {
    pub fn media(&self, slot: MediaSlot) -> Option<&str> {
        let reference = match slot {
            MediaSlot::Banner => self.banner.as_deref(),
            MediaSlot::Images => self.images.as_deref(),
        };
        reference.filter(|name| !name.is_empty())
    }

    /// Label used by lecture pickers.
    pub fn label(&self) -> String {
        format!("{} - {}", self.fields.topic, self.fields.class_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaSlot {
    Banner,
    Images,
}

impl MediaSlot {
    pub fn key(self) -> &'static str {
        match self {
            MediaSlot::Banner => "banner",
            MediaSlot::Images => "images",
        }
    }
}

/// A file chosen by the user but not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PendingFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, PortalError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| PortalError::Validation(format!("Not a file: {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(file_name, bytes))
    }
}

/// Files to upload alongside a lecture; at most one per media slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments {
    pub banner: Option<PendingFile>,
    pub images: Option<PendingFile>,
}

impl Attachments {
    pub fn get(&self, slot: MediaSlot) -> Option<&PendingFile> {
        match slot {
            MediaSlot::Banner => self.banner.as_ref(),
            MediaSlot::Images => self.images.as_ref(),
        }
    }

    pub fn set(&mut self, slot: MediaSlot, file: PendingFile) {
        match slot {
            MediaSlot::Banner => self.banner = Some(file),
            MediaSlot::Images => self.images = Some(file),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MediaSlot, &PendingFile)> {
        [MediaSlot::Banner, MediaSlot::Images]
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|file| (slot, file)))
    }

    pub fn is_empty(&self) -> bool {
        self.banner.is_none() && self.images.is_none()
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// A class eligible for attendance marking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassInfo {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceBatch {
    pub lecture_id: String,
    pub attended_classes: Vec<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    #[default]
    Add,
    Edit,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LectureRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub student_roll_number: String,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub lecture_title: String,
    pub lecture_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub admin_comments: Option<String>,
}

impl LectureRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Body of `POST /api/lecture-requests`; status is implicitly pending.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewLectureRequest {
    pub student_roll_number: String,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub lecture_title: String,
    pub lecture_date: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn path_segment(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub roll_number: String,
    #[serde(default)]
    pub name: String,
}

fn integer_like<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
        Raw::Text(s) => s,
        Raw::Null(()) => String::new(),
    })
}

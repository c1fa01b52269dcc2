use crate::error::PortalError;
use crate::models::{LectureFields, NewLectureRequest};

pub fn validate_lecture_fields(fields: &LectureFields) -> Result<(), PortalError> {
    if fields.resource_person.trim().is_empty() {
        return Err(PortalError::Validation("Resource person is required".into()));
    }
    if fields.topic.trim().is_empty() {
        return Err(PortalError::Validation("Topic is required".into()));
    }
    Ok(())
}

pub fn validate_request(request: &NewLectureRequest) -> Result<(), PortalError> {
    let missing = [
        &request.lecture_title,
        &request.lecture_date,
        &request.description,
    ]
    .iter()
    .any(|value| value.trim().is_empty());
    if missing {
        Err(PortalError::Validation("Please fill all fields".into()))
    } else {
        Ok(())
    }
}

pub fn validate_attendance(lecture_id: Option<&str>, selected: usize) -> Result<(), PortalError> {
    if lecture_id.is_none_or(str::is_empty) {
        return Err(PortalError::Validation("Please select a lecture.".into()));
    }
    if selected == 0 {
        return Err(PortalError::Validation(
            "Please select at least one class.".into(),
        ));
    }
    Ok(())
}

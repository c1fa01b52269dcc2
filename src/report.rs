use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::error::PortalError;
use crate::models::{Lecture, LectureField};

pub const SHEET_NAME: &str = "Lectures";

pub const COLUMNS: [(&str, LectureField); 10] = [
    ("Teacher", LectureField::Teacher),
    ("Venue", LectureField::Venue),
    ("Class", LectureField::Class),
    ("Time", LectureField::Time),
    ("Strength", LectureField::Strength),
    ("Resource Person", LectureField::ResourcePerson),
    ("Company", LectureField::Company),
    ("Location", LectureField::Location),
    ("Designation", LectureField::Designation),
    ("Topic", LectureField::Topic),
];

/// Builds the lectures spreadsheet from an already fetched list.
#[derive(Clone, Default)]
pub struct ReportExporter;

impl ReportExporter {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, lectures: &[Lecture]) -> Result<Vec<u8>, PortalError> {
        if lectures.is_empty() {
            return Err(PortalError::Validation("No lecture data to export".into()));
        }

        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(SHEET_NAME)?;

            for (col, (title, _)) in COLUMNS.iter().enumerate() {
                worksheet.write_string_with_format(0, col as u16, *title, &header)?;
            }

            for (index, lecture) in lectures.iter().enumerate() {
                let row = index as u32 + 1;
                for (col, (_, field)) in COLUMNS.iter().enumerate() {
                    let value = lecture.fields.get(*field);
                    if value.is_empty() {
                        continue;
                    }
                    let col = col as u16;
                    match (*field, value.trim().parse::<u32>()) {
                        (LectureField::Strength, Ok(n)) => {
                            worksheet.write_number(row, col, f64::from(n))?;
                        }
                        _ => {
                            worksheet.write_string(row, col, value)?;
                        }
                    }
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }

    pub async fn write_to(
        &self,
        path: impl AsRef<Path>,
        lectures: &[Lecture],
    ) -> Result<(), PortalError> {
        let bytes = self.generate(lectures)?;
        let path = path.as_ref();
        tokio::fs::write(path, bytes).await?;
        info!(path = %path.display(), rows = lectures.len(), "report written");
        Ok(())
    }
}

use std::path::Path;

use crate::{client::OpenAiClient, ApiResponseOrError};
use reqwest::{
    multipart::{Form, Part},
    Body,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct File {
    pub id: String,
    pub object: String,
    pub created_at: u64,
    pub bytes: u64,
    pub filename: String,
    pub purpose: FilePurpose,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FilePurpose {
    Assistants,
    AssistantsOutput,
    Batch,
    BatchOutput,
    FineTune,
    FineTuneResults,
    Vision,
    UserData,
}

/// Picks the upload name and MIME type for a local path.
///
/// Unknown extensions fall back to `application/octet-stream`.
pub fn upload_metadata(path: &Path) -> (String, String) {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    (filename, mime_type)
}

impl OpenAiClient {
    pub async fn upload_file<B: Into<Body>>(
        &self,
        filename: &str,
        mime_type: &str,
        bytes: B,
        purpose: FilePurpose,
    ) -> ApiResponseOrError<File> {
        let file_part = Part::stream(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)?;

        let form = Form::new()
            .part("file", file_part)
            .text("purpose", purpose.to_string());

        self.post_multipart("files", form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purpose_form_value() {
        assert_eq!(FilePurpose::Assistants.to_string(), "assistants");
        assert_eq!(FilePurpose::FineTuneResults.to_string(), "fine_tune_results");
    }

    #[test]
    fn metadata_from_path() {
        let (name, mime) = upload_metadata(Path::new("reports/q3/report.pdf"));
        assert_eq!(name, "report.pdf");
        assert_eq!(mime, "application/pdf");

        let (name, mime) = upload_metadata(Path::new("notes.unknownext"));
        assert_eq!(name, "notes.unknownext");
        assert_eq!(mime, "application/octet-stream");
    }

    #[test]
    fn deserializes_uploaded_file() {
        let file: File = serde_json::from_str(
            r#"{"id":"file-abc123","object":"file","bytes":120000,"created_at":1677610602,"filename":"report.pdf","purpose":"assistants"}"#,
        )
        .unwrap();
        assert_eq!(file.purpose, FilePurpose::Assistants);
        assert_eq!(file.filename, "report.pdf");
    }
}

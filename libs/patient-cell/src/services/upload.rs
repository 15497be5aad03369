use std::path::Path;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use shared_gateway::BackendClient;
use shared_models::AppError;

use crate::models::{PatientAck, UploadBundle, UploadFile, UploadKind};

pub const UPLOADS_ENDPOINT: &str = "uploads.php";

pub struct UploadService {
    client: Arc<BackendClient>,
}

impl UploadService {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }

    /// Sends every file of the bundle in one multipart request. All files are
    /// checked against their size and type limits before anything is sent.
    pub async fn upload(&self, patient_id: &str, bundle: UploadBundle) -> Result<(), AppError> {
        bundle.validate()?;

        let count = bundle.files().count();
        let mut form = Form::new()
            .text("patient_id", patient_id.to_string())
            .text("upload_type", bundle.uploader.as_str());

        let UploadBundle { video, report, photos, .. } = bundle;
        for file in video.into_iter().chain(report).chain(photos) {
            let field = file.kind.field_name();
            form = form.part(field, file_part(file)?);
        }

        info!("Uploading {} file(s) for patient {}", count, patient_id);
        let _: PatientAck = self.client.upload(UPLOADS_ENDPOINT, form).await?;
        Ok(())
    }

    pub async fn delete_photo(&self, patient_id: &str, photo_path: &str) -> Result<(), AppError> {
        debug!("Deleting photo {} of patient {}", photo_path, patient_id);

        let form = Form::new()
            .text("action", "delete_photo")
            .text("patient_id", patient_id.to_string())
            .text("photo_path", photo_path.to_string());

        let _: PatientAck = self.client.upload(UPLOADS_ENDPOINT, form).await?;
        Ok(())
    }

    pub fn file_url(&self, file_path: &str) -> String {
        self.client.file_url(file_path)
    }
}

fn file_part(file: UploadFile) -> Result<Part, AppError> {
    let mime = file.mime_type();
    Part::bytes(file.data)
        .file_name(file.file_name)
        .mime_str(mime)
        .map_err(|e| AppError::Validation(format!("Unsupported content type {}: {}", mime, e)))
}

/// Reads a file from disk for upload. The file name sent is the path's last component.
pub async fn load_upload_file(kind: UploadKind, path: impl AsRef<Path>) -> Result<UploadFile, AppError> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AppError::Validation(format!("Not a file: {}", path.display())))?
        .to_string();

    let data = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Storage(format!("Cannot read {}: {}", path.display(), e)))?;

    Ok(UploadFile::new(kind, file_name, data))
}

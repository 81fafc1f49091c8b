use crate::{
    domain::ImageFile,
    errors::{UploadError, UploadRejection},
    gateway::ApiGateway,
    routes::Route,
};

/// Largest accepted image, in bytes.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
pub const MAX_TITLE_CHARS: usize = 100;
const ACCEPTED_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// Resolves the MIME type of a picked file: the declared one wins, otherwise guess from the name.
fn resolve_content_type(file: &ImageFile) -> Option<String> {
    file.content_type
        .as_ref()
        .map(|ct| ct.trim().to_ascii_lowercase())
        .or_else(|| {
            mime_guess::from_path(&file.file_name)
                .first_raw()
                .map(|s| s.to_string())
        })
}

/// Checks type and size before anything is sent.
pub fn validate_image(file: &ImageFile) -> Result<String, UploadRejection> {
    let content_type = resolve_content_type(file).unwrap_or_default();
    if !ACCEPTED_TYPES.contains(&content_type.as_str()) {
        return Err(UploadRejection::UnsupportedType(content_type));
    }
    if file.size() > MAX_IMAGE_BYTES {
        return Err(UploadRejection::TooLarge(file.size()));
    }
    Ok(content_type)
}

/// State of the upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    title: String,
    file: Option<ImageFile>,
    error: Option<String>,
    // Set after a successful upload, cleared by the next edit.
    succeeded: bool,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn file(&self) -> Option<&ImageFile> {
        self.file.as_ref()
    }

    /// Inline message to show next to the form.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Submission is only offered with a title and a file.
    pub fn can_submit(&self) -> bool {
        self.file.is_some() && !self.title.trim().is_empty()
    }

    pub fn set_title(&mut self, title: &str) -> Result<(), UploadRejection> {
        if title.chars().count() > MAX_TITLE_CHARS {
            let rejection = UploadRejection::TitleTooLong(MAX_TITLE_CHARS);
            self.error = Some(rejection.to_string());
            return Err(rejection);
        }
        self.title = title.to_string();
        self.succeeded = false;
        Ok(())
    }

    /// Accepts a picked file if it passes validation. A rejected file leaves the previous
    /// selection in place.
    pub fn select_file(&mut self, mut file: ImageFile) -> Result<(), UploadRejection> {
        match validate_image(&file) {
            Ok(content_type) => {
                file.content_type = Some(content_type);
                self.file = Some(file);
                self.error = None;
                self.succeeded = false;
                Ok(())
            }
            Err(rejection) => {
                tracing::debug!(file_name = %file.file_name, %rejection, "Rejected selected file");
                self.error = Some(rejection.to_string());
                Err(rejection)
            }
        }
    }

    pub fn remove_file(&mut self) {
        self.file = None;
        self.error = None;
    }

    /// Sends the meme. On success the form is cleared and the route of the new meme returned.
    pub async fn submit(&mut self, gateway: &ApiGateway) -> Result<Route, UploadError> {
        let title = self.title.trim().to_string();
        let file = match (&self.file, title.is_empty()) {
            (Some(file), false) => file.clone(),
            _ => {
                let rejection = UploadRejection::MissingFields;
                self.error = Some(rejection.to_string());
                return Err(rejection.into());
            }
        };

        self.error = None;
        tracing::info!(%title, file_name = %file.file_name, bytes = file.size(), "Uploading meme");
        let response = gateway.upload_meme(&title, file).await;

        let (code, message) = (response.code, response.message.clone());
        match response.into_data() {
            Some(meme) => {
                tracing::info!(meme_id = %meme.meme_id, "Meme uploaded");
                self.title.clear();
                self.file = None;
                self.succeeded = true;
                Ok(Route::Meme(meme.meme_id))
            }
            None => {
                let err = UploadError::Failed { code, message };
                tracing::warn!(code, "Meme upload failed");
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

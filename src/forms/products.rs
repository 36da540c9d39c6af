use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

/// Maximum allowed length for a product name.
const NAME_MAX_LEN: usize = 128;
const NAME_MAX_LEN_VALIDATOR: u64 = NAME_MAX_LEN as u64;

/// Result type returned by the product form helpers.
pub type ProductFormResult<T> = Result<T, ProductFormError>;

/// Errors that can occur while processing product forms.
#[derive(Debug, Error)]
pub enum ProductFormError {
    /// Validation failures from the `validator` crate.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    /// The provided name is empty after sanitization.
    #[error("product name cannot be empty")]
    EmptyName,
    /// The uploaded file could not be read back from its temporary location.
    #[error("failed to read uploaded file: {0}")]
    Upload(#[from] std::io::Error),
}

/// Multipart payload sent by the front-end when creating or editing a product.
#[derive(Debug, MultipartForm)]
pub struct ProductMultipartForm {
    /// Product name.
    pub name: Text<String>,
    /// JSON-encoded array of tag labels.
    pub tags: Option<Text<String>>,
    /// Optional image upload.
    #[multipart(limit = "10MB")]
    pub file: Option<TempFile>,
}

impl ProductMultipartForm {
    /// Read the upload into memory and hand back a plain form.
    pub fn into_form(self) -> ProductFormResult<ProductForm> {
        let attachment = match self.file {
            Some(file) if file.size > 0 => Some(AttachmentUpload::from_temp_file(&file)?),
            _ => None,
        };

        Ok(ProductForm {
            name: self.name.into_inner(),
            tags: self.tags.map(Text::into_inner),
            attachment,
        })
    }
}

/// File received alongside a product form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    /// Filename reported by the client, used only for its extension.
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl AttachmentUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    fn from_temp_file(file: &TempFile) -> std::io::Result<Self> {
        let bytes = std::fs::read(file.file.path())?;
        Ok(Self::new(file.file_name.clone().unwrap_or_default(), bytes))
    }
}

/// Product create/update request after the multipart stage.
#[derive(Debug, Validate)]
pub struct ProductForm {
    /// Name entered by the user.
    #[validate(length(min = 1, max = NAME_MAX_LEN_VALIDATOR))]
    pub name: String,
    /// Raw tag JSON as submitted.
    pub tags: Option<String>,
    /// Optional uploaded image.
    pub attachment: Option<AttachmentUpload>,
}

/// Validated product data ready for the service layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPayload {
    pub name: String,
    pub tags: Vec<String>,
    pub attachment: Option<AttachmentUpload>,
}

impl ProductForm {
    /// Sanitizes the form, then validates the sanitized values.
    pub fn into_payload(self) -> ProductFormResult<ProductPayload> {
        let form = Self {
            name: sanitize_inline_text(&self.name),
            ..self
        };
        if form.name.is_empty() {
            return Err(ProductFormError::EmptyName);
        }
        form.validate()?;

        Ok(ProductPayload {
            name: form.name,
            tags: parse_tags(form.tags.as_deref()),
            attachment: form.attachment,
        })
    }
}

/// Decode the JSON tag array sent by the client.
///
/// Missing, `null` or malformed input yields no tags rather than an error.
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|value| serde_json::from_str::<Option<Vec<String>>>(value).ok())
        .flatten()
        .unwrap_or_default()
}

fn sanitize_inline_text(input: &str) -> String {
    let mut sanitized = String::with_capacity(input.len());
    let mut previous_whitespace = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            if !previous_whitespace {
                sanitized.push(' ');
                previous_whitespace = true;
            }
        } else if ch.is_control() {
            continue;
        } else {
            sanitized.push(ch);
            previous_whitespace = false;
        }
    }

    sanitized
}

use image::ImageReader;
use std::io::Cursor;
use tracing::warn;
use upstream::{ImageFacts, ImagePart};

use crate::{GatewayConfig, GatewayError};

/// Local checks for one uploaded part: allowed type, non-empty, within size.
pub fn validate_part(label: &str, part: &ImagePart, config: &GatewayConfig) -> Result<(), GatewayError> {
    let content_type = part.content_type.as_deref().unwrap_or_default();
    if !config.accepts_content_type(content_type) {
        return Err(GatewayError::invalid(format!(
            "{label}: unsupported content type '{content_type}', expected one of {}",
            config.allowed_content_types.join(", ")
        )));
    }
    if part.is_empty() {
        return Err(GatewayError::invalid(format!("{label}: file is empty")));
    }
    let size = part.len() as u64;
    if size > config.max_file_bytes {
        return Err(GatewayError::invalid(format!(
            "{label}: file is {:.2}MB, the maximum is {:.0}MB",
            size as f64 / 1024.0 / 1024.0,
            config.max_file_bytes as f64 / 1024.0 / 1024.0
        )));
    }
    Ok(())
}

/// Width and height from the image header, without decoding pixels.
pub fn sniff_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format().ok()?;
    match reader.into_dimensions() {
        Ok(dims) => Some(dims),
        Err(err) => {
            warn!(error = %err, "could not read image dimensions");
            None
        }
    }
}

pub fn image_facts(part: &ImagePart) -> ImageFacts {
    ImageFacts {
        size_bytes: part.len() as u64,
        dimensions: sniff_dimensions(&part.bytes),
    }
}

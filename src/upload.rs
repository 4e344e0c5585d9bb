use crate::error::ProcessingError;
use crate::processing::SourceImage;

/// Extensions accepted for uploads (compared case-insensitively)
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Default upload limit: 20 MiB
pub const DEFAULT_MAX_FILE_SIZE: usize = 20 * 1024 * 1024;

/// Lowercased extension of an uploaded file name, if it is an accepted one
pub fn allowed_extension(file_name: &str) -> Result<String, ProcessingError> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(ProcessingError::UnsupportedFormat(file_name.to_string()))
    }
}

/// Validate an uploaded payload and decode it.
///
/// Checks run cheapest first: name, size, emptiness, then the decode.
pub fn decode_upload(
    file_name: &str,
    data: &[u8],
    max_file_size: usize,
) -> Result<SourceImage, ProcessingError> {
    if file_name.is_empty() {
        return Err(ProcessingError::InvalidRequest("No file selected".to_string()));
    }
    allowed_extension(file_name)?;

    if data.len() > max_file_size {
        return Err(ProcessingError::ImageTooLarge {
            size: data.len(),
            max: max_file_size,
        });
    }

    SourceImage::decode(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(5, 5))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_allowed_extensions() {
        assert_eq!(allowed_extension("chest.JPG").unwrap(), "jpg");
        assert_eq!(allowed_extension("scan.v2.jpeg").unwrap(), "jpeg");
        assert_eq!(allowed_extension("xray.png").unwrap(), "png");
    }

    #[test]
    fn test_rejected_extensions() {
        for name in ["xray.gif", "xray", "png", "xray.png.exe"] {
            assert!(
                matches!(
                    allowed_extension(name),
                    Err(ProcessingError::UnsupportedFormat(_))
                ),
                "accepted {}",
                name
            );
        }
    }

    #[test]
    fn test_oversized_payload_rejected_before_decoding() {
        let data = vec![0u8; 64];
        let result = decode_upload("xray.png", &data, 32);
        assert!(matches!(
            result,
            Err(ProcessingError::ImageTooLarge { size: 64, max: 32 })
        ));
    }

    #[test]
    fn test_empty_payload() {
        let result = decode_upload("xray.png", &[], DEFAULT_MAX_FILE_SIZE);
        assert!(matches!(result, Err(ProcessingError::EmptyInput)));
    }

    #[test]
    fn test_missing_file_name() {
        let result = decode_upload("", &png_bytes(), DEFAULT_MAX_FILE_SIZE);
        assert!(matches!(result, Err(ProcessingError::InvalidRequest(_))));
    }

    #[test]
    fn test_extension_is_not_trusted_for_content() {
        let result = decode_upload("xray.jpg", b"GIF89a not really", DEFAULT_MAX_FILE_SIZE);
        assert!(matches!(result, Err(ProcessingError::Decode(_))));
    }

    #[test]
    fn test_valid_upload_decodes() {
        let source = decode_upload("xray.png", &png_bytes(), DEFAULT_MAX_FILE_SIZE).unwrap();
        assert_eq!(source.dimensions(), (5, 5));
    }
}

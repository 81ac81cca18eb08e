//! 付款凭证文件类型校验
//!
//! 优先使用 multipart part 的 Content-Type；缺失或为 `application/octet-stream`
//! 时按文件扩展名推断 (`mime_guess`)。

use crate::error::{CommerceError, CommerceResult};

/// Accepted proof media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofMedia {
    pub content_type: &'static str,
    pub extension: &'static str,
}

pub const ALLOWED_MEDIA: [ProofMedia; 4] = [
    ProofMedia {
        content_type: "image/jpeg",
        extension: "jpg",
    },
    ProofMedia {
        content_type: "image/png",
        extension: "png",
    },
    ProofMedia {
        content_type: "image/webp",
        extension: "webp",
    },
    ProofMedia {
        content_type: "application/pdf",
        extension: "pdf",
    },
];

fn lookup(essence: &str) -> Option<ProofMedia> {
    let essence = match essence {
        "image/jpg" | "image/pjpeg" => "image/jpeg",
        other => other,
    };
    ALLOWED_MEDIA
        .iter()
        .copied()
        .find(|m| m.content_type == essence)
}

/// Resolve the media type of an uploaded proof
pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> CommerceResult<ProofMedia> {
    let declared = content_type
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    if let Some(essence) = declared {
        return lookup(&essence).ok_or(CommerceError::UnsupportedMediaType(essence));
    }

    let guessed = file_name
        .and_then(|name| mime_guess::from_path(name).first())
        .map(|mime| mime.essence_str().to_string());
    match guessed {
        Some(essence) => lookup(&essence).ok_or(CommerceError::UnsupportedMediaType(essence)),
        None => Err(CommerceError::UnsupportedMediaType(
            file_name.unwrap_or("unknown").to_string(),
        )),
    }
}

/// 大小校验：非空且不超过上限
pub fn validate_size(size: usize, max: usize) -> CommerceResult<()> {
    if size == 0 {
        return Err(CommerceError::InvalidArgument("Payment proof file is empty".into()));
    }
    if size > max {
        return Err(CommerceError::PayloadTooLarge { max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_content_type() {
        let media = detect(Some("image/PNG"), Some("whatever.bin")).unwrap();
        assert_eq!(media.extension, "png");
        let media = detect(Some("image/jpg"), None).unwrap();
        assert_eq!(media.content_type, "image/jpeg");
        let media = detect(Some("application/pdf; charset=binary"), None).unwrap();
        assert_eq!(media.extension, "pdf");
    }

    #[test]
    fn test_detect_falls_back_to_extension() {
        let media = detect(Some("application/octet-stream"), Some("receipt.webp")).unwrap();
        assert_eq!(media.content_type, "image/webp");
        let media = detect(None, Some("receipt.JPEG")).unwrap();
        assert_eq!(media.extension, "jpg");
    }

    #[test]
    fn test_rejects_unsupported() {
        assert!(matches!(
            detect(Some("text/plain"), Some("a.png")),
            Err(CommerceError::UnsupportedMediaType(t)) if t == "text/plain"
        ));
        assert!(matches!(
            detect(None, Some("archive.zip")),
            Err(CommerceError::UnsupportedMediaType(_))
        ));
        assert!(detect(None, None).is_err());
    }

    #[test]
    fn test_validate_size() {
        let max = 10 * 1024 * 1024;
        assert!(validate_size(1, max).is_ok());
        assert!(validate_size(max, max).is_ok());
        assert!(matches!(
            validate_size(max + 1, max),
            Err(CommerceError::PayloadTooLarge { .. })
        ));
        assert!(matches!(
            validate_size(0, max),
            Err(CommerceError::InvalidArgument(_))
        ));
    }
}

//! MIME type to filename extension.

/// Extension used when the content type is absent or unknown.
pub const FALLBACK_EXTENSION: &str = ".bin";

/// Preferred extensions for types where the registry lists several (e.g. jpeg: jfif, jpe, jpeg, jpg).
const PREFERRED: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    ("application/rtf", "rtf"),
    ("application/zip", "zip"),
    ("text/plain", "txt"),
    ("audio/ogg", "ogg"),
    ("audio/mpeg", "mp3"),
    ("audio/mp4", "m4a"),
    ("audio/aac", "aac"),
    ("audio/amr", "amr"),
    ("video/mp4", "mp4"),
    ("video/3gpp", "3gp"),
];

/// Map a declared or observed content type to a file extension (with leading dot).
/// MIME parameters are ignored. Never fails: unknown, empty or absent types map to [`FALLBACK_EXTENSION`].
pub fn extension_for(content_type: Option<&str>) -> String {
    let Some(essence) = content_type.and_then(mime_essence) else {
        return FALLBACK_EXTENSION.to_string();
    };
    let ext = PREFERRED
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(&essence).and_then(|exts| exts.first().copied())
        });
    match ext {
        Some(ext) => format!(".{}", ext),
        None => FALLBACK_EXTENSION.to_string(),
    }
}

/// "Audio/OGG; codecs=opus" -> "audio/ogg". None when nothing type-like remains.
fn mime_essence(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    if essence.is_empty() || !essence.contains('/') {
        None
    } else {
        Some(essence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_document_types() {
        assert_eq!(extension_for(Some("application/pdf")), ".pdf");
        assert_eq!(extension_for(Some("image/jpeg")), ".jpg");
        assert_eq!(
            extension_for(Some(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            )),
            ".docx"
        );
    }

    #[test]
    fn parameters_and_case_are_ignored() {
        assert_eq!(extension_for(Some("audio/ogg; codecs=opus")), ".ogg");
        assert_eq!(extension_for(Some("Application/PDF")), ".pdf");
    }

    #[test]
    fn falls_back_to_registry_for_other_known_types() {
        let ext = extension_for(Some("text/csv"));
        assert_eq!(ext, ".csv");
    }

    #[test]
    fn unknown_or_missing_types_use_fallback() {
        for ct in [
            None,
            Some(""),
            Some("   "),
            Some("garbage"),
            Some("application/x-definitely-not-registered"),
            Some(";charset=utf-8"),
        ] {
            assert_eq!(extension_for(ct), FALLBACK_EXTENSION, "content type {:?}", ct);
        }
    }
}

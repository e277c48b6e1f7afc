//! Document ingestion: extension gate plus the system-event directive handed
//! to the cycle endpoint. Only plain-text payloads are accepted; binary
//! document formats never reach the brain.

/// Extensions accepted as already-text content.
pub const TEXT_EXTENSIONS: [&str; 5] = ["txt", "md", "json", "js", "ts"];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Legacy .doc binary format is not supported. Convert to plain text and upload again.")]
    LegacyDoc,
    #[error("Binary .docx is not supported here. Export as plain text (.txt, .md) and upload again.")]
    BinaryDocx,
    #[error("Unsupported file type: {0}. Please upload plain-text documents (.txt, .md, .json).")]
    Unsupported(String),
    #[error("Document '{0}' is empty.")]
    Empty(String),
}

impl IngestError {
    /// Console-facing diagnostic line.
    pub fn console_message(&self) -> String {
        format!("Upload Failed: {}", self)
    }
}

/// Validates a file name against the extension gate.
pub fn validate_document(file_name: &str, content: &str) -> Result<(), IngestError> {
    let lowered = file_name.to_lowercase();
    let extension = lowered.rsplit('.').next().unwrap_or_default();

    if lowered.ends_with(".doc") {
        return Err(IngestError::LegacyDoc);
    }
    if lowered.ends_with(".docx") {
        return Err(IngestError::BinaryDocx);
    }
    if !lowered.contains('.') || !TEXT_EXTENSIONS.contains(&extension) {
        return Err(IngestError::Unsupported(file_name.to_string()));
    }
    if content.trim().is_empty() {
        return Err(IngestError::Empty(file_name.to_string()));
    }
    Ok(())
}

/// Builds the system-event directive wrapping an uploaded document.
pub fn build_document_directive(file_name: &str, content: &str) -> String {
    format!(
        "[SYSTEM EVENT: USER UPLOADED DOCUMENT '{}']\n\nCONTENT BEGINS:\n{}\n\nCONTENT ENDS.\n\nDirective: Read, summarize, and memorize.",
        file_name, content
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_extensions_pass() {
        for name in ["notes.txt", "README.md", "data.JSON", "script.ts"] {
            assert!(validate_document(name, "content").is_ok(), "{}", name);
        }
    }

    #[test]
    fn legacy_doc_gets_its_own_message() {
        let err = validate_document("report.doc", "x").unwrap_err();
        assert!(matches!(err, IngestError::LegacyDoc));
        assert!(err.to_string().contains("Legacy .doc"));
    }

    #[test]
    fn docx_is_rejected_as_binary() {
        assert!(matches!(
            validate_document("report.docx", "x"),
            Err(IngestError::BinaryDocx)
        ));
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        assert!(matches!(
            validate_document("image.png", "x"),
            Err(IngestError::Unsupported(_))
        ));
        assert!(matches!(
            validate_document("no_extension", "x"),
            Err(IngestError::Unsupported(_))
        ));
    }

    #[test]
    fn empty_content_is_rejected() {
        assert!(matches!(
            validate_document("notes.txt", "   "),
            Err(IngestError::Empty(_))
        ));
    }

    #[test]
    fn directive_wraps_content_with_markers() {
        let directive = build_document_directive("notes.md", "hello world");
        assert!(directive.starts_with("[SYSTEM EVENT: USER UPLOADED DOCUMENT 'notes.md']"));
        assert!(directive.contains("CONTENT BEGINS:\nhello world\n"));
        assert!(directive.ends_with("Directive: Read, summarize, and memorize."));
    }
}

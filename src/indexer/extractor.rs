use std::path::Path;

use crate::error::{RagError, Result};

/// A source document: one PDF file and its extracted text.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: String,
    pub text: String,
}

pub fn extract_pdf(path: &Path) -> Result<Document> {
    let text = pdf_extract::extract_text(path).map_err(|e| RagError::Extraction {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(Document {
        source: path.display().to_string(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_pdf_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not really a pdf").unwrap();

        match extract_pdf(&path) {
            Err(RagError::Extraction { path: reported, .. }) => {
                assert!(reported.ends_with("broken.pdf"));
            }
            other => panic!("expected extraction error, got {:?}", other.map(|d| d.source)),
        }
    }
}

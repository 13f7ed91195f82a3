use std::io::{Cursor, Read};
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error("Text file is not valid UTF-8 (byte {0})")]
    NotUtf8(usize),
    #[error("No text could be extracted from the document")]
    Empty,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    WordDocument,
    /// Carries the declared type or extension that was not recognised.
    Unsupported(String),
}

impl DocumentKind {
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "text/plain" | "text/markdown" => DocumentKind::PlainText,
            "application/pdf" => DocumentKind::Pdf,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                DocumentKind::WordDocument
            }
            _ => DocumentKind::Unsupported(essence),
        }
    }

    pub fn from_filename(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "text" | "md" | "markdown" => DocumentKind::PlainText,
            "pdf" => DocumentKind::Pdf,
            "docx" => DocumentKind::WordDocument,
            other => DocumentKind::Unsupported(other.to_string()),
        }
    }

    /// Declared MIME type wins unless it is missing or generic.
    pub fn detect(name: &str, mime: Option<&str>) -> Self {
        match mime.map(Self::from_mime) {
            Some(DocumentKind::Unsupported(_)) | None => Self::from_filename(name),
            Some(kind) => kind,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::PlainText => write!(f, "text"),
            DocumentKind::Pdf => write!(f, "pdf"),
            DocumentKind::WordDocument => write!(f, "docx"),
            DocumentKind::Unsupported(t) => write!(f, "unsupported ({t})"),
        }
    }
}

/// Extract plain text from `bytes`. An empty result is an error.
pub fn extract(kind: &DocumentKind, bytes: &[u8]) -> Result<String, ExtractionError> {
    let text = match kind {
        DocumentKind::PlainText => String::from_utf8(bytes.to_vec())
            .map_err(|e| ExtractionError::NotUtf8(e.utf8_error().valid_up_to()))?,
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))?,
        DocumentKind::WordDocument => extract_docx(bytes)?,
        DocumentKind::Unsupported(t) => return Err(ExtractionError::Unsupported(t.clone())),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractionError::Empty);
    }
    Ok(text.to_string())
}

pub fn extract_file(path: &Path) -> Result<(DocumentKind, String), ExtractionError> {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let kind = DocumentKind::from_filename(name);
    if let DocumentKind::Unsupported(t) = &kind {
        return Err(ExtractionError::Unsupported(t.clone()));
    }
    let bytes = std::fs::read(path)?;
    let text = extract(&kind, &bytes)?;
    Ok((kind, text))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Docx(format!("not a DOCX archive: {e}")))?;
    let mut file = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::Docx(format!("missing word/document.xml: {e}")))?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(format!("unreadable document.xml: {e}")))?;
    Ok(wordml_text(&xml))
}

/// Text runs of a WordprocessingML body; paragraphs and breaks become newlines.
fn wordml_text(xml: &str) -> String {
    let mut out = String::new();
    let mut in_text = false;
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        if in_text {
            out.push_str(&decode_entities(&rest[..open]));
        }
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let tag = &rest[open + 1..open + close];
        let self_closing = tag.ends_with('/');
        let name = tag.trim_end_matches('/').split_whitespace().next().unwrap_or("");

        match name {
            "w:t" => in_text = !self_closing,
            "/w:t" => in_text = false,
            "w:tab" => out.push('\t'),
            "w:br" | "w:cr" | "/w:p" => out.push('\n'),
            _ => {}
        }
        rest = &rest[open + close + 1..];
    }

    out
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 12)
            .and_then(|end| entity_char(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Named XML entities and numeric references (`&#8217;`, `&#x2019;`).
fn entity_char(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let opts = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("word/document.xml", opts).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn detects_by_mime_then_extension() {
        assert_eq!(DocumentKind::from_mime("text/plain; charset=utf-8"), DocumentKind::PlainText);
        assert_eq!(DocumentKind::from_mime("application/pdf"), DocumentKind::Pdf);
        assert_eq!(
            DocumentKind::detect("report.docx", Some("application/octet-stream")),
            DocumentKind::WordDocument
        );
        assert_eq!(DocumentKind::detect("notes.TXT", None), DocumentKind::PlainText);
        assert_eq!(
            DocumentKind::detect("image.png", None),
            DocumentKind::Unsupported("png".into())
        );
    }

    #[test]
    fn plain_text_is_trimmed() {
        assert_eq!(extract(&DocumentKind::PlainText, b"  hello\n").unwrap(), "hello");
    }

    #[test]
    fn invalid_utf8_text_is_rejected() {
        let err = extract(&DocumentKind::PlainText, b"caf\xe9 au lait").unwrap_err();
        assert!(matches!(err, ExtractionError::NotUtf8(3)));
    }

    #[test]
    fn entities_decode_named_and_numeric() {
        assert_eq!(decode_entities("it&#x2019;s &lt;ok&gt; &amp;&#65;"), "it\u{2019}s <ok> &A");
        assert_eq!(decode_entities("AT&T &bogus; &#xZZ;"), "AT&T &bogus; &#xZZ;");
    }

    #[test]
    fn blank_text_is_empty_error() {
        let err = extract(&DocumentKind::PlainText, b" \n\t").unwrap_err();
        assert!(matches!(err, ExtractionError::Empty));
    }

    #[test]
    fn unsupported_kind_is_rejected() {
        let err = extract(&DocumentKind::Unsupported("png".into()), b"...").unwrap_err();
        assert!(matches!(err, ExtractionError::Unsupported(t) if t == "png"));
    }

    #[test]
    fn docx_paragraphs_become_lines() {
        let xml = r#"<w:document><w:body>
            <w:p><w:pPr/><w:r><w:t>Quarterly</w:t></w:r><w:r><w:t xml:space="preserve"> results &amp; outlook</w:t></w:r></w:p>
            <w:p><w:r><w:t>Second</w:t><w:br/><w:t>line</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = extract(&DocumentKind::WordDocument, &docx_bytes(xml)).unwrap();
        assert_eq!(text, "Quarterly results & outlook\nSecond\nline");
    }

    #[test]
    fn non_zip_docx_fails() {
        let err = extract(&DocumentKind::WordDocument, b"plain bytes").unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)));
    }

    #[test]
    fn extract_file_reads_text() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("doc.txt");
        std::fs::write(&path, "Some words here.").unwrap();
        let (kind, text) = extract_file(&path).unwrap();
        assert_eq!(kind, DocumentKind::PlainText);
        assert_eq!(text, "Some words here.");
    }
}

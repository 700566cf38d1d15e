//! Message and artifact part types.
//!
//! Parts are the building blocks of messages and artifacts in the A2A
//! protocol. The `kind` discriminator selects between text, structured
//! data, and file references.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A discriminated union representing a part of a message or artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    /// A text content part.
    Text(TextPart),
    /// A structured data part.
    Data(DataPart),
    /// A file content part.
    File(FilePart),
}

impl Part {
    /// Creates a new text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(TextPart::new(text))
    }

    /// Creates a new data part.
    pub fn data(data: HashMap<String, serde_json::Value>) -> Self {
        Part::Data(DataPart::new(data))
    }

    /// Creates a new file part with base64-encoded bytes.
    pub fn file_bytes(bytes: impl Into<String>, mime_type: Option<String>) -> Self {
        Part::File(FilePart::with_bytes(bytes, mime_type))
    }

    /// Creates a new file part referencing a URL.
    pub fn file_url(url: impl Into<String>, mime_type: Option<String>) -> Self {
        Part::File(FilePart::with_url(url, mime_type))
    }

    /// Returns true if this is a text part.
    pub fn is_text(&self) -> bool {
        matches!(self, Part::Text(_))
    }

    /// Returns true if this is a file part.
    pub fn is_file(&self) -> bool {
        matches!(self, Part::File(_))
    }

    /// Returns true if this is a data part.
    pub fn is_data(&self) -> bool {
        matches!(self, Part::Data(_))
    }

    /// Returns the text content if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(p) => Some(&p.text),
            _ => None,
        }
    }
}

/// Represents a text segment within a message or artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextPart {
    /// The string content of the text part.
    pub text: String,
    /// Optional metadata associated with this part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl TextPart {
    /// Creates a new text part.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: None,
        }
    }

    /// Sets the metadata for this part.
    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Represents a structured data segment within a message or artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataPart {
    /// The structured data content.
    pub data: HashMap<String, serde_json::Value>,
    /// Optional metadata associated with this part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl DataPart {
    /// Creates a new data part.
    pub fn new(data: HashMap<String, serde_json::Value>) -> Self {
        Self {
            data,
            metadata: None,
        }
    }
}

/// Represents a file segment within a message or artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilePart {
    /// The file content, provided inline or by reference.
    pub file: FileContent,
    /// Optional metadata associated with this part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl FilePart {
    /// Creates a new file part with base64-encoded bytes content.
    pub fn with_bytes(bytes: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            file: FileContent::Bytes(FileWithBytes {
                bytes: bytes.into(),
                mime_type,
                name: None,
            }),
            metadata: None,
        }
    }

    /// Creates a new file part with URL content.
    pub fn with_url(url: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            file: FileContent::Url(FileWithUrl {
                url: url.into(),
                mime_type,
                name: None,
            }),
            metadata: None,
        }
    }
}

/// File content can be provided as bytes or as a URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FileContent {
    /// File content provided as base64-encoded bytes.
    Bytes(FileWithBytes),
    /// File content located at a URL.
    Url(FileWithUrl),
}

impl FileContent {
    /// Returns the MIME type of the file, if set.
    pub fn mime_type(&self) -> Option<&str> {
        match self {
            Self::Bytes(f) => f.mime_type.as_deref(),
            Self::Url(f) => f.mime_type.as_deref(),
        }
    }

    /// Returns the name of the file, if set.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Bytes(f) => f.name.as_deref(),
            Self::Url(f) => f.name.as_deref(),
        }
    }
}

/// Represents a file with its content provided as base64-encoded bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileWithBytes {
    /// The base64-encoded content of the file.
    pub bytes: String,
    /// The MIME type of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// An optional name for the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Represents a file with its content located at a URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileWithUrl {
    /// A URL pointing to the file's content.
    pub url: String,
    /// The MIME type of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// An optional name for the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_part_serialization() {
        let part = Part::text("Hello, world!");
        let json = serde_json::to_string(&part).unwrap();
        assert!(json.contains("\"kind\":\"text\""));
        assert!(json.contains("Hello, world!"));
    }

    #[test]
    fn test_data_part_serialization() {
        let mut data = HashMap::new();
        data.insert("answer".to_string(), serde_json::json!(42));
        let part = Part::data(data);
        let json = serde_json::to_string(&part).unwrap();
        assert!(json.contains("\"kind\":\"data\""));
    }

    #[test]
    fn test_file_part_bytes_vs_url() {
        let bytes = Part::file_bytes("SGVsbG8=", Some("text/plain".into()));
        let json = serde_json::to_string(&bytes).unwrap();
        assert!(json.contains("\"bytes\""));
        assert!(!json.contains("\"url\""));

        let url = Part::file_url("https://example.com/report.pdf", None);
        let json = serde_json::to_string(&url).unwrap();
        assert!(json.contains("\"url\""));

        let parsed: Part = serde_json::from_str(&json).unwrap();
        assert!(parsed.is_file());
    }

    #[test]
    fn test_part_as_text() {
        let part = Part::text("test");
        assert_eq!(part.as_text(), Some("test"));
        assert!(Part::data(HashMap::new()).as_text().is_none());
    }
}

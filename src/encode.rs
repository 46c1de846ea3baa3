//! Content-type driven payload encoding.
//!
//! The encoder turns the options' payload value (and optional file
//! attachments) into request-body bytes. The declared `Content-Type` header
//! selects the encoding; anything unrecognized, including an absent header,
//! encodes as JSON. Multipart encoding also produces the boundary-carrying
//! content type that must replace the caller's header.

use crate::{Error, Result};
use rand::Rng;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub(crate) const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub(crate) const MULTIPART_FORM_DATA: &str = "multipart/form-data";
pub(crate) const APPLICATION_XML: &str = "application/xml";
pub(crate) const APPLICATION_JSON: &str = "application/json";

/// The outcome of encoding a payload.
pub(crate) struct EncodedBody {
    pub bytes: Vec<u8>,
    /// Set when the encoder determines the content type itself (multipart).
    pub content_type: Option<String>,
}

/// Encodes `payload` and `files` according to the declared content type.
///
/// `content_type` is the media-type essence (no parameters, lowercased);
/// callers extract it from the header value.
pub(crate) fn encode_payload(
    content_type: Option<&str>,
    payload: Option<&Value>,
    files: &BTreeMap<String, PathBuf>,
) -> Result<EncodedBody> {
    match content_type {
        Some(FORM_URLENCODED) => encode_form(payload),
        Some(MULTIPART_FORM_DATA) => encode_multipart(payload, files),
        Some(APPLICATION_XML) => encode_xml(payload),
        _ => encode_json(payload),
    }
}

fn encode_json(payload: Option<&Value>) -> Result<EncodedBody> {
    // A files-only call with a JSON content type serializes the absent
    // payload as `null`, matching the original behavior.
    let bytes = serde_json::to_vec(payload.unwrap_or(&Value::Null))
        .map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(EncodedBody {
        bytes,
        content_type: None,
    })
}

fn encode_form(payload: Option<&Value>) -> Result<EncodedBody> {
    let pairs = payload
        .and_then(as_string_map)
        .ok_or(Error::PayloadShape {
            content_type: FORM_URLENCODED,
            expected: "a map of string keys to string values",
        })?;

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    Ok(EncodedBody {
        bytes: serializer.finish().into_bytes(),
        content_type: None,
    })
}

fn encode_multipart(
    payload: Option<&Value>,
    files: &BTreeMap<String, PathBuf>,
) -> Result<EncodedBody> {
    let fields = payload
        .and_then(as_string_map)
        .ok_or(Error::PayloadShape {
            content_type: MULTIPART_FORM_DATA,
            expected: "a map of string keys to string values",
        })?;

    let boundary = format!("----easycall-{:032x}", rand::thread_rng().gen::<u128>());
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    for (field, path) in files {
        let contents = std::fs::read(path).map_err(|source| Error::Attachment {
            path: path.clone(),
            source,
        })?;
        let filename = base_name(path);
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&contents);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Ok(EncodedBody {
        bytes: body,
        content_type: Some(format!("{MULTIPART_FORM_DATA}; boundary={boundary}")),
    })
}

fn encode_xml(payload: Option<&Value>) -> Result<EncodedBody> {
    let root = payload
        .and_then(Value::as_object)
        .ok_or(Error::PayloadShape {
            content_type: APPLICATION_XML,
            expected: "a map, nesting maps and strings",
        })?;

    let mut out = String::new();
    for (index, (name, value)) in root.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        write_element(&mut out, name, value, 0);
    }
    Ok(EncodedBody {
        bytes: out.into_bytes(),
        content_type: None,
    })
}

/// One element per key; nested maps become child elements, non-string
/// scalars are stringified. Two-space indentation per depth level.
fn write_element(out: &mut String, name: &str, value: &Value, depth: usize) {
    let pad = "  ".repeat(depth);
    match value {
        Value::Object(children) => {
            out.push_str(&format!("{pad}<{name}>\n"));
            for (child_name, child_value) in children {
                write_element(out, child_name, child_value, depth + 1);
                out.push('\n');
            }
            out.push_str(&format!("{pad}</{name}>"));
        }
        Value::String(text) => {
            out.push_str(&format!("{pad}<{name}>{}</{name}>", escape_xml(text)));
        }
        other => {
            out.push_str(&format!(
                "{pad}<{name}>{}</{name}>",
                escape_xml(&other.to_string())
            ));
        }
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn as_string_map(value: &Value) -> Option<Vec<(&str, &str)>> {
    let object = value.as_object()?;
    object
        .iter()
        .map(|(key, value)| value.as_str().map(|text| (key.as_str(), text)))
        .collect()
}

fn base_name(path: &Path) -> &str {
    path.file_name().and_then(|name| name.to_str()).unwrap_or("file")
}

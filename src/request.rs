//! Request construction.
//!
//! [`PreparedRequest`] combines the client's endpoint, the call method, and a
//! [`CallOptions`] record into a fully formed request: body encoded according
//! to the declared content type, headers applied, query parameters appended,
//! and the cache binding carried along for dispatch.

use crate::encode::{encode_payload, APPLICATION_JSON};
use crate::options::{CacheBinding, CallOptions};
use crate::{Error, Result};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method};
use url::Url;

/// A fully formed request, ready for the execution engine.
pub(crate) struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub cache: Option<CacheBinding>,
}

impl PreparedRequest {
    /// Builds a request from the endpoint and options.
    ///
    /// Payload-shape and attachment failures surface here, before any
    /// network I/O.
    pub fn build(method: Method, endpoint: &Url, options: CallOptions) -> Result<Self> {
        let CallOptions {
            mut headers,
            queries,
            files,
            payload,
            cache,
        } = options;

        let body = if payload.is_some() || !files.is_empty() {
            let declared = content_type_essence(&headers);
            let encoded = encode_payload(declared.as_deref(), payload.as_ref(), &files)?;
            // The multipart encoder owns the boundary and rewrites the header.
            if let Some(content_type) = encoded.content_type {
                let value = HeaderValue::from_str(&content_type)
                    .map_err(|e| Error::Configuration(format!("invalid content type: {e}")))?;
                headers.insert(CONTENT_TYPE, value);
            }
            Some(encoded.bytes)
        } else {
            None
        };

        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        }

        let mut url = endpoint.clone();
        if !queries.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &queries {
                pairs.append_pair(key, value);
            }
        }

        Ok(Self {
            method,
            url,
            headers,
            body,
            cache,
        })
    }

    /// Converts into the transport's request type.
    pub fn into_reqwest(self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method, self.url);
        *request.headers_mut() = self.headers;
        if let Some(body) = self.body {
            *request.body_mut() = Some(body.into());
        }
        request
    }
}

/// The media-type essence of the declared `Content-Type`: parameters
/// stripped, lowercased. `multipart/form-data; boundary=x` and
/// `Application/XML` both route to their encoders.
fn content_type_essence(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = value.split(';').next().unwrap_or_default().trim();
    Some(essence.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint() -> Url {
        Url::parse("http://localhost:9000/users").unwrap()
    }

    #[test]
    fn defaults_content_type_to_json() {
        let prepared =
            PreparedRequest::build(Method::GET, &endpoint(), CallOptions::new()).unwrap();
        assert_eq!(
            prepared.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(prepared.body.is_none());
    }

    #[test]
    fn keeps_caller_content_type_when_set() {
        let options = CallOptions::new()
            .header("Content-Type", "application/xml")
            .unwrap()
            .payload(&json!({"root": {"leaf": "value"}}))
            .unwrap();
        let prepared = PreparedRequest::build(Method::POST, &endpoint(), options).unwrap();
        assert_eq!(
            prepared.headers.get(CONTENT_TYPE).unwrap(),
            "application/xml"
        );
        assert_eq!(
            prepared.body.as_deref(),
            Some("<root>\n  <leaf>value</leaf>\n</root>".as_bytes())
        );
    }

    #[test]
    fn content_type_parameters_do_not_change_the_encoder() {
        let options = CallOptions::new()
            .header("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")
            .unwrap()
            .payload(&json!({"name": "morpheus"}))
            .unwrap();
        let prepared = PreparedRequest::build(Method::POST, &endpoint(), options).unwrap();
        assert_eq!(prepared.body.as_deref(), Some("name=morpheus".as_bytes()));
    }

    #[test]
    fn multipart_rewrites_the_content_type_header() {
        let options = CallOptions::new()
            .header("Content-Type", "multipart/form-data")
            .unwrap()
            .payload(&json!({"name": "morpheus"}))
            .unwrap();
        let prepared = PreparedRequest::build(Method::POST, &endpoint(), options).unwrap();
        let content_type = prepared
            .headers
            .get(CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn appends_queries_url_encoded() {
        let options = CallOptions::new()
            .query("name", "john doe")
            .query("page", "1");
        let prepared = PreparedRequest::build(Method::GET, &endpoint(), options).unwrap();
        assert_eq!(prepared.url.query(), Some("name=john+doe&page=1"));
    }

    #[test]
    fn shape_mismatch_fails_before_dispatch() {
        let options = CallOptions::new()
            .header("Content-Type", "application/x-www-form-urlencoded")
            .unwrap()
            .payload(&json!({"age": 30}))
            .unwrap();
        let result = PreparedRequest::build(Method::POST, &endpoint(), options);
        match result {
            Err(error) => assert!(error.is_pre_dispatch()),
            Ok(_) => panic!("expected a shape mismatch"),
        }
    }
}

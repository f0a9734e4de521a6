// src/key_generator.rs

//! Derivation of rate limit keys from request metadata.
//!
//! A key names one bucket of quota. It is laid out as
//! `<namespace>:<base>:<scope>:<value>` (or `<namespace>:<base>:global`), where
//! every segment is sanitized to `[A-Za-z0-9_.-]` and capped in length so that
//! hostile header values cannot blow up the state maps.

// dependencies
use crate::config::{Dimension, RateLimitConfig};
use crate::context::{OperationIdentity, RequestContext};
use http::header::AUTHORIZATION;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const UNKNOWN_IP: &str = "unknown";
const ANONYMOUS_USER: &str = "anonymous";
const UNPARSED_BEARER_USER: &str = "authenticated";
const GLOBAL_SCOPE: &str = "global";
const CUSTOM_ERROR: &str = "custom_error";
const EMPTY_SEGMENT: &str = "empty";

// reasons a CUSTOM template could not be rendered
#[derive(Debug, Error)]
enum TemplateError {
    #[error("no custom key template configured")]
    MissingTemplate,
    #[error("unknown placeholder #{0}")]
    UnknownPlaceholder(String),
    #[error("placeholder refers to argument {0} but only {1} were passed")]
    MissingArgument(usize, usize),
    #[error("argument has no field `{0}`")]
    MissingField(String),
    #[error("placeholder resolves to a {0}, not a scalar")]
    NotScalar(&'static str),
}

/// Derives the key a request is counted against.
///
/// Key generation never fails: anything that cannot be resolved falls back to
/// a fixed sentinel segment.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    namespace: String,
    max_segment_len: usize,
    ip_headers: Vec<String>,
    user_claims: Vec<String>,
    user_header: String,
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self {
            namespace: "rate_limit".to_string(),
            max_segment_len: 100,
            ip_headers: [
                "x-forwarded-for",
                "x-real-ip",
                "proxy-client-ip",
                "wl-proxy-client-ip",
                "http_client_ip",
                "http_x_forwarded_for",
            ]
            .map(String::from)
            .to_vec(),
            user_claims: ["user_id", "userId", "sub", "uid", "username"]
                .map(String::from)
                .to_vec(),
            user_header: "x-user-id".to_string(),
        }
    }
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: set the leading key segment
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Builder-style: set the per-segment length cap
    pub fn max_segment_len(mut self, len: usize) -> Self {
        self.max_segment_len = len.max(1);
        self
    }

    /// Builder-style: set the proxy headers consulted for the client address, in order
    pub fn ip_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ip_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style: set the principal claims consulted for the user id, in order
    pub fn user_claims<I, S>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_claims = claims.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style: set the header carrying an explicit user id
    pub fn user_header(mut self, header: impl Into<String>) -> Self {
        self.user_header = header.into();
        self
    }

    /// Derive the key for one call of a protected operation.
    pub fn generate_key(
        &self,
        config: &RateLimitConfig,
        operation: &OperationIdentity,
        request: &RequestContext,
        args: &[Value],
    ) -> String {
        let base = if config.key_prefix.is_empty() {
            operation.to_string()
        } else {
            config.key_prefix.clone()
        };
        let namespace = self.sanitize(&self.namespace);
        let base = self.sanitize(&base);

        let key = match config.dimension {
            Dimension::Ip => {
                let ip = self.sanitize(&self.resolve_ip(request));
                format!("{namespace}:{base}:ip:{ip}")
            }
            Dimension::User => {
                let user = self.sanitize(&self.resolve_user(request));
                format!("{namespace}:{base}:user:{user}")
            }
            Dimension::Global => format!("{namespace}:{base}:{GLOBAL_SCOPE}"),
            Dimension::Custom => {
                let custom = self.sanitize(&self.render_custom(config, request, args));
                format!("{namespace}:{base}:custom:{custom}")
            }
        };

        debug!(key = %key, dimension = ?config.dimension, "derived rate limit key");
        key
    }

    /// Replace every character outside `[A-Za-z0-9_.-]` with `_` and cap the length.
    ///
    /// Idempotent: sanitizing a sanitized segment returns it unchanged.
    pub fn sanitize(&self, raw: &str) -> String {
        let cleaned: String = raw
            .chars()
            .take(self.max_segment_len)
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if cleaned.is_empty() {
            EMPTY_SEGMENT.to_string()
        } else {
            cleaned
        }
    }

    /// Client address: proxy headers in order, then the peer, then `"unknown"`.
    pub fn resolve_ip(&self, request: &RequestContext) -> String {
        self.ip_headers
            .iter()
            .find_map(|name| request.header_str(name).and_then(first_forwarded))
            .map(str::to_string)
            .or_else(|| request.peer_addr().map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| UNKNOWN_IP.to_string())
    }

    /// Principal: claims in order, then the user-id header, then a placeholder
    /// for an unparsed bearer token, then `"anonymous"`.
    pub fn resolve_user(&self, request: &RequestContext) -> String {
        if let Some(claims) = request.claims() {
            for name in &self.user_claims {
                match claims.get(name) {
                    Some(Value::String(id)) if !id.trim().is_empty() => {
                        return id.trim().to_string();
                    }
                    Some(Value::Number(id)) => return id.to_string(),
                    _ => {}
                }
            }
        }

        if let Some(id) = request
            .header_str(&self.user_header)
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            return id.to_string();
        }

        let has_bearer = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.get(..7))
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("bearer "));
        if has_bearer {
            UNPARSED_BEARER_USER.to_string()
        } else {
            ANONYMOUS_USER.to_string()
        }
    }

    fn render_custom(
        &self,
        config: &RateLimitConfig,
        request: &RequestContext,
        args: &[Value],
    ) -> String {
        let rendered = config
            .custom_key_template
            .as_deref()
            .ok_or(TemplateError::MissingTemplate)
            .and_then(|template| self.render_template(template, request, args));

        match rendered {
            Ok(segment) => segment,
            Err(e) => {
                // distinct broken templates share this bucket
                warn!(
                    template = config.custom_key_template.as_deref().unwrap_or_default(),
                    error = %e,
                    "custom rate limit key could not be rendered, using fallback bucket"
                );
                CUSTOM_ERROR.to_string()
            }
        }
    }

    // substitutes #ip, #user, #argN / #pN and dotted paths like #arg0.customer.id
    fn render_template(
        &self,
        template: &str,
        request: &RequestContext,
        args: &[Value],
    ) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(pos) = rest.find('#') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let name_len = ident_len(after, false);
            if name_len == 0 {
                out.push('#');
                rest = after;
                continue;
            }
            let name = &after[..name_len];
            rest = &after[name_len..];

            match name {
                "ip" => out.push_str(&self.resolve_ip(request)),
                "user" => out.push_str(&self.resolve_user(request)),
                _ => {
                    let index = positional_index(name)
                        .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;
                    let mut value = args
                        .get(index)
                        .ok_or(TemplateError::MissingArgument(index, args.len()))?;

                    // only structured values have fields; a dot after a scalar is literal text
                    while let Some(tail) = rest.strip_prefix('.') {
                        if !(value.is_object() || value.is_array()) {
                            break;
                        }
                        let field_len = ident_len(tail, true);
                        if field_len == 0 {
                            break;
                        }
                        let field = &tail[..field_len];
                        value = match value {
                            Value::Object(map) => map.get(field),
                            Value::Array(items) => {
                                field.parse::<usize>().ok().and_then(|i| items.get(i))
                            }
                            _ => None,
                        }
                        .ok_or_else(|| TemplateError::MissingField(field.to_string()))?;
                        rest = &tail[field_len..];
                    }

                    out.push_str(&render_scalar(value)?);
                }
            }
        }

        out.push_str(rest);
        Ok(out)
    }
}

// first entry of a comma separated forwarding chain, ignoring blanks and "unknown"
fn first_forwarded(value: &str) -> Option<&str> {
    let first = value.split(',').next()?.trim();
    (!first.is_empty() && !first.eq_ignore_ascii_case(UNKNOWN_IP)).then_some(first)
}

fn ident_len(s: &str, allow_underscore: bool) -> usize {
    s.find(|c: char| !(c.is_ascii_alphanumeric() || (allow_underscore && c == '_')))
        .unwrap_or(s.len())
}

fn positional_index(name: &str) -> Option<usize> {
    name.strip_prefix("arg")
        .or_else(|| name.strip_prefix('p'))
        .and_then(|digits| digits.parse().ok())
}

fn render_scalar(value: &Value) -> Result<String, TemplateError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(TemplateError::NotScalar("null")),
        Value::Array(_) => Err(TemplateError::NotScalar("array")),
        Value::Object(_) => Err(TemplateError::NotScalar("object")),
    }
}

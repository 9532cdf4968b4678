//! Token lookups over the parts of a request.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use axum::http::request::Parts;
use thiserror::Error;
use url::form_urlencoded;

/// Why no token could be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsrfError {
    #[error("missing csrf token in header")]
    MissingHeader,

    #[error("missing csrf token in query")]
    MissingQuery,

    #[error("missing csrf token in param")]
    MissingParam,

    #[error("missing csrf token in form")]
    MissingForm,

    #[error("invalid token lookup '{0}', expected '<header|query|param|form>:<name>'")]
    InvalidLookup(String),
}

/// Where to look for the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenLookup {
    /// A request header, e.g. `X-Csrf-Token`.
    Header(String),
    /// A query-string parameter.
    Query(String),
    /// A matched path parameter.
    Param(String),
    /// A field of an `application/x-www-form-urlencoded` body.
    Form(String),
}

impl Default for TokenLookup {
    fn default() -> Self {
        TokenLookup::Header("X-Csrf-Token".to_string())
    }
}

impl FromStr for TokenLookup {
    type Err = CsrfError;

    /// Parse `"<source>:<name>"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CsrfError::InvalidLookup(s.to_string());
        let (source, name) = s.split_once(':').ok_or_else(invalid)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid());
        }

        match source.trim() {
            "header" => Ok(TokenLookup::Header(name.to_string())),
            "query" => Ok(TokenLookup::Query(name.to_string())),
            "param" => Ok(TokenLookup::Param(name.to_string())),
            "form" => Ok(TokenLookup::Form(name.to_string())),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for TokenLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenLookup::Header(name) => write!(f, "header:{name}"),
            TokenLookup::Query(name) => write!(f, "query:{name}"),
            TokenLookup::Param(name) => write!(f, "param:{name}"),
            TokenLookup::Form(name) => write!(f, "form:{name}"),
        }
    }
}

impl TokenLookup {
    /// Extract the token.
    ///
    /// `params` are the matched path parameters and `form` the raw urlencoded
    /// body; pass empty values when the request has none.
    ///
    /// `Form` only understands `application/x-www-form-urlencoded` bodies.
    /// Multipart forms are not parsed and yield [`CsrfError::MissingForm`].
    pub fn extract(
        &self,
        parts: &Parts,
        params: &HashMap<String, String>,
        form: &[u8],
    ) -> Result<String, CsrfError> {
        match self {
            TokenLookup::Header(name) => parts
                .headers
                .get(name.as_str())
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(CsrfError::MissingHeader),
            TokenLookup::Query(name) => parts
                .uri
                .query()
                .and_then(|q| lookup_urlencoded(q.as_bytes(), name))
                .ok_or(CsrfError::MissingQuery),
            TokenLookup::Param(name) => params
                .get(name)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or(CsrfError::MissingParam),
            TokenLookup::Form(name) => {
                lookup_urlencoded(form, name).ok_or(CsrfError::MissingForm)
            }
        }
    }
}

/// First non-empty value for `name` in an urlencoded string.
fn lookup_urlencoded(input: &[u8], name: &str) -> Option<String> {
    form_urlencoded::parse(input)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri(uri);
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn parses_lookup_strings() {
        assert_eq!(
            "header:X-Csrf-Token".parse::<TokenLookup>().unwrap(),
            TokenLookup::Header("X-Csrf-Token".into())
        );
        assert_eq!(
            "form:_csrf".parse::<TokenLookup>().unwrap(),
            TokenLookup::Form("_csrf".into())
        );
        assert!(matches!(
            "cookie:csrf".parse::<TokenLookup>(),
            Err(CsrfError::InvalidLookup(_))
        ));
        assert!("query:".parse::<TokenLookup>().is_err());
        assert!("header".parse::<TokenLookup>().is_err());
    }

    #[test]
    fn lookup_display_round_trips() {
        let lookup = TokenLookup::Param("token".into());
        assert_eq!(lookup.to_string().parse::<TokenLookup>().unwrap(), lookup);
    }

    #[test]
    fn extracts_from_header() {
        let p = parts("/", &[("x-csrf-token", "abc")]);
        let lookup = TokenLookup::default();
        assert_eq!(lookup.extract(&p, &HashMap::new(), b"").unwrap(), "abc");

        let p = parts("/", &[("x-csrf-token", "")]);
        assert_eq!(
            lookup.extract(&p, &HashMap::new(), b""),
            Err(CsrfError::MissingHeader)
        );
    }

    #[test]
    fn extracts_from_query() {
        let lookup = TokenLookup::Query("csrf".into());
        let p = parts("/submit?page=2&csrf=a%20b", &[]);
        assert_eq!(lookup.extract(&p, &HashMap::new(), b"").unwrap(), "a b");

        let p = parts("/submit?csrf=", &[]);
        assert_eq!(
            lookup.extract(&p, &HashMap::new(), b""),
            Err(CsrfError::MissingQuery)
        );
        let p = parts("/submit", &[]);
        assert_eq!(
            lookup.extract(&p, &HashMap::new(), b""),
            Err(CsrfError::MissingQuery)
        );
    }

    #[test]
    fn extracts_from_param() {
        let lookup = TokenLookup::Param("token".into());
        let p = parts("/forms/xyz", &[]);
        let mut params = HashMap::new();
        assert_eq!(lookup.extract(&p, &params, b""), Err(CsrfError::MissingParam));

        params.insert("token".to_string(), "xyz".to_string());
        assert_eq!(lookup.extract(&p, &params, b"").unwrap(), "xyz");
    }

    #[test]
    fn extracts_from_form_body() {
        let lookup = TokenLookup::Form("_csrf".into());
        let p = parts("/", &[]);
        assert_eq!(
            lookup
                .extract(&p, &HashMap::new(), b"name=joe&_csrf=t0k%2Ben")
                .unwrap(),
            "t0k+en"
        );
        assert_eq!(
            lookup.extract(&p, &HashMap::new(), b"name=joe"),
            Err(CsrfError::MissingForm)
        );
    }

    #[test]
    fn multipart_form_body_is_not_parsed() {
        let lookup = TokenLookup::Form("_csrf".into());
        let p = parts("/", &[("content-type", "multipart/form-data; boundary=XyZ")]);
        let body = b"--XyZ\r\nContent-Disposition: form-data; name=\"_csrf\"\r\n\r\ntok\r\n--XyZ--\r\n";
        assert_eq!(
            lookup.extract(&p, &HashMap::new(), body),
            Err(CsrfError::MissingForm)
        );
    }
}

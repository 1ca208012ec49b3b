//! Request signing and canonical query construction
//!
//! Every API request carries an MD5 token computed over the canonical query
//! string concatenated with the shared secret. Signing is pure: identical
//! parameter sets always produce identical tokens, so the paginator and the
//! fan-out layer can call it on every request without coordination.
//!
//! Canonicalization rules:
//! - parameters keep their insertion order,
//! - empty values are dropped,
//! - list-valued parameters expand to repeated `key=value` entries with the
//!   values sorted, so permuting the input list does not change the token.

use chrono::NaiveDate;

/// Query parameter name carrying the request token
const SIGNING_PARAM: &str = "signing";

/// Date format the remote API expects in filter parameters
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, PartialEq, Eq)]
enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

/// Ordered set of request parameters with signing support
///
/// Parameters are kept in insertion order. Use [`QueryParams::push_all`] for
/// list-valued parameters (e.g. `creating_source_type[]`), which expand to one
/// `key=value` pair per value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: Vec<(String, ParamValue)>,
}

impl QueryParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single-valued parameter
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params
            .push((key.into(), ParamValue::Single(value.into())));
    }

    /// Append a list-valued parameter (expands to repeated `key=value` pairs)
    pub fn push_all<I, V>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.params.push((
            key.into(),
            ParamValue::Many(values.into_iter().map(Into::into).collect()),
        ));
    }

    /// Append a date-valued parameter in the API's `YYYY-MM-DD` format
    pub fn push_date(&mut self, key: impl Into<String>, date: NaiveDate) {
        self.push(key, date.format(DATE_FORMAT).to_string());
    }

    /// Append all parameters from another set, preserving their order
    pub fn extend_from(&mut self, other: &QueryParams) {
        self.params.extend(other.params.iter().cloned());
    }

    /// Whether the set contains no parameters
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Build the canonical query string used both on the wire and for signing
    ///
    /// Empty values are skipped, list values are sorted before expansion, and
    /// values are percent-encoded. The signed string is exactly the string
    /// that is sent.
    pub fn canonical_query(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for (key, value) in &self.params {
            match value {
                ParamValue::Single(v) => {
                    if !v.is_empty() {
                        parts.push(format!("{key}={}", urlencoding::encode(v)));
                    }
                }
                ParamValue::Many(vs) => {
                    let mut sorted: Vec<&String> =
                        vs.iter().filter(|v| !v.is_empty()).collect();
                    sorted.sort();
                    for v in sorted {
                        parts.push(format!("{key}={}", urlencoding::encode(v)));
                    }
                }
            }
        }
        parts.join("&")
    }

    /// Compute the request token over `<canonical-query><secret>`
    pub fn sign(&self, secret: &str) -> String {
        let raw = format!("{}{}", self.canonical_query(), secret);
        format!("{:x}", md5::compute(raw.as_bytes()))
    }

    /// Build the full signed URL for an endpoint
    pub fn signed_url(&self, endpoint: &str, secret: &str) -> String {
        let query = self.canonical_query();
        let token = self.sign(secret);
        if query.is_empty() {
            format!("{endpoint}?{SIGNING_PARAM}={token}")
        } else {
            format!("{endpoint}?{query}&{SIGNING_PARAM}={token}")
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-auth-key";

    fn base_params() -> QueryParams {
        let mut params = QueryParams::new();
        params.push("account", "acme");
        params.push("condition", "1");
        params
    }

    #[test]
    fn identical_params_sign_identically() {
        let a = base_params();
        let b = base_params();
        assert_eq!(a.sign(SECRET), b.sign(SECRET));
    }

    #[test]
    fn changing_one_value_changes_the_token() {
        let a = base_params();
        let mut b = QueryParams::new();
        b.push("account", "acme");
        b.push("condition", "2");
        assert_ne!(a.sign(SECRET), b.sign(SECRET));
    }

    #[test]
    fn changing_the_secret_changes_the_token() {
        let params = base_params();
        assert_ne!(params.sign(SECRET), params.sign("other-key"));
    }

    #[test]
    fn list_value_order_does_not_affect_the_token() {
        let mut a = base_params();
        a.push_all("creating_source_type[]", ["99", "10"]);
        let mut b = base_params();
        b.push_all("creating_source_type[]", ["10", "99"]);
        assert_eq!(a.canonical_query(), b.canonical_query());
        assert_eq!(a.sign(SECRET), b.sign(SECRET));
    }

    #[test]
    fn empty_values_are_dropped_from_the_canonical_query() {
        let mut params = base_params();
        params.push("order_number", "");
        assert_eq!(params.canonical_query(), "account=acme&condition=1");
    }

    #[test]
    fn list_values_expand_to_repeated_pairs() {
        let mut params = QueryParams::new();
        params.push_all("creating_source_type[]", ["99", "10"]);
        assert_eq!(
            params.canonical_query(),
            "creating_source_type[]=10&creating_source_type[]=99"
        );
    }

    #[test]
    fn values_are_percent_encoded() {
        let mut params = QueryParams::new();
        params.push("note", "a b&c");
        assert_eq!(params.canonical_query(), "note=a%20b%26c");
    }

    #[test]
    fn push_date_uses_api_date_format() {
        let mut params = QueryParams::new();
        params.push_date(
            "order_date_fr",
            NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
        );
        assert_eq!(params.canonical_query(), "order_date_fr=2025-03-20");
    }

    #[test]
    fn signed_url_appends_token_as_last_parameter() {
        let params = base_params();
        let token = params.sign(SECRET);
        let url = params.signed_url("https://api.example.com/get_order", SECRET);
        assert_eq!(
            url,
            format!("https://api.example.com/get_order?account=acme&condition=1&signing={token}")
        );
    }

    #[test]
    fn signed_url_without_params_still_carries_the_token() {
        let params = QueryParams::new();
        let url = params.signed_url("https://api.example.com/ping", SECRET);
        assert!(url.starts_with("https://api.example.com/ping?signing="));
    }

    #[test]
    fn extend_from_preserves_order() {
        let mut filters = QueryParams::new();
        filters.push("condition", "1");
        filters.push("cancel_flag", "0");

        let mut params = QueryParams::new();
        params.push("account", "acme");
        params.extend_from(&filters);
        assert_eq!(
            params.canonical_query(),
            "account=acme&condition=1&cancel_flag=0"
        );
    }
}

//! Parameter decoding.
//!
//! This is the only place where loosely typed input is turned into a
//! [`SearchConfiguration`]. Absent numeric parameters become [`ABSENT`] so
//! that validation reports them instead of silently using a default.

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::config::{DerefAliases, ProtocolMode, SearchConfiguration, SearchScope};
use crate::error::{LdapError, LdapResult};

/// Parameter name to loosely typed value.
pub type ParameterMap = Map<String, Value>;

/// Sentinel for absent numeric parameters; always fails range validation.
pub const ABSENT: i64 = i64::MIN;

/// Host name parameter.
pub const HOST: &str = "host";
/// Port parameter.
pub const PORT: &str = "port";
/// Protocol parameter (`LDAP`, `LDAPS` or `TLS`).
pub const PROTOCOL: &str = "protocol";
/// Bind user parameter.
pub const USERNAME: &str = "username";
/// Bind password parameter.
pub const PASSWORD: &str = "password";
/// Trusted certificate path parameter.
pub const CERTIFICATE_PATH: &str = "certificatePath";
/// Search base parameter.
pub const BASE_OBJECT: &str = "baseObject";
/// Scope parameter (`BASE`, `ONELEVEL` or `SUBTREE`).
pub const SCOPE: &str = "scope";
/// Filter parameter.
pub const FILTER: &str = "filter";
/// Comma-separated attribute list parameter.
pub const ATTRIBUTES: &str = "attributes";
/// Size limit parameter.
pub const SIZE_LIMIT: &str = "sizeLimit";
/// Page size parameter.
pub const PAGE_SIZE: &str = "pageSize";
/// Time limit parameter, in seconds.
pub const TIME_LIMIT: &str = "timeLimit";
/// Referral handling parameter.
pub const REFERRAL_HANDLING: &str = "referralHandling";
/// Alias dereferencing parameter.
pub const DEREF_ALIASES: &str = "derefAliases";

/// Name under which hosts publish the search result.
pub const LDAP_ATTRIBUTE_LIST_OUTPUT: &str = "ldapAttributeList";

/// Decodes a parameter map into a configuration.
///
/// Protocol and scope names are matched case-insensitively with fallbacks
/// (`LDAPS` and `ONELEVEL`). Nothing is validated here beyond value types.
///
/// ## Errors
///
/// Returns [`LdapError::InvalidParameter`] when a value has the wrong type,
/// e.g. a boolean port or a non-numeric size limit.
pub fn decode_parameters(params: &ParameterMap) -> LdapResult<SearchConfiguration> {
    let protocol = optional_string(params, PROTOCOL)?;
    let scope = optional_string(params, SCOPE)?;
    let deref_aliases_input = optional_string(params, DEREF_ALIASES)?;

    Ok(SearchConfiguration {
        host: optional_string(params, HOST)?,
        port: integer_or_absent(params, PORT)?,
        protocol: Some(ProtocolMode::decode(protocol.as_deref())),
        username: optional_string(params, USERNAME)?,
        password: optional_string(params, PASSWORD)?,
        certificate_path: optional_string(params, CERTIFICATE_PATH)?
            .filter(|path| !path.is_empty())
            .map(PathBuf::from),
        base_object: optional_string(params, BASE_OBJECT)?,
        scope: Some(SearchScope::decode(scope.as_deref())),
        filter: optional_string(params, FILTER)?,
        attributes: attribute_list(params)?,
        size_limit: integer_or_absent(params, SIZE_LIMIT)?,
        page_size: integer_or_absent(params, PAGE_SIZE)?,
        time_limit: integer_or_absent(params, TIME_LIMIT)?,
        referral_handling: optional_string(params, REFERRAL_HANDLING)?,
        deref_aliases: DerefAliases::decode(deref_aliases_input.as_deref()),
        deref_aliases_input,
    })
}

/// Splits a comma-separated attribute list, trimming each name.
///
/// A blank list means "no restriction" and yields `None`.
#[must_use]
pub fn parse_attributes(list: Option<&str>) -> Option<Vec<String>> {
    let list = list?;
    if list.trim().is_empty() {
        return None;
    }
    Some(list.split(',').map(|name| name.trim().to_string()).collect())
}

fn optional_string(params: &ParameterMap, name: &str) -> LdapResult<Option<String>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(LdapError::parameter(
            name,
            format!("expected a string, got {}", type_name(other)),
        )),
    }
}

fn integer_or_absent(params: &ParameterMap, name: &str) -> LdapResult<i64> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(ABSENT),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| {
            LdapError::parameter(name, format!("{n} is not a 64-bit integer"))
        }),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| LdapError::parameter(name, format!("{s:?} is not an integer: {e}"))),
        Some(other) => Err(LdapError::parameter(
            name,
            format!("expected an integer, got {}", type_name(other)),
        )),
    }
}

fn attribute_list(params: &ParameterMap) -> LdapResult<Option<Vec<String>>> {
    match params.get(ATTRIBUTES) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(parse_attributes(Some(s))),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(LdapError::parameter(
                    ATTRIBUTES,
                    format!("expected attribute names, got {}", type_name(other)),
                )),
            })
            .collect::<LdapResult<Vec<_>>>()
            .map(Some),
        Some(other) => Err(LdapError::parameter(
            ATTRIBUTES,
            format!("expected a comma-separated string, got {}", type_name(other)),
        )),
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

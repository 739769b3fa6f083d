use axum::http::{header::InvalidHeaderValue, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::auth::SessionUser;
use crate::types::{Role, UnknownRole};

pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");
pub const USER_EMAIL_HEADER: HeaderName = HeaderName::from_static("x-user-email");
pub const USER_NAME_HEADER: HeaderName = HeaderName::from_static("x-user-name");
pub const USER_ROLE_HEADER: HeaderName = HeaderName::from_static("x-user-role");

/// Headers only the gate may set. Inbound copies are stripped before it runs.
pub const IDENTITY_HEADERS: [HeaderName; 4] = [
    USER_ID_HEADER,
    USER_EMAIL_HEADER,
    USER_NAME_HEADER,
    USER_ROLE_HEADER,
];

/// Identity of the caller for one request, as vetted by the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Principal {
    /// Project a resolved session onto a principal, normalizing the role.
    pub fn from_session(user: SessionUser) -> Result<Self, UnknownRole> {
        let role = user.role.parse()?;
        Ok(Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
            name: user.name.unwrap_or_default(),
            role,
        })
    }

    /// Overwrite the identity headers on an outgoing request.
    ///
    /// Values are written as raw bytes so non-ASCII names survive; control
    /// characters are rejected.
    pub fn write_headers(&self, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        let values = [
            HeaderValue::from_bytes(self.id.as_bytes())?,
            HeaderValue::from_bytes(self.email.as_bytes())?,
            HeaderValue::from_bytes(self.name.as_bytes())?,
            HeaderValue::from_static(self.role.as_str()),
        ];
        for (name, value) in IDENTITY_HEADERS.into_iter().zip(values) {
            headers.insert(name, value);
        }
        Ok(())
    }

    /// Read back what `write_headers` produced. `None` when the id header is
    /// absent or the role header does not name a known role.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let id = header_text(headers, &USER_ID_HEADER)?;
        let role = header_text(headers, &USER_ROLE_HEADER)?.parse().ok()?;
        Some(Self {
            id,
            email: header_text(headers, &USER_EMAIL_HEADER).unwrap_or_default(),
            name: header_text(headers, &USER_NAME_HEADER).unwrap_or_default(),
            role,
        })
    }
}

fn header_text(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
        .map(str::to_string)
}

// Identifiers
//
// Identities, editgroups and editors share one public token format: the
// 16 bytes of a v4 UUID, base32 encoded without padding, lower-cased
// (always 26 characters). Revisions and edits are plain UUIDs.

use crate::error::{CatalogError, Result};
use data_encoding::BASE32_NOPAD;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of every base32 identifier token
pub const IDENT_LEN: usize = 26;

/// Convert a base32 token to its UUID
pub fn token_to_uuid(token: &str) -> Result<Uuid> {
    if !token.is_ascii() || token.len() != IDENT_LEN {
        return Err(CatalogError::InvalidIdent(token.to_string()));
    }
    let mut raw = [0u8; 16];
    BASE32_NOPAD
        .decode_mut(token.to_ascii_uppercase().as_bytes(), &mut raw)
        .map_err(|_| CatalogError::InvalidIdent(token.to_string()))?;
    Ok(Uuid::from_bytes(raw))
}

/// Convert a UUID to its base32 token
pub fn uuid_to_token(id: &Uuid) -> String {
    BASE32_NOPAD.encode(id.as_bytes()).to_lowercase()
}

macro_rules! token_ident {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Uuid);

        impl $name {
            /// Fresh random identifier
            pub fn generate() -> Self {
                $name(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                $name(id)
            }

            pub fn to_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&uuid_to_token(&self.0))
            }
        }

        impl FromStr for $name {
            type Err = CatalogError;
            fn from_str(s: &str) -> Result<Self> {
                token_to_uuid(s).map($name)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
                s.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
                let raw = String::deserialize(d)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.to_string()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let raw = value.as_str()?;
                raw.parse()
                    .map_err(|e: CatalogError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

token_ident!(
    /// Permanent identity of one entity (shared id space across entity types)
    EntityId
);
token_ident!(
    /// Editgroup identifier
    EditgroupId
);
token_ident!(
    /// Editor (submitter) identifier
    EditorId
);

macro_rules! uuid_ident {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn generate() -> Self {
                $name(Uuid::new_v4())
            }

            pub fn to_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = CatalogError;
            fn from_str(s: &str) -> Result<Self> {
                Uuid::parse_str(s)
                    .map($name)
                    .map_err(|_| CatalogError::InvalidIdent(s.to_string()))
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.to_string()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let raw = value.as_str()?;
                raw.parse()
                    .map_err(|e: CatalogError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

uuid_ident!(
    /// Immutable revision of an entity body
    RevisionId
);
uuid_ident!(
    /// One staged or accepted edit
    EditId
);

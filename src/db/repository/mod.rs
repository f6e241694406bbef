//! Repository layer: entity-scoped database operations.

mod diagnosis;
mod history;
mod medical_image;
mod session;
mod user;

pub use diagnosis::*;
pub use history::*;
pub use medical_image::*;
pub use session::*;
pub use user::*;

use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::Row;

use super::DatabaseError;

/// Reads a text column holding an enum code.
pub(crate) fn enum_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = DatabaseError>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Nullable variant of [`enum_column`].
pub(crate) fn optional_enum_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = DatabaseError>,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse::<T>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub(crate) fn not_found(entity_type: &str, id: impl ToString) -> DatabaseError {
    DatabaseError::NotFound { entity_type: entity_type.into(), id: id.to_string() }
}

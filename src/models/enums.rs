use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Enum stored as a short code, with a human-readable label for display.
macro_rules! choice_enum {
    ($name:ident { $($variant:ident => $code:literal / $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $code)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

choice_enum!(Sex {
    Male => "M" / "Male",
    Female => "F" / "Female",
});

choice_enum!(ViewPosition {
    Posteroanterior => "PA" / "Posteroanterior",
    Lateral => "LAT" / "Lateral",
    Anteroposterior => "AP" / "Anteroposterior",
    Other => "OTHER" / "Other",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn codes_round_trip() {
        for v in ViewPosition::ALL {
            assert_eq!(ViewPosition::from_str(v.as_str()).unwrap(), *v);
        }
        assert_eq!(Sex::from_str("F").unwrap().label(), "Female");
    }

    #[test]
    fn unknown_code_is_invalid_enum() {
        assert!(matches!(
            ViewPosition::from_str("XX"),
            Err(DatabaseError::InvalidEnum { .. })
        ));
    }

    #[test]
    fn serializes_as_code() {
        assert_eq!(serde_json::to_string(&Sex::Male).unwrap(), "\"M\"");
    }
}

//! Enumerated attribute values shared by the record types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = PipelineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(PipelineError::UnknownValue {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum!(
    /// User home region. Stored without spaces to match the schema.
    Region { Beijing => "Beijing", HongKong => "HongKong" }
);

string_enum!(
    Language { En => "en", Zh => "zh" }
);

string_enum!(
    Gender { Male => "male", Female => "female", Other => "other" }
);

string_enum!(
    /// Article category, a pure function of the article index
    Category { Science => "science", Technology => "technology" }
);

string_enum!(
    /// Source corpus topic used for illustrative article text
    TextTopic {
        Tech => "tech",
        Business => "business",
        Entertainment => "entertainment",
        Sport => "sport",
    }
);

string_enum!(
    /// Width of a popularity ranking bucket
    Granularity { Daily => "daily", Weekly => "weekly", Monthly => "monthly" }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_text() {
        for region in Region::ALL {
            assert_eq!(region.as_str().parse::<Region>().unwrap(), *region);
        }
        assert_eq!("HongKong".parse::<Region>().unwrap(), Region::HongKong);
        assert!("Hong Kong".parse::<Region>().is_err());
        assert_eq!(Granularity::Weekly.to_string(), "weekly");
    }

    #[test]
    fn test_serde_uses_schema_text() {
        let json = serde_json::to_string(&Language::Zh).unwrap();
        assert_eq!(json, "\"zh\"");
    }
}

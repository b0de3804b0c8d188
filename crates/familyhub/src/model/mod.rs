//! Domain records shared by storage, the change feed and the display.
//!
//! Every record is scoped by a [`FamilyId`]. Identifiers are `SQLite` row ids.

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum stored
/// as snake_case text.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The stored text form.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::Error;

            fn from_str(s: &str) -> crate::error::Result<Self> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(crate::error::Error::invalid_input(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

pub mod calendar;
pub mod care;
pub mod display;
pub mod family;
pub mod message;
pub mod photo;
pub mod tutorial;

pub use calendar::{Event, EventCategory, NewEvent, RotationEntry};
pub use care::{
    DoseLog, DoseStatus, Medication, NewMedication, ShoppingItem, ShoppingStatus, Task,
    TaskStatus, TimeWindow,
};
pub use display::{DisplayControl, DisplaySettings, DisplayUpdate, DisplayView, InlineMessage};
pub use family::{Family, FamilyId, Member, MemberId, NewMember, Role};
pub use message::{Message, NewMessage};
pub use photo::{NewPhoto, Photo};
pub use tutorial::{ContentType, NewTutorial, Tutorial, TutorialStep};

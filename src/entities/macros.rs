//! Macros for reducing boilerplate when defining entities
//!
//! These macros generate the struct and the `Entity` implementation for
//! each typed record shown on a dashboard page.

/// Complete macro to create a view entity with its `Entity` implementation
///
/// Every specific field is exposed through `field_value` under its own
/// name, so its type must convert into `FieldValue`.
///
/// # Example
///
/// ```rust
/// use dashview::prelude::*;
///
/// impl_view_entity!(
///     Agent,
///     "agents",
///     ["name", "role"],
///     {
///         role: String,
///         success_rate: f64,
///     }
/// );
///
/// let agent = Agent::new("Chat Bot".to_string(), "active".to_string(), "support".to_string(), 92.5);
/// assert_eq!(agent.field_text("role"), "support");
/// assert_eq!(agent.field_number("success_rate"), Some(92.5));
/// assert!(agent.field_value("unknown").is_none());
/// ```
#[macro_export]
macro_rules! impl_view_entity {
    (
        $type:ident,
        $resource:expr,
        [ $( $searchable_field:expr ),* $(,)? ],
        {
            $( $specific_field:ident : $specific_type:ty ),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            /// Unique identifier for this entity
            pub id: ::uuid::Uuid,

            /// When this entity was created
            pub created_at: ::chrono::DateTime<::chrono::Utc>,

            /// Current status of the entity
            pub status: String,

            /// Display name of this entity
            pub name: String,
            $( pub $specific_field : $specific_type ),*
        }

        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                $resource
            }

            fn searchable_fields() -> &'static [&'static str] {
                &[ $( $searchable_field ),* ]
            }

            fn field_value(&self, field: &str) -> Option<$crate::core::field::FieldValue> {
                use $crate::core::field::FieldValue;

                match field {
                    "id" => Some(FieldValue::from(self.id)),
                    "created_at" => Some(FieldValue::from(self.created_at)),
                    "status" => Some(FieldValue::from(self.status.clone())),
                    "name" => Some(FieldValue::from(self.name.clone())),
                    $( stringify!($specific_field) => Some(FieldValue::from(self.$specific_field.clone())), )*
                    _ => None,
                }
            }
        }

        // Utility methods
        impl $type {
            /// Create a new instance of this entity
            #[allow(clippy::too_many_arguments)]
            pub fn new(
                name: String,
                status: String,
                $( $specific_field: $specific_type ),*
            ) -> Self {
                Self {
                    id: ::uuid::Uuid::new_v4(),
                    created_at: ::chrono::Utc::now(),
                    status,
                    name,
                    $( $specific_field ),*
                }
            }

            /// Change the entity status
            pub fn set_status(&mut self, status: impl Into<String>) {
                self.status = status.into();
            }
        }
    };
}

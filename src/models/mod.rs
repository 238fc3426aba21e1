pub mod activities;
pub mod notifications;
pub mod registrations;
pub mod users;

pub use activities::ActivitiesRow;
pub use notifications::{NotificationKind, NotificationsRow};
pub use registrations::{RegistrationStatus, RegistrationsRow};
pub use users::{Role, UsersRow};

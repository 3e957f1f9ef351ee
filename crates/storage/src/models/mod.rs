mod class_session;
mod member;
mod notification;
mod reservation;
mod waitlist_entry;

pub use class_session::{ClassSession, ClassStatus, ClassType};
pub use member::{Member, MembershipStatus, NoShowRecord};
pub use notification::{NotificationIntent, NotificationKind};
pub use reservation::{Reservation, ReservationStatus};
pub use waitlist_entry::{WaitlistEntry, WaitlistStatus};

pub mod classes;
pub mod members;
pub mod reservations;
pub mod waitlist;

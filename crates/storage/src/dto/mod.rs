pub mod class;
pub mod common;
pub mod member;
pub mod reservation;
pub mod waitlist;

use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{
    ClassSession, Member, NoShowRecord, NotificationIntent, Reservation, WaitlistEntry,
};

/// Rows written by one booking transaction.
///
/// Each map holds the final version of every touched row, keyed by id, so a
/// row modified twice in one transaction is written once.
#[derive(Debug, Default, Clone)]
pub struct ChangeSet {
    pub classes: BTreeMap<Uuid, ClassSession>,
    pub members: BTreeMap<Uuid, Member>,
    pub reservations: BTreeMap<Uuid, Reservation>,
    pub waitlist: BTreeMap<Uuid, WaitlistEntry>,
    pub noshows: Vec<NoShowRecord>,
    pub notifications: Vec<NotificationIntent>,
}

impl ChangeSet {
    pub fn record_class(&mut self, class: &ClassSession) {
        self.classes.insert(class.class_id, class.clone());
    }

    pub fn record_member(&mut self, member: &Member) {
        self.members.insert(member.member_id, member.clone());
    }

    pub fn record_reservation(&mut self, reservation: &Reservation) {
        self.reservations
            .insert(reservation.reservation_id, reservation.clone());
    }

    pub fn record_waitlist(&mut self, entry: &WaitlistEntry) {
        self.waitlist.insert(entry.entry_id, entry.clone());
    }

    pub fn notify(&mut self, intent: NotificationIntent) {
        self.notifications.push(intent);
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.members.is_empty()
            && self.reservations.is_empty()
            && self.waitlist.is_empty()
            && self.noshows.is_empty()
            && self.notifications.is_empty()
    }
}

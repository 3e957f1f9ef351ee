use dashmap::mapref::entry::Entry;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BookingEngine, ChangeSet};
use crate::error::{BookingError, BookingResult};
use crate::models::{Member, MembershipStatus, Reservation, ReservationStatus, WaitlistEntry};

#[derive(Debug, Clone)]
pub struct NewMember {
    pub full_name: String,
    pub email: String,
}

impl BookingEngine {
    pub async fn register_member(&self, new_member: NewMember) -> BookingResult<Member> {
        let full_name = new_member.full_name.trim().to_string();
        let email = new_member.email.trim().to_lowercase();
        if full_name.is_empty() {
            return Err(BookingError::Validation("Full name is required".to_string()));
        }
        if !email.contains('@') {
            return Err(BookingError::Validation("Email is not valid".to_string()));
        }

        let member = Member {
            member_id: Uuid::new_v4(),
            full_name,
            email: email.clone(),
            membership_status: MembershipStatus::Active,
            blocked_until: None,
            total_noshow: 0,
            created_at: self.clock.now(),
            recent_noshows: Vec::new(),
        };

        match self.emails.entry(email.clone()) {
            Entry::Occupied(_) => return Err(BookingError::EmailTaken),
            Entry::Vacant(slot) => {
                slot.insert(member.member_id);
            }
        }

        let mut changes = ChangeSet::default();
        changes.record_member(&member);
        if let Err(e) = self.commit(&changes).await {
            self.emails.remove(&email);
            return Err(e);
        }

        self.members
            .insert(member.member_id, Arc::new(Mutex::new(member.clone())));
        tracing::info!("Registered member {}", member.member_id);

        Ok(member)
    }

    /// A consistent copy of the member record.
    pub async fn member(&self, member_id: Uuid) -> BookingResult<Member> {
        let slot = self.member_slot(member_id)?;
        let member = self.lock(slot).await?;
        Ok(member.clone())
    }

    /// The member's reservations across all classes, newest first,
    /// optionally narrowed to one status. Reservations of archived classes
    /// are read from the store.
    pub async fn member_reservations(
        &self,
        member_id: Uuid,
        status: Option<ReservationStatus>,
    ) -> BookingResult<Vec<Reservation>> {
        self.member_slot(member_id)?;

        let mut reservations = Vec::new();
        let mut scanned = HashSet::new();
        for slot in self.class_slots() {
            let book = self.lock(slot).await?;
            scanned.insert(book.session().class_id);
            reservations.extend(
                book.ledger()
                    .iter()
                    .filter(|r| r.member_id == member_id)
                    .cloned(),
            );
        }
        reservations.extend(
            self.store
                .member_reservations(member_id)
                .await?
                .into_iter()
                .filter(|r| !scanned.contains(&r.class_id)),
        );

        reservations.retain(|r| status.is_none_or(|s| r.status == s));
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }

    /// Waitlist entries the member is still waiting on.
    pub async fn member_waitlist(&self, member_id: Uuid) -> BookingResult<Vec<WaitlistEntry>> {
        self.member_slot(member_id)?;

        let mut entries = Vec::new();
        for slot in self.class_slots() {
            let book = self.lock(slot).await?;
            entries.extend(
                book.waitlist()
                    .waiting()
                    .filter(|e| e.member_id == member_id)
                    .cloned(),
            );
        }
        entries.sort_by_key(|e| e.joined_at);
        Ok(entries)
    }
}

//! Event, guest and attendance-history queries.

use super::{from_ts, to_ts, EngineStore};
use crate::error::EngineResult;
use crate::types::{EventId, GuestId, TenantId};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event_id: EventId,
    pub tenant_id: TenantId,
    pub name: String,
    pub event_type: String,
    pub venue_lat: f64,
    pub venue_lon: f64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_guests: i64,
    pub base_price: f64,
    pub registrations: i64,
    pub is_holiday: bool,
}

#[derive(Debug, Clone)]
pub struct GuestRecord {
    pub guest_id: GuestId,
    pub tenant_id: TenantId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One concluded past event of a given type.
#[derive(Debug, Clone)]
pub struct AttendanceRow {
    pub event_month: u32,
    pub invited: i64,
    pub attended: i64,
}

impl EngineStore {
    // ── Events ─────────────────────────────────────────────────

    pub fn insert_event(&self, event: &EventRecord) -> EngineResult<()> {
        self.conn().execute(
            "INSERT INTO event_record
                (event_id, tenant_id, name, event_type, venue_lat, venue_lon,
                 starts_at, ends_at, max_guests, base_price, registrations, is_holiday)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                event.event_id,
                event.tenant_id,
                event.name,
                event.event_type,
                event.venue_lat,
                event.venue_lon,
                to_ts(event.starts_at),
                to_ts(event.ends_at),
                event.max_guests,
                event.base_price,
                event.registrations,
                event.is_holiday as i64,
            ],
        )?;
        Ok(())
    }

    pub fn get_event(&self, event_id: &str) -> EngineResult<Option<EventRecord>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT event_id, tenant_id, name, event_type, venue_lat, venue_lon,
                        starts_at, ends_at, max_guests, base_price, registrations, is_holiday
                 FROM event_record WHERE event_id=?1",
                params![event_id],
                |r| {
                    Ok(EventRecord {
                        event_id: r.get(0)?,
                        tenant_id: r.get(1)?,
                        name: r.get(2)?,
                        event_type: r.get(3)?,
                        venue_lat: r.get(4)?,
                        venue_lon: r.get(5)?,
                        starts_at: from_ts(r.get(6)?),
                        ends_at: from_ts(r.get(7)?),
                        max_guests: r.get(8)?,
                        base_price: r.get(9)?,
                        registrations: r.get(10)?,
                        is_holiday: r.get::<_, i64>(11)? != 0,
                    })
                },
            )
            .optional()?)
    }

    pub fn set_registrations(&self, event_id: &str, registrations: i64) -> EngineResult<()> {
        self.conn().execute(
            "UPDATE event_record SET registrations=?1 WHERE event_id=?2",
            params![registrations, event_id],
        )?;
        Ok(())
    }

    // ── Guests ─────────────────────────────────────────────────

    pub fn insert_guest(&self, guest: &GuestRecord) -> EngineResult<()> {
        self.conn().execute(
            "INSERT INTO guest (guest_id, tenant_id, name, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                guest.guest_id,
                guest.tenant_id,
                guest.name,
                to_ts(guest.created_at)
            ],
        )?;
        Ok(())
    }

    pub fn guest_exists(&self, guest_id: &str) -> EngineResult<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM guest WHERE guest_id=?1",
            params![guest_id],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    // ── Raw activity (written by the check-in/payment workflows) ──

    #[allow(clippy::too_many_arguments)]
    pub fn record_check_in(
        &self,
        check_in_id: &str,
        guest_id: &str,
        event_id: &str,
        device_id: &str,
        ip: &str,
        lat: f64,
        lon: f64,
        occurred_at: DateTime<Utc>,
    ) -> EngineResult<()> {
        self.conn().execute(
            "INSERT INTO check_in
                (check_in_id, guest_id, event_id, device_id, ip, lat, lon, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                check_in_id,
                guest_id,
                event_id,
                device_id,
                ip,
                lat,
                lon,
                to_ts(occurred_at)
            ],
        )?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_payment(
        &self,
        payment_id: &str,
        guest_id: &str,
        event_id: &str,
        device_id: &str,
        ip: &str,
        card_suffix: &str,
        amount: f64,
        succeeded: bool,
        occurred_at: DateTime<Utc>,
    ) -> EngineResult<()> {
        self.conn().execute(
            "INSERT INTO payment
                (payment_id, guest_id, event_id, device_id, ip, card_suffix,
                 amount, succeeded, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                payment_id,
                guest_id,
                event_id,
                device_id,
                ip,
                card_suffix,
                amount,
                succeeded as i64,
                to_ts(occurred_at)
            ],
        )?;
        Ok(())
    }

    // ── Attendance history ─────────────────────────────────────

    pub fn insert_attendance(
        &self,
        history_id: &str,
        tenant_id: &str,
        event_type: &str,
        event_month: u32,
        invited: i64,
        attended: i64,
    ) -> EngineResult<()> {
        self.conn().execute(
            "INSERT INTO attendance_history
                (history_id, tenant_id, event_type, event_month, invited, attended)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![history_id, tenant_id, event_type, event_month, invited, attended],
        )?;
        Ok(())
    }

    /// All concluded events of the given type, for the no-show model.
    pub fn attendance_for_type(&self, event_type: &str) -> EngineResult<Vec<AttendanceRow>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT event_month, invited, attended
             FROM attendance_history
             WHERE event_type=?1
             ORDER BY history_id",
        )?;
        let rows = stmt.query_map(params![event_type], |r| {
            Ok(AttendanceRow {
                event_month: r.get::<_, i64>(0)? as u32,
                invited: r.get(1)?,
                attended: r.get(2)?,
            })
        })?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

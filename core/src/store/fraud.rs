//! Fraud-signal queries and the audit append path.

use super::{from_ts, to_ts, EngineStore};
use crate::error::EngineResult;
use crate::fraud_scorer::{FraudRule, RiskProfile, SuspiciousActivity};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use std::collections::HashMap;

impl EngineStore {
    // ── Check-in signals ───────────────────────────────────────

    pub fn count_check_ins_for_guest_since(
        &self,
        guest_id: &str,
        since: DateTime<Utc>,
    ) -> EngineResult<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM check_in WHERE guest_id=?1 AND occurred_at>=?2",
            params![guest_id, to_ts(since)],
            |r| r.get(0),
        )?)
    }

    pub fn count_distinct_guests_for_device_since(
        &self,
        device_id: &str,
        since: DateTime<Utc>,
    ) -> EngineResult<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(DISTINCT guest_id) FROM check_in
             WHERE device_id=?1 AND occurred_at>=?2",
            params![device_id, to_ts(since)],
            |r| r.get(0),
        )?)
    }

    /// Hours-of-day (UTC) of the guest's most recent check-ins.
    pub fn guest_check_in_hours(
        &self,
        guest_id: &str,
        limit: usize,
    ) -> EngineResult<Vec<u32>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT (occurred_at % 86400) / 3600 FROM check_in
             WHERE guest_id=?1 ORDER BY occurred_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![guest_id, limit as i64], |r| {
            r.get::<_, i64>(0)
        })?;
        let mut hours = Vec::new();
        for row in rows {
            hours.push(row? as u32);
        }
        Ok(hours)
    }

    // ── Payment signals ────────────────────────────────────────

    pub fn count_payments_for_guest_since(
        &self,
        guest_id: &str,
        since: DateTime<Utc>,
    ) -> EngineResult<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM payment WHERE guest_id=?1 AND occurred_at>=?2",
            params![guest_id, to_ts(since)],
            |r| r.get(0),
        )?)
    }

    pub fn count_distinct_guests_for_card_since(
        &self,
        card_suffix: &str,
        since: DateTime<Utc>,
    ) -> EngineResult<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(DISTINCT guest_id) FROM payment
             WHERE card_suffix=?1 AND occurred_at>=?2",
            params![card_suffix, to_ts(since)],
            |r| r.get(0),
        )?)
    }

    pub fn count_failed_payments_for_device_since(
        &self,
        device_id: &str,
        since: DateTime<Utc>,
    ) -> EngineResult<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM payment
             WHERE device_id=?1 AND succeeded=0 AND occurred_at>=?2",
            params![device_id, to_ts(since)],
            |r| r.get(0),
        )?)
    }

    /// (total, failed) payment attempts over the guest's entire history.
    pub fn guest_payment_totals(&self, guest_id: &str) -> EngineResult<(i64, i64)> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN succeeded=0 THEN 1 ELSE 0 END), 0)
             FROM payment WHERE guest_id=?1",
            params![guest_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?)
    }

    // ── Audit trail ────────────────────────────────────────────

    /// Append-only; existing records are never mutated or deleted.
    pub fn append_suspicious_activity(
        &self,
        activity: &SuspiciousActivity,
    ) -> EngineResult<()> {
        let metadata = serde_json::to_string(&activity.metadata)?;
        self.conn().execute(
            "INSERT INTO suspicious_activity
                (activity_id, guest_id, activity_type, description,
                 risk_score, occurred_at, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                activity.activity_id,
                activity.guest_id,
                activity.activity_type,
                activity.description,
                activity.risk_score,
                to_ts(activity.occurred_at),
                metadata,
            ],
        )?;
        Ok(())
    }

    pub fn suspicious_activities_for_guest_since(
        &self,
        guest_id: &str,
        since: DateTime<Utc>,
    ) -> EngineResult<Vec<SuspiciousActivity>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT activity_id, guest_id, activity_type, description,
                    risk_score, occurred_at, metadata
             FROM suspicious_activity
             WHERE guest_id=?1 AND occurred_at>=?2
             ORDER BY occurred_at DESC",
        )?;
        let rows = stmt.query_map(params![guest_id, to_ts(since)], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, f64>(4)?,
                r.get::<_, i64>(5)?,
                r.get::<_, String>(6)?,
            ))
        })?;
        let mut result = Vec::new();
        for row in rows {
            let (activity_id, guest_id, activity_type, description, risk_score, at, raw) =
                row?;
            let metadata: HashMap<String, String> =
                serde_json::from_str(&raw).unwrap_or_default();
            result.push(SuspiciousActivity {
                activity_id,
                guest_id,
                activity_type,
                description,
                risk_score,
                occurred_at: from_ts(at),
                metadata,
            });
        }
        Ok(result)
    }

    pub fn suspicious_scores_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<Vec<f64>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT risk_score FROM suspicious_activity
             WHERE occurred_at>=?1 AND occurred_at<?2",
        )?;
        let rows = stmt.query_map(params![to_ts(from), to_ts(to)], |r| r.get::<_, f64>(0))?;
        let mut scores = Vec::new();
        for row in rows {
            scores.push(row?);
        }
        Ok(scores)
    }

    pub fn count_check_ins_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM check_in WHERE occurred_at>=?1 AND occurred_at<?2",
            params![to_ts(from), to_ts(to)],
            |r| r.get(0),
        )?)
    }

    pub fn count_payments_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM payment WHERE occurred_at>=?1 AND occurred_at<?2",
            params![to_ts(from), to_ts(to)],
            |r| r.get(0),
        )?)
    }

    // ── Risk profiles ──────────────────────────────────────────

    /// Merge semantics, not overwrite: the peak score is kept and the
    /// flag count accumulates, so concurrent flags cannot erase each
    /// other's contribution.
    pub fn merge_risk_profile(
        &self,
        guest_id: &str,
        score: f64,
        flagged_at: DateTime<Utc>,
    ) -> EngineResult<RiskProfile> {
        self.conn().execute(
            "INSERT INTO risk_profile (guest_id, peak_score, flag_count, last_flagged_at)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(guest_id) DO UPDATE SET
                peak_score = MAX(peak_score, excluded.peak_score),
                flag_count = flag_count + 1,
                last_flagged_at = excluded.last_flagged_at",
            params![guest_id, score, to_ts(flagged_at)],
        )?;
        match self.get_risk_profile(guest_id)? {
            Some(profile) => Ok(profile),
            None => Err(crate::error::EngineError::Invariant(format!(
                "risk profile for '{guest_id}' missing after upsert"
            ))),
        }
    }

    pub fn get_risk_profile(&self, guest_id: &str) -> EngineResult<Option<RiskProfile>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT guest_id, peak_score, flag_count, last_flagged_at
                 FROM risk_profile WHERE guest_id=?1",
                params![guest_id],
                |r| {
                    Ok(RiskProfile {
                        guest_id: r.get(0)?,
                        peak_score: r.get(1)?,
                        flag_count: r.get(2)?,
                        last_flagged_at: from_ts(r.get(3)?),
                    })
                },
            )
            .optional()?)
    }

    // ── Rule catalogue ─────────────────────────────────────────

    pub fn insert_fraud_rule(&self, rule: &FraudRule) -> EngineResult<()> {
        self.conn().execute(
            "INSERT INTO fraud_rule
                (rule_id, name, description, condition, risk_weight, is_active, rule_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                rule.rule_id,
                rule.name,
                rule.description,
                rule.condition,
                rule.risk_weight,
                rule.is_active as i64,
                rule.rule_type,
            ],
        )?;
        Ok(())
    }

    pub fn active_fraud_rules(&self) -> EngineResult<Vec<FraudRule>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT rule_id, name, description, condition, risk_weight, is_active, rule_type
             FROM fraud_rule WHERE is_active=1 ORDER BY rule_id",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok(FraudRule {
                rule_id: r.get(0)?,
                name: r.get(1)?,
                description: r.get(2)?,
                condition: r.get(3)?,
                risk_weight: r.get(4)?,
                is_active: r.get::<_, i64>(5)? != 0,
                rule_type: r.get(6)?,
            })
        })?;
        let mut rules = Vec::new();
        for row in rows {
            rules.push(row?);
        }
        Ok(rules)
    }
}

//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The generator, report layer, and runner call store methods — they
//! never execute SQL directly.

use crate::analytics::{
    AgeGroupRow, CarTypeLossRow, MixRow, PolicyTotalsRow, PortfolioSummary,
};
use crate::error::PortfolioResult;
use crate::generator::{ClaimRecord, PolicyRecord};
use rusqlite::{params, Connection};

/// Per-policy totals CTE shared by every grouped query. The LEFT JOIN
/// keeps zero-claim policies in the result with a zero claims total,
/// so they never drop out of denominators.
const POLICY_CLAIMS: &str = "policy_claims AS (
    SELECT p.policy_id,
           p.car_type,
           p.age_group,
           p.premium,
           COUNT(c.claim_id) AS claims_count,
           COALESCE(SUM(c.claim_amount), 0.0) AS claims_amount
    FROM policies p
    LEFT JOIN claims c ON c.policy_id = p.policy_id
    GROUP BY p.policy_id
)";

pub struct PortfolioStore {
    conn: Connection,
}

impl PortfolioStore {
    pub fn open(path: &str) -> PortfolioResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PortfolioResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply the schema.
    pub fn migrate(&self) -> PortfolioResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_schema.sql"))?;
        Ok(())
    }

    /// Bulk-load both record sets inside a single transaction: either
    /// both relations are fully populated or the load rolls back and
    /// nothing is queryable.
    pub fn load(
        &mut self,
        policies: &[PolicyRecord],
        claims: &[ClaimRecord],
    ) -> PortfolioResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut insert_policy = tx.prepare(
                "INSERT INTO policies (policy_id, car_type, age_group, premium)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for p in policies {
                insert_policy.execute(params![p.policy_id, p.car_type, p.age_group, p.premium])?;
            }

            let mut insert_claim = tx.prepare(
                "INSERT INTO claims (claim_id, policy_id, claim_amount)
                 VALUES (?1, ?2, ?3)",
            )?;
            for c in claims {
                insert_claim.execute(params![c.claim_id, c.policy_id, c.claim_amount])?;
            }
        }
        tx.commit()?;
        log::info!("loaded {} policies and {} claims", policies.len(), claims.len());
        Ok(())
    }

    // ── Fixed analytic queries ─────────────────────────────────

    /// Loss ratio, policy/claim counts, and totals per car type.
    /// Zero-premium groups report a NULL loss ratio, never an error.
    pub fn loss_ratio_by_car_type(&self) -> PortfolioResult<Vec<CarTypeLossRow>> {
        let sql = format!(
            "WITH {POLICY_CLAIMS}
             SELECT car_type,
                    COUNT(*) AS num_policies,
                    SUM(claims_count) AS claims_count,
                    SUM(claims_amount) AS total_claims,
                    SUM(premium) AS total_premium,
                    CASE WHEN SUM(premium) = 0.0 THEN NULL
                         ELSE SUM(claims_amount) / SUM(premium) END AS loss_ratio
             FROM policy_claims
             GROUP BY car_type
             ORDER BY loss_ratio DESC, car_type ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(CarTypeLossRow {
                car_type: row.get(0)?,
                num_policies: row.get(1)?,
                claims_count: row.get(2)?,
                total_claims: row.get(3)?,
                total_premium: row.get(4)?,
                loss_ratio: row.get(5)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Exposure (policy count), claim frequency, and loss ratio per
    /// age group. Rows come back in lexicographic label order; callers
    /// re-order to the configured band order.
    pub fn age_group_stats(&self) -> PortfolioResult<Vec<AgeGroupRow>> {
        let sql = format!(
            "WITH {POLICY_CLAIMS}
             SELECT age_group,
                    COUNT(*) AS num_policies,
                    SUM(claims_count) AS claims_count,
                    AVG(CAST(claims_count AS REAL)) AS avg_claims_per_policy,
                    SUM(claims_amount) AS total_claims,
                    SUM(premium) AS total_premium,
                    CASE WHEN SUM(premium) = 0.0 THEN NULL
                         ELSE SUM(claims_amount) / SUM(premium) END AS loss_ratio
             FROM policy_claims
             GROUP BY age_group
             ORDER BY age_group ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(AgeGroupRow {
                age_group: row.get(0)?,
                num_policies: row.get(1)?,
                claims_count: row.get(2)?,
                avg_claims_per_policy: row.get(3)?,
                total_claims: row.get(4)?,
                total_premium: row.get(5)?,
                loss_ratio: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// The n policies with the highest claim totals, descending, ties
    /// broken by ascending policy id.
    pub fn top_policies(&self, n: usize) -> PortfolioResult<Vec<PolicyTotalsRow>> {
        let sql = format!(
            "WITH {POLICY_CLAIMS}
             SELECT policy_id, car_type, age_group, premium, claims_amount, claims_count
             FROM policy_claims
             ORDER BY claims_amount DESC, policy_id ASC
             LIMIT ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![n as i64], policy_totals_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// One row per policy with its claim total; feeds the histogram
    /// and scatter reports.
    pub fn per_policy_totals(&self) -> PortfolioResult<Vec<PolicyTotalsRow>> {
        let sql = format!(
            "WITH {POLICY_CLAIMS}
             SELECT policy_id, car_type, age_group, premium, claims_amount, claims_count
             FROM policy_claims
             ORDER BY policy_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], policy_totals_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Policy count and premium volume per car type, with share
    /// proportions. Shares are computed from the collected totals so
    /// they sum to 1 for any non-empty portfolio.
    pub fn portfolio_mix(&self) -> PortfolioResult<Vec<MixRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT car_type, COUNT(*) AS num_policies, SUM(premium) AS total_premium
             FROM policies
             GROUP BY car_type
             ORDER BY car_type ASC",
        )?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let policy_total: i64 = raw.iter().map(|r| r.1).sum();
        let premium_total: f64 = raw.iter().map(|r| r.2).sum();
        Ok(raw
            .into_iter()
            .map(|(car_type, num_policies, total_premium)| MixRow {
                car_type,
                num_policies,
                total_premium,
                count_share: if policy_total > 0 {
                    num_policies as f64 / policy_total as f64
                } else {
                    0.0
                },
                premium_share: if premium_total > 0.0 {
                    total_premium / premium_total
                } else {
                    0.0
                },
            })
            .collect())
    }

    /// Whole-portfolio totals and the overall loss ratio.
    pub fn summary(&self) -> PortfolioResult<PortfolioSummary> {
        let sql = format!(
            "WITH {POLICY_CLAIMS}
             SELECT COUNT(*) AS total_policies,
                    COALESCE(SUM(claims_count), 0) AS total_claim_records,
                    COALESCE(SUM(claims_amount), 0.0) AS total_claim_amount,
                    COALESCE(SUM(premium), 0.0) AS total_premium,
                    CASE WHEN COALESCE(SUM(premium), 0.0) = 0.0 THEN NULL
                         ELSE SUM(claims_amount) / SUM(premium) END AS overall_loss_ratio
             FROM policy_claims"
        );
        self.conn
            .query_row(&sql, [], |row| {
                Ok(PortfolioSummary {
                    total_policies: row.get(0)?,
                    total_claim_records: row.get(1)?,
                    total_claim_amount: row.get(2)?,
                    total_premium: row.get(3)?,
                    overall_loss_ratio: row.get(4)?,
                })
            })
            .map_err(Into::into)
    }

    // ── Test helper methods ────────────────────────────────────

    pub fn policy_count(&self) -> PortfolioResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM policies", [], |row| row.get(0))
            .map_err(Into::into)
    }

    pub fn claim_count(&self) -> PortfolioResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM claims", [], |row| row.get(0))
            .map_err(Into::into)
    }

    /// Claims whose policy reference does not resolve. Always zero
    /// after a successful load.
    pub fn orphan_claim_count(&self) -> PortfolioResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*)
                 FROM claims c
                 LEFT JOIN policies p ON p.policy_id = c.policy_id
                 WHERE p.policy_id IS NULL",
                [],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}

fn policy_totals_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PolicyTotalsRow> {
    Ok(PolicyTotalsRow {
        policy_id: row.get(0)?,
        car_type: row.get(1)?,
        age_group: row.get(2)?,
        premium: row.get(3)?,
        total_claims: row.get(4)?,
        claims_count: row.get(5)?,
    })
}

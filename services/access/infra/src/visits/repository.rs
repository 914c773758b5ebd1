use access_core::domains::notifications::model::Notification;
use access_core::domains::visits::model::{
    ScanAction, Visit, VisitState, Visitor, VisitWithVisitors, VisitorState,
};
use access_core::domains::visits::repository::{VisitListFilter, VisitRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_error::AppError;
use shared_types::{Page, PageRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::notifications::repository::insert_notification;

#[derive(Clone)]
pub struct PgVisitRepository {
    pool: PgPool,
}

impl PgVisitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_visitors(&self, visit_id: Uuid) -> Result<Vec<Visitor>, AppError> {
        let visitors = sqlx::query_as::<_, Visitor>(
            "SELECT * FROM visit_visitors WHERE visit_id = $1 ORDER BY sequence ASC",
        )
        .bind(visit_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(visitors)
    }
}

#[async_trait]
impl VisitRepository for PgVisitRepository {
    async fn create(
        &self,
        visit: &Visit,
        visitors: &[Visitor],
        pending_notification: Option<&Notification>,
    ) -> Result<VisitWithVisitors, AppError> {
        let mut tx = self.pool.begin().await?;

        let created_visit = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visits (
                visit_id, host_id, building_id, purpose, expected_start, expected_end,
                short_code, qr_hash, state, created_at, last_transition_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(visit.visit_id)
        .bind(visit.host_id)
        .bind(visit.building_id)
        .bind(&visit.purpose)
        .bind(visit.expected_start)
        .bind(visit.expected_end)
        .bind(&visit.short_code)
        .bind(&visit.qr_hash)
        .bind(&visit.state)
        .bind(visit.created_at)
        .bind(visit.last_transition_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut created_visitors = Vec::with_capacity(visitors.len());
        for visitor in visitors {
            let row = sqlx::query_as::<_, Visitor>(
                r#"
                INSERT INTO visit_visitors (
                    visitor_id, visit_id, display_name, phone_e164, state, entry_at, exit_at, sequence
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
                "#,
            )
            .bind(visitor.visitor_id)
            .bind(visitor.visit_id)
            .bind(&visitor.display_name)
            .bind(&visitor.phone_e164)
            .bind(&visitor.state)
            .bind(visitor.entry_at)
            .bind(visitor.exit_at)
            .bind(visitor.sequence)
            .fetch_one(&mut *tx)
            .await?;
            created_visitors.push(row);
        }

        if let Some(notification) = pending_notification {
            insert_notification(&mut *tx, notification).await?;
        }

        tx.commit().await?;

        Ok(VisitWithVisitors { visit: created_visit, visitors: created_visitors })
    }

    async fn find_by_id(&self, visit_id: Uuid) -> Result<Option<VisitWithVisitors>, AppError> {
        let visit = sqlx::query_as::<_, Visit>("SELECT * FROM visits WHERE visit_id = $1")
            .bind(visit_id)
            .fetch_optional(&self.pool)
            .await?;

        match visit {
            Some(visit) => {
                let visitors = self.load_visitors(visit.visit_id).await?;
                Ok(Some(VisitWithVisitors { visit, visitors }))
            },
            None => Ok(None),
        }
    }

    async fn find_by_qr_hash(&self, qr_hash: &str) -> Result<Option<VisitWithVisitors>, AppError> {
        let visit = sqlx::query_as::<_, Visit>(
            r#"
            SELECT * FROM visits
            WHERE qr_hash = $1 AND state NOT IN ('completed', 'cancelled', 'expired')
            "#,
        )
        .bind(qr_hash)
        .fetch_optional(&self.pool)
        .await?;

        match visit {
            Some(visit) => {
                let visitors = self.load_visitors(visit.visit_id).await?;
                Ok(Some(VisitWithVisitors { visit, visitors }))
            },
            None => Ok(None),
        }
    }

    async fn find_by_short_code(
        &self,
        building_id: Uuid,
        short_code: &str,
    ) -> Result<Option<VisitWithVisitors>, AppError> {
        let visit = sqlx::query_as::<_, Visit>(
            r#"
            SELECT * FROM visits
            WHERE building_id = $1 AND short_code = $2
              AND state NOT IN ('completed', 'cancelled', 'expired')
            "#,
        )
        .bind(building_id)
        .bind(short_code)
        .fetch_optional(&self.pool)
        .await?;

        match visit {
            Some(visit) => {
                let visitors = self.load_visitors(visit.visit_id).await?;
                Ok(Some(VisitWithVisitors { visit, visitors }))
            },
            None => Ok(None),
        }
    }

    async fn list(&self, filter: VisitListFilter, page: PageRequest) -> Result<Page<Visit>, AppError> {
        let mut count_builder = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM visits WHERE 1 = 1");
        let mut select_builder = sqlx::QueryBuilder::new("SELECT * FROM visits WHERE 1 = 1");

        if let Some(building_id) = filter.building_id {
            count_builder.push(" AND building_id = ").push_bind(building_id);
            select_builder.push(" AND building_id = ").push_bind(building_id);
        }
        if let Some(host_id) = filter.host_id {
            count_builder.push(" AND host_id = ").push_bind(host_id);
            select_builder.push(" AND host_id = ").push_bind(host_id);
        }
        if let Some(state) = filter.state {
            let state_str = state.to_string();
            count_builder.push(" AND state = ").push_bind(state_str.clone());
            select_builder.push(" AND state = ").push_bind(state_str);
        }

        let (total,): (i64,) = count_builder.build_query_as().fetch_one(&self.pool).await?;

        select_builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.per_page() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let visits = select_builder.build_query_as::<Visit>().fetch_all(&self.pool).await?;

        Ok(Page::new(visits, total, page))
    }

    async fn update_details(
        &self,
        visit_id: Uuid,
        purpose: Option<String>,
        expected_start: Option<DateTime<Utc>>,
        expected_end: Option<DateTime<Utc>>,
    ) -> Result<Visit, AppError> {
        let updated = sqlx::query_as::<_, Visit>(
            r#"
            UPDATE visits
            SET purpose = COALESCE($2, purpose),
                expected_start = COALESCE($3, expected_start),
                expected_end = COALESCE($4, expected_end)
            WHERE visit_id = $1
            RETURNING *
            "#,
        )
        .bind(visit_id)
        .bind(purpose)
        .bind(expected_start)
        .bind(expected_end)
        .fetch_one(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn try_transition_visit_state(
        &self,
        visit_id: Uuid,
        from: VisitState,
        to: VisitState,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE visits
            SET state = $3, last_transition_at = NOW()
            WHERE visit_id = $1 AND state = $2
            "#,
        )
        .bind(visit_id)
        .bind(from.to_string())
        .bind(to.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn try_transition_visitor_state(
        &self,
        visitor_id: Uuid,
        from: VisitorState,
        to: VisitorState,
        action: ScanAction,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = match action {
            ScanAction::Entry => {
                sqlx::query(
                    r#"
                    UPDATE visit_visitors
                    SET state = $3, entry_at = $4
                    WHERE visitor_id = $1 AND state = $2
                    "#,
                )
                .bind(visitor_id)
                .bind(from.to_string())
                .bind(to.to_string())
                .bind(at)
                .execute(&self.pool)
                .await?
            },
            ScanAction::Exit => {
                sqlx::query(
                    r#"
                    UPDATE visit_visitors
                    SET state = $3, exit_at = $4
                    WHERE visitor_id = $1 AND state = $2
                    "#,
                )
                .bind(visitor_id)
                .bind(from.to_string())
                .bind(to.to_string())
                .bind(at)
                .execute(&self.pool)
                .await?
            },
        };
        Ok(result.rows_affected() == 1)
    }

    async fn next_visitor_in_state(
        &self,
        visit_id: Uuid,
        state: VisitorState,
    ) -> Result<Option<Visitor>, AppError> {
        let visitor = sqlx::query_as::<_, Visitor>(
            r#"
            SELECT * FROM visit_visitors
            WHERE visit_id = $1 AND state = $2
            ORDER BY sequence ASC
            LIMIT 1
            "#,
        )
        .bind(visit_id)
        .bind(state.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(visitor)
    }

    async fn count_visitors_in_state(
        &self,
        visit_id: Uuid,
        state: VisitorState,
    ) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM visit_visitors WHERE visit_id = $1 AND state = $2",
        )
        .bind(visit_id)
        .bind(state.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn retire_codes(&self, visit_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE visits SET short_code = NULL, qr_hash = NULL WHERE visit_id = $1")
            .bind(visit_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn cancel_non_terminal_visitors(&self, visit_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE visit_visitors
            SET state = 'cancelled'
            WHERE visit_id = $1 AND state NOT IN ('exited', 'cancelled')
            "#,
        )
        .bind(visit_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_expired_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Visit>, AppError> {
        let visits = sqlx::query_as::<_, Visit>(
            r#"
            SELECT * FROM visits
            WHERE state NOT IN ('completed', 'cancelled', 'expired') AND expected_end < $1
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        Ok(visits)
    }
}

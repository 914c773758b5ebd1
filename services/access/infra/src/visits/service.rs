use std::sync::Arc;

use access_core::authorize::{authorize, AuthContext, Capability, Scope};
use access_core::codes::{generate_qr_token, generate_short_code};
use access_core::domains::bans::service::{BanEngineService, BLOCKING_SEVERITY_FLOOR};
use access_core::domains::visits::dto::visit_dto::{
    CreateVisitReq, CreateVisitResp, PatchVisitReq, ScanActionReq, ScanReq, ScanResp, VisitSummary,
    VisitorSummary,
};
use access_core::domains::notifications::model::Notification;
use access_core::domains::visits::model::{
    ScanAction, Visit, VisitState, Visitor, VisitWithVisitors, VisitorState,
};
use access_core::domains::visits::repository::{VisitListFilter, VisitRepository};
use access_core::domains::visits::service::VisitEngineService;
use access_core::engine_error::EngineError;
use access_core::events::{building_topic, role_topic, user_topic, DomainEvent, EventEnvelope, EventPublisher};
use access_core::phone::normalize_e164;
use async_trait::async_trait;
use chrono::Utc;
use shared_types::{Page, PageRequest};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const SHORT_CODE_RETRY_LIMIT: usize = 5;
const TRANSITION_RETRY_LIMIT: usize = 3;

pub struct VisitEngineImpl<VR, BE, EP>
where
    VR: VisitRepository,
    BE: BanEngineService,
    EP: EventPublisher,
{
    visit_repo: VR,
    ban_engine: Arc<BE>,
    events: Arc<EP>,
}

impl<VR, BE, EP> VisitEngineImpl<VR, BE, EP>
where
    VR: VisitRepository,
    BE: BanEngineService,
    EP: EventPublisher,
{
    pub fn new(visit_repo: VR, ban_engine: Arc<BE>, events: Arc<EP>) -> Self {
        Self { visit_repo, ban_engine, events }
    }

    fn hash_qr(token: &str) -> String {
        format!("{:x}", Sha256::digest(token.as_bytes()))
    }

    fn to_visitor_summary(v: &Visitor) -> VisitorSummary {
        VisitorSummary {
            visitor_id: v.visitor_id,
            name: v.display_name.clone(),
            phone: v.phone_e164.clone(),
            state: v.state(),
            entry_at: v.entry_at,
            exit_at: v.exit_at,
        }
    }

    fn to_summary(vv: &VisitWithVisitors) -> VisitSummary {
        VisitSummary {
            visit_id: vv.visit.visit_id,
            host_id: vv.visit.host_id,
            building_id: vv.visit.building_id,
            purpose: vv.visit.purpose.clone(),
            expected_start: vv.visit.expected_start,
            expected_end: vv.visit.expected_end,
            short_code: vv.visit.short_code.clone(),
            state: vv.visit.state(),
            visitors: vv.visitors.iter().map(Self::to_visitor_summary).collect(),
            created_at: vv.visit.created_at,
        }
    }

    async fn reload(&self, visit_id: Uuid) -> Result<VisitWithVisitors, EngineError> {
        self.visit_repo
            .find_by_id(visit_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("visit not found".to_string()))
    }

    async fn jittered_backoff(attempt: u32) {
        let millis = 10 + (rand::random::<u64>() % 40) + u64::from(attempt) * 5;
        tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
    }
}

#[async_trait]
impl<VR, BE, EP> VisitEngineService for VisitEngineImpl<VR, BE, EP>
where
    VR: VisitRepository,
    BE: BanEngineService,
    EP: EventPublisher,
{
    async fn create(&self, caller: AuthContext, req: CreateVisitReq) -> Result<CreateVisitResp, EngineError> {
        let building_id = caller
            .building_id
            .ok_or_else(|| EngineError::Validation("caller has no building".to_string()))?;
        authorize(&caller, Capability::CreateVisit, Scope::Building(building_id))?;

        if req.visitors.is_empty() {
            return Err(EngineError::Validation("a visit needs at least one visitor".to_string()));
        }
        if req.expected_end <= req.expected_start {
            return Err(EngineError::Validation("expected_end must be after expected_start".to_string()));
        }

        let mut blocked = Vec::new();
        let mut warnings = Vec::new();
        let mut normalized_visitors = Vec::with_capacity(req.visitors.len());

        for visitor_req in &req.visitors {
            let phone = normalize_e164(&visitor_req.phone).map_err(EngineError::Validation)?;

            if self.ban_engine.is_banned_by_user(caller.user_id, &phone).await?.is_some() {
                blocked.push(phone.clone());
                normalized_visitors.push((visitor_req.name.clone(), phone));
                continue;
            }

            let building_bans = self.ban_engine.is_banned_in_building(building_id, &phone).await?;
            if let Some(worst) = building_bans.iter().map(|b| b.severity()).max() {
                if worst >= BLOCKING_SEVERITY_FLOOR {
                    blocked.push(phone.clone());
                } else {
                    warnings.push(format!("{} has a low-severity ban on file", phone));
                }
            }

            normalized_visitors.push((visitor_req.name.clone(), phone));
        }

        if !blocked.is_empty() {
            return Err(EngineError::VisitorBanned(blocked));
        }

        let qr_token = generate_qr_token();
        let qr_hash = Self::hash_qr(&qr_token);

        let mut short_code = generate_short_code();
        for attempt in 0..SHORT_CODE_RETRY_LIMIT {
            match self.visit_repo.find_by_short_code(building_id, &short_code).await? {
                None => break,
                Some(_) if attempt + 1 == SHORT_CODE_RETRY_LIMIT => {
                    return Err(EngineError::Conflict(
                        "could not allocate a unique visit code".to_string(),
                    ));
                },
                Some(_) => {
                    short_code = generate_short_code();
                },
            }
        }

        let now = Utc::now();
        let visit = Visit {
            visit_id: Uuid::now_v7(),
            host_id: caller.user_id,
            building_id,
            purpose: req.purpose,
            expected_start: req.expected_start,
            expected_end: req.expected_end,
            short_code: Some(short_code.clone()),
            qr_hash: Some(qr_hash),
            state: VisitState::Pending.to_string(),
            created_at: now,
            last_transition_at: now,
        };

        let visitors: Vec<Visitor> = normalized_visitors
            .into_iter()
            .enumerate()
            .map(|(idx, (name, phone))| Visitor {
                visitor_id: Uuid::now_v7(),
                visit_id: visit.visit_id,
                display_name: name,
                phone_e164: phone,
                state: VisitorState::Expected.to_string(),
                entry_at: None,
                exit_at: None,
                sequence: idx as i32,
            })
            .collect();

        let notification = Notification {
            notification_id: Uuid::now_v7(),
            user_id: visit.host_id,
            building_id: Some(visit.building_id),
            notification_type: "visit_created".to_string(),
            title: "New visit created".to_string(),
            body: format!("A visit for {} guest(s) was scheduled, code {}.", visitors.len(), short_code),
            payload: serde_json::json!({
                "visit_id": visit.visit_id,
                "short_code": short_code,
                "expected_at": visit.expected_start,
            }),
            priority: "low".to_string(),
            read: false,
            created_at: now,
            expires_at: None,
        };

        let created = self.visit_repo.create(&visit, &visitors, Some(&notification)).await?;

        self.events
            .publish(EventEnvelope::new(
                user_topic(created.visit.host_id),
                DomainEvent::VisitCreated {
                    visit_id: created.visit.visit_id,
                    building_id: created.visit.building_id,
                    host_id: created.visit.host_id,
                    short_code: short_code.clone(),
                    expected_at: created.visit.expected_start,
                },
            ))
            .await;
        self.events
            .publish(EventEnvelope::new(
                building_topic(created.visit.building_id),
                DomainEvent::VisitCreated {
                    visit_id: created.visit.visit_id,
                    building_id: created.visit.building_id,
                    host_id: created.visit.host_id,
                    short_code: short_code.clone(),
                    expected_at: created.visit.expected_start,
                },
            ))
            .await;
        self.events
            .publish(EventEnvelope::new(
                role_topic("security", created.visit.building_id),
                DomainEvent::VisitCreated {
                    visit_id: created.visit.visit_id,
                    building_id: created.visit.building_id,
                    host_id: created.visit.host_id,
                    short_code,
                    expected_at: created.visit.expected_start,
                },
            ))
            .await;

        Ok(CreateVisitResp { visit: Self::to_summary(&created), qr: qr_token, warnings })
    }

    async fn scan(&self, caller: AuthContext, req: ScanReq) -> Result<ScanResp, EngineError> {
        let qr_hash = Self::hash_qr(&req.code);
        let mut found = self.visit_repo.find_by_qr_hash(&qr_hash).await?;
        if found.is_none() {
            // Not a QR token; treat `code` as a building-scoped short code.
            // The caller's building is required either way.
            let building_id = caller
                .building_id
                .ok_or_else(|| EngineError::Validation("caller has no building".to_string()))?;
            found = self.visit_repo.find_by_short_code(building_id, &req.code).await?;
        }

        let target = found.ok_or(EngineError::ScanTargetUnknown)?;

        authorize(
            &caller,
            Capability::ScanQr,
            Scope::Visit { host: target.visit.host_id, building: target.visit.building_id },
        )?;

        let (from_visitor_state, to_visitor_state, scan_action) = match req.action {
            ScanActionReq::Entry => (VisitorState::Expected, VisitorState::Entered, ScanAction::Entry),
            ScanActionReq::Exit => (VisitorState::Entered, VisitorState::Exited, ScanAction::Exit),
        };

        let visit_state = target.visit.state();
        match req.action {
            ScanActionReq::Entry => {
                if !matches!(visit_state, VisitState::Pending | VisitState::Confirmed | VisitState::Active) {
                    return Err(EngineError::InvalidTransition(format!(
                        "cannot record entry on a visit in state {}",
                        visit_state
                    )));
                }
            },
            ScanActionReq::Exit => {
                if visit_state != VisitState::Active {
                    return Err(EngineError::InvalidTransition(format!(
                        "cannot record exit on a visit in state {}",
                        visit_state
                    )));
                }
            },
        }

        let mut transitioned_visitor_id = None;
        for attempt in 0..TRANSITION_RETRY_LIMIT {
            let candidate =
                self.visit_repo.next_visitor_in_state(target.visit.visit_id, from_visitor_state).await?;
            let Some(candidate) = candidate else {
                return Err(EngineError::AllVisitorsProcessed);
            };

            let now = Utc::now();
            let applied = self
                .visit_repo
                .try_transition_visitor_state(
                    candidate.visitor_id,
                    from_visitor_state,
                    to_visitor_state,
                    scan_action,
                    now,
                )
                .await?;

            if applied {
                transitioned_visitor_id = Some(candidate.visitor_id);
                break;
            }

            if attempt + 1 == TRANSITION_RETRY_LIMIT {
                return Err(EngineError::Conflict(
                    "could not claim a visitor for this scan, too much contention".to_string(),
                ));
            }
            Self::jittered_backoff(attempt as u32).await;
        }

        let visitor_id = transitioned_visitor_id.expect("loop returns before falling through without a value");

        if req.action == ScanActionReq::Entry {
            // Bring the visit itself active the first time anyone enters.
            let _ = self
                .visit_repo
                .try_transition_visit_state(target.visit.visit_id, VisitState::Pending, VisitState::Active)
                .await?;
            let _ = self
                .visit_repo
                .try_transition_visit_state(target.visit.visit_id, VisitState::Confirmed, VisitState::Active)
                .await?;
        } else {
            let remaining = self
                .visit_repo
                .count_visitors_in_state(target.visit.visit_id, VisitorState::Expected)
                .await?
                + self
                    .visit_repo
                    .count_visitors_in_state(target.visit.visit_id, VisitorState::Arrived)
                    .await?
                + self
                    .visit_repo
                    .count_visitors_in_state(target.visit.visit_id, VisitorState::Entered)
                    .await?;

            if remaining == 0 {
                let completed = self
                    .visit_repo
                    .try_transition_visit_state(target.visit.visit_id, VisitState::Active, VisitState::Completed)
                    .await?;
                if completed {
                    self.visit_repo.retire_codes(target.visit.visit_id).await?;
                }
            }
        }

        let reloaded = self.reload(target.visit.visit_id).await?;
        let visitor = reloaded
            .visitors
            .iter()
            .find(|v| v.visitor_id == visitor_id)
            .expect("the visitor just transitioned must still be in the reloaded visit");

        self.events
            .publish(EventEnvelope::new(
                building_topic(reloaded.visit.building_id),
                DomainEvent::VisitorScanned {
                    visit_id: reloaded.visit.visit_id,
                    building_id: reloaded.visit.building_id,
                    visitor_index: visitor.sequence as usize,
                    visitor_state: visitor.state().to_string(),
                },
            ))
            .await;

        Ok(ScanResp { visit: Self::to_summary(&reloaded), visitor: Self::to_visitor_summary(visitor) })
    }

    async fn cancel(&self, caller: AuthContext, visit_id: Uuid) -> Result<VisitSummary, EngineError> {
        let current = self.reload(visit_id).await?;
        authorize(
            &caller,
            Capability::UpdateCancelVisit,
            Scope::Visit { host: current.visit.host_id, building: current.visit.building_id },
        )?;

        if current.visit.state().is_terminal() {
            return Err(EngineError::InvalidTransition("visit is already terminal".to_string()));
        }

        let from = current.visit.state();
        let applied =
            self.visit_repo.try_transition_visit_state(visit_id, from, VisitState::Cancelled).await?;
        if !applied {
            return Err(EngineError::Conflict("visit state changed concurrently".to_string()));
        }

        self.visit_repo.cancel_non_terminal_visitors(visit_id).await?;
        self.visit_repo.retire_codes(visit_id).await?;

        self.events
            .publish(EventEnvelope::new(
                building_topic(current.visit.building_id),
                DomainEvent::VisitCancelled {
                    visit_id,
                    building_id: current.visit.building_id,
                    cancelled_by: caller.user_id,
                },
            ))
            .await;

        let reloaded = self.reload(visit_id).await?;
        Ok(Self::to_summary(&reloaded))
    }

    async fn patch(
        &self,
        caller: AuthContext,
        visit_id: Uuid,
        req: PatchVisitReq,
    ) -> Result<VisitSummary, EngineError> {
        let current = self.reload(visit_id).await?;
        authorize(
            &caller,
            Capability::UpdateCancelVisit,
            Scope::Visit { host: current.visit.host_id, building: current.visit.building_id },
        )?;

        if current.visit.state().is_terminal() {
            return Err(EngineError::InvalidTransition("visit is already terminal".to_string()));
        }

        if let (Some(start), Some(end)) = (req.expected_start, req.expected_end) {
            if end <= start {
                return Err(EngineError::Validation(
                    "expected_end must be after expected_start".to_string(),
                ));
            }
        }

        self.visit_repo
            .update_details(visit_id, req.purpose, req.expected_start, req.expected_end)
            .await?;

        let reloaded = self.reload(visit_id).await?;
        Ok(Self::to_summary(&reloaded))
    }

    async fn get(&self, caller: AuthContext, visit_id: Uuid) -> Result<VisitSummary, EngineError> {
        let current = self.reload(visit_id).await?;
        authorize(
            &caller,
            Capability::ReadBuildingBans,
            Scope::Building(current.visit.building_id),
        )?;
        Ok(Self::to_summary(&current))
    }

    async fn list(
        &self,
        caller: AuthContext,
        filter: VisitListFilter,
        page: PageRequest,
    ) -> Result<Page<VisitSummary>, EngineError> {
        let building_id = filter
            .building_id
            .or(caller.building_id)
            .ok_or_else(|| EngineError::Validation("a building scope is required".to_string()))?;
        authorize(&caller, Capability::ReadBuildingBans, Scope::Building(building_id))?;

        let scoped_filter = VisitListFilter { building_id: Some(building_id), ..filter };
        let page_of_visits = self.visit_repo.list(scoped_filter, page).await?;

        let mut summaries = Vec::with_capacity(page_of_visits.items.len());
        for visit in &page_of_visits.items {
            let with_visitors = self.reload(visit.visit_id).await?;
            summaries.push(Self::to_summary(&with_visitors));
        }

        Ok(Page {
            items: summaries,
            total: page_of_visits.total,
            total_pages: page_of_visits.total_pages,
            has_next: page_of_visits.has_next,
            has_prev: page_of_visits.has_prev,
        })
    }

    async fn expire(&self, visit_id: Uuid) -> Result<(), EngineError> {
        let current = self.reload(visit_id).await?;
        if current.visit.state().is_terminal() {
            return Ok(());
        }

        let from = current.visit.state();
        let applied =
            self.visit_repo.try_transition_visit_state(visit_id, from, VisitState::Expired).await?;
        if !applied {
            // Lost the race to another sweeper tick or a concurrent scan;
            // idempotent by contract, nothing left to do.
            return Ok(());
        }

        self.visit_repo.cancel_non_terminal_visitors(visit_id).await?;
        self.visit_repo.retire_codes(visit_id).await?;

        self.events
            .publish(EventEnvelope::new(
                building_topic(current.visit.building_id),
                DomainEvent::VisitExpired { visit_id, building_id: current.visit.building_id },
            ))
            .await;

        Ok(())
    }
}

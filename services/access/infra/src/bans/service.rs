use std::sync::Arc;

use access_core::authorize::{authorize, AuthContext, Capability, Scope};
use access_core::domains::bans::dto::ban_dto::{BanCheckResp, BanSummary, CreateBanReq, UnbanReq};
use access_core::domains::bans::model::{Ban, BanSeverity, BanType};
use access_core::domains::bans::repository::BanRepository;
use access_core::domains::bans::service::BanEngineService;
use access_core::domains::notifications::model::Notification;
use access_core::engine_error::EngineError;
use access_core::events::{building_topic, role_topic, user_topic, DomainEvent, EventEnvelope, EventPublisher};
use access_core::phone::normalize_e164;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

pub struct BanEngineImpl<BR, EP>
where
    BR: BanRepository,
    EP: EventPublisher,
{
    ban_repo: BR,
    events: Arc<EP>,
}

impl<BR, EP> BanEngineImpl<BR, EP>
where
    BR: BanRepository,
    EP: EventPublisher,
{
    pub fn new(ban_repo: BR, events: Arc<EP>) -> Self {
        Self { ban_repo, events }
    }

    fn to_summary(ban: &Ban) -> BanSummary {
        BanSummary {
            ban_id: ban.ban_id,
            owner_id: ban.owner_id,
            phone: ban.phone_e164.clone(),
            target_name: ban.target_name.clone(),
            reason: ban.reason.clone(),
            severity: ban.severity(),
            ban_type: ban.ban_type.parse().unwrap_or(BanType::Manual),
            created_at: ban.created_at,
            expires_at: ban.expires_at,
            active: ban.active,
        }
    }
}

#[async_trait]
impl<BR, EP> BanEngineService for BanEngineImpl<BR, EP>
where
    BR: BanRepository,
    EP: EventPublisher,
{
    async fn ban(&self, caller: AuthContext, req: CreateBanReq) -> Result<BanSummary, EngineError> {
        authorize(&caller, Capability::ManageBan, Scope::BanOwner(caller.user_id))?;

        let building_id = caller
            .building_id
            .ok_or_else(|| EngineError::Validation("caller has no building".to_string()))?;

        let phone = normalize_e164(&req.phone).map_err(EngineError::Validation)?;

        if self
            .ban_repo
            .find_active_by_owner_and_phone(caller.user_id, &phone)
            .await?
            .is_some()
        {
            return Err(EngineError::BanAlreadyExists);
        }

        let now = Utc::now();
        let ban = Ban {
            ban_id: Uuid::now_v7(),
            owner_id: caller.user_id,
            building_id,
            phone_e164: phone,
            target_name: req.name,
            reason: req.reason,
            severity: req.severity.to_string(),
            ban_type: BanType::Manual.to_string(),
            created_at: now,
            expires_at: req.expires_at,
            active: true,
            unban_reason: None,
            unbanned_at: None,
        };

        let notification = Notification {
            notification_id: Uuid::now_v7(),
            user_id: ban.owner_id,
            building_id: Some(ban.building_id),
            notification_type: "ban_created".to_string(),
            title: "Ban recorded".to_string(),
            body: format!("{} was banned: {}", ban.target_name, ban.reason),
            payload: serde_json::json!({
                "ban_id": ban.ban_id,
                "phone_e164": ban.phone_e164,
                "severity": ban.severity,
            }),
            priority: "medium".to_string(),
            read: false,
            created_at: now,
            expires_at: None,
        };

        let created = self.ban_repo.create(&ban, Some(&notification)).await?;

        self.events
            .publish(EventEnvelope::new(
                user_topic(created.owner_id),
                DomainEvent::BanCreated {
                    ban_id: created.ban_id,
                    owner_id: created.owner_id,
                    building_id: Some(created.building_id),
                    phone_e164: created.phone_e164.clone(),
                    severity: created.severity.clone(),
                },
            ))
            .await;
        self.events
            .publish(EventEnvelope::new(
                role_topic("security", created.building_id),
                DomainEvent::BanCreated {
                    ban_id: created.ban_id,
                    owner_id: created.owner_id,
                    building_id: Some(created.building_id),
                    phone_e164: created.phone_e164.clone(),
                    severity: created.severity.clone(),
                },
            ))
            .await;

        Ok(Self::to_summary(&created))
    }

    async fn unban(
        &self,
        caller: AuthContext,
        ban_id: Uuid,
        req: UnbanReq,
    ) -> Result<BanSummary, EngineError> {
        let existing = self
            .ban_repo
            .find_by_id(ban_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("ban not found".to_string()))?;

        authorize(&caller, Capability::ManageBan, Scope::BanOwner(existing.owner_id))?;

        let notification = Notification {
            notification_id: Uuid::now_v7(),
            user_id: existing.owner_id,
            building_id: Some(existing.building_id),
            notification_type: "ban_removed".to_string(),
            title: "Ban lifted".to_string(),
            body: format!("The ban on {} was lifted: {}", existing.target_name, req.reason),
            payload: serde_json::json!({
                "ban_id": existing.ban_id,
                "phone_e164": existing.phone_e164,
            }),
            priority: "low".to_string(),
            read: false,
            created_at: Utc::now(),
            expires_at: None,
        };

        let updated = self.ban_repo.deactivate(ban_id, &req.reason, Some(&notification)).await?;

        self.events
            .publish(EventEnvelope::new(
                user_topic(updated.owner_id),
                DomainEvent::BanRemoved {
                    ban_id: updated.ban_id,
                    owner_id: updated.owner_id,
                    building_id: Some(updated.building_id),
                },
            ))
            .await;

        Ok(Self::to_summary(&updated))
    }

    async fn check(&self, caller: AuthContext, phone: &str) -> Result<BanCheckResp, EngineError> {
        let building_id = caller
            .building_id
            .ok_or_else(|| EngineError::Validation("caller has no building".to_string()))?;
        authorize(&caller, Capability::ReadBuildingBans, Scope::Building(building_id))?;

        let phone = normalize_e164(phone).map_err(EngineError::Validation)?;

        let user_ban = self
            .ban_repo
            .find_active_by_owner_and_phone(caller.user_id, &phone)
            .await?;
        let building_bans = self.ban_repo.find_active_in_building(building_id, &phone).await?;

        let distinct_owners: std::collections::HashSet<Uuid> =
            building_bans.iter().map(|b| b.owner_id).collect();

        Ok(BanCheckResp {
            user_ban: user_ban.as_ref().map(Self::to_summary),
            building_bans: building_bans.iter().map(Self::to_summary).collect(),
            multiple: distinct_owners.len() >= 2,
        })
    }

    async fn is_banned_by_user(&self, owner_id: Uuid, phone_e164: &str) -> Result<Option<Ban>, EngineError> {
        Ok(self.ban_repo.find_active_by_owner_and_phone(owner_id, phone_e164).await?)
    }

    async fn is_banned_in_building(
        &self,
        building_id: Uuid,
        phone_e164: &str,
    ) -> Result<Vec<Ban>, EngineError> {
        Ok(self.ban_repo.find_active_in_building(building_id, phone_e164).await?)
    }
}

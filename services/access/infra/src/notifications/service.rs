use access_core::domains::notifications::dto::notification_dto::NotificationSummary;
use access_core::domains::notifications::model::Notification;
use access_core::domains::notifications::repository::NotificationRepository;
use access_core::domains::notifications::service::NotificationService;
use access_core::engine_error::EngineError;
use async_trait::async_trait;
use shared_types::{Page, PageRequest};
use uuid::Uuid;

pub struct NotificationServiceImpl<NR>
where
    NR: NotificationRepository,
{
    notification_repo: NR,
}

impl<NR> NotificationServiceImpl<NR>
where
    NR: NotificationRepository,
{
    pub fn new(notification_repo: NR) -> Self {
        Self { notification_repo }
    }

    fn to_summary(n: &Notification) -> NotificationSummary {
        NotificationSummary {
            notification_id: n.notification_id,
            building_id: n.building_id,
            notification_type: n.notification_type.clone(),
            title: n.title.clone(),
            body: n.body.clone(),
            payload: n.payload.clone(),
            priority: n.priority(),
            read: n.read,
            created_at: n.created_at,
        }
    }
}

#[async_trait]
impl<NR> NotificationService for NotificationServiceImpl<NR>
where
    NR: NotificationRepository,
{
    async fn list(&self, user_id: Uuid, page: PageRequest) -> Result<Page<NotificationSummary>, EngineError> {
        let page_of_notifications = self.notification_repo.list_for_user(user_id, page).await?;
        Ok(Page {
            items: page_of_notifications.items.iter().map(Self::to_summary).collect(),
            total: page_of_notifications.total,
            total_pages: page_of_notifications.total_pages,
            has_next: page_of_notifications.has_next,
            has_prev: page_of_notifications.has_prev,
        })
    }

    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<NotificationSummary, EngineError> {
        let updated = self.notification_repo.mark_read(notification_id, user_id).await?;
        Ok(Self::to_summary(&updated))
    }
}

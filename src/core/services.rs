use crate::core::constants::{
    DEFAULT_INVITE_CODE_ATTEMPTS, DEFAULT_MAX_BUDGET, GIFT_ADDED, GIFT_DELETED, GIFT_UPDATED, GROUP_CREATED,
    GROUP_DELETED, GROUP_JOINED, GROUP_RENAMED, MAX_NAME_LENGTH, MAX_PRICE, MAX_URL_LENGTH, PARTICIPANT_ADDED,
    PARTICIPANT_DELETED,
};
use crate::core::errors::SantaError;
use crate::core::invite::InviteCode;
use crate::core::live::publisher::GroupFeed;
use crate::core::live::subscription::Subscription;
use crate::core::models::{
    AccessKind, AppLog, Gift, GiftPatch, Group, NewGift, NewGroup, NewMember, NewParticipant, Participant,
    ParticipantSummary, Role, calculate_total,
};
use crate::core::query::{Direction, Query};
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

/// Tunables the service needs; the binary fills them from configuration.
#[derive(Clone, Debug)]
pub struct ServiceSettings {
    pub default_max_budget: f64,
    pub invite_code_attempts: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        ServiceSettings {
            default_max_budget: DEFAULT_MAX_BUDGET,
            invite_code_attempts: DEFAULT_INVITE_CODE_ATTEMPTS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone)]
pub struct JoinedGroup {
    pub group: Group,
    pub participant: Participant,
}

pub fn is_admin(group: &Group, actor: &str) -> bool {
    group.is_admin(actor)
}

/// The admin edits every wish list; anyone else only the one linked to them.
pub fn can_edit_participant(group: &Group, participant: &Participant, actor: &str) -> bool {
    is_admin(group, actor) || participant.is_linked_to(actor)
}

#[derive(Default)]
struct CascadeReport {
    deleted: usize,
    failed: Vec<String>,
}

impl CascadeReport {
    fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn into_result(self) -> Result<usize, SantaError> {
        if self.is_complete() {
            Ok(self.deleted)
        } else {
            Err(SantaError::PartialCascade {
                deleted: self.deleted,
                failed: self.failed,
            })
        }
    }
}

pub struct SantaService<L: LoggingService, S: Storage> {
    storage: Arc<S>,
    logging: L,
    settings: ServiceSettings,
}

impl<L: LoggingService, S: Storage> SantaService<L, S> {
    pub fn new(storage: S, logging: L, settings: ServiceSettings) -> Self {
        SantaService {
            storage: Arc::new(storage),
            logging,
            settings,
        }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    fn require_actor<'a>(&self, actor: &'a str) -> Result<&'a str, SantaError> {
        let actor = actor.trim();
        if actor.is_empty() {
            return Err(SantaError::MissingActor);
        }
        Ok(actor)
    }

    async fn load_group(&self, group_id: &str) -> Result<Group, SantaError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| SantaError::GroupNotFound(group_id.to_string()))
    }

    async fn load_participant(&self, group_id: &str, participant_id: &str) -> Result<Participant, SantaError> {
        self.storage
            .get_participant(group_id, participant_id)
            .await?
            .ok_or_else(|| SantaError::ParticipantNotFound(participant_id.to_string()))
    }

    async fn validate_group_and_admin(&self, group_id: &str, actor: &str) -> Result<Group, SantaError> {
        let group = self.load_group(group_id).await?;
        if !group.is_admin(actor) {
            return Err(SantaError::NotGroupAdmin(actor.to_string()));
        }
        Ok(group)
    }

    /// How `actor` reaches the group right now, or `None`.
    pub async fn access_kind(&self, group: &Group, actor: &str) -> Result<Option<AccessKind>, SantaError> {
        if group.is_admin(actor) {
            return Ok(Some(AccessKind::Admin));
        }
        let linked = self
            .storage
            .find_members(&group.id, &Query::new().where_eq("user_id", actor))
            .await?;
        Ok((!linked.is_empty()).then_some(AccessKind::Member))
    }

    async fn validate_group_access(&self, group_id: &str, actor: &str) -> Result<Group, SantaError> {
        let group = self.load_group(group_id).await?;
        match self.access_kind(&group, actor).await? {
            Some(_) => Ok(group),
            None => Err(SantaError::NotGroupMember(actor.to_string())),
        }
    }

    async fn validate_gift_editor(
        &self,
        group_id: &str,
        participant_id: &str,
        actor: &str,
    ) -> Result<(Group, Participant), SantaError> {
        let group = self.load_group(group_id).await?;
        let participant = self.load_participant(group_id, participant_id).await?;
        if !can_edit_participant(&group, &participant, actor) {
            return Err(SantaError::NotGiftOwner(actor.to_string()));
        }
        Ok((group, participant))
    }

    async fn record_activity(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), SantaError> {
        self.logging.log_action(action, details, user_id).await
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), SantaError> {
        if value.trim().is_empty() {
            return Err(SantaError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        if value.chars().count() > max_length {
            return Err(SantaError::invalid_input(
                field,
                format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(char::is_control) {
            return Err(SantaError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_amount_input(&self, field: &str, amount: f64) -> Result<(), SantaError> {
        if !amount.is_finite() {
            return Err(SantaError::invalid_input(
                field,
                "Invalid Amount",
                "Amount must be a finite number",
            ));
        }
        if amount <= 0.0 {
            return Err(SantaError::invalid_input(
                field,
                "Invalid Amount",
                "Amount must be greater than 0",
            ));
        }
        if amount > MAX_PRICE {
            return Err(SantaError::invalid_input(
                field,
                "Amount Too Large",
                "Amount cannot exceed 1,000,000",
            ));
        }
        Ok(())
    }

    fn validate_budget(&self, budget: f64) -> Result<(), SantaError> {
        if !budget.is_finite() || budget < 0.0 {
            return Err(SantaError::invalid_input(
                "max_budget",
                "Invalid Budget",
                "Budget must be a number greater than or equal to 0",
            ));
        }
        if budget > MAX_PRICE {
            return Err(SantaError::invalid_input(
                "max_budget",
                "Budget Too Large",
                "Budget cannot exceed 1,000,000",
            ));
        }
        Ok(())
    }

    fn validate_email(&self, email: &str) -> Result<(), SantaError> {
        let email = email.trim();
        if !email.contains('@') || !email.contains('.') || email.len() < 5 {
            return Err(SantaError::InvalidEmail(email.to_string()));
        }
        Ok(())
    }

    /// Trims an optional link; blank input means "no link".
    fn normalize_link(&self, field: &str, value: Option<String>) -> Result<Option<String>, SantaError> {
        let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        if value.len() > MAX_URL_LENGTH {
            return Err(SantaError::invalid_input(
                field,
                format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, MAX_URL_LENGTH),
            ));
        }
        Ok(Some(value))
    }

    fn normalize_gift(&self, gift: NewGift) -> Result<NewGift, SantaError> {
        self.validate_string_input("title", &gift.title, MAX_NAME_LENGTH)?;
        self.validate_amount_input("price", gift.price)?;
        Ok(NewGift {
            title: gift.title.trim().to_string(),
            price: gift.price,
            url: self.normalize_link("url", gift.url)?,
            image_url: self.normalize_link("image_url", gift.image_url)?,
        })
    }

    async fn allocate_invite_code(&self) -> Result<InviteCode, SantaError> {
        let attempts = self.settings.invite_code_attempts.max(1);
        for attempt in 1..=attempts {
            let code = InviteCode::generate();
            let taken = self
                .storage
                .find_groups(&Query::new().where_eq("invite_code", code.as_str()))
                .await?;
            if taken.is_empty() {
                return Ok(code);
            }
            warn!(attempt, code = %code, "invite code already in use, retrying");
        }
        Err(SantaError::InviteCodeExhausted(attempts))
    }

    pub async fn create_group(
        &self,
        actor: &str,
        name: String,
        max_budget: Option<f64>,
    ) -> Result<Group, SantaError> {
        let actor = self.require_actor(actor)?;
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        let max_budget = max_budget.unwrap_or(self.settings.default_max_budget);
        self.validate_budget(max_budget)?;

        let invite_code = self.allocate_invite_code().await?;
        let group = self
            .storage
            .add_group(NewGroup {
                name: name.trim().to_string(),
                admin_user_id: actor.to_string(),
                max_budget,
                invite_code: invite_code.into_inner(),
            })
            .await?;

        let admin = NewMember {
            user_id: actor.to_string(),
            role: Role::Admin,
            participant_id: None,
        };
        if let Err(err) = self.storage.add_member(&group.id, admin).await {
            error!(group_id = %group.id, error = %err, "admin membership write failed, removing group");
            if let Err(cleanup) = self.storage.delete_group(&group.id).await {
                error!(group_id = %group.id, error = %cleanup, "orphan group left behind");
            }
            return Err(err);
        }

        info!(group_id = %group.id, actor, "group created");
        self.record_activity(
            GROUP_CREATED,
            json!({
                "group_id": group.id,
                "name": group.name,
                "max_budget": group.max_budget,
                "invite_code": group.invite_code
            }),
            Some(actor),
        )
        .await?;
        Ok(group)
    }

    pub async fn rename_group(&self, actor: &str, group_id: &str, name: String) -> Result<Group, SantaError> {
        let actor = self.require_actor(actor)?;
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        let mut group = self.validate_group_and_admin(group_id, actor).await?;
        let previous = std::mem::replace(&mut group.name, name.trim().to_string());
        self.storage.update_group(group.clone()).await?;

        self.record_activity(
            GROUP_RENAMED,
            json!({ "group_id": group.id, "from": previous, "to": group.name }),
            Some(actor),
        )
        .await?;
        Ok(group)
    }

    /// The group, provided `actor` can reach it.
    pub async fn get_group(&self, actor: &str, group_id: &str) -> Result<Group, SantaError> {
        let actor = self.require_actor(actor)?;
        self.validate_group_access(group_id, actor).await
    }

    /// Live view of a single group document.
    pub async fn watch_group(&self, actor: &str, group_id: &str) -> Result<Subscription<Group>, SantaError> {
        let actor = self.require_actor(actor)?;
        self.validate_group_access(group_id, actor).await?;
        self.storage
            .watch_groups(Query::new().where_eq("id", group_id))
            .await
    }

    /// Deletes gifts, then participants, then membership records, then the
    /// group. A failed child keeps its parent in place; whatever was already
    /// removed stays removed.
    pub async fn delete_group(&self, actor: &str, group_id: &str) -> Result<usize, SantaError> {
        let actor = self.require_actor(actor)?;
        let group = self.validate_group_and_admin(group_id, actor).await?;
        let mut report = CascadeReport::default();

        match self.storage.find_participants(group_id, &Query::new()).await {
            Ok(participants) => {
                for participant in &participants {
                    self.delete_participant_tree(group_id, participant, &mut report).await;
                }
            }
            Err(err) => {
                warn!(group_id, error = %err, "could not list participants");
                report.failed.push(format!("groups/{}/participants", group_id));
            }
        }

        match self.storage.find_members(group_id, &Query::new()).await {
            Ok(members) => {
                for member in members {
                    match self.storage.delete_member(group_id, &member.id).await {
                        Ok(()) => report.deleted += 1,
                        Err(err) => {
                            warn!(group_id, member_id = %member.id, error = %err, "member delete failed");
                            report.failed.push(format!("groups/{}/members/{}", group_id, member.id));
                        }
                    }
                }
            }
            Err(err) => {
                warn!(group_id, error = %err, "could not list members");
                report.failed.push(format!("groups/{}/members", group_id));
            }
        }

        if report.is_complete() {
            match self.storage.delete_group(group_id).await {
                Ok(()) => report.deleted += 1,
                Err(err) => {
                    warn!(group_id, error = %err, "group delete failed");
                    report.failed.push(format!("groups/{}", group_id));
                }
            }
        } else {
            report.failed.push(format!("groups/{}", group_id));
        }

        if !report.is_complete() {
            error!(group_id, deleted = report.deleted, failed = report.failed.len(), "group delete incomplete");
            return report.into_result();
        }

        info!(group_id, deleted = report.deleted, "group deleted");
        self.record_activity(
            GROUP_DELETED,
            json!({ "group_id": group_id, "name": group.name, "documents": report.deleted }),
            Some(actor),
        )
        .await?;
        report.into_result()
    }

    /// Removes one participant's gifts, then the participant. The participant
    /// survives if any of its gifts could not be removed.
    async fn delete_participant_tree(&self, group_id: &str, participant: &Participant, report: &mut CascadeReport) {
        let participant_path = format!("groups/{}/participants/{}", group_id, participant.id);
        let gifts = match self.storage.find_gifts(group_id, &participant.id, &Query::new()).await {
            Ok(gifts) => gifts,
            Err(err) => {
                warn!(group_id, participant_id = %participant.id, error = %err, "could not list gifts");
                report.failed.push(format!("{}/gifts", participant_path));
                report.failed.push(participant_path);
                return;
            }
        };

        let mut gifts_cleared = true;
        for gift in gifts {
            match self.storage.delete_gift(group_id, &participant.id, &gift.id).await {
                Ok(()) => report.deleted += 1,
                Err(err) => {
                    warn!(group_id, gift_id = %gift.id, error = %err, "gift delete failed");
                    report.failed.push(format!("{}/gifts/{}", participant_path, gift.id));
                    gifts_cleared = false;
                }
            }
        }

        if !gifts_cleared {
            report.failed.push(participant_path);
            return;
        }
        match self.storage.delete_participant(group_id, &participant.id).await {
            Ok(()) => report.deleted += 1,
            Err(err) => {
                warn!(group_id, participant_id = %participant.id, error = %err, "participant delete failed");
                report.failed.push(participant_path);
            }
        }
    }

    /// Redeems an invite code: writes the caller's participant record, then
    /// the membership record pointing at it.
    pub async fn join_group_by_code(
        &self,
        actor: &str,
        code: &str,
        name: String,
        email: String,
    ) -> Result<JoinedGroup, SantaError> {
        let actor = self.require_actor(actor)?;
        let code = InviteCode::parse(code)?;
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        self.validate_email(&email)?;

        let query = Query::new()
            .where_eq("invite_code", code.as_str())
            .order_by("created_at", Direction::Descending);
        let mut matches = self.storage.find_groups(&query).await?;
        if matches.len() > 1 {
            warn!(code = %code, count = matches.len(), "invite code shared by several groups, using the newest");
        }
        if matches.is_empty() {
            return Err(SantaError::InviteCodeNotFound);
        }
        let group = matches.swap_remove(0);

        self.ensure_not_member(&group.id, actor).await?;
        let participant = self
            .write_linked_participant(
                &group,
                NewParticipant {
                    name: name.trim().to_string(),
                    email: email.trim().to_string(),
                    user_id: Some(actor.to_string()),
                },
            )
            .await?;

        info!(group_id = %group.id, actor, "group joined");
        self.record_activity(
            GROUP_JOINED,
            json!({ "group_id": group.id, "participant_id": participant.id, "name": participant.name }),
            Some(actor),
        )
        .await?;
        Ok(JoinedGroup { group, participant })
    }

    async fn ensure_not_member(&self, group_id: &str, user_id: &str) -> Result<(), SantaError> {
        let existing = self
            .storage
            .find_members(group_id, &Query::new().where_eq("user_id", user_id))
            .await?;
        if !existing.is_empty() {
            return Err(SantaError::AlreadyGroupMember(user_id.to_string()));
        }
        Ok(())
    }

    /// Writes the participant, then the membership record pointing at it
    /// when the participant is linked to an account other than the admin's.
    /// A failed membership write removes the participant again.
    async fn write_linked_participant(&self, group: &Group, draft: NewParticipant) -> Result<Participant, SantaError> {
        let participant = self.storage.add_participant(&group.id, draft).await?;
        let Some(user_id) = participant.user_id.clone().filter(|u| !group.is_admin(u)) else {
            return Ok(participant);
        };

        let member = NewMember {
            user_id,
            role: Role::Member,
            participant_id: Some(participant.id.clone()),
        };
        if let Err(err) = self.storage.add_member(&group.id, member).await {
            warn!(group_id = %group.id, error = %err, "membership write failed, removing participant");
            if let Err(cleanup) = self.storage.delete_participant(&group.id, &participant.id).await {
                error!(
                    group_id = %group.id,
                    participant_id = %participant.id,
                    error = %cleanup,
                    "orphan participant left behind"
                );
            }
            return Err(err);
        }
        Ok(participant)
    }

    /// Adds a participant. A linked `user_id` also gets a membership record,
    /// unless it is the admin, who already holds one.
    pub async fn add_participant(
        &self,
        actor: &str,
        group_id: &str,
        name: String,
        email: String,
        user_id: Option<String>,
    ) -> Result<Participant, SantaError> {
        let actor = self.require_actor(actor)?;
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        self.validate_email(&email)?;
        let group = self.validate_group_and_admin(group_id, actor).await?;
        let user_id = user_id.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        if let Some(linked) = user_id.as_deref().filter(|u| !group.is_admin(u)) {
            self.ensure_not_member(group_id, linked).await?;
        }

        let participant = self
            .write_linked_participant(
                &group,
                NewParticipant {
                    name: name.trim().to_string(),
                    email: email.trim().to_string(),
                    user_id,
                },
            )
            .await?;

        self.record_activity(
            PARTICIPANT_ADDED,
            json!({ "group_id": group_id, "participant_id": participant.id, "name": participant.name }),
            Some(actor),
        )
        .await?;
        Ok(participant)
    }

    fn participant_order() -> Query {
        Query::new().order_by("created_at", Direction::Descending)
    }

    fn gift_order() -> Query {
        Query::new().order_by("title", Direction::Ascending)
    }

    /// Newest participant first.
    pub async fn list_participants(&self, actor: &str, group_id: &str) -> Result<Vec<Participant>, SantaError> {
        let actor = self.require_actor(actor)?;
        self.validate_group_access(group_id, actor).await?;
        self.storage
            .find_participants(group_id, &Self::participant_order())
            .await
    }

    pub async fn watch_participants(
        &self,
        actor: &str,
        group_id: &str,
    ) -> Result<Subscription<Participant>, SantaError> {
        let actor = self.require_actor(actor)?;
        self.validate_group_access(group_id, actor).await?;
        self.storage
            .watch_participants(group_id, Self::participant_order())
            .await
    }

    /// Removes the participant with its gifts and any membership record
    /// pointing at it. Returns how many documents were deleted.
    pub async fn delete_participant(
        &self,
        actor: &str,
        group_id: &str,
        participant_id: &str,
    ) -> Result<usize, SantaError> {
        let actor = self.require_actor(actor)?;
        self.validate_group_and_admin(group_id, actor).await?;
        let participant = self.load_participant(group_id, participant_id).await?;

        let mut report = CascadeReport::default();
        self.delete_participant_tree(group_id, &participant, &mut report).await;
        if report.is_complete() {
            let linked = self
                .storage
                .find_members(group_id, &Query::new().where_eq("participant_id", participant_id))
                .await?;
            for member in linked {
                match self.storage.delete_member(group_id, &member.id).await {
                    Ok(()) => report.deleted += 1,
                    Err(err) => {
                        warn!(group_id, member_id = %member.id, error = %err, "member delete failed");
                        report.failed.push(format!("groups/{}/members/{}", group_id, member.id));
                    }
                }
            }
        }
        if !report.is_complete() {
            return report.into_result();
        }

        self.record_activity(
            PARTICIPANT_DELETED,
            json!({ "group_id": group_id, "participant_id": participant_id, "name": participant.name }),
            Some(actor),
        )
        .await?;
        report.into_result()
    }

    pub async fn add_gift(
        &self,
        actor: &str,
        group_id: &str,
        participant_id: &str,
        gift: NewGift,
    ) -> Result<Gift, SantaError> {
        let actor = self.require_actor(actor)?;
        let gift = self.normalize_gift(gift)?;
        self.validate_gift_editor(group_id, participant_id, actor).await?;

        let gift = self.storage.add_gift(group_id, participant_id, gift).await?;
        self.record_activity(
            GIFT_ADDED,
            json!({
                "group_id": group_id,
                "participant_id": participant_id,
                "gift_id": gift.id,
                "title": gift.title,
                "price": gift.price
            }),
            Some(actor),
        )
        .await?;
        Ok(gift)
    }

    pub async fn update_gift(
        &self,
        actor: &str,
        group_id: &str,
        participant_id: &str,
        gift_id: &str,
        patch: GiftPatch,
    ) -> Result<Gift, SantaError> {
        let actor = self.require_actor(actor)?;
        if let Some(title) = &patch.title {
            self.validate_string_input("title", title, MAX_NAME_LENGTH)?;
        }
        if let Some(price) = patch.price {
            self.validate_amount_input("price", price)?;
        }
        self.validate_gift_editor(group_id, participant_id, actor).await?;

        let mut gift = self
            .storage
            .get_gift(group_id, participant_id, gift_id)
            .await?
            .ok_or_else(|| SantaError::GiftNotFound(gift_id.to_string()))?;
        if let Some(title) = patch.title {
            gift.title = title.trim().to_string();
        }
        if let Some(price) = patch.price {
            gift.price = price;
        }
        if patch.url.is_some() {
            gift.url = self.normalize_link("url", patch.url)?;
        }
        if patch.image_url.is_some() {
            gift.image_url = self.normalize_link("image_url", patch.image_url)?;
        }
        self.storage.update_gift(gift.clone()).await?;

        self.record_activity(
            GIFT_UPDATED,
            json!({ "group_id": group_id, "participant_id": participant_id, "gift_id": gift.id }),
            Some(actor),
        )
        .await?;
        Ok(gift)
    }

    pub async fn delete_gift(
        &self,
        actor: &str,
        group_id: &str,
        participant_id: &str,
        gift_id: &str,
    ) -> Result<(), SantaError> {
        let actor = self.require_actor(actor)?;
        self.validate_gift_editor(group_id, participant_id, actor).await?;
        let gift = self
            .storage
            .get_gift(group_id, participant_id, gift_id)
            .await?
            .ok_or_else(|| SantaError::GiftNotFound(gift_id.to_string()))?;
        self.storage.delete_gift(group_id, participant_id, gift_id).await?;

        self.record_activity(
            GIFT_DELETED,
            json!({ "group_id": group_id, "participant_id": participant_id, "gift_id": gift_id, "title": gift.title }),
            Some(actor),
        )
        .await?;
        Ok(())
    }

    /// Alphabetical by title.
    pub async fn list_gifts(&self, actor: &str, group_id: &str, participant_id: &str) -> Result<Vec<Gift>, SantaError> {
        let actor = self.require_actor(actor)?;
        self.validate_group_access(group_id, actor).await?;
        self.load_participant(group_id, participant_id).await?;
        self.storage
            .find_gifts(group_id, participant_id, &Self::gift_order())
            .await
    }

    pub async fn watch_gifts(
        &self,
        actor: &str,
        group_id: &str,
        participant_id: &str,
    ) -> Result<Subscription<Gift>, SantaError> {
        let actor = self.require_actor(actor)?;
        self.validate_group_access(group_id, actor).await?;
        self.load_participant(group_id, participant_id).await?;
        self.storage
            .watch_gifts(group_id, participant_id, Self::gift_order())
            .await
    }

    pub async fn participant_summary(
        &self,
        actor: &str,
        group_id: &str,
        participant_id: &str,
    ) -> Result<ParticipantSummary, SantaError> {
        let actor = self.require_actor(actor)?;
        let group = self.validate_group_access(group_id, actor).await?;
        self.load_participant(group_id, participant_id).await?;
        let gifts = self
            .storage
            .find_gifts(group_id, participant_id, &Query::new())
            .await?;
        let total = calculate_total(&gifts);
        Ok(ParticipantSummary {
            participant_id: participant_id.to_string(),
            gift_count: gifts.len(),
            total,
            max_budget: group.max_budget,
            remaining: group.max_budget - total,
            over_budget: total > group.max_budget,
        })
    }

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, SantaError> {
        self.logging.get_logs().await
    }
}

impl<L: LoggingService, S: Storage + 'static> SantaService<L, S> {
    /// Starts a live feed of every group `actor` can reach.
    pub fn group_feed(&self, actor: &str) -> Result<GroupFeed, SantaError> {
        let actor = self.require_actor(actor)?;
        GroupFeed::spawn(Arc::clone(&self.storage), actor)
    }
}

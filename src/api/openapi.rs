use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::{
    api::models::{
        AddParticipantRequest, CreateGroupRequest, DeleteResponse, ErrorResponse, FeedErrorResponse,
        GroupFeedResponse, GroupView, JoinGroupRequest, LanguageResponse, RenameGroupRequest, SessionResponse,
        SetLanguageRequest,
    },
    core::{
        models::{AccessKind, AppLog, Gift, GiftPatch, Group, NewGift, Participant, ParticipantSummary, Role},
        services::JoinedGroup,
        session::Language,
    },
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::get_session,
        super::handlers::set_language,
        super::handlers::list_groups,
        super::handlers::live_groups,
        super::handlers::create_group,
        super::handlers::get_group,
        super::handlers::rename_group,
        super::handlers::delete_group,
        super::handlers::join_group,
        super::handlers::add_participant,
        super::handlers::list_participants,
        super::handlers::delete_participant,
        super::handlers::participant_summary,
        super::handlers::list_gifts,
        super::handlers::add_gift,
        super::handlers::update_gift,
        super::handlers::delete_gift,
        super::handlers::get_app_logs
    ),
    components(schemas(
        CreateGroupRequest,
        RenameGroupRequest,
        JoinGroupRequest,
        AddParticipantRequest,
        SetLanguageRequest,
        SessionResponse,
        LanguageResponse,
        DeleteResponse,
        GroupView,
        GroupFeedResponse,
        FeedErrorResponse,
        ErrorResponse,
        Group,
        Participant,
        Gift,
        NewGift,
        GiftPatch,
        ParticipantSummary,
        JoinedGroup,
        AccessKind,
        Role,
        Language,
        AppLog
    )),
    modifiers(&BearerAuth),
    info(
        title = "Secret Santa API",
        description = "Groups, invite codes and wish lists with a live view of every group a user belongs to",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

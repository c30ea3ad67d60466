use crate::auth::jwt::JwtService;
use crate::core::errors::SantaError;
use crate::core::invite::{INVITE_CODE_LEN, InviteCode};
use crate::core::models::{Group, Participant};
use crate::core::services::{can_edit_participant, is_admin};
use crate::core::session::{Language, Session};
use chrono::Utc;

#[test]
fn test_language_parse() {
    assert_eq!(Language::parse("es"), Some(Language::Es));
    assert_eq!(Language::parse(" EN "), Some(Language::En));
    assert_eq!(Language::parse("fr"), None);
    assert_eq!(Language::from_locale("en-US"), Some(Language::En));
    assert_eq!(Language::from_locale("es_ES.UTF-8"), Some(Language::Es));
    assert_eq!(Language::from_locale("en,es;q=0.8"), Some(Language::En));
    assert_eq!(Language::from_locale("de-DE"), None);
    assert_eq!(Language::default(), Language::Es);
}

#[test]
fn test_session_language_precedence() {
    let actor = Some("alice-uid".to_string());

    let session = Session::initialize(actor.clone(), Some("en"), Some("es-ES"), Language::Es);
    assert_eq!(session.language(), Language::En);

    let session = Session::initialize(actor.clone(), Some("klingon"), Some("en-GB"), Language::Es);
    assert_eq!(session.language(), Language::En);

    let session = Session::initialize(actor.clone(), None, Some("de-DE"), Language::Es);
    assert_eq!(session.language(), Language::Es);

    let session = Session::initialize(actor, None, None, Language::En);
    assert_eq!(session.language(), Language::En);
}

#[test]
fn test_set_language_returns_persisted_value() {
    let mut session = Session::initialize(Some("alice-uid".to_string()), None, None, Language::Es);
    assert_eq!(session.set_language(Language::En), "en");
    assert_eq!(session.language(), Language::En);
    assert_eq!(session.actor().unwrap(), "alice-uid");
}

#[test]
fn test_session_without_actor() {
    let session = Session::initialize(None, None, None, Language::Es);
    assert!(matches!(session.actor(), Err(SantaError::MissingActor)));

    let session = Session::initialize(Some("   ".to_string()), None, None, Language::Es);
    assert!(matches!(session.actor(), Err(SantaError::MissingActor)));
}

#[test]
fn test_invite_code_parse() {
    let code = InviteCode::parse("  ab12cd ").unwrap();
    assert_eq!(code.as_str(), "AB12CD");
    assert_eq!("XY9Z00".parse::<InviteCode>().unwrap().to_string(), "XY9Z00");

    for bad in ["", "ABCDE", "ABCDEFG", "AB CD1", "ÄBCDEF"] {
        assert!(matches!(InviteCode::parse(bad), Err(SantaError::InvalidInviteCode)), "{:?}", bad);
    }
}

#[test]
fn test_generated_codes_are_well_formed() {
    for _ in 0..50 {
        let code = InviteCode::generate();
        assert_eq!(code.as_str().len(), INVITE_CODE_LEN);
        assert!(code.as_str().chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_eq!(InviteCode::parse(code.as_str()).unwrap(), code);
    }
}

#[test]
fn test_edit_permissions() {
    let group = Group {
        id: "g1".to_string(),
        name: "Family".to_string(),
        admin_user_id: "alice-uid".to_string(),
        max_budget: 15.0,
        invite_code: "ABC123".to_string(),
        created_at: Utc::now(),
    };
    let participant = Participant {
        id: "p1".to_string(),
        group_id: "g1".to_string(),
        name: "Bob".to_string(),
        email: "bob@example.com".to_string(),
        user_id: Some("bob-uid".to_string()),
        created_at: Utc::now(),
    };

    assert!(is_admin(&group, "alice-uid"));
    assert!(!is_admin(&group, "bob-uid"));
    assert!(can_edit_participant(&group, &participant, "alice-uid"));
    assert!(can_edit_participant(&group, &participant, "bob-uid"));
    assert!(!can_edit_participant(&group, &participant, "carol-uid"));

    let unlinked = Participant {
        user_id: None,
        ..participant
    };
    assert!(!can_edit_participant(&group, &unlinked, "bob-uid"));
}

#[test]
fn test_token_round_trip_builds_session() {
    let jwt = JwtService::new("test-secret".to_string());
    let token = jwt.generate_token("alice-uid", Some(Language::En)).unwrap();
    let claims = jwt.validate_token(&token).unwrap();
    assert_eq!(claims.sub, "alice-uid");

    let session = claims.session(Some("es-ES"), Language::Es);
    assert_eq!(session.actor().unwrap(), "alice-uid");
    assert_eq!(session.language(), Language::En);

    let other = JwtService::new("other-secret".to_string());
    assert!(matches!(other.validate_token(&token), Err(SantaError::InvalidCredentials)));
    assert!(matches!(jwt.validate_token("garbage"), Err(SantaError::InvalidCredentials)));
}

#[test]
fn test_token_without_subject() {
    let jwt = JwtService::new("test-secret".to_string());
    let token = jwt.generate_token("", None).unwrap();
    assert!(matches!(jwt.validate_token(&token), Err(SantaError::MissingActor)));
}

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use recipe_api::auth::{Claims, IssueError, Role, TOKEN_TTL, TokenError, TokenService};
use serde_json::json;

// --- Helpers ---

const TEST_SECRET: &[u8] = b"test-secret-value-1234567890-test-secret-value";

fn service() -> TokenService {
    TokenService::from_secret(TEST_SECRET)
}

fn segments(token: &str) -> Vec<String> {
    token.split('.').map(str::to_string).collect()
}

/// Signs arbitrary claims with the test secret, bypassing `issue`.
fn sign_raw(claims: serde_json::Value) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .unwrap()
}

// --- Round Trip ---

#[test]
fn test_issue_then_validate_round_trips_both_roles() {
    let tokens = service();

    for (identity, role) in [
        ("alice@example.com", Role::Client),
        ("admin@admin.com", Role::Admin),
        ("x", Role::Client),
    ] {
        let token = tokens.issue(identity, role).unwrap();
        let principal = tokens.validate(&token).unwrap();
        assert_eq!(principal.username, identity);
        assert_eq!(principal.role, role);
    }
}

#[test]
fn test_token_is_three_segment_hs256_jwt_with_role_and_exp() {
    let token = service().issue("bob", Role::Client).unwrap();
    let parts = segments(&token);
    assert_eq!(parts.len(), 3);

    let header: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&parts[0]).unwrap()).unwrap();
    assert_eq!(header["alg"], "HS256");

    let claims: Claims = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&parts[1]).unwrap()).unwrap();
    assert_eq!(claims.sub, "bob");
    assert_eq!(claims.role, Role::Client);
    assert_eq!(claims.exp - claims.iat, TOKEN_TTL.num_seconds());
    assert_eq!(TOKEN_TTL, TimeDelta::hours(24));
}

#[test]
fn test_extract_accessors_return_claims_of_valid_token() {
    let tokens = service();
    let token = tokens.issue("carol", Role::Admin).unwrap();

    assert_eq!(tokens.extract_identity(&token).unwrap(), "carol");
    assert_eq!(tokens.extract_role(&token).unwrap(), Role::Admin);
}

#[test]
fn test_extract_accessors_propagate_validation_failure() {
    let tokens = service();
    assert_eq!(tokens.extract_identity("garbage"), Err(TokenError::Malformed));
    assert_eq!(tokens.extract_role("garbage"), Err(TokenError::Malformed));
}

#[test]
fn test_issue_rejects_empty_identity() {
    let tokens = service();
    assert!(matches!(
        tokens.issue("", Role::Client),
        Err(IssueError::EmptyIdentity)
    ));
    assert!(matches!(
        tokens.issue("   ", Role::Admin),
        Err(IssueError::EmptyIdentity)
    ));
}

// --- Expiry ---

#[test]
fn test_token_past_expiry_is_expired() {
    let tokens = service();
    let issued_at = Utc::now() - TOKEN_TTL - TimeDelta::minutes(5);
    let token = tokens.issue_at("dave", Role::Client, issued_at).unwrap();

    assert_eq!(tokens.validate(&token), Err(TokenError::Expired));
}

#[test]
fn test_token_inside_window_is_still_valid() {
    let tokens = service();
    let issued_at = Utc::now() - TimeDelta::hours(23);
    let token = tokens.issue_at("erin", Role::Client, issued_at).unwrap();

    assert!(tokens.validate(&token).is_ok());
}

// --- Tamper Evidence ---

#[test]
fn test_flipping_any_signature_bit_is_signature_invalid() {
    let tokens = service();
    let token = tokens.issue("frank", Role::Client).unwrap();
    let parts = segments(&token);
    let signature = URL_SAFE_NO_PAD.decode(&parts[2]).unwrap();

    for bit in 0..signature.len() * 8 {
        let mut tampered = signature.clone();
        tampered[bit / 8] ^= 1 << (bit % 8);
        let forged = format!(
            "{}.{}.{}",
            parts[0],
            parts[1],
            URL_SAFE_NO_PAD.encode(&tampered)
        );

        assert_eq!(
            tokens.validate(&forged),
            Err(TokenError::SignatureInvalid),
            "bit {bit} flipped"
        );
    }
}

#[test]
fn test_edited_payload_is_signature_invalid() {
    let tokens = service();
    let token = tokens.issue("grace", Role::Client).unwrap();
    let parts = segments(&token);

    let mut claims: Claims =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&parts[1]).unwrap()).unwrap();
    claims.role = Role::Admin;
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    let forged = format!("{}.{}.{}", parts[0], payload, parts[2]);

    assert_eq!(tokens.validate(&forged), Err(TokenError::SignatureInvalid));
}

#[test]
fn test_token_from_another_process_secret_is_signature_invalid() {
    let token = TokenService::generate().issue("heidi", Role::Admin).unwrap();
    assert_eq!(service().validate(&token), Err(TokenError::SignatureInvalid));
}

#[test]
fn test_generated_secrets_differ_between_instances() {
    let first = TokenService::generate();
    let second = TokenService::generate();
    let token = first.issue("ivan", Role::Client).unwrap();

    assert!(first.validate(&token).is_ok());
    assert_eq!(second.validate(&token), Err(TokenError::SignatureInvalid));
}

#[test]
fn test_expired_and_tampered_reports_signature_first() {
    let tokens = service();
    let token = tokens
        .issue_at("judy", Role::Client, Utc::now() - TimeDelta::days(3))
        .unwrap();
    let parts = segments(&token);
    let mut signature = URL_SAFE_NO_PAD.decode(&parts[2]).unwrap();
    signature[0] ^= 0x01;
    let forged = format!("{}.{}.{}", parts[0], parts[1], URL_SAFE_NO_PAD.encode(&signature));

    assert_eq!(tokens.validate(&forged), Err(TokenError::SignatureInvalid));
}

// --- Malformed Input ---

#[test]
fn test_non_token_strings_are_malformed() {
    let tokens = service();
    for input in [
        "",
        "not-a-token",
        "a.b",
        "a.b.c",
        "a.b.c.d",
        "..",
        "Bearer abc",
        "eyJhbGciOiJIUzI1NiJ9..sig",
    ] {
        assert_eq!(tokens.validate(input), Err(TokenError::Malformed), "{input:?}");
    }
}

#[test]
fn test_unknown_role_claim_is_malformed_even_when_signed() {
    let exp = (Utc::now() + TimeDelta::hours(1)).timestamp();
    let token = sign_raw(json!({ "sub": "mallory", "role": "SUPERUSER", "iat": 0, "exp": exp }));

    assert_eq!(service().validate(&token), Err(TokenError::Malformed));
}

#[test]
fn test_missing_subject_is_malformed() {
    let exp = (Utc::now() + TimeDelta::hours(1)).timestamp();
    let token = sign_raw(json!({ "sub": "", "role": "CLIENT", "iat": 0, "exp": exp }));

    assert_eq!(service().validate(&token), Err(TokenError::Malformed));
}

#[test]
fn test_non_hs256_header_is_malformed() {
    let tokens = service();
    let token = tokens.issue("oscar", Role::Client).unwrap();
    let parts = segments(&token);
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let forged = format!("{}.{}.{}", header, parts[1], parts[2]);

    assert_eq!(tokens.validate(&forged), Err(TokenError::Malformed));
}

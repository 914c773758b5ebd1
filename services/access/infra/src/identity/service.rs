use access_core::domains::identity::dto::auth_dto::{AuthResp, LoginReq, RegisterReq, UserProfile};
use access_core::domains::identity::model::{Role, Session, User};
use access_core::domains::identity::repository::{BuildingRepository, SessionRepository, UserRepository};
use access_core::domains::identity::service::IdentityService;
use access_core::engine_error::EngineError;
use access_core::password::validate_password_strength;
use access_core::phone::normalize_e164;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use shared_jwt::{decode_jwt, encode_jwt, Claims};
use uuid::Uuid;

const LOGIN_LOCKOUT_THRESHOLD: i32 = 5;
const LOGIN_LOCKOUT_DURATION_SECONDS: i64 = 900;

pub struct IdentityServiceImpl<UR, BR, SR>
where
    UR: UserRepository,
    BR: BuildingRepository,
    SR: SessionRepository,
{
    user_repo: UR,
    building_repo: BR,
    session_repo: SR,
    jwt_secret: String,
    password_hash_cost: u32,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    login_lockout_window_seconds: i64,
}

impl<UR, BR, SR> IdentityServiceImpl<UR, BR, SR>
where
    UR: UserRepository,
    BR: BuildingRepository,
    SR: SessionRepository,
{
    pub fn new(
        user_repo: UR,
        building_repo: BR,
        session_repo: SR,
        jwt_secret: String,
        password_hash_cost: u32,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
        login_lockout_window_seconds: i64,
    ) -> Self {
        Self {
            user_repo,
            building_repo,
            session_repo,
            jwt_secret,
            password_hash_cost,
            access_ttl_seconds,
            refresh_ttl_seconds,
            login_lockout_window_seconds,
        }
    }

    fn hash_token(token: &str) -> String {
        format!("{:x}", Sha256::digest(token.as_bytes()))
    }

    fn to_profile(user: &User) -> UserProfile {
        UserProfile {
            user_id: user.user_id,
            email: user.email.clone(),
            phone: user.phone_e164.clone(),
            role: user.role(),
            building_id: user.building_id,
            apartment: user.apartment.clone(),
            verified: user.verified,
            created_at: user.created_at,
        }
    }

    async fn issue_session(&self, user: &User) -> Result<AuthResp, EngineError> {
        let access_claims = Claims::new_access(
            user.user_id,
            user.building_id,
            user.role.clone(),
            self.access_ttl_seconds,
        );
        let refresh_claims = Claims::new_refresh(
            user.user_id,
            user.building_id,
            user.role.clone(),
            self.refresh_ttl_seconds,
        );

        let access_token = encode_jwt(&access_claims, &self.jwt_secret)
            .map_err(|e| EngineError::Internal(e.to_string()))?;
        let refresh_token = encode_jwt(&refresh_claims, &self.jwt_secret)
            .map_err(|e| EngineError::Internal(e.to_string()))?;

        let now = Utc::now();
        let session = Session {
            session_id: Uuid::now_v7(),
            user_id: user.user_id,
            access_token_hash: Self::hash_token(&access_token),
            refresh_token_hash: Self::hash_token(&refresh_token),
            issued_at: now,
            expires_at: now + Duration::seconds(self.access_ttl_seconds),
            refresh_expires_at: now + Duration::seconds(self.refresh_ttl_seconds),
            device_fingerprint: None,
            origin_ip: None,
            revoked: false,
            revoked_at: None,
        };
        self.session_repo.create(&session).await?;

        Ok(AuthResp {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl_seconds,
            user: Self::to_profile(user),
        })
    }
}

#[async_trait]
impl<UR, BR, SR> IdentityService for IdentityServiceImpl<UR, BR, SR>
where
    UR: UserRepository + Send + Sync,
    BR: BuildingRepository + Send + Sync,
    SR: SessionRepository + Send + Sync,
{
    async fn register(&self, req: RegisterReq) -> Result<AuthResp, EngineError> {
        if self.user_repo.find_by_email(&req.email.to_lowercase()).await?.is_some() {
            return Err(EngineError::DuplicateEmail);
        }

        let phone = normalize_e164(&req.phone).map_err(EngineError::Validation)?;
        if self.user_repo.find_by_phone(&phone).await?.is_some() {
            return Err(EngineError::DuplicatePhone);
        }

        validate_password_strength(&req.password).map_err(EngineError::WeakPassword)?;

        match req.role {
            Role::Resident => {
                if req.building_id.is_none() {
                    return Err(EngineError::Validation("residents require a building".to_string()));
                }
                if req.apartment.is_none() {
                    return Err(EngineError::Validation("residents require an apartment".to_string()));
                }
            },
            Role::BuildingAdmin | Role::Security => {
                if req.building_id.is_none() {
                    return Err(EngineError::Validation(format!("{} requires a building", req.role)));
                }
            },
            Role::SuperAdmin => {
                return Err(EngineError::InvalidRole("super_admin cannot self-register".to_string()));
            },
            Role::Visitor => {
                return Err(EngineError::InvalidRole("visitor accounts are not registrable".to_string()));
            },
        }

        if let Some(building_id) = req.building_id {
            let building = self
                .building_repo
                .find_by_id(building_id)
                .await?
                .ok_or_else(|| EngineError::NotFound("building not found".to_string()))?;

            if req.role == Role::Resident {
                let active = self.building_repo.active_resident_count(building_id).await?;
                if active >= building.license_quota as i64 {
                    return Err(EngineError::BuildingLicenseExhausted);
                }
            }
        }

        let password_hash = bcrypt::hash(&req.password, self.password_hash_cost)
            .map_err(|e| EngineError::Internal(e.to_string()))?;

        let now = Utc::now();
        let user = User {
            user_id: Uuid::now_v7(),
            email: req.email.clone(),
            email_lower: req.email.to_lowercase(),
            phone_e164: phone,
            password_hash,
            role: req.role.to_string(),
            building_id: req.building_id,
            apartment: req.apartment,
            active: true,
            verified: false,
            failed_login_attempts: 0,
            first_failed_login_at: None,
            lockout_until: None,
            last_login_at: None,
            last_login_ip: None,
            last_login_agent: None,
            created_at: now,
            updated_at: now,
        };

        let created = self.user_repo.create(&user).await?;
        self.issue_session(&created).await
    }

    async fn login(&self, req: LoginReq, origin_ip: Option<String>) -> Result<AuthResp, EngineError> {
        let email_lower = req.email.to_lowercase();
        let mut user = self
            .user_repo
            .find_by_email(&email_lower)
            .await?
            .ok_or(EngineError::InvalidCredentials)?;

        let now = Utc::now();
        if let Some(lockout_until) = user.lockout_until {
            if lockout_until > now {
                let remaining = (lockout_until - now).num_seconds().max(0) as u64;
                return Err(EngineError::AccountLocked { remaining_seconds: remaining });
            }
        }

        let valid = bcrypt::verify(&req.password, &user.password_hash)
            .map_err(|e| EngineError::Internal(e.to_string()))?;

        if !valid {
            let window_elapsed = user
                .first_failed_login_at
                .is_some_and(|first| (now - first).num_seconds() >= self.login_lockout_window_seconds);
            if window_elapsed {
                user.failed_login_attempts = 0;
                user.first_failed_login_at = None;
            }

            user.failed_login_attempts += 1;
            if user.first_failed_login_at.is_none() {
                user.first_failed_login_at = Some(now);
            }

            if user.failed_login_attempts >= LOGIN_LOCKOUT_THRESHOLD {
                user.lockout_until = Some(now + Duration::seconds(LOGIN_LOCKOUT_DURATION_SECONDS));
                user.failed_login_attempts = 0;
                user.first_failed_login_at = None;
            }
            self.user_repo.update(&user).await?;
            return Err(EngineError::InvalidCredentials);
        }

        user.failed_login_attempts = 0;
        user.first_failed_login_at = None;
        user.lockout_until = None;
        user.last_login_at = Some(now);
        user.last_login_ip = origin_ip;
        user.last_login_agent = req.device_fingerprint;
        let updated = self.user_repo.update(&user).await?;

        self.issue_session(&updated).await
    }

    async fn verify_access_token(&self, access_token: &str) -> Result<UserProfile, EngineError> {
        let claims = decode_jwt(access_token, &self.jwt_secret)
            .map_err(|_| EngineError::AuthenticationFailed("invalid or expired token".to_string()))?;

        if !claims.is_access() {
            return Err(EngineError::AuthenticationFailed("not an access token".to_string()));
        }

        let hash = Self::hash_token(access_token);
        let session = self
            .session_repo
            .find_by_access_hash(&hash)
            .await?
            .ok_or_else(|| EngineError::AuthenticationFailed("session not found".to_string()))?;

        if !session.is_usable(Utc::now()) {
            return Err(EngineError::AuthenticationFailed("session revoked or expired".to_string()));
        }

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| EngineError::AuthenticationFailed("user not found".to_string()))?;

        Ok(Self::to_profile(&user))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthResp, EngineError> {
        let claims = decode_jwt(refresh_token, &self.jwt_secret)
            .map_err(|_| EngineError::AuthenticationFailed("invalid or expired refresh token".to_string()))?;

        if !claims.is_refresh() {
            return Err(EngineError::AuthenticationFailed("not a refresh token".to_string()));
        }

        let hash = Self::hash_token(refresh_token);
        let session = self
            .session_repo
            .find_by_refresh_hash(&hash)
            .await?
            .ok_or_else(|| EngineError::AuthenticationFailed("session not found".to_string()))?;

        if session.revoked || session.refresh_expires_at <= Utc::now() {
            return Err(EngineError::AuthenticationFailed("refresh token no longer valid".to_string()));
        }

        self.session_repo.revoke(session.session_id).await?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| EngineError::AuthenticationFailed("user not found".to_string()))?;

        self.issue_session(&user).await
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), EngineError> {
        let hash = Self::hash_token(refresh_token);
        let session = self
            .session_repo
            .find_by_refresh_hash(&hash)
            .await?
            .ok_or_else(|| EngineError::NotFound("session not found".to_string()))?;
        self.session_repo.revoke(session.session_id).await?;
        Ok(())
    }

    async fn revoke_all(&self, user_id: Uuid) -> Result<(), EngineError> {
        self.session_repo.revoke_all_for_user(user_id).await?;
        Ok(())
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile, EngineError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("user not found".to_string()))?;
        Ok(Self::to_profile(&user))
    }
}

//! Account endpoints and the session-aware operations built on them.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::tags::USER;
use super::{decode, ApiClient, Mutation, Query};
use crate::auth::Credentials;
use crate::cache::Tag;
use crate::error::{ErrorInfo, SokoError};
use crate::http::RequestDescriptor;
use crate::session::SessionEvent;
use crate::types::{
    ChangePasswordRequest, LoginRequest, LoginResponse, ProfileUpdate, RegisterRequest, User,
};
use crate::validation::Validate;

pub struct Login;

impl Mutation for Login {
    const NAME: &'static str = "login";
    type Args = LoginRequest;
    type Output = LoginResponse;

    fn request(args: &LoginRequest) -> Result<RequestDescriptor, SokoError> {
        RequestDescriptor::post("/users/auth/login/")
            .anonymous()
            .json(args)
    }

    fn transform(raw: Value) -> Result<LoginResponse, SokoError> {
        decode(raw)
    }

    fn validate(args: &LoginRequest) -> Result<(), SokoError> {
        args.validate()
    }

    fn invalidates_tags(_: &LoginRequest, _: &LoginResponse) -> Vec<Tag> {
        vec![Tag::kind(USER)]
    }
}

pub struct Register;

impl Mutation for Register {
    const NAME: &'static str = "register";
    type Args = RegisterRequest;
    type Output = Value;

    fn request(args: &RegisterRequest) -> Result<RequestDescriptor, SokoError> {
        RequestDescriptor::post("/users/auth/register/")
            .anonymous()
            .json(args)
    }

    fn transform(raw: Value) -> Result<Value, SokoError> {
        Ok(raw)
    }

    fn validate(args: &RegisterRequest) -> Result<(), SokoError> {
        args.validate()
    }
}

pub struct CurrentUser;

impl Query for CurrentUser {
    const NAME: &'static str = "current_user";
    type Args = ();
    type Output = User;

    fn request(_: &()) -> Result<RequestDescriptor, SokoError> {
        Ok(RequestDescriptor::get("/users/auth/user/"))
    }

    fn transform(raw: Value) -> Result<User, SokoError> {
        decode(raw)
    }

    fn provides_tags(_: &(), _: &User) -> Vec<Tag> {
        vec![Tag::kind(USER)]
    }
}

pub struct Logout;

impl Mutation for Logout {
    const NAME: &'static str = "logout";
    type Args = ();
    type Output = Value;

    fn request(_: &()) -> Result<RequestDescriptor, SokoError> {
        Ok(RequestDescriptor::post("/users/auth/logout/"))
    }

    fn transform(raw: Value) -> Result<Value, SokoError> {
        Ok(raw)
    }

    fn invalidates_tags(_: &(), _: &Value) -> Vec<Tag> {
        vec![Tag::kind(USER)]
    }
}

pub struct UpdateProfile;

impl Mutation for UpdateProfile {
    const NAME: &'static str = "update_profile";
    type Args = ProfileUpdate;
    type Output = User;

    fn request(args: &ProfileUpdate) -> Result<RequestDescriptor, SokoError> {
        RequestDescriptor::patch("/users/auth/profile/").json(args)
    }

    fn transform(raw: Value) -> Result<User, SokoError> {
        decode(raw)
    }

    fn invalidates_tags(_: &ProfileUpdate, _: &User) -> Vec<Tag> {
        vec![Tag::kind(USER)]
    }
}

pub struct ChangePassword;

impl Mutation for ChangePassword {
    const NAME: &'static str = "change_password";
    type Args = ChangePasswordRequest;
    type Output = Value;

    fn request(args: &ChangePasswordRequest) -> Result<RequestDescriptor, SokoError> {
        RequestDescriptor::post("/users/auth/password/change/").json(args)
    }

    fn transform(raw: Value) -> Result<Value, SokoError> {
        Ok(raw)
    }

    fn validate(args: &ChangePasswordRequest) -> Result<(), SokoError> {
        args.validate()
    }
}

impl ApiClient {
    /// Exchange credentials for a token pair and persist it.
    ///
    /// When the login response does not embed the user, the profile is
    /// fetched right after.
    pub async fn login(&self, request: &LoginRequest) -> Result<User, SokoError> {
        self.session().dispatch(SessionEvent::LoginStarted);

        let response = match self.mutate::<Login>(request).await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "Login rejected");
                self.session().dispatch(SessionEvent::LoginFailed {
                    error: ErrorInfo::from(&err),
                });
                return Err(err);
            }
        };

        let credentials = Credentials::new(response.access, response.refresh);
        if let Err(err) = self.credentials().store(credentials) {
            let err = SokoError::from(err);
            self.session().dispatch(SessionEvent::LoginFailed {
                error: ErrorInfo::from(&err),
            });
            return Err(err);
        }
        info!("Logged in");

        self.session().dispatch(SessionEvent::LoginSucceeded {
            user: response.user.clone(),
        });
        match response.user {
            Some(user) => Ok(user),
            None => self.current_user().await,
        }
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Value, SokoError> {
        self.mutate::<Register>(request).await
    }

    /// Fetch the profile behind the stored token.
    ///
    /// A server rejection clears the stored tokens and the session. A
    /// transport failure leaves both in place.
    pub async fn current_user(&self) -> Result<User, SokoError> {
        self.session().dispatch(SessionEvent::CurrentUserStarted);
        match self.refetch::<CurrentUser>(&()).await {
            Ok(user) => {
                self.session()
                    .dispatch(SessionEvent::CurrentUserLoaded { user: user.clone() });
                Ok(user)
            }
            Err(err) if err.status().is_some() => {
                warn!(status = ?err.status(), "Stored session rejected; clearing credentials");
                if let Err(purge_err) = self.credentials().purge() {
                    warn!(error = %purge_err, "Failed to remove stored credentials");
                }
                self.session().dispatch(SessionEvent::CurrentUserFailed {
                    error: ErrorInfo::from(&err),
                });
                Err(err)
            }
            Err(err) => {
                self.session().dispatch(SessionEvent::CurrentUserUnreachable {
                    error: ErrorInfo::from(&err),
                });
                Err(err)
            }
        }
    }

    /// Confirm persisted credentials at startup.
    ///
    /// Returns `None` when there is no stored token or the server rejects it.
    pub async fn restore_session(&self) -> Result<Option<User>, SokoError> {
        if !self.credentials().has_access_token() {
            return Ok(None);
        }
        match self.current_user().await {
            Ok(user) => Ok(Some(user)),
            Err(err) if err.status().is_some() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// End the session locally, telling the server when a token exists.
    ///
    /// The server's answer is ignored, so calling this twice is harmless.
    pub async fn logout(&self) -> Result<(), SokoError> {
        if self.credentials().has_access_token() {
            if let Err(err) = self.mutate::<Logout>(&()).await {
                debug!(error = %err, "Server logout failed; clearing local session anyway");
            }
        }

        let purged = self.credentials().purge();
        self.session().dispatch(SessionEvent::LoggedOut);
        self.cache().clear();
        info!("Logged out");
        Ok(purged?)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, SokoError> {
        let user = self.mutate::<UpdateProfile>(update).await?;
        self.session()
            .dispatch(SessionEvent::CurrentUserLoaded { user: user.clone() });
        Ok(user)
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<(), SokoError> {
        self.mutate::<ChangePassword>(request).await?;
        Ok(())
    }
}

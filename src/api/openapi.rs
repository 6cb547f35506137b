use super::handlers::{health, session, ErrorBody};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "realty-edge",
        description = "Session endpoints served in front of the real-estate dashboard"
    ),
    paths(
        health::health,
        session::register,
        session::login,
        session::verify_otp,
        session::resend_otp,
        session::logout,
        session::state,
    ),
    components(schemas(
        health::Health,
        ErrorBody,
        session::RegisterBody,
        session::LoginBody,
        session::VerifyOtpBody,
        session::EmailBody,
        session::UserView,
        session::RegisterView,
        session::VerifyOtpView,
        session::MessageView,
        session::SessionStateView,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "session", description = "Login, signup, OTP and logout")
    )
)]
pub struct ApiDoc;

//! Test helpers for inbound HTTP components.

use actix_session::{Session, SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::{App, HttpResponse, test, web};

use super::session::USER_ID_KEY;

/// Fixed key so cookies minted by [`session_cookie_for`] verify in any app
/// built with [`test_session_middleware`].
const TEST_KEY: [u8; 64] = [7; 64];

/// Build a session middleware configured for tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::from(&TEST_KEY))
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Mint a session cookie holding `raw_user_id`, as the auth service would.
pub async fn session_cookie_for(raw_user_id: &str) -> Cookie<'static> {
    let raw = raw_user_id.to_owned();
    let app = test::init_service(App::new().wrap(test_session_middleware()).route(
        "/login",
        web::get().to(move |session: Session| {
            let raw = raw.clone();
            async move {
                session
                    .insert(USER_ID_KEY, raw)
                    .expect("session insert succeeds");
                HttpResponse::Ok().finish()
            }
        }),
    ))
    .await;
    let res = test::call_service(&app, test::TestRequest::get().uri("/login").to_request()).await;
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

//! HTTP endpoint handlers. These are thin wrappers that forward to auth and core logic.
//! Each handler is instrumented; logs carry lengths and ids, never passwords or code.

use std::sync::Arc;

use axum::{
  extract::State,
  http::StatusCode,
  response::{Html, IntoResponse, Redirect, Response},
  Form, Json,
};
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::auth::{self, AuthError, CurrentUser};
use crate::error::AppError;
use crate::logic::{self, QuestionOutcome};
use crate::protocol::*;
use crate::state::AppState;
use crate::store;
use crate::views::{self, Dashboard};

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

pub async fn home() -> Html<String> { Html(views::home_page()) }

pub async fn login_form() -> Html<String> { Html(views::login_page(None)) }

pub async fn signup_form() -> Html<String> { Html(views::signup_page(None)) }

pub async fn not_found() -> impl IntoResponse {
  (StatusCode::NOT_FOUND, Html(views::not_found_page()))
}

#[instrument(level = "info", skip(state, session, form))]
pub async fn login_submit(
  State(state): State<Arc<AppState>>,
  session: Session,
  Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
  match auth::login(&state.db, &session, &form).await {
    Ok(_) => Ok(Redirect::to("/logged_in").into_response()),
    Err(AuthError::Internal(e)) => Err(e),
    Err(e) => {
      info!(target: "auth", reason = %e, "Login rejected");
      Ok(Html(views::login_page(Some(&e.to_string()))).into_response())
    }
  }
}

#[instrument(level = "info", skip(state, session, form))]
pub async fn signup_submit(
  State(state): State<Arc<AppState>>,
  session: Session,
  Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
  match auth::signup(&state.db, &session, &form).await {
    Ok(_) => Ok(Redirect::to("/logged_in").into_response()),
    Err(AuthError::Internal(e)) => Err(e),
    Err(e) => {
      info!(target: "auth", reason = %e, "Signup rejected");
      Ok(Html(views::signup_page(Some(&e.to_string()))).into_response())
    }
  }
}

#[instrument(level = "info", skip(session))]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
  auth::logout(&session).await?;
  Ok(Redirect::to("/"))
}

#[instrument(level = "info", skip(state, user), fields(user_id = user.user_id))]
pub async fn logged_in(
  State(state): State<Arc<AppState>>,
  CurrentUser(user): CurrentUser,
) -> Result<Html<String>, AppError> {
  let catalog = store::catalog(&state.db).await?;
  Ok(Html(views::dashboard_page(&Dashboard { email: &user.email, catalog, ..Default::default() })))
}

#[instrument(level = "info", skip(state, user, form), fields(user_id = user.user_id))]
pub async fn generate_question(
  State(state): State<Arc<AppState>>,
  CurrentUser(user): CurrentUser,
  Form(form): Form<QuestionForm>,
) -> Result<Html<String>, AppError> {
  let filter = form.to_filter();
  let mut view = Dashboard {
    email: &user.email,
    catalog: store::catalog(&state.db).await?,
    filter: filter.clone(),
    ..Default::default()
  };

  if filter.company.is_empty() || filter.topic.is_empty() || filter.difficulty.is_empty() {
    view.error = Some("Choose a company, a topic and a difficulty.".into());
  } else {
    match logic::generate_question(&state, &filter).await? {
      QuestionOutcome::Text(text) => view.question_text = Some(text),
      QuestionOutcome::NoMatch(f) => {
        view.error = Some(format!(
          "No question matches company \"{}\", topic \"{}\" and difficulty \"{}\".",
          f.company, f.topic, f.difficulty
        ))
      }
    }
  }
  Ok(Html(views::dashboard_page(&view)))
}

#[instrument(level = "info", skip(state, user, form), fields(user_id = user.user_id, code_len = form.code.len()))]
pub async fn generate_solution(
  State(state): State<Arc<AppState>>,
  CurrentUser(user): CurrentUser,
  Form(form): Form<SolutionForm>,
) -> Result<Html<String>, AppError> {
  let mut view = Dashboard {
    email: &user.email,
    catalog: store::catalog(&state.db).await?,
    question_text: Some(form.question.clone()).filter(|q| !q.trim().is_empty()),
    submitted_code: Some(form.code.clone()),
    ..Default::default()
  };

  if form.question.trim().is_empty() {
    view.error = Some("Generate a question before checking a solution.".into());
  } else if form.code.trim().is_empty() {
    view.error = Some("Paste your solution before checking it.".into());
  } else {
    view.verdict = Some(logic::judge_solution(&state, &form.question, &form.code).await);
  }
  Ok(Html(views::dashboard_page(&view)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Settings;
  use crate::db::memory_pool;
  use crate::gateway::fake::FixedGenerator;
  use crate::gateway::{GenerationError, TextGenerator, CORRECT_MARKER};
  use crate::routes::{build_router, session_layer};
  use crate::store::{insert_questions, sample_question};
  use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    Router,
  };
  use sqlx::SqlitePool;
  use tower::ServiceExt;

  async fn app_with(pool: SqlitePool, generator: Option<Arc<dyn TextGenerator>>) -> Router {
    // Fixed secret so routers built over the same pool accept each other's cookies.
    let settings = Settings::from_lookup(|k| (k == "SECRET_KEY").then(|| "router test secret".to_string())).unwrap();
    let sessions = session_layer(&settings, &pool).await.unwrap();
    build_router(Arc::new(AppState::for_tests(pool, generator)), sessions)
  }

  fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
      req = req.header(header::COOKIE, c);
    }
    req.body(Body::empty()).unwrap()
  }

  fn post(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut req = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(c) = cookie {
      req = req.header(header::COOKIE, c);
    }
    req.body(Body::from(form.to_string())).unwrap()
  }

  fn session_cookie(res: &Response) -> String {
    let raw = res.headers().get(header::SET_COOKIE).expect("set-cookie").to_str().unwrap();
    raw.split(';').next().unwrap().to_string()
  }

  async fn body_text(res: Response) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  fn location(res: &Response) -> &str {
    res.headers().get(header::LOCATION).unwrap().to_str().unwrap()
  }

  async fn signed_up(app: &Router) -> String {
    let res = app
      .clone()
      .oneshot(post("/signup", "first_name=Ada&last_name=Lovelace&email=ada%40example.com&password=engine", None))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/logged_in");
    session_cookie(&res)
  }

  #[tokio::test]
  async fn protected_routes_redirect_without_a_session() {
    let app = app_with(memory_pool().await, None).await;
    for uri in ["/logged_in", "/generate_question", "/generate_solution"] {
      let res = app.clone().oneshot(get(uri, None)).await.unwrap();
      assert_eq!(res.status(), StatusCode::SEE_OTHER, "{uri}");
      assert_eq!(location(&res), "/login");
    }
  }

  #[tokio::test]
  async fn every_response_carries_no_cache_headers() {
    let app = app_with(memory_pool().await, None).await;
    for req in [get("/", None), get("/logged_in", None), get("/nope", None), get("/health", None)] {
      let res = app.clone().oneshot(req).await.unwrap();
      let h = res.headers();
      assert_eq!(h[header::CACHE_CONTROL], "no-store, no-cache, must-revalidate, max-age=0");
      assert_eq!(h[header::PRAGMA], "no-cache");
      assert_eq!(h[header::EXPIRES], "0");
    }
  }

  #[tokio::test]
  async fn signup_session_opens_the_dashboard_and_logout_closes_it() {
    let app = app_with(memory_pool().await, None).await;
    let cookie = signed_up(&app).await;

    let res = app.clone().oneshot(get("/logged_in", Some(&cookie))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("ada@example.com"));

    let res = app.clone().oneshot(get("/logout", Some(&cookie))).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");

    // The old cookie no longer maps to a session.
    let res = app.clone().oneshot(get("/logged_in", Some(&cookie))).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");

    // Logging out again is harmless.
    let res = app.clone().oneshot(get("/logout", Some(&cookie))).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
  }

  #[tokio::test]
  async fn login_errors_render_on_the_form() {
    let app = app_with(memory_pool().await, None).await;
    signed_up(&app).await;

    let res = app.clone().oneshot(post("/login", "email=ada%40example.com&password=wrong", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let page = body_text(res).await;
    assert!(page.contains("Incorrect email or password."));
    assert!(!page.contains("argon2"));

    let res = app.clone().oneshot(post("/login", "email=ghost%40example.com&password=x", None)).await.unwrap();
    assert!(body_text(res).await.contains("No account exists for this email."));

    let res = app.clone().oneshot(post("/login", "email=ada%40example.com&password=engine", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&res);
    let res = app.clone().oneshot(get("/logged_in", Some(&cookie))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn duplicate_signup_renders_an_error() {
    let app = app_with(memory_pool().await, None).await;
    signed_up(&app).await;
    let res = app
      .clone()
      .oneshot(post("/signup", "first_name=A&last_name=B&email=ada%40example.com&password=other", None))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("An account with this email already exists."));
  }

  #[tokio::test]
  async fn generated_question_is_passed_through_unmodified() {
    let pool = memory_pool().await;
    insert_questions(&pool, &[sample_question("Google", "Easy", "Arrays", "Find the max subarray sum.")])
      .await
      .unwrap();
    let gen = Arc::new(FixedGenerator::replying("Given nums, return the largest sum."));
    let app = app_with(pool, Some(gen.clone())).await;
    let cookie = signed_up(&app).await;

    let res = app
      .clone()
      .oneshot(post("/generate_question", "company=Google&topic=Arrays&difficulty=Easy", Some(&cookie)))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains(r#"<pre id="question-text">Given nums, return the largest sum.</pre>"#));
    assert!(gen.last_prompt().unwrap().contains("Find the max subarray sum."));
  }

  #[tokio::test]
  async fn unmatched_filter_renders_a_visible_error() {
    let app = app_with(memory_pool().await, Some(Arc::new(FixedGenerator::replying("unused")))).await;
    let cookie = signed_up(&app).await;

    let res = app
      .clone()
      .oneshot(post("/generate_question", "company=Nowhere&topic=Arrays&difficulty=Easy", Some(&cookie)))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let page = body_text(res).await;
    assert!(page.contains("No question matches company"));
    assert!(!page.contains("question-text"));
  }

  #[tokio::test]
  async fn solution_verdicts_are_rendered() {
    let pool = memory_pool().await;
    let app = app_with(pool.clone(), Some(Arc::new(FixedGenerator::replying(CORRECT_MARKER)))).await;
    let cookie = signed_up(&app).await;
    let res = app
      .clone()
      .oneshot(post("/generate_solution", "question=Sum+a+list&code=def+f%28xs%29%3A+return+sum%28xs%29", Some(&cookie)))
      .await
      .unwrap();
    let page = body_text(res).await;
    assert!(page.contains(r#"class="verdict correct""#));
    assert!(page.contains(CORRECT_MARKER));

    let feedback = "Misses the empty list. def f(xs): return sum(xs or [])";
    let app = app_with(pool, Some(Arc::new(FixedGenerator::replying(feedback)))).await;
    let res = app
      .clone()
      .oneshot(post("/generate_solution", "question=Sum+a+list&code=def+f%28xs%29%3A+return+xs%5B0%5D", Some(&cookie)))
      .await
      .unwrap();
    let page = body_text(res).await;
    assert!(page.contains(r#"class="verdict feedback""#));
    assert!(page.contains(feedback));
  }

  #[tokio::test]
  async fn solution_without_a_question_is_not_judged() {
    let gen = Arc::new(FixedGenerator::replying(CORRECT_MARKER));
    let app = app_with(memory_pool().await, Some(gen.clone())).await;
    let cookie = signed_up(&app).await;

    for form in ["question=++&code=print%281%29", "code=print%281%29"] {
      let res = app.clone().oneshot(post("/generate_solution", form, Some(&cookie))).await.unwrap();
      assert_eq!(res.status(), StatusCode::OK);
      let page = body_text(res).await;
      assert!(page.contains("Generate a question before checking a solution."));
      assert!(!page.contains("class=\"verdict"));
    }
    assert!(gen.last_prompt().is_none());
  }

  #[tokio::test]
  async fn generation_failure_degrades_to_a_message() {
    let err = GenerationError::Network("timed out".into());
    let app = app_with(memory_pool().await, Some(Arc::new(FixedGenerator::failing(err.clone())))).await;
    let cookie = signed_up(&app).await;

    let res = app
      .clone()
      .oneshot(post("/generate_solution", "question=q&code=x", Some(&cookie)))
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains(&err.user_message()));
  }
}

use std::convert::Infallible;
use std::sync::Arc;

use chrono::{Datelike, Local};
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::calendar::{self, CalendarView};
use crate::coach::{self, CoachRequest};
use crate::db::{Database, Profile, User};
use crate::error::ApiError;
use crate::ingest::Ingestor;
use crate::llm::Advisor;
use crate::plan::{build_plan, PlanRequest, PlannedVideo};
use crate::reply::{handle_rejection, PlanDownload};
use crate::session::{Session, SessionStore};
use crate::video::all_categories;

mod types;

use types::{
    CalendarPage, CalendarQueryParams, ImportRequest, LoginReply, LoginRequest, MonthRef,
    ProfileReply, RegisterRequest, VideoList, VideoQueryParams, PAGES,
};

pub const SESSION_HEADER: &str = "x-session-token";

/// Everything a handler needs, cloned into each route.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionStore,
    pub ingestor: Ingestor,
    pub advisor: Arc<dyn Advisor>,
}

fn reject(err: impl Into<ApiError>) -> Rejection {
    warp::reject::custom(err.into())
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn with_session(state: AppState) -> impl Filter<Extract = (Session,), Error = Rejection> + Clone {
    warp::header::optional::<String>(SESSION_HEADER).and_then(move |token: Option<String>| {
        let sessions = state.sessions.clone();
        async move {
            let token = token.ok_or_else(|| reject(ApiError::NoSession))?;
            sessions.get(&token).map_err(reject)
        }
    })
}

pub fn make_server(state: AppState) -> BoxedFilter<(impl Reply,)> {
    let index = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::json(&PAGES));

    let register = warp::path!("register")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(register);

    let login = warp::path!("login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(login);

    let logout = warp::path!("logout")
        .and(warp::post())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(logout);

    let me = warp::path!("me")
        .and(warp::get())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(my_page);

    let save_me = warp::path!("me")
        .and(warp::put())
        .and(with_session(state.clone()))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(save_my_page);

    let videos = warp::path!("videos")
        .and(warp::get())
        .and(with_session(state.clone()))
        .and(warp::query::<VideoQueryParams>())
        .and(with_state(state.clone()))
        .and_then(list_videos);

    let import = warp::path!("videos" / "import")
        .and(warp::post())
        .and(with_session(state.clone()))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(import_playlist);

    let plans = warp::path!("plans")
        .and(warp::post())
        .and(with_session(state.clone()))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(generate_plan);

    let coach_options = warp::path!("coach" / "options")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(coach_options);

    let coach_plan = warp::path!("coach" / "plan")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(coach_plan);

    let coach_download = warp::path!("coach" / "plan.txt")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(coach_download);

    let calendar = warp::path!("calendar")
        .and(warp::get())
        .and(warp::query::<CalendarQueryParams>())
        .and_then(calendar_page);

    index
        .or(register)
        .or(login)
        .or(logout)
        .or(me)
        .or(save_me)
        .or(videos)
        .or(import)
        .or(plans)
        .or(coach_options)
        .or(coach_plan)
        .or(coach_download)
        .or(calendar)
        .recover(handle_rejection)
        .with(warp::log("homefit::http"))
        .boxed()
}

async fn register(request: RegisterRequest, state: AppState) -> Result<impl Reply, Rejection> {
    if request.user_id.trim().is_empty()
        || request.name.trim().is_empty()
        || request.password.is_empty()
    {
        return Err(reject(ApiError::BadRequest(
            "user id, name and password are required".to_string(),
        )));
    }

    let user = User {
        user_id: request.user_id.trim().to_string(),
        password: request.password,
        profile: Profile {
            name: request.name,
            gender: request.gender,
            age: None,
            height: None,
            weight: None,
        },
    };
    state.db.put_user(&user).map_err(reject)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ProfileReply {
            user_id: user.user_id,
            profile: user.profile,
        }),
        StatusCode::CREATED,
    ))
}

async fn login(request: LoginRequest, state: AppState) -> Result<impl Reply, Rejection> {
    let user = state
        .db
        .authenticate(&request.user_id, &request.password)
        .map_err(reject)?
        .ok_or_else(|| reject(ApiError::BadCredentials))?;

    let session = state.sessions.login(&user.user_id).map_err(reject)?;

    Ok(warp::reply::json(&LoginReply {
        token: session.token,
        user_id: user.user_id,
        name: user.profile.name,
    }))
}

async fn logout(session: Session, state: AppState) -> Result<impl Reply, Rejection> {
    state.sessions.logout(&session.token).map_err(reject)?;

    Ok(StatusCode::NO_CONTENT)
}

async fn my_page(session: Session, state: AppState) -> Result<impl Reply, Rejection> {
    let user = state
        .db
        .get_user(&session.user_id)
        .map_err(reject)?
        .ok_or_else(|| reject(ApiError::NotFound(format!("user {}", session.user_id))))?;

    Ok(warp::reply::json(&ProfileReply {
        user_id: user.user_id,
        profile: user.profile,
    }))
}

async fn save_my_page(
    session: Session,
    profile: Profile,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    if profile.name.trim().is_empty() {
        return Err(reject(ApiError::BadRequest("name is required".to_string())));
    }
    state
        .db
        .update_profile(&session.user_id, &profile)
        .map_err(reject)?;

    Ok(warp::reply::json(&ProfileReply {
        user_id: session.user_id,
        profile,
    }))
}

async fn list_videos(
    session: Session,
    query: VideoQueryParams,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let videos = state
        .sessions
        .videos(&session.token, &state.db)
        .map_err(reject)?;

    let all = all_categories(&videos);
    let selected: Vec<String> = match query.categories.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
        _ => all.clone(),
    };

    Ok(warp::reply::json(&VideoList {
        videos: videos
            .iter()
            .filter(|v| v.has_any_category(&selected))
            .map(PlannedVideo::from)
            .collect(),
        all_categories: all,
        selected,
    }))
}

async fn import_playlist(
    session: Session,
    request: ImportRequest,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let url = request.playlist_url.trim();
    if url.is_empty() {
        return Err(reject(ApiError::BadRequest(
            "enter a playlist URL".to_string(),
        )));
    }

    let summary = state
        .ingestor
        .import_playlist(&session.user_id, url)
        .await
        .map_err(reject)?;
    state
        .sessions
        .invalidate_videos(&session.user_id)
        .map_err(reject)?;

    Ok(warp::reply::json(&summary))
}

async fn generate_plan(
    session: Session,
    request: PlanRequest,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let videos = state
        .sessions
        .videos(&session.token, &state.db)
        .map_err(reject)?;

    let plan = build_plan(&videos, &request, state.advisor.as_ref())
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&plan))
}

async fn coach_options(state: AppState) -> Result<impl Reply, Rejection> {
    let options = state.db.exercise_options().map_err(reject)?;

    Ok(warp::reply::json(&options))
}

async fn coach_plan(request: CoachRequest, state: AppState) -> Result<impl Reply, Rejection> {
    let plan = coach::generate(state.advisor.as_ref(), &request)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&plan))
}

async fn coach_download(request: CoachRequest, state: AppState) -> Result<impl Reply, Rejection> {
    let plan = coach::generate(state.advisor.as_ref(), &request)
        .await
        .map_err(reject)?;

    Ok(PlanDownload {
        file_name: request.file_name(),
        body: plan.plan,
    })
}

async fn calendar_page(query: CalendarQueryParams) -> Result<impl Reply, Rejection> {
    let today = Local::now().date_naive();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());

    let invalid = || reject(ApiError::BadRequest(format!("invalid month {year}-{month}")));
    let (monthly, weekly) = match query.view {
        CalendarView::Monthly => (
            Some(calendar::monthly(year, month, today).ok_or_else(invalid)?),
            None,
        ),
        CalendarView::Weekly => (None, Some(calendar::weekly(year, month).ok_or_else(invalid)?)),
    };

    let (prev_year, prev_month) = calendar::prev_month(year, month);
    let (next_year, next_month) = calendar::next_month(year, month);

    Ok(warp::reply::json(&CalendarPage {
        year,
        month,
        view: query.view,
        prev: MonthRef {
            year: prev_year,
            month: prev_month,
        },
        next: MonthRef {
            year: next_year,
            month: next_month,
        },
        monthly,
        weekly,
    }))
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use serde_json::{json, Value};
    use warp::http::StatusCode;

    use crate::db::{Database, Exercise};
    use crate::ingest::test::{metadata, FakeAdvisor, FakeSource};
    use crate::ingest::Ingestor;
    use crate::session::SessionStore;

    use super::{make_server, AppState, SESSION_HEADER};

    fn state() -> AppState {
        let db = Database::memory().unwrap();
        let advisor = Arc::new(FakeAdvisor::default());
        let source = FakeSource {
            videos: vec![
                metadata("a", "core crunch", 300),
                metadata("b", "legs squat", 300),
                metadata("c", "core plank", 300),
            ],
        };

        AppState {
            ingestor: Ingestor::new(&db, Arc::new(source), advisor.clone(), vec![]),
            db,
            sessions: SessionStore::new(),
            advisor,
        }
    }

    fn body(response: &warp::http::Response<bytes::Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    async fn signed_in<R: warp::Reply + Send + 'static>(
        filter: &warp::filters::BoxedFilter<(R,)>,
    ) -> String {
        let response = warp::test::request()
            .method("POST")
            .path("/register")
            .json(&json!({"user_id": "kim", "name": "Kim", "password": "pw", "gender": "Female"}))
            .reply(filter)
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = warp::test::request()
            .method("POST")
            .path("/login")
            .json(&json!({"user_id": "kim", "password": "pw"}))
            .reply(filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        body(&response)["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    pub async fn test_membership() {
        let filter = make_server(state());
        let token = signed_in(&filter).await;

        let duplicate = warp::test::request()
            .method("POST")
            .path("/register")
            .json(&json!({"user_id": "kim", "name": "Kim", "password": "pw", "gender": "Male"}))
            .reply(&filter)
            .await;
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let wrong = warp::test::request()
            .method("POST")
            .path("/login")
            .json(&json!({"user_id": "kim", "password": "nope"}))
            .reply(&filter)
            .await;
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let saved = warp::test::request()
            .method("PUT")
            .path("/me")
            .header(SESSION_HEADER, token.as_str())
            .json(&json!({"name": "Kim Minji", "gender": "Female", "age": 29}))
            .reply(&filter)
            .await;
        assert_eq!(saved.status(), StatusCode::OK);

        let me = warp::test::request()
            .path("/me")
            .header(SESSION_HEADER, token.as_str())
            .reply(&filter)
            .await;
        let me = body(&me);
        assert_eq!(me["name"], "Kim Minji");
        assert_eq!(me["age"], 29);
        assert_eq!(me["height"], Value::Null);

        let logout = warp::test::request()
            .method("POST")
            .path("/logout")
            .header(SESSION_HEADER, token.as_str())
            .reply(&filter)
            .await;
        assert_eq!(logout.status(), StatusCode::NO_CONTENT);

        let after = warp::test::request()
            .path("/me")
            .header(SESSION_HEADER, token.as_str())
            .reply(&filter)
            .await;
        assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    pub async fn test_import_list_and_plan() {
        let filter = make_server(state());
        let token = signed_in(&filter).await;

        let empty = warp::test::request()
            .path("/videos")
            .header(SESSION_HEADER, token.as_str())
            .reply(&filter)
            .await;
        assert_eq!(body(&empty)["videos"], json!([]));

        let imported = warp::test::request()
            .method("POST")
            .path("/videos/import")
            .header(SESSION_HEADER, token.as_str())
            .json(&json!({"playlist_url": "https://www.youtube.com/playlist?list=PL1"}))
            .reply(&filter)
            .await;
        assert_eq!(imported.status(), StatusCode::OK);
        assert_eq!(body(&imported)["new_videos"], 3);

        let listed = warp::test::request()
            .path("/videos?categories=core")
            .header(SESSION_HEADER, token.as_str())
            .reply(&filter)
            .await;
        let listed = body(&listed);
        assert_eq!(listed["all_categories"], json!(["core", "legs"]));
        assert_eq!(listed["videos"].as_array().unwrap().len(), 2);
        assert_eq!(
            listed["videos"][0]["thumbnail_url"],
            "https://img.youtube.com/vi/a/0.jpg"
        );

        let plan = warp::test::request()
            .method("POST")
            .path("/plans")
            .header(SESSION_HEADER, token.as_str())
            .json(&json!({"categories": ["core", "legs"], "daily_minutes": 10, "num_days": 2}))
            .reply(&filter)
            .await;
        assert_eq!(plan.status(), StatusCode::OK);
        let plan = body(&plan);
        assert_eq!(plan["total_minutes"], 20);
        assert_eq!(plan["days"][0]["accumulated_seconds"], 1200);
        assert_eq!(plan["days"][1]["videos"][0]["id"], "b");
        assert_eq!(plan["summary"], "Keep it up");

        let none = warp::test::request()
            .method("POST")
            .path("/plans")
            .header(SESSION_HEADER, token.as_str())
            .json(&json!({"categories": ["arms"], "daily_minutes": 10, "num_days": 2}))
            .reply(&filter)
            .await;
        assert_eq!(none.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body(&none)["error"].as_str().unwrap().contains("no videos"));

        let bad = warp::test::request()
            .method("POST")
            .path("/plans")
            .header(SESSION_HEADER, token.as_str())
            .json(&json!({"categories": ["core"], "daily_minutes": 0, "num_days": 2}))
            .reply(&filter)
            .await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    pub async fn test_requires_session() {
        let filter = make_server(state());

        let response = warp::test::request()
            .method("POST")
            .path("/plans")
            .json(&json!({"categories": ["core"]}))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    pub async fn test_coach() {
        let state = state();
        state
            .db
            .put_exercise(&Exercise {
                title: "Squat".to_string(),
                body_part: "Quadriceps".to_string(),
                equipment: "Body Only".to_string(),
                rating: 8.5,
            })
            .unwrap();
        let filter = make_server(state);

        let options = warp::test::request()
            .path("/coach/options")
            .reply(&filter)
            .await;
        assert_eq!(body(&options)["body_parts"], json!(["Quadriceps"]));

        let request = json!({
            "name": "kim",
            "age": 30,
            "experience": "Beginner",
            "target_body_parts": ["Quadriceps"],
            "equipment": [],
            "duration": "1 Week",
            "start_date": "2024-03-01"
        });

        let plan = warp::test::request()
            .method("POST")
            .path("/coach/plan")
            .json(&request)
            .reply(&filter)
            .await;
        let plan = body(&plan);
        assert_eq!(plan["plan"], "Plan for kim");
        assert_eq!(plan["dates"].as_array().unwrap().len(), 7);

        let download = warp::test::request()
            .method("POST")
            .path("/coach/plan.txt")
            .json(&request)
            .reply(&filter)
            .await;
        assert_eq!(download.body().as_ref(), b"Plan for kim");
    }

    #[tokio::test]
    pub async fn test_calendar() {
        let filter = make_server(state());

        let monthly = warp::test::request()
            .path("/calendar?year=2024&month=12")
            .reply(&filter)
            .await;
        let monthly = body(&monthly);
        assert_eq!(monthly["next"], json!({"year": 2025, "month": 1}));
        assert_eq!(monthly["monthly"]["weeks"][0][0]["day"], 1);
        assert!(monthly.get("weekly").is_none());

        let weekly = warp::test::request()
            .path("/calendar?year=2024&month=6&view=weekly")
            .reply(&filter)
            .await;
        let weekly = body(&weekly);
        assert_eq!(weekly["weekly"]["weeks"][1]["range"], "6/2 - 6/8");

        let invalid = warp::test::request()
            .path("/calendar?year=2024&month=13")
            .reply(&filter)
            .await;
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    pub async fn test_index() {
        let filter = make_server(state());

        let index = warp::test::request().path("/").reply(&filter).await;
        assert_eq!(body(&index).as_array().unwrap().len(), 5);

        let missing = warp::test::request().path("/nope").reply(&filter).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}

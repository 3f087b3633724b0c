use mongodb::Database;
use rocket::http::Status;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::config::Config;
use crate::data::session::Session;
use crate::data::user::db::problem as user_problem;
use crate::data::user::db::{UserCreateData, UserDbExt};
use crate::data::user::User;
use crate::middleware::paging::PageState;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};
use crate::schedule::Store;

/// Get user information
#[utoipa::path(
    params(
        ("id", description = "user ID")
    ),
    responses(
        (status = 200, description = "The user", body = User),
        (status = 404, description = "Queried user doesn't exist", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/user/<id>")]
#[tracing::instrument(skip(db))]
pub async fn user_get(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<User>, Problem> {
    if auth.user != id && !auth.role.is_staff() {
        return Err(problems::forbidden("Students can only view themselves."));
    }

    db.get_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| user_problem::not_found(id))
}

/// List users
#[utoipa::path(
    params(
        ("page" = Option<u32>, Query, description = "page number, starting at 0"),
        ("len" = Option<u32>, Query, description = "page length"),
    ),
    responses(
        (status = 200, description = "Page of users ordered by username", body = Vec<User>),
        (status = 403, description = "Insufficient privileges", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/user")]
#[tracing::instrument(skip(db))]
pub async fn user_list(
    page: PageState,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<User>>, Problem> {
    if !auth.role.is_staff() {
        return Err(problems::forbidden("Only staff can list users."));
    }

    Ok(Json(db.list_users(page).await?))
}

/// Register a user
#[utoipa::path(
    request_body = UserCreateData,
    responses(
        (status = 201, description = "User was created", body = User),
        (status = 400, description = "Invalid or already used email/username", body = Problem),
        (status = 403, description = "Insufficient privileges", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[post("/user", format = "application/json", data = "<create_user>")]
#[tracing::instrument(skip(db, config))]
pub async fn user_create(
    create_user: Json<UserCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
    config: &State<Config>,
) -> Result<Created<Json<User>>, Problem> {
    if !auth.role.is_admin() {
        return Err(problems::forbidden("Only admins can register users."));
    }

    create_user.validate()?;
    let create_user = create_user
        .into_inner()
        .with_admin_usernames(&config.admin_usernames);
    let user = db.create_user(create_user).await?;

    Ok(Created::new(format!("/api/v1/user/{}", user.id)).body(Json(user)))
}

/// Delete a user
#[utoipa::path(
    params(
        ("id", description = "user ID")
    ),
    responses(
        (status = 200, description = "ID of the deleted user", body = String),
        (status = 401, description = "Missing/expired token", body = Problem),
        (status = 403, description = "Insufficient privileges", body = Problem),
        (status = 404, description = "Queried user doesn't exist", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[delete("/user/<id>")]
#[tracing::instrument(skip(db))]
pub async fn user_delete(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<String, Problem> {
    if !auth.role.is_admin() {
        return Err(Problem::new_untyped(
            Status::Forbidden,
            "Only admins can delete users.",
        ));
    }

    let removed = db.delete_user(id).await?;

    match removed {
        Some(removed) => Ok(removed.id.to_string()),
        None => Err(user_problem::not_found(id)),
    }
}

/// Personal timetable
///
/// Sessions of every class the user teaches or attends, ordered by date.
#[utoipa::path(
    params(
        ("id", description = "user ID")
    ),
    responses(
        (status = 200, description = "Sessions the user takes part in", body = Vec<Session>),
        (status = 403, description = "Students can only view their own timetable", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/user/<id>/sessions")]
#[tracing::instrument(skip(store))]
pub async fn user_sessions(
    id: Uuid,
    auth: UserRoleToken,
    store: &State<Store>,
) -> Result<Json<Vec<Session>>, Problem> {
    if auth.user != id && !auth.role.is_staff() {
        return Err(problems::forbidden(
            "Students can only view their own timetable.",
        ));
    }

    Ok(Json(store.user_sessions(id).await?))
}

///////////////////////
//       TESTS
///////////////////////

#[cfg(test)]
mod user_endpoints {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use rocket::http::{Header, Status};
    use rocket::local::asynchronous::Client;
    use uuid::Uuid;

    use crate::config::Config;
    use crate::data::class::{Class, ClassStatus};
    use crate::data::session::{Session, SessionKey};
    use crate::resp::jwt::UserRoleToken;
    use crate::role::Role;
    use crate::route::{catchers, schedule_routes};
    use crate::schedule::store::memory::MemoryStore;
    use crate::schedule::{ScheduleStore, Store};

    fn class_with(teacher: Uuid, student: Uuid) -> Class {
        let now = chrono::Utc::now();
        Class {
            id: Uuid::new_v4(),
            name: "History 2".to_string(),
            course_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
            capacity: 5,
            teachers: vec![teacher],
            students: vec![student],
            status: ClassStatus::Active,
            schedule: vec![],
            created_by: teacher,
            created: now,
            updated: now,
        }
    }

    async fn client_with(store: Arc<MemoryStore>) -> (Client, String) {
        let config = Config::default();
        let secret = config.jwt_secret.clone();
        let shared: Store = store;
        let rocket = rocket::build()
            .manage(config)
            .manage(shared)
            .mount("/api/v1", schedule_routes())
            .register("/", catchers());

        (
            Client::tracked(rocket).await.expect("invalid backend"),
            secret,
        )
    }

    fn bearer(secret: &str, user: Uuid, role: Role) -> Header<'static> {
        let token = UserRoleToken::for_user(user, role)
            .encode_jwt(secret)
            .expect("unable to encode token");
        Header::new("Authorization", format!("Bearer {}", token))
    }

    #[rocket::async_test]
    async fn v1_user_sessions_lists_own_timetable() {
        let store = Arc::new(MemoryStore::new());
        let teacher = Uuid::new_v4();
        let student = Uuid::new_v4();
        let class = class_with(teacher, student);
        store.insert_class(&class).await.expect("class insert");

        let key = SessionKey {
            slot_id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
        };
        store
            .insert_sessions(&[Session::new(class.id, key)])
            .await
            .expect("session insert");

        let (client, secret) = client_with(store).await;

        let response = client
            .get(format!("/api/v1/user/{}/sessions", student))
            .header(bearer(&secret, student, Role::Student))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let sessions: Vec<Session> = response.into_json().await.expect("invalid response json");
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].class_id, class.id);

        let teacher_view: Vec<Session> = client
            .get(format!("/api/v1/user/{}/sessions", teacher))
            .header(bearer(&secret, teacher, Role::Teacher))
            .dispatch()
            .await
            .into_json()
            .await
            .expect("invalid response json");
        assert_eq!(teacher_view, sessions);
    }

    #[rocket::async_test]
    async fn v1_user_sessions_hidden_from_other_students() {
        let (client, secret) = client_with(Arc::new(MemoryStore::new())).await;

        let response = client
            .get(format!("/api/v1/user/{}/sessions", Uuid::new_v4()))
            .header(bearer(&secret, Uuid::new_v4(), Role::Student))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Forbidden);
    }
}

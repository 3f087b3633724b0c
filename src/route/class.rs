use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::config::Config;
use crate::data::class::db::ClassCreateData;
use crate::data::class::Class;
use crate::data::session::Session;
use crate::middleware::paging::PageState;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};
use crate::schedule::{create_class, Store};

/// Schedule a class
///
/// Expands the weekly schedule into dated sessions and creates the class
/// only when no room, teacher or student would be double booked.
#[utoipa::path(
    request_body = ClassCreateData,
    responses(
        (status = 201, description = "Class and its sessions were created", body = Class),
        (status = 400, description = "Missing or invalid fields", body = Problem),
        (status = 401, description = "Missing/expired token", body = Problem),
        (status = 403, description = "Insufficient privileges", body = Problem),
        (status = 409, description = "Schedule conflict; retry when `retry` is set", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[post("/class", format = "application/json", data = "<class>")]
#[tracing::instrument(skip(store, config))]
pub async fn class_create(
    class: Json<ClassCreateData>,
    auth: UserRoleToken,
    store: &State<Store>,
    config: &State<Config>,
) -> Result<Created<Json<Class>>, Problem> {
    if !auth.role.is_staff() {
        return Err(problems::forbidden("Only staff can schedule classes."));
    }

    let class = create_class(store.inner().as_ref(), config, &auth, class.into_inner()).await?;

    Ok(Created::new(format!("/api/v1/class/{}", class.id)).body(Json(class)))
}

/// List classes
#[utoipa::path(
    params(
        ("page" = Option<u32>, Query, description = "page number, starting at 0"),
        ("len" = Option<u32>, Query, description = "page length"),
    ),
    responses(
        (status = 200, description = "Page of classes", body = Vec<Class>),
        (status = 401, description = "Missing/expired token", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/class")]
#[tracing::instrument(skip(store))]
pub async fn class_list(
    page: PageState,
    auth: UserRoleToken,
    store: &State<Store>,
) -> Result<Json<Vec<Class>>, Problem> {
    Ok(Json(store.list_classes(page).await?))
}

/// Get class information
#[utoipa::path(
    params(
        ("id", description = "class ID")
    ),
    responses(
        (status = 200, description = "The class", body = Class),
        (status = 404, description = "Queried class doesn't exist", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/class/<id>")]
#[tracing::instrument(skip(store))]
pub async fn class_info(
    id: Uuid,
    auth: UserRoleToken,
    store: &State<Store>,
) -> Result<Json<Class>, Problem> {
    store
        .class(id)
        .await?
        .map(Json)
        .ok_or_else(|| problems::not_found("Class", id))
}

/// List the sessions of a class
#[utoipa::path(
    params(
        ("id", description = "class ID")
    ),
    responses(
        (status = 200, description = "Sessions by date", body = Vec<Session>),
        (status = 404, description = "Queried class doesn't exist", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/class/<id>/sessions")]
#[tracing::instrument(skip(store))]
pub async fn class_sessions(
    id: Uuid,
    auth: UserRoleToken,
    store: &State<Store>,
) -> Result<Json<Vec<Session>>, Problem> {
    if store.class(id).await?.is_none() {
        return Err(problems::not_found("Class", id));
    }

    Ok(Json(store.class_sessions(id).await?))
}

/// Delete a class with all of its sessions
#[utoipa::path(
    params(
        ("id", description = "class ID")
    ),
    responses(
        (status = 200, description = "ID of the deleted class", body = String),
        (status = 403, description = "Class not created by user", body = Problem),
        (status = 404, description = "Queried class doesn't exist", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[delete("/class/<id>")]
#[tracing::instrument(skip(store))]
pub async fn class_delete(
    id: Uuid,
    auth: UserRoleToken,
    store: &State<Store>,
) -> Result<String, Problem> {
    let class = store
        .class(id)
        .await?
        .ok_or_else(|| problems::not_found("Class", id))?;

    if !auth.role.is_admin() && class.created_by != auth.user {
        return Err(problems::forbidden("Class not created by user."));
    }

    store.delete_class(id).await?;
    tracing::info!("Deleted class '{}' ({}).", class.name, class.id);

    Ok(id.to_string())
}

///////////////////////
//       TESTS
///////////////////////

#[cfg(test)]
mod class_endpoints {
    use std::sync::Arc;

    use chrono::NaiveTime;
    use rocket::http::{ContentType, Header, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::config::Config;
    use crate::data::course::Course;
    use crate::data::room::Room;
    use crate::data::slot::Slot;
    use crate::resp::jwt::UserRoleToken;
    use crate::role::Role;
    use crate::route::{catchers, schedule_routes};
    use crate::schedule::store::memory::MemoryStore;
    use crate::schedule::Store;

    struct Setup {
        client: Client,
        store: Arc<MemoryStore>,
        secret: String,
        course: Course,
        slot: Slot,
        lab: Room,
        hall: Room,
    }

    async fn setup() -> Setup {
        let store = Arc::new(MemoryStore::new());
        let course = store.add_course(Course::new("Chemistry", ""));
        let slot = store.add_slot(
            Slot::new(
                "first",
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            )
            .unwrap(),
        );
        let lab = store.add_room(Room::new("Lab 1", 20));
        let hall = store.add_room(Room::new("Hall", 80));

        let config = Config::default();
        let secret = config.jwt_secret.clone();
        let shared: Store = store.clone();

        let rocket = rocket::build()
            .manage(config)
            .manage(shared)
            .mount("/api/v1", schedule_routes())
            .register("/", catchers());
        let client = Client::tracked(rocket).await.expect("invalid backend");

        Setup {
            client,
            store,
            secret,
            course,
            slot,
            lab,
            hall,
        }
    }

    fn bearer(secret: &str, role: Role) -> Header<'static> {
        let token = UserRoleToken::for_user(Uuid::new_v4(), role)
            .encode_jwt(secret)
            .expect("unable to encode token");
        Header::new("Authorization", format!("Bearer {}", token))
    }

    fn body(s: &Setup, name: &str, room: &Room, teacher: Uuid) -> Value {
        json!({
            "name": name,
            "courseId": s.course.id,
            "startDate": "2024-09-02",
            "endDate": "2024-09-20",
            "capacity": 10,
            "schedule": [{ "weekday": "Monday", "slot": s.slot.id, "room": room.id }],
            "teachers": [teacher],
            "students": [Uuid::new_v4()],
        })
    }

    #[rocket::async_test]
    async fn v1_class_create_works() {
        let s = setup().await;

        let response = s
            .client
            .post("/api/v1/class")
            .header(ContentType::JSON)
            .header(bearer(&s.secret, Role::Teacher))
            .body(body(&s, "Chemistry 1A", &s.lab, Uuid::new_v4()).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Created);
        let created: Value = response.into_json().await.expect("invalid response json");
        assert_eq!(created["name"], "Chemistry 1A");
        assert_eq!(created["status"], "active");

        let id = created["_id"].as_str().expect("class id");
        let sessions: Value = s
            .client
            .get(format!("/api/v1/class/{}/sessions", id))
            .header(bearer(&s.secret, Role::Student))
            .dispatch()
            .await
            .into_json()
            .await
            .expect("invalid response json");
        let dates: Vec<&str> = sessions
            .as_array()
            .expect("session list")
            .iter()
            .filter_map(|it| it["date"].as_str())
            .collect();
        assert_eq!(dates, vec!["2024-09-02", "2024-09-09", "2024-09-16"]);
    }

    #[rocket::async_test]
    async fn v1_class_create_reports_conflicts() {
        let s = setup().await;
        let teacher = Uuid::new_v4();

        let first = s
            .client
            .post("/api/v1/class")
            .header(ContentType::JSON)
            .header(bearer(&s.secret, Role::Admin))
            .body(body(&s, "Chemistry 1A", &s.lab, teacher).to_string())
            .dispatch()
            .await;
        assert_eq!(first.status(), Status::Created);

        let second = s
            .client
            .post("/api/v1/class")
            .header(ContentType::JSON)
            .header(bearer(&s.secret, Role::Admin))
            .body(body(&s, "Chemistry 1B", &s.hall, teacher).to_string())
            .dispatch()
            .await;

        assert_eq!(second.status(), Status::Conflict);
        let problem: Value = second.into_json().await.expect("invalid problem json");
        assert_eq!(problem["type"], "schedule_conflict");
        assert_eq!(problem["conflict"], "teacher_conflict");
        assert!(problem["message"]
            .as_str()
            .unwrap()
            .contains("Chemistry 1A"));

        assert_eq!(s.store.all_classes().len(), 1);
    }

    #[rocket::async_test]
    async fn v1_class_create_validates() {
        let s = setup().await;
        let mut request = body(&s, "Chemistry 1A", &s.lab, Uuid::new_v4());
        request["capacity"] = json!(0);

        let response = s
            .client
            .post("/api/v1/class")
            .header(ContentType::JSON)
            .header(bearer(&s.secret, Role::Teacher))
            .body(request.to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        assert!(s.store.all_sessions().is_empty());
    }

    #[rocket::async_test]
    async fn v1_class_create_requires_staff() {
        let s = setup().await;

        let anonymous = s
            .client
            .post("/api/v1/class")
            .header(ContentType::JSON)
            .body(body(&s, "Chemistry 1A", &s.lab, Uuid::new_v4()).to_string())
            .dispatch()
            .await;
        assert_eq!(anonymous.status(), Status::Unauthorized);

        let student = s
            .client
            .post("/api/v1/class")
            .header(ContentType::JSON)
            .header(bearer(&s.secret, Role::Student))
            .body(body(&s, "Chemistry 1A", &s.lab, Uuid::new_v4()).to_string())
            .dispatch()
            .await;
        assert_eq!(student.status(), Status::Forbidden);
        assert!(s.store.all_classes().is_empty());
    }

    #[rocket::async_test]
    async fn v1_class_delete_cascades() {
        let s = setup().await;
        let admin = bearer(&s.secret, Role::Admin);

        let created: Value = s
            .client
            .post("/api/v1/class")
            .header(ContentType::JSON)
            .header(admin.clone())
            .body(body(&s, "Chemistry 1A", &s.lab, Uuid::new_v4()).to_string())
            .dispatch()
            .await
            .into_json()
            .await
            .expect("invalid response json");
        let id = created["_id"].as_str().expect("class id").to_string();
        assert_eq!(s.store.all_sessions().len(), 3);

        let teacher = s
            .client
            .delete(format!("/api/v1/class/{}", id))
            .header(bearer(&s.secret, Role::Teacher))
            .dispatch()
            .await;
        assert_eq!(teacher.status(), Status::Forbidden);

        let response = s
            .client
            .delete(format!("/api/v1/class/{}", id))
            .header(admin)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await, Some(id.clone()));
        assert!(s.store.all_classes().is_empty());
        assert!(s.store.all_sessions().is_empty());

        let missing = s
            .client
            .get(format!("/api/v1/class/{}", id))
            .header(bearer(&s.secret, Role::Teacher))
            .dispatch()
            .await;
        assert_eq!(missing.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn v1_malformed_body_is_a_problem() {
        let s = setup().await;

        let response = s
            .client
            .post("/api/v1/class")
            .header(ContentType::JSON)
            .header(bearer(&s.secret, Role::Teacher))
            .body(r#"{ "name": "Chemistry 1A", "#)
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(
            response.content_type(),
            Some(ContentType::new("application", "problem+json"))
        );
    }
}

use mongodb::Database;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::course::db::{CourseCreateData, CourseDbExt};
use crate::data::course::Course;
use crate::data::room::db::{RoomCreateData, RoomDbExt};
use crate::data::room::Room;
use crate::data::slot::db::{SlotCreateData, SlotDbExt};
use crate::data::slot::Slot;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};

fn require_admin(auth: &UserRoleToken, what: &str) -> Result<(), Problem> {
    if !auth.role.is_admin() {
        return Err(problems::forbidden(format!("Only admins can create {}.", what)));
    }
    Ok(())
}

/// Create a course
#[utoipa::path(
    request_body = CourseCreateData,
    responses(
        (status = 201, description = "Course was created", body = Course),
        (status = 400, description = "Empty course name", body = Problem),
        (status = 403, description = "Insufficient privileges", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[post("/course", format = "application/json", data = "<course>")]
#[tracing::instrument(skip(db))]
pub async fn course_create(
    course: Json<CourseCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Created<Json<Course>>, Problem> {
    require_admin(&auth, "courses")?;
    course.validate()?;

    let course = db.create_course(course.into_inner()).await?;
    Ok(Created::new(format!("/api/v1/course/{}", course.id)).body(Json(course)))
}

/// List courses
#[utoipa::path(
    responses(
        (status = 200, description = "All courses", body = Vec<Course>),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/course")]
#[tracing::instrument(skip(db))]
pub async fn course_list(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Course>>, Problem> {
    Ok(Json(db.list_courses().await?))
}

/// Get course information
#[utoipa::path(
    params(
        ("id", description = "course ID")
    ),
    responses(
        (status = 200, description = "The course", body = Course),
        (status = 404, description = "Queried course doesn't exist", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/course/<id>")]
#[tracing::instrument(skip(db))]
pub async fn course_info(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Course>, Problem> {
    db.get_course(id)
        .await?
        .map(Json)
        .ok_or_else(|| problems::not_found("Course", id))
}

/// Create a time slot
#[utoipa::path(
    request_body = SlotCreateData,
    responses(
        (status = 201, description = "Slot was created", body = Slot),
        (status = 400, description = "Slot doesn't end after it starts", body = Problem),
        (status = 403, description = "Insufficient privileges", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[post("/slot", format = "application/json", data = "<slot>")]
#[tracing::instrument(skip(db))]
pub async fn slot_create(
    slot: Json<SlotCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Created<Json<Slot>>, Problem> {
    require_admin(&auth, "slots")?;

    let slot = db.create_slot(slot.into_inner()).await?;
    Ok(Created::new(format!("/api/v1/slot/{}", slot.id)).body(Json(slot)))
}

/// List time slots
#[utoipa::path(
    responses(
        (status = 200, description = "All slots ordered by start time", body = Vec<Slot>),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/slot")]
#[tracing::instrument(skip(db))]
pub async fn slot_list(auth: UserRoleToken, db: &State<Database>) -> Result<Json<Vec<Slot>>, Problem> {
    Ok(Json(db.list_slots().await?))
}

/// Create a room
#[utoipa::path(
    request_body = RoomCreateData,
    responses(
        (status = 201, description = "Room was created", body = Room),
        (status = 400, description = "Invalid or already used room name", body = Problem),
        (status = 403, description = "Insufficient privileges", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[post("/room", format = "application/json", data = "<room>")]
#[tracing::instrument(skip(db))]
pub async fn room_create(
    room: Json<RoomCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Created<Json<Room>>, Problem> {
    require_admin(&auth, "rooms")?;
    room.validate()?;

    let room = db.create_room(room.into_inner()).await?;
    Ok(Created::new(format!("/api/v1/room/{}", room.id)).body(Json(room)))
}

/// List rooms
#[utoipa::path(
    responses(
        (status = 200, description = "All rooms", body = Vec<Room>),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/room")]
#[tracing::instrument(skip(db))]
pub async fn room_list(auth: UserRoleToken, db: &State<Database>) -> Result<Json<Vec<Room>>, Problem> {
    Ok(Json(db.list_rooms().await?))
}

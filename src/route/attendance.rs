use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::attendance::db::{AttendanceDbExt, AttendanceRecordData};
use crate::data::attendance::Attendance;
use crate::data::class::Class;
use crate::data::session::db::SessionDbExt;
use crate::data::session::Session;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};
use crate::schedule::ScheduleStore;

async fn session_with_class(db: &Database, id: Uuid) -> Result<(Session, Class), Problem> {
    let session = db
        .get_session(id)
        .await?
        .ok_or_else(|| problems::not_found("Session", id))?;
    let class = ScheduleStore::class(db, session.class_id)
        .await?
        .ok_or_else(|| problems::not_found("Class", session.class_id))?;

    Ok((session, class))
}

/// Mark attendance
///
/// Marking the same student again replaces the previous entry.
#[utoipa::path(
    params(
        ("id", description = "session ID")
    ),
    request_body = AttendanceRecordData,
    responses(
        (status = 200, description = "Stored attendance entry", body = Attendance),
        (status = 400, description = "Student isn't on the class roster", body = Problem),
        (status = 403, description = "Not a teacher of the class", body = Problem),
        (status = 404, description = "Queried session doesn't exist", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[put("/session/<id>/attendance", format = "application/json", data = "<record>")]
#[tracing::instrument(skip(db))]
pub async fn attendance_record(
    id: Uuid,
    record: Json<AttendanceRecordData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Attendance>, Problem> {
    let (session, class) = session_with_class(db, id).await?;

    if !auth.role.is_admin() && !(auth.role.is_staff() && class.has_teacher(auth.user)) {
        return Err(problems::forbidden(
            "Only teachers of the class can mark attendance.",
        ));
    }

    let attendance = record.into_inner().into_attendance(&session, &class, auth.user)?;
    Ok(Json(db.record_attendance(attendance).await?))
}

/// Attendance of a session
#[utoipa::path(
    params(
        ("id", description = "session ID")
    ),
    responses(
        (status = 200, description = "Attendance entries ordered by student", body = Vec<Attendance>),
        (status = 403, description = "Students only see their own entry", body = Problem),
        (status = 404, description = "Queried session doesn't exist", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/session/<id>/attendance")]
#[tracing::instrument(skip(db))]
pub async fn attendance_list(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Attendance>>, Problem> {
    let (_, class) = session_with_class(db, id).await?;

    let mut entries = db.session_attendance(id).await?;
    if !auth.role.is_staff() {
        if !class.has_student(auth.user) {
            return Err(problems::forbidden("Not a member of the class."));
        }
        entries.retain(|it| it.student_id == auth.user);
    }

    Ok(Json(entries))
}

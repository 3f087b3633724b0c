use mongodb::Database;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::grade::db::{GradeDbExt, GradeRecordData};
use crate::data::grade::Grade;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};
use crate::schedule::ScheduleStore;

/// Record a grade
#[utoipa::path(
    params(
        ("id", description = "class ID")
    ),
    request_body = GradeRecordData,
    responses(
        (status = 201, description = "Grade was recorded", body = Grade),
        (status = 400, description = "Score out of range or student not on roster", body = Problem),
        (status = 403, description = "Not a teacher of the class", body = Problem),
        (status = 404, description = "Queried class doesn't exist", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[post("/class/<id>/grade", format = "application/json", data = "<grade>")]
#[tracing::instrument(skip(db))]
pub async fn grade_record(
    id: Uuid,
    grade: Json<GradeRecordData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Created<Json<Grade>>, Problem> {
    let class = ScheduleStore::class(db.inner(), id)
        .await?
        .ok_or_else(|| problems::not_found("Class", id))?;

    if !auth.role.is_admin() && !(auth.role.is_staff() && class.has_teacher(auth.user)) {
        return Err(problems::forbidden("Only teachers of the class can grade."));
    }

    let grade = grade.into_inner().into_grade(&class, auth.user)?;
    let grade = db.record_grade(grade).await?;

    Ok(Created::new(format!("/api/v1/class/{}/grade", id)).body(Json(grade)))
}

/// Grades of a class
///
/// Students always get only their own grades.
#[utoipa::path(
    params(
        ("id", description = "class ID"),
        ("student" = Option<Uuid>, Query, description = "only grades of this student"),
    ),
    responses(
        (status = 200, description = "Grades in order of recording", body = Vec<Grade>),
        (status = 403, description = "Not a member of the class", body = Problem),
        (status = 404, description = "Queried class doesn't exist", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/class/<id>/grade?<student>")]
#[tracing::instrument(skip(db))]
pub async fn grade_list(
    id: Uuid,
    student: Option<Uuid>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Grade>>, Problem> {
    let class = ScheduleStore::class(db.inner(), id)
        .await?
        .ok_or_else(|| problems::not_found("Class", id))?;

    let student = if auth.role.is_staff() {
        student
    } else if class.has_student(auth.user) {
        Some(auth.user)
    } else {
        return Err(problems::forbidden("Not a member of the class."));
    };

    Ok(Json(db.class_grades(id, student).await?))
}

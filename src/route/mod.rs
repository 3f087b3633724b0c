use std::collections::BTreeMap;

use rocket::http::Status;
use rocket::{Build, Catcher, Request, Rocket, Route};

pub mod attendance;
pub mod catalog;
pub mod class;
pub mod grade;
pub mod users;

use attendance::*;
use catalog::*;
use class::*;
use grade::*;
use users::*;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    data::{
        attendance::{db::AttendanceRecordData, Attendance, AttendanceStatus},
        class::{
            db::{ClassCreateData, ScheduleEntryData},
            Class, ClassStatus, RecurringPattern,
        },
        course::{db::CourseCreateData, Course},
        grade::{db::GradeRecordData, Grade},
        room::{db::RoomCreateData, Room},
        session::Session,
        slot::{db::SlotCreateData, Slot},
        user::{db::UserCreateData, User},
    },
    resp::{
        jwt::doc::JWTAuth,
        problem::{problems, Problem},
    },
    role::Role,
    schedule::calendar::Weekday,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        user_get,
        user_list,
        user_create,
        user_delete,
        user_sessions,
        course_create,
        course_list,
        course_info,
        slot_create,
        slot_list,
        room_create,
        room_list,
        class_create,
        class_list,
        class_info,
        class_sessions,
        class_delete,
        attendance_record,
        attendance_list,
        grade_record,
        grade_list
    ),
    components(schemas(
        Role,
        User,
        UserCreateData,
        Course,
        CourseCreateData,
        Slot,
        SlotCreateData,
        Room,
        RoomCreateData,
        Weekday,
        Class,
        ClassStatus,
        RecurringPattern,
        ClassCreateData,
        ScheduleEntryData,
        Session,
        Attendance,
        AttendanceStatus,
        AttendanceRecordData,
        Grade,
        GradeRecordData,
        Problem
    )),
    modifiers(&JWTAuth, &V1_PREFIX)
)]
pub struct ApiDocV1;

pub struct PathPrefix(pub &'static str);
pub static V1_PREFIX: PathPrefix = PathPrefix("/api/v1");

impl utoipa::Modify for PathPrefix {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut new_paths = BTreeMap::new();

        for (path, item) in std::mem::take(&mut openapi.paths.paths) {
            new_paths.insert(self.0.to_string() + path.as_ref(), item);
        }

        openapi.paths.paths = new_paths;
    }
}

/// Routes that only need the schedule store and configuration.
pub fn schedule_routes() -> Vec<Route> {
    routes![
        class_create,
        class_list,
        class_info,
        class_sessions,
        class_delete,
        user_sessions
    ]
}

/// Routes working directly against MongoDB.
pub fn crud_routes() -> Vec<Route> {
    routes![
        user_get,
        user_list,
        user_create,
        user_delete,
        course_create,
        course_list,
        course_info,
        slot_create,
        slot_list,
        room_create,
        room_list,
        attendance_record,
        attendance_list,
        grade_record,
        grade_list
    ]
}

#[catch(400)]
fn bad_request(_: &Request) -> Problem {
    problems::parse_problem()
}

#[catch(401)]
fn unauthorized(_: &Request) -> Problem {
    Problem::new_untyped(Status::Unauthorized, "Unable to authorize user.")
}

#[catch(403)]
fn forbidden(_: &Request) -> Problem {
    problems::forbidden("Insufficient privileges.")
}

#[catch(404)]
fn not_found(req: &Request) -> Problem {
    Problem::new_untyped(Status::NotFound, "Resource doesn't exist.")
        .instance_uri(req.uri().to_string())
        .clone()
}

// Rocket reports bodies that don't match the expected JSON shape as 422.
#[catch(422)]
fn unprocessable(_: &Request) -> Problem {
    problems::parse_problem()
}

#[catch(500)]
fn internal(_: &Request) -> Problem {
    problems::internal()
}

pub fn catchers() -> Vec<Catcher> {
    catchers![bad_request, unauthorized, forbidden, not_found, unprocessable, internal]
}

pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/api/v1", schedule_routes())
        .mount("/api/v1", crud_routes())
        .register("/", catchers())
        .mount(
            "/",
            SwaggerUi::new("/swagger/<_..>").url("/api/v1/openapi.json", ApiDocV1::openapi()),
        )
}

#[cfg(test)]
mod tests {
    use utoipa::OpenApi;

    use super::ApiDocV1;

    #[test]
    fn documented_paths_are_prefixed() {
        let doc = ApiDocV1::openapi();

        assert!(doc.paths.paths.contains_key("/api/v1/class"));
        assert!(doc.paths.paths.contains_key("/api/v1/user/{id}/sessions"));
        assert!(doc.paths.paths.keys().all(|it| it.starts_with("/api/v1/")));
    }
}

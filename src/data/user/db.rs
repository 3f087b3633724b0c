use bson::doc;
use mongodb::options::FindOptions;
use mongodb::Database;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::{collect_cursor, filter};
use crate::middleware::paging::PageState;
use crate::resp::problem::Problem;
use crate::role::Role;

use super::User;

pub static USER_COLLECTION_NAME: &str = "users";

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;
    use uuid::Uuid;

    #[inline]
    pub fn bad_email(email: impl ToString, detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::BadRequest, "Bad email.")
            .insert_str("email", email)
            .detail(detail)
            .to_owned()
    }

    #[inline]
    pub fn bad_username(username: impl ToString, detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::BadRequest, "Bad username.")
            .insert_str("username", username)
            .detail(detail)
            .to_owned()
    }

    #[inline]
    pub fn not_found(id: Uuid) -> Problem {
        Problem::new_untyped(Status::NotFound, "User doesn't exist.")
            .insert("id", id.to_string())
            .clone()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserCreateData {
    #[schema(format = "email")]
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

impl UserCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if !self.email.contains('@') {
            return Err(problem::bad_email(
                &self.email,
                "Not a valid e-mail address.",
            ));
        }

        if self.username.len() < 3 {
            return Err(problem::bad_username(
                &self.username,
                "Username must be at least 3 characters (bytes) long.",
            ));
        }

        if self.username.len() > 32 {
            return Err(problem::bad_username(
                &self.username,
                "Username can't be longer than 32 (bytes) characters.",
            ));
        }

        Ok(())
    }
}

impl UserCreateData {
    /// Promotes configured admin usernames to [`Role::Admin`].
    pub fn with_admin_usernames(mut self, admin_usernames: &[String]) -> UserCreateData {
        if admin_usernames.iter().any(|it| it == &self.username) {
            self.role = Role::Admin;
        }
        self
    }
}

impl From<UserCreateData> for User {
    fn from(data: UserCreateData) -> Self {
        let name = if data.name.trim().is_empty() {
            data.username.clone()
        } else {
            data.name
        };
        User::new(data.username, data.email, name, data.role)
    }
}

pub trait UserDbExt {
    async fn create_user(&self, create_user: UserCreateData) -> Result<User, Problem>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, Problem>;
    async fn list_users(&self, page: PageState) -> Result<Vec<User>, Problem>;
    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, Problem>;
}

impl UserDbExt for Database {
    async fn create_user(&self, create_user: UserCreateData) -> Result<User, Problem> {
        let users = self.collection::<User>(USER_COLLECTION_NAME);

        if users
            .find_one(doc! { "email": &create_user.email }, None)
            .await?
            .is_some()
        {
            return Err(problem::bad_email(
                &create_user.email,
                "Email already registered.",
            ));
        }

        if users
            .find_one(doc! { "username": &create_user.username }, None)
            .await?
            .is_some()
        {
            return Err(problem::bad_username(
                &create_user.username,
                "Username already used.",
            ));
        }

        let user = User::from(create_user);
        users.insert_one(&user, None).await?;

        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, Problem> {
        self.collection(USER_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_users(&self, page: PageState) -> Result<Vec<User>, Problem> {
        let options = FindOptions::builder()
            .sort(doc! { "username": 1 })
            .skip(page.skip())
            .limit(page.limit())
            .build();

        let cursor = self
            .collection::<User>(USER_COLLECTION_NAME)
            .find(None, options)
            .await?;

        Ok(collect_cursor(cursor).await?)
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, Problem> {
        self.collection(USER_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }
}

use crate::api::resource::{Resource, Users};
use crate::api::ApiClient;
use crate::error::{LedgerError, Result};
use crate::models::{NewUser, User, UserUpdate, UserWire};

/// An admin may not be deleted while they are the only admin among `loaded`.
///
/// Only the users currently loaded are considered; the server is not asked.
pub fn can_delete(user: &User, loaded: &[User]) -> bool {
    !(user.is_admin && loaded.iter().filter(|u| u.is_admin).count() == 1)
}

pub async fn fetch_user(api: &ApiClient, user_id: i64) -> Result<User> {
    let path = format!("{}?user_id={user_id}", Users::LIST_PATH);
    let wire: UserWire = api
        .get_json(&path, "Failed to fetch user data.")
        .await?;
    Ok(User::from(wire))
}

#[derive(Debug, Clone, Default)]
pub struct UserForm {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub address: String,
    pub admin: bool,
    pub date_hired: String,
    pub date_finished: String,
}

impl UserForm {
    /// Build the create request. Employment dates are only sent for admins.
    pub fn into_new_user(self, admin_id: i64) -> Result<NewUser> {
        for (label, value) in [
            ("Username", &self.username),
            ("Password", &self.password),
            ("Name", &self.name),
            ("Email", &self.email),
        ] {
            if value.trim().is_empty() {
                return Err(LedgerError::validation(format!("{label} is required")));
            }
        }
        let (date_hired, date_finished) = if self.admin {
            (self.date_hired, self.date_finished)
        } else {
            (String::new(), String::new())
        };
        Ok(NewUser {
            username: self.username,
            password: self.password,
            name: self.name,
            email: self.email,
            admin_id,
            address: self.address,
            user_type: if self.admin { "admin" } else { "user" }.to_string(),
            date_hired,
            date_finished,
        })
    }
}

pub fn user_update(user_id: i64, password: String, address: String) -> UserUpdate {
    UserUpdate {
        user_id,
        password,
        address,
    }
}

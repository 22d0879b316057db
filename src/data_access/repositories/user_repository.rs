use redb::ReadableTable;

use crate::data_access::data_context::{
    encode, get_row, next_id, DataContext, StoreError, USERS_TABLE, USER_LOGINS_INDEX,
};
use crate::shared::models::user::{NewUser, User};

#[derive(Clone)]
pub struct UserRepository {
    context: DataContext,
}

impl UserRepository {
    pub fn new(context: DataContext) -> Self {
        Self { context }
    }

    /// Newest accounts first.
    pub fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.context.query(USERS_TABLE, |_| true)?;
        users.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    pub fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        self.context.optional(USERS_TABLE, id)
    }

    pub fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        self.context.read(|txn| {
            let logins = txn.open_table(USER_LOGINS_INDEX)?;
            let Some(id) = logins.get(login)?.map(|v| v.value()) else {
                return Ok(None);
            };
            let users = txn.open_table(USERS_TABLE)?;
            get_row(&users, id)
        })
    }

    /// Store a new user. Fails with `UniqueViolation` when the login is taken.
    pub fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        self.context.tx(|txn| {
            let mut logins = txn.open_table(USER_LOGINS_INDEX)?;
            if logins.get(new_user.login.as_str())?.is_some() {
                return Err(StoreError::UniqueViolation(format!("login {}", new_user.login)));
            }

            let id = next_id(txn, "users")?;
            let user = new_user.into_user(id);
            let mut users = txn.open_table(USERS_TABLE)?;
            users.insert(id, encode(&user)?.as_slice())?;
            logins.insert(user.login.as_str(), id)?;
            Ok(user)
        })
    }

    /// Overwrite name, login, password hash and timezone. Keeps the login
    /// index in step. Returns false when the user does not exist.
    pub fn update_user(&self, user: &User) -> Result<bool, StoreError> {
        self.context.tx(|txn| {
            let mut users = txn.open_table(USERS_TABLE)?;
            let Some(existing) = get_row::<User, _>(&users, user.id)? else {
                return Ok(false);
            };

            let mut logins = txn.open_table(USER_LOGINS_INDEX)?;
            if existing.login != user.login {
                let owner = logins.get(user.login.as_str())?.map(|v| v.value());
                if owner.is_some_and(|id| id != user.id) {
                    return Err(StoreError::UniqueViolation(format!("login {}", user.login)));
                }
                logins.remove(existing.login.as_str())?;
                logins.insert(user.login.as_str(), user.id)?;
            }

            let updated = User {
                created: existing.created,
                ..user.clone()
            };
            users.insert(user.id, encode(&updated)?.as_slice())?;
            Ok(true)
        })
    }

    pub fn delete_by_id(&self, id: u64) -> Result<bool, StoreError> {
        self.context.tx(|txn| {
            let mut users = txn.open_table(USERS_TABLE)?;
            let Some(user) = get_row::<User, _>(&users, id)? else {
                return Ok(false);
            };
            users.remove(id)?;
            let mut logins = txn.open_table(USER_LOGINS_INDEX)?;
            logins.remove(user.login.as_str())?;
            Ok(true)
        })
    }
}

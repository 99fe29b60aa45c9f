use actix_web::web::{Json, Path, Query};
use actix_web::{delete, get, post, web, Error};

use crate::models::{ApiResponse, ListQuery, NewUser, Page, User};

#[get("/users")]
pub async fn list_users(query: Query<ListQuery>) -> Result<Json<ApiResponse<Page<User>>>, Error> {
    todo!()
}

#[get("/users/{id}")]
pub async fn get_user(id: Path<u64>) -> Result<Json<User>, Error> {
    todo!()
}

#[post("/users")]
pub async fn create_user(body: web::Json<NewUser>) -> Result<Json<User>, Error> {
    todo!()
}

#[delete("/users/{id}")]
pub async fn delete_user(id: Path<u64>) -> Result<(), Error> {
    todo!()
}

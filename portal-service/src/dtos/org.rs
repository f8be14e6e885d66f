use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{Department, DepartmentWithCount, Person, PersonWithDepartment, Role};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    #[schema(example = "Manager")]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
}

impl From<Role> for RoleResponse {
    fn from(r: Role) -> Self {
        Self {
            id: r.id,
            name: r.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleListResponse {
    pub data: Vec<RoleResponse>,
    pub total: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    #[schema(example = "Accounting")]
    pub name: String,
    pub role_id: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDepartmentRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: Option<String>,
    pub role_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DepartmentResponse {
    pub id: i64,
    pub name: String,
    pub role_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_count: Option<i64>,
}

impl From<Department> for DepartmentResponse {
    fn from(d: Department) -> Self {
        Self {
            id: d.id,
            name: d.name,
            role_id: d.role_id,
            person_count: None,
        }
    }
}

impl From<DepartmentWithCount> for DepartmentResponse {
    fn from(d: DepartmentWithCount) -> Self {
        Self {
            id: d.id,
            name: d.name,
            role_id: d.role_id,
            person_count: Some(d.person_count),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DepartmentListParams {
    pub role_id: Option<i64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePersonRequest {
    #[validate(length(min = 1, max = 255, message = "First name is required"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Last name is required"))]
    pub last_name: Option<String>,

    pub department_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PersonResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
    pub department_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
}

impl From<Person> for PersonResponse {
    fn from(p: Person) -> Self {
        Self {
            id: p.id,
            first_name: p.first_name,
            last_name: p.last_name,
            image_url: p.image_url,
            department_id: p.department_id,
            department_name: None,
        }
    }
}

impl From<PersonWithDepartment> for PersonResponse {
    fn from(p: PersonWithDepartment) -> Self {
        Self {
            id: p.id,
            first_name: p.first_name,
            last_name: p.last_name,
            image_url: p.image_url,
            department_id: p.department_id,
            department_name: Some(p.department_name),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PersonListParams {
    pub department_id: Option<i64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportQueuedResponse {
    #[schema(example = "Export job queued")]
    pub message: String,
}

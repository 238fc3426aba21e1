//! Hand-maintained OpenAPI 3.0.3 description of the HTTP API.

use serde_json::{json, Map, Value};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    User,
    Admin,
}

struct Operation {
    method: &'static str,
    path: &'static str,
    summary: &'static str,
    tag: &'static str,
    access: Access,
    body: Option<&'static str>,
    responses: &'static [(&'static str, &'static str)],
}

const OPERATIONS: &[Operation] = &[
    Operation {
        method: "get",
        path: "/health",
        summary: "Liveness check with the build id",
        tag: "meta",
        access: Access::Public,
        body: None,
        responses: &[("200", "Service is up")],
    },
    Operation {
        method: "get",
        path: "/openapi.json",
        summary: "This document",
        tag: "meta",
        access: Access::Public,
        body: None,
        responses: &[("200", "OpenAPI document")],
    },
    Operation {
        method: "post",
        path: "/auth/register",
        summary: "Create a student account",
        tag: "auth",
        access: Access::Public,
        body: Some("RegisterRequest"),
        responses: &[("200", "Account created, token issued"), ("400", "Invalid input or email taken")],
    },
    Operation {
        method: "post",
        path: "/auth/login",
        summary: "Exchange credentials for a token",
        tag: "auth",
        access: Access::Public,
        body: Some("LoginRequest"),
        responses: &[("200", "Token issued"), ("401", "Invalid email or password")],
    },
    Operation {
        method: "post",
        path: "/auth/logout",
        summary: "Clear the session cookie",
        tag: "auth",
        access: Access::User,
        body: None,
        responses: &[("204", "Logged out"), ("401", "Not authenticated")],
    },
    Operation {
        method: "get",
        path: "/auth/me",
        summary: "The authenticated user",
        tag: "auth",
        access: Access::User,
        body: None,
        responses: &[("200", "Current user"), ("401", "Not authenticated")],
    },
    Operation {
        method: "get",
        path: "/activities",
        summary: "List activities with participants and waitlists",
        tag: "activities",
        access: Access::Public,
        body: None,
        responses: &[("200", "All activities")],
    },
    Operation {
        method: "get",
        path: "/activities/{name}",
        summary: "One activity",
        tag: "activities",
        access: Access::Public,
        body: None,
        responses: &[("200", "The activity"), ("404", "Activity not found")],
    },
    Operation {
        method: "get",
        path: "/activities/{name}/waitlist",
        summary: "Waitlist in queue order",
        tag: "activities",
        access: Access::Public,
        body: None,
        responses: &[("200", "Waitlist entries"), ("404", "Activity not found")],
    },
    Operation {
        method: "post",
        path: "/activities/{name}/signup",
        summary: "Enroll, or join the waitlist when full",
        tag: "registrations",
        access: Access::User,
        body: Some("SignupRequest"),
        responses: &[
            ("200", "Enrolled or waitlisted"),
            ("400", "Full or already registered"),
            ("401", "Not authenticated"),
            ("403", "Students may only sign themselves up"),
            ("404", "Activity not found"),
        ],
    },
    Operation {
        method: "delete",
        path: "/activities/{name}/unregister",
        summary: "Leave an activity or its waitlist",
        tag: "registrations",
        access: Access::User,
        body: None,
        responses: &[
            ("200", "Unregistered, with any promoted students"),
            ("400", "Not signed up"),
            ("401", "Not authenticated"),
            ("403", "Students may only unregister themselves"),
            ("404", "Activity not found"),
        ],
    },
    Operation {
        method: "get",
        path: "/activities/{name}/calendar.ics",
        summary: "Weekly recurring iCalendar event for an activity",
        tag: "calendar",
        access: Access::Public,
        body: None,
        responses: &[
            ("200", "text/calendar"),
            ("404", "Activity not found"),
            ("422", "Schedule cannot be parsed"),
        ],
    },
    Operation {
        method: "get",
        path: "/me/registrations",
        summary: "The caller's enrollments and waitlist places",
        tag: "registrations",
        access: Access::User,
        body: None,
        responses: &[("200", "Registrations"), ("401", "Not authenticated")],
    },
    Operation {
        method: "get",
        path: "/me/calendar.ics",
        summary: "Calendar of every activity the caller is enrolled in",
        tag: "calendar",
        access: Access::User,
        body: None,
        responses: &[("200", "text/calendar"), ("401", "Not authenticated")],
    },
    Operation {
        method: "get",
        path: "/notifications",
        summary: "The caller's notifications, newest first",
        tag: "notifications",
        access: Access::User,
        body: None,
        responses: &[("200", "Notifications"), ("401", "Not authenticated")],
    },
    Operation {
        method: "post",
        path: "/notifications/{id}/read",
        summary: "Mark a notification as read",
        tag: "notifications",
        access: Access::User,
        body: None,
        responses: &[
            ("204", "Marked as read"),
            ("401", "Not authenticated"),
            ("404", "Notification not found"),
        ],
    },
    Operation {
        method: "get",
        path: "/admin",
        summary: "HTML admin panel",
        tag: "admin",
        access: Access::Admin,
        body: None,
        responses: &[("200", "text/html"), ("401", "Not authenticated"), ("403", "Admins only")],
    },
    Operation {
        method: "post",
        path: "/admin/activities",
        summary: "Create an activity",
        tag: "admin",
        access: Access::Admin,
        body: Some("CreateActivityRequest"),
        responses: &[
            ("201", "Created"),
            ("400", "Invalid input or name taken"),
            ("401", "Not authenticated"),
            ("403", "Admins only"),
        ],
    },
    Operation {
        method: "patch",
        path: "/admin/activities/{name}",
        summary: "Change an activity; raising capacity promotes the waitlist",
        tag: "admin",
        access: Access::Admin,
        body: Some("UpdateActivityRequest"),
        responses: &[
            ("200", "Updated"),
            ("400", "Invalid input"),
            ("401", "Not authenticated"),
            ("403", "Admins only"),
            ("404", "Activity not found"),
        ],
    },
    Operation {
        method: "delete",
        path: "/admin/activities/{name}",
        summary: "Delete an activity and notify its registrants",
        tag: "admin",
        access: Access::Admin,
        body: None,
        responses: &[
            ("204", "Deleted"),
            ("401", "Not authenticated"),
            ("403", "Admins only"),
            ("404", "Activity not found"),
        ],
    },
    Operation {
        method: "get",
        path: "/admin/users",
        summary: "List accounts",
        tag: "admin",
        access: Access::Admin,
        body: None,
        responses: &[("200", "Users"), ("401", "Not authenticated"), ("403", "Admins only")],
    },
    Operation {
        method: "put",
        path: "/admin/users/{email}/role",
        summary: "Change an account's role",
        tag: "admin",
        access: Access::Admin,
        body: Some("RoleRequest"),
        responses: &[
            ("200", "Updated user"),
            ("400", "Unknown role"),
            ("401", "Not authenticated"),
            ("403", "Admins only"),
            ("404", "User not found"),
        ],
    },
    Operation {
        method: "get",
        path: "/admin/export/registrations",
        summary: "Download every registration as CSV or JSON",
        tag: "admin",
        access: Access::Admin,
        body: None,
        responses: &[
            ("200", "Attachment"),
            ("400", "Unsupported format"),
            ("401", "Not authenticated"),
            ("403", "Admins only"),
        ],
    },
];

fn path_parameters(path: &str) -> Vec<Value> {
    path.split('/')
        .filter_map(|seg| seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .map(|name| {
            json!({
                "name": name,
                "in": "path",
                "required": true,
                "schema": { "type": "string" }
            })
        })
        .collect()
}

fn query_parameters(path: &str, method: &str) -> Vec<Value> {
    match (path, method) {
        ("/activities/{name}/unregister", "delete") => vec![json!({
            "name": "email",
            "in": "query",
            "required": false,
            "description": "Defaults to the caller; admins may name any student",
            "schema": { "type": "string", "format": "email" }
        })],
        ("/notifications", "get") => vec![json!({
            "name": "unread_only",
            "in": "query",
            "required": false,
            "schema": { "type": "boolean", "default": false }
        })],
        ("/admin/export/registrations", "get") => vec![json!({
            "name": "format",
            "in": "query",
            "required": false,
            "schema": { "type": "string", "enum": ["csv", "json"], "default": "csv" }
        })],
        _ => Vec::new(),
    }
}

fn operation_object(op: &Operation) -> Value {
    let mut responses = Map::new();
    for (code, description) in op.responses {
        let response = if code.starts_with('2') {
            json!({ "description": description })
        } else {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        responses.insert((*code).to_string(), response);
    }

    let mut object = json!({
        "summary": op.summary,
        "tags": [op.tag],
        "responses": responses,
    });

    let mut parameters = path_parameters(op.path);
    parameters.extend(query_parameters(op.path, op.method));
    parameters.push(json!({
        "name": "Accept-Language",
        "in": "header",
        "required": false,
        "schema": { "type": "string", "example": "es-ES, en;q=0.8" }
    }));
    object["parameters"] = Value::Array(parameters);

    if let Some(schema) = op.body {
        object["requestBody"] = json!({
            "required": schema != "SignupRequest",
            "content": {
                "application/json": {
                    "schema": { "$ref": format!("#/components/schemas/{}", schema) }
                }
            }
        });
    }
    if op.access != Access::Public {
        object["security"] = json!([{ "bearerAuth": [] }, { "cookieAuth": [] }]);
    }
    if op.access == Access::Admin {
        object["x-required-role"] = json!("admin");
    }
    object
}

fn schemas() -> Value {
    json!({
        "ErrorResponse": {
            "type": "object",
            "required": ["detail"],
            "properties": { "detail": { "type": "string" } }
        },
        "RegisterRequest": {
            "type": "object",
            "required": ["email", "password", "full_name"],
            "properties": {
                "email": { "type": "string", "format": "email" },
                "password": { "type": "string", "minLength": 8 },
                "full_name": { "type": "string" }
            }
        },
        "LoginRequest": {
            "type": "object",
            "required": ["email", "password"],
            "properties": {
                "email": { "type": "string", "format": "email" },
                "password": { "type": "string" }
            }
        },
        "TokenResponse": {
            "type": "object",
            "properties": {
                "access_token": { "type": "string" },
                "token_type": { "type": "string", "example": "bearer" },
                "email": { "type": "string" }
            }
        },
        "SignupRequest": {
            "type": "object",
            "properties": { "email": { "type": "string", "format": "email" } }
        },
        "CreateActivityRequest": {
            "type": "object",
            "required": ["name", "description", "schedule", "max_participants"],
            "properties": {
                "name": { "type": "string" },
                "description": { "type": "string" },
                "schedule": { "type": "string", "example": "Mondays, Wednesdays, 3:30 PM - 5:00 PM" },
                "max_participants": { "type": "integer", "minimum": 1 },
                "waitlist_enabled": { "type": "boolean", "default": true }
            }
        },
        "UpdateActivityRequest": {
            "type": "object",
            "properties": {
                "description": { "type": "string" },
                "schedule": { "type": "string" },
                "max_participants": { "type": "integer", "minimum": 1 },
                "waitlist_enabled": { "type": "boolean" }
            }
        },
        "RoleRequest": {
            "type": "object",
            "required": ["role"],
            "properties": { "role": { "type": "string", "enum": ["student", "admin"] } }
        },
        "Activity": {
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "description": { "type": "string" },
                "schedule": { "type": "string" },
                "max_participants": { "type": "integer" },
                "participant_count": { "type": "integer" },
                "spots_left": { "type": "integer" },
                "participants": { "type": "array", "items": { "type": "string" } },
                "waitlist_enabled": { "type": "boolean" },
                "waitlist_count": { "type": "integer" },
                "waitlist": { "type": "array", "items": { "type": "string" } }
            }
        },
        "Notification": {
            "type": "object",
            "properties": {
                "id": { "type": "string", "format": "uuid" },
                "kind": {
                    "type": "string",
                    "enum": ["enrolled", "waitlisted", "promoted", "unregistered", "activity_cancelled"]
                },
                "activity": { "type": "string" },
                "message": { "type": "string" },
                "waitlist_position": { "type": "integer" },
                "created_at": { "type": "string" },
                "read": { "type": "boolean" }
            }
        }
    })
}

pub fn openapi_document() -> Value {
    let mut paths = Map::new();
    for op in OPERATIONS {
        let entry = paths
            .entry(op.path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(methods) = entry {
            methods.insert(op.method.to_string(), operation_object(op));
        }
    }

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Mergington High School Activities API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Extracurricular activity sign-up with capacity limits, waitlists and notifications."
        },
        "paths": paths,
        "components": {
            "securitySchemes": {
                "bearerAuth": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" },
                "cookieAuth": { "type": "apiKey", "in": "cookie", "name": "access_token" }
            },
            "schemas": schemas()
        }
    })
}

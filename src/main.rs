#[macro_use]
extern crate rocket;
#[macro_use]
extern crate log;

mod config;
mod db;
mod guards;
mod models;
mod routes;
mod services;
mod utils;

use dotenvy::dotenv;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::{Build, Request, Response, Rocket};
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};

/* ----------------------------- CORS ----------------------------- */

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        }

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, PATCH, DELETE, OPTIONS",
        ));

        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));

        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/* ----------------------------- OPTIONS ----------------------------- */

#[options("/<_..>")]
fn options_handler() {}

/* ----------------------------- ERRORS ----------------------------- */

#[catch(404)]
fn not_found() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "Resource not found (check /api/v1 prefix)"
    })
}

#[catch(500)]
fn internal_error() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "Internal server error"
    })
}

/* ----------------------------- SWAGGER ----------------------------- */

fn swagger_config() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}

/* ----------------------------- LAUNCH ----------------------------- */

#[launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    println!("🚀 GigWork API running");
    println!("📚 Swagger UI → http://localhost:8000/api/docs");

    rocket::build()
        .attach(db::init())
        .attach(CORS)
        .mount("/", routes![options_handler])
        .mount(
            "/api/v1",
            routes![
                // Auth
                routes::auth::register,
                routes::auth::verify_otp,
                routes::auth::resend_otp,
                routes::auth::login,
                routes::auth::logout,
                // User
                routes::user::get_me,
                routes::user::get_user,
                routes::user::update_me,
                routes::user::delete_me,
                // Gigs
                routes::gig::create_gig,
                routes::gig::get_gigs,
                routes::gig::get_gig,
                routes::gig::delete_gig,
                routes::gig::enhance_description,
                // Orders
                routes::order::create_order,
                routes::order::get_orders,
                routes::order::get_order,
                routes::order::update_order,
                // Projects
                routes::project::create_project,
                routes::project::get_projects,
                routes::project::get_project,
                routes::project::update_project,
                routes::project::delete_project,
                // Proposals
                routes::proposal::create_proposal,
                routes::proposal::get_project_proposals,
                routes::proposal::get_my_proposals,
                routes::proposal::update_proposal,
                // Conversations
                routes::conversation::create_conversation,
                routes::conversation::get_conversations,
                routes::conversation::get_conversation,
                routes::conversation::mark_read,
                // Messages
                routes::message::create_message,
                routes::message::get_messages,
                // Reviews
                routes::review::create_review,
                routes::review::get_gig_reviews,
                routes::review::delete_review,
                // Uploads
                routes::file_upload::upload_image,
            ],
        )
        .mount("/uploads", FileServer::from("uploads"))
        .mount("/api/docs", make_swagger_ui(&swagger_config()))
        .register("/", catchers![not_found, internal_error])
}

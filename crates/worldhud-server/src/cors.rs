//! CORS headers and preflight handling.

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::{Request, Response, options};

pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS headers",
            kind: Kind::Response,
        }
    }

    /// Echo the caller's `Origin` so credentialed requests are accepted;
    /// requests without one get the wildcard and no credentials header.
    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        match request.headers().get_one("Origin") {
            Some(origin) => {
                let origin = origin.to_string();
                response.set_header(Header::new("Access-Control-Allow-Origin", origin));
                response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
                response.set_header(Header::new("Vary", "Origin"));
            }
            None => response.set_header(Header::new("Access-Control-Allow-Origin", "*")),
        }
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

/// Answers preflight requests on any path.
#[options("/<_..>")]
pub fn preflight() -> Status {
    Status::NoContent
}

// canvas-host/src/api/mod.rs
pub mod admin;
pub mod canvas;

pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(canvas::healthz)
        .service(canvas::canvas)
        .service(canvas::app)
        .service(
            actix_web::web::scope("/admin")
                .service(admin::rotate_key)
                .service(admin::revoke_key),
        );
}
